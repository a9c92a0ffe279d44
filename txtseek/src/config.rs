use config::{Config as ConfigBuilder, ConfigError, File};
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

/// Absolute ceiling on concurrent scan workers, regardless of core count.
pub const MAX_WORKERS: usize = 32;

/// Configuration for one search run.
///
/// Values can be loaded from YAML config files in order of precedence:
/// 1. Custom config file specified via `--config`
/// 2. Local `.txtseek.yaml` in the current directory
/// 3. Global `$CONFIG_DIR/txtseek/config.yaml`
///
/// Example:
/// ```yaml
/// root_path: "./db"
/// extension: "txt"
/// results_dir: "./results"
/// thread_count: 8
/// log_level: "info"
/// show_progress: true
/// ```
///
/// CLI arguments take precedence over config file values; the merging
/// behavior is defined in `merge_with_cli`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// The literal query string to search for. Case-sensitive; never
    /// interpreted as a pattern language. An empty query is rejected
    /// before any scanning starts.
    #[serde(default)]
    pub query: String,

    /// Root directory to enumerate files from
    #[serde(default = "default_root_path")]
    pub root_path: PathBuf,

    /// File extension to include, matched case-insensitively (without
    /// the leading dot)
    #[serde(default = "default_extension")]
    pub extension: String,

    /// Directory the results file is written to
    #[serde(default = "default_results_dir")]
    pub results_dir: PathBuf,

    /// Number of scan workers. Defaults to twice the logical core count,
    /// never more than `MAX_WORKERS`.
    #[serde(default = "default_thread_count")]
    pub thread_count: NonZeroUsize,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Whether to render a progress bar while scanning
    #[serde(default = "default_show_progress")]
    pub show_progress: bool,
}

fn default_root_path() -> PathBuf {
    PathBuf::from(".")
}

fn default_extension() -> String {
    "txt".to_string()
}

fn default_results_dir() -> PathBuf {
    PathBuf::from("results")
}

fn default_thread_count() -> NonZeroUsize {
    NonZeroUsize::new((num_cpus::get() * 2).min(MAX_WORKERS))
        .unwrap_or(NonZeroUsize::new(1).unwrap())
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_show_progress() -> bool {
    true
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            query: String::new(),
            root_path: default_root_path(),
            extension: default_extension(),
            results_dir: default_results_dir(),
            thread_count: default_thread_count(),
            log_level: default_log_level(),
            show_progress: default_show_progress(),
        }
    }
}

impl SearchConfig {
    /// Loads configuration from the default locations
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Loads configuration from a specific file
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = ConfigBuilder::builder();

        // Implicit locations are optional and skipped when absent
        let implicit_files = [
            // Global config
            dirs::config_dir().map(|p| p.join("txtseek/config.yaml")),
            // Local config
            Some(PathBuf::from(".txtseek.yaml")),
        ];

        for path in implicit_files.iter().flatten() {
            if path.exists() {
                builder = builder.add_source(File::from(path.as_path()));
            }
        }

        // An explicitly requested file must exist; a typo'd path is an
        // error, not a silent fall-through to defaults
        if let Some(path) = config_path {
            builder = builder.add_source(File::from(path));
        }

        builder.build()?.try_deserialize()
    }

    /// Merges CLI arguments with configuration file values; CLI values
    /// take precedence.
    pub fn merge_with_cli(mut self, cli_config: SearchConfig) -> Self {
        if !cli_config.query.is_empty() {
            self.query = cli_config.query;
        }
        if cli_config.root_path != default_root_path() {
            self.root_path = cli_config.root_path;
        }
        if cli_config.extension != default_extension() {
            self.extension = cli_config.extension;
        }
        if cli_config.results_dir != default_results_dir() {
            self.results_dir = cli_config.results_dir;
        }
        // A CLI thread count equal to the default means "not specified";
        // a file-configured value survives it
        if cli_config.thread_count != default_thread_count() {
            self.thread_count = cli_config.thread_count;
        }
        if cli_config.log_level != default_log_level() {
            self.log_level = cli_config.log_level;
        }
        if !cli_config.show_progress {
            self.show_progress = false;
        }
        self
    }

    /// Worker count actually used by the dispatcher: the configured count
    /// clamped to the absolute ceiling. Oversubscription past `MAX_WORKERS`
    /// buys nothing on high-core machines.
    pub fn effective_thread_count(&self) -> usize {
        self.thread_count.get().min(MAX_WORKERS)
    }
}
