use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use std::io::{self, BufRead, Write};
use std::num::NonZeroUsize;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use txtseek::{search, ResultsDir, SearchConfig, SearchError, SearchReport};

#[derive(Parser)]
#[command(name = "txtseek", author, version, about, long_about = None)]
struct Cli {
    /// Query string to search for. When omitted, an interactive session
    /// prompts for folders and queries until you decline to continue.
    #[arg(short = 'q', long)]
    query: Option<String>,

    /// Root directory to search in
    #[arg(short = 'd', long, default_value = ".")]
    root: PathBuf,

    /// File extension to include, without the dot (matched case-insensitively)
    #[arg(short = 'e', long, default_value = "txt")]
    extension: String,

    /// Directory the results file is written to
    #[arg(long, default_value = "results")]
    results_dir: PathBuf,

    /// Number of scan workers
    #[arg(short = 'j', long)]
    threads: Option<NonZeroUsize>,

    /// Path to a YAML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Disable the progress bar
    #[arg(long)]
    no_progress: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    log_level: String,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let file_config = match &cli.config {
        Some(path) => SearchConfig::load_from(Some(path))
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => SearchConfig::load().unwrap_or_default(),
    };

    let cli_config = SearchConfig {
        query: cli.query.clone().unwrap_or_default(),
        root_path: cli.root,
        extension: cli.extension,
        results_dir: cli.results_dir,
        log_level: cli.log_level,
        show_progress: !cli.no_progress,
        ..Default::default()
    };
    let mut config = file_config.merge_with_cli(cli_config);
    // An explicit -j always wins, even when it matches the machine default
    if let Some(threads) = cli.threads {
        config.thread_count = threads;
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    tracing::debug!(
        "Effective config: root={}, extension={}, workers={}",
        config.root_path.display(),
        config.extension,
        config.effective_thread_count()
    );

    // The one fatal setup step: the results location must be writable
    // before anything is scanned
    let results = ResultsDir::create(&config.results_dir)?;

    match cli.query {
        Some(_) => run_once(&config, &results),
        None => interactive_loop(config, &results),
    }
}

/// One non-interactive run. Per-file errors do not fail the process; an
/// empty query or an unwritable results file does.
fn run_once(config: &SearchConfig, results: &ResultsDir) -> Result<()> {
    let report = search(config)?;

    if report.no_files() {
        println!(
            "{}",
            format!(
                "No .{} files found under {}",
                config.extension,
                config.root_path.display()
            )
            .yellow()
        );
        return Ok(());
    }

    print_run_results(config, results, &report)
}

fn interactive_loop(base_config: SearchConfig, results: &ResultsDir) -> Result<()> {
    print_banner(&base_config, results);

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        let default_root = base_config.root_path.display().to_string();
        let folder = match prompt(
            &mut lines,
            &format!("Folder to search (default {}): ", default_root),
        )? {
            Some(answer) => answer,
            None => break, // EOF counts as a decline
        };

        let query = match prompt(&mut lines, "Search query: ")? {
            Some(answer) => answer,
            None => break,
        };

        let mut config = base_config.clone();
        if !folder.is_empty() {
            config.root_path = PathBuf::from(folder);
        }
        config.query = query;

        match search(&config) {
            Ok(report) if report.no_files() => {
                println!(
                    "{}",
                    format!(
                        "No .{} files found under {}",
                        config.extension,
                        config.root_path.display()
                    )
                    .yellow()
                );
            }
            Ok(report) => print_run_results(&config, results, &report)?,
            Err(SearchError::EmptyQuery) => {
                println!("{}", "Query must not be empty".red());
            }
            Err(e) => {
                println!("{}", format!("Search failed: {}", e).red());
            }
        }

        match prompt(&mut lines, "Continue searching? (y/n): ")? {
            Some(answer) if answer.eq_ignore_ascii_case("y") => continue,
            _ => break,
        }
    }

    Ok(())
}

/// Reads one trimmed line from stdin; `None` means EOF
fn prompt(
    lines: &mut impl Iterator<Item = io::Result<String>>,
    label: &str,
) -> Result<Option<String>> {
    print!("{}", label.cyan().bold());
    io::stdout().flush()?;

    match lines.next() {
        Some(line) => Ok(Some(line?.trim().to_string())),
        None => {
            println!();
            Ok(None)
        }
    }
}

fn print_banner(config: &SearchConfig, results: &ResultsDir) {
    println!("{}", "=== txtseek ===".cyan().bold());
    println!(
        "{}",
        format!(
            "CPU cores/threads: {}/{}",
            num_cpus::get_physical(),
            num_cpus::get()
        )
        .blue()
    );
    println!(
        "{}",
        format!("Scan workers: {}", config.effective_thread_count()).blue()
    );
    println!(
        "{}",
        format!("Results directory: {}", results.path().display()).blue()
    );
    println!();
}

fn print_run_results(
    config: &SearchConfig,
    results: &ResultsDir,
    report: &SearchReport,
) -> Result<()> {
    // Per-file failures were already counted; surface them for the user
    for error in &report.errors {
        println!("{}", format!("Warning: {}", error).yellow());
    }

    match results.save(&config.query, &report.matches)? {
        Some(path) => println!(
            "{}",
            format!("Results saved to: {}", path.display()).green()
        ),
        None => println!("{}", "No matches found, nothing saved".yellow()),
    }

    let stats = &report.stats;
    println!("\n{}", "=== Statistics ===".cyan().bold());
    println!(
        "Processed: {}/{} files ({})",
        stats.files_processed,
        stats.files_discovered,
        format_bytes(stats.total_bytes)
    );
    println!("Matches found: {}", stats.matches_found);
    println!("Errors: {}", stats.error_count);
    println!(
        "Elapsed: {}",
        humantime::format_duration(std::time::Duration::from_millis(
            stats.elapsed.as_millis() as u64
        ))
    );
    println!("Peak memory: {}", format_bytes(stats.peak_memory));

    Ok(())
}

/// Renders a byte count with binary units
fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KiB", "MiB", "GiB", "TiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} {}", bytes, UNITS[unit])
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}
