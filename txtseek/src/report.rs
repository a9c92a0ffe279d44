use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::errors::{SearchError, SearchResult};
use crate::results::MatchRecord;

const SEPARATOR_WIDTH: usize = 50;
const MAX_QUERY_STEM: usize = 50;

/// Characters that cannot appear in a file name on common platforms
const UNSAFE_CHARS: &[char] = &['\\', '/', '*', '?', ':', '"', '<', '>', '|'];

/// Derives a file-name-safe identifier from the query: unsafe characters
/// become underscores, and the result is truncated to 50 bytes on a char
/// boundary.
pub fn sanitize_query(query: &str) -> String {
    let mut safe: String = query
        .chars()
        .map(|c| if UNSAFE_CHARS.contains(&c) { '_' } else { c })
        .collect();

    if safe.len() > MAX_QUERY_STEM {
        let mut cut = MAX_QUERY_STEM;
        while !safe.is_char_boundary(cut) {
            cut -= 1;
        }
        safe.truncate(cut);
    }
    safe
}

/// The durable destination for match reports.
///
/// Creation is the one fatal setup step of a run: the directory must exist
/// and be writable before any scanning starts, verified with a probe file.
#[derive(Debug, Clone)]
pub struct ResultsDir {
    path: PathBuf,
}

impl ResultsDir {
    /// Creates (if needed) and write-probes the results directory.
    /// Failure here aborts the run.
    pub fn create(path: impl Into<PathBuf>) -> SearchResult<Self> {
        let path = path.into();

        fs::create_dir_all(&path)
            .map_err(|e| SearchError::setup_error(&path, e.to_string()))?;

        let probe = path.join("permission_test.txt");
        fs::write(&probe, "test").map_err(|e| SearchError::setup_error(&path, e.to_string()))?;
        fs::remove_file(&probe).map_err(|e| SearchError::setup_error(&path, e.to_string()))?;

        debug!("Results directory ready: {}", path.display());
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The file the given query's results land in
    pub fn result_file(&self, query: &str) -> PathBuf {
        self.path.join(format!("results_{}.txt", sanitize_query(query)))
    }

    /// Persists the final match snapshot in a stable, human-readable line
    /// format. Nothing is written when there are no matches; the returned
    /// path tells the caller where the file landed.
    pub fn save(&self, query: &str, matches: &[MatchRecord]) -> SearchResult<Option<PathBuf>> {
        if matches.is_empty() {
            return Ok(None);
        }

        let result_path = self.result_file(query);
        let mut file = File::create(&result_path)?;

        writeln!(file, "Search results for: '{}'", query)?;
        writeln!(file, "Total matches: {}", matches.len())?;
        writeln!(file, "{}", "=".repeat(SEPARATOR_WIDTH))?;
        for record in matches {
            writeln!(file)?;
            writeln!(file, "File: {}", record.path.display())?;
            writeln!(file, "Position: {}", record.position)?;
            writeln!(file, "Context: {}", record.context)?;
            writeln!(file, "{}", "=".repeat(SEPARATOR_WIDTH))?;
        }

        info!(
            "Saved {} matches to {}",
            matches.len(),
            result_path.display()
        );
        Ok(Some(result_path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn record(name: &str, position: usize, context: &str) -> MatchRecord {
        MatchRecord {
            path: PathBuf::from(name),
            position,
            context: context.to_string(),
        }
    }

    #[test]
    fn test_sanitize_strips_unsafe_characters() {
        assert_eq!(sanitize_query("a/b:c"), "a_b_c");
        assert_eq!(sanitize_query(r#"x\y*z?"#), "x_y_z_");
        assert_eq!(sanitize_query("<q>|\""), "_q___");
        assert_eq!(sanitize_query("plain words"), "plain words");
    }

    #[test]
    fn test_sanitize_truncates_on_char_boundary() {
        let long = "a".repeat(80);
        assert_eq!(sanitize_query(&long).len(), 50);

        // 'é' is two bytes; 49 + 2 would cross the 50-byte limit
        let tricky = format!("{}é", "a".repeat(49));
        let safe = sanitize_query(&tricky);
        assert_eq!(safe, "a".repeat(49));
    }

    #[test]
    fn test_create_probes_writability() {
        let dir = tempdir().unwrap();
        let results = ResultsDir::create(dir.path().join("results")).unwrap();
        assert!(results.path().is_dir());
        // Probe file cleaned up
        assert!(!results.path().join("permission_test.txt").exists());
    }

    #[test]
    fn test_create_fails_when_path_is_a_file() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("results");
        std::fs::write(&blocker, "in the way").unwrap();

        let result = ResultsDir::create(&blocker);
        assert!(matches!(result, Err(SearchError::Setup { .. })));
    }

    #[test]
    fn test_save_writes_stable_report() {
        let dir = tempdir().unwrap();
        let results = ResultsDir::create(dir.path()).unwrap();

        let matches = vec![
            record("a.txt", 0, "foo bar foo"),
            record("a.txt", 8, "foo bar foo"),
        ];
        let saved = results.save("foo", &matches).unwrap().unwrap();
        assert_eq!(saved, results.result_file("foo"));

        let contents = std::fs::read_to_string(&saved).unwrap();
        assert!(contents.contains("Search results for: 'foo'"));
        assert!(contents.contains("Total matches: 2"));
        assert!(contents.contains("File: a.txt"));
        assert!(contents.contains("Position: 0"));
        assert!(contents.contains("Position: 8"));
        assert!(contents.contains("Context: foo bar foo"));
    }

    #[test]
    fn test_save_skips_empty_match_set() {
        let dir = tempdir().unwrap();
        let results = ResultsDir::create(dir.path()).unwrap();

        assert!(results.save("foo", &[]).unwrap().is_none());
        assert!(!results.result_file("foo").exists());
    }

    #[test]
    fn test_unsafe_query_still_yields_writable_file() {
        let dir = tempdir().unwrap();
        let results = ResultsDir::create(dir.path()).unwrap();

        let matches = vec![record("b.txt", 3, "a/b:c in context")];
        let saved = results.save("a/b:c", &matches).unwrap().unwrap();
        assert!(saved.ends_with("results_a_b_c.txt"));
        assert!(saved.exists());
    }
}
