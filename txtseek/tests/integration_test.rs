use anyhow::Result;
use std::fs::{self, File};
use std::io::Write;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

use txtseek::aggregator::Aggregator;
use txtseek::search::{FileScanner, QueryMatcher};
use txtseek::{search, ResultsDir, ScanOutcome, ScanTarget, SearchConfig, SearchError};

fn create_test_files(dir: &Path, files: &[(&str, &str)]) -> Result<()> {
    for (name, content) in files {
        fs::write(dir.join(name), content)?;
    }
    Ok(())
}

fn test_config(root: &Path, query: &str) -> SearchConfig {
    SearchConfig {
        query: query.to_string(),
        root_path: root.to_path_buf(),
        thread_count: NonZeroUsize::new(4).unwrap(),
        show_progress: false,
        ..Default::default()
    }
}

/// Three targets, one of which cannot be scanned. Every target yields
/// exactly one outcome; the failure is counted, not raised.
#[test]
fn test_three_file_scenario_with_one_failing_target() -> Result<()> {
    let dir = tempdir()?;
    create_test_files(
        dir.path(),
        &[("a.txt", "foo bar foo"), ("b.txt", "nothing here")],
    )?;

    // A target whose file vanished between enumeration and scan
    let targets = vec![
        ScanTarget {
            path: dir.path().join("a.txt"),
            size: 11,
        },
        ScanTarget {
            path: dir.path().join("b.txt"),
            size: 12,
        },
        ScanTarget {
            path: dir.path().join("c.txt"),
            size: 0,
        },
    ];

    let scanner = FileScanner::new(QueryMatcher::new("foo"));
    let aggregator = Aggregator::new();
    for target in &targets {
        aggregator.accept(scanner.scan(target));
    }

    let snapshot = aggregator.into_snapshot();
    assert_eq!(snapshot.files_processed, 3);
    assert_eq!(snapshot.matches_found, 2);
    assert_eq!(snapshot.error_count, 1);

    let mut positions: Vec<_> = snapshot.matches.iter().map(|m| m.position).collect();
    positions.sort_unstable();
    assert_eq!(positions, vec![0, 8]);
    assert!(snapshot
        .matches
        .iter()
        .all(|m| m.path == dir.path().join("a.txt")));
    assert!(snapshot.errors[0].contains("c.txt"));
    Ok(())
}

#[cfg(unix)]
#[test]
fn test_unreadable_file_counts_as_error() -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempdir()?;
    create_test_files(
        dir.path(),
        &[("a.txt", "foo bar foo"), ("b.txt", "nothing here")],
    )?;
    let locked = dir.path().join("c.txt");
    fs::write(&locked, "foo hidden behind permissions")?;
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000))?;

    // Under privileged users the mode bits are not enforced and there is
    // nothing to provoke; the failure path is covered by the vanished-file
    // scenario above.
    if fs::read(&locked).is_ok() {
        return Ok(());
    }

    let report = search(&test_config(dir.path(), "foo"))?;
    assert_eq!(report.stats.files_discovered, 3);
    assert_eq!(report.stats.files_processed, 3);
    assert_eq!(report.stats.matches_found, 2);
    assert_eq!(report.stats.error_count, 1);
    Ok(())
}

#[test]
fn test_every_target_yields_exactly_one_outcome() -> Result<()> {
    let dir = tempdir()?;
    for i in 0..40 {
        let mut file = File::create(dir.path().join(format!("file_{}.txt", i)))?;
        for j in 0..50 {
            writeln!(file, "line {} of file {}: sometimes a needle", j, i)?;
        }
    }

    let report = search(&test_config(dir.path(), "needle"))?;
    assert_eq!(report.stats.files_discovered, 40);
    assert_eq!(report.stats.files_processed, 40);
    assert_eq!(report.stats.matches_found, 40 * 50);
    assert_eq!(report.stats.error_count, 0);
    Ok(())
}

#[test]
fn test_hidden_files_are_searched() -> Result<()> {
    let dir = tempdir()?;
    create_test_files(dir.path(), &[("visible.txt", "a needle here")])?;
    create_test_files(dir.path(), &[(".hidden.txt", "needle in a dotfile")])?;
    fs::create_dir(dir.path().join(".notes"))?;
    fs::write(dir.path().join(".notes/inner.txt"), "needle below a dotdir")?;

    let report = search(&test_config(dir.path(), "needle"))?;
    assert_eq!(report.stats.files_discovered, 3);
    assert_eq!(report.stats.files_processed, 3);
    assert_eq!(report.stats.matches_found, 3);
    assert_eq!(report.stats.error_count, 0);
    Ok(())
}

#[test]
fn test_matches_within_one_file_stay_ordered() -> Result<()> {
    let dir = tempdir()?;
    create_test_files(dir.path(), &[("many.txt", "ab ab ab ab ab")])?;

    let report = search(&test_config(dir.path(), "ab"))?;
    let positions: Vec<_> = report.matches.iter().map(|m| m.position).collect();
    assert_eq!(positions, vec![0, 3, 6, 9, 12]);
    Ok(())
}

#[test]
fn test_overlapping_occurrences_counted_once() -> Result<()> {
    let dir = tempdir()?;
    create_test_files(dir.path(), &[("overlap.txt", "aaa")])?;

    let report = search(&test_config(dir.path(), "aa"))?;
    assert_eq!(report.stats.matches_found, 1);
    assert_eq!(report.matches[0].position, 0);
    Ok(())
}

#[test]
fn test_rescan_yields_identical_records() -> Result<()> {
    let dir = tempdir()?;
    create_test_files(
        dir.path(),
        &[
            ("a.txt", "needle at the start, needle at the end"),
            ("b.txt", "one more needle for good measure"),
        ],
    )?;

    let sorted = |config: &SearchConfig| -> Result<Vec<(PathBuf, usize, String)>> {
        let mut records: Vec<_> = search(config)?
            .matches
            .into_iter()
            .map(|m| (m.path, m.position, m.context))
            .collect();
        records.sort();
        Ok(records)
    };

    let config = test_config(dir.path(), "needle");
    assert_eq!(sorted(&config)?, sorted(&config)?);
    Ok(())
}

#[test]
fn test_context_clipping_at_file_boundaries() -> Result<()> {
    let dir = tempdir()?;
    create_test_files(dir.path(), &[("edges.txt", "edge middle bits edge")])?;

    let report = search(&test_config(dir.path(), "edge"))?;
    assert_eq!(report.stats.matches_found, 2);
    // Whole file is shorter than one context window; both records carry it
    for record in &report.matches {
        assert_eq!(record.context, "edge middle bits edge");
    }
    Ok(())
}

#[test]
fn test_empty_query_never_scans() -> Result<()> {
    let dir = tempdir()?;
    create_test_files(dir.path(), &[("a.txt", "content that would match ''")])?;

    let result = search(&test_config(dir.path(), ""));
    assert!(matches!(result, Err(SearchError::EmptyQuery)));
    Ok(())
}

#[test]
fn test_end_to_end_run_persists_results() -> Result<()> {
    let dir = tempdir()?;
    let corpus = dir.path().join("corpus");
    fs::create_dir(&corpus)?;
    create_test_files(
        &corpus,
        &[("a.txt", "foo bar foo"), ("b.txt", "nothing here")],
    )?;

    let report = search(&test_config(&corpus, "foo"))?;
    let results = ResultsDir::create(dir.path().join("results"))?;
    let saved = results.save("foo", &report.matches)?.expect("matches exist");

    let contents = fs::read_to_string(saved)?;
    assert!(contents.contains("Total matches: 2"));
    assert!(contents.contains("Position: 0"));
    assert!(contents.contains("Position: 8"));
    Ok(())
}

#[test]
fn test_unsafe_query_produces_writable_results_file() -> Result<()> {
    let dir = tempdir()?;
    let corpus = dir.path().join("corpus");
    fs::create_dir(&corpus)?;
    create_test_files(&corpus, &[("a.txt", "path a/b:c appears here")])?;

    let report = search(&test_config(&corpus, "a/b:c"))?;
    assert_eq!(report.stats.matches_found, 1);

    let results = ResultsDir::create(dir.path().join("results"))?;
    let saved = results.save("a/b:c", &report.matches)?.expect("one match");
    assert!(saved.ends_with("results_a_b_c.txt"));
    assert!(saved.exists());
    Ok(())
}

#[test]
fn test_aggregation_race_keeps_per_file_order() -> Result<()> {
    let dir = tempdir()?;
    // Enough files that workers genuinely interleave
    for i in 0..64 {
        fs::write(
            dir.path().join(format!("f{:02}.txt", i)),
            "x needle y needle z needle",
        )?;
    }

    let report = search(&test_config(dir.path(), "needle"))?;
    assert_eq!(report.stats.matches_found, 64 * 3);

    // Completion order is arbitrary, but each file's triple must be
    // contiguous and position-ascending
    for chunk in report.matches.chunks(3) {
        assert!(chunk.iter().all(|m| m.path == chunk[0].path));
        assert_eq!(
            chunk.iter().map(|m| m.position).collect::<Vec<_>>(),
            vec![2, 11, 20]
        );
    }
    Ok(())
}

#[test]
fn test_failure_outcome_shape() -> Result<()> {
    let scanner = FileScanner::new(QueryMatcher::new("foo"));
    let outcome = scanner.scan(&ScanTarget {
        path: PathBuf::from("missing/never/was.txt"),
        size: 0,
    });

    match outcome {
        ScanOutcome::Failure { path, message } => {
            assert_eq!(path, PathBuf::from("missing/never/was.txt"));
            assert!(!message.is_empty());
        }
        ScanOutcome::Success { .. } => panic!("expected failure for missing file"),
    }
    Ok(())
}
