use ignore::WalkBuilder;
use std::path::Path;
use tracing::{debug, warn};

use crate::results::ScanTarget;

/// The set of files one run will scan, plus their combined size.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    pub targets: Vec<ScanTarget>,
    pub total_bytes: u64,
}

impl Catalog {
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }
}

/// Checks whether a file name carries the wanted extension,
/// compared ASCII case-insensitively
fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(extension))
}

/// Walks the tree under `root` and returns every regular file whose
/// extension matches, with its size probed at enumeration time.
///
/// A file whose size cannot be probed (broken symlink, permission) is
/// warned about and excluded; the walk itself never aborts. No files
/// matching is an empty catalog, not an error.
pub fn enumerate(root: &Path, extension: &str) -> Catalog {
    // Plain-text corpora are not source trees: every regular file is
    // visited, dotfiles included, and gitignore semantics stay off.
    let walker = WalkBuilder::new(root)
        .hidden(false)
        .ignore(false)
        .git_ignore(false)
        .git_global(false)
        .git_exclude(false)
        .build();

    let mut catalog = Catalog::default();

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping unreadable entry under {}: {}", root.display(), e);
                continue;
            }
        };

        if !entry.file_type().is_some_and(|ft| ft.is_file()) {
            continue;
        }

        let path = entry.path();
        if !has_extension(path, extension) {
            continue;
        }

        match entry.metadata() {
            Ok(metadata) => {
                let size = metadata.len();
                catalog.targets.push(ScanTarget {
                    path: path.to_path_buf(),
                    size,
                });
                catalog.total_bytes += size;
            }
            Err(e) => {
                warn!("Cannot probe size of {}: {}", path.display(), e);
            }
        }
    }

    debug!(
        "Enumerated {} files ({} bytes) under {}",
        catalog.len(),
        catalog.total_bytes,
        root.display()
    );

    catalog
}
