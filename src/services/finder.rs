use crate::error::{NotebookImageError, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

/// Documents found under a root, plus entries that could not be read.
#[derive(Debug, Default)]
pub struct Discovery {
    pub documents: Vec<PathBuf>,
    pub walk_errors: usize,
}

pub struct DocumentFinder;

impl DocumentFinder {
    /// Recursively collect files ending in `.{extension}` under `root`,
    /// never descending into a directory named `excluded_dir`.
    pub fn find_documents(root: &Path, extension: &str, excluded_dir: &str) -> Result<Discovery> {
        if !root.is_dir() {
            return Err(NotebookImageError::RootNotFound {
                path: root.to_path_buf(),
            });
        }

        let mut discovery = Discovery::default();
        let walker = WalkDir::new(root)
            .follow_links(false)
            .into_iter()
            .filter_entry(|entry| !Self::is_excluded(entry, excluded_dir));

        for entry in walker {
            match entry {
                Ok(entry) => {
                    if Self::is_file_or_link_to_file(&entry)
                        && Self::has_extension(entry.path(), extension)
                    {
                        debug!("Found document: {}", entry.path().display());
                        discovery.documents.push(entry.into_path());
                    }
                }
                Err(e) => {
                    warn!("Skipping unreadable entry: {}", NotebookImageError::from(e));
                    discovery.walk_errors += 1;
                }
            }
        }

        discovery.documents.sort();
        Ok(discovery)
    }

    fn is_excluded(entry: &DirEntry, excluded_dir: &str) -> bool {
        // The root itself is never excluded, even if it carries the name.
        entry.depth() > 0
            && entry.file_type().is_dir()
            && entry.file_name().to_str() == Some(excluded_dir)
    }

    /// Symlinked directories are not walked, but a symlink to a file counts as that file.
    fn is_file_or_link_to_file(entry: &DirEntry) -> bool {
        let file_type = entry.file_type();
        file_type.is_file() || (file_type.is_symlink() && entry.path().is_file())
    }

    fn has_extension(path: &Path, extension: &str) -> bool {
        path.extension().and_then(|e| e.to_str()) == Some(extension)
    }
}
