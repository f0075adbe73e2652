//! Depth-bounded directory traversal

use std::collections::VecDeque;
use std::fs::DirEntry;
use std::path::{Path, PathBuf};

use crate::cancel::CancelToken;
use crate::error::SearchError;

/// Enumerates candidate files under a root, at most `max_depth` levels down
///
/// The root is depth 0. Files of a directory at depth `d` are yielded when
/// `d <= max_depth`; its subdirectories are entered only when
/// `d < max_depth`.
#[derive(Debug, Clone)]
pub struct BoundedTreeWalker {
    root: PathBuf,
    max_depth: usize,
    suffixes: Vec<String>,
}

impl BoundedTreeWalker {
    /// Create a walker matching any of `suffixes`, ignoring case
    pub fn new(
        root: impl Into<PathBuf>,
        max_depth: usize,
        suffixes: impl IntoIterator<Item = impl AsRef<str>>,
    ) -> Self {
        Self {
            root: root.into(),
            max_depth,
            suffixes: suffixes
                .into_iter()
                .map(|s| s.as_ref().to_lowercase())
                .collect(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Whether a file name carries one of the configured suffixes
    pub fn accepts(&self, file_name: &str) -> bool {
        let name = file_name.to_lowercase();
        self.suffixes.iter().any(|s| name.ends_with(s.as_str()))
    }

    /// Start a fresh traversal
    pub fn walk(&self, cancel: CancelToken) -> BoundedWalk<'_> {
        BoundedWalk {
            walker: self,
            cancel,
            dirs: vec![(self.root.clone(), 0)],
            pending: VecDeque::new(),
            unreadable: Vec::new(),
        }
    }
}

/// Lazy depth-first traversal produced by [`BoundedTreeWalker::walk`]
///
/// Entries of each directory are visited in file-name order and a
/// directory's files come before anything in its subdirectories.
pub struct BoundedWalk<'w> {
    walker: &'w BoundedTreeWalker,
    cancel: CancelToken,
    /// Directories still to list, with their depth; top of stack is next
    dirs: Vec<(PathBuf, usize)>,
    /// Matching files of the most recently listed directory
    pending: VecDeque<PathBuf>,
    unreadable: Vec<SearchError>,
}

impl BoundedWalk<'_> {
    /// Directories that could not be listed so far
    pub fn unreadable(&self) -> &[SearchError] {
        &self.unreadable
    }

    pub fn into_unreadable(self) -> Vec<SearchError> {
        self.unreadable
    }

    fn list(&mut self, dir: &Path, depth: usize) {
        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!("Skipping unreadable directory {}: {}", dir.display(), e);
                self.unreadable.push(SearchError::DirectoryAccess {
                    path: dir.to_path_buf(),
                    reason: e.to_string(),
                });
                return;
            }
        };

        let mut entries: Vec<DirEntry> = entries
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    tracing::warn!("Skipping unreadable entry in {}: {}", dir.display(), e);
                    None
                }
            })
            .collect();
        entries.sort_by_key(|entry| entry.file_name());

        let mut subdirs = Vec::new();
        for entry in entries {
            let path = entry.path();
            let Ok(file_type) = entry.file_type() else {
                tracing::warn!("Skipping entry with unknown type: {}", path.display());
                continue;
            };

            // Symlinks are followed for files only
            let is_file = if file_type.is_symlink() {
                std::fs::metadata(&path).is_ok_and(|m| m.is_file())
            } else {
                file_type.is_file()
            };

            if is_file {
                let name = entry.file_name();
                if self.walker.accepts(&name.to_string_lossy()) {
                    self.pending.push_back(path);
                }
            } else if file_type.is_dir() && depth < self.walker.max_depth {
                subdirs.push(path);
            }
        }

        // Reverse so the first subdirectory by name is popped first
        self.dirs
            .extend(subdirs.into_iter().rev().map(|p| (p, depth + 1)));
    }
}

impl Iterator for BoundedWalk<'_> {
    type Item = PathBuf;

    fn next(&mut self) -> Option<PathBuf> {
        loop {
            if self.cancel.is_cancelled() {
                self.dirs.clear();
                self.pending.clear();
                return None;
            }
            if let Some(path) = self.pending.pop_front() {
                return Some(path);
            }
            let (dir, depth) = self.dirs.pop()?;
            tracing::trace!("Listing {} (depth {})", dir.display(), depth);
            self.list(&dir, depth);
        }
    }
}
