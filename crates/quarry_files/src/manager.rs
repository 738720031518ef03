//! The file manager and its write journal.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::error::FileError;

/// Suffix of the temporary sibling used for all-or-nothing writes.
const TEMP_SUFFIX: &str = ".quarry-tmp";

/// Most recent writes kept in the journal; older entries are dropped.
pub const JOURNAL_LIMIT: usize = 1024;

/// Kind of change a write made on disk.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FileChange {
    /// The file did not exist before.
    Created,
    /// The file existed with different content.
    Updated,
    /// The file was deleted.
    Removed,
}

/// One recorded write, relative to the project root.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileEvent {
    /// Path relative to the project root.
    pub path: PathBuf,
    /// What the write did.
    pub change: FileChange,
}

/// Reads and writes files below a project root.
///
/// All paths passed in are relative to the root. Writes never leave a
/// partially written file behind: content goes to a temporary sibling first
/// and is renamed into place. The journal holds at most [`JOURNAL_LIMIT`]
/// events.
pub struct FileManager {
    root: PathBuf,
    journal: RefCell<VecDeque<FileEvent>>,
}

impl FileManager {
    /// Creates a file manager rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            journal: RefCell::new(VecDeque::new()),
        }
    }

    /// Returns the project root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolves a project-relative path to an absolute one.
    pub fn resolve(&self, relative: &Path) -> Result<PathBuf, FileError> {
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes {
            return Err(FileError::OutsideRoot {
                path: relative.to_path_buf(),
            });
        }
        Ok(self.root.join(relative))
    }

    /// Returns `true` if a file exists at the project-relative path.
    pub fn exists(&self, relative: &Path) -> bool {
        self.resolve(relative).map(|p| p.is_file()).unwrap_or(false)
    }

    /// Reads a file to a string.
    pub fn read_to_string(&self, relative: &Path) -> Result<String, FileError> {
        let path = self.resolve(relative)?;
        fs::read_to_string(&path).map_err(|e| FileError::Io { path, source: e })
    }

    /// Reads a file if it exists, returning `None` otherwise.
    pub fn read_if_exists(&self, relative: &Path) -> Result<Option<String>, FileError> {
        if self.exists(relative) {
            self.read_to_string(relative).map(Some)
        } else {
            Ok(None)
        }
    }

    /// Writes `contents` unless the file already holds exactly that content.
    ///
    /// Returns the change made, or `None` when the write was skipped.
    pub fn create_or_update_if_required(
        &self,
        relative: &Path,
        contents: &str,
    ) -> Result<Option<FileChange>, FileError> {
        let change = match self.read_if_exists(relative)? {
            Some(existing) if existing == contents => return Ok(None),
            Some(_) => FileChange::Updated,
            None => FileChange::Created,
        };
        self.write_atomically(relative, contents)?;
        tracing::info!(path = %relative.display(), ?change, "wrote file");
        self.record(relative, change);
        Ok(Some(change))
    }

    /// Deletes the file if it exists. Returns `true` when a file was removed.
    pub fn remove_if_exists(&self, relative: &Path) -> Result<bool, FileError> {
        if !self.exists(relative) {
            return Ok(false);
        }
        let path = self.resolve(relative)?;
        fs::remove_file(&path).map_err(|e| FileError::Io { path, source: e })?;
        tracing::info!(path = %relative.display(), "removed file");
        self.record(relative, FileChange::Removed);
        Ok(true)
    }

    /// Creates the file only if nothing exists at the path yet.
    ///
    /// Returns `true` when the file was created.
    pub fn create_if_absent(&self, relative: &Path, contents: &str) -> Result<bool, FileError> {
        if self.exists(relative) {
            return Ok(false);
        }
        self.create_or_update_if_required(relative, contents)
            .map(|change| change.is_some())
    }

    /// Lists files below `dir` whose names end with `suffix`, sorted by path.
    ///
    /// Returned paths are project-relative. A missing directory yields an
    /// empty list.
    pub fn list(&self, dir: &Path, suffix: &str) -> Result<Vec<PathBuf>, FileError> {
        let abs = self.resolve(dir)?;
        let mut files = Vec::new();
        if abs.is_dir() {
            walk_dir(&abs, suffix, &mut files)?;
        }
        let mut relative: Vec<PathBuf> = files
            .into_iter()
            .filter_map(|p| p.strip_prefix(&self.root).ok().map(Path::to_path_buf))
            .collect();
        relative.sort();
        Ok(relative)
    }

    /// Returns a snapshot of every write recorded so far.
    pub fn journal(&self) -> Vec<FileEvent> {
        self.journal.borrow().iter().cloned().collect()
    }

    /// Takes the recorded writes, leaving the journal empty.
    pub fn take_journal(&self) -> Vec<FileEvent> {
        self.journal.borrow_mut().drain(..).collect()
    }

    fn record(&self, relative: &Path, change: FileChange) {
        let mut journal = self.journal.borrow_mut();
        if journal.len() == JOURNAL_LIMIT {
            journal.pop_front();
        }
        journal.push_back(FileEvent {
            path: relative.to_path_buf(),
            change,
        });
    }

    fn write_atomically(&self, relative: &Path, contents: &str) -> Result<(), FileError> {
        let path = self.resolve(relative)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| FileError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
        let mut temp = path.clone().into_os_string();
        temp.push(TEMP_SUFFIX);
        let temp = PathBuf::from(temp);

        if let Err(e) = fs::write(&temp, contents) {
            let _ = fs::remove_file(&temp);
            return Err(FileError::Io {
                path: temp,
                source: e,
            });
        }
        fs::rename(&temp, &path).map_err(|e| {
            let _ = fs::remove_file(&temp);
            FileError::Io { path, source: e }
        })
    }
}

/// Recursively collects files whose names end with `suffix`.
fn walk_dir(dir: &Path, suffix: &str, files: &mut Vec<PathBuf>) -> Result<(), FileError> {
    let entries = fs::read_dir(dir).map_err(|e| FileError::Io {
        path: dir.to_path_buf(),
        source: e,
    })?;
    for entry in entries {
        let entry = entry.map_err(|e| FileError::Io {
            path: dir.to_path_buf(),
            source: e,
        })?;
        let path = entry.path();
        if path.is_dir() {
            walk_dir(&path, suffix, files)?;
        } else if path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.ends_with(suffix))
        {
            files.push(path);
        }
    }
    Ok(())
}
