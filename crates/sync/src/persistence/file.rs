//! Filesystem snapshot store.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::{SnapshotError, SnapshotStore};

/// Snapshot store keeping one `<key>.json` file per key in a directory.
///
/// The directory is created on first write. Writes go to a temporary file
/// that is renamed over the target so a crash never leaves a half-written
/// snapshot.
#[derive(Debug, Clone)]
pub struct FileSnapshotStore {
    dir: PathBuf,
}

impl FileSnapshotStore {
    #[must_use]
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// Directory holding the snapshot files.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, key: &str) -> PathBuf {
        let file_name: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{file_name}.json"))
    }
}

impl SnapshotStore for FileSnapshotStore {
    fn read(&self, key: &str) -> Result<Option<String>, SnapshotError> {
        match fs::read_to_string(self.path(key)) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, key: &str, text: &str) -> Result<(), SnapshotError> {
        fs::create_dir_all(&self.dir)?;
        let target = self.path(key);
        let staging = target.with_extension("json.tmp");
        fs::write(&staging, text)?;
        fs::rename(&staging, &target)?;
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), SnapshotError> {
        match fs::remove_file(self.path(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
