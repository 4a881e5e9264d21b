//! Named artifact slots holding the latest generated source text.
//!
//! Each slot is a single file under the store root. Writes are
//! read-modify-write with no versioning and no concurrent writers; every
//! successful phase (repair, accepted optimization, accepted lint fix)
//! overwrites the main slot in place.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::debug;

/// On-disk store for named source artifacts.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute path of a named slot.
    pub fn path(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    /// Atomically write a slot's contents (temp file + rename).
    pub fn write(&self, name: &str, contents: &str) -> Result<PathBuf> {
        let path = self.path(name);
        fs::create_dir_all(&self.root)
            .with_context(|| format!("create artifact dir {}", self.root.display()))?;
        let tmp_path = path.with_extension("tmp");
        let mut buf = contents.to_string();
        if !buf.ends_with('\n') {
            buf.push('\n');
        }
        fs::write(&tmp_path, &buf)
            .with_context(|| format!("write temp artifact {}", tmp_path.display()))?;
        fs::rename(&tmp_path, &path)
            .with_context(|| format!("replace artifact {}", path.display()))?;
        debug!(artifact = name, bytes = buf.len(), "artifact written");
        Ok(path)
    }

    pub fn read(&self, name: &str) -> Result<String> {
        let path = self.path(name);
        fs::read_to_string(&path).with_context(|| format!("read artifact {}", path.display()))
    }

    /// Remove a slot. Missing slots are not an error.
    pub fn remove(&self, name: &str) -> Result<()> {
        let path = self.path(name);
        match fs::remove_file(&path) {
            Ok(()) => {
                debug!(artifact = name, "artifact removed");
                Ok(())
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => {
                Err(err).with_context(|| format!("remove artifact {}", path.display()))
            }
        }
    }

    pub fn exists(&self, name: &str) -> bool {
        self.path(name).exists()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_then_read_round_trips() {
        let temp = tempfile::tempdir().expect("tempdir");
        let store = ArtifactStore::new(temp.path());

        store.write("main.py", "print('hi')").expect("write");
        let contents = store.read("main.py").expect("read");
        assert_eq!(contents, "print('hi')\n");
    }

    #[test]
    fn write_overwrites_in_place() {
        let temp = tempfile::tempdir().expect("tempdir");
        let store = ArtifactStore::new(temp.path());

        store.write("main.py", "v1").expect("write v1");
        store.write("main.py", "v2").expect("write v2");
        assert_eq!(store.read("main.py").expect("read"), "v2\n");
    }

    #[test]
    fn remove_missing_slot_is_ok() {
        let temp = tempfile::tempdir().expect("tempdir");
        let store = ArtifactStore::new(temp.path());

        store.remove("never-written.py").expect("remove");
    }

    #[test]
    fn remove_deletes_slot() {
        let temp = tempfile::tempdir().expect("tempdir");
        let store = ArtifactStore::new(temp.path());

        store.write("temp.py", "x = 1").expect("write");
        assert!(store.exists("temp.py"));
        store.remove("temp.py").expect("remove");
        assert!(!store.exists("temp.py"));
    }
}
