// Path registry
// 既知サーバーディレクトリの一覧 (~/.mcsrvrc)

use anyhow::{anyhow, Result};
use std::fs::{self, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::store::StoreError;

pub const REGISTRY_FILE: &str = ".mcsrvrc";

/// Append-only list of server directories, one per line.
#[derive(Debug, Clone)]
pub struct PathStore {
    path: PathBuf,
}

impl PathStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn default_path() -> Result<PathBuf> {
        let home = std::env::var("HOME").map_err(|_| anyhow!("HOME not set"))?;
        Ok(PathBuf::from(home).join(REGISTRY_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Registered paths in insertion order. A missing file reads as empty.
    pub fn read(&self) -> Result<Vec<String>, StoreError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(StoreError::io(&self.path, err)),
        };
        Ok(content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect())
    }

    /// Appends `dir` unless an identical entry already exists.
    pub fn append(&self, dir: &str) -> Result<(), StoreError> {
        if self.read()?.iter().any(|known| known == dir) {
            return Ok(());
        }

        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| StoreError::io(&self.path, e))?;
        // a hand-edited file may lack the trailing newline
        let separator = if ends_with_newline(&mut file).map_err(|e| StoreError::io(&self.path, e))? {
            ""
        } else {
            "\n"
        };
        write!(file, "{}{}\n", separator, dir).map_err(|e| StoreError::io(&self.path, e))
    }
}

/// True for an empty file or one whose last byte is `\n`.
fn ends_with_newline(file: &mut fs::File) -> std::io::Result<bool> {
    let len = file.seek(SeekFrom::End(0))?;
    if len == 0 {
        return Ok(true);
    }
    file.seek(SeekFrom::End(-1))?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last)?;
    Ok(last[0] == b'\n')
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_registry_reads_empty() {
        let temp = tempdir().unwrap();
        let store = PathStore::new(temp.path().join(".mcsrvrc"));

        assert!(store.read().unwrap().is_empty());
        assert!(!store.path().exists());
    }

    #[test]
    fn append_is_idempotent() {
        let temp = tempdir().unwrap();
        let store = PathStore::new(temp.path().join(".mcsrvrc"));

        store.append("/srv/survival").unwrap();
        store.append("/srv/survival").unwrap();

        assert_eq!(store.read().unwrap(), vec!["/srv/survival".to_string()]);
        assert_eq!(
            fs::read_to_string(store.path()).unwrap(),
            "/srv/survival\n"
        );
    }

    #[test]
    fn append_keeps_insertion_order() {
        let temp = tempdir().unwrap();
        let store = PathStore::new(temp.path().join(".mcsrvrc"));

        store.append("/srv/survival").unwrap();
        store.append("/srv/creative").unwrap();
        store.append("/srv/survival").unwrap();

        assert_eq!(
            store.read().unwrap(),
            vec!["/srv/survival".to_string(), "/srv/creative".to_string()]
        );
    }

    #[test]
    fn dedup_is_exact_string_match() {
        let temp = tempdir().unwrap();
        let store = PathStore::new(temp.path().join(".mcsrvrc"));

        store.append("/srv/survival").unwrap();
        store.append("/srv/survival/").unwrap();

        assert_eq!(store.read().unwrap().len(), 2);
    }

    #[test]
    fn append_after_unterminated_last_line() {
        let temp = tempdir().unwrap();
        let path = temp.path().join(".mcsrvrc");
        fs::write(&path, "/srv/a").unwrap();

        let store = PathStore::new(path);
        store.append("/srv/b").unwrap();

        assert_eq!(
            store.read().unwrap(),
            vec!["/srv/a".to_string(), "/srv/b".to_string()]
        );
        assert_eq!(fs::read_to_string(store.path()).unwrap(), "/srv/a\n/srv/b\n");
    }

    #[test]
    fn blank_lines_are_ignored() {
        let temp = tempdir().unwrap();
        let path = temp.path().join(".mcsrvrc");
        fs::write(&path, "\n/srv/a\n\n  \n/srv/b\n").unwrap();

        let store = PathStore::new(path);
        assert_eq!(
            store.read().unwrap(),
            vec!["/srv/a".to_string(), "/srv/b".to_string()]
        );
    }
}
