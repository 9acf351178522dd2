use std::path::{Path, PathBuf};

use crate::error::{Result, ServerError};

pub const SESSION_PREFIX: &str = "mc-";

/// A server directory as seen by one command invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerInfo {
    pub id: String,
    pub path: PathBuf,
    pub jar_file: Option<String>,
}

impl ServerInfo {
    /// Canonicalizes `dir` and derives the id from its base name.
    pub fn from_dir(dir: &Path) -> Result<Self> {
        let path = dir
            .canonicalize()
            .map_err(|_| ServerError::NotAServerDirectory(dir.to_path_buf()))?;
        if !path.is_dir() {
            return Err(ServerError::NotAServerDirectory(path));
        }
        let id = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .ok_or_else(|| ServerError::NotAServerDirectory(path.clone()))?;
        Ok(Self {
            id,
            path,
            jar_file: None,
        })
    }

    pub fn session_name(&self) -> String {
        format!("{}{}", SESSION_PREFIX, self.id)
    }

    pub fn path_string(&self) -> String {
        self.path.to_string_lossy().to_string()
    }
}

/// Normalizes a heap size: `6` → `6G`, `512m` → `512M`.
pub fn normalize_ram(value: &str) -> Result<String> {
    let value = value.trim();
    let invalid = || ServerError::InvalidRam(value.to_string());

    let (digits, unit) = match value.char_indices().last() {
        Some((idx, ch)) if ch.is_ascii_alphabetic() => (&value[..idx], ch.to_ascii_uppercase()),
        Some(_) => (value, 'G'),
        None => return Err(invalid()),
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    if unit != 'G' && unit != 'M' {
        return Err(invalid());
    }
    Ok(format!("{}{}", digits, unit))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn id_and_session_come_from_directory_name() {
        let temp = tempdir().unwrap();
        let dir = temp.path().join("survival");
        std::fs::create_dir(&dir).unwrap();

        let info = ServerInfo::from_dir(&dir).unwrap();
        assert_eq!(info.id, "survival");
        assert_eq!(info.session_name(), "mc-survival");
        assert_eq!(info.path, dir.canonicalize().unwrap());
        assert!(info.jar_file.is_none());
    }

    #[test]
    fn missing_directory_is_not_a_server() {
        let temp = tempdir().unwrap();
        let result = ServerInfo::from_dir(&temp.path().join("nope"));
        assert!(matches!(result, Err(ServerError::NotAServerDirectory(_))));
    }

    #[test]
    fn regular_file_is_not_a_server() {
        let temp = tempdir().unwrap();
        let file = temp.path().join("server.jar");
        std::fs::write(&file, b"").unwrap();
        assert!(matches!(
            ServerInfo::from_dir(&file),
            Err(ServerError::NotAServerDirectory(_))
        ));
    }

    #[test]
    fn ram_values_are_normalized() {
        assert_eq!(normalize_ram("4G").unwrap(), "4G");
        assert_eq!(normalize_ram("512m").unwrap(), "512M");
        assert_eq!(normalize_ram("6").unwrap(), "6G");
        assert_eq!(normalize_ram(" 8g ").unwrap(), "8G");
    }

    #[test]
    fn bad_ram_values_are_rejected() {
        for value in ["", "G", "4K", "four", "4.5G", "-2G", "4GB"] {
            assert!(
                matches!(normalize_ram(value), Err(ServerError::InvalidRam(_))),
                "{value} should be rejected"
            );
        }
    }
}
