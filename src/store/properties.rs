// server.properties
// Minecraft 本体の設定ファイルの読み書き

use std::fs;
use std::path::{Path, PathBuf};

use crate::store::StoreError;

pub const PROPERTIES_FILE: &str = "server.properties";

pub const PROP_PORT: &str = "server-port";
pub const PROP_COMMAND_BLOCKS: &str = "enable-command-block";

/// `server.properties` kept as raw lines so comments and order survive a rewrite.
#[derive(Debug, Clone)]
pub struct ServerProperties {
    path: PathBuf,
    lines: Vec<String>,
}

impl ServerProperties {
    pub fn for_server(server_dir: &Path) -> Self {
        Self {
            path: server_dir.join(PROPERTIES_FILE),
            lines: Vec::new(),
        }
    }

    /// Reads the file; a server that never ran has none, which reads as empty.
    pub fn load(server_dir: &Path) -> Result<Self, StoreError> {
        let mut props = Self::for_server(server_dir);
        match fs::read_to_string(&props.path) {
            Ok(content) => {
                props.lines = content.lines().map(|line| line.trim().to_string()).collect();
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => return Err(StoreError::io(&props.path, err)),
        }
        Ok(props)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.lines
            .iter()
            .filter_map(|line| split_property(line))
            .filter(|(k, _)| *k == key)
            .map(|(_, v)| v)
            .last()
    }

    /// Sets `key` in place (or appends it) and returns the previous value.
    pub fn set(&mut self, key: &str, value: &str) -> Option<String> {
        let previous = self.get(key).map(str::to_string);
        let entry = format!("{}={}", key, value);
        let mut replaced = false;
        for line in self.lines.iter_mut() {
            if matches!(split_property(line), Some((k, _)) if k == key) {
                *line = entry.clone();
                replaced = true;
            }
        }
        if !replaced {
            self.lines.push(entry);
        }
        previous
    }

    pub fn save(&self) -> Result<(), StoreError> {
        let mut content = self.lines.join("\n");
        content.push('\n');
        fs::write(&self.path, content).map_err(|e| StoreError::io(&self.path, e))
    }
}

fn split_property(line: &str) -> Option<(&str, &str)> {
    if line.starts_with('#') {
        return None;
    }
    line.split_once('=')
}
