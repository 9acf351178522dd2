// Jar resolution
// サーバー jar の特定（キャッシュ → 走査 → 選択）

use std::fs;
use std::path::Path;
use tracing::{debug, warn};

use crate::error::{Result, ServerError};
use crate::prompt::Prompt;
use crate::store::{MetadataStore, KEY_JAR};

const SELECT_LABEL: &str = "Select Jar-File that runs the Server";

pub struct JarResolver<'a> {
    prompt: &'a dyn Prompt,
}

impl<'a> JarResolver<'a> {
    pub fn new(prompt: &'a dyn Prompt) -> Self {
        Self { prompt }
    }

    pub fn resolve(&self, dir: &Path) -> Result<String> {
        let store = MetadataStore::for_server(dir);

        if let Some(cached) = cached_jar(&store, dir) {
            return Ok(cached);
        }

        let mut jars = scan_jars(dir)?;
        match jars.len() {
            0 => Err(ServerError::NoJarFound(dir.to_path_buf())),
            // a single candidate is not written back
            1 => Ok(jars.remove(0)),
            _ => {
                let chosen = self
                    .prompt
                    .select(SELECT_LABEL, &jars)
                    .map_err(ServerError::UserCancelled)?;
                if let Err(err) = store.set(KEY_JAR, &chosen) {
                    warn!(error = %err, "could not cache jar choice");
                }
                Ok(chosen)
            }
        }
    }
}

/// The cached jar, if metadata names one that still exists.
pub fn cached_jar(store: &MetadataStore, dir: &Path) -> Option<String> {
    let data = match store.load() {
        Ok(data) => data,
        Err(err) => {
            debug!(error = %err, "no cached metadata");
            return None;
        }
    };
    let jar = data.get(KEY_JAR)?;
    if dir.join(jar).is_file() {
        return Some(jar.clone());
    }
    warn!(jar = %jar, "cached jar file does not exist, rescanning");
    None
}

/// File names ending in `.jar` directly inside `dir`, sorted.
pub fn scan_jars(dir: &Path) -> Result<Vec<String>> {
    let mut jars = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().to_string();
        if name.ends_with(".jar") && entry.path().is_file() {
            jars.push(name);
        }
    }
    jars.sort();
    Ok(jars)
}
