// Config module
// 設定ファイル管理

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_JAVA_BINARY: &str = "java";
pub const DEFAULT_RAM: &str = "4G";
pub const DEFAULT_MULTIPLEXER: &str = "screen";

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub java: JavaConfig,
    #[serde(default)]
    pub multiplexer: MultiplexerConfig,
    #[serde(default)]
    pub registry: Option<RegistryConfig>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct JavaConfig {
    #[serde(default = "default_java_binary")]
    pub binary: String,
    #[serde(default = "default_ram")]
    pub ram: String,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct MultiplexerConfig {
    #[serde(default = "default_multiplexer")]
    pub binary: String,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct RegistryConfig {
    pub path: Option<PathBuf>,
}

impl Default for JavaConfig {
    fn default() -> Self {
        Self {
            binary: default_java_binary(),
            ram: default_ram(),
        }
    }
}

impl Default for MultiplexerConfig {
    fn default() -> Self {
        Self {
            binary: default_multiplexer(),
        }
    }
}

fn default_java_binary() -> String {
    DEFAULT_JAVA_BINARY.to_string()
}

fn default_ram() -> String {
    DEFAULT_RAM.to_string()
}

fn default_multiplexer() -> String {
    DEFAULT_MULTIPLEXER.to_string()
}

impl Config {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> anyhow::Result<Self> {
        let mut config: Config = toml::from_str(content)?;
        config.expand_env_vars();
        Ok(config)
    }

    /// Path override for the known-servers registry, if one is configured.
    pub fn registry_path(&self) -> Option<&Path> {
        self.registry.as_ref().and_then(|r| r.path.as_deref())
    }

    fn expand_env_vars(&mut self) {
        self.java.binary = expand_env_vars_in_string(&self.java.binary);
        self.java.ram = expand_env_vars_in_string(&self.java.ram);
        self.multiplexer.binary = expand_env_vars_in_string(&self.multiplexer.binary);
        if let Some(registry) = &mut self.registry {
            if let Some(path) = &registry.path {
                let expanded = expand_env_vars_in_string(&path.to_string_lossy());
                registry.path = Some(PathBuf::from(expanded));
            }
        }
    }
}

/// 設定ファイル候補（後勝ち）
pub fn config_candidates() -> Vec<PathBuf> {
    let mut candidates = Vec::new();
    if let Some(home) = std::env::var_os("HOME") {
        candidates.push(PathBuf::from(home).join(".mcsrv").join("config.toml"));
    }
    candidates.push(PathBuf::from(".").join(".mcsrv").join("config.toml"));
    candidates
}

pub fn load_config() -> Config {
    let mut config = Config::default();
    for path in config_candidates() {
        if !path.exists() {
            continue;
        }
        match Config::load(&path) {
            Ok(loaded) => {
                tracing::debug!(path = %path.display(), "loaded config");
                config = loaded;
            }
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "skipping unreadable config");
            }
        }
    }
    config
}

/// Replaces `$NAME` and `${NAME}` with the variable's value.
///
/// Unset variables and a bare `$` are kept as written.
fn expand_env_vars_in_string(input: &str) -> String {
    let mut output = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(pos) = rest.find('$') {
        output.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];

        let (name, consumed) = if let Some(braced) = after.strip_prefix('{') {
            match braced.find('}') {
                Some(close) => (&braced[..close], close + 2),
                None => (braced, braced.len() + 1),
            }
        } else {
            let len = after
                .find(|ch: char| !is_env_var_char(ch))
                .unwrap_or(after.len());
            (&after[..len], len)
        };
        let original = &rest[pos..pos + 1 + consumed];

        let value = if name.is_empty() {
            None
        } else {
            std::env::var(name).ok()
        };
        match value {
            Some(value) => output.push_str(&value),
            None if original.starts_with("${") && !original.ends_with('}') => {
                // unterminated `${NAME` reads as `${NAME}`
                output.push_str(original);
                output.push('}');
            }
            None => output.push_str(original),
        }
        rest = &rest[pos + 1 + consumed..];
    }
    output.push_str(rest);
    output
}

fn is_env_var_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_'
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_yields_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.java.binary, "java");
        assert_eq!(config.java.ram, "4G");
        assert_eq!(config.multiplexer.binary, "screen");
        assert!(config.registry_path().is_none());
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = Config::parse(
            r#"
[java]
ram = "8G"

[registry]
path = "/srv/registry"
"#,
        )
        .unwrap();
        assert_eq!(config.java.binary, "java");
        assert_eq!(config.java.ram, "8G");
        assert_eq!(config.registry_path(), Some(Path::new("/srv/registry")));
    }

    #[test]
    fn expands_path_variable() {
        let path = std::env::var("PATH").unwrap_or_default();
        assert_eq!(expand_env_vars_in_string("${PATH}/java"), format!("{}/java", path));
        assert_eq!(expand_env_vars_in_string("$PATH"), path);
    }

    #[test]
    fn unknown_variables_are_left_alone() {
        let input = "${MCSRV_SURELY_UNSET_VARIABLE}/bin/$MCSRV_SURELY_UNSET_VARIABLE";
        assert_eq!(expand_env_vars_in_string(input), input);
        assert_eq!(expand_env_vars_in_string("cost $"), "cost $");
        assert_eq!(expand_env_vars_in_string("${}"), "${}");
        assert_eq!(expand_env_vars_in_string("a $ b"), "a $ b");
    }

    #[test]
    fn unterminated_braces_are_closed() {
        let path = std::env::var("PATH").unwrap_or_default();
        assert_eq!(expand_env_vars_in_string("${PATH"), path);
        assert_eq!(
            expand_env_vars_in_string("/opt/${MCSRV_SURELY_UNSET_VARIABLE"),
            "/opt/${MCSRV_SURELY_UNSET_VARIABLE}"
        );
        assert_eq!(expand_env_vars_in_string("${"), "${}");
    }

    #[test]
    fn invalid_toml_is_an_error() {
        assert!(Config::parse("[java\nbinary = ").is_err());
    }
}
