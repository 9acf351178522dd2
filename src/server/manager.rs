// Server commands
// start / stop / console / info などの操作

use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::ExitStatus;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{Result, ServerError};
use crate::prompt::Prompt;
use crate::screen::{Multiplexer, SessionInspector};
use crate::server::{cached_jar, normalize_ram, JarResolver, ServerInfo};
use crate::store::{
    MetadataStore, PathStore, ServerProperties, StoredMetadata, KEY_AUTOSTART, KEY_JAVA_BIN,
    KEY_RAM, PROP_COMMAND_BLOCKS, PROP_PORT,
};

const STOP_COMMAND: &str = "stop";

/// Defaults used when building the launch command.
#[derive(Debug, Clone)]
pub struct LaunchSettings {
    pub java_binary: String,
    pub ram: String,
}

impl LaunchSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            java_binary: config.java.binary.clone(),
            ram: config.java.ram.clone(),
        }
    }
}

/// Observed state of one server directory.
#[derive(Debug, Clone, Serialize)]
pub struct ServerStatus {
    pub id: String,
    pub path: PathBuf,
    pub jar_file: Option<String>,
    pub session: String,
    pub running: bool,
    pub ram: String,
    pub java: String,
    pub autostart: bool,
}

/// Result of one server in `start auto`.
#[derive(Debug, Clone, Serialize)]
pub struct AutostartOutcome {
    pub id: String,
    pub path: PathBuf,
    pub error: Option<String>,
}

pub struct ServerManager<'a> {
    multiplexer: &'a dyn Multiplexer,
    prompt: &'a dyn Prompt,
    registry: PathStore,
    settings: LaunchSettings,
}

impl<'a> ServerManager<'a> {
    pub fn new(
        multiplexer: &'a dyn Multiplexer,
        prompt: &'a dyn Prompt,
        registry: PathStore,
        settings: LaunchSettings,
    ) -> Self {
        Self {
            multiplexer,
            prompt,
            registry,
            settings,
        }
    }

    /// Builds the full [`ServerInfo`] for `dir` and records it in the registry.
    pub fn resolve(&self, dir: &Path) -> Result<ServerInfo> {
        let mut info = ServerInfo::from_dir(dir)?;
        let jar = JarResolver::new(self.prompt).resolve(&info.path)?;
        info.jar_file = Some(jar);

        if let Err(err) = self.registry.append(&info.path_string()) {
            warn!(registry = %self.registry.path().display(), error = %err, "could not record server path");
        }
        Ok(info)
    }

    pub fn is_running(&self, info: &ServerInfo) -> bool {
        SessionInspector::new(self.multiplexer).is_running(&info.session_name())
    }

    pub fn status(&self, dir: &Path) -> Result<ServerStatus> {
        let info = self.resolve(dir)?;
        let running = self.is_running(&info);
        let metadata = load_metadata(&info);
        Ok(ServerStatus {
            session: info.session_name(),
            id: info.id,
            path: info.path,
            jar_file: info.jar_file,
            running,
            ram: self.reported_ram(&metadata),
            java: self.java_binary(&metadata),
            autostart: autostarts(&metadata),
        })
    }

    pub fn start(&self, dir: &Path, ram_override: Option<&str>) -> Result<ServerInfo> {
        let info = self.resolve(dir)?;
        if self.is_running(&info) {
            return Err(ServerError::AlreadyRunning(info.id));
        }

        let command = self.launch_command(&info, ram_override)?;
        locate_java(&command[0])?;
        info!(session = %info.session_name(), command = ?command, "starting server");
        self.multiplexer
            .launch(&info.session_name(), &info.path, &command)
            .map_err(|err| self.external(err))?;

        if !self.is_running(&info) {
            return Err(ServerError::StartFailed(info.id));
        }
        Ok(info)
    }

    /// Asks the server to shut down; does not wait for the process to exit.
    pub fn stop(&self, dir: &Path) -> Result<ServerInfo> {
        self.send(dir, STOP_COMMAND)
    }

    pub fn send(&self, dir: &Path, command: &str) -> Result<ServerInfo> {
        let info = self.resolve(dir)?;
        if !self.is_running(&info) {
            return Err(ServerError::NotRunning(info.id));
        }
        debug!(session = %info.session_name(), command = %command, "sending console command");
        self.multiplexer
            .send_keys(&info.session_name(), command)
            .map_err(|err| self.external(err))?;
        Ok(info)
    }

    pub fn console(&self, dir: &Path) -> Result<ExitStatus> {
        let info = self.resolve(dir)?;
        self.multiplexer
            .attach(&info.session_name(), &info.path)
            .map_err(|err| self.external(err))
    }

    /// Starts every registered server marked for autostart that isn't running.
    /// One failing server doesn't stop the others.
    pub fn start_auto(&self) -> Result<Vec<AutostartOutcome>> {
        let mut out = Vec::new();
        for path in self.registry.read()? {
            let info = match ServerInfo::from_dir(Path::new(&path)) {
                Ok(info) => info,
                Err(err) => {
                    warn!(path = %path, error = %err, "skipping registered server");
                    continue;
                }
            };
            if !autostarts(&load_metadata(&info)) || self.is_running(&info) {
                continue;
            }
            let error = match self.start(&info.path, None) {
                Ok(_) => None,
                Err(err) => {
                    warn!(server = %info.id, error = %err, "autostart failed");
                    Some(err.to_string())
                }
            };
            out.push(AutostartOutcome {
                id: info.id,
                path: info.path,
                error,
            });
        }
        Ok(out)
    }

    pub fn ram(&self, dir: &Path) -> Result<String> {
        let info = self.resolve(dir)?;
        Ok(self.reported_ram(&load_metadata(&info)))
    }

    pub fn set_ram(&self, dir: &Path, value: &str) -> Result<String> {
        let ram = normalize_ram(value)?;
        let info = self.resolve(dir)?;
        MetadataStore::for_server(&info.path).set(KEY_RAM, &ram)?;
        Ok(ram)
    }

    pub fn java(&self, dir: &Path) -> Result<String> {
        let info = self.resolve(dir)?;
        Ok(self.java_binary(&load_metadata(&info)))
    }

    /// Stores the resolved path of `binary`, which must be an executable.
    pub fn set_java(&self, dir: &Path, binary: &str) -> Result<String> {
        let java = locate_java(binary)?;
        let info = self.resolve(dir)?;
        MetadataStore::for_server(&info.path).set(KEY_JAVA_BIN, &java)?;
        Ok(java)
    }

    pub fn autostart(&self, dir: &Path) -> Result<bool> {
        let info = self.resolve(dir)?;
        Ok(autostarts(&load_metadata(&info)))
    }

    pub fn set_autostart(&self, dir: &Path, enable: bool) -> Result<()> {
        let info = self.resolve(dir)?;
        MetadataStore::for_server(&info.path).set(KEY_AUTOSTART, bool_value(enable))?;
        Ok(())
    }

    pub fn property(&self, dir: &Path, key: &str) -> Result<String> {
        let info = self.resolve(dir)?;
        ServerProperties::load(&info.path)?
            .get(key)
            .map(str::to_string)
            .ok_or_else(|| ServerError::UnknownProperty(key.to_string()))
    }

    /// Writes `key=value` into server.properties and returns the old value.
    pub fn set_property(&self, dir: &Path, key: &str, value: &str) -> Result<Option<String>> {
        let info = self.resolve(dir)?;
        let mut props = ServerProperties::load(&info.path)?;
        let previous = props.set(key, value);
        props.save()?;
        debug!(key = %key, previous = ?previous, value = %value, "updated server property");
        Ok(previous)
    }

    pub fn port(&self, dir: &Path) -> Result<String> {
        self.property(dir, PROP_PORT)
    }

    pub fn set_port(&self, dir: &Path, port: u16) -> Result<()> {
        self.set_property(dir, PROP_PORT, &port.to_string())?;
        Ok(())
    }

    /// Missing means disabled, as in a freshly generated server.properties.
    pub fn command_blocks(&self, dir: &Path) -> Result<bool> {
        match self.property(dir, PROP_COMMAND_BLOCKS) {
            Ok(value) => Ok(value == "true"),
            Err(ServerError::UnknownProperty(_)) => Ok(false),
            Err(err) => Err(err),
        }
    }

    pub fn set_command_blocks(&self, dir: &Path, enable: bool) -> Result<()> {
        self.set_property(dir, PROP_COMMAND_BLOCKS, bool_value(enable))?;
        Ok(())
    }

    /// Registered servers; vanished directories are skipped, never pruned.
    pub fn list(&self, only_running: bool) -> Result<Vec<ServerStatus>> {
        let sessions = SessionInspector::new(self.multiplexer).list_session_names();
        let mut out = Vec::new();
        for path in self.registry.read()? {
            let info = match ServerInfo::from_dir(Path::new(&path)) {
                Ok(info) => info,
                Err(err) => {
                    warn!(path = %path, error = %err, "skipping registered server");
                    continue;
                }
            };
            let session = info.session_name();
            let running = sessions.iter().any(|name| *name == session);
            if only_running && !running {
                continue;
            }
            let metadata = load_metadata(&info);
            out.push(ServerStatus {
                jar_file: cached_jar(&MetadataStore::for_server(&info.path), &info.path),
                ram: self.reported_ram(&metadata),
                java: self.java_binary(&metadata),
                autostart: autostarts(&metadata),
                id: info.id,
                path: info.path,
                session,
                running,
            });
        }
        Ok(out)
    }

    /// Directory of the first registered server whose id is `id`.
    pub fn find_dir(&self, id: &str) -> Result<PathBuf> {
        for path in self.registry.read()? {
            if let Ok(info) = ServerInfo::from_dir(Path::new(&path)) {
                if info.id == id {
                    return Ok(info.path);
                }
            }
        }
        Err(ServerError::UnknownServer(id.to_string()))
    }

    pub fn launch_command(&self, info: &ServerInfo, ram_override: Option<&str>) -> Result<Vec<String>> {
        let jar = info
            .jar_file
            .clone()
            .ok_or_else(|| ServerError::NoJarFound(info.path.clone()))?;
        let metadata = load_metadata(info);
        let ram = match ram_override {
            Some(value) => normalize_ram(value)?,
            None => self.effective_ram(&metadata)?,
        };
        let java = self.java_binary(&metadata);
        Ok(vec![java, format!("-Xmx{}", ram), "-jar".to_string(), jar])
    }

    fn effective_ram(&self, metadata: &StoredMetadata) -> Result<String> {
        normalize_ram(metadata.get(KEY_RAM).unwrap_or(&self.settings.ram))
    }

    /// Heap size for display; an invalid value is shown as written.
    fn reported_ram(&self, metadata: &StoredMetadata) -> String {
        let value = metadata.get(KEY_RAM).unwrap_or(&self.settings.ram);
        normalize_ram(value).unwrap_or_else(|err| {
            warn!(value = %value, error = %err, "invalid ram setting");
            value.to_string()
        })
    }

    fn java_binary(&self, metadata: &StoredMetadata) -> String {
        metadata
            .get(KEY_JAVA_BIN)
            .cloned()
            .unwrap_or_else(|| self.settings.java_binary.clone())
    }

    fn external(&self, err: anyhow::Error) -> ServerError {
        ServerError::ExternalProcess {
            program: self.multiplexer.program().to_string(),
            reason: format!("{:#}", err),
        }
    }
}

fn autostarts(metadata: &StoredMetadata) -> bool {
    metadata.get(KEY_AUTOSTART).map(String::as_str) == Some("true")
}

fn bool_value(enable: bool) -> &'static str {
    if enable {
        "true"
    } else {
        "false"
    }
}

/// Absolute path of an executable, looked up on `PATH` when `binary` is a bare name.
fn locate_java(binary: &str) -> Result<String> {
    which::which(binary)
        .map(|path| path.to_string_lossy().to_string())
        .map_err(|_| ServerError::JavaNotFound(binary.to_string()))
}

fn load_metadata(info: &ServerInfo) -> StoredMetadata {
    let store = MetadataStore::for_server(&info.path);
    store.load_or_default().unwrap_or_else(|err| {
        warn!(path = %store.path().display(), error = %err, "could not read server metadata");
        StoredMetadata::new()
    })
}
