use anyhow::{anyhow, Result};
use clap::builder::BoolishValueParser;
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::json;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::config::{load_config, Config};
use crate::prompt::TerminalSelect;
use crate::screen::Screen;
use crate::server::{AutostartOutcome, LaunchSettings, ServerManager, ServerStatus};
use crate::store::PathStore;

const LONG_VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), " (built ", env!("BUILD_TIMESTAMP"), ")");

#[derive(Parser, Debug)]
#[command(
    name = "mcsrv",
    version,
    long_version = LONG_VERSION,
    about = "Manage Minecraft servers running in screen sessions",
    long_about = None
)]
pub struct Cli {
    /// サーバーディレクトリ（省略時はカレントディレクトリ）
    #[arg(short, long, global = true)]
    pub dir: Option<PathBuf>,

    /// 出力フォーマット (text/json)
    #[arg(long, default_value = "text", global = true)]
    pub output_format: String,

    /// 詳細ログ
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// サブコマンド
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the current server
    Start {
        #[command(subcommand)]
        target: Option<StartTarget>,

        /// Heap size for this launch only (e.g. 6G, 512M)
        #[arg(short, long)]
        ram: Option<String>,

        /// Attach to the console after starting
        #[arg(short, long)]
        console: bool,
    },

    /// Show the console of the current server if it's running
    Console,

    /// Stop the current server
    Stop,

    /// Show information about the current server
    Info,

    /// Send a command to the server console
    Send {
        /// Console command, e.g. `say hello`
        #[arg(required = true, num_args = 1..)]
        command: Vec<String>,
    },

    /// Get or set the heap size of the current server
    Ram {
        /// New heap size (e.g. 6G, 512M, 8)
        value: Option<String>,
    },

    /// List known servers
    List {
        /// Only running servers
        #[arg(short, long)]
        running: bool,
    },

    /// Print the directory of a known server
    Dir {
        /// Server id (directory name)
        id: String,
    },

    /// Get or set the java executable used to run the current server
    Java {
        /// Executable name or path; must resolve to an executable file
        path: Option<String>,
    },

    /// Get or set whether `start auto` starts the current server
    Autostart {
        #[arg(value_parser = BoolishValueParser::new())]
        enable: Option<bool>,
    },

    /// Read or change a value in server.properties
    Properties {
        key: String,
        value: Option<String>,
    },

    /// Get or set the server port
    Port { port: Option<u16> },

    /// Enable or disable command blocks
    Commandblocks {
        #[arg(value_parser = BoolishValueParser::new())]
        enable: Option<bool>,
    },
}

#[derive(Subcommand, Debug)]
pub enum StartTarget {
    /// Start every known server that has autostart enabled
    Auto,
}

const RESTART_NOTE: &str = "restart the server to apply the change";

impl Cli {
    pub fn execute(self) -> Result<()> {
        let config = load_config();
        let screen = Screen::new(config.multiplexer.binary.clone());
        let prompt = TerminalSelect;
        let manager = ServerManager::new(
            &screen,
            &prompt,
            PathStore::new(registry_path(&config)?),
            LaunchSettings::from_config(&config),
        );
        self.execute_command(&manager)
    }

    fn execute_command(&self, manager: &ServerManager<'_>) -> Result<()> {
        match &self.command {
            Commands::Start {
                target: Some(StartTarget::Auto),
                ..
            } => self.start_auto(manager),
            Commands::Start { ram, console, .. } => {
                let dir = self.server_dir()?;
                manager.start(&dir, ram.as_deref())?;
                self.print_status("server started");
                if *console {
                    self.attach(manager, &dir)?;
                }
                Ok(())
            }
            Commands::Console => {
                let dir = self.server_dir()?;
                self.attach(manager, &dir)
            }
            Commands::Stop => {
                manager.stop(&self.server_dir()?)?;
                self.print_status("server stopped");
                Ok(())
            }
            Commands::Info => {
                let status = manager.status(&self.server_dir()?)?;
                self.print_info(&status);
                Ok(())
            }
            Commands::Send { command } => {
                manager.send(&self.server_dir()?, &command.join(" "))?;
                self.print_status("command sent");
                Ok(())
            }
            Commands::Ram { value } => {
                let dir = self.server_dir()?;
                match value {
                    Some(value) => {
                        let ram = manager.set_ram(&dir, value)?;
                        self.print_value("ram", &ram, &format!("ram set to {}", ram));
                        self.print_status(RESTART_NOTE);
                    }
                    None => {
                        let ram = manager.ram(&dir)?;
                        self.print_value("ram", &ram, &format!("allocated ram: {}", ram));
                    }
                }
                Ok(())
            }
            Commands::List { running } => {
                let servers = manager.list(*running)?;
                self.print_list(&servers);
                Ok(())
            }
            Commands::Dir { id } => {
                let path = manager.find_dir(id)?;
                let path = path.display().to_string();
                self.print_value("path", &path, &path);
                Ok(())
            }
            Commands::Java { path } => {
                let dir = self.server_dir()?;
                match path {
                    Some(path) => {
                        let java = manager.set_java(&dir, path)?;
                        self.print_value("java", &java, &format!("java executable set to {}", java));
                        self.print_status(RESTART_NOTE);
                    }
                    None => {
                        let java = manager.java(&dir)?;
                        self.print_value("java", &java, &format!("java executable: {}", java));
                    }
                }
                Ok(())
            }
            Commands::Autostart { enable } => {
                let dir = self.server_dir()?;
                match enable {
                    Some(enable) => {
                        manager.set_autostart(&dir, *enable)?;
                        let text = format!("autostart has been {}", enabled(*enable));
                        self.print_value("autostart", enable, &text);
                    }
                    None => {
                        let enable = manager.autostart(&dir)?;
                        let text = format!("autostart is currently {}", enabled(enable));
                        self.print_value("autostart", &enable, &text);
                    }
                }
                Ok(())
            }
            Commands::Properties { key, value } => {
                let dir = self.server_dir()?;
                match value {
                    Some(value) => {
                        let previous = manager.set_property(&dir, key, value)?;
                        let text = format!(
                            "changed {} from {} to {}",
                            key,
                            previous.as_deref().unwrap_or("-"),
                            value
                        );
                        self.print_value(key, value, &text);
                        self.print_status(RESTART_NOTE);
                    }
                    None => {
                        let value = manager.property(&dir, key)?;
                        self.print_value(key, &value, &format!("{} is {}", key, value));
                    }
                }
                Ok(())
            }
            Commands::Port { port } => {
                let dir = self.server_dir()?;
                match port {
                    Some(port) => {
                        manager.set_port(&dir, *port)?;
                        self.print_value("port", port, &format!("server port is now {}", port));
                        self.print_status(RESTART_NOTE);
                    }
                    None => {
                        let port = manager.port(&dir)?;
                        self.print_value("port", &port, &format!("current port: {}", port));
                    }
                }
                Ok(())
            }
            Commands::Commandblocks { enable } => {
                let dir = self.server_dir()?;
                match enable {
                    Some(enable) => {
                        manager.set_command_blocks(&dir, *enable)?;
                        let text = format!("command blocks are now {}", enabled(*enable));
                        self.print_value("commandblocks", enable, &text);
                        self.print_status(RESTART_NOTE);
                    }
                    None => {
                        let enable = manager.command_blocks(&dir)?;
                        let text = format!("command blocks are currently {}", enabled(enable));
                        self.print_value("commandblocks", &enable, &text);
                    }
                }
                Ok(())
            }
        }
    }

    fn start_auto(&self, manager: &ServerManager<'_>) -> Result<()> {
        let outcomes = manager.start_auto()?;
        if self.is_json() {
            println!("{}", json!(outcomes));
        } else if outcomes.is_empty() {
            println!("no servers to start");
        } else {
            for line in format_autostart(&outcomes) {
                println!("{}", line);
            }
        }

        let failed = outcomes.iter().filter(|o| o.error.is_some()).count();
        if failed > 0 {
            return Err(anyhow!("{} of {} servers failed to start", failed, outcomes.len()));
        }
        Ok(())
    }

    fn server_dir(&self) -> Result<PathBuf> {
        match &self.dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(std::env::current_dir()?),
        }
    }

    fn attach(&self, manager: &ServerManager<'_>, dir: &Path) -> Result<()> {
        let status = manager.console(dir)?;
        if !status.success() {
            warn!(status = %status, "console session ended abnormally");
        }
        Ok(())
    }

    fn is_json(&self) -> bool {
        self.output_format == "json"
    }

    fn print_status(&self, message: &str) {
        if self.is_json() {
            println!("{}", json!({ "type": "status", "message": message }));
        } else {
            println!("{}", message);
        }
    }

    fn print_value<T: Serialize + ?Sized>(&self, key: &str, value: &T, text: &str) {
        if self.is_json() {
            println!("{}", json!({ key: value }));
        } else {
            println!("{}", text);
        }
    }

    fn print_info(&self, status: &ServerStatus) {
        if self.is_json() {
            println!("{}", json!(status));
            return;
        }
        println!("{}", format_info(status));
    }

    fn print_list(&self, servers: &[ServerStatus]) {
        if self.is_json() {
            println!("{}", json!(servers));
            return;
        }
        if servers.is_empty() {
            println!("no servers");
            return;
        }
        for line in format_list(servers) {
            println!("{}", line);
        }
    }
}

fn registry_path(config: &Config) -> Result<PathBuf> {
    match config.registry_path() {
        Some(path) => Ok(path.to_path_buf()),
        None => PathStore::default_path(),
    }
}

fn format_info(status: &ServerStatus) -> String {
    format!(
        "Current Server Information:\n\
         \x20 Server Id: {:?}\n\
         \x20 Path:      {:?}\n\
         \x20 Jar-File:  {:?}\n\
         \x20 Session:   {:?}\n\
         \x20 RAM:       {}\n\
         \x20 Java:      {:?}\n\
         \x20 Autostart: {}\n\
         \x20 Running:   {}",
        status.id,
        status.path.display().to_string(),
        status.jar_file.as_deref().unwrap_or("-"),
        status.session,
        status.ram,
        status.java,
        status.autostart,
        status.running
    )
}

fn enabled(flag: bool) -> &'static str {
    if flag {
        "enabled"
    } else {
        "disabled"
    }
}

fn format_autostart(outcomes: &[AutostartOutcome]) -> Vec<String> {
    outcomes
        .iter()
        .map(|outcome| match &outcome.error {
            None => format!("{}: started", outcome.id),
            Some(err) => format!("{}: {}", outcome.id, err),
        })
        .collect()
}

fn format_list(servers: &[ServerStatus]) -> Vec<String> {
    let id_width = servers.iter().map(|s| s.id.len()).max().unwrap_or(0);
    servers
        .iter()
        .map(|server| {
            let state = if server.running { "running" } else { "stopped" };
            format!(
                "{:<width$}  {:<7}  {:<5}  {}  {}",
                server.id,
                state,
                server.ram,
                server.jar_file.as_deref().unwrap_or("-"),
                server.path.display(),
                width = id_width
            )
        })
        .collect()
}
