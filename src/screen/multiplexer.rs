// Multiplexer module
// 端末マルチプレクサ (screen) の呼び出し

use anyhow::{anyhow, Result};
use std::path::Path;
use std::process::{Command, ExitStatus, Stdio};
use tracing::debug;

/// Operations the server commands need from a terminal multiplexer.
pub trait Multiplexer {
    /// Program name used in error messages.
    fn program(&self) -> &str;

    /// Raw session listing as printed by the multiplexer.
    fn list_sessions(&self) -> Result<String>;

    /// Starts a detached session named `session` running `command` inside `dir`.
    fn launch(&self, session: &str, dir: &Path, command: &[String]) -> Result<()>;

    /// Types `text` into the session followed by Enter.
    fn send_keys(&self, session: &str, text: &str) -> Result<()>;

    /// Multi-attaches the current terminal and blocks until it detaches.
    fn attach(&self, session: &str, dir: &Path) -> Result<ExitStatus>;
}

/// GNU screen.
#[derive(Debug, Clone)]
pub struct Screen {
    binary: String,
}

impl Screen {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    fn run(&self, args: &[&str], dir: Option<&Path>) -> Result<()> {
        debug!(program = %self.binary, args = ?args, "running multiplexer");
        let mut cmd = Command::new(&self.binary);
        cmd.args(args).stdin(Stdio::null()).stdout(Stdio::null());
        if let Some(dir) = dir {
            cmd.current_dir(dir);
        }
        let output = cmd.stderr(Stdio::piped()).output()?;
        if output.status.success() {
            Ok(())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(anyhow!(
                "{} exited with {} ({})",
                self.binary,
                output.status,
                stderr.trim()
            ))
        }
    }
}

impl Multiplexer for Screen {
    fn program(&self) -> &str {
        &self.binary
    }

    fn list_sessions(&self) -> Result<String> {
        debug!(program = %self.binary, "listing sessions");
        // screen -list exits nonzero in several versions even with sessions present,
        // so stdout is parsed regardless of the status.
        let output = Command::new(&self.binary)
            .arg("-list")
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .output()?;
        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    fn launch(&self, session: &str, dir: &Path, command: &[String]) -> Result<()> {
        let mut args = vec!["-d", "-S", session, "-m"];
        args.extend(command.iter().map(String::as_str));
        self.run(&args, Some(dir))
    }

    fn send_keys(&self, session: &str, text: &str) -> Result<()> {
        let keys = stuff_payload(text);
        self.run(&["-S", session, "-p", "0", "-X", "stuff", &keys], None)
    }

    fn attach(&self, session: &str, dir: &Path) -> Result<ExitStatus> {
        debug!(program = %self.binary, session = %session, "attaching");
        let status = Command::new(&self.binary)
            .args(["-x", session])
            .current_dir(dir)
            .status()?;
        Ok(status)
    }
}

/// `stuff` argument that types `text` and presses Enter (`^M`).
pub fn stuff_payload(text: &str) -> String {
    format!("{}^M", text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stuff_payload_appends_enter() {
        assert_eq!(stuff_payload("stop"), "stop^M");
        assert_eq!(stuff_payload("say hello world"), "say hello world^M");
    }

    #[test]
    fn missing_binary_fails_to_list() {
        let screen = Screen::new("mcsrv-no-such-multiplexer");
        assert!(screen.list_sessions().is_err());
        assert_eq!(screen.program(), "mcsrv-no-such-multiplexer");
    }
}
