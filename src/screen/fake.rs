use anyhow::{anyhow, Result};
use std::cell::{Cell, RefCell};
use std::os::unix::process::ExitStatusExt;
use std::path::{Path, PathBuf};
use std::process::ExitStatus;

use crate::screen::Multiplexer;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Launch {
        session: String,
        dir: PathBuf,
        command: Vec<String>,
    },
    SendKeys {
        session: String,
        text: String,
    },
    Attach {
        session: String,
    },
}

/// In-memory multiplexer that records every mutating call.
pub struct FakeMultiplexer {
    sessions: RefCell<Vec<String>>,
    available: bool,
    /// Whether a launched session shows up in later listings.
    launch_persists: Cell<bool>,
    /// Whether launch, send and attach report a failed invocation.
    refuses: Cell<bool>,
    calls: RefCell<Vec<Call>>,
}

impl FakeMultiplexer {
    pub fn new() -> Self {
        Self {
            sessions: RefCell::new(Vec::new()),
            available: true,
            launch_persists: Cell::new(true),
            refuses: Cell::new(false),
            calls: RefCell::new(Vec::new()),
        }
    }

    pub fn with_listing(listing: &str) -> Self {
        let mux = Self::new();
        *mux.sessions.borrow_mut() = crate::screen::parse_session_listing(listing)
            .into_iter()
            .map(|entry| entry.name)
            .collect();
        mux
    }

    pub fn with_running(session: &str) -> Self {
        let mux = Self::new();
        mux.sessions.borrow_mut().push(session.to_string());
        mux
    }

    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::new()
        }
    }

    /// Launches succeed but the session dies immediately.
    pub fn crashing() -> Self {
        let mux = Self::new();
        mux.launch_persists.set(false);
        mux
    }

    /// Listing still works, but every other invocation fails.
    pub fn refusing(self) -> Self {
        self.refuses.set(true);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }
}

impl FakeMultiplexer {
    fn check(&self) -> Result<()> {
        if self.refuses.get() {
            return Err(anyhow!("screen exited with exit status: 1 (no such session)"));
        }
        Ok(())
    }
}

impl Multiplexer for FakeMultiplexer {
    fn program(&self) -> &str {
        "screen"
    }

    fn list_sessions(&self) -> Result<String> {
        if !self.available {
            return Err(anyhow!("screen: not installed"));
        }
        let mut out = String::from("There are screens on:\n");
        for (idx, name) in self.sessions.borrow().iter().enumerate() {
            out.push_str(&format!("\t{}.{}\t(Detached)\n", 1000 + idx, name));
        }
        out.push_str(&format!(
            "{} Sockets in /run/screen/S-test.\n\n",
            self.sessions.borrow().len()
        ));
        Ok(out)
    }

    fn launch(&self, session: &str, dir: &Path, command: &[String]) -> Result<()> {
        self.calls.borrow_mut().push(Call::Launch {
            session: session.to_string(),
            dir: dir.to_path_buf(),
            command: command.to_vec(),
        });
        self.check()?;
        if self.launch_persists.get() {
            self.sessions.borrow_mut().push(session.to_string());
        }
        Ok(())
    }

    fn send_keys(&self, session: &str, text: &str) -> Result<()> {
        self.calls.borrow_mut().push(Call::SendKeys {
            session: session.to_string(),
            text: text.to_string(),
        });
        self.check()
    }

    fn attach(&self, session: &str, _dir: &Path) -> Result<ExitStatus> {
        self.calls.borrow_mut().push(Call::Attach {
            session: session.to_string(),
        });
        self.check()?;
        Ok(ExitStatus::from_raw(0))
    }
}
