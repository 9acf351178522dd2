// Session inspection
// 実行中セッションの検出

use tracing::{debug, warn};

use crate::screen::Multiplexer;

/// One `pid.name` entry of a session listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionEntry {
    /// Digits as listed, not parsed.
    pub pid: String,
    pub name: String,
}

/// Parses a single listing line such as `12345.mc-survival\t(Detached)`.
///
/// Header and footer lines ("There are screens on:", "2 Sockets in ...") do not
/// start with a `pid.name` token and are rejected here rather than by position.
pub fn parse_session_line(line: &str) -> Option<SessionEntry> {
    let token = line.split_whitespace().next()?;
    let (pid, name) = token.split_once('.')?;
    if pid.is_empty() || name.is_empty() || !pid.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(SessionEntry {
        pid: pid.to_string(),
        name: name.to_string(),
    })
}

pub fn parse_session_listing(output: &str) -> Vec<SessionEntry> {
    output.lines().filter_map(parse_session_line).collect()
}

pub struct SessionInspector<'a> {
    multiplexer: &'a dyn Multiplexer,
}

impl<'a> SessionInspector<'a> {
    pub fn new(multiplexer: &'a dyn Multiplexer) -> Self {
        Self { multiplexer }
    }

    /// Names of all live sessions; empty when the multiplexer can't be run.
    pub fn list_session_names(&self) -> Vec<String> {
        match self.multiplexer.list_sessions() {
            Ok(output) => parse_session_listing(&output)
                .into_iter()
                .map(|entry| {
                    debug!(pid = %entry.pid, name = %entry.name, "found session");
                    entry.name
                })
                .collect(),
            Err(err) => {
                warn!(error = %err, "could not list multiplexer sessions");
                Vec::new()
            }
        }
    }

    pub fn is_running(&self, session_name: &str) -> bool {
        let running = self
            .list_session_names()
            .iter()
            .any(|name| name == session_name);
        debug!(session = %session_name, running, "session state");
        running
    }
}
