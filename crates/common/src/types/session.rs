// DBV - Debugger View Panel
// Copyright (C) 2024 the DBV contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

use std::{
    fmt::Display,
    sync::atomic::{AtomicU64, Ordering},
};

use serde::{Deserialize, Serialize};

/// Opaque identity of a debug session handle.
///
/// Two session handles refer to the same session if and only if their ids are
/// equal. Ids are allocated process-wide and never reused.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(u64);

static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

impl SessionId {
    /// Allocate a fresh, unique session id.
    pub fn next() -> Self {
        Self(NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw numeric value, mainly for logging.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "session-{}", self.0)
    }
}

/// Lifecycle state of a debug session.
///
/// `Inactive` doubles as the sentinel reported by a view that has no current
/// session at all.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum SessionState {
    /// No session, or the session has terminated.
    #[default]
    Inactive,
    /// The session is being set up and has not started running yet.
    Initializing,
    /// The debuggee is running.
    Running,
    /// The debuggee is paused (breakpoint, step, pause request).
    Stopped,
}

impl SessionState {
    /// Whether the debuggee is currently paused and inspectable.
    pub fn is_stopped(&self) -> bool {
        matches!(self, Self::Stopped)
    }
}

impl Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Inactive => "inactive",
            Self::Initializing => "initializing",
            Self::Running => "running",
            Self::Stopped => "stopped",
        };
        write!(f, "{s}")
    }
}

/// Options used to launch (or re-launch) a debug session.
///
/// The `configuration` body is adapter-specific and treated as opaque JSON,
/// the same way debug configurations are stored in launch files.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct LaunchConfig {
    /// Display name of the configuration.
    pub name: String,
    /// Adapter-specific configuration body.
    pub configuration: serde_json::Value,
}

impl LaunchConfig {
    /// Creates a named launch configuration with the given adapter body.
    pub fn new(name: impl Into<String>, configuration: serde_json::Value) -> Self {
        Self { name: name.into(), configuration }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_ids_are_unique() {
        let a = SessionId::next();
        let b = SessionId::next();
        assert_ne!(a, b);
        assert!(b.raw() > a.raw());
    }

    #[test]
    fn test_session_id_display() {
        let id = SessionId::next();
        assert_eq!(format!("{id}"), format!("session-{}", id.raw()));
    }

    #[test]
    fn test_session_state_sentinel() {
        assert_eq!(SessionState::default(), SessionState::Inactive);
        assert!(!SessionState::Inactive.is_stopped());
        assert!(SessionState::Stopped.is_stopped());
    }

    #[test]
    fn test_session_state_display() {
        assert_eq!(SessionState::Running.to_string(), "running");
        assert_eq!(SessionState::Inactive.to_string(), "inactive");
    }

    #[test]
    fn test_launch_config_roundtrip() {
        let config = LaunchConfig::new(
            "Launch program",
            serde_json::json!({ "program": "${workspaceFolder}/a.out", "stopOnEntry": true }),
        );
        let json = serde_json::to_string(&config).unwrap();
        let back: LaunchConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, back);
    }
}
