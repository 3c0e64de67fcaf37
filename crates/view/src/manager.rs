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

//! Contracts of the collaborators the view model is wired against.
//!
//! The [`SessionManager`] is the externally-owned source of truth for
//! session lifecycle and breakpoints; the view model only filters and
//! observes it. The [`ExpressionEditor`] is the interactive input step a
//! freshly created watch expression is routed through before it is kept.

use std::{path::PathBuf, sync::Arc};

use dbv_common::{
    event::{Listener, Subscription},
    types::{LaunchConfig, SourceBreakpoint},
};
use eyre::Result;
use futures::future::BoxFuture;

use crate::session::DebugSession;

/// Payload of an active-session transition reported by the manager.
#[derive(Clone)]
pub struct ActiveSessionChange {
    /// The previously active session, if there was one.
    pub previous: Option<Arc<dyn DebugSession>>,
    /// The newly active session, if there is one.
    pub current: Option<Arc<dyn DebugSession>>,
}

/// Payload of a generic manager state change.
#[derive(Clone)]
pub struct ManagerStateChange {
    /// The affected session; `None` means the change is global.
    pub session: Option<Arc<dyn DebugSession>>,
}

/// Payload of a breakpoint change reported by the manager.
#[derive(Clone)]
pub struct BreakpointsChange {
    /// The affected session; `None` means the change applies globally.
    pub session: Option<Arc<dyn DebugSession>>,
    /// The source file whose breakpoints changed.
    pub path: PathBuf,
}

/// The session manager collaborator.
///
/// A shared, externally-owned singleton. The view model reads from it and
/// issues exactly one narrow mutation, [`SessionManager::set_active_session`];
/// everything else flows back through the three subscription channels.
pub trait SessionManager: Send + Sync {
    /// The manager's globally active session, if any.
    fn active_session(&self) -> Option<Arc<dyn DebugSession>>;

    /// Makes the given session the globally active one. The manager is the
    /// authority; callers must not assume the change is applied until the
    /// corresponding notification arrives.
    fn set_active_session(&self, session: Option<Arc<dyn DebugSession>>);

    /// Breakpoints applicable to the given session. The manager decides how
    /// global and per-session breakpoints combine.
    fn breakpoints(&self, session: Option<Arc<dyn DebugSession>>) -> Vec<SourceBreakpoint>;

    /// Starts a new session from the given launch options. Resolves to the
    /// new session handle, or `None` when no session was created.
    fn start_session(
        &self,
        config: LaunchConfig,
    ) -> BoxFuture<'static, Result<Option<Arc<dyn DebugSession>>>>;

    /// Restarts an existing session. Depending on the adapter this may
    /// return the same handle or a replacement one; `None` means the restart
    /// produced no session.
    fn restart_session(
        &self,
        session: Arc<dyn DebugSession>,
    ) -> BoxFuture<'static, Result<Option<Arc<dyn DebugSession>>>>;

    /// Subscribes to active-session transitions.
    fn on_active_session_changed(&self, listener: Listener<ActiveSessionChange>) -> Subscription;

    /// Subscribes to generic state changes.
    fn on_state_changed(&self, listener: Listener<ManagerStateChange>) -> Subscription;

    /// Subscribes to breakpoint changes.
    fn on_breakpoints_changed(&self, listener: Listener<BreakpointsChange>) -> Subscription;
}

/// Interactive edit step for watch expressions.
///
/// Invoked right after a watch expression is created; may suspend awaiting
/// user input or validation. Returns the final expression text.
pub trait ExpressionEditor: Send + Sync {
    /// Opens the editor primed with `current` and resolves to the edited text.
    fn edit(&self, current: String) -> BoxFuture<'static, Result<String>>;
}
