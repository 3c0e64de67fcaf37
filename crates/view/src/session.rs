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

//! The opaque debug-session handle observed by the view layer.

use std::sync::Arc;

use dbv_common::types::{DebugThread, EvaluatedValue, LaunchConfig, SessionId, SessionState};
use eyre::Result;
use futures::future::BoxFuture;

/// One debugging connection/process instance.
///
/// The view layer treats sessions as opaque handles: it reads derived state
/// and issues expression evaluations, but all protocol work happens behind
/// this trait. Handles are compared by [`SessionId`] identity, never by
/// pointer or by value.
pub trait DebugSession: Send + Sync {
    /// Identity of this session. Stable for the lifetime of the handle.
    fn id(&self) -> SessionId;

    /// Human-readable session name shown in the panel.
    fn name(&self) -> String;

    /// Current lifecycle state of the session.
    fn state(&self) -> SessionState;

    /// The session's selected thread, if any.
    fn current_thread(&self) -> Option<Arc<DebugThread>>;

    /// The options this session was launched with, used for relaunching.
    fn launch_config(&self) -> LaunchConfig;

    /// Evaluates an expression against the debuggee.
    ///
    /// One remote round trip; resolves once the adapter answers or fails.
    fn evaluate(&self, expression: &str) -> BoxFuture<'static, Result<EvaluatedValue>>;
}

/// Identity comparison of two optional session handles.
///
/// Absent handles never compare equal to anything, including each other.
pub fn same_session(a: Option<&Arc<dyn DebugSession>>, b: Option<&Arc<dyn DebugSession>>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => a.id() == b.id(),
        _ => false,
    }
}
