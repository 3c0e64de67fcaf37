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

//! In-memory doubles of the view model's collaborators.
//!
//! These stand in for a real debug-adapter stack in tests: sessions with
//! scripted evaluation results, a manager whose notifications are fired by
//! hand, and an editor that replays canned input.

use std::{
    collections::{HashMap, VecDeque},
    path::PathBuf,
    sync::Arc,
};

use dbv_common::{
    event::{Emitter, Listener, Subscription},
    types::{DebugThread, EvaluatedValue, LaunchConfig, SessionId, SessionState, SourceBreakpoint},
};
use eyre::{eyre, Result};
use futures::{future::BoxFuture, FutureExt};
use parking_lot::{Mutex, RwLock};

use crate::{
    manager::{
        ActiveSessionChange, BreakpointsChange, ExpressionEditor, ManagerStateChange,
        SessionManager,
    },
    session::DebugSession,
};

/// A scriptable [`DebugSession`].
///
/// Evaluations are answered from a per-expression script; expressions
/// without a scripted result echo `<expr>` back. Every evaluation is logged
/// in call order.
pub struct MockSession {
    id: SessionId,
    name: String,
    state: RwLock<SessionState>,
    thread: RwLock<Option<Arc<DebugThread>>>,
    launch: RwLock<LaunchConfig>,
    eval_results: Mutex<HashMap<String, Result<EvaluatedValue, String>>>,
    eval_log: Mutex<Vec<String>>,
}

impl MockSession {
    /// Creates a stopped session with a launch config named after it.
    pub fn new(name: impl Into<String>) -> Arc<Self> {
        let name = name.into();
        Arc::new(Self {
            id: SessionId::next(),
            launch: RwLock::new(LaunchConfig::new(&name, serde_json::json!({}))),
            name,
            state: RwLock::new(SessionState::Stopped),
            thread: RwLock::new(None),
            eval_results: Mutex::new(HashMap::new()),
            eval_log: Mutex::new(Vec::new()),
        })
    }

    /// Overrides the session's lifecycle state.
    pub fn set_state(&self, state: SessionState) {
        *self.state.write() = state;
    }

    /// Sets or clears the selected thread.
    pub fn set_current_thread(&self, thread: Option<Arc<DebugThread>>) {
        *self.thread.write() = thread;
    }

    /// Overrides the launch configuration returned by the handle.
    pub fn set_launch_config(&self, config: LaunchConfig) {
        *self.launch.write() = config;
    }

    /// Scripts the outcome of evaluating `expression`. An `Err` script makes
    /// the evaluation fail with that message.
    pub fn set_eval_result(&self, expression: &str, result: Result<EvaluatedValue, String>) {
        self.eval_results.lock().insert(expression.to_string(), result);
    }

    /// The expressions evaluated against this session, in call order.
    pub fn evaluations(&self) -> Vec<String> {
        self.eval_log.lock().clone()
    }

    /// Forgets the recorded evaluations.
    pub fn clear_evaluations(&self) {
        self.eval_log.lock().clear();
    }
}

impl DebugSession for MockSession {
    fn id(&self) -> SessionId {
        self.id
    }

    fn name(&self) -> String {
        self.name.clone()
    }

    fn state(&self) -> SessionState {
        *self.state.read()
    }

    fn current_thread(&self) -> Option<Arc<DebugThread>> {
        self.thread.read().clone()
    }

    fn launch_config(&self) -> LaunchConfig {
        self.launch.read().clone()
    }

    fn evaluate(&self, expression: &str) -> BoxFuture<'static, Result<EvaluatedValue>> {
        self.eval_log.lock().push(expression.to_string());
        let result = self
            .eval_results
            .lock()
            .get(expression)
            .cloned()
            .unwrap_or_else(|| Ok(EvaluatedValue::new(format!("<{expression}>"))));
        async move { result.map_err(|message| eyre!(message)) }.boxed()
    }
}

/// A hand-driven [`SessionManager`].
///
/// Notifications fire when the test says so; start/restart outcomes are
/// scripted one-shot. `set_active_session` behaves like a real manager in
/// that it fires the active-session-changed notification itself.
pub struct MockSessionManager {
    active: Mutex<Option<Arc<dyn DebugSession>>>,
    breakpoints: Mutex<Vec<SourceBreakpoint>>,
    start_result: Mutex<Option<Option<Arc<dyn DebugSession>>>>,
    restart_result: Mutex<Option<Option<Arc<dyn DebugSession>>>>,
    start_requests: Mutex<Vec<LaunchConfig>>,
    active_changed: Emitter<ActiveSessionChange>,
    state_changed: Emitter<ManagerStateChange>,
    breakpoints_changed: Emitter<BreakpointsChange>,
}

impl MockSessionManager {
    /// Creates a manager with no active session and no breakpoints.
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            active: Mutex::new(None),
            breakpoints: Mutex::new(Vec::new()),
            start_result: Mutex::new(None),
            restart_result: Mutex::new(None),
            start_requests: Mutex::new(Vec::new()),
            active_changed: Emitter::new(),
            state_changed: Emitter::new(),
            breakpoints_changed: Emitter::new(),
        })
    }

    /// Replaces the manager's breakpoint store.
    pub fn set_breakpoints(&self, breakpoints: Vec<SourceBreakpoint>) {
        *self.breakpoints.lock() = breakpoints;
    }

    /// Scripts the next `start_session` outcome. Unscripted calls yield no
    /// session.
    pub fn script_start_result(&self, session: Option<Arc<dyn DebugSession>>) {
        *self.start_result.lock() = Some(session);
    }

    /// Scripts the next `restart_session` outcome. Unscripted calls echo the
    /// session being restarted, the common adapter behavior.
    pub fn script_restart_result(&self, session: Option<Arc<dyn DebugSession>>) {
        *self.restart_result.lock() = Some(session);
    }

    /// Launch configs passed to `start_session`, in call order.
    pub fn start_requests(&self) -> Vec<LaunchConfig> {
        self.start_requests.lock().clone()
    }

    /// Fires a generic state-change notification.
    pub fn fire_state_changed(&self, session: Option<Arc<dyn DebugSession>>) {
        self.state_changed.emit(&ManagerStateChange { session });
    }

    /// Fires a breakpoints-changed notification for `path`.
    pub fn fire_breakpoints_changed(
        &self,
        session: Option<Arc<dyn DebugSession>>,
        path: impl Into<PathBuf>,
    ) {
        self.breakpoints_changed.emit(&BreakpointsChange { session, path: path.into() });
    }
}

impl SessionManager for MockSessionManager {
    fn active_session(&self) -> Option<Arc<dyn DebugSession>> {
        self.active.lock().clone()
    }

    fn set_active_session(&self, session: Option<Arc<dyn DebugSession>>) {
        let previous = {
            let mut active = self.active.lock();
            std::mem::replace(&mut *active, session.clone())
        };
        self.active_changed.emit(&ActiveSessionChange { previous, current: session });
    }

    fn breakpoints(&self, _session: Option<Arc<dyn DebugSession>>) -> Vec<SourceBreakpoint> {
        self.breakpoints.lock().clone()
    }

    fn start_session(
        &self,
        config: LaunchConfig,
    ) -> BoxFuture<'static, Result<Option<Arc<dyn DebugSession>>>> {
        self.start_requests.lock().push(config);
        let result = self.start_result.lock().take().flatten();
        async move { Ok(result) }.boxed()
    }

    fn restart_session(
        &self,
        session: Arc<dyn DebugSession>,
    ) -> BoxFuture<'static, Result<Option<Arc<dyn DebugSession>>>> {
        let result = self.restart_result.lock().take().unwrap_or(Some(session));
        async move { Ok(result) }.boxed()
    }

    fn on_active_session_changed(&self, listener: Listener<ActiveSessionChange>) -> Subscription {
        self.active_changed.subscribe(move |change| listener(change))
    }

    fn on_state_changed(&self, listener: Listener<ManagerStateChange>) -> Subscription {
        self.state_changed.subscribe(move |change| listener(change))
    }

    fn on_breakpoints_changed(&self, listener: Listener<BreakpointsChange>) -> Subscription {
        self.breakpoints_changed.subscribe(move |change| listener(change))
    }
}

/// An [`ExpressionEditor`] that replays canned responses.
///
/// When the queue runs dry the editor returns its input unchanged, which
/// models a user confirming the pre-filled text.
pub struct ScriptedEditor {
    responses: Mutex<VecDeque<String>>,
}

impl ScriptedEditor {
    /// Creates an editor that always confirms the pre-filled text.
    pub fn new() -> Arc<Self> {
        Arc::new(Self { responses: Mutex::new(VecDeque::new()) })
    }

    /// Creates an editor primed with responses, replayed in order.
    pub fn with_responses<I, S>(responses: I) -> Arc<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Arc::new(Self {
            responses: Mutex::new(responses.into_iter().map(Into::into).collect()),
        })
    }

    /// Queues one more response.
    pub fn push_response(&self, response: impl Into<String>) {
        self.responses.lock().push_back(response.into());
    }
}

impl ExpressionEditor for ScriptedEditor {
    fn edit(&self, current: String) -> BoxFuture<'static, Result<String>> {
        let response = self.responses.lock().pop_front().unwrap_or(current);
        async move { Ok(response) }.boxed()
    }
}
