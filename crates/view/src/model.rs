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

//! The view model behind one debug view panel.
//!
//! A [`DebugViewModel`] aggregates the sessions belonging to one panel,
//! resolves the current session/thread/frame, mirrors the breakpoints of the
//! current session, and owns the panel's watch expressions. It is glue: the
//! session manager stays the source of truth, and the model only filters its
//! notifications down to the three signals a panel cares about ("changed",
//! "breakpoints changed for a file", "watch expressions changed").

use std::{
    path::PathBuf,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Weak,
    },
    time::Duration,
};

use dbv_common::{
    event::{Emitter, Subscription},
    types::{DebugThread, SessionState, SourceBreakpoint, StackFrame},
};
use eyre::Result;
use futures::FutureExt;
use parking_lot::Mutex;
use tracing::debug;

use crate::{
    manager::{ExpressionEditor, SessionManager},
    refresh::DebouncedRefresh,
    session::{same_session, DebugSession},
    watch::WatchExpression,
};

/// Trailing window for coalescing watch-refresh triggers.
const WATCH_REFRESH_DEBOUNCE: Duration = Duration::from_millis(50);

struct ViewState {
    manager: Arc<dyn SessionManager>,
    editor: Arc<dyn ExpressionEditor>,
    /// Insertion-ordered set of member sessions, unique by id.
    sessions: Mutex<Vec<Arc<dyn DebugSession>>>,
    watch_expressions: Mutex<Vec<Arc<WatchExpression>>>,
    changed: Emitter<()>,
    breakpoints_changed: Emitter<PathBuf>,
    watch_changed: Emitter<()>,
    refresh: DebouncedRefresh,
    disposed: AtomicBool,
}

impl ViewState {
    fn contains(&self, session: Option<&Arc<dyn DebugSession>>) -> bool {
        match session {
            Some(session) => {
                let id = session.id();
                self.sessions.lock().iter().any(|s| s.id() == id)
            }
            None => false,
        }
    }

    fn current_session(&self) -> Option<Arc<dyn DebugSession>> {
        let sessions = self.sessions.lock();
        if let Some(active) = self.manager.active_session() {
            if sessions.iter().any(|s| s.id() == active.id()) {
                return Some(active);
            }
        }
        sessions.first().cloned()
    }

    /// One refresh cycle: evaluate every expression in list order, stopping
    /// at the first failure. The failure is logged and swallowed; the next
    /// trigger starts over with a fresh cycle.
    async fn run_refresh_cycle(&self) {
        let expressions: Vec<Arc<WatchExpression>> = self.watch_expressions.lock().clone();
        for expression in expressions {
            if let Err(e) = expression.evaluate().await {
                debug!("Watch evaluation failed, aborting cycle: {e}");
                break;
            }
        }
    }
}

/// Presentation-layer state of one debug view panel.
///
/// Construction wires three standing subscriptions against the session
/// manager and spawns the debounced watch-refresh worker, so a tokio runtime
/// must be current. Consumers subscribe to the model's signals and re-query
/// derived state when one fires; the signals carry no deltas.
pub struct DebugViewModel {
    state: Arc<ViewState>,
    subscriptions: Mutex<Vec<Subscription>>,
}

impl std::fmt::Debug for DebugViewModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DebugViewModel")
            .field("sessions", &self.session_count())
            .field("watch_expressions", &self.state.watch_expressions.lock().len())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

impl DebugViewModel {
    /// Creates a view model observing `manager`, optionally seeded with an
    /// initial member session.
    pub fn new(
        manager: Arc<dyn SessionManager>,
        editor: Arc<dyn ExpressionEditor>,
        initial_session: Option<Arc<dyn DebugSession>>,
    ) -> Self {
        let state = Arc::new_cyclic(|weak: &Weak<ViewState>| {
            let job_state = weak.clone();
            let refresh = DebouncedRefresh::spawn(WATCH_REFRESH_DEBOUNCE, move || {
                let state = job_state.clone();
                async move {
                    if let Some(state) = state.upgrade() {
                        state.run_refresh_cycle().await;
                    }
                }
                .boxed()
            });

            ViewState {
                manager: manager.clone(),
                editor,
                sessions: Mutex::new(Vec::new()),
                watch_expressions: Mutex::new(Vec::new()),
                changed: Emitter::new(),
                breakpoints_changed: Emitter::new(),
                watch_changed: Emitter::new(),
                refresh,
                disposed: AtomicBool::new(false),
            }
        });

        // Standing manager subscriptions, released together at disposal.
        let weak = Arc::downgrade(&state);
        let active_sub = manager.on_active_session_changed(Box::new(move |change| {
            let Some(state) = weak.upgrade() else { return };
            // Only transitions across the view's membership boundary matter;
            // anything staying inside or outside would be a redundant
            // repaint.
            let was_member = state.contains(change.previous.as_ref());
            let is_member = state.contains(change.current.as_ref());
            if was_member != is_member {
                state.changed.emit(&());
            }
        }));

        let weak = Arc::downgrade(&state);
        let state_sub = manager.on_state_changed(Box::new(move |change| {
            let Some(state) = weak.upgrade() else { return };
            if change.session.is_none() || state.contains(change.session.as_ref()) {
                state.refresh.trigger();
                state.changed.emit(&());
            }
        }));

        let weak = Arc::downgrade(&state);
        let breakpoints_sub = manager.on_breakpoints_changed(Box::new(move |change| {
            let Some(state) = weak.upgrade() else { return };
            let applies = match &change.session {
                None => true,
                Some(_) => same_session(state.current_session().as_ref(), change.session.as_ref()),
            };
            if applies {
                state.breakpoints_changed.emit(&change.path);
            }
        }));

        let model = Self {
            state,
            subscriptions: Mutex::new(vec![active_sub, state_sub, breakpoints_sub]),
        };

        if let Some(session) = initial_session {
            model.add_session(session);
        }

        model
    }

    // ---- session membership -------------------------------------------------

    /// Adds a session to the view. Duplicate adds are silent no-ops.
    pub fn add_session(&self, session: Arc<dyn DebugSession>) {
        {
            let mut sessions = self.state.sessions.lock();
            let id = session.id();
            if sessions.iter().any(|s| s.id() == id) {
                return;
            }
            sessions.push(session);
        }
        self.state.changed.emit(&());
    }

    /// Removes a session from the view, reporting whether it was a member.
    /// Removing a non-member is a silent no-op.
    pub fn remove_session(&self, session: &dyn DebugSession) -> bool {
        let removed = {
            let mut sessions = self.state.sessions.lock();
            let id = session.id();
            let before = sessions.len();
            sessions.retain(|s| s.id() != id);
            sessions.len() < before
        };
        if removed {
            self.state.changed.emit(&());
        }
        removed
    }

    /// Whether the given session belongs to this view.
    pub fn contains_session(&self, session: &dyn DebugSession) -> bool {
        let id = session.id();
        self.state.sessions.lock().iter().any(|s| s.id() == id)
    }

    /// Number of member sessions.
    pub fn session_count(&self) -> usize {
        self.state.sessions.lock().len()
    }

    /// Snapshot of the member sessions in insertion order.
    pub fn sessions(&self) -> Vec<Arc<dyn DebugSession>> {
        self.state.sessions.lock().clone()
    }

    // ---- current session and derived state ----------------------------------

    /// The session this view currently displays: the manager's active
    /// session when it is a member, the first-inserted member otherwise, or
    /// `None` when the view is empty.
    pub fn current_session(&self) -> Option<Arc<dyn DebugSession>> {
        self.state.current_session()
    }

    /// Asks the manager to activate the given session. The manager stays the
    /// authority; the view never overrides the selection locally.
    pub fn set_current_session(&self, session: Option<Arc<dyn DebugSession>>) {
        self.state.manager.set_active_session(session);
    }

    /// Lifecycle state of the current session, or the inactive sentinel when
    /// there is none.
    pub fn state(&self) -> SessionState {
        self.current_session().map(|s| s.state()).unwrap_or(SessionState::Inactive)
    }

    /// The current session's selected thread, if any.
    pub fn current_thread(&self) -> Option<Arc<DebugThread>> {
        self.current_session().and_then(|s| s.current_thread())
    }

    /// The selected frame of the current thread, if any.
    pub fn current_frame(&self) -> Option<Arc<StackFrame>> {
        self.current_thread().and_then(|t| t.current_frame())
    }

    /// Breakpoints applicable to the current session, as the manager defines
    /// them.
    pub fn breakpoints(&self) -> Vec<SourceBreakpoint> {
        self.state.manager.breakpoints(self.current_session())
    }

    // ---- start / restart ----------------------------------------------------

    /// Starts a fresh session from the current session's launch options and
    /// swaps it into the view in place of the old one. Without a current
    /// session, or when the manager creates nothing, this changes nothing.
    pub async fn start(&self) -> Result<()> {
        let Some(current) = self.current_session() else { return Ok(()) };
        let started = self.state.manager.start_session(current.launch_config()).await?;
        let Some(new_session) = started else { return Ok(()) };
        if new_session.id() == current.id() {
            return Ok(());
        }

        {
            let mut sessions = self.state.sessions.lock();
            let id = current.id();
            sessions.retain(|s| s.id() != id);
            sessions.push(new_session);
        }
        self.state.changed.emit(&());
        Ok(())
    }

    /// Restarts the current session. A replacement handle returned by the
    /// manager replaces the old one in place; "changed" fires regardless,
    /// since a restart alters session state even when the handle survives.
    pub async fn restart(&self) -> Result<()> {
        let Some(current) = self.current_session() else { return Ok(()) };
        let restarted = self.state.manager.restart_session(current.clone()).await?;

        if let Some(new_session) = restarted {
            if new_session.id() != current.id() {
                let mut sessions = self.state.sessions.lock();
                let id = current.id();
                match sessions.iter_mut().find(|s| s.id() == id) {
                    Some(slot) => *slot = new_session,
                    None => sessions.push(new_session),
                }
            }
        }
        self.state.changed.emit(&());
        Ok(())
    }

    // ---- watch expressions --------------------------------------------------

    /// Creates a watch expression, runs its interactive edit step, and keeps
    /// it if the user left non-blank text. Returns the kept expression, or
    /// `None` when it was discarded.
    pub async fn add_watch_expression(
        &self,
        text: impl Into<String>,
    ) -> Result<Option<Arc<WatchExpression>>> {
        let weak = Arc::downgrade(&self.state);
        let expression = WatchExpression::new(
            self.state.manager.clone(),
            Box::new(move || {
                if let Some(state) = weak.upgrade() {
                    state.watch_changed.emit(&());
                }
            }),
            text,
        );

        expression.open(self.state.editor.as_ref()).await?;
        if expression.is_blank() {
            debug!("Discarding blank watch expression");
            return Ok(None);
        }

        self.state.watch_expressions.lock().push(expression.clone());
        self.state.watch_changed.emit(&());
        Ok(Some(expression))
    }

    /// Removes every watch expression at once. Emits a single notification,
    /// and none at all when the list was already empty.
    pub fn remove_watch_expressions(&self) {
        let removed_any = {
            let mut expressions = self.state.watch_expressions.lock();
            if expressions.is_empty() {
                false
            } else {
                expressions.clear();
                true
            }
        };
        if removed_any {
            self.state.watch_changed.emit(&());
        }
    }

    /// Removes one watch expression by identity. Silent no-op when the
    /// expression is not in the list.
    pub fn remove_watch_expression(&self, expression: &WatchExpression) {
        let removed = {
            let mut expressions = self.state.watch_expressions.lock();
            match expressions.iter().position(|e| e.id() == expression.id()) {
                Some(index) => {
                    expressions.remove(index);
                    true
                }
                None => false,
            }
        };
        if removed {
            self.state.watch_changed.emit(&());
        }
    }

    /// Snapshot of the watch expressions in list order.
    pub fn watch_expressions(&self) -> Vec<Arc<WatchExpression>> {
        self.state.watch_expressions.lock().clone()
    }

    /// Requests a debounced watch refresh. Bursts collapse into one cycle;
    /// cycles never overlap.
    pub fn refresh_watch_expressions(&self) {
        self.state.refresh.trigger();
    }

    // ---- signals ------------------------------------------------------------

    /// Subscribes to the generic "view changed" signal.
    pub fn on_changed(&self, listener: impl Fn() + Send + Sync + 'static) -> Subscription {
        self.state.changed.subscribe(move |()| listener())
    }

    /// Subscribes to "breakpoints changed for a file".
    pub fn on_breakpoints_changed(
        &self,
        listener: impl Fn(&PathBuf) + Send + Sync + 'static,
    ) -> Subscription {
        self.state.breakpoints_changed.subscribe(listener)
    }

    /// Subscribes to "watch expressions changed".
    pub fn on_watch_expressions_changed(
        &self,
        listener: impl Fn() + Send + Sync + 'static,
    ) -> Subscription {
        self.state.watch_changed.subscribe(move |()| listener())
    }

    // ---- disposal -----------------------------------------------------------

    /// Releases the manager subscriptions and all listeners. Idempotent.
    ///
    /// In-flight asynchronous work (an open edit step, a running refresh
    /// cycle, a pending start/restart) is not cancelled and may still mutate
    /// the session set afterwards; with the emitters cleared, its
    /// notifications reach nobody.
    pub fn dispose(&self) {
        if self.state.disposed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.subscriptions.lock().clear();
        self.state.changed.clear();
        self.state.breakpoints_changed.clear();
        self.state.watch_changed.clear();
    }

    /// Whether the model has been disposed.
    pub fn is_disposed(&self) -> bool {
        self.state.disposed.load(Ordering::SeqCst)
    }
}

impl Drop for DebugViewModel {
    fn drop(&mut self) {
        self.dispose();
    }
}
