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

//! End-to-end behavior of [`DebugViewModel`] against scripted collaborators.

use std::{
    path::PathBuf,
    str::FromStr,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use dbv_common::types::{
    DebugThread, EvaluatedValue, SessionState, SourceBreakpoint, SourceLocation, StackFrame,
};
use dbv_view::{
    testing::{MockSession, MockSessionManager, ScriptedEditor},
    DebugSession, DebugViewModel, SessionManager,
};
use parking_lot::Mutex;

fn new_model(manager: &Arc<MockSessionManager>) -> DebugViewModel {
    DebugViewModel::new(manager.clone(), ScriptedEditor::new(), None)
}

fn changed_counter(model: &DebugViewModel) -> (Arc<AtomicUsize>, dbv_common::event::Subscription) {
    let count = Arc::new(AtomicUsize::new(0));
    let count_clone = count.clone();
    let sub = model.on_changed(move || {
        count_clone.fetch_add(1, Ordering::SeqCst);
    });
    (count, sub)
}

fn watch_counter(model: &DebugViewModel) -> (Arc<AtomicUsize>, dbv_common::event::Subscription) {
    let count = Arc::new(AtomicUsize::new(0));
    let count_clone = count.clone();
    let sub = model.on_watch_expressions_changed(move || {
        count_clone.fetch_add(1, Ordering::SeqCst);
    });
    (count, sub)
}

#[tokio::test]
async fn test_add_remove_emit_once_per_membership_change() {
    let manager = MockSessionManager::new();
    let model = new_model(&manager);
    let (changed, _sub) = changed_counter(&model);

    let a = MockSession::new("a");
    let b = MockSession::new("b");

    model.add_session(a.clone());
    assert_eq!(changed.load(Ordering::SeqCst), 1);
    assert!(model.contains_session(a.as_ref()));
    assert_eq!(model.session_count(), 1);

    // Duplicate add must not emit.
    model.add_session(a.clone());
    assert_eq!(changed.load(Ordering::SeqCst), 1);
    assert_eq!(model.session_count(), 1);

    model.add_session(b.clone());
    assert_eq!(changed.load(Ordering::SeqCst), 2);

    assert!(model.remove_session(a.as_ref()));
    assert_eq!(changed.load(Ordering::SeqCst), 3);

    // Removing an absent session is a silent no-op.
    assert!(!model.remove_session(a.as_ref()));
    assert_eq!(changed.load(Ordering::SeqCst), 3);
    assert_eq!(model.session_count(), 1);
    assert!(!model.contains_session(a.as_ref()));
}

#[tokio::test]
async fn test_sessions_keep_insertion_order() {
    let manager = MockSessionManager::new();
    let model = new_model(&manager);

    let a = MockSession::new("a");
    let b = MockSession::new("b");
    let c = MockSession::new("c");
    model.add_session(a.clone());
    model.add_session(b.clone());
    model.add_session(c.clone());

    let names: Vec<String> = model.sessions().iter().map(|s| s.name()).collect();
    assert_eq!(names, vec!["a", "b", "c"]);
}

#[tokio::test]
async fn test_initial_session_is_seeded() {
    let manager = MockSessionManager::new();
    let a = MockSession::new("a");
    let model = DebugViewModel::new(manager.clone(), ScriptedEditor::new(), Some(a.clone()));

    assert_eq!(model.session_count(), 1);
    assert!(model.contains_session(a.as_ref()));
    assert_eq!(model.current_session().unwrap().id(), a.id());
}

#[tokio::test]
async fn test_current_session_resolution() {
    let manager = MockSessionManager::new();
    let model = new_model(&manager);

    // Empty view: no current session, inactive sentinel.
    assert!(model.current_session().is_none());
    assert_eq!(model.state(), SessionState::Inactive);

    let a = MockSession::new("a");
    let b = MockSession::new("b");
    model.add_session(a.clone());

    // Manager's active session is not a member: fall back to first member.
    manager.set_active_session(Some(b.clone()));
    assert_eq!(model.current_session().unwrap().id(), a.id());

    // Once the active session is a member, it wins over insertion order.
    model.add_session(b.clone());
    assert_eq!(model.current_session().unwrap().id(), b.id());

    // No active session at all: first member again.
    manager.set_active_session(None);
    assert_eq!(model.current_session().unwrap().id(), a.id());
}

#[tokio::test]
async fn test_state_tracks_current_session() {
    let manager = MockSessionManager::new();
    let model = new_model(&manager);

    let a = MockSession::new("a");
    a.set_state(SessionState::Running);
    model.add_session(a.clone());
    assert_eq!(model.state(), SessionState::Running);

    a.set_state(SessionState::Stopped);
    assert_eq!(model.state(), SessionState::Stopped);

    model.remove_session(a.as_ref());
    assert_eq!(model.state(), SessionState::Inactive);
}

#[tokio::test]
async fn test_thread_and_frame_projections_degrade_to_none() {
    let manager = MockSessionManager::new();
    let model = new_model(&manager);

    // No current session.
    assert!(model.current_thread().is_none());
    assert!(model.current_frame().is_none());

    let a = MockSession::new("a");
    model.add_session(a.clone());

    // Session without a selected thread.
    assert!(model.current_thread().is_none());
    assert!(model.current_frame().is_none());

    // Thread without a selected frame.
    let running = Arc::new(DebugThread::new(1, "main"));
    a.set_current_thread(Some(running));
    assert!(model.current_thread().is_some());
    assert!(model.current_frame().is_none());

    // Full chain.
    let frame = Arc::new(StackFrame::new(7, "compute").with_source(SourceLocation {
        path: PathBuf::from("src/main.c"),
        line: 12,
        column: 4,
    }));
    let stopped = Arc::new(DebugThread::new(1, "main").with_frames(vec![frame]));
    a.set_current_thread(Some(stopped));
    assert_eq!(model.current_frame().unwrap().id, 7);
}

#[tokio::test]
async fn test_breakpoints_pass_through_manager() {
    let manager = MockSessionManager::new();
    let model = new_model(&manager);

    let bps = vec![
        SourceBreakpoint::from_str("src/main.c:10").unwrap(),
        SourceBreakpoint::from_str("src/util.c:3 if n == 0").unwrap(),
    ];
    manager.set_breakpoints(bps.clone());

    assert_eq!(model.breakpoints(), bps);
}

#[tokio::test]
async fn test_changed_fires_only_on_membership_boundary_transitions() {
    let manager = MockSessionManager::new();
    let model = new_model(&manager);

    let a = MockSession::new("a");
    let b = MockSession::new("b");
    let c = MockSession::new("c");
    model.add_session(a.clone());

    // Baseline from spec scenario: set = {A}, active = B (not a member).
    manager.set_active_session(Some(b.clone()));
    assert_eq!(model.current_session().unwrap().id(), a.id());

    let (changed, _sub) = changed_counter(&model);

    // B (non-member) -> A (member): crosses into the view, one emit.
    manager.set_active_session(Some(a.clone()));
    assert_eq!(model.current_session().unwrap().id(), a.id());
    assert_eq!(changed.load(Ordering::SeqCst), 1);

    // A (member) -> C (non-member): crosses out of the view, one emit.
    manager.set_active_session(Some(c.clone()));
    assert_eq!(changed.load(Ordering::SeqCst), 2);

    // C -> B: stays outside, not reported.
    manager.set_active_session(Some(b.clone()));
    assert_eq!(changed.load(Ordering::SeqCst), 2);

    // Transitions staying inside are not reported either.
    model.add_session(b.clone());
    let base = changed.load(Ordering::SeqCst);
    manager.set_active_session(Some(a.clone()));
    assert_eq!(changed.load(Ordering::SeqCst), base);
}

#[tokio::test]
async fn test_state_change_filtering() {
    let manager = MockSessionManager::new();
    let model = new_model(&manager);

    let a = MockSession::new("a");
    let outsider = MockSession::new("outsider");
    model.add_session(a.clone());

    let (changed, _sub) = changed_counter(&model);

    // Global change: reported.
    manager.fire_state_changed(None);
    assert_eq!(changed.load(Ordering::SeqCst), 1);

    // Change on a member session: reported.
    manager.fire_state_changed(Some(a.clone()));
    assert_eq!(changed.load(Ordering::SeqCst), 2);

    // Change on a foreign session: ignored.
    manager.fire_state_changed(Some(outsider.clone()));
    assert_eq!(changed.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_breakpoints_changed_filtering() {
    let manager = MockSessionManager::new();
    let model = new_model(&manager);

    let a = MockSession::new("a");
    let outsider = MockSession::new("outsider");
    model.add_session(a.clone());
    manager.set_active_session(Some(a.clone()));

    let paths = Arc::new(Mutex::new(Vec::new()));
    let paths_clone = paths.clone();
    let _sub = model.on_breakpoints_changed(move |path| paths_clone.lock().push(path.clone()));

    // No session named: applies globally.
    manager.fire_breakpoints_changed(None, "src/a.c");
    // Named session equals the current session: applies.
    manager.fire_breakpoints_changed(Some(a.clone()), "src/b.c");
    // Named session is not the current session: filtered out.
    manager.fire_breakpoints_changed(Some(outsider.clone()), "src/c.c");

    let seen: Vec<PathBuf> = paths.lock().clone();
    assert_eq!(seen, vec![PathBuf::from("src/a.c"), PathBuf::from("src/b.c")]);
}

#[tokio::test]
async fn test_start_without_current_session_is_noop() {
    let manager = MockSessionManager::new();
    let model = new_model(&manager);
    let (changed, _sub) = changed_counter(&model);

    model.start().await.unwrap();
    assert!(manager.start_requests().is_empty());
    assert_eq!(changed.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_start_swaps_in_the_new_session() {
    let manager = MockSessionManager::new();
    let model = new_model(&manager);

    let a = MockSession::new("a");
    model.add_session(a.clone());
    let (changed, _sub) = changed_counter(&model);

    let replacement = MockSession::new("a (restarted)");
    manager.script_start_result(Some(replacement.clone()));

    model.start().await.unwrap();

    // The manager was asked to relaunch with the old session's options.
    assert_eq!(manager.start_requests().len(), 1);
    assert_eq!(manager.start_requests()[0].name, "a");

    assert!(!model.contains_session(a.as_ref()));
    assert!(model.contains_session(replacement.as_ref()));
    assert_eq!(model.session_count(), 1);
    assert_eq!(changed.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_start_with_no_new_session_changes_nothing() {
    let manager = MockSessionManager::new();
    let model = new_model(&manager);

    let a = MockSession::new("a");
    model.add_session(a.clone());
    let (changed, _sub) = changed_counter(&model);

    // Unscripted start yields no session.
    model.start().await.unwrap();
    assert!(model.contains_session(a.as_ref()));
    assert_eq!(changed.load(Ordering::SeqCst), 0);

    // A manager echoing the same handle changes nothing either.
    manager.script_start_result(Some(a.clone()));
    model.start().await.unwrap();
    assert_eq!(model.session_count(), 1);
    assert_eq!(changed.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_restart_always_emits_once() {
    let manager = MockSessionManager::new();
    let model = new_model(&manager);

    let a = MockSession::new("a");
    model.add_session(a.clone());
    let (changed, _sub) = changed_counter(&model);

    // Default mock behavior: restart returns the same handle. The emit is
    // unconditional because the session's internal state changed anyway.
    model.restart().await.unwrap();
    assert!(model.contains_session(a.as_ref()));
    assert_eq!(changed.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_restart_replaces_handle_in_place() {
    let manager = MockSessionManager::new();
    let model = new_model(&manager);

    let a = MockSession::new("a");
    let b = MockSession::new("b");
    model.add_session(a.clone());
    model.add_session(b.clone());
    manager.set_active_session(Some(a.clone()));

    let (changed, _sub) = changed_counter(&model);

    let replacement = MockSession::new("a'");
    manager.script_restart_result(Some(replacement.clone()));
    model.restart().await.unwrap();

    // The replacement takes the old session's position.
    let names: Vec<String> = model.sessions().iter().map(|s| s.name()).collect();
    assert_eq!(names, vec!["a'", "b"]);
    assert_eq!(changed.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_restart_without_current_session_is_noop() {
    let manager = MockSessionManager::new();
    let model = new_model(&manager);
    let (changed, _sub) = changed_counter(&model);

    model.restart().await.unwrap();
    assert_eq!(changed.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_add_watch_expression_discards_blank_text() {
    let manager = MockSessionManager::new();
    let editor = ScriptedEditor::with_responses(["   "]);
    let model = DebugViewModel::new(manager.clone(), editor, None);
    let (watch_changed, _sub) = watch_counter(&model);

    let result = model.add_watch_expression("").await.unwrap();
    assert!(result.is_none());
    assert!(model.watch_expressions().is_empty());
    assert_eq!(watch_changed.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_add_watch_expression_keeps_edited_text() {
    let manager = MockSessionManager::new();
    let editor = ScriptedEditor::with_responses(["items.len()"]);
    let model = DebugViewModel::new(manager.clone(), editor, None);
    let (watch_changed, _sub) = watch_counter(&model);

    let expression = model.add_watch_expression("").await.unwrap().unwrap();
    assert_eq!(expression.text(), "items.len()");
    assert_eq!(model.watch_expressions().len(), 1);
    assert_eq!(watch_changed.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_remove_watch_expressions_emits_only_when_non_empty() {
    let manager = MockSessionManager::new();
    let model = new_model(&manager);
    let (watch_changed, _sub) = watch_counter(&model);

    // Clearing an empty list is silent.
    model.remove_watch_expressions();
    assert_eq!(watch_changed.load(Ordering::SeqCst), 0);

    model.add_watch_expression("x").await.unwrap();
    model.add_watch_expression("y").await.unwrap();
    assert_eq!(watch_changed.load(Ordering::SeqCst), 2);

    model.remove_watch_expressions();
    assert!(model.watch_expressions().is_empty());
    assert_eq!(watch_changed.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_remove_single_watch_expression_by_identity() {
    let manager = MockSessionManager::new();
    let model = new_model(&manager);

    let x = model.add_watch_expression("x").await.unwrap().unwrap();
    let y = model.add_watch_expression("y").await.unwrap().unwrap();
    let (watch_changed, _sub) = watch_counter(&model);

    model.remove_watch_expression(&x);
    assert_eq!(watch_changed.load(Ordering::SeqCst), 1);
    let remaining: Vec<u64> = model.watch_expressions().iter().map(|e| e.id()).collect();
    assert_eq!(remaining, vec![y.id()]);

    // Removing it again is a silent no-op.
    model.remove_watch_expression(&x);
    assert_eq!(watch_changed.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_refresh_burst_runs_one_cycle() {
    let manager = MockSessionManager::new();
    let model = new_model(&manager);

    let session = MockSession::new("a");
    model.add_session(session.clone());
    manager.set_active_session(Some(session.clone()));

    model.add_watch_expression("e1").await.unwrap();
    model.add_watch_expression("e2").await.unwrap();

    for _ in 0..10 {
        model.refresh_watch_expressions();
    }
    tokio::time::sleep(Duration::from_millis(500)).await;

    // One coalesced cycle: each expression evaluated exactly once, in order.
    assert_eq!(session.evaluations(), vec!["e1", "e2"]);
}

#[tokio::test(start_paused = true)]
async fn test_refresh_error_aborts_cycle_and_next_cycle_is_fresh() {
    let manager = MockSessionManager::new();
    let model = new_model(&manager);

    let session = MockSession::new("a");
    model.add_session(session.clone());
    manager.set_active_session(Some(session.clone()));

    model.add_watch_expression("e1").await.unwrap();
    model.add_watch_expression("e2").await.unwrap();
    model.add_watch_expression("e3").await.unwrap();
    session.set_eval_result("e2", Err("not available".into()));

    model.refresh_watch_expressions();
    tokio::time::sleep(Duration::from_millis(500)).await;

    // e1 succeeded, e2 failed, e3 was skipped for this cycle.
    assert_eq!(session.evaluations(), vec!["e1", "e2"]);

    // A later trigger starts over and evaluates everything again.
    session.clear_evaluations();
    session.set_eval_result("e2", Ok(EvaluatedValue::new("fixed")));
    model.refresh_watch_expressions();
    tokio::time::sleep(Duration::from_millis(500)).await;

    assert_eq!(session.evaluations(), vec!["e1", "e2", "e3"]);
}

#[tokio::test(start_paused = true)]
async fn test_manager_state_change_triggers_debounced_refresh() {
    let manager = MockSessionManager::new();
    let model = new_model(&manager);

    let session = MockSession::new("a");
    model.add_session(session.clone());
    manager.set_active_session(Some(session.clone()));
    model.add_watch_expression("x").await.unwrap();

    manager.fire_state_changed(None);
    manager.fire_state_changed(Some(session.clone()));
    tokio::time::sleep(Duration::from_millis(500)).await;

    // Both triggers fell into one debounce window.
    assert_eq!(session.evaluations(), vec!["x"]);
}

#[tokio::test]
async fn test_dispose_releases_manager_subscriptions() {
    let manager = MockSessionManager::new();
    let model = new_model(&manager);

    let a = MockSession::new("a");
    model.add_session(a.clone());
    manager.set_active_session(Some(a.clone()));

    let (changed, _sub) = changed_counter(&model);
    let bp_paths = Arc::new(Mutex::new(Vec::<PathBuf>::new()));
    let bp_clone = bp_paths.clone();
    let _bp_sub = model.on_breakpoints_changed(move |path| bp_clone.lock().push(path.clone()));

    model.dispose();
    assert!(model.is_disposed());

    // Events after disposal reach nobody: the standing subscriptions are
    // gone and the broadcast channels were cleared.
    manager.fire_state_changed(None);
    manager.fire_breakpoints_changed(None, "src/a.c");
    manager.set_active_session(None);

    assert_eq!(changed.load(Ordering::SeqCst), 0);
    assert!(bp_paths.lock().is_empty());

    // Disposal is idempotent.
    model.dispose();
}
