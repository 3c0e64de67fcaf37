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

//! Debug view panel state for DBV
//!
//! This crate holds the presentation-layer model behind one debug view
//! panel: which sessions belong to the view, which session/thread/frame is
//! current, the breakpoints of the current session, and the user's watch
//! expressions with their debounced re-evaluation. Session lifecycle,
//! breakpoint synchronization, and expression evaluation live behind the
//! [`SessionManager`] and [`DebugSession`] contracts; this crate only
//! observes them and mirrors the narrow state a panel needs to render.

mod manager;
mod model;
mod refresh;
mod session;
pub mod testing;
mod watch;

pub use manager::{
    ActiveSessionChange, BreakpointsChange, ExpressionEditor, ManagerStateChange, SessionManager,
};
pub use model::DebugViewModel;
pub use session::{same_session, DebugSession};
pub use watch::WatchExpression;
