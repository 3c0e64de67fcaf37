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

//! DBV Common - Shared functionality for DBV components
//!
//! This crate provides the building blocks shared between the debug view
//! layer and its collaborators: domain types (sessions, threads, frames,
//! breakpoints), expression helpers, the event broadcast primitive, and
//! logging setup.

/// Common types used throughout DBV including sessions, stack frames, breakpoints, and evaluation results
pub mod types;

/// Event broadcast primitive: emitters, listeners, and subscription tokens
pub mod event;
/// Expression text helpers shared by watch expressions and breakpoint conditions
pub mod expression;
/// Logging setup and utilities for consistent logging across DBV components
pub mod logging;

pub use event::*;
pub use expression::*;
