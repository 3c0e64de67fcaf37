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

use std::{fmt::Display, path::PathBuf, sync::Arc};

use serde::{Deserialize, Serialize};

/// A position in a source file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct SourceLocation {
    /// Path to the source file.
    pub path: PathBuf,
    /// Line number in the source file (1-based).
    pub line: usize,
    /// Column within the line (0-based).
    pub column: usize,
}

impl Display for SourceLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.path.display(), self.line, self.column)
    }
}

/// One frame of a thread's call stack.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StackFrame {
    /// Frame id, unique within its session while the thread is stopped.
    pub id: u64,
    /// Function or scope name shown in the call-stack view.
    pub name: String,
    /// Where the frame is paused, if the adapter reported a source.
    pub source: Option<SourceLocation>,
}

impl StackFrame {
    /// Creates a frame without source information.
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self { id, name: name.into(), source: None }
    }

    /// Attaches a source location to the frame.
    pub fn with_source(mut self, source: SourceLocation) -> Self {
        self.source = Some(source);
        self
    }
}

/// A thread of the debuggee, together with its call stack and frame selection.
///
/// Threads are snapshots assembled by the session from adapter responses. A
/// running thread typically has an empty call stack and no selected frame;
/// both "no frames" and "frames but no selection" are representable so that
/// consumers can degrade to "none" instead of guessing.
#[derive(Debug, Clone)]
pub struct DebugThread {
    /// Thread id as reported by the adapter.
    pub id: u64,
    /// Thread name shown in the threads view.
    pub name: String,
    /// Whether the thread is currently paused.
    pub stopped: bool,
    frames: Vec<Arc<StackFrame>>,
    current_frame: Option<Arc<StackFrame>>,
}

impl DebugThread {
    /// Creates a running thread with no call stack.
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self { id, name: name.into(), stopped: false, frames: Vec::new(), current_frame: None }
    }

    /// Marks the thread as stopped and records its call stack, selecting the
    /// top frame by default.
    pub fn with_frames(mut self, frames: Vec<Arc<StackFrame>>) -> Self {
        self.stopped = true;
        self.current_frame = frames.first().cloned();
        self.frames = frames;
        self
    }

    /// Overrides the frame selection. Passing `None` clears it.
    pub fn with_current_frame(mut self, frame: Option<Arc<StackFrame>>) -> Self {
        self.current_frame = frame;
        self
    }

    /// The selected frame, or `None` when the thread has no selection.
    pub fn current_frame(&self) -> Option<Arc<StackFrame>> {
        self.current_frame.clone()
    }

    /// The thread's call stack, top frame first.
    pub fn frames(&self) -> &[Arc<StackFrame>] {
        &self.frames
    }
}
