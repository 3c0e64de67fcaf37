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

//! User-created watch expressions.

use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use dbv_common::{is_blank, normalize_expression, types::EvaluatedValue};
use eyre::Result;
use parking_lot::RwLock;
use tracing::trace;

use crate::manager::{ExpressionEditor, SessionManager};

static NEXT_WATCH_ID: AtomicU64 = AtomicU64::new(1);

/// A user-entered expression re-evaluated against the active session.
///
/// The expression is bound to whichever session is active in the manager at
/// evaluation time, not frozen to the session that was active when the
/// expression was created. After every evaluation that produced a new value
/// (including clearing it), the change callback supplied at construction is
/// invoked so the owning view can notify its consumers.
pub struct WatchExpression {
    id: u64,
    manager: Arc<dyn SessionManager>,
    on_changed: Box<dyn Fn() + Send + Sync>,
    text: RwLock<String>,
    value: RwLock<Option<EvaluatedValue>>,
}

impl std::fmt::Debug for WatchExpression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatchExpression")
            .field("id", &self.id)
            .field("text", &*self.text.read())
            .field("value", &*self.value.read())
            .finish()
    }
}

impl WatchExpression {
    pub(crate) fn new(
        manager: Arc<dyn SessionManager>,
        on_changed: Box<dyn Fn() + Send + Sync>,
        text: impl Into<String>,
    ) -> Arc<Self> {
        Arc::new(Self {
            id: NEXT_WATCH_ID.fetch_add(1, Ordering::Relaxed),
            manager,
            on_changed,
            text: RwLock::new(normalize_expression(&text.into())),
            value: RwLock::new(None),
        })
    }

    /// Identity of this expression within its view.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// The expression text in normalized form.
    pub fn text(&self) -> String {
        self.text.read().clone()
    }

    /// Replaces the expression text, normalizing its whitespace.
    pub fn set_text(&self, text: &str) {
        *self.text.write() = normalize_expression(text);
    }

    /// Whether the expression has no text to evaluate.
    pub fn is_blank(&self) -> bool {
        is_blank(&self.text.read())
    }

    /// The most recent evaluation result, if there is one.
    pub fn value(&self) -> Option<EvaluatedValue> {
        self.value.read().clone()
    }

    /// Runs the interactive edit step, storing whatever text the editor
    /// produced. May suspend awaiting user input.
    pub async fn open(&self, editor: &dyn ExpressionEditor) -> Result<()> {
        let edited = editor.edit(self.text()).await?;
        self.set_text(&edited);
        Ok(())
    }

    /// Evaluates the expression against the manager's currently active
    /// session.
    ///
    /// With no active session the stored value is cleared rather than
    /// treated as an error. Evaluation failures propagate to the caller with
    /// the stored value left untouched; the refresh cycle decides what to do
    /// with them.
    pub async fn evaluate(&self) -> Result<()> {
        match self.manager.active_session() {
            None => {
                trace!(id = self.id, "no active session, clearing watch value");
                *self.value.write() = None;
            }
            Some(session) => {
                let value = session.evaluate(&self.text()).await?;
                trace!(id = self.id, %value, "watch expression evaluated");
                *self.value.write() = Some(value);
            }
        }
        (self.on_changed)();
        Ok(())
    }
}
