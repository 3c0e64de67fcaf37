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

//! Debounce-then-serialize execution of refresh jobs.
//!
//! Two orthogonal behaviors combined in one worker task:
//!
//! - a trailing debounce window, so bursts of triggers collapse into a
//!   single execution;
//! - strict serialization, so at most one execution runs at a time and
//!   triggers arriving mid-execution coalesce into exactly one follow-up.
//!
//! The worker drains an unbounded channel; the handle side only ever sends.
//! Dropping the handle closes the channel and lets the worker exit after the
//! execution in flight, if any, has finished.

use std::time::Duration;

use futures::future::BoxFuture;
use tokio::{sync::mpsc, time::timeout};

/// Handle to a debounced, serialized background job.
#[derive(Debug)]
pub(crate) struct DebouncedRefresh {
    trigger_tx: mpsc::UnboundedSender<()>,
}

impl DebouncedRefresh {
    /// Spawns the worker task. `job` produces one execution's future; it is
    /// invoked once per coalesced trigger burst, never concurrently.
    pub(crate) fn spawn<F>(window: Duration, job: F) -> Self
    where
        F: FnMut() -> BoxFuture<'static, ()> + Send + 'static,
    {
        let (trigger_tx, trigger_rx) = mpsc::unbounded_channel();
        tokio::spawn(Self::run(trigger_rx, window, job));
        Self { trigger_tx }
    }

    /// Requests an execution. Cheap and infallible; triggers sent after the
    /// worker has exited are dropped.
    pub(crate) fn trigger(&self) {
        let _ = self.trigger_tx.send(());
    }

    async fn run<F>(mut trigger_rx: mpsc::UnboundedReceiver<()>, window: Duration, mut job: F)
    where
        F: FnMut() -> BoxFuture<'static, ()> + Send + 'static,
    {
        while trigger_rx.recv().await.is_some() {
            // Trailing debounce: every further trigger restarts the window.
            loop {
                match timeout(window, trigger_rx.recv()).await {
                    Err(_) => break,
                    Ok(Some(())) => {}
                    Ok(None) => return,
                }
            }
            // Triggers arriving from here on buffer in the channel and fold
            // into the next cycle, which keeps executions strictly FIFO.
            job().await;
        }
    }
}
