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

//! Fire-and-forget event broadcast.
//!
//! An [`Emitter`] holds a registry of listeners and delivers payloads
//! synchronously to the listeners registered at emit time. There is no
//! buffering and no delivery guarantee beyond that. [`Subscription`] is the
//! unsubscribe token: dropping it (or calling [`Subscription::dispose`])
//! releases the listener.

use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use parking_lot::Mutex;

/// Boxed event handler, the form listeners take at trait seams.
pub type Listener<T> = Box<dyn Fn(&T) + Send + Sync>;

type SharedListener<T> = Arc<dyn Fn(&T) + Send + Sync>;

/// A broadcast channel delivering payloads synchronously to its listeners.
pub struct Emitter<T> {
    listeners: Arc<Mutex<Vec<(u64, SharedListener<T>)>>>,
    next_id: AtomicU64,
}

impl<T> Default for Emitter<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for Emitter<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Emitter").field("listeners", &self.listener_count()).finish()
    }
}

impl<T> Emitter<T> {
    /// Creates an emitter with no listeners.
    pub fn new() -> Self {
        Self { listeners: Arc::new(Mutex::new(Vec::new())), next_id: AtomicU64::new(0) }
    }

    /// Registers a listener. The returned token unsubscribes on drop.
    pub fn subscribe(&self, listener: impl Fn(&T) + Send + Sync + 'static) -> Subscription
    where
        T: 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.listeners.lock().push((id, Arc::new(listener)));

        let registry = Arc::downgrade(&self.listeners);
        Subscription::new(move || {
            if let Some(listeners) = registry.upgrade() {
                listeners.lock().retain(|(entry_id, _)| *entry_id != id);
            }
        })
    }

    /// Delivers `payload` to every currently registered listener.
    ///
    /// The registry is snapshotted before delivery, so listeners may
    /// subscribe or unsubscribe from within a handler without deadlocking.
    pub fn emit(&self, payload: &T) {
        let snapshot: Vec<SharedListener<T>> =
            self.listeners.lock().iter().map(|(_, listener)| listener.clone()).collect();
        for listener in snapshot {
            listener(payload);
        }
    }

    /// Releases every registered listener at once.
    pub fn clear(&self) {
        self.listeners.lock().clear();
    }

    /// Number of currently registered listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners.lock().len()
    }
}

/// Token representing a registered listener.
///
/// The listener stays registered until the token is dropped or explicitly
/// disposed. Tokens are type-erased so heterogeneous subscriptions can be
/// collected and released together.
pub struct Subscription(Option<Box<dyn FnOnce() + Send>>);

impl Subscription {
    /// Wraps an unsubscribe action into a token.
    pub fn new(unsubscribe: impl FnOnce() + Send + 'static) -> Self {
        Self(Some(Box::new(unsubscribe)))
    }

    /// A token that releases nothing, for optional subscriptions.
    pub fn empty() -> Self {
        Self(None)
    }

    /// Releases the listener now instead of waiting for drop.
    pub fn dispose(mut self) {
        if let Some(unsubscribe) = self.0.take() {
            unsubscribe();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("active", &self.0.is_some()).finish()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(unsubscribe) = self.0.take() {
            unsubscribe();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_emit_reaches_registered_listeners() {
        let emitter = Emitter::<u32>::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let seen_clone = seen.clone();
        let _sub = emitter.subscribe(move |value| seen_clone.lock().push(*value));

        emitter.emit(&1);
        emitter.emit(&2);
        assert_eq!(*seen.lock(), vec![1, 2]);
    }

    #[test]
    fn test_drop_unsubscribes() {
        let emitter = Emitter::<()>::new();
        let count = Arc::new(AtomicUsize::new(0));

        let count_clone = count.clone();
        let sub = emitter.subscribe(move |_| {
            count_clone.fetch_add(1, Ordering::SeqCst);
        });
        emitter.emit(&());
        drop(sub);
        emitter.emit(&());

        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(emitter.listener_count(), 0);
    }

    #[test]
    fn test_dispose_unsubscribes() {
        let emitter = Emitter::<()>::new();
        let sub = emitter.subscribe(|_| {});
        assert_eq!(emitter.listener_count(), 1);
        sub.dispose();
        assert_eq!(emitter.listener_count(), 0);
    }

    #[test]
    fn test_clear_releases_all_listeners() {
        let emitter = Emitter::<()>::new();
        let count = Arc::new(AtomicUsize::new(0));

        let count_a = count.clone();
        let _a = emitter.subscribe(move |_| {
            count_a.fetch_add(1, Ordering::SeqCst);
        });
        let count_b = count.clone();
        let _b = emitter.subscribe(move |_| {
            count_b.fetch_add(1, Ordering::SeqCst);
        });

        emitter.clear();
        emitter.emit(&());
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_unsubscribe_from_within_handler() {
        // A listener that unsubscribes another while an emit is in flight must
        // not deadlock; delivery uses the registry snapshot from emit time.
        let emitter = Arc::new(Emitter::<()>::new());
        let victim = Arc::new(Mutex::new(None::<Subscription>));

        let count = Arc::new(AtomicUsize::new(0));
        let count_clone = count.clone();
        *victim.lock() = Some(emitter.subscribe(move |_| {
            count_clone.fetch_add(1, Ordering::SeqCst);
        }));

        let victim_clone = victim.clone();
        let _killer = emitter.subscribe(move |_| {
            if let Some(sub) = victim_clone.lock().take() {
                sub.dispose();
            }
        });

        emitter.emit(&());
        emitter.emit(&());
        // The victim saw at most the first emit.
        assert!(count.load(Ordering::SeqCst) <= 1);
    }

    #[test]
    fn test_subscription_outliving_emitter_is_harmless() {
        let emitter = Emitter::<()>::new();
        let sub = emitter.subscribe(|_| {});
        drop(emitter);
        sub.dispose();
    }
}
