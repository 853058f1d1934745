//! Observable key-path state store

use parking_lot::{Mutex, RwLock};
use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};
use tokio::sync::mpsc;
use uuid::Uuid;

/// Path into the engine's persisted state
///
/// Subscriptions filter change notifications by path prefix: a [Pool](StatePath::Pool) filter
/// covers every entry, a [PoolEntry](StatePath::PoolEntry) filter covers one.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatePath {
    /// The whole user operation pool
    Pool,
    /// A single pool entry
    PoolEntry(Uuid),
}

impl StatePath {
    /// Whether a change at `changed` is covered by this filter
    pub fn covers(&self, changed: &StatePath) -> bool {
        match self {
            StatePath::Pool => true,
            filter => filter == changed,
        }
    }
}

/// Handle to a change-notification subscription
///
/// Dropping the handle unsubscribes the listener; no notifications leak past the handle's
/// lifetime.
pub struct StateSubscription {
    events: mpsc::UnboundedReceiver<StatePath>,
    unsubscribe: Option<Box<dyn FnOnce() + Send>>,
}

impl StateSubscription {
    /// Waits for the next covered change, None if the store was dropped
    pub async fn changed(&mut self) -> Option<StatePath> {
        self.events.recv().await
    }
}

impl Drop for StateSubscription {
    fn drop(&mut self) {
        if let Some(unsubscribe) = self.unsubscribe.take() {
            unsubscribe();
        }
    }
}

/// Key-path-addressable observable store
///
/// `update` mutates the state atomically with respect to readers and subscribers and emits a
/// change notification for the touched path after the mutation commits.
pub trait StateStore: Send + Sync {
    type State: Clone + Default + Send + Sync;

    /// Reads the state under the store's read lock
    fn with<R>(&self, read: impl FnOnce(&Self::State) -> R) -> R;

    /// Mutates the state atomically and notifies subscribers covering `path`
    fn update<R>(&self, path: StatePath, mutate: impl FnOnce(&mut Self::State) -> R) -> R;

    /// Registers a listener for changes covered by `filter`
    fn subscribe(&self, filter: StatePath) -> StateSubscription;
}

struct Listener {
    filter: StatePath,
    events: mpsc::UnboundedSender<StatePath>,
}

struct MemoryStoreInner<S> {
    state: RwLock<S>,
    listeners: Mutex<HashMap<u64, Listener>>,
    next_listener: AtomicU64,
}

/// In-memory [StateStore](StateStore) backend
pub struct MemoryStore<S> {
    inner: Arc<MemoryStoreInner<S>>,
}

impl<S: Clone + Default + Send + Sync> Default for MemoryStore<S> {
    fn default() -> Self {
        Self {
            inner: Arc::new(MemoryStoreInner {
                state: RwLock::new(S::default()),
                listeners: Mutex::new(HashMap::new()),
                next_listener: AtomicU64::new(0),
            }),
        }
    }
}

impl<S: Clone + Default + Send + Sync> MemoryStore<S> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<S> Clone for MemoryStore<S> {
    fn clone(&self) -> Self {
        Self { inner: self.inner.clone() }
    }
}

impl<S: Clone + Default + Send + Sync + 'static> StateStore for MemoryStore<S> {
    type State = S;

    fn with<R>(&self, read: impl FnOnce(&S) -> R) -> R {
        read(&self.inner.state.read())
    }

    fn update<R>(&self, path: StatePath, mutate: impl FnOnce(&mut S) -> R) -> R {
        // notify under the write lock, so notification order matches state order
        let mut state = self.inner.state.write();
        let result = mutate(&mut state);

        let mut listeners = self.inner.listeners.lock();
        listeners.retain(|_, listener| {
            if !listener.filter.covers(&path) {
                return true;
            }
            listener.events.send(path).is_ok()
        });

        result
    }

    fn subscribe(&self, filter: StatePath) -> StateSubscription {
        let id = self.inner.next_listener.fetch_add(1, Ordering::Relaxed);
        let (events, receiver) = mpsc::unbounded_channel();
        self.inner.listeners.lock().insert(id, Listener { filter, events });

        let inner = Arc::downgrade(&self.inner);
        StateSubscription {
            events: receiver,
            unsubscribe: Some(Box::new(move || {
                if let Some(inner) = inner.upgrade() {
                    inner.listeners.lock().remove(&id);
                }
            })),
        }
    }
}
