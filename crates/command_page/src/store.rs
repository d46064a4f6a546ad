use std::{
    sync::{Arc, Mutex, MutexGuard, PoisonError, TryLockError, Weak},
    thread::{self, ThreadId},
};

use shared::protocol::CommandDefinition;
use tokio::sync::mpsc;
use tracing::debug;

type Observer = Arc<dyn Fn(&Arc<CommandDefinition>) + Send + Sync>;

/// Latest resolved command plus the observers that want to hear about it.
///
/// New observers get the current value (if any) right away, then every later
/// publish in order. Observers run synchronously on the publishing task; they
/// may read [`CommandStateStore::current`] and register further observers.
#[derive(Clone, Default)]
pub struct CommandStateStore {
    shared: Arc<StoreShared>,
}

#[derive(Default)]
struct StoreShared {
    state: Mutex<StoreState>,
    // Serializes deliveries so a new observer never sees an older value after a newer one.
    delivery: Mutex<()>,
    delivering_on: Mutex<Option<ThreadId>>,
}

// Marks the current thread as delivering until dropped.
struct DeliveryMark<'a> {
    shared: &'a StoreShared,
    previous: Option<ThreadId>,
}

impl<'a> DeliveryMark<'a> {
    fn set(shared: &'a StoreShared) -> Self {
        let previous = lock(&shared.delivering_on).replace(thread::current().id());
        Self { shared, previous }
    }
}

impl Drop for DeliveryMark<'_> {
    fn drop(&mut self) {
        *lock(&self.shared.delivering_on) = self.previous.take();
    }
}

#[derive(Default)]
struct StoreState {
    current: Option<Arc<CommandDefinition>>,
    observers: Vec<(u64, Observer)>,
    next_observer_id: u64,
}

/// Registration handle; the observer is removed when this is dropped.
#[must_use = "dropping a subscription unregisters the observer"]
pub struct Subscription {
    store: Weak<StoreShared>,
    id: u64,
}

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl CommandStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<Arc<CommandDefinition>> {
        lock(&self.shared.state).current.clone()
    }

    pub fn observer_count(&self) -> usize {
        lock(&self.shared.state).observers.len()
    }

    /// Replaces the slot in one swap and notifies every registered observer.
    pub(crate) fn publish(&self, command: CommandDefinition) -> Arc<CommandDefinition> {
        let command = Arc::new(command);
        let _delivery = lock(&self.shared.delivery);
        let observers = {
            let mut state = lock(&self.shared.state);
            state.current = Some(Arc::clone(&command));
            state
                .observers
                .iter()
                .map(|(_, observer)| Arc::clone(observer))
                .collect::<Vec<_>>()
        };

        let _mark = DeliveryMark::set(&self.shared);
        for observer in observers {
            observer(&command);
        }
        command
    }

    pub fn subscribe<F>(&self, observer: F) -> Subscription
    where
        F: Fn(&Arc<CommandDefinition>) + Send + Sync + 'static,
    {
        let observer: Observer = Arc::new(observer);
        let _delivery = self.delivery_for_subscribe();
        let (id, current) = {
            let mut state = lock(&self.shared.state);
            let id = state.next_observer_id;
            state.next_observer_id += 1;
            state.observers.push((id, Arc::clone(&observer)));
            (id, state.current.clone())
        };

        if let Some(current) = current {
            let _mark = DeliveryMark::set(&self.shared);
            observer(&current);
        }

        Subscription {
            store: Arc::downgrade(&self.shared),
            id,
        }
    }

    // An observer subscribing from inside a delivery already runs under the
    // delivery lock; the value it is handed is the one being delivered.
    fn delivery_for_subscribe(&self) -> Option<MutexGuard<'_, ()>> {
        match self.shared.delivery.try_lock() {
            Ok(guard) => Some(guard),
            Err(TryLockError::Poisoned(poisoned)) => Some(poisoned.into_inner()),
            Err(TryLockError::WouldBlock)
                if *lock(&self.shared.delivering_on) == Some(thread::current().id()) =>
            {
                debug!("store: observer registered during delivery");
                None
            }
            Err(TryLockError::WouldBlock) => Some(lock(&self.shared.delivery)),
        }
    }

    /// Channel-backed observer for async consumers such as a view task.
    pub fn subscribe_channel(
        &self,
    ) -> (Subscription, mpsc::UnboundedReceiver<Arc<CommandDefinition>>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let subscription = self.subscribe(move |command| {
            let _ = tx.send(Arc::clone(command));
        });
        (subscription, rx)
    }
}

impl Subscription {
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(store) = self.store.upgrade() {
            lock(&store.state)
                .observers
                .retain(|(id, _)| *id != self.id);
        }
    }
}

#[cfg(test)]
#[path = "tests/store_tests.rs"]
mod tests;
