//! Spinlock-protected priority queue
//!
//! [`Plist`] does no locking. `PlistQueue` bundles a list with its storage
//! behind a [`Spinlock`] for the common case of producers readying items and
//! a consumer loop servicing the lowest priority first.

use bpm_sync::Spinlock;

use crate::{Full, NodeKey, Plist, PlistError, PlistStorage};

/// Handle to a queued item
///
/// Storage slots are recycled, so the ticket also carries the serial number
/// the item was pushed with. A ticket for an item that was popped or
/// cancelled is rejected with [`PlistError::Stale`], even once its slot
/// holds a newer item.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Ticket {
    key: NodeKey,
    serial: u64,
}

impl Ticket {
    /// Storage key of the item
    pub fn key(&self) -> NodeKey {
        self.key
    }
}

struct Inner<T> {
    storage: PlistStorage<(u64, T)>,
    list: Plist,
    next_serial: u64,
}

impl<T> Inner<T> {
    fn resolve(&self, ticket: Ticket) -> Result<NodeKey, PlistError> {
        match self.storage.get(ticket.key) {
            Some((serial, _)) if *serial == ticket.serial => Ok(ticket.key),
            _ => Err(PlistError::Stale(ticket.key)),
        }
    }
}

/// A bounded, thread-safe priority queue with FIFO order inside a priority
pub struct PlistQueue<T> {
    inner: Spinlock<Inner<T>>,
}

impl<T> PlistQueue<T> {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Spinlock::new(Inner {
                storage: PlistStorage::with_capacity(capacity),
                list: Plist::new(),
                next_serial: 0,
            }),
        }
    }

    /// Queue `value` behind everything of lower or equal priority
    pub fn push(&self, prio: i32, value: T) -> Result<Ticket, Full<T>> {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;
        let serial = inner.next_serial;
        let key = inner
            .storage
            .try_insert(prio, (serial, value))
            .map_err(|Full((_, value))| Full(value))?;
        inner.next_serial += 1;
        inner.list.add_fresh(&mut inner.storage, key);
        Ok(Ticket { key, serial })
    }

    /// Remove and return the lowest-priority, earliest-queued item
    pub fn pop(&self) -> Option<(i32, T)> {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;
        let key = inner.list.pop_first(&mut inner.storage)?;
        let prio = inner.storage.prio(key)?;
        inner.storage.remove(key).ok().map(|(_, value)| (prio, value))
    }

    /// Priority of the item [`pop`](Self::pop) would return
    pub fn peek_prio(&self) -> Option<i32> {
        let guard = self.inner.lock();
        guard.list.first().and_then(|key| guard.storage.prio(key))
    }

    /// Inspect the next item without removing it
    pub fn peek_with<R>(&self, f: impl FnOnce(i32, &T) -> R) -> Option<R> {
        let guard = self.inner.lock();
        let key = guard.list.first()?;
        let prio = guard.storage.prio(key)?;
        guard.storage.get(key).map(|(_, value)| f(prio, value))
    }

    /// Drop a queued item and hand it back
    pub fn cancel(&self, ticket: Ticket) -> Result<T, PlistError> {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;
        let key = inner.resolve(ticket)?;
        inner.list.del(&mut inner.storage, key)?;
        inner.storage.remove(key).map(|(_, value)| value)
    }

    /// Send an item to the back of its priority
    pub fn requeue(&self, ticket: Ticket) -> Result<(), PlistError> {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;
        let key = inner.resolve(ticket)?;
        inner.list.requeue(&mut inner.storage, key)
    }

    /// Move an item to a new priority, behind items already there
    pub fn reprioritize(&self, ticket: Ticket, prio: i32) -> Result<(), PlistError> {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;
        let key = inner.resolve(ticket)?;
        inner.list.set_prio(&mut inner.storage, key, prio)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().list.is_empty()
    }

    /// Run the integrity check under the lock
    pub fn check(&self) -> Result<(), PlistError> {
        let guard = self.inner.lock();
        guard.list.check(&guard.storage)
    }
}
