//! Priority-sorted list
//!
//! Nodes are kept in two orderings at once:
//!
//! ```text
//! prio chain   [1]-------->[3]------------>[8]---+
//!               ^                                |
//!               +--------------------------------+
//!               |           |               |
//! node list    [1]-->[1]-->[3]-->[3]-->[3]-->[8]
//! ```
//!
//! The node list holds every node, sorted by priority and FIFO inside a
//! priority. The prio chain is circular and links only the first node of
//! each priority run, so an insertion walks distinct priorities instead of
//! every node. Both orderings live in [`PlistStorage`] as key links.

use core::sync::atomic::{AtomicU32, Ordering};

use crate::{NodeKey, PlistError, PlistStorage};

static NEXT_LIST_ID: AtomicU32 = AtomicU32::new(1);

/// Take the next list id from `counter`, never 0
///
/// Unlinked nodes carry owner 0, so a list with id 0 would claim them all.
fn next_list_id(counter: &AtomicU32) -> u32 {
    let bump = |id: u32| Some(id.checked_add(1).unwrap_or(1));
    match counter.fetch_update(Ordering::Relaxed, Ordering::Relaxed, bump) {
        Ok(0) | Err(0) => next_list_id(counter),
        Ok(id) | Err(id) => id,
    }
}

/// Head of a priority list
///
/// Holds only the ends and length of the node list. The prio chain is
/// reached through the first node. Every operation takes the storage the
/// list's nodes live in; a list must always be used with the same storage.
#[derive(Debug)]
pub struct Plist {
    id: u32,
    head: NodeKey,
    tail: NodeKey,
    len: usize,
}

impl Default for Plist {
    fn default() -> Self {
        Self::new()
    }
}

impl Plist {
    /// Create an empty list
    pub fn new() -> Self {
        Self {
            id: next_list_id(&NEXT_LIST_ID),
            head: NodeKey::NONE,
            tail: NodeKey::NONE,
            len: 0,
        }
    }

    /// Identifier stamped into the nodes this list owns
    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    /// Node with the lowest priority, earliest arrival first
    pub fn first(&self) -> Option<NodeKey> {
        self.head.get()
    }

    /// Node with the highest priority, latest arrival last
    pub fn last(&self) -> Option<NodeKey> {
        self.tail.get()
    }

    /// Whether `key` is linked into this list
    pub fn contains<T>(&self, storage: &PlistStorage<T>, key: NodeKey) -> bool {
        storage
            .try_node(key)
            .map(|node| node.owner == self.id)
            .unwrap_or(false)
    }

    /// Successor of a member in node-list order
    pub fn next<T>(&self, storage: &PlistStorage<T>, key: NodeKey) -> Option<NodeKey> {
        let node = storage.try_node(key).ok()?;
        if node.owner != self.id {
            return None;
        }
        node.node_next.get()
    }

    /// Predecessor of a member in node-list order
    pub fn prev<T>(&self, storage: &PlistStorage<T>, key: NodeKey) -> Option<NodeKey> {
        let node = storage.try_node(key).ok()?;
        if node.owner != self.id {
            return None;
        }
        node.node_prev.get()
    }

    /// Iterate members in node-list order
    pub fn iter<'a, T>(&self, storage: &'a PlistStorage<T>) -> Iter<'a, T> {
        Iter {
            storage,
            next: self.head,
            remaining: self.len,
        }
    }

    /// Link an unlinked node, keeping both orderings sorted
    ///
    /// The node lands after every node of lower or equal priority and
    /// before every node of higher priority.
    pub fn add<T>(&mut self, storage: &mut PlistStorage<T>, key: NodeKey) -> Result<(), PlistError> {
        if storage.try_node(key)?.is_linked() {
            tracing::warn!(list = self.id, key = %key, "plist add of linked node");
            return Err(PlistError::Linked(key));
        }

        self.debug_check(storage);
        self.link_sorted(storage, key);
        self.debug_check(storage);
        Ok(())
    }

    /// Add a node just taken from storage; it cannot be linked yet
    pub(crate) fn add_fresh<T>(&mut self, storage: &mut PlistStorage<T>, key: NodeKey) {
        debug_assert!(!storage.node(key).is_linked());
        self.debug_check(storage);
        self.link_sorted(storage, key);
        self.debug_check(storage);
    }

    /// Unlink a node from this list
    ///
    /// Deleting an unlinked node is a no-op.
    pub fn del<T>(&mut self, storage: &mut PlistStorage<T>, key: NodeKey) -> Result<(), PlistError> {
        let node = storage.try_node(key)?;
        if !node.is_linked() {
            return Ok(());
        }
        if node.owner != self.id {
            tracing::warn!(list = self.id, key = %key, owner = node.owner, "plist del from wrong list");
            return Err(PlistError::NotMember(key));
        }

        self.debug_check(storage);
        self.unlink(storage, key);
        self.debug_check(storage);
        Ok(())
    }

    /// Unlink and return the first node
    pub fn pop_first<T>(&mut self, storage: &mut PlistStorage<T>) -> Option<NodeKey> {
        let key = self.head.get()?;
        self.debug_check(storage);
        self.unlink(storage, key);
        self.debug_check(storage);
        Some(key)
    }

    /// Move a member behind the other nodes of its priority
    ///
    /// Does nothing when the node already ends its priority run.
    pub fn requeue<T>(&mut self, storage: &mut PlistStorage<T>, key: NodeKey) -> Result<(), PlistError> {
        if self.is_empty() {
            return Err(PlistError::Empty);
        }
        self.check_member(storage, key)?;

        if key == self.tail {
            return Ok(());
        }

        let node = storage.node(key);
        let prio = node.prio;
        let mut iter = node.node_next;
        if storage.node(iter).prio != prio {
            return Ok(());
        }

        self.debug_check(storage);
        self.unlink(storage, key);

        let mut node_next = NodeKey::NONE;
        while iter.is_some() {
            let node = storage.node(iter);
            if node.prio != prio {
                node_next = iter;
                break;
            }
            iter = node.node_next;
        }
        self.link_before(storage, key, node_next);

        tracing::trace!(list = self.id, key = %key, prio, "plist requeue");
        self.debug_check(storage);
        Ok(())
    }

    /// Change the priority of a member and re-sort it
    ///
    /// The node is re-added, so it lands at the end of its new priority run
    /// even when the priority is unchanged.
    pub fn set_prio<T>(
        &mut self,
        storage: &mut PlistStorage<T>,
        key: NodeKey,
        prio: i32,
    ) -> Result<(), PlistError> {
        self.check_member(storage, key)?;

        self.debug_check(storage);
        self.unlink(storage, key);
        storage.node_mut(key).prio = prio;
        self.link_sorted(storage, key);
        self.debug_check(storage);
        Ok(())
    }

    /// Verify both orderings and the bookkeeping of every member
    ///
    /// Returns the first violation found. Runs in O(n).
    pub fn check<T>(&self, storage: &PlistStorage<T>) -> Result<(), PlistError> {
        if self.head.is_none() || self.tail.is_none() {
            if self.head != self.tail || self.len != 0 {
                return Err(PlistError::Corrupt {
                    key: self.head,
                    reason: "empty list with dangling ends",
                });
            }
            return Ok(());
        }

        let corrupt = |key, reason| Err(PlistError::Corrupt { key, reason });

        // Node list: back links, ownership, ascending runs, representatives.
        let mut prev = NodeKey::NONE;
        let mut prev_prio = i32::MIN;
        let mut pos = self.head;
        let mut count = 0usize;
        let mut runs = 0usize;
        while pos.is_some() {
            if count == self.len {
                return corrupt(pos, "node list longer than recorded length");
            }
            let node = match storage.try_node(pos) {
                Ok(node) => node,
                Err(_) => return corrupt(pos, "node list links a vacant slot"),
            };
            if node.owner != self.id {
                return corrupt(pos, "node owned by another list");
            }
            if node.node_prev != prev {
                return corrupt(pos, "broken node list back link");
            }
            let starts_run = prev.is_none() || node.prio != prev_prio;
            if prev.is_some() && node.prio < prev_prio {
                return corrupt(pos, "node list out of priority order");
            }
            if starts_run != node.is_representative() {
                return corrupt(pos, "prio chain membership disagrees with runs");
            }
            if starts_run {
                runs += 1;
            }
            if node.prio_next.is_some() != node.prio_prev.is_some() {
                return corrupt(pos, "half-linked prio chain entry");
            }

            prev = pos;
            prev_prio = node.prio;
            pos = node.node_next;
            count += 1;
        }
        if count != self.len {
            return corrupt(self.head, "node list shorter than recorded length");
        }
        if prev != self.tail {
            return corrupt(self.tail, "tail is not the last node");
        }

        // Prio chain: circular, strictly ascending, one entry per run.
        let mut pos = self.head;
        let mut links = 0usize;
        loop {
            let node = storage.node(pos);
            let next = node.prio_next;
            if next.is_none() {
                return corrupt(pos, "prio chain broken");
            }
            let next_node = match storage.try_node(next) {
                Ok(node) => node,
                Err(_) => return corrupt(pos, "prio chain links a vacant slot"),
            };
            if next_node.prio_prev != pos {
                return corrupt(next, "broken prio chain back link");
            }
            links += 1;
            if next == self.head {
                break;
            }
            if next_node.prio <= node.prio {
                return corrupt(next, "prio chain out of order");
            }
            if links > runs {
                return corrupt(next, "prio chain longer than run count");
            }
            pos = next;
        }
        if links != runs {
            return corrupt(self.head, "prio chain misses a run");
        }

        Ok(())
    }

    fn check_member<T>(&self, storage: &PlistStorage<T>, key: NodeKey) -> Result<(), PlistError> {
        let node = storage.try_node(key)?;
        if !node.is_linked() {
            return Err(PlistError::Unlinked(key));
        }
        if node.owner != self.id {
            return Err(PlistError::NotMember(key));
        }
        Ok(())
    }

    /// Walk the prio chain from both ends and splice `key` in
    fn link_sorted<T>(&mut self, storage: &mut PlistStorage<T>, key: NodeKey) {
        let prio = storage.node(key).prio;

        if self.head.is_none() {
            let node = storage.node_mut(key);
            node.prio_prev = key;
            node.prio_next = key;
            self.link_before(storage, key, NodeKey::NONE);
            tracing::trace!(list = self.id, key = %key, prio, "plist add to empty list");
            return;
        }

        let first = self.head;
        let last = storage.node(first).prio_prev;
        let mut iter = first;
        let mut reverse = last;
        let mut prev = NodeKey::NONE;
        // NONE means append at the tail.
        let mut node_next = NodeKey::NONE;

        loop {
            if prio < storage.node(iter).prio {
                node_next = iter;
                break;
            }
            if prio >= storage.node(reverse).prio {
                prev = reverse;
                iter = storage.node(reverse).prio_next;
                if reverse != last {
                    node_next = iter;
                }
                break;
            }
            prev = iter;
            iter = storage.node(iter).prio_next;
            reverse = storage.node(reverse).prio_prev;
            if iter == first {
                break;
            }
        }

        if prev.is_none() || storage.node(prev).prio != prio {
            self.prio_link_before(storage, key, iter);
        }
        self.link_before(storage, key, node_next);

        tracing::trace!(list = self.id, key = %key, prio, "plist add");
    }

    /// Remove a member from both orderings and clear its links
    fn unlink<T>(&mut self, storage: &mut PlistStorage<T>, key: NodeKey) {
        let node = storage.node(key);
        let (node_prev, node_next) = (node.node_prev, node.node_next);

        if node.is_representative() {
            // Hand the run over to the next node of the same priority.
            if node_next.is_some() && !storage.node(node_next).is_representative() {
                self.prio_link_after(storage, node_next, key);
            }
            let node = storage.node(key);
            let (prio_prev, prio_next) = (node.prio_prev, node.prio_next);
            storage.node_mut(prio_prev).prio_next = prio_next;
            storage.node_mut(prio_next).prio_prev = prio_prev;
        }

        if node_prev.is_some() {
            storage.node_mut(node_prev).node_next = node_next;
        } else {
            self.head = node_next;
        }
        if node_next.is_some() {
            storage.node_mut(node_next).node_prev = node_prev;
        } else {
            self.tail = node_prev;
        }

        let node = storage.node_mut(key);
        let prio = node.prio;
        node.reset_links();
        self.len -= 1;

        tracing::trace!(list = self.id, key = %key, prio, "plist del");
    }

    /// Splice `key` into the node list before `next`, or at the tail
    fn link_before<T>(&mut self, storage: &mut PlistStorage<T>, key: NodeKey, next: NodeKey) {
        let prev = if next.is_some() {
            storage.node(next).node_prev
        } else {
            self.tail
        };

        let node = storage.node_mut(key);
        node.owner = self.id;
        node.node_prev = prev;
        node.node_next = next;

        if prev.is_some() {
            storage.node_mut(prev).node_next = key;
        } else {
            self.head = key;
        }
        if next.is_some() {
            storage.node_mut(next).node_prev = key;
        } else {
            self.tail = key;
        }
        self.len += 1;
    }

    fn prio_link_before<T>(&self, storage: &mut PlistStorage<T>, key: NodeKey, at: NodeKey) {
        let prev = storage.node(at).prio_prev;
        let node = storage.node_mut(key);
        node.prio_prev = prev;
        node.prio_next = at;
        storage.node_mut(prev).prio_next = key;
        storage.node_mut(at).prio_prev = key;
    }

    fn prio_link_after<T>(&self, storage: &mut PlistStorage<T>, key: NodeKey, at: NodeKey) {
        let next = storage.node(at).prio_next;
        let node = storage.node_mut(key);
        node.prio_prev = at;
        node.prio_next = next;
        storage.node_mut(next).prio_prev = key;
        storage.node_mut(at).prio_next = key;
    }

    #[cfg(feature = "debug-plist")]
    fn debug_check<T>(&self, storage: &PlistStorage<T>) {
        if let Err(err) = self.check(storage) {
            tracing::error!(list = self.id, len = self.len, error = %err, "plist integrity check failed");
            panic!("plist {} corrupted: {}", self.id, err);
        }
    }

    #[cfg(not(feature = "debug-plist"))]
    #[inline(always)]
    fn debug_check<T>(&self, _storage: &PlistStorage<T>) {}
}

/// Iterator over `(key, prio, value)` in node-list order
pub struct Iter<'a, T> {
    storage: &'a PlistStorage<T>,
    next: NodeKey,
    remaining: usize,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = (NodeKey, i32, &'a T);

    fn next(&mut self) -> Option<Self::Item> {
        let key = self.next.get()?;
        let node = self.storage.node(key);
        self.next = node.node_next;
        self.remaining = self.remaining.saturating_sub(1);
        Some((key, node.prio, &node.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}
