//! Node arena for priority lists
//!
//! [`PlistStorage`] owns node memory and hands out stable [`NodeKey`]s.
//! Lists only link and unlink keys; they never allocate or free. One storage
//! can back several lists, but a node sits in at most one of them at a time.

use alloc::vec::Vec;
use core::fmt;

use crate::{Full, PlistError};

/// Stable handle to a node in a [`PlistStorage`]
///
/// Stays valid until the node is removed from storage. Callers keep it in
/// their own records the way kernel code embeds a `plist_node`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeKey(u32);

impl NodeKey {
    /// Sentinel for an empty link
    pub(crate) const NONE: NodeKey = NodeKey(u32::MAX);

    /// Rebuild a key from [`NodeKey::as_raw`]
    pub const fn from_raw(raw: u32) -> Self {
        NodeKey(raw)
    }

    pub const fn as_raw(self) -> u32 {
        self.0
    }

    #[inline]
    pub(crate) fn is_none(self) -> bool {
        self == Self::NONE
    }

    #[inline]
    pub(crate) fn is_some(self) -> bool {
        self != Self::NONE
    }

    #[inline]
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub(crate) fn get(self) -> Option<NodeKey> {
        if self.is_none() {
            None
        } else {
            Some(self)
        }
    }
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_none() {
            f.write_str("#none")
        } else {
            write!(f, "#{}", self.0)
        }
    }
}

/// A value with its priority and the links of both list orderings
///
/// `node_prev`/`node_next` thread the arrival sequence. `prio_prev`/
/// `prio_next` are only set on the first node of each priority run and form
/// a circular chain through those representatives.
#[derive(Debug)]
pub(crate) struct PlistNode<T> {
    pub(crate) value: T,
    pub(crate) prio: i32,
    /// Id of the owning list, 0 when unlinked
    pub(crate) owner: u32,
    pub(crate) node_prev: NodeKey,
    pub(crate) node_next: NodeKey,
    pub(crate) prio_prev: NodeKey,
    pub(crate) prio_next: NodeKey,
}

impl<T> PlistNode<T> {
    fn new(prio: i32, value: T) -> Self {
        Self {
            value,
            prio,
            owner: 0,
            node_prev: NodeKey::NONE,
            node_next: NodeKey::NONE,
            prio_prev: NodeKey::NONE,
            prio_next: NodeKey::NONE,
        }
    }

    #[inline]
    pub(crate) fn is_linked(&self) -> bool {
        self.owner != 0
    }

    #[inline]
    pub(crate) fn is_representative(&self) -> bool {
        self.prio_next.is_some()
    }

    pub(crate) fn reset_links(&mut self) {
        self.owner = 0;
        self.node_prev = NodeKey::NONE;
        self.node_next = NodeKey::NONE;
        self.prio_prev = NodeKey::NONE;
        self.prio_next = NodeKey::NONE;
    }
}

#[derive(Debug)]
enum Slot<T> {
    Vacant { next_free: NodeKey },
    Occupied(PlistNode<T>),
}

/// Fixed-capacity node arena
///
/// Slots are created lazily up to `capacity` and recycled through a free
/// list, so keys of live nodes never move.
#[derive(Debug)]
pub struct PlistStorage<T> {
    slots: Vec<Slot<T>>,
    free_head: NodeKey,
    capacity: usize,
    len: usize,
}

impl<T> PlistStorage<T> {
    /// Create storage for at most `capacity` nodes
    ///
    /// `capacity` is clamped below `u32::MAX`, which is reserved for the
    /// empty-link sentinel.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.min(NodeKey::NONE.index());
        Self {
            slots: Vec::with_capacity(capacity),
            free_head: NodeKey::NONE,
            capacity,
            len: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of occupied slots, linked or not
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Store a new, unlinked node
    pub fn try_insert(&mut self, prio: i32, value: T) -> Result<NodeKey, Full<T>> {
        let node = PlistNode::new(prio, value);

        let key = if self.free_head.is_some() {
            let key = self.free_head;
            if let Slot::Vacant { next_free } = &self.slots[key.index()] {
                self.free_head = *next_free;
            }
            self.slots[key.index()] = Slot::Occupied(node);
            key
        } else if self.slots.len() < self.capacity {
            let key = NodeKey(self.slots.len() as u32);
            self.slots.push(Slot::Occupied(node));
            key
        } else {
            return Err(Full(node.value));
        };

        self.len += 1;
        Ok(key)
    }

    /// Remove an unlinked node and return its value
    ///
    /// A node still linked into a list must be deleted from it first.
    pub fn remove(&mut self, key: NodeKey) -> Result<T, PlistError> {
        if self.try_node(key)?.is_linked() {
            return Err(PlistError::Linked(key));
        }

        let slot = core::mem::replace(
            &mut self.slots[key.index()],
            Slot::Vacant {
                next_free: self.free_head,
            },
        );
        self.free_head = key;
        self.len -= 1;

        match slot {
            Slot::Occupied(node) => Ok(node.value),
            Slot::Vacant { .. } => Err(PlistError::Vacant(key)),
        }
    }

    pub fn contains(&self, key: NodeKey) -> bool {
        self.try_node(key).is_ok()
    }

    pub fn get(&self, key: NodeKey) -> Option<&T> {
        self.try_node(key).ok().map(|node| &node.value)
    }

    pub fn get_mut(&mut self, key: NodeKey) -> Option<&mut T> {
        self.try_node_mut(key).ok().map(|node| &mut node.value)
    }

    /// Priority of a stored node
    pub fn prio(&self, key: NodeKey) -> Option<i32> {
        self.try_node(key).ok().map(|node| node.prio)
    }

    /// Whether the node is currently linked into some list
    pub fn is_linked(&self, key: NodeKey) -> bool {
        self.try_node(key).map(PlistNode::is_linked).unwrap_or(false)
    }

    /// Change the priority of an unlinked node
    ///
    /// Linked nodes are reprioritized through
    /// [`Plist::set_prio`](crate::Plist::set_prio) so their list stays sorted.
    pub fn set_prio(&mut self, key: NodeKey, prio: i32) -> Result<(), PlistError> {
        let node = self.try_node_mut(key)?;
        if node.is_linked() {
            return Err(PlistError::Linked(key));
        }
        node.prio = prio;
        Ok(())
    }

    pub(crate) fn try_node(&self, key: NodeKey) -> Result<&PlistNode<T>, PlistError> {
        match self.slots.get(key.index()) {
            Some(Slot::Occupied(node)) => Ok(node),
            _ => Err(PlistError::Vacant(key)),
        }
    }

    pub(crate) fn try_node_mut(&mut self, key: NodeKey) -> Result<&mut PlistNode<T>, PlistError> {
        match self.slots.get_mut(key.index()) {
            Some(Slot::Occupied(node)) => Ok(node),
            _ => Err(PlistError::Vacant(key)),
        }
    }

    /// Access a node reached through a link
    ///
    /// Links only ever name occupied slots, so a miss is a broken invariant.
    #[inline]
    pub(crate) fn node(&self, key: NodeKey) -> &PlistNode<T> {
        match &self.slots[key.index()] {
            Slot::Occupied(node) => node,
            Slot::Vacant { .. } => unreachable!("link to vacant plist slot {}", key),
        }
    }

    #[inline]
    pub(crate) fn node_mut(&mut self, key: NodeKey) -> &mut PlistNode<T> {
        match &mut self.slots[key.index()] {
            Slot::Occupied(node) => node,
            Slot::Vacant { .. } => unreachable!("link to vacant plist slot {}", key),
        }
    }
}
