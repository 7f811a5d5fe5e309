//! Priority list errors
//!
//! Everything here is a caller-contract violation the arena can detect.
//! Reporting them keeps a misused list intact instead of corrupting it.

use crate::NodeKey;

/// Errors returned by [`Plist`](crate::Plist) and
/// [`PlistStorage`](crate::PlistStorage) operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PlistError {
    /// The key does not name an occupied storage slot
    #[error("node {0} is not present in storage")]
    Vacant(NodeKey),

    /// The node is already linked into a list
    #[error("node {0} is already linked into a list")]
    Linked(NodeKey),

    /// The node is linked into a different list
    #[error("node {0} belongs to another list")]
    NotMember(NodeKey),

    /// The operation needs a linked node but it is not in any list
    #[error("node {0} is not linked")]
    Unlinked(NodeKey),

    /// A queue ticket whose item was already popped or cancelled
    #[error("node {0} no longer holds the ticketed item")]
    Stale(NodeKey),

    /// The list has no nodes
    #[error("list is empty")]
    Empty,

    /// Integrity check failed
    #[error("list corrupted at node {key}: {reason}")]
    Corrupt { key: NodeKey, reason: &'static str },
}

/// Returned when fixed-capacity storage has no free slot
///
/// Carries the rejected value back to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Full<T>(pub T);

impl<T> Full<T> {
    /// Returns the value that could not be inserted
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> core::fmt::Display for Full<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("plist storage is full")
    }
}

impl<T: core::fmt::Debug> core::error::Error for Full<T> {}
