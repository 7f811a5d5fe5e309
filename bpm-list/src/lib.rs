//! Linux kernel doubly-linked list implementation
//!
//! This module provides a Rust implementation of the Linux kernel's intrusive
//! doubly-linked list (`struct list_head`), maintaining binary compatibility
//! with C code. The priority list ABI in `bpm-linux-compat` embeds two of
//! these per node.

#![cfg_attr(not(test), no_std)]

#[doc(hidden)]
pub use memoffset;

/// Intrusive doubly-linked list head
///
/// This is the Rust equivalent of Linux's `struct list_head`.
/// It must have identical memory layout for C compatibility.
#[repr(C)]
#[derive(Debug)]
pub struct ListHead {
    pub next: *mut ListHead,
    pub prev: *mut ListHead,
}

// Safety: ListHead is a raw pointer container used in kernel context
// where single-threaded or manually synchronized access is guaranteed
unsafe impl Send for ListHead {}
unsafe impl Sync for ListHead {}

/// Recover a pointer to the structure embedding a `ListHead`
///
/// Equivalent of the kernel's `list_entry()` / `container_of()`. Must be
/// used inside an `unsafe` block; `$ptr` must point at the `$field` member
/// of a live `$type`.
#[macro_export]
macro_rules! list_entry {
    ($ptr:expr, $type:ty, $field:ident) => {
        ($ptr as *mut u8).sub($crate::memoffset::offset_of!($type, $field)) as *mut $type
    };
}

impl ListHead {
    /// Create an unlinked list head (both pointers null)
    ///
    /// Call [`ListHead::init`] once the head has its final address.
    pub const fn new() -> Self {
        Self {
            next: core::ptr::null_mut(),
            prev: core::ptr::null_mut(),
        }
    }

    /// Initialize the list head to point to itself
    ///
    /// # Safety
    /// The head must not move while it is linked.
    pub unsafe fn init(&mut self) {
        self.next = self as *mut ListHead;
        self.prev = self as *mut ListHead;
    }

    /// Check if list is empty
    pub fn is_empty(&self) -> bool {
        self.next == (self as *const ListHead as *mut ListHead)
    }

    /// Check if list has exactly one entry
    pub fn is_singular(&self) -> bool {
        !self.is_empty() && self.next == self.prev
    }

    /// Add a new entry after this head
    ///
    /// # Safety
    /// Caller must ensure `new` is a valid pointer and not already in a list
    pub unsafe fn add(&mut self, new: *mut ListHead) {
        let head_ptr = self as *mut ListHead;
        let next_ptr = self.next;
        Self::link_between(new, head_ptr, next_ptr);
    }

    /// Add a new entry before this head (at the tail)
    ///
    /// # Safety
    /// Caller must ensure `new` is a valid pointer and not already in a list
    pub unsafe fn add_tail(&mut self, new: *mut ListHead) {
        let head_ptr = self as *mut ListHead;
        let prev_ptr = self.prev;
        Self::link_between(new, prev_ptr, head_ptr);
    }

    /// Delete entry from list and reinitialize it
    ///
    /// # Safety
    /// Caller must ensure this entry is in a list
    pub unsafe fn del_init(&mut self) {
        Self::unlink_between(self.prev, self.next);
        self.init();
    }

    /// # Safety
    /// All pointers must be valid
    unsafe fn link_between(new: *mut ListHead, prev: *mut ListHead, next: *mut ListHead) {
        (*next).prev = new;
        (*new).next = next;
        (*new).prev = prev;
        (*prev).next = new;
    }

    /// # Safety
    /// All pointers must be valid
    unsafe fn unlink_between(prev: *mut ListHead, next: *mut ListHead) {
        (*next).prev = prev;
        (*prev).next = next;
    }
}

impl Default for ListHead {
    fn default() -> Self {
        Self::new()
    }
}
