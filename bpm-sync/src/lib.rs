//! Kernel synchronization primitives
//!
//! The priority list does no locking of its own; callers serialize access
//! with the primitives in this crate.

#![cfg_attr(not(test), no_std)]

pub mod spinlock;

pub use spinlock::*;
