//! Priority-sorted lists
//!
//! Rust implementation of the Linux kernel's `plist`: a list kept sorted
//! by ascending `i32` priority, FIFO among equal priorities, with O(1)
//! access to the lowest priority and insertion cost proportional to the
//! number of distinct priorities present.
//!
//! Nodes live in a [`PlistStorage`] arena and are addressed by stable
//! [`NodeKey`]s instead of embedded pointers. A [`Plist`] only links keys,
//! so one storage can serve several lists and the list itself never
//! allocates.
//!
//! ```
//! use bpm_plist::{Plist, PlistStorage};
//!
//! let mut storage = PlistStorage::with_capacity(8);
//! let mut list = Plist::new();
//!
//! for (prio, name) in [(5, "a"), (3, "b"), (5, "c")] {
//!     let key = storage.try_insert(prio, name).unwrap();
//!     list.add(&mut storage, key).unwrap();
//! }
//!
//! let order: Vec<_> = list.iter(&storage).map(|(_, _, name)| *name).collect();
//! assert_eq!(order, ["b", "a", "c"]);
//! ```
//!
//! # Features
//!
//! - `debug-plist`: validate the whole list before and after every
//!   mutation and panic on corruption (the kernel's `CONFIG_DEBUG_PLIST`).

#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod error;
pub mod plist;
pub mod queue;
pub mod storage;

pub use error::{Full, PlistError};
pub use plist::{Iter, Plist};
pub use queue::{PlistQueue, Ticket};
pub use storage::{NodeKey, PlistStorage};
