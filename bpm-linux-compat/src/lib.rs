//! Linux Kernel ABI Compatibility Adapter
//!
//! The boundary between the Rust list implementations and C code written
//! against `include/linux/list.h` and `include/linux/plist.h`.
//!
//! ```text
//! Linux C Code
//!      ↓
//! Linux Compat Layer (this crate)
//!      ↓
//! bpm-list
//! ```
//!
//! Structs are `#[repr(C)]` with the kernel's field order, functions are
//! `#[no_mangle] extern "C"`. Null pointers are ignored instead of faulting.
//!
//! ```c
//! struct plist_head waiters;
//! plist_head_init(&waiters);
//! plist_node_init(&w->node, prio);
//! plist_add(&w->node, &waiters);
//! ```
//!
//! # Features
//!
//! - `debug-plist`: run `plist_check_head` around every plist mutation and
//!   panic on corruption.

#![cfg_attr(not(test), no_std)]
#![allow(non_camel_case_types)]
#![allow(non_snake_case)]

pub mod error;
pub mod list;
pub mod plist;

pub use error::{errno_to_result, result_to_errno};
pub use list::list_head;
pub use plist::{plist_head, plist_node};
