//! Test framework for the plist backport
//!
//! Userspace helpers and Gherkin scenarios for the no_std crates. Unlike
//! those crates this one uses std.

pub mod helpers;

pub use helpers::init_tracing;
