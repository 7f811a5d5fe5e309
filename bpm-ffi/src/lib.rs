//! FFI types shared by the backport crates
//!
//! Holds the C scalar types and the kernel errno values that cross the
//! boundary between the Rust implementations and C callers.

#![cfg_attr(not(test), no_std)]
#![allow(non_camel_case_types)]

pub use libc::{c_int, c_uint};

/// Error codes matching Linux kernel errno values
///
/// Values come from `include/uapi/asm-generic/errno-base.h`.
#[repr(i32)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum KernelError {
    EPERM = 1,
    ENOENT = 2,
    EIO = 5,
    EAGAIN = 11,
    ENOMEM = 12,
    EFAULT = 14,
    EBUSY = 16,
    EEXIST = 17,
    EINVAL = 22,
    ENOSPC = 28,
}

impl KernelError {
    /// Negative errno, as returned by kernel functions
    pub fn to_errno(self) -> c_int {
        -(self as c_int)
    }

    /// Look up an error from its positive errno value
    pub fn from_code(code: c_int) -> Option<Self> {
        let err = match code {
            1 => KernelError::EPERM,
            2 => KernelError::ENOENT,
            5 => KernelError::EIO,
            11 => KernelError::EAGAIN,
            12 => KernelError::ENOMEM,
            14 => KernelError::EFAULT,
            16 => KernelError::EBUSY,
            17 => KernelError::EEXIST,
            22 => KernelError::EINVAL,
            28 => KernelError::ENOSPC,
            _ => return None,
        };
        Some(err)
    }
}

/// Result type for kernel operations
pub type KernelResult<T> = Result<T, KernelError>;
