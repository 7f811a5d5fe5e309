//! FFI Layer Compatibility Tests
//!
//! Error codes and the errno translation used at the C boundary

use bpm_ffi::KernelError;
use bpm_linux_compat::error::{errno_to_result, result_to_errno};
use static_assertions::*;

#[test]
fn test_kernel_error_values() {
    assert_eq!(KernelError::EPERM as i32, libc::EPERM);
    assert_eq!(KernelError::ENOENT as i32, libc::ENOENT);
    assert_eq!(KernelError::EIO as i32, libc::EIO);
    assert_eq!(KernelError::EAGAIN as i32, libc::EAGAIN);
    assert_eq!(KernelError::ENOMEM as i32, libc::ENOMEM);
    assert_eq!(KernelError::EFAULT as i32, libc::EFAULT);
    assert_eq!(KernelError::EBUSY as i32, libc::EBUSY);
    assert_eq!(KernelError::EEXIST as i32, libc::EEXIST);
    assert_eq!(KernelError::EINVAL as i32, libc::EINVAL);
    assert_eq!(KernelError::ENOSPC as i32, libc::ENOSPC);
}

#[test]
fn test_errno_round_trip() {
    for code in 1..=40 {
        if let Some(err) = KernelError::from_code(code) {
            assert_eq!(errno_to_result(err.to_errno()), Err(err));
        }
    }
}

#[test]
fn test_result_to_errno() {
    assert_eq!(result_to_errno(Ok::<u8, KernelError>(7)), 0);
    assert_eq!(result_to_errno::<()>(Err(KernelError::EFAULT)), -libc::EFAULT);
}

assert_eq_size!(KernelError, i32);
