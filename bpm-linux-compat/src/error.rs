//! Error code translation between the plist crates and Linux
//!
//! Converts `Result<T, KernelError>` to and from Linux's integer errno
//! values.

use bpm_ffi::{c_int, KernelError, KernelResult};

/// Convert a Result to Linux errno format
///
/// - Ok(value) => 0
/// - Err(error) => negative errno
pub fn result_to_errno<T>(result: KernelResult<T>) -> c_int {
    match result {
        Ok(_) => 0,
        Err(e) => e.to_errno(),
    }
}

/// Convert errno to Result
///
/// - 0 => Ok(())
/// - negative => Err(KernelError)
/// - positive or unknown => Err(EINVAL)
pub fn errno_to_result(errno: c_int) -> KernelResult<()> {
    if errno == 0 {
        return Ok(());
    }
    if errno > 0 {
        return Err(KernelError::EINVAL);
    }
    Err(KernelError::from_code(-errno).unwrap_or(KernelError::EINVAL))
}
