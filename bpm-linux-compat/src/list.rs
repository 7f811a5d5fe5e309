//! Linux-compatible list API adapter
//!
//! Exports the `struct list_head` entry points C code expects, backed by
//! [`bpm_list::ListHead`].

pub use bpm_list::ListHead as list_head;

/// Initialize a list head to point to itself
///
/// Linux equivalent: `INIT_LIST_HEAD(ptr)`
///
/// # Safety
///
/// `list` must be null or point to a list_head that will not move while linked.
#[no_mangle]
pub unsafe extern "C" fn INIT_LIST_HEAD(list: *mut list_head) {
    if list.is_null() {
        return;
    }

    (*list).init();
}

/// Insert `new` right after `head` (stack order)
///
/// Linux equivalent: `list_add(new, head)`
///
/// # Safety
///
/// - Both `new` and `head` must be valid, non-null pointers
/// - `new` must not already be in a list
#[no_mangle]
pub unsafe extern "C" fn list_add(new: *mut list_head, head: *mut list_head) {
    if new.is_null() || head.is_null() {
        return;
    }

    (*head).add(new);
}

/// Insert `new` right before `head` (queue order)
///
/// Linux equivalent: `list_add_tail(new, head)`
///
/// # Safety
///
/// - Both `new` and `head` must be valid, non-null pointers
/// - `new` must not already be in a list
#[no_mangle]
pub unsafe extern "C" fn list_add_tail(new: *mut list_head, head: *mut list_head) {
    if new.is_null() || head.is_null() {
        return;
    }

    (*head).add_tail(new);
}

/// Delete an entry and reinitialize it
///
/// Linux equivalent: `list_del_init(entry)`
///
/// # Safety
///
/// `entry` must be valid and currently in a list
#[no_mangle]
pub unsafe extern "C" fn list_del_init(entry: *mut list_head) {
    if entry.is_null() {
        return;
    }

    (*entry).del_init();
}

/// Test whether a list is empty
///
/// Linux equivalent: `list_empty(head)`
///
/// # Safety
///
/// `head` must be null or point to an initialized list
#[no_mangle]
pub unsafe extern "C" fn list_empty(head: *const list_head) -> bool {
    if head.is_null() {
        return true;
    }

    (*head).is_empty()
}

/// Test whether a list has exactly one entry
///
/// Linux equivalent: `list_is_singular(head)`
///
/// # Safety
///
/// `head` must be null or point to an initialized list
#[no_mangle]
pub unsafe extern "C" fn list_is_singular(head: *const list_head) -> bool {
    if head.is_null() {
        return false;
    }

    (*head).is_singular()
}
