//! ABI compatibility testing for the list and plist backports
//!
//! Compile-time and run-time checks that the `#[repr(C)]` structures in
//! `bpm-linux-compat` are binary-compatible with the kernel's
//! `struct list_head`, `struct plist_head` and `struct plist_node`.

#![allow(non_camel_case_types)]
#![allow(non_upper_case_globals)]

use core::mem::{align_of, size_of};

use bpm_linux_compat::{list_head, plist_head, plist_node};

#[doc(hidden)]
pub use memoffset as __memoffset;

/// Macro to verify structure size matches expected value
#[macro_export]
macro_rules! verify_size {
    ($rust_type:ty, $expected_size:expr) => {
        const _: () = {
            const SIZE: usize = ::core::mem::size_of::<$rust_type>();
            const EXPECTED: usize = $expected_size;

            assert!(SIZE == EXPECTED, "Size mismatch");
        };
    };
}

/// Macro to verify field offset matches expected value
#[macro_export]
macro_rules! verify_offset {
    ($type:ty, $field:ident, $expected_offset:expr) => {
        const _: () = {
            const OFFSET: usize = $crate::__memoffset::offset_of!($type, $field);
            const EXPECTED: usize = $expected_offset;

            assert!(OFFSET == EXPECTED, "Offset mismatch");
        };
    };
}

/// Macro to verify type alignment
#[macro_export]
macro_rules! verify_align {
    ($type:ty, $expected_align:expr) => {
        const _: () = {
            const ALIGN: usize = ::core::mem::align_of::<$type>();
            const EXPECTED: usize = $expected_align;

            assert!(ALIGN == EXPECTED, "Alignment mismatch");
        };
    };
}

/// Kernel layouts for the current target
pub mod linux {
    const PTR: usize = core::mem::size_of::<usize>();

    pub const LIST_HEAD_SIZE: usize = 2 * PTR;
    pub const LIST_HEAD_ALIGN: usize = PTR;

    pub const PLIST_HEAD_SIZE: usize = LIST_HEAD_SIZE;

    /// `int prio` padded up to pointer alignment
    pub const PLIST_NODE_PRIO_LIST_OFFSET: usize = PTR;
    pub const PLIST_NODE_NODE_LIST_OFFSET: usize = PTR + LIST_HEAD_SIZE;
    pub const PLIST_NODE_SIZE: usize = PTR + 2 * LIST_HEAD_SIZE;
}

verify_size!(list_head, linux::LIST_HEAD_SIZE);
verify_align!(list_head, linux::LIST_HEAD_ALIGN);
verify_offset!(list_head, next, 0);

verify_size!(plist_head, linux::PLIST_HEAD_SIZE);
verify_offset!(plist_head, node_list, 0);

verify_size!(plist_node, linux::PLIST_NODE_SIZE);
verify_offset!(plist_node, prio, 0);
verify_offset!(plist_node, prio_list, linux::PLIST_NODE_PRIO_LIST_OFFSET);
verify_offset!(plist_node, node_list, linux::PLIST_NODE_NODE_LIST_OFFSET);

/// Structure to hold ABI compatibility test results
#[derive(Debug, PartialEq, Eq)]
pub struct AbiCompatResult {
    pub struct_name: &'static str,
    pub size_match: bool,
    pub align_match: bool,
    pub fields_match: bool,
}

impl AbiCompatResult {
    pub fn is_compatible(&self) -> bool {
        self.size_match && self.align_match && self.fields_match
    }
}

/// Compare a Rust structure's size and alignment with expected values
pub fn verify_struct_layout<T>(
    name: &'static str,
    expected_size: usize,
    expected_align: usize,
) -> AbiCompatResult {
    AbiCompatResult {
        struct_name: name,
        size_match: size_of::<T>() == expected_size,
        align_match: align_of::<T>() == expected_align,
        fields_match: true,
    }
}

/// Layout report for every exported structure
pub fn verify_all() -> [AbiCompatResult; 3] {
    let mut node = verify_struct_layout::<plist_node>(
        "plist_node",
        linux::PLIST_NODE_SIZE,
        linux::LIST_HEAD_ALIGN,
    );
    node.fields_match = memoffset::offset_of!(plist_node, prio_list)
        == linux::PLIST_NODE_PRIO_LIST_OFFSET
        && memoffset::offset_of!(plist_node, node_list) == linux::PLIST_NODE_NODE_LIST_OFFSET;

    [
        verify_struct_layout::<list_head>(
            "list_head",
            linux::LIST_HEAD_SIZE,
            linux::LIST_HEAD_ALIGN,
        ),
        verify_struct_layout::<plist_head>(
            "plist_head",
            linux::PLIST_HEAD_SIZE,
            linux::LIST_HEAD_ALIGN,
        ),
        node,
    ]
}
