//! Build script for ABI compatibility testing
//!
//! Compiles reference C definitions of `list_head`, `plist_head` and
//! `plist_node`, plus a C walker over a plist, so the tests can compare
//! layouts and read lists built from Rust.

use std::env;
use std::path::{Path, PathBuf};

fn main() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").expect("OUT_DIR not set"));

    generate_reference_c_code(&out_dir);

    println!("cargo:rerun-if-changed=build.rs");
}

fn generate_reference_c_code(out_dir: &Path) {
    let c_code = r#"
#include <stddef.h>

/* include/linux/types.h */
struct list_head {
    struct list_head *next, *prev;
};

/* include/linux/plist.h */
struct plist_head {
    struct list_head node_list;
};

struct plist_node {
    int prio;
    struct list_head prio_list;
    struct list_head node_list;
};

#define container_of(ptr, type, member) \
    ((type *)((char *)(ptr) - offsetof(type, member)))

size_t list_head_size(void) { return sizeof(struct list_head); }
size_t list_head_align(void) { return _Alignof(struct list_head); }
size_t list_head_next_offset(void) { return offsetof(struct list_head, next); }
size_t list_head_prev_offset(void) { return offsetof(struct list_head, prev); }

size_t plist_head_size(void) { return sizeof(struct plist_head); }
size_t plist_head_align(void) { return _Alignof(struct plist_head); }
size_t plist_head_node_list_offset(void) { return offsetof(struct plist_head, node_list); }

size_t plist_node_size(void) { return sizeof(struct plist_node); }
size_t plist_node_align(void) { return _Alignof(struct plist_node); }
size_t plist_node_prio_offset(void) { return offsetof(struct plist_node, prio); }
size_t plist_node_prio_list_offset(void) { return offsetof(struct plist_node, prio_list); }
size_t plist_node_node_list_offset(void) { return offsetof(struct plist_node, node_list); }

/* plist_for_each(pos, head): copy priorities in list order */
int c_plist_prios(const struct plist_head *head, int *out, int max)
{
    const struct list_head *pos;
    int n = 0;

    for (pos = head->node_list.next; pos != &head->node_list; pos = pos->next) {
        if (n == max)
            return -1;
        out[n++] = container_of(pos, struct plist_node, node_list)->prio;
    }
    return n;
}

/* Walk prio_list from the first node */
int c_plist_distinct_prios(const struct plist_head *head, int *out, int max)
{
    const struct plist_node *first;
    const struct list_head *pos;
    int n = 0;

    if (head->node_list.next == &head->node_list)
        return 0;

    first = container_of(head->node_list.next, struct plist_node, node_list);
    out[n++] = first->prio;
    for (pos = first->prio_list.next; pos != &first->prio_list; pos = pos->next) {
        if (n == max)
            return -1;
        out[n++] = container_of(pos, struct plist_node, prio_list)->prio;
    }
    return n;
}

/* Error codes from include/uapi/asm-generic/errno-base.h */
int VERIFY_EPERM = 1;
int VERIFY_ENOENT = 2;
int VERIFY_ENOMEM = 12;
int VERIFY_EFAULT = 14;
int VERIFY_EEXIST = 17;
int VERIFY_EINVAL = 22;
int VERIFY_ENOSPC = 28;
"#;

    let c_file = out_dir.join("linux_reference.c");
    std::fs::write(&c_file, c_code).expect("Failed to write C reference code");

    cc::Build::new()
        .file(&c_file)
        .warnings(false)
        .static_flag(true)
        .compile("linux_reference");
}
