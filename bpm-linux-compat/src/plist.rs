//! Linux-compatible priority list API
//!
//! `struct plist_head` / `struct plist_node` with the layout of
//! `include/linux/plist.h` and the entry points of `lib/plist.c`, for C
//! callers that embed nodes in their own records.
//!
//! Each node sits on two `list_head` lists: `node_list` threads every node
//! in priority order, `prio_list` threads only the first node of each
//! priority. A node whose priority is shared with an earlier node keeps an
//! empty `prio_list`.
//!
//! `WARN_ON` conditions log and leave the list alone. `BUG_ON` conditions
//! panic, which aborts at the C boundary.

use core::ptr;

use bpm_ffi::{c_int, KernelError, KernelResult};
use bpm_list::list_entry;

use crate::error::result_to_errno;
use crate::list::list_head;

/// Linux-compatible `struct plist_head`
///
/// ```c
/// struct plist_head {
///     struct list_head node_list;
/// };
/// ```
#[repr(C)]
#[derive(Debug)]
pub struct plist_head {
    pub node_list: list_head,
}

/// Linux-compatible `struct plist_node`
///
/// ```c
/// struct plist_node {
///     int prio;
///     struct list_head prio_list;
///     struct list_head node_list;
/// };
/// ```
#[repr(C)]
#[derive(Debug)]
pub struct plist_node {
    pub prio: c_int,
    pub prio_list: list_head,
    pub node_list: list_head,
}

impl plist_head {
    pub const fn new() -> Self {
        Self {
            node_list: list_head::new(),
        }
    }
}

impl plist_node {
    pub const fn new(prio: c_int) -> Self {
        Self {
            prio,
            prio_list: list_head::new(),
            node_list: list_head::new(),
        }
    }
}

#[inline]
unsafe fn node_entry(pos: *mut list_head) -> *mut plist_node {
    list_entry!(pos, plist_node, node_list)
}

#[inline]
unsafe fn prio_entry(pos: *mut list_head) -> *mut plist_node {
    list_entry!(pos, plist_node, prio_list)
}

/// Initialize an empty priority list
///
/// Linux equivalent: `plist_head_init(head)`
///
/// # Safety
///
/// `head` must be null or valid, and must not move while nodes are linked.
#[no_mangle]
pub unsafe extern "C" fn plist_head_init(head: *mut plist_head) {
    if head.is_null() {
        return;
    }

    (*head).node_list.init();
}

/// Initialize a node with its priority
///
/// Linux equivalent: `plist_node_init(node, prio)`
///
/// # Safety
///
/// `node` must be null or valid, and must not move while linked.
#[no_mangle]
pub unsafe extern "C" fn plist_node_init(node: *mut plist_node, prio: c_int) {
    if node.is_null() {
        return;
    }

    (*node).prio = prio;
    (*node).prio_list.init();
    (*node).node_list.init();
}

/// Linux equivalent: `plist_head_empty(head)`
///
/// # Safety
///
/// `head` must be null or initialized
#[no_mangle]
pub unsafe extern "C" fn plist_head_empty(head: *const plist_head) -> bool {
    if head.is_null() {
        return true;
    }

    (*head).node_list.is_empty()
}

/// Whether a node is not on any list
///
/// Linux equivalent: `plist_node_empty(node)`
///
/// # Safety
///
/// `node` must be null or initialized
#[no_mangle]
pub unsafe extern "C" fn plist_node_empty(node: *const plist_node) -> bool {
    if node.is_null() {
        return true;
    }

    (*node).node_list.is_empty()
}

/// Node with the lowest priority, or null when the list is empty
///
/// Linux equivalent: `plist_first(head)`
///
/// # Safety
///
/// `head` must be null or initialized
#[no_mangle]
pub unsafe extern "C" fn plist_first(head: *const plist_head) -> *mut plist_node {
    if plist_head_empty(head) {
        return ptr::null_mut();
    }

    node_entry((*head).node_list.next)
}

/// Node with the highest priority, or null when the list is empty
///
/// Linux equivalent: `plist_last(head)`
///
/// # Safety
///
/// `head` must be null or initialized
#[no_mangle]
pub unsafe extern "C" fn plist_last(head: *const plist_head) -> *mut plist_node {
    if plist_head_empty(head) {
        return ptr::null_mut();
    }

    node_entry((*head).node_list.prev)
}

/// Node after `pos`, or null at the end of `head`
///
/// Counterpart of the kernel's `plist_next(pos)` macro, which leaves the
/// end-of-list test to the caller.
///
/// # Safety
///
/// `pos` must be linked into `head`
#[no_mangle]
pub unsafe extern "C" fn plist_next(pos: *const plist_node, head: *const plist_head) -> *mut plist_node {
    if pos.is_null() || head.is_null() {
        return ptr::null_mut();
    }

    let next = (*pos).node_list.next;
    if next as *const list_head == ptr::addr_of!((*head).node_list) {
        return ptr::null_mut();
    }
    node_entry(next)
}

/// Node before `pos`, or null at the start of `head`
///
/// # Safety
///
/// `pos` must be linked into `head`
#[no_mangle]
pub unsafe extern "C" fn plist_prev(pos: *const plist_node, head: *const plist_head) -> *mut plist_node {
    if pos.is_null() || head.is_null() {
        return ptr::null_mut();
    }

    let prev = (*pos).node_list.prev;
    if prev as *const list_head == ptr::addr_of!((*head).node_list) {
        return ptr::null_mut();
    }
    node_entry(prev)
}

/// Add a node, after every node of lower or equal priority
///
/// Linux equivalent: `plist_add(node, head)`
///
/// # Safety
///
/// Both pointers must be valid and initialized; `node` must not be linked.
#[no_mangle]
pub unsafe extern "C" fn plist_add(node: *mut plist_node, head: *mut plist_head) {
    if node.is_null() || head.is_null() {
        return;
    }

    debug_check_head(head);

    if !plist_node_empty(node) || !(*node).prio_list.is_empty() {
        tracing::warn!(node = ?node, head = ?head, "plist_add of a linked node");
        return;
    }

    let top = ptr::addr_of_mut!((*head).node_list);
    let mut node_next = top;

    if !(*top).is_empty() {
        let first = node_entry((*top).next);
        let last = prio_entry((*first).prio_list.prev);
        let mut iter = first;
        let mut reverse = last;
        let mut prev: *mut plist_node = ptr::null_mut();

        loop {
            if (*node).prio < (*iter).prio {
                node_next = ptr::addr_of_mut!((*iter).node_list);
                break;
            } else if (*node).prio >= (*reverse).prio {
                prev = reverse;
                iter = prio_entry((*reverse).prio_list.next);
                if reverse != last {
                    node_next = ptr::addr_of_mut!((*iter).node_list);
                }
                break;
            }

            prev = iter;
            iter = prio_entry((*iter).prio_list.next);
            reverse = prio_entry((*reverse).prio_list.prev);
            if iter == first {
                break;
            }
        }

        if prev.is_null() || (*prev).prio != (*node).prio {
            (*iter).prio_list.add_tail(ptr::addr_of_mut!((*node).prio_list));
        }
    }

    (*node_next).add_tail(ptr::addr_of_mut!((*node).node_list));

    tracing::trace!(node = ?node, prio = (*node).prio, "plist_add");
    debug_check_head(head);
}

/// Remove a node from the list
///
/// Linux equivalent: `plist_del(node, head)`. Removing an unlinked,
/// initialized node does nothing.
///
/// # Safety
///
/// Both pointers must be valid; a linked `node` must be on `head`.
#[no_mangle]
pub unsafe extern "C" fn plist_del(node: *mut plist_node, head: *mut plist_head) {
    if node.is_null() || head.is_null() {
        return;
    }

    debug_check_head(head);

    if plist_node_empty(node) {
        return;
    }

    let top = ptr::addr_of_mut!((*head).node_list);

    if !(*node).prio_list.is_empty() {
        if (*node).node_list.next != top {
            let next = node_entry((*node).node_list.next);

            // Promote the next node of the same priority into prio_list.
            if (*next).prio_list.is_empty() {
                (*node).prio_list.add(ptr::addr_of_mut!((*next).prio_list));
            }
        }
        (*node).prio_list.del_init();
    }

    (*node).node_list.del_init();

    tracing::trace!(node = ?node, prio = (*node).prio, "plist_del");
    debug_check_head(head);
}

/// Move a node behind the other nodes of its priority
///
/// Linux equivalent: `plist_requeue(node, head)`
///
/// # Safety
///
/// Both pointers must be valid and `node` must be linked on `head`.
///
/// # Panics
///
/// On an empty list or an unlinked node, like the kernel's `BUG_ON`.
#[no_mangle]
pub unsafe extern "C" fn plist_requeue(node: *mut plist_node, head: *mut plist_head) {
    requeue(node, head)
}

/// Body of [`plist_requeue`]; its `BUG_ON` panics unwind from here
unsafe fn requeue(node: *mut plist_node, head: *mut plist_head) {
    if node.is_null() || head.is_null() {
        return;
    }

    debug_check_head(head);
    assert!(!plist_head_empty(head), "plist_requeue on an empty list");
    assert!(!plist_node_empty(node), "plist_requeue of an unlinked node");

    if node == plist_last(head) {
        return;
    }

    let iter = node_entry((*node).node_list.next);
    if (*node).prio != (*iter).prio {
        return;
    }

    plist_del(node, head);

    let top = ptr::addr_of_mut!((*head).node_list);
    let mut node_next = top;
    let mut pos = (*iter).node_list.next;
    while pos != top {
        if (*node_entry(pos)).prio != (*node).prio {
            node_next = pos;
            break;
        }
        pos = (*pos).next;
    }
    (*node_next).add_tail(ptr::addr_of_mut!((*node).node_list));

    tracing::trace!(node = ?node, prio = (*node).prio, "plist_requeue");
    debug_check_head(head);
}

/// Validate a priority list
///
/// Returns 0 when both lists are consistent and ordered, `-EFAULT` on
/// corruption, `-EINVAL` for a null head.
///
/// # Safety
///
/// `head` must be null or initialized
#[no_mangle]
pub unsafe extern "C" fn plist_check_head(head: *const plist_head) -> c_int {
    result_to_errno(check_head(head))
}

unsafe fn check_head(head: *const plist_head) -> KernelResult<()> {
    if head.is_null() {
        return Err(KernelError::EINVAL);
    }

    let top = ptr::addr_of!((*head).node_list) as *mut list_head;
    check_list(top)?;
    if (*top).is_empty() {
        return Ok(());
    }

    let first = node_entry((*top).next);
    check_list(ptr::addr_of_mut!((*first).prio_list))?;

    // node_list ascending; a node starts a run iff it is on prio_list,
    // except a lone run whose prio_list is legitimately empty.
    let mut pos = (*top).next;
    let mut prev: *mut plist_node = ptr::null_mut();
    while pos != top {
        let node = node_entry(pos);
        if !prev.is_null() {
            if (*node).prio < (*prev).prio {
                return corrupt(head, node, "node_list out of priority order");
            }
            let starts_run = (*node).prio != (*prev).prio;
            if starts_run == (*node).prio_list.is_empty() {
                return corrupt(head, node, "prio_list disagrees with priority runs");
            }
            if starts_run && (*first).prio_list.is_empty() {
                return corrupt(head, first, "first node missing from prio_list");
            }
        }
        prev = node;
        pos = (*pos).next;
    }

    // prio_list strictly ascending from the first node.
    let start = ptr::addr_of_mut!((*first).prio_list);
    let mut pos = (*start).next;
    let mut prev = first;
    while pos != start {
        let node = prio_entry(pos);
        if (*node).prio <= (*prev).prio {
            return corrupt(head, node, "prio_list out of order");
        }
        prev = node;
        pos = (*pos).next;
    }

    Ok(())
}

/// Check next/prev agreement around a circular list
unsafe fn check_list(top: *mut list_head) -> KernelResult<()> {
    let mut prev = top;
    let mut next = (*top).next;
    loop {
        if next.is_null() || (*next).prev != prev || (*prev).next != next {
            tracing::warn!(top = ?top, prev = ?prev, next = ?next, "plist list_head corrupted");
            return Err(KernelError::EFAULT);
        }
        if next == top {
            return Ok(());
        }
        prev = next;
        next = (*prev).next;
    }
}

fn corrupt(head: *const plist_head, node: *mut plist_node, reason: &'static str) -> KernelResult<()> {
    tracing::warn!(head = ?head, node = ?node, reason, "plist corrupted");
    Err(KernelError::EFAULT)
}

#[cfg(feature = "debug-plist")]
unsafe fn debug_check_head(head: *const plist_head) {
    if let Err(err) = check_head(head) {
        tracing::error!(head = ?head, errno = err.to_errno(), "plist_check_head failed");
        panic!("plist {:p} corrupted", head);
    }
}

#[cfg(not(feature = "debug-plist"))]
#[inline(always)]
unsafe fn debug_check_head(_head: *const plist_head) {}

#[cfg(test)]
mod tests {
    use super::*;

    /// Nodes at stable addresses, with a head
    struct Fixture {
        head: Box<plist_head>,
        nodes: Box<[plist_node]>,
    }

    impl Fixture {
        fn new(prios: &[c_int]) -> Self {
            let mut head = Box::new(plist_head::new());
            let mut nodes: Box<[plist_node]> = prios.iter().map(|&p| plist_node::new(p)).collect();
            unsafe {
                plist_head_init(&mut *head);
                for node in nodes.iter_mut() {
                    let prio = node.prio;
                    plist_node_init(node, prio);
                }
            }
            Self { head, nodes }
        }

        fn node(&mut self, i: usize) -> *mut plist_node {
            &mut self.nodes[i]
        }

        fn head(&mut self) -> *mut plist_head {
            &mut *self.head
        }

        fn add(&mut self, i: usize) {
            let (node, head) = (self.node(i), self.head());
            unsafe { plist_add(node, head) }
        }

        fn del(&mut self, i: usize) {
            let (node, head) = (self.node(i), self.head());
            unsafe { plist_del(node, head) }
        }

        fn requeue(&mut self, i: usize) {
            let (node, head) = (self.node(i), self.head());
            unsafe { plist_requeue(node, head) }
        }

        /// Indices of linked nodes in list order
        fn order(&mut self) -> Vec<usize> {
            let head = self.head();
            let base = self.nodes.as_ptr();
            let mut out = Vec::new();
            unsafe {
                let mut pos = plist_first(head);
                while !pos.is_null() {
                    out.push(pos.offset_from(base) as usize);
                    pos = plist_next(pos, head);
                }
            }
            out
        }

        fn check(&mut self) {
            let head = self.head();
            assert_eq!(unsafe { plist_check_head(head) }, 0);
        }
    }

    #[test]
    fn test_empty_head() {
        let mut f = Fixture::new(&[]);
        let head = f.head();
        unsafe {
            assert!(plist_head_empty(head));
            assert!(plist_first(head).is_null());
            assert!(plist_last(head).is_null());
        }
        f.check();
    }

    #[test]
    fn test_add_sorts_and_keeps_fifo() {
        let mut f = Fixture::new(&[5, 3, 5, 8, 5, 1]);
        for i in 0..6 {
            f.add(i);
            f.check();
        }
        assert_eq!(f.order(), vec![5, 1, 0, 2, 4, 3]);

        let head = f.head();
        unsafe {
            assert_eq!(plist_first(head), f.node(5));
            assert_eq!(plist_last(head), f.node(3));
            assert_eq!(plist_prev(f.node(0), head), f.node(1));
            assert!(plist_prev(f.node(5), head).is_null());
        }
    }

    #[test]
    fn test_only_first_of_run_on_prio_list() {
        let mut f = Fixture::new(&[3, 5, 5, 8]);
        for i in 0..4 {
            f.add(i);
        }
        unsafe {
            assert!(!(*f.node(0)).prio_list.is_empty());
            assert!(!(*f.node(1)).prio_list.is_empty());
            assert!((*f.node(2)).prio_list.is_empty());
            assert!(!(*f.node(3)).prio_list.is_empty());
        }
    }

    #[test]
    fn test_del_promotes_next_of_same_priority() {
        let mut f = Fixture::new(&[3, 5, 5, 8]);
        for i in 0..4 {
            f.add(i);
        }
        f.del(1);
        f.check();
        assert_eq!(f.order(), vec![0, 2, 3]);
        unsafe {
            assert!(!(*f.node(2)).prio_list.is_empty());
            assert!(plist_node_empty(f.node(1)));
            assert!((*f.node(1)).prio_list.is_empty());
        }

        // The promoted node keeps the run in place for later inserts.
        let mut g = Fixture::new(&[3, 5, 5, 8, 5]);
        for i in 0..4 {
            g.add(i);
        }
        g.del(1);
        g.add(4);
        g.check();
        assert_eq!(g.order(), vec![0, 2, 4, 3]);
    }

    #[test]
    fn test_del_single_priority_list() {
        let mut f = Fixture::new(&[5, 5, 7]);
        f.add(0);
        f.add(1);
        f.del(0);
        f.check();
        f.add(2);
        f.check();
        assert_eq!(f.order(), vec![1, 2]);
    }

    #[test]
    fn test_del_unlinked_is_noop() {
        let mut f = Fixture::new(&[1, 2]);
        f.add(0);
        f.del(1);
        f.check();
        assert_eq!(f.order(), vec![0]);
    }

    #[test]
    fn test_add_linked_node_warns_and_ignores() {
        let mut f = Fixture::new(&[1, 2]);
        f.add(0);
        f.add(1);
        f.add(0);
        f.check();
        assert_eq!(f.order(), vec![0, 1]);
    }

    #[test]
    fn test_requeue() {
        let mut f = Fixture::new(&[3, 5, 5, 5, 8]);
        for i in 0..5 {
            f.add(i);
        }
        f.requeue(1);
        f.check();
        assert_eq!(f.order(), vec![0, 2, 3, 1, 4]);

        // Last of its run: nothing to do.
        f.requeue(1);
        assert_eq!(f.order(), vec![0, 2, 3, 1, 4]);

        // Last of the list: nothing to do.
        f.requeue(4);
        assert_eq!(f.order(), vec![0, 2, 3, 1, 4]);
    }

    #[test]
    #[should_panic(expected = "plist_requeue on an empty list")]
    fn test_requeue_empty_list_panics() {
        let mut f = Fixture::new(&[1]);
        let (node, head) = (f.node(0), f.head());
        unsafe { requeue(node, head) }
    }

    #[test]
    #[should_panic(expected = "plist_requeue of an unlinked node")]
    fn test_requeue_unlinked_node_panics() {
        let mut f = Fixture::new(&[1, 1]);
        f.add(0);
        let (node, head) = (f.node(1), f.head());
        unsafe { requeue(node, head) }
    }

    #[test]
    fn test_requeue_null_is_ignored() {
        let mut f = Fixture::new(&[1]);
        f.add(0);
        let head = f.head();
        unsafe {
            plist_requeue(ptr::null_mut(), head);
            plist_requeue(f.node(0), ptr::null_mut());
        }
        assert_eq!(f.order(), vec![0]);
    }

    #[test]
    fn test_check_head_detects_corruption() {
        let mut f = Fixture::new(&[3, 5, 8]);
        for i in 0..3 {
            f.add(i);
        }
        unsafe {
            (*f.node(1)).prio = 9;
            assert_eq!(plist_check_head(f.head()), KernelError::EFAULT.to_errno());
            (*f.node(1)).prio = 5;
            (*f.node(1)).node_list.prev = f.node(2) as *mut list_head;
            assert_eq!(plist_check_head(f.head()), KernelError::EFAULT.to_errno());
            assert_eq!(plist_check_head(ptr::null()), KernelError::EINVAL.to_errno());
        }
    }

    #[test]
    fn test_random_add_del_stays_sorted() {
        // Same shape as the kernel's plist self-test: random priorities,
        // random add/del, check after every step.
        const N: usize = 241;
        let prios: Vec<c_int> = (0..N).map(|i| ((i * 7919) % 100) as c_int).collect();
        let mut f = Fixture::new(&prios);
        let mut linked = vec![false; N];
        let mut seed: u64 = 0x9e37_79b9_7f4a_7c15;

        for _ in 0..N * 8 {
            seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            let i = (seed >> 33) as usize % N;
            if linked[i] {
                f.del(i);
            } else {
                f.add(i);
            }
            linked[i] = !linked[i];
            f.check();
        }

        let order = f.order();
        assert_eq!(order.len(), linked.iter().filter(|&&l| l).count());
        for pair in order.windows(2) {
            assert!(prios[pair[0]] <= prios[pair[1]]);
        }

        for i in 0..N {
            if linked[i] {
                f.del(i);
            }
        }
        let head = f.head();
        assert!(unsafe { plist_head_empty(head) });
    }
}
