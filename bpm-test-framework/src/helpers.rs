//! Shared helpers for scenario and integration tests

use bpm_plist::{Plist, PlistStorage};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install a global subscriber filtered by `BPM_LOG` (default `info`)
///
/// Safe to call more than once.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_env("BPM_LOG").unwrap_or_else(|_| EnvFilter::new("info"));

    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_test_writer().with_target(true))
        .try_init()
        .is_ok();
    if installed {
        tracing::debug!("tracing initialized from BPM_LOG");
    }
}

/// `(prio, value)` pairs in list order
pub fn entries<T: Clone>(list: &Plist, storage: &PlistStorage<T>) -> Vec<(i32, T)> {
    list.iter(storage).map(|(_, prio, value)| (prio, value.clone())).collect()
}

/// Priorities of the first node of each run, in list order
pub fn distinct_prios<T>(list: &Plist, storage: &PlistStorage<T>) -> Vec<i32> {
    let mut prios: Vec<i32> = list.iter(storage).map(|(_, prio, _)| prio).collect();
    prios.dedup();
    prios
}

/// Whether `(prio, arrival)` pairs ascend by priority, then by arrival
pub fn is_stable_order(seq: &[(i32, u64)]) -> bool {
    seq.windows(2).all(|w| {
        let (a, b) = (w[0], w[1]);
        a.0 < b.0 || (a.0 == b.0 && a.1 < b.1)
    })
}
