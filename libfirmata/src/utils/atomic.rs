//! Lock-free ratchet used for device-wide maxima.

use std::sync::atomic::{AtomicU32, Ordering};

/// Raise `cell` to `value` if `value` is larger. Retries the
/// compare-and-swap until it either wins or observes a value that is
/// already at least `value`. Returns true only for the caller whose swap
/// actually raised the cell.
pub fn raise(cell: &AtomicU32, value: u32) -> bool {
    let mut current = cell.load(Ordering::Acquire);
    while value > current {
        match cell.compare_exchange_weak(current, value, Ordering::AcqRel, Ordering::Acquire) {
            Ok(_) => return true,
            Err(observed) => current = observed,
        }
    }
    false
}
