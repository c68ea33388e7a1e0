//! CPU pinning for extraction workers.
//!
//! Workers can be placed on dedicated cores so JSON decoding does not compete
//! with the control loop's socket reads. Thin wrapper over `core_affinity`.

use tracing::{info, warn};

/// Pin the calling thread to core `core_id` (index into the OS core list).
///
/// Returns `false` if the core does not exist or the OS refused.
pub fn pin_current(label: &str, core_id: usize) -> bool {
    let cores = core_affinity::get_core_ids().unwrap_or_default();
    let Some(core) = cores.get(core_id).copied() else {
        warn!("[{label}] core {core_id} out of range ({} available), not pinned", cores.len());
        return false;
    };
    let pinned = core_affinity::set_for_current(core);
    if pinned {
        info!("[{label}] pinned to core {core_id}");
    } else {
        warn!("[{label}] OS rejected pin to core {core_id}");
    }
    pinned
}

/// Pin when a non-negative core is configured; otherwise leave the thread
/// wherever the scheduler puts it.
pub fn maybe_pin(label: &str, core_id: Option<i32>) -> bool {
    match core_id {
        Some(id) if id >= 0 => pin_current(label, id as usize),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_range_core_rejected() {
        assert!(!pin_current("test", usize::MAX));
    }

    #[test]
    fn unset_and_negative_are_noops() {
        assert!(!maybe_pin("test", None));
        assert!(!maybe_pin("test", Some(-1)));
    }
}
