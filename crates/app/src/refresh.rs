use std::sync::atomic::{AtomicU64, Ordering};

/// Last-issued-wins guard for re-triggered refreshes.
///
/// Each refresh claims a new generation ticket before its fetches start; by
/// the time the fetches complete, the result is only published if no newer
/// refresh was issued in the meantime. A superseded refresh simply discards
/// its result, so a slow stale fetch can never overwrite a fresher one.
#[derive(Debug, Default)]
pub struct RefreshGuard {
    generation: AtomicU64,
}

impl RefreshGuard {
    /// Claim the next generation ticket, superseding any in-flight refresh.
    pub fn begin(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Whether `ticket` is still the newest issued generation.
    pub fn is_current(&self, ticket: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == ticket
    }
}
