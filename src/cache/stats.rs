//! Cache Statistics Module
//!
//! Point-in-time hit/get counters reported by the accessor.

use serde::Serialize;

// == Stat ==
/// Snapshot of accessor counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Stat {
    /// Lookups that found a value
    pub n_hit: u64,
    /// Every lookup, hit or miss
    pub n_get: u64,
}

impl Stat {
    // == Misses ==
    /// Lookups that found nothing. Zero for a hand-built `Stat` with more
    /// hits than gets.
    pub fn misses(&self) -> u64 {
        self.n_get.saturating_sub(self.n_hit)
    }

    // == Hit Rate ==
    /// Calculates the cache hit rate.
    ///
    /// Returns n_hit / n_get, or 0.0 if no lookups have been made.
    pub fn hit_rate(&self) -> f64 {
        if self.n_get == 0 {
            0.0
        } else {
            self.n_hit as f64 / self.n_get as f64
        }
    }
}
