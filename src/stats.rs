//! Run statistics and the derived report

use crate::resolve::Strategy;
use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Additive counters for one run
#[derive(Debug, Default)]
pub struct RunStatistics {
    pub total_files: AtomicUsize,

    // One per strategy, in precedence order
    pub direct_json: AtomicUsize,
    pub inherited_json: AtomicUsize,
    pub alternative_json: AtomicUsize,
    pub filename_derived: AtomicUsize,
    pub exif_preserved: AtomicUsize,
    pub album_date_inferred: AtomicUsize,
    pub unresolved: AtomicUsize,

    pub date_restored: AtomicUsize,
    pub gps_restored: AtomicUsize,
    pub description_restored: AtomicUsize,
    pub verified: AtomicUsize,
    pub unverified: AtomicUsize,

    pub extensions_fixed: AtomicUsize,
    pub live_photos_paired: AtomicUsize,
    pub malformed_sidecars: AtomicUsize,

    pub batches: AtomicUsize,
    pub batch_fallbacks: AtomicUsize,
    pub tool_failures: AtomicUsize,
    pub errors: AtomicUsize,
}

fn load(counter: &AtomicUsize) -> usize {
    counter.load(Ordering::Relaxed)
}

impl Clone for RunStatistics {
    fn clone(&self) -> Self {
        let copy = |c: &AtomicUsize| AtomicUsize::new(load(c));
        Self {
            total_files: copy(&self.total_files),
            direct_json: copy(&self.direct_json),
            inherited_json: copy(&self.inherited_json),
            alternative_json: copy(&self.alternative_json),
            filename_derived: copy(&self.filename_derived),
            exif_preserved: copy(&self.exif_preserved),
            album_date_inferred: copy(&self.album_date_inferred),
            unresolved: copy(&self.unresolved),
            date_restored: copy(&self.date_restored),
            gps_restored: copy(&self.gps_restored),
            description_restored: copy(&self.description_restored),
            verified: copy(&self.verified),
            unverified: copy(&self.unverified),
            extensions_fixed: copy(&self.extensions_fixed),
            live_photos_paired: copy(&self.live_photos_paired),
            malformed_sidecars: copy(&self.malformed_sidecars),
            batches: copy(&self.batches),
            batch_fallbacks: copy(&self.batch_fallbacks),
            tool_failures: copy(&self.tool_failures),
            errors: copy(&self.errors),
        }
    }
}

impl RunStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn strategy_counter(&self, strategy: Strategy) -> &AtomicUsize {
        match strategy {
            Strategy::DirectJson => &self.direct_json,
            Strategy::InheritedJson => &self.inherited_json,
            Strategy::AlternativeJson => &self.alternative_json,
            Strategy::FilenameDerived => &self.filename_derived,
            Strategy::ExifPreserved => &self.exif_preserved,
            Strategy::AlbumDateInferred => &self.album_date_inferred,
            Strategy::None => &self.unresolved,
        }
    }

    pub fn record_strategy(&self, strategy: Strategy) {
        self.strategy_counter(strategy).fetch_add(1, Ordering::Relaxed);
    }

    pub fn strategy_count(&self, strategy: Strategy) -> usize {
        load(self.strategy_counter(strategy))
    }

    /// Assets matched to a sidecar through their own or their original's name
    pub fn json_matched(&self) -> usize {
        load(&self.direct_json) + load(&self.inherited_json)
    }

    pub fn cross_album_matched(&self) -> usize {
        load(&self.alternative_json)
    }

    pub fn resolved(&self) -> usize {
        Strategy::ALL
            .into_iter()
            .filter(|s| s.is_resolved())
            .map(|s| self.strategy_count(s))
            .sum()
    }

    /// Verified over total discovered, in percent
    pub fn success_rate(&self) -> f64 {
        let total = load(&self.total_files);
        if total == 0 {
            return 0.0;
        }
        load(&self.verified) as f64 / total as f64 * 100.0
    }

    pub fn summary(&self) -> String {
        format!(
            "Total: {}, Resolved: {}, Verified: {}, Unverified: {}, Errors: {} ({:.1}% success)",
            load(&self.total_files),
            self.resolved(),
            load(&self.verified),
            load(&self.unverified),
            load(&self.errors),
            self.success_rate()
        )
    }

    /// Snapshot the counters into a report
    pub fn report(&self) -> RunReport {
        let resolved = self.resolved();
        let strategies = Strategy::ALL
            .into_iter()
            .map(|strategy| {
                let count = self.strategy_count(strategy);
                let share = if resolved == 0 || !strategy.is_resolved() {
                    0.0
                } else {
                    count as f64 / resolved as f64
                };
                StrategyShare {
                    strategy,
                    count,
                    share,
                }
            })
            .collect();

        RunReport {
            total_files: load(&self.total_files),
            resolved,
            json_matched: self.json_matched(),
            cross_album_matched: self.cross_album_matched(),
            filename_metadata_extracted: load(&self.filename_derived),
            exif_preserved: load(&self.exif_preserved),
            album_date_inferred: load(&self.album_date_inferred),
            unresolved: load(&self.unresolved),
            date_restored: load(&self.date_restored),
            gps_restored: load(&self.gps_restored),
            description_restored: load(&self.description_restored),
            verified: load(&self.verified),
            unverified: load(&self.unverified),
            extensions_fixed: load(&self.extensions_fixed),
            live_photos_paired: load(&self.live_photos_paired),
            malformed_sidecars: load(&self.malformed_sidecars),
            batches: load(&self.batches),
            batch_fallbacks: load(&self.batch_fallbacks),
            tool_failures: load(&self.tool_failures),
            errors: load(&self.errors),
            strategies,
            success_rate: self.success_rate(),
            summary: self.summary(),
        }
    }
}

/// One strategy's count and its share of resolved assets (0.0 - 1.0)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StrategyShare {
    pub strategy: Strategy,
    pub count: usize,
    pub share: f64,
}

/// Read-only view of a finished run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    pub total_files: usize,
    pub resolved: usize,
    pub json_matched: usize,
    pub cross_album_matched: usize,
    pub filename_metadata_extracted: usize,
    pub exif_preserved: usize,
    pub album_date_inferred: usize,
    pub unresolved: usize,
    pub date_restored: usize,
    pub gps_restored: usize,
    pub description_restored: usize,
    pub verified: usize,
    pub unverified: usize,
    pub extensions_fixed: usize,
    pub live_photos_paired: usize,
    pub malformed_sidecars: usize,
    pub batches: usize,
    pub batch_fallbacks: usize,
    pub tool_failures: usize,
    pub errors: usize,
    pub strategies: Vec<StrategyShare>,
    /// Percent of discovered assets that ended verified
    pub success_rate: f64,
    pub summary: String,
}

impl RunReport {
    pub fn share_of(&self, strategy: Strategy) -> f64 {
        self.strategies
            .iter()
            .find(|s| s.strategy == strategy)
            .map_or(0.0, |s| s.share)
    }
}
