//! Per-run unsafe-reason counters (spec §3 "Unsafe reason", §6 "a count of
//! unsafe rewrites grouped by reason").
//!
//! Append-only for the lifetime of a package run (spec §5: "the
//! unsafe-reason counter... because all writes are on one task, no
//! locking is needed").

use rustc_hash::FxHashMap;

use refactor_common::UnsafeReason;

#[derive(Debug, Default)]
pub struct UnsafeReasonCounters {
    counts: FxHashMap<UnsafeReason, u64>,
}

impl UnsafeReasonCounters {
    pub fn new() -> Self {
        UnsafeReasonCounters::default()
    }

    pub fn record(&mut self, reason: UnsafeReason) {
        *self.counts.entry(reason).or_insert(0) += 1;
    }

    pub fn count(&self, reason: UnsafeReason) -> u64 {
        self.counts.get(&reason).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (UnsafeReason, u64)> + '_ {
        self.counts.iter().map(|(reason, count)| (*reason, *count))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_accumulate_per_reason() {
        let mut counters = UnsafeReasonCounters::new();
        counters.record(UnsafeReason::ShallowCopy);
        counters.record(UnsafeReason::ShallowCopy);
        counters.record(UnsafeReason::EvalOrderChange);
        assert_eq!(counters.count(UnsafeReason::ShallowCopy), 2);
        assert_eq!(counters.count(UnsafeReason::EvalOrderChange), 1);
        assert_eq!(counters.total(), 3);
    }

    #[test]
    fn unrecorded_reason_is_zero() {
        let counters = UnsafeReasonCounters::new();
        assert_eq!(counters.count(UnsafeReason::PointerAlias), 0);
    }
}
