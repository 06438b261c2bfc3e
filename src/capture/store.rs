// src/capture/store.rs
//! Bounded in-memory capture buffer
//!
//! Ordered newest-first: insertion pushes the head, eviction pops the tail. The
//! running total tracks the sum of per-record size estimates; it may exceed the
//! ceiling transiently after an insert but is driven back under it by
//! `evict_to_budget` before the operation completes. Records are never mutated
//! in place, only removed.

use crate::capture::event::CapturedEvent;
use crate::utils::config::CaptureConfig;
use std::collections::VecDeque;
use tracing::debug;

/// Ordered capture buffer with a byte budget
pub struct CaptureStore {
    /// Held records, front = newest
    events: VecDeque<CapturedEvent>,

    /// Sum of estimated sizes of held records
    total_bytes: usize,

    /// Budget ceiling
    ceiling_bytes: usize,

    /// Minimum amount reclaimed per eviction pass
    target_free_bytes: usize,
}

impl CaptureStore {
    /// Create an empty store with the given budget
    pub fn new(config: &CaptureConfig) -> Self {
        Self {
            events: VecDeque::new(),
            total_bytes: 0,
            ceiling_bytes: config.ceiling_bytes,
            target_free_bytes: config.target_free_bytes,
        }
    }

    /// Push a record to the head
    pub fn insert(&mut self, event: CapturedEvent) {
        self.total_bytes += event.estimated_size();
        self.events.push_front(event);
    }

    /// Evict tail records until the total is back under the ceiling
    ///
    /// On overflow this reclaims the larger of `target_free_bytes` and a quarter
    /// of the current total, so large overshoots recover in one pass. A single
    /// record larger than the ceiling is retained alone. Returns the number of
    /// records evicted.
    pub fn evict_to_budget(&mut self) -> usize {
        if self.total_bytes <= self.ceiling_bytes {
            return 0;
        }

        let reclaim = self.target_free_bytes.max(self.total_bytes / 4);
        let floor = self.ceiling_bytes.saturating_sub(reclaim);

        let mut evicted = 0;
        while self.total_bytes > floor && self.events.len() > 1 {
            self.drop_oldest();
            evicted += 1;
        }

        if evicted > 0 {
            debug!(
                "Evicted {} records, {} bytes held across {}",
                evicted,
                self.total_bytes,
                self.events.len()
            );
        }

        evicted
    }

    /// Evict tail records until at least `min_reclaim` bytes are freed
    ///
    /// Used when the backing store rejects a save: keeps shedding oldest records
    /// until the snapshot has a chance of fitting, down to an empty store.
    /// Returns the number of records evicted.
    pub fn shed(&mut self, min_reclaim: usize) -> usize {
        let start = self.total_bytes;
        let mut evicted = 0;
        while start.saturating_sub(self.total_bytes) < min_reclaim && !self.events.is_empty() {
            self.drop_oldest();
            evicted += 1;
        }
        evicted
    }

    fn drop_oldest(&mut self) {
        if let Some(oldest) = self.events.pop_back() {
            self.total_bytes = self.total_bytes.saturating_sub(oldest.estimated_size());
        }
    }

    /// Drop everything and zero the running total
    pub fn clear(&mut self) {
        self.events.clear();
        self.total_bytes = 0;
    }

    /// Replace the contents with a loaded sequence (newest first), recomputing
    /// the running total from scratch
    pub fn replace(&mut self, events: Vec<CapturedEvent>) {
        self.total_bytes = events.iter().map(|e| e.estimated_size()).sum();
        self.events = events.into();
    }

    /// Clone the current sequence, newest first
    pub fn snapshot(&self) -> Vec<CapturedEvent> {
        self.events.iter().cloned().collect()
    }

    /// Number of held records
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether the store holds no records
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Current running total of estimated sizes
    pub fn total_bytes(&self) -> usize {
        self.total_bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const MIB: usize = 1024 * 1024;

    fn test_config(ceiling: usize, target_free: usize) -> CaptureConfig {
        CaptureConfig {
            ceiling_bytes: ceiling,
            target_free_bytes: target_free,
            ..Default::default()
        }
    }

    /// Record whose estimate is exactly `size` bytes (empty metadata, raw only)
    fn sized_event(id: &str, size: usize) -> CapturedEvent {
        CapturedEvent {
            id: id.to_string(),
            timestamp: String::new(),
            url: String::new(),
            domain: String::new(),
            decoded: None,
            raw_data: Some(vec![0u8; size.saturating_sub(id.len() * 2)]),
            error: None,
        }
    }

    #[test]
    fn test_insert_order_newest_first() {
        let mut store = CaptureStore::new(&test_config(MIB, MIB / 4));
        store.insert(sized_event("a", 100));
        store.insert(sized_event("b", 100));
        store.insert(sized_event("c", 100));

        let ids: Vec<_> = store.snapshot().into_iter().map(|e| e.id).collect();
        assert_eq!(ids, vec!["c", "b", "a"]);
    }

    #[test]
    fn test_running_total_tracks_estimates() {
        let mut store = CaptureStore::new(&test_config(MIB, MIB / 4));
        let a = sized_event("a", 300);
        let b = sized_event("b", 500);
        let expected = a.estimated_size() + b.estimated_size();

        store.insert(a);
        store.insert(b);
        assert_eq!(store.total_bytes(), expected);
    }

    #[test]
    fn test_three_large_events_leave_only_newest() {
        // ceiling 2 MiB, target-free 1 MiB, three 1 MiB inserts
        let mut store = CaptureStore::new(&test_config(2 * MIB, MIB));
        for id in ["first", "second", "third"] {
            store.insert(sized_event(id, MIB));
            store.evict_to_budget();
        }

        assert_eq!(store.len(), 1);
        assert!(store.total_bytes() <= 2 * MIB);
        assert_eq!(store.snapshot()[0].id, "third");
    }

    #[test]
    fn test_single_oversized_record_is_retained() {
        let mut store = CaptureStore::new(&test_config(MIB, MIB / 4));
        store.insert(sized_event("huge", 3 * MIB));
        let evicted = store.evict_to_budget();

        assert_eq!(evicted, 0);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_oversized_insert_evicts_older_records() {
        let mut store = CaptureStore::new(&test_config(MIB, MIB / 4));
        store.insert(sized_event("old", 100));
        store.insert(sized_event("huge", 3 * MIB));
        store.evict_to_budget();

        // Only the oversized newest record survives
        assert_eq!(store.len(), 1);
        assert_eq!(store.snapshot()[0].id, "huge");
    }

    #[test]
    fn test_shed_frees_at_least_requested() {
        let mut store = CaptureStore::new(&test_config(10 * MIB, MIB));
        for i in 0..8 {
            store.insert(sized_event(&format!("e{}", i), MIB));
        }

        let before = store.total_bytes();
        store.shed(2 * MIB + 1);
        assert!(before - store.total_bytes() >= 2 * MIB + 1);
        assert_eq!(store.snapshot().last().map(|e| e.id.clone()), Some("e3".to_string()));
    }

    #[test]
    fn test_shed_stops_at_empty() {
        let mut store = CaptureStore::new(&test_config(MIB, MIB / 4));
        store.insert(sized_event("only", 100));
        let evicted = store.shed(usize::MAX);

        assert_eq!(evicted, 1);
        assert!(store.is_empty());
        assert_eq!(store.total_bytes(), 0);
    }

    #[test]
    fn test_clear_resets_everything() {
        let mut store = CaptureStore::new(&test_config(MIB, MIB / 4));
        store.insert(sized_event("a", 100));
        store.insert(sized_event("b", 100));
        store.clear();

        assert!(store.is_empty());
        assert_eq!(store.total_bytes(), 0);
    }

    #[test]
    fn test_replace_recomputes_total() {
        let mut store = CaptureStore::new(&test_config(MIB, MIB / 4));
        let events = vec![sized_event("a", 200), sized_event("b", 300)];
        let expected: usize = events.iter().map(|e| e.estimated_size()).sum();

        store.replace(events);
        assert_eq!(store.total_bytes(), expected);
        assert_eq!(store.len(), 2);
    }

    proptest! {
        #[test]
        fn prop_budget_invariant_holds(sizes in proptest::collection::vec(0usize..3 * MIB, 1..40)) {
            let mut store = CaptureStore::new(&test_config(2 * MIB, MIB / 2));
            for (i, size) in sizes.iter().enumerate() {
                store.insert(sized_event(&format!("e{}", i), *size));
                store.evict_to_budget();

                // Under ceiling, except the degenerate single-oversized-record case
                prop_assert!(store.total_bytes() <= 2 * MIB || store.len() == 1);
            }
        }

        #[test]
        fn prop_total_matches_sum_of_estimates(sizes in proptest::collection::vec(0usize..MIB, 1..30)) {
            let mut store = CaptureStore::new(&test_config(4 * MIB, MIB));
            for (i, size) in sizes.iter().enumerate() {
                store.insert(sized_event(&format!("e{}", i), *size));
                store.evict_to_budget();

                let sum: usize = store.snapshot().iter().map(|e| e.estimated_size()).sum();
                prop_assert_eq!(store.total_bytes(), sum);
            }
        }

        #[test]
        fn prop_survivors_preserve_arrival_order(count in 2usize..30) {
            let mut store = CaptureStore::new(&test_config(2 * MIB, MIB / 2));
            for i in 0..count {
                store.insert(sized_event(&format!("e{:03}", i), 256 * 1024));
                store.evict_to_budget();
            }

            // Later arrivals sit closer to the head
            let ids: Vec<_> = store.snapshot().into_iter().map(|e| e.id).collect();
            let mut sorted = ids.clone();
            sorted.sort_by(|a, b| b.cmp(a));
            prop_assert_eq!(ids, sorted);
        }
    }
}
