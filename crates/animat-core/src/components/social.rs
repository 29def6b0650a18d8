//! Social Components
//!
//! The reputation ledger: how each animat feels about each group marker.
//! Entries appear lazily the first time a sentiment changes and vanish
//! only when the observer is removed from the board.

use bevy_ecs::prelude::*;
use std::collections::BTreeMap;

use super::animat::{AnimatId, GroupMarker};

/// Result of one attack's ledger update
#[derive(Debug, Clone, PartialEq)]
pub struct GrudgeUpdate {
    /// Observer and the amount their sentiment toward the attacker's group fell
    pub changes: Vec<(AnimatId, f64)>,
}

/// Resource: sparse (observer, group) → sentiment map
#[derive(Resource, Debug, Default, Clone)]
pub struct ReputationLedger {
    entries: BTreeMap<AnimatId, BTreeMap<GroupMarker, f64>>,
}

impl ReputationLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sentiment of `observer` toward `group`; zero when never recorded.
    pub fn sentiment(&self, observer: AnimatId, group: GroupMarker) -> f64 {
        self.entries
            .get(&observer)
            .and_then(|row| row.get(&group))
            .copied()
            .unwrap_or(0.0)
    }

    pub fn set_sentiment(&mut self, observer: AnimatId, group: GroupMarker, value: f64) {
        self.entries.entry(observer).or_default().insert(group, value);
    }

    /// Shifts a sentiment. A zero delta creates no entry.
    pub fn adjust(&mut self, observer: AnimatId, group: GroupMarker, delta: f64) {
        if delta == 0.0 {
            return;
        }
        *self
            .entries
            .entry(observer)
            .or_default()
            .entry(group)
            .or_insert(0.0) += delta;
    }

    /// Applies the ledger side of an attack.
    ///
    /// The target's sentiment toward the attacker's group falls by
    /// `grudge_unit`. Every other observer's sentiment toward the attacker's
    /// group falls by their pre-attack sentiment toward the target's group
    /// divided by `damping`. All of those pre-attack values are read before
    /// any write, so the outcome does not depend on iteration order.
    pub fn record_attack(
        &mut self,
        attacker_group: GroupMarker,
        target: AnimatId,
        target_group: GroupMarker,
        observers: &[AnimatId],
        grudge_unit: f64,
        damping: f64,
    ) -> GrudgeUpdate {
        let snapshot: Vec<(AnimatId, f64)> = observers
            .iter()
            .filter(|&&observer| observer != target)
            .map(|&observer| (observer, self.sentiment(observer, target_group)))
            .collect();

        let mut changes = Vec::with_capacity(snapshot.len() + 1);
        self.adjust(target, attacker_group, -grudge_unit);
        changes.push((target, grudge_unit));

        for (observer, toward_target) in snapshot {
            let drop = toward_target / damping;
            if drop != 0.0 {
                self.adjust(observer, attacker_group, -drop);
                changes.push((observer, drop));
            }
        }
        GrudgeUpdate { changes }
    }

    /// Sum of every observer's sentiment toward `group`.
    pub fn standing(&self, group: GroupMarker) -> f64 {
        self.entries
            .values()
            .filter_map(|row| row.get(&group))
            .sum()
    }

    /// Drops an observer's row once it has left the board.
    pub fn forget(&mut self, observer: AnimatId) {
        self.entries.remove(&observer);
    }

    pub fn observer_count(&self) -> usize {
        self.entries.len()
    }

    pub fn row(&self, observer: AnimatId) -> Option<&BTreeMap<GroupMarker, f64>> {
        self.entries.get(&observer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: AnimatId = AnimatId(1);
    const B: AnimatId = AnimatId(2);
    const C: AnimatId = AnimatId(3);
    const GA: GroupMarker = GroupMarker(0);
    const GB: GroupMarker = GroupMarker(1);
    const GC: GroupMarker = GroupMarker(2);

    #[test]
    fn test_missing_entries_read_as_zero() {
        let ledger = ReputationLedger::new();
        assert_eq!(ledger.sentiment(A, GB), 0.0);
        assert_eq!(ledger.observer_count(), 0);
    }

    #[test]
    fn test_zero_adjust_is_lazy() {
        let mut ledger = ReputationLedger::new();
        ledger.adjust(A, GB, 0.0);
        assert_eq!(ledger.observer_count(), 0);
        ledger.adjust(A, GB, -1.5);
        assert_eq!(ledger.sentiment(A, GB), -1.5);
    }

    #[test]
    fn test_attack_propagates_grudge() {
        let mut ledger = ReputationLedger::new();
        ledger.set_sentiment(C, GB, 4.0);

        let update = ledger.record_attack(GA, B, GB, &[A, B, C], 1.0, 2.0);

        assert_eq!(ledger.sentiment(B, GA), -1.0);
        assert_eq!(ledger.sentiment(C, GA), -2.0);
        // attacker had no feeling toward the target's group
        assert_eq!(ledger.sentiment(A, GA), 0.0);
        assert_eq!(ledger.row(A), None);
        assert_eq!(update.changes, vec![(B, 1.0), (C, 2.0)]);
    }

    #[test]
    fn test_propagation_reads_pre_attack_values() {
        // Same-group attack: every write lands on the group being read.
        // A later observer must still see the earlier observer's old value.
        let mut ledger = ReputationLedger::new();
        ledger.set_sentiment(A, GB, 2.0);
        ledger.set_sentiment(C, GB, 4.0);

        ledger.record_attack(GB, B, GB, &[A, B, C], 1.0, 2.0);

        assert_eq!(ledger.sentiment(A, GB), 1.0);
        assert_eq!(ledger.sentiment(C, GB), 2.0);
        assert_eq!(ledger.sentiment(B, GB), -1.0);
    }

    #[test]
    fn test_standing_and_forget() {
        let mut ledger = ReputationLedger::new();
        ledger.set_sentiment(A, GC, 1.0);
        ledger.set_sentiment(B, GC, -3.0);
        assert_eq!(ledger.standing(GC), -2.0);
        ledger.forget(B);
        assert_eq!(ledger.standing(GC), 1.0);
        assert_eq!(ledger.observer_count(), 1);
    }
}
