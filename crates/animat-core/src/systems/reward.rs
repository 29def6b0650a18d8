//! Reward Windows
//!
//! Each animat keeps a fixed-length rolling buffer that turns its
//! per-tick fitness into a delayed training signal. The older half of
//! the buffer is credit, the newer half is debit, so the signal rises
//! after sustained improvement and falls after sustained decline.
//!
//! The signal tracks change, not level. A fitness that steps up by F and
//! then holds peaks at `half × F` once the step has filled the credit
//! half, then drains back to 0 as it reaches the debit half. A constant
//! fitness therefore settles to a signal of 0, not to `half × F`.

use bevy_ecs::prelude::*;
use std::collections::BTreeMap;

use crate::components::{Animat, AnimatId, ReputationLedger};

#[derive(Debug, Clone, PartialEq)]
pub struct RewardWindow {
    slots: Vec<f64>,
}

impl RewardWindow {
    /// `length` is the total slot count, split into equal halves.
    pub fn new(length: usize) -> Self {
        Self {
            slots: vec![0.0; length.max(2)],
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn half(&self) -> usize {
        self.slots.len() / 2
    }

    /// Rolls left by one slot, appends a zero, then credits `fitness` to
    /// the older half and debits it from the newer half.
    pub fn push(&mut self, fitness: f64) {
        self.slots.rotate_left(1);
        if let Some(last) = self.slots.last_mut() {
            *last = 0.0;
        }
        let half = self.half();
        for (i, slot) in self.slots.iter_mut().enumerate() {
            if i < half {
                *slot += fitness;
            } else {
                *slot -= fitness;
            }
        }
    }

    /// The slot about to roll off.
    pub fn current_signal(&self) -> f64 {
        self.slots.first().copied().unwrap_or(0.0)
    }

    pub fn slots(&self) -> &[f64] {
        &self.slots
    }
}

/// Reward windows of every animat on the board
#[derive(Resource, Debug, Clone)]
pub struct RewardWindows {
    length: usize,
    windows: BTreeMap<AnimatId, RewardWindow>,
}

impl RewardWindows {
    pub fn new(length: usize) -> Self {
        Self {
            length,
            windows: BTreeMap::new(),
        }
    }

    /// Signal for the animat's next reward; zero before its first push.
    pub fn current_signal(&self, id: AnimatId) -> f64 {
        self.windows
            .get(&id)
            .map(RewardWindow::current_signal)
            .unwrap_or(0.0)
    }

    pub fn push(&mut self, id: AnimatId, fitness: f64) {
        let length = self.length;
        self.windows
            .entry(id)
            .or_insert_with(|| RewardWindow::new(length))
            .push(fitness);
    }

    pub fn get(&self, id: AnimatId) -> Option<&RewardWindow> {
        self.windows.get(&id)
    }

    pub fn forget(&mut self, id: AnimatId) {
        self.windows.remove(&id);
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }
}

/// Health plus weighted standing of the animat's group.
pub fn fitness(animat: &Animat, ledger: &ReputationLedger, reputation_weight: f64) -> f64 {
    let standing = if reputation_weight == 0.0 {
        0.0
    } else {
        reputation_weight * ledger.standing(animat.group)
    };
    f64::from(animat.health) + standing
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::brain::ScriptedBrain;
    use crate::components::{Direction, GroupMarker};

    #[test]
    fn test_step_increase_peaks_at_half_window() {
        let mut window = RewardWindow::new(4);
        let signals: Vec<f64> = (0..10)
            .map(|_| {
                window.push(10.0);
                window.current_signal()
            })
            .collect();
        assert_eq!(&signals[..4], &[10.0, 20.0, 10.0, 0.0]);
        assert!(signals[4..].iter().all(|&s| s == 0.0));
        assert_eq!(window.slots(), &[0.0, -10.0, -20.0, -10.0]);
    }

    #[test]
    fn test_decline_goes_negative() {
        let mut window = RewardWindow::new(4);
        for _ in 0..6 {
            window.push(10.0);
        }
        window.push(0.0);
        assert_eq!(window.current_signal(), -10.0);
        window.push(0.0);
        assert_eq!(window.current_signal(), -20.0);
    }

    #[test]
    fn test_windows_are_lazy_and_prunable() {
        let mut windows = RewardWindows::new(2);
        let id = AnimatId(3);
        assert_eq!(windows.current_signal(id), 0.0);
        windows.push(id, 5.0);
        assert_eq!(windows.current_signal(id), 5.0);
        assert_eq!(windows.get(id).map(RewardWindow::len), Some(2));
        windows.forget(id);
        assert!(windows.is_empty());
    }

    #[test]
    fn test_fitness_adds_weighted_standing() {
        let animat = Animat::new(
            AnimatId(1),
            GroupMarker(2),
            Direction::Up,
            40,
            0,
            Box::new(ScriptedBrain::stay()),
        );
        let mut ledger = ReputationLedger::new();
        ledger.set_sentiment(AnimatId(5), GroupMarker(2), -3.0);
        ledger.set_sentiment(AnimatId(6), GroupMarker(2), 1.0);
        assert_eq!(fitness(&animat, &ledger, 0.0), 40.0);
        assert_eq!(fitness(&animat, &ledger, 2.0), 36.0);
    }
}
