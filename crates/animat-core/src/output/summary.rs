//! Run Summary
//!
//! Folds tick events into the per-run totals.

use animat_events::{EventKind, RunSummary, SimEvent};

use crate::components::Population;

/// Adds one tick's events to the running totals.
pub fn tally_events(summary: &mut RunSummary, events: &[SimEvent]) {
    for event in events {
        match &event.kind {
            EventKind::Born { .. } => summary.births += 1,
            EventKind::Died { .. } => summary.deaths += 1,
            EventKind::Attacked { .. } => summary.attacks += 1,
            EventKind::Ate { amount, .. } if *amount > 0 => summary.meals += 1,
            EventKind::BrainFailure { .. } => summary.brain_failures += 1,
            EventKind::RecorderFailure { .. } => summary.recorder_failures += 1,
            _ => {}
        }
    }
}

/// Fills in the end-of-run population figures.
pub fn finalize_summary(summary: &mut RunSummary, ticks_run: u64, population: &Population) {
    summary.ticks_run = ticks_run;
    summary.final_population = population.len();
    summary.mean_health = population.mean_health();
}
