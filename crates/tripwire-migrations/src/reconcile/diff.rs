//! Trigger diff data structures

use serde::Serialize;
use tripwire_triggers::Trigger;

/// The changes turning one trigger set into another, and back
///
/// The up step runs `up_drops` then `up_creates`; the down step runs
/// `down_drops` then `down_creates` and restores the set the up step started
/// from.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TriggerDiff {
    /// Drop directives for triggers that are gone or replaced
    pub up_drops: Vec<Trigger>,
    /// Triggers that are new or changed
    pub up_creates: Vec<Trigger>,
    /// Drop directives undoing `up_creates`
    pub down_drops: Vec<Trigger>,
    /// Triggers removed or replaced by the up step
    pub down_creates: Vec<Trigger>,
}

impl TriggerDiff {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if there are no differences
    pub fn is_empty(&self) -> bool {
        self.up_drops.is_empty()
            && self.up_creates.is_empty()
            && self.down_drops.is_empty()
            && self.down_creates.is_empty()
    }

    /// Number of up-step operations
    pub fn change_count(&self) -> usize {
        self.up_drops.len() + self.up_creates.len()
    }

    /// Up-step operations in execution order
    pub fn up_steps(&self) -> impl Iterator<Item = &Trigger> {
        self.up_drops.iter().chain(&self.up_creates)
    }

    /// Down-step operations in execution order
    pub fn down_steps(&self) -> impl Iterator<Item = &Trigger> {
        self.down_drops.iter().chain(&self.down_creates)
    }

    /// Applies the up step to `existing`
    pub fn apply_up(&self, existing: &[Trigger]) -> Vec<Trigger> {
        apply(existing, self.up_steps())
    }

    /// Applies the down step to `canonical`
    pub fn apply_down(&self, canonical: &[Trigger]) -> Vec<Trigger> {
        apply(canonical, self.down_steps())
    }
}

/// Replays `steps` onto `snapshot` the way migration history is replayed
fn apply<'a>(snapshot: &[Trigger], steps: impl Iterator<Item = &'a Trigger>) -> Vec<Trigger> {
    let mut result = snapshot.to_vec();
    for step in steps {
        result.retain(|existing| existing.identity() != step.identity());
        if !step.is_drop() {
            result.push(step.clone());
        }
    }
    result
}
