//! Diffing the declared trigger set against the replayed one

use tripwire_triggers::Trigger;

use super::TriggerDiff;

/// Computes the migration that turns the replayed set into the declared set
///
/// Triggers are matched by prepared name. A trigger whose name is declared
/// but whose definition changed is dropped and recreated: creating the new
/// definition does not by itself remove the old physical triggers when the
/// group membership differs.
#[derive(Debug, Clone, Copy, Default)]
pub struct Reconciler;

impl Reconciler {
    pub fn new() -> Self {
        Self
    }

    /// Diffs `canonical` (declared) against `existing` (replayed)
    ///
    /// Both sets must be prepared.
    pub fn diff(&self, canonical: &[Trigger], existing: &[Trigger]) -> TriggerDiff {
        let mut diff = TriggerDiff::new();

        for old in existing {
            if !canonical.iter().any(|t| t.same_identity(old)) {
                diff.up_drops.extend(old.drop_triggers());
                diff.down_creates.push(old.clone());
            }
        }

        for new in canonical.iter().filter(|t| !existing.contains(t)) {
            diff.up_creates.push(new.clone());
            diff.down_drops.extend(new.drop_triggers());
            if let Some(old) = existing.iter().find(|t| t.same_identity(new)) {
                diff.up_drops.extend(old.drop_triggers());
                diff.down_creates.push(old.clone());
            }
        }

        tracing::debug!(
            up_drops = diff.up_drops.len(),
            up_creates = diff.up_creates.len(),
            "Reconciled triggers"
        );
        diff
    }

    /// Returns true if both sets hold the same triggers, in any order
    pub fn is_current(&self, canonical: &[Trigger], existing: &[Trigger]) -> bool {
        let mut canonical = canonical.to_vec();
        let mut existing = existing.to_vec();
        canonical.sort();
        existing.sort();
        canonical == existing
    }
}
