//! Tripwire Migrations - keeping declared triggers and migration history in step
//!
//! This crate provides:
//! - `DeclarationExtractor` - finds trigger declarations in migration and schema text
//! - `MigrationReplayer` - folds migration history into the effective trigger set
//! - `DeclarationCollector` - gathers the triggers declared next to the models
//! - `Reconciler` - diffs declared triggers against history
//! - `MigrationEmitter` - writes the migration that reconciles the two
//! - `Project` - the operations above wired to a project's configuration

pub mod declared;
pub mod extract;
pub mod history;
pub mod migration;
pub mod project;
pub mod reconcile;

pub use declared::*;
pub use extract::*;
pub use history::*;
pub use migration::*;
pub use project::*;
pub use reconcile::*;
