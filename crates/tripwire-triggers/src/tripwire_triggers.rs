//! Tripwire Triggers - the trigger model and everything that builds or renders it
//!
//! This crate provides:
//! - `TriggerSpec` - a declarative, serde-friendly description of one trigger
//! - `TriggerBuilder` - validates specs for a dialect and expands trigger groups
//! - `Trigger` - the canonical, comparable trigger record
//! - `SqlRenderer` / `DialectRenderer` - CREATE and DROP statements per dialect
//! - `Trigger::to_source` - declaration text that re-creates a trigger

pub mod render;
pub mod trigger;

pub use render::*;
pub use trigger::*;
