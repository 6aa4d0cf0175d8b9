//! Migration generation
//!
//! Turns a [`TriggerDiff`](crate::TriggerDiff) into a migration file of
//! trigger declarations, or into the SQL it stands for.

mod emitter;
mod error;
mod naming;
mod sql;


pub use emitter::*;
pub use error::*;
pub use naming::*;
pub use sql::*;
