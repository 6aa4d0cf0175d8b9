//! Reconciliation of declared triggers against migration history

mod diff;
mod reconciler;


pub use diff::*;
pub use reconciler::*;
