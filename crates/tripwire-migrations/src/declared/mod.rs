//! Triggers declared next to the models
//!
//! The declared set is the target state: what the application says its
//! triggers should be, independent of any database.

mod collector;
mod error;


pub use collector::*;
pub use error::*;
