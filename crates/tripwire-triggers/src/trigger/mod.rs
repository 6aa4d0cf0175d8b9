//! Trigger model and builder
//!
//! A [`TriggerSpec`] is what a declaration says; a [`Trigger`] is what the
//! builder makes of it for one dialect. Triggers become comparable once
//! [`Trigger::prepare`] has interpolated their name template.

mod builder;
mod error;
mod manual;
mod model;
mod source;
mod spec;
mod template;

#[cfg(test)]
mod tests;

pub use builder::*;
pub use error::*;
pub use manual::*;
pub use model::*;
pub use spec::*;
pub use template::*;
