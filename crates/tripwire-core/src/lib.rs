//! Tripwire Core - shared configuration and dialect metadata
//!
//! This crate provides the pieces every other tripwire crate depends on:
//!
//! - `TripwireConfig` - project configuration (paths, dialect, template variables)
//! - `Dialect` - supported database engines and their trigger capabilities
//! - `ConfigError` - errors raised while loading configuration

mod config;
mod dialect;
mod error;

pub use config::*;
pub use dialect::*;
pub use error::*;
