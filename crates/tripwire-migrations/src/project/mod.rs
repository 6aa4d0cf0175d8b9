//! A project: configuration plus the operations over its files

mod error;
mod workspace;

#[cfg(test)]
mod tests;

pub use error::*;
pub use workspace::*;
