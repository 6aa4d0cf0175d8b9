//! SQL rendering
//!
//! [`SqlRenderer`] is the seam between the trigger model and a database
//! engine. [`DialectRenderer`] covers the dialects tripwire knows about.

mod renderer;


pub use renderer::*;
