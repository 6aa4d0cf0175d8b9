//! Migration history
//!
//! Reads migrations and the schema snapshot, and replays the trigger
//! declarations they contain into the set of triggers the database holds
//! once every migration has run.

mod error;
mod replayer;
mod source;
mod versions;


pub use error::*;
pub use replayer::*;
pub use source::*;
pub use versions::*;
