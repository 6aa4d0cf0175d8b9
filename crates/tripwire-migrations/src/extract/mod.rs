//! Declaration extraction
//!
//! Migration bodies and schema snapshots are free-form text. Trigger
//! declarations inside them are found by their leading keyword and parsed
//! with a small grammar; nothing else in the text is interpreted.

mod error;
mod extractor;
mod lexer;
mod parser;


pub use error::*;
pub use extractor::*;
