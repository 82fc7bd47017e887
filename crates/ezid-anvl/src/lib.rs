//! # EZID ANVL
//!
//! ANVL (A Name-Value Language) codec and percent escaping used by the EZID
//! identifier service for request and response bodies.
//!
//! ## Wire Rules
//!
//! - One `name: value` pair per line, split on the first literal `:`
//! - Continuation lines start with whitespace and are joined with one space
//! - `%`, control characters and non-ASCII bytes are `%XX`-escaped;
//!   names additionally escape `:` and leading/trailing spaces
//!
//! Decoding then re-encoding a record preserves every name and value.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod codec;
pub mod escape;
pub mod record;

pub use codec::{decode, decode_records, encode, AnvlError};
pub use escape::{escape, escape_name, escape_path, unescape};
pub use record::Metadata;
