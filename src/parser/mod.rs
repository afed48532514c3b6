//! Parsers for values found inside evidence records.

pub mod attachment;
