//! h1feed - incremental HTTP/1.x message parser
//!
//! This crate parses HTTP/1.0 and HTTP/1.1 requests and responses from
//! input that arrives in arbitrary pieces, reporting start-line, header and
//! body events as soon as their bytes are seen.

pub mod http;
