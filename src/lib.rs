//! m4bforge - MP3 to chaptered M4B conversion
//!
//! This library crate exposes the server and conversion layers for integration testing.

pub mod config;
pub mod conversion;
pub mod server;
