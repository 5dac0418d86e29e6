//! Integration tests with mock HTTP server

pub mod executor;
pub mod lastmod;
