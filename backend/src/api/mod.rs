//! Shared pieces of the HTTP API surface.

pub mod common;
