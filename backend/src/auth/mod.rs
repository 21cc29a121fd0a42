//! Authentication module for client sign-up and sign-in.
//!
//! This module provides the HTTP handlers and routes for registration and
//! session issuance, plus the session issuer service behind sign-in.

pub mod handlers;
pub mod models;
pub mod routes;
pub mod service;
