//! Business logic services that sit between the HTTP handlers and the
//! credential store.

pub mod credential_service;
pub mod password_service;
