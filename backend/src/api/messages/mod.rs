//! Messaging pass-through endpoints.

pub mod handlers;
pub mod routes;
