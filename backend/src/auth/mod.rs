//! Authentication and authorization for the API.
//!
//! Token validation middleware, the role/page authorization policy, and
//! the login/registration/password business logic.

pub mod handlers;
pub mod middleware;
pub mod models;
pub mod policy;
pub mod routes;
pub mod service;
