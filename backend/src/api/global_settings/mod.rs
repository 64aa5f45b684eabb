//! Global settings endpoints: provider credentials and phone assignments.

pub mod handlers;
pub mod routes;
