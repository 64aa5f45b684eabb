//! API module organizing all HTTP endpoint groups.
//!
//! Each submodule pairs a `handlers` file (request parsing, service calls,
//! response shaping) with a `routes` file (path wiring and middleware).

pub mod common;
pub mod global_settings;
pub mod groups;
pub mod messages;
pub mod tenants;
pub mod users;
