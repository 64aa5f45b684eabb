//! Shared utility modules for the backend.

pub mod crypto;
pub mod jwt;

use rand::{Rng, distributions::Alphanumeric};

/// Generates a random alphanumeric string of the specified length.
///
/// Used for temporary passwords issued when an admin creates a user without
/// supplying one.
pub fn generate_random_string(length: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}
