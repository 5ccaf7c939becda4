//! Shared identifier generation for clients and rooms.

use rand::Rng;

/// Generates a 6-digit decimal identifier, uniform in `[100000, 999999]`.
///
/// Client ids and room ids share this scheme. Uniqueness among live ids is
/// not checked; at this scale a collision is an accepted risk.
pub fn six_digit_id() -> String {
    rand::thread_rng().gen_range(100_000..=999_999).to_string()
}
