//! Tray identifier generation.

use rand::Rng;

/// Length of generated identifiers.
pub const ID_LENGTH: usize = 12;

const ID_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Generates a random `[A-Z0-9]{12}` identifier.
///
/// StatusNotifierItem hosts key icons by id, so each process needs a
/// distinct one when the caller does not provide it.
pub fn generate_id() -> String {
    let mut rng = rand::thread_rng();
    (0..ID_LENGTH)
        .map(|_| char::from(ID_CHARSET[rng.gen_range(0..ID_CHARSET.len())]))
        .collect()
}
