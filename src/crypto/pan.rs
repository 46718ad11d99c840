//! Card number generator
//!
//! Produces 16-digit numeric strings from the OS random source. No Luhn
//! checksum is applied; uniqueness is enforced through the stored
//! fingerprint instead.

use rand::rngs::OsRng;
use rand::Rng;

/// Length of a generated card number.
pub const PAN_LENGTH: usize = 16;

/// Generate a random 16-digit card number.
pub fn generate_pan() -> String {
    let mut rng = OsRng;
    let mut pan = String::with_capacity(PAN_LENGTH);
    for _ in 0..PAN_LENGTH {
        let digit: u8 = rng.gen_range(0..10);
        pan.push(char::from(b'0' + digit));
    }
    pan
}

/// Last four digits of a PAN, stored in clear for display masking.
///
/// Callers must pass a full card number; anything shorter than four
/// digits is a programming error upstream.
pub fn last_four(pan: &str) -> &str {
    debug_assert!(pan.len() >= 4, "PAN shorter than four digits");
    &pan[pan.len() - 4..]
}
