//! Short codes and hashing primitives.

use md5::{Digest, Md5};
use rand::Rng;

/// Alphabet used for short codes.
const SHORT_CODE_ALPHABET: &[u8; 62] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Generate a random short code of the given length.
pub fn short_code(len: usize) -> String {
    let mut rng = rand::rng();
    (0..len)
        .map(|_| SHORT_CODE_ALPHABET[rng.random_range(0..SHORT_CODE_ALPHABET.len())] as char)
        .collect()
}

/// md5 digest of the trimmed input, as raw bytes. Used for url-hash columns.
pub fn md5_bytes(input: &str) -> [u8; 16] {
    let mut hasher = Md5::new();
    hasher.update(input.trim().as_bytes());
    hasher.finalize().into()
}

/// md5 digest of the input as a lowercase hex string. Used for cache keys.
pub fn md5_hex(input: &str) -> String {
    hex::encode(md5_bytes(input))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_code_shape() {
        for _ in 0..32 {
            let code = short_code(7);
            assert_eq!(code.len(), 7);
            assert!(code.bytes().all(|b| b.is_ascii_alphanumeric()));
        }
    }

    #[test]
    fn md5_matches_known_vector() {
        // md5("https://example.com/") with surrounding whitespace trimmed
        assert_eq!(
            md5_hex("  https://example.com/  "),
            md5_hex("https://example.com/")
        );
        assert_eq!(md5_hex("abc"), "900150983cd24fb0d6963f7d28e17f72");
    }
}
