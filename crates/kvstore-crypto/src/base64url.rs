//! The two base64 alphabets on the wire.
//!
//! Envelope `ciphertext`/`iv` and the outer exported-key string use standard
//! padded base64. Only the JWK `k` member uses unpadded base64url.

use base64ct::{Base64, Base64UrlUnpadded, Encoding};

/// Encode a JWK `k` member.
pub fn base64url_encode(data: &[u8]) -> String {
    Base64UrlUnpadded::encode_string(data)
}

pub fn base64url_decode(s: &str) -> Result<Vec<u8>, base64ct::Error> {
    Base64UrlUnpadded::decode_vec(s)
}

/// Encode an envelope field or an exported key.
pub fn base64_encode(data: &[u8]) -> String {
    Base64::encode_string(data)
}

pub fn base64_decode(s: &str) -> Result<Vec<u8>, base64ct::Error> {
    Base64::decode_vec(s)
}
