/// AES-GCM IV length in bytes (96 bits per NIST recommendation).
pub const AES_GCM_IV_LENGTH: usize = 12;

/// AES-GCM tag length in bytes (128 bits).
pub const AES_GCM_TAG_LENGTH: usize = 16;

/// AES key length in bytes (256 bits).
pub const AES_KEY_LENGTH: usize = 32;

/// JWK key type for symmetric keys.
pub const JWK_KTY_OCT: &str = "oct";

/// Pattern segment that matches any single key segment.
pub const WILDCARD: &str = "*";
