//! Exported key format: `base64(JSON {kty: "oct", k, kid})`.
//!
//! `k` is the raw key as base64url (JWK convention). The outer string is
//! standard padded base64 so it can travel through environment variables.

use serde::{Deserialize, Serialize};

use crate::base64url::{base64_decode, base64_encode, base64url_decode, base64url_encode};
use crate::error::CryptoError;
use crate::key_material::KeyMaterial;
use crate::types::JWK_KTY_OCT;

/// Symmetric JWK as it appears inside an exported key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OctJwk {
    pub kty: String,
    pub k: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kid: Option<String>,
}

/// Export key material. `kid` overrides the material's own id when given.
///
/// # Errors
/// `InvalidKeyMaterial` when the override is empty, since such a key could
/// not be imported again.
pub fn export_key(material: &KeyMaterial, kid: Option<&str>) -> Result<String, CryptoError> {
    let kid = kid.unwrap_or(material.kid());
    if kid.is_empty() {
        return Err(CryptoError::InvalidKeyMaterial("kid is required"));
    }
    let jwk = OctJwk {
        kty: JWK_KTY_OCT.to_string(),
        k: base64url_encode(material.key_bytes()),
        kid: Some(kid.to_string()),
    };
    let json =
        serde_json::to_vec(&jwk).map_err(|e| CryptoError::SerializationError(e.to_string()))?;
    Ok(base64_encode(&json))
}

/// Import a key produced by [`export_key`].
///
/// # Errors
/// `InvalidKeyFormat` for anything that is not a base64 JSON `oct` JWK with a
/// non-empty `kid` and a 32-byte `k`.
pub fn import_key(exported: &str) -> Result<KeyMaterial, CryptoError> {
    let json = base64_decode(exported.trim())
        .map_err(|e| CryptoError::InvalidKeyFormat(format!("outer base64: {}", e)))?;
    let jwk: OctJwk = serde_json::from_slice(&json)
        .map_err(|e| CryptoError::InvalidKeyFormat(format!("JWK JSON: {}", e)))?;

    if jwk.kty != JWK_KTY_OCT {
        return Err(CryptoError::InvalidKeyFormat(format!(
            "expected kty \"oct\", got \"{}\"",
            jwk.kty
        )));
    }
    let kid = match jwk.kid {
        Some(kid) if !kid.is_empty() => kid,
        _ => return Err(CryptoError::InvalidKeyFormat("missing kid".into())),
    };

    // Accept standard base64 for `k` as well; some exporters do not use base64url.
    let key = base64url_decode(&jwk.k)
        .or_else(|_| base64_decode(&jwk.k))
        .map_err(|e| CryptoError::InvalidKeyFormat(format!("k: {}", e)))?;

    KeyMaterial::new(kid, &key).map_err(|e| CryptoError::InvalidKeyFormat(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn material() -> KeyMaterial {
        let key = hex::decode("000102030405060708090a0b0c0d0e0f101112131415161718191a1b1c1d1e1f")
            .unwrap();
        KeyMaterial::new("key-2024", &key).unwrap()
    }

    #[test]
    fn export_import_round_trip() {
        let m = material();
        let exported = export_key(&m, None).unwrap();
        assert_eq!(import_key(&exported).unwrap(), m);
    }

    #[test]
    fn generated_key_round_trip() {
        let m = KeyMaterial::generate("generated").unwrap();
        assert_eq!(import_key(&export_key(&m, None).unwrap()).unwrap(), m);
    }

    #[test]
    fn export_layout() {
        let exported = export_key(&material(), None).unwrap();
        let json: serde_json::Value =
            serde_json::from_slice(&base64_decode(&exported).unwrap()).unwrap();
        assert_eq!(json["kty"], "oct");
        assert_eq!(json["kid"], "key-2024");
        assert_eq!(
            base64url_decode(json["k"].as_str().unwrap()).unwrap(),
            material().key_bytes()
        );
    }

    #[test]
    fn export_kid_override() {
        let exported = export_key(&material(), Some("renamed")).unwrap();
        let imported = import_key(&exported).unwrap();
        assert_eq!(imported.kid(), "renamed");
        assert_eq!(imported.key_bytes(), material().key_bytes());
    }

    #[test]
    fn export_rejects_empty_kid_override() {
        let err = export_key(&material(), Some("")).unwrap_err();
        assert!(matches!(err, CryptoError::InvalidKeyMaterial(_)));
    }

    #[test]
    fn accepts_surrounding_whitespace() {
        let exported = format!("  {}\n", export_key(&material(), None).unwrap());
        assert_eq!(import_key(&exported).unwrap(), material());
    }

    #[test]
    fn accepts_standard_base64_k() {
        let jwk = serde_json::json!({
            "kty": "oct",
            "k": base64_encode(&[0xfb; 32]),
            "kid": "std",
        });
        let exported = base64_encode(jwk.to_string().as_bytes());
        assert_eq!(import_key(&exported).unwrap().key_bytes(), &[0xfb; 32]);
    }

    fn assert_invalid(exported: &str) {
        let err = import_key(exported).unwrap_err();
        assert!(
            matches!(err, CryptoError::InvalidKeyFormat(_)),
            "unexpected error: {err}"
        );
    }

    #[test]
    fn rejects_non_base64() {
        assert_invalid("%%% not base64 %%%");
    }

    #[test]
    fn rejects_non_json() {
        assert_invalid(&base64_encode(b"hello"));
    }

    #[test]
    fn rejects_wrong_kty() {
        let jwk = serde_json::json!({"kty": "EC", "k": base64url_encode(&[0; 32]), "kid": "x"});
        assert_invalid(&base64_encode(jwk.to_string().as_bytes()));
    }

    #[test]
    fn rejects_missing_kid() {
        let jwk = serde_json::json!({"kty": "oct", "k": base64url_encode(&[0; 32])});
        assert_invalid(&base64_encode(jwk.to_string().as_bytes()));
    }

    #[test]
    fn rejects_empty_kid() {
        let jwk = serde_json::json!({"kty": "oct", "k": base64url_encode(&[0; 32]), "kid": ""});
        assert_invalid(&base64_encode(jwk.to_string().as_bytes()));
    }

    #[test]
    fn rejects_wrong_key_length() {
        let jwk = serde_json::json!({"kty": "oct", "k": base64url_encode(&[0; 16]), "kid": "x"});
        assert_invalid(&base64_encode(jwk.to_string().as_bytes()));
    }
}
