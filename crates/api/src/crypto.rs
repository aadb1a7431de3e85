//! Cryptographic helpers for authentication.
//!
//! - PBKDF2-SHA256 password hashing (600k iterations)
//! - HMAC-SHA256 JWT signing/verification for users and link shares
//! - random tokens for password resets, email confirmation and share hashes

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use hmac::{Hmac, Mac};
use pbkdf2::pbkdf2_hmac;
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::ServiceError;

const PBKDF2_ITERATIONS: u32 = 600_000;
const SALT_LEN: usize = 16;
const HASH_LEN: usize = 32;

// ── Password hashing ────────────────────────────────────────────────────────

/// Hash a password with PBKDF2-SHA256. Returns `(hash_hex, salt_hex)`.
pub fn hash_password(password: &str) -> Result<(String, String), ServiceError> {
    let mut salt = [0u8; SALT_LEN];
    getrandom::getrandom(&mut salt)
        .map_err(|e| ServiceError::Internal(format!("RNG failure: {e}")))?;

    let mut hash = [0u8; HASH_LEN];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), &salt, PBKDF2_ITERATIONS, &mut hash);

    Ok((hex::encode(hash), hex::encode(salt)))
}

/// Verify a password against a stored hash and salt (both hex-encoded).
pub fn verify_password(password: &str, hash_hex: &str, salt_hex: &str) -> bool {
    let Ok(salt) = hex::decode(salt_hex) else {
        return false;
    };
    let Ok(expected) = hex::decode(hash_hex) else {
        return false;
    };

    let mut hash = [0u8; HASH_LEN];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), &salt, PBKDF2_ITERATIONS, &mut hash);

    constant_time_eq(&hash, &expected)
}

// ── JWT (HMAC-SHA256) ───────────────────────────────────────────────────────

/// JWT header (always HS256).
const JWT_HEADER: &str = r#"{"alg":"HS256","typ":"JWT"}"#;

/// `type` claim of a token issued to a user.
pub const AUTH_TYPE_USER: u8 = 1;
/// `type` claim of a token issued for a link share.
pub const AUTH_TYPE_LINK_SHARE: u8 = 2;

/// Claims carried by every token. Link-share tokens leave `username` empty,
/// user tokens leave the share fields zeroed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    #[serde(rename = "type")]
    pub kind: u8,
    pub id: i64,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub username: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub hash: String,
    #[serde(default)]
    pub list_id: i64,
    #[serde(default)]
    pub right: i64,
    pub iat: u64,
    pub exp: u64,
}

/// Sign a JWT with the given claims. Returns the encoded JWT string.
pub fn sign_jwt(claims: &Claims, secret: &str) -> Result<String, ServiceError> {
    let header_b64 = URL_SAFE_NO_PAD.encode(JWT_HEADER.as_bytes());

    let payload = serde_json::to_vec(claims)
        .map_err(|e| ServiceError::Internal(format!("encode claims: {e}")))?;
    let payload_b64 = URL_SAFE_NO_PAD.encode(payload);

    let signing_input = format!("{header_b64}.{payload_b64}");
    let signature = hmac_sha256(secret.as_bytes(), signing_input.as_bytes());
    let sig_b64 = URL_SAFE_NO_PAD.encode(signature);

    Ok(format!("{signing_input}.{sig_b64}"))
}

/// Verify a JWT and return its claims if the signature and expiry are valid.
pub fn verify_jwt(token: &str, secret: &str, now_unix: u64) -> Result<Claims, ServiceError> {
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        return Err(ServiceError::Unauthorized("invalid JWT format".into()));
    }

    let signing_input = format!("{}.{}", parts[0], parts[1]);
    let expected_sig = hmac_sha256(secret.as_bytes(), signing_input.as_bytes());
    let actual_sig = URL_SAFE_NO_PAD
        .decode(parts[2])
        .map_err(|_| ServiceError::Unauthorized("invalid JWT signature encoding".into()))?;

    if !constant_time_eq(&expected_sig, &actual_sig) {
        return Err(ServiceError::Unauthorized("invalid JWT signature".into()));
    }

    let payload_bytes = URL_SAFE_NO_PAD
        .decode(parts[1])
        .map_err(|_| ServiceError::Unauthorized("invalid JWT payload encoding".into()))?;
    let claims: Claims = serde_json::from_slice(&payload_bytes)
        .map_err(|_| ServiceError::Unauthorized("invalid JWT payload".into()))?;

    if now_unix > claims.exp {
        return Err(ServiceError::Unauthorized("JWT expired".into()));
    }
    if claims.kind != AUTH_TYPE_USER && claims.kind != AUTH_TYPE_LINK_SHARE {
        return Err(ServiceError::Unauthorized("unknown token type".into()));
    }

    Ok(claims)
}

// ── Random tokens ───────────────────────────────────────────────────────────

const ALPHANUMERIC: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Generate a secure random token. Returns hex-encoded.
pub fn generate_token() -> Result<String, ServiceError> {
    let mut bytes = [0u8; 32];
    getrandom::getrandom(&mut bytes)
        .map_err(|e| ServiceError::Internal(format!("RNG failure: {e}")))?;
    Ok(hex::encode(bytes))
}

/// Random `[a-zA-Z0-9]` string of `len` characters.
pub fn random_string(len: usize) -> Result<String, ServiceError> {
    let mut bytes = vec![0u8; len];
    getrandom::getrandom(&mut bytes)
        .map_err(|e| ServiceError::Internal(format!("RNG failure: {e}")))?;
    Ok(bytes
        .iter()
        .map(|b| ALPHANUMERIC[*b as usize % ALPHANUMERIC.len()] as char)
        .collect())
}

// ── Internal ────────────────────────────────────────────────────────────────

fn hmac_sha256(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut mac = Hmac::<Sha256>::new_from_slice(key).expect("HMAC can take key of any size");
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_claims(exp: u64) -> Claims {
        Claims {
            kind: AUTH_TYPE_USER,
            id: 7,
            username: "user7".into(),
            hash: String::new(),
            list_id: 0,
            right: 0,
            iat: 1_000,
            exp,
        }
    }

    #[test]
    fn jwt_roundtrip() {
        let token = sign_jwt(&user_claims(2_000), "secret").unwrap();
        let claims = verify_jwt(&token, "secret", 1_500).unwrap();
        assert_eq!(claims, user_claims(2_000));
    }

    #[test]
    fn jwt_rejects_wrong_secret_and_expiry() {
        let token = sign_jwt(&user_claims(2_000), "secret").unwrap();
        assert!(verify_jwt(&token, "other", 1_500).is_err());
        assert!(verify_jwt(&token, "secret", 2_001).is_err());
        assert!(verify_jwt("a.b", "secret", 0).is_err());
    }

    #[test]
    fn link_share_claims_have_no_username() {
        let claims = Claims {
            kind: AUTH_TYPE_LINK_SHARE,
            id: 3,
            username: String::new(),
            hash: "abc".into(),
            list_id: 2,
            right: 1,
            iat: 0,
            exp: 10,
        };
        let json = serde_json::to_value(&claims).unwrap();
        assert_eq!(json["type"], 2);
        assert!(json.get("username").is_none());
    }

    #[test]
    fn password_hash_verifies() {
        let (hash, salt) = hash_password("12345678").unwrap();
        assert!(verify_password("12345678", &hash, &salt));
        assert!(!verify_password("1234567", &hash, &salt));
        assert!(!verify_password("12345678", "zz", &salt));
    }

    #[test]
    fn random_string_is_alphanumeric() {
        let s = random_string(40).unwrap();
        assert_eq!(s.len(), 40);
        assert!(s.chars().all(|c| c.is_ascii_alphanumeric()));
    }
}
