//! Signed token for local-storage object URLs.
//!
//! Token = base64url(expiry_ts (u64 BE) || HMAC-SHA256(secret, expiry_ts || bucket || 0x00 || path)).
//! The bucket and path travel in the URL, so only the expiry is embedded.

use base64::Engine;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use thiserror::Error;

const EXPIRY_LEN: usize = 8;
const MAC_LEN: usize = 32; // SHA256
const TOKEN_LEN: usize = EXPIRY_LEN + MAC_LEN;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("Invalid signed URL token")]
    Invalid,
    #[error("Signed URL has expired")]
    Expired,
}

fn mac_for(secret: &[u8], expiry: &[u8], bucket: &str, path: &str) -> Result<Hmac<Sha256>, TokenError> {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret).map_err(|_| TokenError::Invalid)?;
    mac.update(expiry);
    mac.update(bucket.as_bytes());
    mac.update(&[0]);
    mac.update(path.as_bytes());
    Ok(mac)
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Build a token granting read access to `bucket/path` for `expires_in`.
pub fn create(bucket: &str, path: &str, expires_in: Duration, secret: &[u8]) -> Result<String, TokenError> {
    let expiry_ts = now_secs().saturating_add(expires_in.as_secs());
    let expiry = expiry_ts.to_be_bytes();
    let tag = mac_for(secret, &expiry, bucket, path)?.finalize().into_bytes();

    let mut token_bytes = [0u8; TOKEN_LEN];
    token_bytes[..EXPIRY_LEN].copy_from_slice(&expiry);
    token_bytes[EXPIRY_LEN..].copy_from_slice(&tag);

    Ok(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(token_bytes))
}

/// Verify a token for `bucket/path`.
pub fn verify(token: &str, bucket: &str, path: &str, secret: &[u8]) -> Result<(), TokenError> {
    let decoded = base64::engine::general_purpose::URL_SAFE_NO_PAD
        .decode(token)
        .map_err(|_| TokenError::Invalid)?;
    if decoded.len() != TOKEN_LEN {
        return Err(TokenError::Invalid);
    }
    let (expiry, tag) = decoded.split_at(EXPIRY_LEN);
    mac_for(secret, expiry, bucket, path)?
        .verify_slice(tag)
        .map_err(|_| TokenError::Invalid)?;

    let mut expiry_bytes = [0u8; EXPIRY_LEN];
    expiry_bytes.copy_from_slice(expiry);
    if now_secs() > u64::from_be_bytes(expiry_bytes) {
        return Err(TokenError::Expired);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"0123456789abcdef0123456789abcdef";

    #[test]
    fn token_verifies_for_same_object() {
        let token = create("user-uploads", "u/p/a.png", Duration::from_secs(60), SECRET).unwrap();
        assert_eq!(verify(&token, "user-uploads", "u/p/a.png", SECRET), Ok(()));
    }

    #[test]
    fn token_is_bound_to_path_and_bucket() {
        let token = create("user-uploads", "u/p/a.png", Duration::from_secs(60), SECRET).unwrap();
        assert_eq!(
            verify(&token, "user-uploads", "u/p/b.png", SECRET),
            Err(TokenError::Invalid)
        );
        assert_eq!(
            verify(&token, "generated-videos", "u/p/a.png", SECRET),
            Err(TokenError::Invalid)
        );
        assert_eq!(
            verify(&token, "user-uploads", "u/p/a.png", b"another-secret"),
            Err(TokenError::Invalid)
        );
    }

    #[test]
    fn garbage_is_rejected() {
        assert_eq!(verify("not-a-token", "b", "p", SECRET), Err(TokenError::Invalid));
        assert_eq!(verify("", "b", "p", SECRET), Err(TokenError::Invalid));
    }

    #[test]
    fn expired_token_is_rejected() {
        let expiry = (now_secs() - 10).to_be_bytes();
        let tag = mac_for(SECRET, &expiry, "b", "p").unwrap().finalize().into_bytes();
        let mut bytes = expiry.to_vec();
        bytes.extend_from_slice(&tag);
        let token = base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes);
        assert_eq!(verify(&token, "b", "p", SECRET), Err(TokenError::Expired));
    }
}
