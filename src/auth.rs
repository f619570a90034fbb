//! Feed tokens.
//!
//! A feed token is `base64url(HMAC-SHA1(SHA1(api_secret), message))` without
//! padding, where the message is the feed's concatenated slug and user id. The
//! service derives the same value to authorize feed-scoped requests.

use aws_lc_rs::{digest, hmac};
use base64ct::{Base64UrlUnpadded, Encoding};

pub trait Signer {
    fn sign(&self, message: &str) -> String;
}

#[derive(Clone)]
pub struct HmacSigner {
    key: hmac::Key,
}

impl HmacSigner {
    pub fn new(api_secret: &str) -> HmacSigner {
        let hashed_secret = digest::digest(&digest::SHA1_FOR_LEGACY_USE_ONLY, api_secret.as_bytes());
        HmacSigner {
            key: hmac::Key::new(hmac::HMAC_SHA1_FOR_LEGACY_USE_ONLY, hashed_secret.as_ref()),
        }
    }
}

impl Signer for HmacSigner {
    fn sign(&self, message: &str) -> String {
        let tag = hmac::sign(&self.key, message.as_bytes());
        Base64UrlUnpadded::encode_string(tag.as_ref())
    }
}

impl std::fmt::Debug for HmacSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HmacSigner").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::{HmacSigner, Signer};

    #[test]
    fn golden_token() {
        let signer = HmacSigner::new("test_secret");
        assert_eq!(signer.sign("some message"), "8SZVOYgCH6gy-ZjBTq_9vydr7TQ");
    }

    #[test]
    fn token_is_url_safe_and_unpadded() {
        let signer = HmacSigner::new("another secret");
        for message in ["flat1", "aggregated2", "notificationeric", ""] {
            let token = signer.sign(message);
            assert_eq!(token.len(), 27);
            assert!(!token.contains(['+', '/', '=']), "{token}");
            assert_eq!(token, signer.sign(message));
        }
    }
}
