//! Token-based authentication.
//!
//! Passwords are stored as salted sha256 digests. Login sessions are opaque
//! bearer tokens: the plaintext goes to the client once, only its hash is
//! persisted, and every session carries an expiry.

use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use sha2::{Digest, Sha256};

use tasktalk_memory::SessionStore;
use tasktalk_schema::Session;

/// Default session lifetime: 30 minutes.
pub const DEFAULT_TOKEN_TTL_SECS: i64 = 30 * 60;

/// Generate a fresh random hex salt.
pub fn generate_salt() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Salted password digest: hex(sha256(salt || password)).
pub fn hash_password(password: &str, salt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

pub fn verify_password(password: &str, salt: &str, expected_hash: &str) -> bool {
    hash_password(password, salt) == expected_hash
}

/// Hash a bearer token for storage/lookup.
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

/// A freshly issued session token. The plaintext exists only in this value.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Issues, verifies and revokes bearer tokens against a session store.
#[derive(Clone)]
pub struct TokenManager {
    sessions: Arc<dyn SessionStore>,
    ttl: Duration,
}

impl TokenManager {
    pub fn new(sessions: Arc<dyn SessionStore>, ttl_secs: i64) -> Self {
        Self {
            sessions,
            ttl: Duration::seconds(ttl_secs),
        }
    }

    /// Issue a new token for `user_id`.
    pub async fn issue(&self, user_id: &str) -> Result<IssuedToken> {
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        let token = hex::encode(bytes);

        let now = Utc::now();
        let expires_at = now + self.ttl;
        self.sessions
            .insert_session(Session {
                token_hash: hash_token(&token),
                user_id: user_id.to_string(),
                created_at: now,
                expires_at,
            })
            .await?;

        Ok(IssuedToken { token, expires_at })
    }

    /// Resolve a token to its user id. Expired sessions are deleted on sight
    /// and treated as absent.
    pub async fn verify(&self, token: &str) -> Result<Option<String>> {
        let token_hash = hash_token(token);
        let Some(session) = self.sessions.find_session(&token_hash).await? else {
            return Ok(None);
        };

        if session.expires_at <= Utc::now() {
            self.sessions.delete_session(&token_hash).await?;
            return Ok(None);
        }

        Ok(Some(session.user_id))
    }

    /// Revoke a token. Returns true if a session existed.
    pub async fn revoke(&self, token: &str) -> Result<bool> {
        Ok(self.sessions.delete_session(&hash_token(token)).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tasktalk_memory::SqliteStore;

    fn manager(ttl_secs: i64) -> TokenManager {
        let store = Arc::new(SqliteStore::open_in_memory().unwrap());
        TokenManager::new(store, ttl_secs)
    }

    #[test]
    fn password_hashing_roundtrip() {
        let salt = generate_salt();
        let hash = hash_password("hunter2", &salt);

        assert!(verify_password("hunter2", &salt, &hash));
        assert!(!verify_password("hunter3", &salt, &hash));
        // A different salt yields a different digest for the same password.
        assert_ne!(hash, hash_password("hunter2", &generate_salt()));
    }

    #[test]
    fn salts_are_unique() {
        assert_ne!(generate_salt(), generate_salt());
    }

    #[tokio::test]
    async fn issued_token_verifies_to_its_user() {
        let manager = manager(DEFAULT_TOKEN_TTL_SECS);
        let issued = manager.issue("alice").await.unwrap();

        assert_eq!(
            manager.verify(&issued.token).await.unwrap().as_deref(),
            Some("alice")
        );
        assert!(manager.verify("not-a-token").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn expired_token_is_rejected_and_purged() {
        let manager = manager(-1);
        let issued = manager.issue("alice").await.unwrap();

        assert!(manager.verify(&issued.token).await.unwrap().is_none());
        // The dead session is gone, so revoking finds nothing.
        assert!(!manager.revoke(&issued.token).await.unwrap());
    }

    #[tokio::test]
    async fn revoked_token_stops_working() {
        let manager = manager(DEFAULT_TOKEN_TTL_SECS);
        let issued = manager.issue("alice").await.unwrap();

        assert!(manager.revoke(&issued.token).await.unwrap());
        assert!(manager.verify(&issued.token).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn tokens_are_independent() {
        let manager = manager(DEFAULT_TOKEN_TTL_SECS);
        let a = manager.issue("alice").await.unwrap();
        let b = manager.issue("bob").await.unwrap();
        assert_ne!(a.token, b.token);

        manager.revoke(&a.token).await.unwrap();
        assert_eq!(
            manager.verify(&b.token).await.unwrap().as_deref(),
            Some("bob")
        );
    }
}
