//! Password hashing and signed password-reset tokens.
//!
//! Tokens have the form `base64url(claims) "." base64url(hmac_sha256(claims))`.
//! The claims bind the token to the user's password hash at issue time, so a
//! successful reset invalidates every token issued before it.

use std::sync::Arc;

use argon2::password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use hmac::{Hmac, Mac};
use sea_orm::{ConnectionTrait, DatabaseConnection};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, instrument};

use crate::contract::model::User;
use crate::domain::error::DomainError;
use crate::domain::ports::Clock;
use crate::infra::storage::entity::user;
use crate::infra::storage::UsersDao;

type HmacSha256 = Hmac<Sha256>;

pub const RESET_PURPOSE: &str = "reset";

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
struct ResetClaims {
    sub: i64,
    purpose: String,
    exp: i64,
    fp: String,
}

/// Salted one-way hash of `plaintext`.
pub fn hash_password(plaintext: &str) -> Result<String, DomainError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plaintext.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| DomainError::validation("password", e.to_string()))
}

/// Constant-time check of `plaintext` against a stored hash. Unparseable
/// hashes never match.
pub fn verify_password(stored_hash: &str, plaintext: &str) -> bool {
    PasswordHash::new(stored_hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(plaintext.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

fn fingerprint(password_hash: &str) -> String {
    let digest = Sha256::digest(password_hash.as_bytes());
    hex::encode(&digest[..8])
}

#[derive(Clone)]
pub struct CredentialService {
    db: DatabaseConnection,
    secret: Arc<[u8]>,
    default_ttl_secs: u64,
    clock: Arc<dyn Clock>,
}

impl CredentialService {
    pub fn new(
        db: DatabaseConnection,
        secret: &str,
        default_ttl_secs: u64,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            db,
            secret: Arc::from(secret.as_bytes()),
            default_ttl_secs,
            clock,
        }
    }

    fn mac(&self) -> Option<HmacSha256> {
        HmacSha256::new_from_slice(&self.secret).ok()
    }

    fn sign(&self, payload_b64: &str) -> Result<String, DomainError> {
        let mut mac = self
            .mac()
            .ok_or_else(|| DomainError::validation("secret_key", "unusable signing key"))?;
        mac.update(payload_b64.as_bytes());
        Ok(URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes()))
    }

    #[instrument(name = "microblog.credentials.set_password", skip(self, plaintext))]
    pub async fn set_password(&self, user_id: i64, plaintext: &str) -> Result<(), DomainError> {
        self.set_password_in(&self.db, user_id, plaintext).await
    }

    pub(crate) async fn set_password_in<C: ConnectionTrait>(
        &self,
        conn: &C,
        user_id: i64,
        plaintext: &str,
    ) -> Result<(), DomainError> {
        if plaintext.is_empty() {
            return Err(DomainError::validation("password", "must not be empty"));
        }
        let hash = hash_password(plaintext)?;
        if !UsersDao::new(conn).set_password_hash(user_id, hash).await? {
            return Err(DomainError::user_not_found(user_id));
        }
        debug!("password updated");
        Ok(())
    }

    /// False for unknown users as well as wrong passwords.
    #[instrument(name = "microblog.credentials.check_password", skip(self, plaintext))]
    pub async fn check_password(&self, user_id: i64, plaintext: &str) -> Result<bool, DomainError> {
        Ok(UsersDao::new(&self.db)
            .find_by_id(user_id)
            .await?
            .map(|u| verify_password(&u.password_hash, plaintext))
            .unwrap_or(false))
    }

    /// Signed reset token for `user_id`, valid for `ttl_secs` (or the
    /// configured default).
    #[instrument(name = "microblog.credentials.issue_reset_token", skip(self))]
    pub async fn issue_reset_token(
        &self,
        user_id: i64,
        ttl_secs: Option<u64>,
    ) -> Result<String, DomainError> {
        let row = UsersDao::new(&self.db)
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| DomainError::user_not_found(user_id))?;
        self.token_for(&row, ttl_secs)
    }

    pub(crate) fn token_for(
        &self,
        row: &user::Model,
        ttl_secs: Option<u64>,
    ) -> Result<String, DomainError> {
        let ttl = i64::try_from(ttl_secs.unwrap_or(self.default_ttl_secs)).unwrap_or(i64::MAX);
        let claims = ResetClaims {
            sub: row.id,
            purpose: RESET_PURPOSE.to_string(),
            exp: self.clock.now().timestamp().saturating_add(ttl),
            fp: fingerprint(&row.password_hash),
        };
        let json = serde_json::to_vec(&claims)
            .map_err(|e| DomainError::validation("token", e.to_string()))?;
        let payload = URL_SAFE_NO_PAD.encode(json);
        let signature = self.sign(&payload)?;
        Ok(format!("{payload}.{signature}"))
    }

    /// The user a reset token resolves to, or `None` for any invalid token.
    /// Only store failures are errors.
    #[instrument(name = "microblog.credentials.verify_reset_token", skip_all)]
    pub async fn verify_reset_token(&self, token: &str) -> Result<Option<User>, DomainError> {
        Ok(self.resolve_token_in(&self.db, token).await?.map(Into::into))
    }

    pub(crate) async fn resolve_token_in<C: ConnectionTrait>(
        &self,
        conn: &C,
        token: &str,
    ) -> Result<Option<user::Model>, DomainError> {
        let Some(claims) = self.decode(token) else {
            debug!("reset token rejected");
            return Ok(None);
        };
        let Some(row) = UsersDao::new(conn).find_by_id(claims.sub).await? else {
            debug!("reset token subject no longer exists");
            return Ok(None);
        };
        if fingerprint(&row.password_hash) != claims.fp {
            debug!("reset token already used");
            return Ok(None);
        }
        Ok(Some(row))
    }

    /// Signature, shape, purpose and expiry checks. Deliberately silent about
    /// which one failed.
    fn decode(&self, token: &str) -> Option<ResetClaims> {
        let (payload, signature) = token.split_once('.')?;
        let signature = URL_SAFE_NO_PAD.decode(signature).ok()?;

        let mut mac = self.mac()?;
        mac.update(payload.as_bytes());
        mac.verify_slice(&signature).ok()?;

        let json = URL_SAFE_NO_PAD.decode(payload).ok()?;
        let claims: ResetClaims = serde_json::from_slice(&json).ok()?;
        if claims.purpose != RESET_PURPOSE || claims.exp <= self.clock.now().timestamp() {
            return None;
        }
        Some(claims)
    }
}
