//! # Authentication & Sessions
//!
//! Credential storage (argon2), session tokens, and the account status gate.
//!
//! ## The status gate
//!
//! Verifying a password is necessary but not sufficient. After the
//! credential check passes, [`AuthService::login`] reads the account's
//! status; anything other than `Active` is rejected with
//! [`AuthError::AccountRestricted`] and **no session is created**. The gate
//! sits at the authorization boundary, so a suspended or closed account
//! cannot operate even though its credentials remain valid.
//!
//! The same rule applies for the lifetime of a session:
//! [`AuthService::authenticate`] re-reads the account on every request and
//! revokes the session the moment the account stops being `Active`.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::config;
use crate::model::{Account, AccountId, AccountStatus};
use crate::store::db::{dec, enc};
use crate::store::{BankDb, StoreError};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Unknown email or wrong password. Deliberately one variant — the
    /// login surface must not reveal which half failed.
    #[error("invalid email or password")]
    InvalidCredentials,

    /// Credentials were correct, but the account status forbids login.
    #[error("account is {status}")]
    AccountRestricted { status: AccountStatus },

    /// The presented token is unknown or was revoked.
    #[error("invalid session")]
    InvalidSession,

    /// The session outlived its TTL.
    #[error("session expired")]
    SessionExpired,

    /// Password hashing failed. Practically unreachable with valid config.
    #[error("password hashing error: {0}")]
    Hash(#[from] argon2::Error),

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// Stored login credentials for one account.
#[derive(Clone, Debug, Serialize, Deserialize)]
struct CredentialRecord {
    account_id: AccountId,
    email: String,
    /// argon2 encoded hash (parameters and salt embedded).
    password_hash: String,
}

/// A live session. Held in memory only — restarting the server logs
/// everyone out, which is the safe failure mode for a bank.
#[derive(Clone, Debug)]
pub struct Session {
    pub account_id: AccountId,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// AuthService
// ---------------------------------------------------------------------------

/// Credential verification and session issuance.
pub struct AuthService {
    db: BankDb,
    sessions: DashMap<String, Session>,
}

impl AuthService {
    pub fn new(db: BankDb) -> Self {
        Self {
            db,
            sessions: DashMap::new(),
        }
    }

    /// Stores credentials for a freshly opened account.
    pub fn register(
        &self,
        account_id: AccountId,
        email: &str,
        password: &str,
    ) -> Result<(), AuthError> {
        let mut salt = [0u8; 16];
        rand::thread_rng().fill_bytes(&mut salt);
        let password_hash =
            argon2::hash_encoded(password.as_bytes(), &salt, &argon2::Config::default())?;

        let record = CredentialRecord {
            account_id,
            email: email.to_lowercase(),
            password_hash,
        };
        self.db.put_credential_bytes(&account_id, enc(&record)?)?;
        Ok(())
    }

    /// Verifies credentials, applies the status gate, and issues a session.
    pub fn login(&self, email: &str, password: &str) -> Result<(String, Account), AuthError> {
        let account = self
            .db
            .get_account_by_email(email)?
            .ok_or(AuthError::InvalidCredentials)?;

        let record = self.credential(&account.id)?;
        if !argon2::verify_encoded(&record.password_hash, password.as_bytes())? {
            return Err(AuthError::InvalidCredentials);
        }

        // Status gate: correct password, but the account may not operate.
        // No session is created for a restricted account.
        if !account.is_active() {
            return Err(AuthError::AccountRestricted {
                status: account.status,
            });
        }

        let token = generate_token();
        let now = Utc::now();
        self.sessions.insert(
            token.clone(),
            Session {
                account_id: account.id,
                created_at: now,
                expires_at: now
                    + chrono::Duration::from_std(config::SESSION_TTL)
                        .unwrap_or_else(|_| chrono::Duration::hours(24)),
            },
        );

        Ok((token, account))
    }

    /// Resolves a session token to its account, enforcing expiry and the
    /// status gate. A session whose account is no longer `Active` is
    /// revoked on the spot.
    pub fn authenticate(&self, token: &str) -> Result<Account, AuthError> {
        let session = self
            .sessions
            .get(token)
            .map(|s| s.value().clone())
            .ok_or(AuthError::InvalidSession)?;

        if session.expires_at < Utc::now() {
            self.sessions.remove(token);
            return Err(AuthError::SessionExpired);
        }

        let account = match self.db.get_account(&session.account_id)? {
            Some(account) => account,
            None => {
                self.sessions.remove(token);
                return Err(AuthError::InvalidSession);
            }
        };

        if !account.is_active() {
            self.sessions.remove(token);
            return Err(AuthError::AccountRestricted {
                status: account.status,
            });
        }

        Ok(account)
    }

    /// Drops a session. Unknown tokens are a no-op.
    pub fn logout(&self, token: &str) {
        self.sessions.remove(token);
    }

    /// Re-hashes the password after verifying the current one.
    pub fn change_password(
        &self,
        account_id: AccountId,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        let record = self.credential(&account_id)?;
        if !argon2::verify_encoded(&record.password_hash, current_password.as_bytes())? {
            return Err(AuthError::InvalidCredentials);
        }
        self.register(account_id, &record.email, new_password)
    }

    /// Removes stored credentials and every live session for the account.
    /// Part of the admin hard-delete cascade.
    pub fn purge_account(&self, account_id: &AccountId) -> Result<(), AuthError> {
        self.db.remove_credentials(account_id)?;
        self.sessions.retain(|_, s| s.account_id != *account_id);
        Ok(())
    }

    /// Number of live (possibly expired-but-unswept) sessions.
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    fn credential(&self, account_id: &AccountId) -> Result<CredentialRecord, AuthError> {
        let bytes = self
            .db
            .get_credential_bytes(account_id)?
            .ok_or(AuthError::InvalidCredentials)?;
        Ok(dec(&bytes)?)
    }
}

/// 32 random bytes, hex-encoded. 64 characters on the wire.
fn generate_token() -> String {
    let mut bytes = vec![0u8; config::SESSION_TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
