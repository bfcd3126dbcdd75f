//! Credential hashing and the authenticated-user guard handed to services.

use pbkdf2::password_hash::{PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString};
use pbkdf2::{Params, Pbkdf2};
use uuid::Uuid;

use crate::core::services::{ServiceError, ServiceResult};
use crate::errors::FinanceError;
use crate::ledger::Ledger;

/// Opaque password hashing capability.
pub trait PasswordHasher: Send + Sync {
    fn hash(&self, password: &str) -> Result<String, FinanceError>;
    fn verify(&self, password: &str, stored: &str) -> bool;
}

/// PBKDF2-HMAC-SHA256 hasher storing credentials as PHC strings
/// (`$pbkdf2-sha256$i=...,l=32$salt$hash`).
#[derive(Debug, Clone, Copy)]
pub struct Pbkdf2PasswordHasher {
    rounds: u32,
}

impl Pbkdf2PasswordHasher {
    pub const DEFAULT_ROUNDS: u32 = 600_000;

    pub const fn with_rounds(rounds: u32) -> Self {
        Self { rounds }
    }

    pub fn rounds(&self) -> u32 {
        self.rounds
    }
}

/// Low round count so unit tests stay fast.
#[cfg(test)]
pub(crate) const TEST_HASHER: Pbkdf2PasswordHasher = Pbkdf2PasswordHasher::with_rounds(1_000);

impl Default for Pbkdf2PasswordHasher {
    fn default() -> Self {
        Self::with_rounds(Self::DEFAULT_ROUNDS)
    }
}

impl PasswordHasher for Pbkdf2PasswordHasher {
    fn hash(&self, password: &str) -> Result<String, FinanceError> {
        let salt = SaltString::encode_b64(Uuid::new_v4().as_bytes())
            .map_err(|err| FinanceError::Credential(err.to_string()))?;
        let params = Params {
            rounds: self.rounds,
            output_length: 32,
        };
        let hash = Pbkdf2
            .hash_password_customized(password.as_bytes(), None, None, params, &salt)
            .map_err(|err| FinanceError::Credential(err.to_string()))?;
        Ok(hash.to_string())
    }

    /// Rounds are read from the stored hash, so credentials created with a
    /// different round count still verify.
    fn verify(&self, password: &str, stored: &str) -> bool {
        match PasswordHash::new(stored) {
            Ok(parsed) => Pbkdf2.verify_password(password.as_bytes(), &parsed).is_ok(),
            Err(_) => false,
        }
    }
}

/// Proof that the caller is a known user. Every user-scoped service operation
/// requires one; the request layer builds it from its session before calling in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserContext {
    user_id: Uuid,
}

impl UserContext {
    /// Resolves the session's user id against the ledger.
    pub fn authenticate(ledger: &Ledger, user_id: Option<Uuid>) -> ServiceResult<Self> {
        let user_id = user_id.ok_or(ServiceError::Unauthorized)?;
        ledger
            .user(user_id)
            .map(|user| Self::new(user.id))
            .ok_or(ServiceError::Unauthorized)
    }

    pub(crate) fn new(user_id: Uuid) -> Self {
        Self { user_id }
    }

    pub fn user_id(&self) -> Uuid {
        self.user_id
    }
}
