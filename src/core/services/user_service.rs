//! Registration, login, profile lookups and profile edits.

use chrono::{DateTime, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::{PasswordHasher, UserContext};
use crate::ledger::{Ledger, User};

use super::{required_text, ServiceError, ServiceResult};

const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone, PartialEq)]
pub struct UserProfile {
    pub user_id: Uuid,
    pub username: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub balance: f64,
}

/// Profile edit; `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct UserPatch {
    pub username: Option<String>,
    pub email: Option<String>,
}

pub struct UserService;

impl UserService {
    /// Registers a new user and returns a context for them.
    pub fn signup(
        ledger: &mut Ledger,
        hasher: &dyn PasswordHasher,
        username: &str,
        email: &str,
        password: &str,
    ) -> ServiceResult<UserContext> {
        let username = required_text(username, "Username")?;
        let email = required_text(email, "Email")?.to_ascii_lowercase();
        if password.is_empty() {
            return Err(ServiceError::Invalid("Password cannot be empty".into()));
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(ServiceError::Invalid(format!(
                "Password must be at least {} characters long",
                MIN_PASSWORD_LEN
            )));
        }
        if ledger.users.iter().any(|user| user.username == username) {
            return Err(ServiceError::Conflict("Username already exists".into()));
        }
        if ledger.users.iter().any(|user| user.email == email) {
            return Err(ServiceError::Conflict("Email already exists".into()));
        }

        let user = User::new(username, email, hasher.hash(password)?);
        info!(user_id = %user.id, username = %user.username, "registered user");
        let id = ledger.add_user(user);
        Ok(UserContext::new(id))
    }

    /// Verifies credentials given either the username or the email.
    pub fn login(
        ledger: &Ledger,
        hasher: &dyn PasswordHasher,
        identifier: &str,
        password: &str,
    ) -> ServiceResult<UserContext> {
        let identifier = identifier.trim();
        let user = ledger
            .users
            .iter()
            .find(|user| user.matches_identifier(identifier));
        match user {
            Some(user) if hasher.verify(password, &user.password_hash) => {
                Ok(UserContext::new(user.id))
            }
            _ => {
                warn!(identifier, "rejected login");
                Err(ServiceError::Unauthorized)
            }
        }
    }

    /// Renames the user or changes their email. Both must stay unique across
    /// the ledger; keeping the current value is not a clash.
    pub fn update_profile(
        ledger: &mut Ledger,
        ctx: &UserContext,
        patch: UserPatch,
    ) -> ServiceResult<UserProfile> {
        let user_id = ctx.user_id();
        let mut updated = ledger
            .user(user_id)
            .cloned()
            .ok_or_else(|| ServiceError::not_found("User"))?;

        if let Some(username) = &patch.username {
            let username = required_text(username, "Username")?;
            if taken_by_other(ledger, user_id, |user| user.username == username) {
                return Err(ServiceError::Conflict("Username already exists".into()));
            }
            updated.username = username;
        }
        if let Some(email) = &patch.email {
            let email = required_text(email, "Email")?.to_ascii_lowercase();
            if taken_by_other(ledger, user_id, |user| user.email == email) {
                return Err(ServiceError::Conflict("Email already exists".into()));
            }
            updated.email = email;
        }

        let slot = ledger
            .user_mut(user_id)
            .ok_or_else(|| ServiceError::not_found("User"))?;
        *slot = updated;
        ledger.touch();
        info!(%user_id, "updated user profile");
        Self::profile(ledger, ctx)
    }

    pub fn profile(ledger: &Ledger, ctx: &UserContext) -> ServiceResult<UserProfile> {
        let user = ledger
            .user(ctx.user_id())
            .ok_or_else(|| ServiceError::not_found("User"))?;
        Ok(UserProfile {
            user_id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            created_at: user.created_at,
            balance: ledger.balance_for(user.id),
        })
    }
}

fn taken_by_other(ledger: &Ledger, user_id: Uuid, clash: impl Fn(&User) -> bool) -> bool {
    ledger
        .users
        .iter()
        .any(|user| user.id != user_id && clash(user))
}
