//! User lifecycle: registration, credential checks, password reset,
//! verification, profile updates and deletion.
//!
//! `UserManager` is built per request around a [`UserRepository`] bound to
//! that request's database session. Side effects outside the database
//! (notifications, audit logs) go through [`UserHooks`].

use async_trait::async_trait;
use chrono::Duration;
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::password;
use crate::auth::tokens::{self, ResetClaims, VerifyClaims, RESET_PASSWORD_AUDIENCE, VERIFY_AUDIENCE};
use crate::config::AppConfig;
use crate::db::users::is_unique_violation;
use crate::db::{NewUser, UserChanges, UserRepository};
use crate::domain::{is_valid_email, User, UserCreate, UserUpdate};
use crate::error::AuthError;

/// Lifecycle callbacks. All default to doing nothing.
///
/// Hooks run after the database change they describe has been written;
/// they cannot veto or alter it.
#[async_trait]
pub trait UserHooks: Send + Sync {
    async fn on_after_register(&self, _user: &User) {}

    async fn on_after_login(&self, _user: &User) {}

    async fn on_after_update(&self, _user: &User, _changes: &UserChanges) {}

    async fn on_after_forgot_password(&self, _user: &User, _token: &str) {}

    async fn on_after_reset_password(&self, _user: &User) {}

    async fn on_after_request_verify(&self, _user: &User, _token: &str) {}

    async fn on_after_verify(&self, _user: &User) {}

    async fn on_before_delete(&self, _user: &User) {}

    async fn on_after_delete(&self, _user: &User) {}
}

/// Default hooks: log lifecycle events.
pub struct LoggingHooks;

#[async_trait]
impl UserHooks for LoggingHooks {
    async fn on_after_register(&self, user: &User) {
        tracing::info!("User {} has registered.", user.id);
    }

    async fn on_after_forgot_password(&self, user: &User, token: &str) {
        tracing::info!(
            "User {} has forgot their password. Reset token: {}",
            user.id,
            token
        );
    }

    async fn on_after_request_verify(&self, user: &User, token: &str) {
        tracing::info!(
            "Verification requested for user {}. Verification token: {}",
            user.id,
            token
        );
    }

    async fn on_after_verify(&self, user: &User) {
        tracing::info!("User {} has been verified.", user.id);
    }
}

/// Secrets and policy shared by every manager instance.
#[derive(Debug, Clone)]
pub struct ManagerSettings {
    pub reset_password_secret: String,
    pub verification_secret: String,
    pub token_lifetime: Duration,
    pub min_password_length: usize,
}

impl ManagerSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            reset_password_secret: config.secrets.reset_password.clone(),
            verification_secret: config.secrets.verification.clone(),
            token_lifetime: Duration::seconds(config.secrets.token_lifetime_seconds),
            min_password_length: config.users.min_password_length,
        }
    }
}

impl Default for ManagerSettings {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

pub struct UserManager {
    users: UserRepository,
    hooks: Arc<dyn UserHooks>,
    settings: Arc<ManagerSettings>,
}

impl UserManager {
    pub fn new(
        users: UserRepository,
        hooks: Arc<dyn UserHooks>,
        settings: Arc<ManagerSettings>,
    ) -> Self {
        Self {
            users,
            hooks,
            settings,
        }
    }

    pub fn hooks(&self) -> &dyn UserHooks {
        self.hooks.as_ref()
    }

    /// Check a password against the policy. `Err` carries the reason shown to the client.
    pub fn validate_password(&self, password: &str) -> Result<(), String> {
        let min = self.settings.min_password_length;
        if password.chars().count() < min {
            return Err(format!("Password should be at least {} characters", min));
        }
        Ok(())
    }

    pub fn get(&self, id: Uuid) -> Result<User, AuthError> {
        self.users.get(id)?.ok_or(AuthError::NotFound)
    }

    pub fn get_by_email(&self, email: &str) -> Result<Option<User>, AuthError> {
        Ok(self.users.get_by_email(email)?)
    }

    /// Register a new user. With `safe`, privilege flags in `input` are ignored.
    pub async fn create(&self, input: UserCreate, safe: bool) -> Result<User, AuthError> {
        if !is_valid_email(&input.email) {
            return Err(AuthError::InvalidEmail);
        }
        self.validate_password(&input.password)
            .map_err(AuthError::RegisterInvalidPassword)?;

        if self.users.get_by_email(&input.email)?.is_some() {
            return Err(AuthError::UserAlreadyExists);
        }

        let hashed_password = hash(&input.password)?;
        let new_user = if safe {
            NewUser {
                email: input.email,
                hashed_password,
                is_active: true,
                is_superuser: false,
                is_verified: false,
            }
        } else {
            NewUser {
                email: input.email,
                hashed_password,
                is_active: input.is_active.unwrap_or(true),
                is_superuser: input.is_superuser.unwrap_or(false),
                is_verified: input.is_verified.unwrap_or(false),
            }
        };

        let user = match self.users.create(new_user) {
            Ok(user) => user,
            Err(e) if is_unique_violation(&e) => return Err(AuthError::UserAlreadyExists),
            Err(e) => return Err(e.into()),
        };

        self.hooks.on_after_register(&user).await;
        Ok(user)
    }

    /// Check credentials. Returns the user when the password matches,
    /// whether or not the account is active.
    pub fn authenticate(&self, email: &str, password: &str) -> Result<Option<User>, AuthError> {
        let Some(user) = self.users.get_by_email(email)? else {
            // Spend the same time as a real check so unknown emails are not distinguishable.
            let _ = password::hash_password(password);
            return Ok(None);
        };

        if password::verify_password(password, &user.hashed_password) {
            Ok(Some(user))
        } else {
            Ok(None)
        }
    }

    /// Issue a password-reset token for `user` and hand it to the hooks.
    pub async fn forgot_password(&self, user: &User) -> Result<(), AuthError> {
        if !user.is_active {
            return Err(AuthError::UserInactive);
        }

        let claims = ResetClaims {
            sub: user.id.to_string(),
            password_fgpt: password::fingerprint(&user.hashed_password),
            aud: RESET_PASSWORD_AUDIENCE.to_string(),
            exp: tokens::expires_in(self.settings.token_lifetime),
        };
        let token = tokens::encode(&claims, &self.settings.reset_password_secret)
            .map_err(|e| AuthError::Internal(e.to_string()))?;

        self.hooks.on_after_forgot_password(user, &token).await;
        Ok(())
    }

    /// Set a new password using a reset token.
    ///
    /// The token is bound to the password hash it was issued against, so it
    /// stops working once any password change has been made.
    pub async fn reset_password(&self, token: &str, new_password: &str) -> Result<User, AuthError> {
        let claims: ResetClaims =
            tokens::decode(token, &self.settings.reset_password_secret, RESET_PASSWORD_AUDIENCE)
                .map_err(|e| {
                    tracing::debug!("Rejected reset token: {}", e);
                    AuthError::ResetPasswordBadToken
                })?;

        let user_id =
            Uuid::parse_str(&claims.sub).map_err(|_| AuthError::ResetPasswordBadToken)?;
        let user = self
            .users
            .get(user_id)?
            .ok_or(AuthError::ResetPasswordBadToken)?;

        if claims.password_fgpt != password::fingerprint(&user.hashed_password) {
            return Err(AuthError::ResetPasswordBadToken);
        }
        if !user.is_active {
            return Err(AuthError::UserInactive);
        }

        self.validate_password(new_password)
            .map_err(AuthError::ResetPasswordInvalidPassword)?;

        let changes = UserChanges {
            hashed_password: Some(hash(new_password)?),
            ..Default::default()
        };
        let user = self.users.update(&user, changes)?;

        self.hooks.on_after_reset_password(&user).await;
        Ok(user)
    }

    /// Issue a verification token for `user` and hand it to the hooks.
    pub async fn request_verify(&self, user: &User) -> Result<(), AuthError> {
        if !user.is_active {
            return Err(AuthError::UserInactive);
        }
        if user.is_verified {
            return Err(AuthError::UserAlreadyVerified);
        }

        let claims = VerifyClaims {
            sub: user.id.to_string(),
            email: user.email.clone(),
            aud: VERIFY_AUDIENCE.to_string(),
            exp: tokens::expires_in(self.settings.token_lifetime),
        };
        let token = tokens::encode(&claims, &self.settings.verification_secret)
            .map_err(|e| AuthError::Internal(e.to_string()))?;

        self.hooks.on_after_request_verify(user, &token).await;
        Ok(())
    }

    /// Mark the user named by a verification token as verified.
    pub async fn verify(&self, token: &str) -> Result<User, AuthError> {
        let claims: VerifyClaims =
            tokens::decode(token, &self.settings.verification_secret, VERIFY_AUDIENCE)
                .map_err(|_| AuthError::VerifyBadToken)?;

        let user_id = Uuid::parse_str(&claims.sub).map_err(|_| AuthError::VerifyBadToken)?;
        let user = self.users.get(user_id)?.ok_or(AuthError::VerifyBadToken)?;

        if !user.email.eq_ignore_ascii_case(&claims.email) {
            return Err(AuthError::VerifyBadToken);
        }
        if user.is_verified {
            return Err(AuthError::UserAlreadyVerified);
        }

        let changes = UserChanges {
            is_verified: Some(true),
            ..Default::default()
        };
        let user = self.users.update(&user, changes)?;

        self.hooks.on_after_verify(&user).await;
        Ok(user)
    }

    /// Apply a profile update. With `safe`, only email and password may change.
    ///
    /// Changing the email clears `is_verified` unless the update sets it explicitly.
    pub async fn update(&self, update: UserUpdate, user: &User, safe: bool) -> Result<User, AuthError> {
        let update = if safe { update.into_safe() } else { update };
        let mut changes = UserChanges::default();

        if let Some(email) = update.email {
            if email != user.email {
                if !is_valid_email(&email) {
                    return Err(AuthError::InvalidEmail);
                }
                if let Some(existing) = self.users.get_by_email(&email)? {
                    if existing.id != user.id {
                        return Err(AuthError::UpdateEmailAlreadyExists);
                    }
                }
                changes.email = Some(email);
                changes.is_verified = Some(false);
            }
        }

        if let Some(new_password) = update.password {
            self.validate_password(&new_password)
                .map_err(AuthError::UpdateInvalidPassword)?;
            changes.hashed_password = Some(hash(&new_password)?);
        }

        if update.is_active.is_some() {
            changes.is_active = update.is_active;
        }
        if update.is_superuser.is_some() {
            changes.is_superuser = update.is_superuser;
        }
        if update.is_verified.is_some() {
            changes.is_verified = update.is_verified;
        }

        if changes.is_empty() {
            return Ok(user.clone());
        }

        let updated = match self.users.update(user, changes.clone()) {
            Ok(updated) => updated,
            Err(e) if is_unique_violation(&e) => return Err(AuthError::UpdateEmailAlreadyExists),
            Err(e) => return Err(e.into()),
        };

        self.hooks.on_after_update(&updated, &changes).await;
        Ok(updated)
    }

    pub async fn delete(&self, user: &User) -> Result<(), AuthError> {
        self.hooks.on_before_delete(user).await;
        if !self.users.delete(user.id)? {
            return Err(AuthError::NotFound);
        }
        self.hooks.on_after_delete(user).await;
        Ok(())
    }
}

fn hash(password: &str) -> Result<String, AuthError> {
    password::hash_password(password).map_err(|e| AuthError::PasswordHash(e.to_string()))
}
