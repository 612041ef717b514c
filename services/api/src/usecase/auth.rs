//! Registration and login.
//!
//! Registration validation is strictly ordered and returns the FIRST failing
//! rule's message, so clients can rely on stable, specific feedback.

use argon2::password_hash::{SaltString, rand_core::OsRng};
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};

use cinelink_domain::user::UserRole;

use crate::domain::repository::UserRepository;
use crate::domain::types::{NewUser, User};
use crate::error::ApiError;

pub const MAX_USERNAME_LEN: usize = 50;
pub const MIN_PASSWORD_LEN: usize = 6;
pub const MAX_PASSWORD_LEN: usize = 15;

pub fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| anyhow::anyhow!("hash password: {e}").into())
}

pub fn verify_password(password: &str, hash: &str) -> bool {
    PasswordHash::new(hash)
        .and_then(|parsed| Argon2::default().verify_password(password.as_bytes(), &parsed))
        .is_ok()
}

/// Same shape as the classic `^[^\s@]+@[^\s@]+\.[^\s@]+$` check.
fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    let Some((host, tld)) = domain.rsplit_once('.') else {
        return false;
    };
    let clean = |s: &str| !s.is_empty() && !s.contains(['@', ' ', '\t', '\n']);
    clean(local) && clean(host) && clean(tld)
}

#[derive(Debug, Clone)]
pub struct RegisterInput {
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

/// First-failure-wins rule chain; the order is part of the API contract.
fn validate_registration(input: &RegisterInput) -> Result<(), ApiError> {
    let fail = |msg: &str| Err(ApiError::Validation(msg.to_owned()));

    if input.username.is_empty() || input.username.chars().count() >= MAX_USERNAME_LEN {
        return fail("Username must be less than 50 characters.");
    }
    if !is_valid_email(&input.email) {
        return fail("Invalid email format.");
    }
    let len = input.password.chars().count();
    if !(MIN_PASSWORD_LEN..=MAX_PASSWORD_LEN).contains(&len) {
        return fail("Password must be 6-15 characters long.");
    }
    if !input.password.chars().any(|c| c.is_ascii_uppercase()) {
        return fail("Password must contain at least one uppercase letter.");
    }
    if !input.password.chars().any(|c| c.is_ascii_lowercase()) {
        return fail("Password must contain at least one lowercase letter.");
    }
    if !input.password.chars().any(|c| c.is_ascii_digit()) {
        return fail("Password must contain at least one number.");
    }
    if !input.password.chars().any(|c| !c.is_alphanumeric()) {
        return fail("Password must contain at least one special character.");
    }
    if input.password != input.confirm_password {
        return fail("Passwords do not match.");
    }
    Ok(())
}

// ── Register ─────────────────────────────────────────────────────────────────

pub struct RegisterUseCase<R: UserRepository> {
    pub repo: R,
}

impl<R: UserRepository> RegisterUseCase<R> {
    pub async fn execute(&self, input: RegisterInput) -> Result<User, ApiError> {
        validate_registration(&input)?;
        if self.repo.username_exists(&input.username).await? {
            return Err(ApiError::UsernameTaken);
        }
        if self.repo.email_taken(&input.email, None).await? {
            return Err(ApiError::EmailTaken);
        }
        let password_hash = hash_password(&input.password)?;
        self.repo
            .create(NewUser {
                username: input.username,
                email: input.email,
                password_hash,
                role: UserRole::User,
            })
            .await
    }
}

// ── Login ────────────────────────────────────────────────────────────────────

pub struct LoginUseCase<R: UserRepository> {
    pub repo: R,
}

impl<R: UserRepository> LoginUseCase<R> {
    /// Unknown username and wrong password are indistinguishable to the
    /// caller: both come back as `InvalidCredentials`.
    pub async fn execute(&self, username: &str, password: &str) -> Result<User, ApiError> {
        if username.is_empty() || password.is_empty() {
            return Err(ApiError::Validation(
                "Username and password cannot be empty.".to_owned(),
            ));
        }
        let Some(user) = self.repo.find_by_username(username).await? else {
            return Err(ApiError::InvalidCredentials);
        };
        if !verify_password(password, &user.password_hash) {
            return Err(ApiError::InvalidCredentials);
        }
        Ok(user)
    }
}
