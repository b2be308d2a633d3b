//! Authentication service.
//!
//! Password accounts with personal access tokens. A token handed to a client
//! looks like `{id}|{secret}`; only the SHA-256 of the secret is stored, keyed
//! by the token id.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use rand::Rng;
use rand::distr::Alphanumeric;
use serde::Deserialize;
use sha2::{Digest, Sha256};

use woo_bridge_core::{Email, EmailError, TokenId, ValidationErrors};

use crate::db::{RepositoryError, UserStore};
use crate::models::user::{NewUser, User};

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Maximum length of a display name.
const MAX_NAME_LENGTH: usize = 255;

/// Length of the random part of a token.
const TOKEN_SECRET_LENGTH: usize = 40;

/// Name recorded on tokens issued by register and login.
pub const DEFAULT_TOKEN_NAME: &str = "auth_token";

/// Body of `POST /register`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterInput {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub password_confirmation: Option<String>,
}

/// Body of `POST /login`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginInput {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// A user together with a freshly issued plaintext token.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub user: User,
    pub token: String,
}

/// Authentication service.
pub struct AuthService<'a> {
    users: &'a dyn UserStore,
}

impl<'a> AuthService<'a> {
    #[must_use]
    pub const fn new(users: &'a dyn UserStore) -> Self {
        Self { users }
    }

    /// Register a new account and issue its first token.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Validation` for bad input, including an email that
    /// is already registered.
    pub async fn register(&self, input: RegisterInput) -> Result<IssuedToken, AuthError> {
        let mut errors = ValidationErrors::new();

        let name = match input.name.as_deref().map(str::trim) {
            None | Some("") => {
                errors.add("name", "The name field is required.");
                None
            }
            Some(name) if name.chars().count() > MAX_NAME_LENGTH => {
                errors.add(
                    "name",
                    format!("The name field must not be greater than {MAX_NAME_LENGTH} characters."),
                );
                None
            }
            Some(name) => Some(name.to_owned()),
        };

        let email = match Email::parse(input.email.as_deref().unwrap_or_default()) {
            Ok(email) => Some(email),
            Err(EmailError::Empty) => {
                errors.add("email", "The email field is required.");
                None
            }
            Err(EmailError::TooLong { max }) => {
                errors.add(
                    "email",
                    format!("The email field must not be greater than {max} characters."),
                );
                None
            }
            Err(_) => {
                errors.add("email", "The email field must be a valid email address.");
                None
            }
        };

        let password = input.password.unwrap_or_default();
        if password.is_empty() {
            errors.add("password", "The password field is required.");
        } else if password.chars().count() < MIN_PASSWORD_LENGTH {
            errors.add(
                "password",
                format!("The password field must be at least {MIN_PASSWORD_LENGTH} characters."),
            );
        } else if input
            .password_confirmation
            .as_deref()
            .is_some_and(|confirmation| confirmation != password)
        {
            errors.add("password", "The password field confirmation does not match.");
        }

        let (Some(name), Some(email)) = (name, email) else {
            return Err(AuthError::Validation(errors));
        };
        errors.into_result(())?;

        let password_hash = hash_password(&password)?;

        let user = self
            .users
            .create(&NewUser {
                name,
                email,
                password_hash,
            })
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => {
                    let mut errors = ValidationErrors::new();
                    errors.add("email", "The email has already been taken.");
                    AuthError::Validation(errors)
                }
                other => AuthError::Repository(other),
            })?;

        tracing::info!(user_id = %user.id, "User registered");

        let token = self.issue_token(&user).await?;
        Ok(IssuedToken { user, token })
    }

    /// Check a password and issue a new token.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Validation` if a field is missing and
    /// `AuthError::InvalidCredentials` if the email/password is wrong.
    pub async fn login(&self, input: LoginInput) -> Result<IssuedToken, AuthError> {
        let mut errors = ValidationErrors::new();
        let email = input.email.unwrap_or_default();
        let password = input.password.unwrap_or_default();
        if email.trim().is_empty() {
            errors.add("email", "The email field is required.");
        }
        if password.is_empty() {
            errors.add("password", "The password field is required.");
        }
        errors.into_result(())?;

        let email = Email::parse(&email).map_err(|_| AuthError::InvalidCredentials)?;

        let (user, password_hash) = self
            .users
            .find_with_password(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(&password, &password_hash)?;

        let token = self.issue_token(&user).await?;
        Ok(IssuedToken { user, token })
    }

    /// Resolve a bearer token to its user.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Unauthenticated` for malformed or unknown tokens.
    pub async fn authenticate(&self, bearer: &str) -> Result<(User, TokenId), AuthError> {
        let (id, secret) = split_token(bearer).ok_or(AuthError::Unauthenticated)?;

        let user = self
            .users
            .find_by_token(id, &hash_token(secret))
            .await?
            .ok_or(AuthError::Unauthenticated)?;

        Ok((user, id))
    }

    /// Revoke the token used on the current request.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Repository` if the delete fails.
    pub async fn logout(&self, token_id: TokenId) -> Result<(), AuthError> {
        self.users.revoke_token(token_id).await?;
        Ok(())
    }

    async fn issue_token(&self, user: &User) -> Result<String, AuthError> {
        let secret = generate_secret();
        let id = self
            .users
            .create_token(user.id, DEFAULT_TOKEN_NAME, &hash_token(&secret))
            .await?;
        Ok(format!("{id}|{secret}"))
    }
}

/// Split `{id}|{secret}` into its parts.
fn split_token(bearer: &str) -> Option<(TokenId, &str)> {
    let (id, secret) = bearer.trim().split_once('|')?;
    if secret.is_empty() {
        return None;
    }
    Some((id.parse().ok()?, secret))
}

fn generate_secret() -> String {
    rand::rng()
        .sample_iter(Alphanumeric)
        .take(TOKEN_SECRET_LENGTH)
        .map(char::from)
        .collect()
}

/// Hex-encoded SHA-256 of a token secret.
#[must_use]
pub fn hash_token(secret: &str) -> String {
    hex::encode(Sha256::digest(secret.as_bytes()))
}

/// Hash a password using Argon2id.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}
