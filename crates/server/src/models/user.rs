//! API accounts.

use chrono::{DateTime, Utc};
use serde::Serialize;

use woo_bridge_core::{Email, UserId};

/// An API account. The password hash is never part of this type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: Email,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insert parameters for a new account.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: Email,
    /// Argon2id PHC string.
    pub password_hash: String,
}
