//! Product status on each side of the bridge.
//!
//! WooCommerce knows many statuses (`draft`, `pending`, `private`,
//! `publish`, ...) but callers may only send `draft` or `publish`. The local
//! mirror collapses everything into two values:
//!
//! | remote      | mirror      |
//! |-------------|-------------|
//! | `publish`   | `published` |
//! | anything else | `draft`   |

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// Status sent to WooCommerce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RemoteStatus {
    #[default]
    Draft,
    Publish,
}

impl RemoteStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Publish => "publish",
        }
    }
}

/// A status string outside the accepted set.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown status: {0}")]
pub struct UnknownStatus(pub String);

impl FromStr for RemoteStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(Self::Draft),
            "publish" => Ok(Self::Publish),
            other => Err(UnknownStatus(other.to_owned())),
        }
    }
}

impl fmt::Display for RemoteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status stored on a mirror row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "product_status", rename_all = "lowercase")
)]
#[serde(rename_all = "lowercase")]
pub enum MirrorStatus {
    #[default]
    Draft,
    Published,
}

impl MirrorStatus {
    /// Map any WooCommerce status string onto the mirror's two values.
    #[must_use]
    pub fn from_remote(status: &str) -> Self {
        if status == RemoteStatus::Publish.as_str() {
            Self::Published
        } else {
            Self::Draft
        }
    }

    #[must_use]
    pub const fn to_remote(self) -> RemoteStatus {
        match self {
            Self::Published => RemoteStatus::Publish,
            Self::Draft => RemoteStatus::Draft,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Published => "published",
        }
    }
}

impl From<RemoteStatus> for MirrorStatus {
    fn from(status: RemoteStatus) -> Self {
        match status {
            RemoteStatus::Publish => Self::Published,
            RemoteStatus::Draft => Self::Draft,
        }
    }
}

impl fmt::Display for MirrorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
