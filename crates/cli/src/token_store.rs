//! On-disk session for the API client.
//!
//! Holds the bearer token and the user it belongs to in a small JSON file,
//! `.woo-bridge-session.json` unless `WOO_BRIDGE_TOKEN_FILE` says otherwise.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::client::ApiUser;

/// Default session file, relative to the working directory.
pub const DEFAULT_TOKEN_FILE: &str = ".woo-bridge-session.json";

#[derive(Debug, Error)]
pub enum TokenStoreError {
    #[error("session file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("session file {path} is not valid JSON: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Session {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    user: Option<ApiUser>,
}

/// File-backed token and user storage.
#[derive(Debug, Clone)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The stored bearer token, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn token(&self) -> Result<Option<String>, TokenStoreError> {
        Ok(self.load()?.token)
    }

    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn set_token(&self, token: &str) -> Result<(), TokenStoreError> {
        let mut session = self.load()?;
        session.token = Some(token.to_owned());
        self.save(&session)
    }

    /// The user recorded at login, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn stored_user(&self) -> Result<Option<ApiUser>, TokenStoreError> {
        Ok(self.load()?.user)
    }

    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn set_user(&self, user: &ApiUser) -> Result<(), TokenStoreError> {
        let mut session = self.load()?;
        session.user = Some(user.clone());
        self.save(&session)
    }

    /// Forget the token and user. A missing file is already clear.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists and cannot be removed.
    pub fn clear(&self) -> Result<(), TokenStoreError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(self.io_error(source)),
        }
    }

    fn load(&self) -> Result<Session, TokenStoreError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Session::default()),
            Err(source) => return Err(self.io_error(source)),
        };
        serde_json::from_str(&text).map_err(|source| TokenStoreError::Json {
            path: self.path.clone(),
            source,
        })
    }

    fn save(&self, session: &Session) -> Result<(), TokenStoreError> {
        let text = serde_json::to_string_pretty(session).map_err(|source| TokenStoreError::Json {
            path: self.path.clone(),
            source,
        })?;
        fs::write(&self.path, text).map_err(|source| self.io_error(source))
    }

    fn io_error(&self, source: io::Error) -> TokenStoreError {
        TokenStoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn temp_store() -> TokenStore {
        TokenStore::new(std::env::temp_dir().join(format!(
            "woo-bridge-session-{}.json",
            uuid::Uuid::new_v4()
        )))
    }

    fn user() -> ApiUser {
        ApiUser {
            id: 3,
            name: "Ada".to_owned(),
            email: "ada@example.com".to_owned(),
        }
    }

    #[test]
    fn test_empty_store_has_nothing() {
        let store = temp_store();
        assert_eq!(store.token().unwrap(), None);
        assert_eq!(store.stored_user().unwrap(), None);
        store.clear().unwrap();
    }

    #[test]
    fn test_token_and_user_persist() {
        let store = temp_store();
        store.set_token("1|abc").unwrap();
        store.set_user(&user()).unwrap();

        let reopened = TokenStore::new(store.path());
        assert_eq!(reopened.token().unwrap().as_deref(), Some("1|abc"));
        assert_eq!(reopened.stored_user().unwrap(), Some(user()));

        store.clear().unwrap();
        assert_eq!(reopened.token().unwrap(), None);
        assert!(!store.path().exists());
    }

    #[test]
    fn test_corrupt_file_is_reported() {
        let store = temp_store();
        fs::write(store.path(), "not json").unwrap();
        assert!(matches!(store.token(), Err(TokenStoreError::Json { .. })));
        store.clear().unwrap();
    }
}
