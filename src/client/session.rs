use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, warn};

use crate::model::user::User;

pub const TOKEN_KEY: &str = "auth_token";
pub const USER_KEY: &str = "user_data";
pub const REFRESH_KEY: &str = "refresh_token";

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Failed to read session file: {message}")]
    Read { message: String },

    #[error("Failed to write session file: {message}")]
    Write { message: String },

    #[error("Invalid JSON format: {message}")]
    Json { message: String },
}

/// The signed in user together with the tokens issued for them. Deserializes
/// straight from a `/auth/login` or `/auth/signup` response body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub user: User,
    pub token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}

/// Key/value JSON file holding the current session, written atomically.
#[derive(Debug, Clone)]
pub struct SessionStore {
    file: PathBuf,
}

impl SessionStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { file: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.file
    }

    fn load(&self) -> Result<Map<String, Value>, SessionError> {
        if !self.file.exists() {
            return Ok(Map::new());
        }

        let content = fs::read_to_string(&self.file).map_err(|e| SessionError::Read {
            message: format!("{}: {}", self.file.display(), e),
        })?;

        if content.trim().is_empty() {
            return Ok(Map::new());
        }

        match serde_json::from_str::<Value>(&content) {
            Ok(Value::Object(entries)) => Ok(entries),
            Ok(_) => Err(SessionError::Json {
                message: "expected a JSON object".to_string(),
            }),
            Err(e) => Err(SessionError::Json {
                message: e.to_string(),
            }),
        }
    }

    fn write(&self, entries: &Map<String, Value>) -> Result<(), SessionError> {
        if let Some(parent) = self.file.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| SessionError::Write {
                message: format!("Failed to create directory {}: {}", parent.display(), e),
            })?;
        }

        let json = serde_json::to_string_pretty(entries).map_err(|e| SessionError::Json {
            message: e.to_string(),
        })?;

        let parent_dir = self
            .file
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let mut temp_file = NamedTempFile::new_in(parent_dir).map_err(|e| SessionError::Write {
            message: format!("Failed to create temp file: {}", e),
        })?;

        temp_file
            .write_all(json.as_bytes())
            .and_then(|_| temp_file.flush())
            .map_err(|e| SessionError::Write {
                message: format!("Failed to write temp file: {}", e),
            })?;

        // tokens are credentials
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            temp_file
                .as_file()
                .set_permissions(fs::Permissions::from_mode(0o600))
                .map_err(|e| SessionError::Write {
                    message: format!("Failed to set file permissions: {}", e),
                })?;
        }

        temp_file.persist(&self.file).map_err(|e| SessionError::Write {
            message: format!("Failed to persist temp file: {}", e),
        })?;

        Ok(())
    }

    /// Persists the session. The user is kept as a serialized string under
    /// its own key, next to the tokens.
    pub fn save(&self, session: &Session) -> Result<(), SessionError> {
        let mut entries = self.load().unwrap_or_default();

        let user_json = serde_json::to_string(&session.user).map_err(|e| SessionError::Json {
            message: e.to_string(),
        })?;

        entries.insert(TOKEN_KEY.to_string(), Value::String(session.token.clone()));
        entries.insert(USER_KEY.to_string(), Value::String(user_json));
        match &session.refresh_token {
            Some(refresh) => {
                entries.insert(REFRESH_KEY.to_string(), Value::String(refresh.clone()));
            }
            None => {
                entries.remove(REFRESH_KEY);
            }
        }

        self.write(&entries)?;
        debug!(path = %self.file.display(), user_id = session.user.id(), "Session saved");
        Ok(())
    }

    /// Restores the saved session. Missing keys or a corrupt file mean there is
    /// no session.
    pub fn restore(&self) -> Option<Session> {
        let entries = match self.load() {
            Ok(entries) => entries,
            Err(e) => {
                warn!(error = %e, "Ignoring unreadable session file");
                return None;
            }
        };

        let token = entries.get(TOKEN_KEY)?.as_str()?.to_string();
        let user_json = entries.get(USER_KEY)?.as_str()?;
        let refresh_token = entries
            .get(REFRESH_KEY)
            .and_then(Value::as_str)
            .map(String::from);

        match serde_json::from_str::<User>(user_json) {
            Ok(user) => Some(Session {
                user,
                token,
                refresh_token,
            }),
            Err(e) => {
                warn!(error = %e, "Ignoring corrupt user data in session file");
                None
            }
        }
    }

    /// Removes the session keys, leaving anything else in the file alone.
    pub fn clear(&self) -> Result<(), SessionError> {
        let mut entries = match self.load() {
            Ok(entries) => entries,
            Err(SessionError::Json { .. }) => Map::new(),
            Err(e) => return Err(e),
        };

        let had_session = [TOKEN_KEY, USER_KEY, REFRESH_KEY]
            .iter()
            .fold(false, |removed, key| entries.remove(*key).is_some() || removed);

        if had_session || self.file.exists() {
            self.write(&entries)?;
        }
        debug!(path = %self.file.display(), "Session cleared");
        Ok(())
    }
}
