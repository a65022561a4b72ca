// Refresh-token persistence. The token lives in a single plaintext file and
// is rewritten after every successful refresh because the server rotates it.

use crate::error::{ApiError, ApiResult};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::info;

/// Source of a refresh token when none is stored, normally the user at a
/// terminal (see `ui::TerminalPrompt`).
pub trait TokenPrompt {
    /// Ask for a refresh token. `login_url` is where the user can get one.
    fn prompt_refresh_token(&mut self, login_url: &str) -> std::io::Result<String>;
}

#[derive(Debug, Clone)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        TokenStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the saved token. A missing or blank file yields `None`.
    pub fn load(&self) -> ApiResult<Option<String>> {
        match std::fs::read_to_string(&self.path) {
            Ok(data) => {
                let token = data.trim();
                if token.is_empty() {
                    return Ok(None);
                }
                info!("Loaded saved token from {}", self.path.display());
                Ok(Some(token.to_string()))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(self.io_error(e)),
        }
    }

    pub fn save(&self, token: &str) -> ApiResult<()> {
        std::fs::write(&self.path, token).map_err(|e| self.io_error(e))?;
        info!("Saved token to {}", self.path.display());
        Ok(())
    }

    /// Delete the token file. Deleting a file that is already gone is fine.
    pub fn clear(&self) -> ApiResult<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.io_error(e)),
        }
    }

    fn io_error(&self, source: std::io::Error) -> ApiError {
        ApiError::TokenFile {
            path: self.path.clone(),
            source,
        }
    }
}
