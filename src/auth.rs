// Refresh-token exchange. The server hands back a new access token plus a
// rotated refresh token; the rotated one replaces the stored token before the
// access token is handed to the caller.

use crate::error::{ApiError, ApiResult};
use crate::token::{TokenPrompt, TokenStore};
use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

pub const REFRESH_PATH: &str = "/api/token/refresh/";

/// Body returned by the refresh endpoint.
#[derive(Deserialize, Debug)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

/// Outcome of a single refresh attempt.
#[derive(Debug)]
pub enum Exchange {
    Granted(TokenPair),
    Rejected(StatusCode),
}

enum AuthState {
    HasToken(String),
    Prompt,
}

pub struct AuthClient {
    client: Client,
    refresh_url: String,
    login_url: String,
    store: TokenStore,
    timeout: Duration,
}

impl AuthClient {
    pub fn new(
        client: Client,
        base_url: &str,
        login_url: &str,
        store: TokenStore,
        timeout: Duration,
    ) -> Self {
        AuthClient {
            client,
            refresh_url: format!("{}{}", base_url, REFRESH_PATH),
            login_url: login_url.to_string(),
            store,
            timeout,
        }
    }

    pub fn store(&self) -> &TokenStore {
        &self.store
    }

    /// Return a fresh access token.
    ///
    /// Starts from the stored refresh token, or prompts when there is none.
    /// Each rejection deletes the stored token and prompts again; there is no
    /// retry limit, so the loop ends when the user supplies a valid token or
    /// the prompt itself fails. Network errors are returned as-is and leave
    /// the stored token alone.
    pub fn access_token(&self, prompt: &mut dyn TokenPrompt) -> ApiResult<String> {
        let mut state = match self.store.load()? {
            Some(token) => AuthState::HasToken(token),
            None => AuthState::Prompt,
        };

        loop {
            state = match state {
                AuthState::Prompt => {
                    let token = prompt
                        .prompt_refresh_token(&self.login_url)
                        .map_err(ApiError::Prompt)?;
                    let token = token.trim().to_string();
                    self.store.save(&token)?;
                    AuthState::HasToken(token)
                }
                AuthState::HasToken(token) => match self.exchange(&token)? {
                    Exchange::Granted(pair) => {
                        self.store.save(&pair.refresh)?;
                        return Ok(pair.access);
                    }
                    Exchange::Rejected(status) => {
                        warn!(
                            %status,
                            "Failed to get access token using refresh token, possibly expired"
                        );
                        self.store.clear()?;
                        AuthState::Prompt
                    }
                },
            };
        }
    }

    /// POST the refresh token once. Any non-200 status counts as a rejection.
    pub fn exchange(&self, refresh_token: &str) -> ApiResult<Exchange> {
        let res = self
            .client
            .post(&self.refresh_url)
            .form(&[("refresh", refresh_token)])
            .timeout(self.timeout)
            .send()
            .map_err(|source| ApiError::Transport {
                method: "POST",
                url: self.refresh_url.clone(),
                source,
            })?;

        let status = res.status();
        if status != StatusCode::OK {
            return Ok(Exchange::Rejected(status));
        }
        debug!("Refresh token accepted");
        let pair: TokenPair = res.json().map_err(|source| ApiError::Decode {
            url: self.refresh_url.clone(),
            source,
        })?;
        Ok(Exchange::Granted(pair))
    }
}
