// API client module: a small blocking HTTP client that talks to the scan
// analysis service. Every request carries the bearer access token obtained
// through `auth::AuthClient` when the client is connected.

use crate::auth::AuthClient;
use crate::config::Config;
use crate::error::{ApiError, ApiResult};
use crate::token::{TokenPrompt, TokenStore};
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::info;

/// Authenticated API client: holds a reqwest blocking client, the base URL
/// of the service and the access token for this session.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    access_token: String,
    timeout: Duration,
    analysis_timeout: Duration,
}

/// A scan record as returned by `/scan/search/`. Only `id` is read; every
/// other field is kept as-is so it can be passed along untouched.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Scan {
    pub id: ScanId,
    #[serde(flatten)]
    pub fields: serde_json::Map<String, serde_json::Value>,
}

/// Scan identifiers come back as numbers but users type them as text, so
/// both forms are accepted.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum ScanId {
    Number(i64),
    Text(String),
}

impl fmt::Display for ScanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanId::Number(n) => write!(f, "{}", n),
            ScanId::Text(s) => f.write_str(s),
        }
    }
}

impl ApiClient {
    /// Authenticate against the service and return a ready client.
    ///
    /// Uses the refresh token in `config.token_file`, falling back to
    /// `prompt` when the file is missing or its token is rejected.
    pub fn connect(config: &Config, prompt: &mut dyn TokenPrompt) -> ApiResult<Self> {
        let client = build_http_client()?;
        let auth = AuthClient::new(
            client.clone(),
            &config.base_url,
            &config.login_url,
            TokenStore::new(config.token_file.clone()),
            config.timeout,
        );
        let access_token = auth.access_token(prompt)?;
        Ok(Self::from_parts(client, config, access_token))
    }

    /// Build a client around an access token the caller already holds.
    pub fn with_access_token(config: &Config, access_token: impl Into<String>) -> ApiResult<Self> {
        Ok(Self::from_parts(build_http_client()?, config, access_token.into()))
    }

    fn from_parts(client: Client, config: &Config, access_token: String) -> Self {
        ApiClient {
            client,
            base_url: config.base_url.clone(),
            access_token,
            timeout: config.timeout,
            analysis_timeout: config.analysis_timeout,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Authorization header for every request.
    fn auth_headers(&self) -> ApiResult<HeaderMap> {
        let mut headers = HeaderMap::new();
        let val = format!("Bearer {}", self.access_token);
        let val = HeaderValue::from_str(&val).map_err(|_| ApiError::InvalidAccessToken)?;
        headers.insert(AUTHORIZATION, val);
        Ok(headers)
    }

    /// GET `path` (relative to the base URL) with optional query pairs.
    pub fn get(&self, path: &str, query: &[(&str, &str)]) -> ApiResult<Response> {
        let url = format!("{}{}", self.base_url, path);
        let req = self.client.get(&url).query(query).timeout(self.timeout);
        self.send("GET", url, req)
    }

    /// POST to `path` with an optional JSON body.
    pub fn post(&self, path: &str, json: Option<&serde_json::Value>) -> ApiResult<Response> {
        self.post_with_timeout(path, json, self.timeout)
    }

    fn post_with_timeout(
        &self,
        path: &str,
        json: Option<&serde_json::Value>,
        timeout: Duration,
    ) -> ApiResult<Response> {
        let url = format!("{}{}", self.base_url, path);
        let mut req = self.client.post(&url).timeout(timeout);
        if let Some(body) = json {
            req = req.json(body);
        }
        self.send("POST", url, req)
    }

    fn send(&self, method: &'static str, url: String, req: RequestBuilder) -> ApiResult<Response> {
        let res = req
            .headers(self.auth_headers()?)
            .send()
            .map_err(|source| ApiError::Transport { method, url, source })?;
        if res.status() != StatusCode::OK {
            let status = res.status();
            let url = res.url().to_string();
            let body = res.text().unwrap_or_default();
            return Err(ApiError::Status {
                method,
                url,
                status,
                body,
            });
        }
        info!("[{}] {}", method, res.url());
        Ok(res)
    }

    /// All scans belonging to `patient_id`.
    pub fn search_scans(&self, patient_id: &str) -> ApiResult<Vec<Scan>> {
        let res = self.get("/scan/search/", &[("patient__id", patient_id)])?;
        let url = res.url().to_string();
        res.json().map_err(|source| ApiError::Decode { url, source })
    }

    /// Raw contents of a file stored with a scan. `path` may be a glob such
    /// as `patch_data_*mm.csv`; the server resolves it.
    pub fn scan_file(&self, scan_id: &str, path: &str) -> ApiResult<Vec<u8>> {
        let res = self.get(&format!("/scan/{}/file/", scan_id), &[("path", path)])?;
        let url = res.url().to_string();
        let bytes = res.bytes().map_err(|source| ApiError::Decode { url, source })?;
        Ok(bytes.to_vec())
    }

    /// Run (or re-run) analysis on a scan. Blocks until the server finishes,
    /// bounded by the analysis timeout.
    pub fn analyze(&self, scan_id: &str) -> ApiResult<()> {
        self.post_with_timeout(
            &format!("/analysis/{}/analyze/", scan_id),
            None,
            self.analysis_timeout,
        )?;
        Ok(())
    }
}

fn build_http_client() -> ApiResult<Client> {
    Client::builder().build().map_err(ApiError::Client)
}
