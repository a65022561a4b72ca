// Library root
// -----------
// This crate exposes a small library surface for the CLI. The binary
// (`main.rs`) uses these modules to implement the interactive CLI.
//
// Module responsibilities:
// - `config`: environment-driven settings (base URL, token file, timeouts).
// - `token`: the refresh-token file and the prompt used when it is missing.
// - `auth`: exchanges the refresh token for an access token, rotating the
//   stored token and re-prompting when the server rejects it.
// - `api`: authenticated GET/POST helpers and the scan endpoints.
// - `workflow`: batch download and analysis loops with their summary.
// - `workbook`: writes downloaded CSVs into one spreadsheet per patient.
// - `ui`: terminal menu and prompts, delegating to the modules above.
pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod token;
pub mod ui;
pub mod workbook;
pub mod workflow;

pub use api::{ApiClient, Scan, ScanId};
pub use config::Config;
pub use error::{ApiError, ApiResult};
pub use token::{TokenPrompt, TokenStore};
