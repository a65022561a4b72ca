#![allow(dead_code)]

use backscnr_cli::{Config, TokenPrompt};
use std::collections::VecDeque;
use std::io;
use std::path::PathBuf;

/// Unique token file path under the system temp dir.
pub fn scratch_token_file() -> PathBuf {
    std::env::temp_dir().join(format!("backscnr-test-{}.token", uuid::Uuid::new_v4()))
}

pub fn test_config(server: &mockito::ServerGuard) -> Config {
    Config::new(&server.url(), scratch_token_file())
}

/// Hands out pre-set tokens and counts how often it was asked.
pub struct ScriptedPrompt {
    tokens: VecDeque<String>,
    pub calls: usize,
    pub login_urls: Vec<String>,
}

impl ScriptedPrompt {
    pub fn new(tokens: &[&str]) -> Self {
        ScriptedPrompt {
            tokens: tokens.iter().map(|t| t.to_string()).collect(),
            calls: 0,
            login_urls: Vec::new(),
        }
    }
}

impl TokenPrompt for ScriptedPrompt {
    fn prompt_refresh_token(&mut self, login_url: &str) -> io::Result<String> {
        self.calls += 1;
        self.login_urls.push(login_url.to_string());
        self.tokens
            .pop_front()
            .ok_or_else(|| io::Error::new(io::ErrorKind::UnexpectedEof, "no more tokens"))
    }
}
