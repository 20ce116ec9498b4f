//! Hugging Face hub login
//!
//! Validates an access token against the hub and stores it where the hub
//! client used by fastembed picks it up for gated model downloads.

use std::fs;
use std::path::PathBuf;

use serde::Deserialize;

use crate::error::{IndexError, Result};

/// Default hub endpoint
pub const HF_ENDPOINT: &str = "https://huggingface.co";

#[derive(Debug, Deserialize)]
struct WhoAmI {
    name: Option<String>,
}

/// Token handshake with the model hub
#[derive(Debug, Clone)]
pub struct HubLogin {
    endpoint: String,
    token_path: PathBuf,
}

impl Default for HubLogin {
    fn default() -> Self {
        Self::new(HF_ENDPOINT, default_token_path())
    }
}

impl HubLogin {
    pub fn new(endpoint: impl Into<String>, token_path: impl Into<PathBuf>) -> Self {
        Self {
            endpoint: endpoint.into(),
            token_path: token_path.into(),
        }
    }

    /// Validate `token` and persist it for the hub client
    pub fn login(&self, token: &str) -> Result<()> {
        let url = format!("{}/api/whoami-v2", self.endpoint.trim_end_matches('/'));

        let response = ureq::get(&url)
            .set("Authorization", &format!("Bearer {token}"))
            .call()
            .map_err(|e| match e {
                ureq::Error::Status(code, _) => {
                    IndexError::authentication(format!("hub rejected token (HTTP {code})"))
                }
                other => IndexError::authentication(format!("hub unreachable: {other}")),
            })?;

        let who: WhoAmI = response
            .into_json()
            .map_err(|e| IndexError::authentication(format!("invalid whoami response: {e}")))?;

        self.store_token(token)?;

        log::info!(
            "Logged in to Hugging Face as {}",
            who.name.as_deref().unwrap_or("<unknown>")
        );
        Ok(())
    }

    fn store_token(&self, token: &str) -> Result<()> {
        if let Some(parent) = self.token_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.token_path, token)?;
        Ok(())
    }
}

/// `$HF_HOME/token`, falling back to `~/.cache/huggingface/token`
fn default_token_path() -> PathBuf {
    if let Some(hf_home) = std::env::var_os("HF_HOME") {
        return PathBuf::from(hf_home).join("token");
    }

    let home = std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));

    home.join(".cache").join("huggingface").join("token")
}
