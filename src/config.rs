//! Configuration loaded from `hpod.toml`.
//!
//! Every field has a default, so the file is optional. The `HPOD_PASSWORD`
//! environment variable takes precedence over the file for the password.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::Deserialize;

use crate::hpod::{BackoffPolicy, ClientSettings};
use crate::transfer::DEFAULT_CHUNK_SIZE;
use crate::workflow::WorkflowSettings;

pub const DEFAULT_CONFIG_FILE: &str = "hpod.toml";
pub const PASSWORD_ENV: &str = "HPOD_PASSWORD";

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SubmitConfig {
    /// Overrides `https://{instance}/api/v2/`, mostly for staging servers.
    pub base_url: Option<String>,
    pub password: Option<String>,
    pub chunk_size: usize,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub initial_backoff_ms: u64,
    pub backoff_step_ms: u64,
    /// Interval at which backoff switches from `backoff_step_ms` to `backoff_coarse_step_ms`.
    pub backoff_knee_ms: u64,
    pub backoff_coarse_step_ms: u64,
    pub max_backoff_ms: Option<u64>,
    pub confirm_poll_interval_ms: u64,
    /// Unset means poll `print/committed` until it succeeds.
    pub max_confirm_polls: Option<u32>,
}

impl Default for SubmitConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            password: None,
            chunk_size: DEFAULT_CHUNK_SIZE,
            connect_timeout_secs: 10,
            request_timeout_secs: 120,
            initial_backoff_ms: 1000,
            backoff_step_ms: 1000,
            backoff_knee_ms: 5000,
            backoff_coarse_step_ms: 5000,
            max_backoff_ms: None,
            confirm_poll_interval_ms: 500,
            max_confirm_polls: None,
        }
    }
}

impl SubmitConfig {
    /// Loads `path` if given, otherwise `hpod.toml` in the current directory
    /// when present.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    Self::from_file(default_path)?
                } else {
                    Self::default()
                }
            }
        };

        if let Ok(password) = std::env::var(PASSWORD_ENV)
            && !password.is_empty()
        {
            config.password = Some(password);
        }

        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        toml::from_str(&contents).with_context(|| format!("invalid config {}", path.display()))
    }

    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            bail!("chunk_size must be greater than zero");
        }
        if self.initial_backoff_ms == 0 {
            bail!("initial_backoff_ms must be greater than zero");
        }
        if self.max_confirm_polls == Some(0) {
            bail!("max_confirm_polls must be at least 1 when set");
        }
        Ok(())
    }

    pub fn client_settings(&self) -> ClientSettings {
        ClientSettings {
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            backoff: BackoffPolicy {
                initial: Duration::from_millis(self.initial_backoff_ms),
                step: Duration::from_millis(self.backoff_step_ms),
                knee: Duration::from_millis(self.backoff_knee_ms),
                coarse_step: Duration::from_millis(self.backoff_coarse_step_ms),
                max: self.max_backoff_ms.map(Duration::from_millis),
            },
        }
    }

    pub fn workflow_settings(&self) -> WorkflowSettings {
        WorkflowSettings {
            chunk_size: self.chunk_size,
            confirm_poll_interval: Duration::from_millis(self.confirm_poll_interval_ms),
            max_confirm_polls: self.max_confirm_polls,
        }
    }
}
