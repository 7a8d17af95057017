use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::api::{bob, hiro, ord};
use crate::error::Error;
use crate::fetch::FetchOptions;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Endpoints {
    pub hiro: String,
    pub ord: String,
    pub bob: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            hiro: hiro::DEFAULT_BASE_URL.to_string(),
            ord: ord::DEFAULT_BASE_URL.to_string(),
            bob: bob::DEFAULT_BASE_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchSettings {
    /// Concurrent page requests per round.
    pub width: usize,
    /// Page size for offset sources.
    pub limit: usize,
    /// 0 disables the per-round deadline.
    pub round_timeout_secs: u64,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            width: 5,
            limit: 50,
            round_timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub endpoints: Endpoints,
    #[serde(default)]
    pub fetch: FetchSettings,
    pub export_dir: Option<PathBuf>,
    #[serde(default)]
    pub wallets: Vec<String>,
    /// Where this config was loaded from; `save` writes back there.
    #[serde(skip)]
    path: Option<PathBuf>,
}

impl Config {
    /// Returns the config directory path (~/.config/teller on Linux)
    fn config_dir() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|p| p.join("teller"))
            .context("Could not determine config directory")
    }

    /// Returns the default config file path
    pub fn default_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load config from the default location
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::default_path()?)
    }

    /// Load config from `path`, or return defaults bound to `path` if it does not exist
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self {
                path: Some(path.to_path_buf()),
                ..Self::default()
            });
        }

        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {path:?}"))?;

        let mut config: Self = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file {path:?}"))?;
        config.path = Some(path.to_path_buf());

        if let Some(dup) = first_duplicate(&config.wallets) {
            return Err(Error::validation(format!("duplicate wallet {dup} in {path:?}")).into());
        }
        Ok(config)
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Save config to disk
    pub fn save(&self) -> Result<()> {
        let path = match &self.path {
            Some(path) => path.clone(),
            None => Self::default_path()?,
        };
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create config directory {dir:?}"))?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(&path, contents)
            .with_context(|| format!("Failed to write config to {path:?}"))?;

        Ok(())
    }

    /// Point one backend at a new base URL and persist
    pub fn set_endpoint(&mut self, name: &str, url: String) -> Result<()> {
        if url.trim().is_empty() {
            bail!("Endpoint URL cannot be empty");
        }
        match name {
            "hiro" => self.endpoints.hiro = url,
            "ord" => self.endpoints.ord = url,
            "bob" => self.endpoints.bob = url,
            other => bail!("Unknown endpoint '{other}' (expected hiro, ord or bob)"),
        }
        self.save()
    }

    /// Track a wallet principal and persist; duplicates are rejected
    pub fn add_wallet(&mut self, principal: String) -> Result<()> {
        if self.wallets.contains(&principal) {
            return Err(Error::validation(format!("wallet {principal} already exists")).into());
        }
        self.wallets.push(principal);
        self.save()
    }

    pub fn remove_wallet(&mut self, principal: &str) -> Result<()> {
        let before = self.wallets.len();
        self.wallets.retain(|w| w != principal);
        if self.wallets.len() == before {
            bail!("wallet {principal} not found");
        }
        self.save()
    }

    pub fn export_dir(&self) -> PathBuf {
        self.export_dir.clone().unwrap_or_else(|| PathBuf::from("."))
    }

    pub fn fetch_options(&self) -> FetchOptions {
        let timeout = (self.fetch.round_timeout_secs > 0)
            .then(|| Duration::from_secs(self.fetch.round_timeout_secs));
        FetchOptions::new(self.fetch.limit, self.fetch.width).with_round_timeout(timeout)
    }
}

fn first_duplicate(items: &[String]) -> Option<&str> {
    items
        .iter()
        .enumerate()
        .find(|(i, item)| items[..*i].contains(item))
        .map(|(_, item)| item.as_str())
}
