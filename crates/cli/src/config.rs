//! Config resolution for the CLI host.
//!
//! Precedence, lowest first: built-in defaults, `config.json` (explicit
//! `--config` or the working directory), `SOOT_API_URL` / `SOOT_MASH_URL`,
//! then `--api-url` / `--mash-url`.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use soot::ClientConfig;
use tracing::debug;

use crate::cli::Cli;
use crate::error::{CliError, Result};

pub const CONFIG_FILE: &str = "config.json";
pub const API_URL_ENV: &str = "SOOT_API_URL";
pub const MASH_URL_ENV: &str = "SOOT_MASH_URL";

/// Loads the config file, or defaults when none is found.
///
/// An explicit path must exist. The implicit `./config.json` is optional, but
/// once present it must parse.
pub fn load_config(explicit: Option<&Path>) -> Result<ClientConfig> {
	let (path, required) = match explicit {
		Some(path) => (path.to_path_buf(), true),
		None => (PathBuf::from(CONFIG_FILE), false),
	};

	if !required && !path.exists() {
		debug!(target = "soot.cli", "no config file, using defaults");
		return Ok(ClientConfig::default());
	}

	read_config(&path).map_err(|source| CliError::Config { path, source })
}

fn read_config(path: &Path) -> anyhow::Result<ClientConfig> {
	let content = std::fs::read_to_string(path).context("read failed")?;
	let config = serde_json::from_str(&content).context("not a valid client config")?;
	debug!(target = "soot.cli", path = %path.display(), "loaded config");
	Ok(config)
}

/// Applies environment then flag overrides, in that order.
pub fn apply_overrides(
	mut config: ClientConfig,
	env: impl Fn(&str) -> Option<String>,
	api_url: Option<&str>,
	mash_url: Option<&str>,
) -> ClientConfig {
	if let Some(url) = env(API_URL_ENV).filter(|u| !u.is_empty()) {
		config.api_base_url = url;
	}
	if let Some(url) = env(MASH_URL_ENV).filter(|u| !u.is_empty()) {
		config.mash_base_url = url;
	}
	if let Some(url) = api_url {
		config.api_base_url = url.to_string();
	}
	if let Some(url) = mash_url {
		config.mash_base_url = url.to_string();
	}
	config
}

/// Fully resolved config for one invocation.
pub fn resolve(cli: &Cli) -> Result<ClientConfig> {
	let config = load_config(cli.config.as_deref())?;
	Ok(apply_overrides(
		config,
		|key| std::env::var(key).ok(),
		cli.api_url.as_deref(),
		cli.mash_url.as_deref(),
	))
}

/// Default session store location: `$XDG_CONFIG_HOME/soot/session.json`.
pub fn default_session_path() -> PathBuf {
	let config_home = std::env::var_os("XDG_CONFIG_HOME")
		.map(PathBuf::from)
		.or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))
		.unwrap_or_else(|| PathBuf::from("."));

	config_home.join("soot").join("session.json")
}
