use std::path::{Path, PathBuf};
use std::sync::Arc;

use soot::{AuthenticatedClient, ClientConfig, JsonFileStore, ReqwestClient, SessionManager, SystemClock};
use tracing::debug;

use crate::cli::Cli;
use crate::config;
use crate::error::Result;

/// Everything a command needs, built once per invocation.
#[derive(Debug)]
pub struct CommandContext {
	config: ClientConfig,
	session_path: PathBuf,
	session: SessionManager,
}

impl CommandContext {
	pub fn build(cli: &Cli) -> Result<Self> {
		let config = config::resolve(cli)?;
		let session_path = cli.session.clone().unwrap_or_else(config::default_session_path);
		debug!(
			target = "soot.cli",
			api = %config.api_base_url,
			mash = %config.mash_base_url,
			session = %session_path.display(),
			"resolved context"
		);

		let http = Arc::new(ReqwestClient::new(config.request_timeout())?);
		let store = Arc::new(JsonFileStore::open(&session_path));
		let session = SessionManager::new(store, http, Arc::new(SystemClock), &config);

		Ok(Self {
			config,
			session_path,
			session,
		})
	}

	pub fn config(&self) -> &ClientConfig {
		&self.config
	}

	pub fn session_path(&self) -> &Path {
		&self.session_path
	}

	pub fn session(&self) -> &SessionManager {
		&self.session
	}

	pub fn client(&self) -> AuthenticatedClient {
		AuthenticatedClient::new(self.session.clone())
	}
}
