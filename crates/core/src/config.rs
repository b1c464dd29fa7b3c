//! Client configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";

/// Renew this long before the access token expires.
pub const DEFAULT_RENEWAL_BUFFER: Duration = Duration::from_secs(5 * 60);

/// Endpoints and timing for one client instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientConfig {
	/// Base URL of the auth backend (`/api/auth/*`).
	#[serde(default = "default_base_url")]
	pub api_base_url: String,
	/// Base URL of the mash backend (`/api/mash/*`).
	#[serde(default = "default_base_url", alias = "MASH_SERVER_URL")]
	pub mash_base_url: String,
	#[serde(default = "default_renewal_buffer_secs")]
	pub renewal_buffer_secs: u64,
	/// Transport timeout. [`None`] leaves it to the transport's default.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub request_timeout_secs: Option<u64>,
}

fn default_base_url() -> String {
	DEFAULT_API_BASE_URL.to_string()
}

fn default_renewal_buffer_secs() -> u64 {
	DEFAULT_RENEWAL_BUFFER.as_secs()
}

impl Default for ClientConfig {
	fn default() -> Self {
		Self {
			api_base_url: default_base_url(),
			mash_base_url: default_base_url(),
			renewal_buffer_secs: default_renewal_buffer_secs(),
			request_timeout_secs: None,
		}
	}
}

impl ClientConfig {
	pub fn renewal_buffer(&self) -> Duration {
		Duration::from_secs(self.renewal_buffer_secs)
	}

	pub fn request_timeout(&self) -> Option<Duration> {
		self.request_timeout_secs.map(Duration::from_secs)
	}
}
