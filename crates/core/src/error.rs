//! Error types for the SOOT client.
//!
//! [`Error`] is the crate-wide failure type. [`RenewalFailure`] is kept
//! separate and [`Clone`] because one renewal outcome is shared by every caller
//! awaiting the same in-flight renewal.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
	/// No valid session exists; the user must sign in again.
	#[error("authentication required")]
	AuthRequired,

	/// A renewal was attempted and failed; the session has been cleared.
	#[error("authentication failed: {0}")]
	AuthFailed(#[from] RenewalFailure),

	/// The auth backend refused or mangled a login exchange.
	#[error("login rejected: {0}")]
	LoginRejected(String),

	/// A clipboard item carried a metadata representation that did not parse.
	#[error("malformed clipboard metadata in item {item}: {reason}")]
	MalformedMetadata { item: usize, reason: String },

	/// Transport-level failure (connect, TLS, reset, body read).
	#[error("network error: {0}")]
	Network(String),

	/// Non-success HTTP status where a success was required.
	#[error("{url} responded with HTTP {status}")]
	Status { status: u16, url: String },

	/// The host cannot read the clipboard at all.
	#[error("clipboard read is not supported: {0}")]
	UnsupportedEnvironment(String),

	/// The clipboard exists but the read failed (permission denied, bad snapshot).
	#[error("clipboard read failed: {0}")]
	Clipboard(String),

	#[error(transparent)]
	Store(#[from] StoreError),

	#[error(transparent)]
	Json(#[from] serde_json::Error),
}

/// Why a renewal did not produce a new access token.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenewalFailure {
	#[error("no refresh token stored")]
	MissingRefreshToken,

	#[error("renewal rejected with HTTP {0}")]
	Rejected(u16),

	#[error("renewal response carried no access token")]
	MissingAccessToken,

	#[error("renewal response was not valid JSON: {0}")]
	InvalidResponse(String),

	#[error("renewal request failed: {0}")]
	Transport(String),

	#[error("session store write failed: {0}")]
	Store(String),

	/// The session was logged out while the renewal was in flight.
	#[error("session ended while renewal was in flight")]
	Superseded,

	#[error("renewal task was interrupted")]
	Interrupted,
}

/// Failure of the persistent key-value store.
#[derive(Debug, Error)]
pub enum StoreError {
	#[error("session store I/O failed: {0}")]
	Io(#[from] std::io::Error),

	#[error("session store encoding failed: {0}")]
	Encode(#[from] serde_json::Error),
}

impl Error {
	/// Returns true if the caller should send the user back to the login surface.
	pub fn requires_login(&self) -> bool {
		matches!(self, Error::AuthRequired | Error::AuthFailed(_))
	}
}
