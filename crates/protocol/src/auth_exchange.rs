//! Protocol types for the token exchange with the auth backend.
//!
//! Two exchanges produce a session:
//!
//! 1. Login: client posts [`CodeExchangeRequest`] to [`LOGIN_PATH`]
//! 2. Renewal: client posts [`RefreshRequest`] to [`REFRESH_PATH`]
//!
//! Both answer with a [`TokenResponse`]. A response is only usable when it
//! carries a non-empty access token; see [`TokenResponse::access_token`].

use serde::{Deserialize, Serialize};

/// Path of the renewal endpoint, relative to the auth base URL.
pub const REFRESH_PATH: &str = "/api/auth/refresh";

/// Path of the authorization-code exchange endpoint.
pub const LOGIN_PATH: &str = "/api/auth/google";

/// Lifetime the backend assumes when a provider omits `expires_in`.
pub const DEFAULT_EXPIRES_IN_SECS: f64 = 3600.0;

/// Body of a renewal request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshRequest {
	/// Refresh token issued with the current session.
	pub refresh_token: String,
}

/// Body of a login request exchanging an OAuth authorization code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeExchangeRequest {
	/// Authorization code returned by the identity provider redirect.
	pub code: String,
}

/// Token bundle returned by both login and renewal.
///
/// Every field is optional on the wire so that a malformed response still
/// deserializes and can be rejected with a precise reason.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenResponse {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub access_token: Option<String>,
	/// Rotated refresh token. Absent when the provider keeps the old one.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub refresh_token: Option<String>,
	/// Lifetime of the access token in seconds.
	#[serde(default = "default_expires_in")]
	pub expires_in: f64,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub token_type: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub user_info: Option<UserInfo>,
}

fn default_expires_in() -> f64 {
	DEFAULT_EXPIRES_IN_SECS
}

impl TokenResponse {
	/// Returns the access token if present and non-empty.
	pub fn access_token(&self) -> Option<&str> {
		self.access_token.as_deref().filter(|t| !t.is_empty())
	}

	/// Returns the rotated refresh token if present and non-empty.
	pub fn refresh_token(&self) -> Option<&str> {
		self.refresh_token.as_deref().filter(|t| !t.is_empty())
	}

	/// Token lifetime in milliseconds, never negative.
	pub fn expires_in_ms(&self) -> i64 {
		if self.expires_in.is_finite() && self.expires_in > 0.0 {
			(self.expires_in * 1000.0) as i64
		} else {
			0
		}
	}
}

/// Profile details the login exchange returns alongside the tokens.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub email: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub name: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub picture: Option<String>,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn refresh_request_serializes_snake_case() {
		let req = RefreshRequest {
			refresh_token: "rt-1".into(),
		};
		let json = serde_json::to_string(&req).unwrap();
		assert_eq!(json, r#"{"refresh_token":"rt-1"}"#);
	}

	#[test]
	fn token_response_without_rotation() {
		let resp: TokenResponse = serde_json::from_str(r#"{"access_token":"at","expires_in":1800}"#).unwrap();
		assert_eq!(resp.access_token(), Some("at"));
		assert_eq!(resp.refresh_token(), None);
		assert_eq!(resp.expires_in_ms(), 1_800_000);
	}

	#[test]
	fn empty_access_token_counts_as_missing() {
		let resp: TokenResponse = serde_json::from_str(r#"{"access_token":"","expires_in":60}"#).unwrap();
		assert_eq!(resp.access_token(), None);
	}

	#[test]
	fn missing_expires_in_uses_backend_default() {
		let resp: TokenResponse = serde_json::from_str(r#"{"access_token":"at"}"#).unwrap();
		assert_eq!(resp.expires_in_ms(), 3_600_000);
	}

	#[test]
	fn login_response_carries_user_info() {
		let resp: TokenResponse = serde_json::from_str(
			r#"{"access_token":"at","refresh_token":"rt","expires_in":3600,"token_type":"Bearer","user_info":{"email":"a@b.c","name":"A"}}"#,
		)
		.unwrap();
		let info = resp.user_info.unwrap();
		assert_eq!(info.email.as_deref(), Some("a@b.c"));
		assert_eq!(info.picture, None);
	}
}
