use std::path::PathBuf;

use thiserror::Error;

use crate::output::{CommandError, ErrorCode};

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
	#[error("cannot load config {}: {source}", .path.display())]
	Config {
		path: PathBuf,
		#[source]
		source: anyhow::Error,
	},

	#[error("invalid input: {0}")]
	InvalidInput(String),

	#[error(transparent)]
	Soot(#[from] soot::Error),

	#[error(transparent)]
	Io(#[from] std::io::Error),

	#[error(transparent)]
	Json(#[from] serde_json::Error),
}

impl From<soot::RenewalFailure> for CliError {
	fn from(failure: soot::RenewalFailure) -> Self {
		CliError::Soot(soot::Error::AuthFailed(failure))
	}
}

fn classify_soot_error(err: &soot::Error) -> (ErrorCode, Option<serde_json::Value>) {
	use soot::Error;

	match err {
		Error::AuthRequired | Error::AuthFailed(_) => (ErrorCode::AuthError, None),
		Error::LoginRejected(_) => (ErrorCode::LoginRejected, None),
		Error::Network(_) => (ErrorCode::NetworkError, None),
		Error::Status { status, url } => (
			ErrorCode::BackendError,
			Some(serde_json::json!({ "status": status, "url": url })),
		),
		Error::MalformedMetadata { item, .. } => (ErrorCode::InvalidInput, Some(serde_json::json!({ "item": item }))),
		Error::UnsupportedEnvironment(_) | Error::Clipboard(_) => (ErrorCode::ClipboardError, None),
		Error::Store(_) => (ErrorCode::IoError, None),
		Error::Json(_) => (ErrorCode::InternalError, None),
	}
}

impl CliError {
	/// Convert this error to a CommandError for structured output
	pub fn to_command_error(&self) -> CommandError {
		let (code, details) = match self {
			CliError::Config { path, .. } => (ErrorCode::ConfigError, Some(serde_json::json!({ "path": path }))),
			CliError::InvalidInput(_) => (ErrorCode::InvalidInput, None),
			CliError::Soot(err) => classify_soot_error(err),
			CliError::Io(_) => (ErrorCode::IoError, None),
			CliError::Json(_) => (ErrorCode::InternalError, None),
		};

		CommandError {
			code,
			message: self.to_string(),
			details,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn session_failures_map_to_auth_error() {
		let err = CliError::from(soot::RenewalFailure::MissingRefreshToken);
		let cmd = err.to_command_error();
		assert_eq!(cmd.code, ErrorCode::AuthError);
		assert!(cmd.message.contains("no refresh token"));

		let err = CliError::Soot(soot::Error::AuthRequired);
		assert_eq!(err.to_command_error().code, ErrorCode::AuthError);
	}

	#[test]
	fn backend_status_carries_details() {
		let err = CliError::Soot(soot::Error::Status {
			status: 502,
			url: "http://mash/api/mash/process-entries".into(),
		});
		let cmd = err.to_command_error();
		assert_eq!(cmd.code, ErrorCode::BackendError);
		assert_eq!(cmd.details.unwrap()["status"], 502);
	}

	#[test]
	fn clipboard_faults_map_to_clipboard_error() {
		let err = CliError::Soot(soot::Error::Clipboard("snapshot.json: not found".into()));
		assert_eq!(err.to_command_error().code, ErrorCode::ClipboardError);
	}

	#[test]
	fn config_error_names_path() {
		let err = CliError::Config {
			path: PathBuf::from("/etc/soot/config.json"),
			source: anyhow::anyhow!("expected value at line 1 column 1"),
		};
		let cmd = err.to_command_error();
		assert_eq!(cmd.code, ErrorCode::ConfigError);
		assert!(cmd.message.contains("/etc/soot/config.json"));
	}
}
