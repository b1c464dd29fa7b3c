use serde::Serialize;
use tracing::info;

use crate::cli::LoginArgs;
use crate::context::CommandContext;
use crate::error::{CliError, Result};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginData {
	pub expires_at: i64,
	pub session_file: String,
}

pub async fn execute(ctx: &CommandContext, args: &LoginArgs) -> Result<LoginData> {
	let code = args.code.trim();
	if code.is_empty() {
		return Err(CliError::InvalidInput("authorization code is empty".into()));
	}

	info!(target = "soot.cli", api = %ctx.config().api_base_url, "exchanging authorization code");
	let session = ctx.session().login_with_code(code).await?;

	Ok(LoginData {
		expires_at: session.expires_at,
		session_file: ctx.session_path().display().to_string(),
	})
}
