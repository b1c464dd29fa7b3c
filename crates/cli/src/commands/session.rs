//! `status`, `refresh` and `logout`.

use serde::Serialize;
use soot::SessionReport;

use crate::context::CommandContext;
use crate::error::Result;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshData {
	pub expires_at: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogoutData {
	pub logged_out: bool,
}

pub fn status(ctx: &CommandContext) -> SessionReport {
	ctx.session().report()
}

/// Runs the renewal protocol once. A failure has already cleared the session.
pub async fn refresh(ctx: &CommandContext) -> Result<RefreshData> {
	let renewal = ctx.session().renew().await?;
	Ok(RefreshData {
		expires_at: renewal.expires_at,
	})
}

pub fn logout(ctx: &CommandContext) -> LogoutData {
	let had_session = ctx.session().report().has_access_token;
	ctx.session().logout();
	LogoutData {
		logged_out: had_session,
	}
}
