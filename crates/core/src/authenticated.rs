//! Bearer-token request wrapper with one renew-and-retry on 401.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::http::{HttpClient, HttpRequest, HttpResponse};
use crate::error::RenewalFailure;
use crate::session::{SessionManager, token_preview};

/// Sends requests with the current session's bearer token.
///
/// A 401 triggers exactly one renewal and one retry. The retry's response is
/// returned whatever its status, so a second 401 never loops. Other statuses
/// pass through untouched; business errors are the caller's to interpret.
#[derive(Clone, Debug)]
pub struct AuthenticatedClient {
	session: SessionManager,
}

impl AuthenticatedClient {
	pub fn new(session: SessionManager) -> Self {
		Self { session }
	}

	pub fn session(&self) -> &SessionManager {
		&self.session
	}

	pub async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
		if !self.session.ensure_session() {
			return Err(Error::AuthRequired);
		}
		let token = self.session.current_token().ok_or(Error::AuthRequired)?;
		let http: Arc<dyn HttpClient> = self.session.http();

		debug!(
			target = "soot.http",
			method = %request.method,
			url = %request.url,
			token = %token_preview(&token),
			"sending authenticated request"
		);
		let response = http.send(request.clone().bearer(&token)).await?;
		if !response.is_unauthorized() {
			return Ok(response);
		}

		info!(target = "soot.http", url = %request.url, "401 received, renewing session");
		let epoch = self.session.epoch();
		match self.session.renew().await {
			Ok(_) => {
				let token = self.session.current_token().ok_or(Error::AuthRequired)?;
				let retry = http.send(request.bearer(&token)).await?;
				debug!(target = "soot.http", status = retry.status, "retry completed");
				Ok(retry)
			}
			Err(failure) => {
				warn!(target = "soot.http", %failure, "renewal failed, cannot retry");
				// Other failures were cleared by the renewal itself, guarded by its epoch.
				if failure == RenewalFailure::Interrupted {
					self.session.end_renewed_session(epoch, failure.clone());
				}
				Err(Error::AuthFailed(failure))
			}
		}
	}

	/// GETs `url` and returns the body, failing on a non-2xx status.
	pub async fn get_bytes(&self, url: &str) -> Result<Vec<u8>> {
		let response = self.send(HttpRequest::get(url)).await?;
		Ok(response.error_for_status(url)?.body)
	}

	/// POSTs `body` as JSON. The response is returned unchecked.
	pub async fn post_json<T: Serialize + ?Sized>(&self, url: &str, body: &T) -> Result<HttpResponse> {
		self.send(HttpRequest::post_json(url, body)?).await
	}
}
