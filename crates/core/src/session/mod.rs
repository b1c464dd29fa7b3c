//! Session lifecycle: validity, scheduled renewal, single-flight refresh, logout.
//!
//! [`SessionManager`] exclusively owns the session triple persisted in a
//! [`SessionStore`]. Everything else reads through its accessors.
//!
//! # Renewal
//!
//! A valid session always has exactly one renewal timer armed, firing
//! [`ClientConfig::renewal_buffer`] before expiry (immediately if that moment
//! has passed). Renewal is single-flight: concurrent callers, whether the timer
//! or a 401 retry, await one shared exchange with the auth backend.
//!
//! Renewal is fail-closed. Any failure clears the whole session and broadcasts
//! [`SessionEvent::LoggedOut`]; there is no automatic retry.
//!
//! # Cancellation
//!
//! Every logout (and every newly installed session) bumps a session epoch under
//! the store's write lock. A renewal records the epoch it started under and
//! only commits or clears if it is unchanged, so a late response can neither
//! resurrect a logged-out session nor wipe the one that replaced it.

mod timer;


use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared};
use parking_lot::Mutex;
use serde::Serialize;
use soot_protocol::{CodeExchangeRequest, LOGIN_PATH, REFRESH_PATH, RefreshRequest, TokenResponse};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use self::timer::RenewalTimer;
use crate::clock::Clock;
use crate::config::ClientConfig;
use crate::error::{Error, RenewalFailure, Result};
use crate::http::{HttpClient, HttpRequest, join_url};
use crate::store::{KeyValueStore, Session, SessionStore};

const EVENT_CAPACITY: usize = 16;

/// Coarse session state derived from the store and the in-flight slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
	Unauthenticated,
	Authenticated,
	RenewalPending,
}

/// Why a session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogoutReason {
	UserRequested,
	RenewalFailed(RenewalFailure),
}

/// Notifications for hosts that own navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
	/// A new session was installed (login or explicit install).
	Established { expires_at: i64 },
	Renewed { expires_at: i64 },
	/// The session was cleared; the host should show its login surface.
	LoggedOut { reason: LogoutReason },
	/// A caller needed a session and none was valid.
	LoginRequired,
}

/// Result of a successful renewal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Renewal {
	pub expires_at: i64,
}

/// Point-in-time diagnostic view of the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionReport {
	pub state: SessionState,
	pub has_access_token: bool,
	pub has_refresh_token: bool,
	pub has_expiry: bool,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub expires_at: Option<i64>,
	/// Negative once the token has expired.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub remaining_ms: Option<i64>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub pending_renewal: Option<i64>,
}

pub type RenewalResult = std::result::Result<Renewal, RenewalFailure>;
type SharedRenewal = Shared<BoxFuture<'static, RenewalResult>>;

struct InFlight {
	id: u64,
	future: SharedRenewal,
}

struct Inner {
	store: SessionStore,
	http: Arc<dyn HttpClient>,
	clock: Arc<dyn Clock>,
	auth_base_url: String,
	renewal_buffer_ms: i64,
	epoch: AtomicU64,
	next_id: AtomicU64,
	timer: Mutex<Option<RenewalTimer>>,
	inflight: Mutex<Option<InFlight>>,
	events: broadcast::Sender<SessionEvent>,
}

/// Owner of the session triple and its renewal schedule.
///
/// Cheap to clone; clones share state. Timer and renewal tasks are spawned on
/// the ambient Tokio runtime.
#[derive(Clone)]
pub struct SessionManager {
	inner: Arc<Inner>,
}

impl std::fmt::Debug for SessionManager {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("SessionManager")
			.field("auth_base_url", &self.inner.auth_base_url)
			.field("state", &self.state())
			.finish()
	}
}

impl SessionManager {
	pub fn new(kv: Arc<dyn KeyValueStore>, http: Arc<dyn HttpClient>, clock: Arc<dyn Clock>, config: &ClientConfig) -> Self {
		let (events, _) = broadcast::channel(EVENT_CAPACITY);
		Self {
			inner: Arc::new(Inner {
				store: SessionStore::new(kv),
				http,
				clock,
				auth_base_url: config.api_base_url.clone(),
				renewal_buffer_ms: config.renewal_buffer().as_millis() as i64,
				epoch: AtomicU64::new(0),
				next_id: AtomicU64::new(1),
				timer: Mutex::new(None),
				inflight: Mutex::new(None),
				events,
			}),
		}
	}

	pub(crate) fn http(&self) -> Arc<dyn HttpClient> {
		Arc::clone(&self.inner.http)
	}

	pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
		self.inner.events.subscribe()
	}

	/// True iff an access token and an expiry exist and the expiry is in the future.
	pub fn is_valid(&self) -> bool {
		let stored = self.inner.store.load();
		let has_token = stored.access_token.is_some_and(|t| !t.is_empty());
		has_token && stored.expires_at.is_some_and(|expiry| self.inner.clock.now_ms() < expiry)
	}

	/// The access token, only while the session is valid.
	pub fn current_token(&self) -> Option<String> {
		let stored = self.inner.store.load();
		let expiry = stored.expires_at?;
		if self.inner.clock.now_ms() >= expiry {
			return None;
		}
		stored.access_token.filter(|t| !t.is_empty())
	}

	pub fn state(&self) -> SessionState {
		if self.inner.inflight.lock().is_some() {
			SessionState::RenewalPending
		} else if self.is_valid() {
			SessionState::Authenticated
		} else {
			SessionState::Unauthenticated
		}
	}

	/// Re-arms renewal for a valid session; otherwise signals that login is required.
	pub fn ensure_session(&self) -> bool {
		if !self.is_valid() {
			debug!(target = "soot.session", "no valid session, login required");
			self.inner.emit(SessionEvent::LoginRequired);
			return false;
		}
		self.schedule_renewal();
		true
	}

	/// Arms a valid persisted session's timer, e.g. on host start-up.
	pub fn resume(&self) -> bool {
		if self.is_valid() {
			self.schedule_renewal();
			true
		} else {
			debug!(target = "soot.session", "no persisted session to resume");
			false
		}
	}

	/// Replaces any pending timer with one firing `renewal_buffer` before expiry.
	///
	/// Returns the fire time in epoch milliseconds, or [`None`] when there is no
	/// stored expiry or no Tokio runtime to run the timer on.
	pub fn schedule_renewal(&self) -> Option<i64> {
		let inner = &self.inner;
		let mut slot = inner.timer.lock();
		slot.take();

		let expires_at = inner.store.load().expires_at?;
		let now = inner.clock.now_ms();
		let delay_ms = expires_at.saturating_sub(now).saturating_sub(inner.renewal_buffer_ms).max(0);
		let fires_at = now.saturating_add(delay_ms);

		let Ok(runtime) = tokio::runtime::Handle::try_current() else {
			warn!(target = "soot.session", "no tokio runtime; renewal not scheduled");
			return None;
		};

		let id = inner.next_id.fetch_add(1, Ordering::Relaxed);
		let weak = Arc::downgrade(inner);
		let handle = runtime.spawn(async move {
			tokio::time::sleep(Duration::from_millis(delay_ms as u64)).await;
			let Some(inner) = weak.upgrade() else {
				return;
			};
			if !inner.disarm(id) {
				return;
			}
			debug!(target = "soot.session", "renewal timer fired");
			let _ = SessionManager { inner }.renew().await;
		});

		if delay_ms == 0 {
			debug!(target = "soot.session", "token expires within buffer, renewing immediately");
		}
		debug!(target = "soot.session", fires_at, delay_ms, "renewal scheduled");
		*slot = Some(RenewalTimer::new(id, fires_at, handle));
		Some(fires_at)
	}

	/// Fire time of the pending renewal timer, if one is armed.
	pub fn pending_renewal(&self) -> Option<i64> {
		self.inner.timer.lock().as_ref().map(|t| t.fires_at)
	}

	/// Runs the renewal protocol, joining an in-flight renewal if there is one.
	///
	/// On failure the session the renewal started under has already been cleared
	/// and [`SessionEvent::LoggedOut`] broadcast by the time this returns. A
	/// session installed in the meantime is left alone.
	pub async fn renew(&self) -> RenewalResult {
		let future = {
			let mut slot = self.inner.inflight.lock();
			match slot.as_ref() {
				Some(flight) => {
					debug!(target = "soot.session", "joining in-flight renewal");
					flight.future.clone()
				}
				None => {
					let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
					let epoch = self.inner.epoch.load(Ordering::SeqCst);
					let inner = Arc::clone(&self.inner);
					let task = tokio::spawn(async move {
						let guard = FlightGuard::new(Arc::clone(&inner), id, epoch);
						let result = run_renewal(&inner, epoch).await;
						guard.settle();
						result
					});
					let future = task
						.map(|joined| joined.unwrap_or(Err(RenewalFailure::Interrupted)))
						.boxed()
						.shared();
					*slot = Some(InFlight {
						id,
						future: future.clone(),
					});
					future
				}
			}
		};
		future.await
	}

	/// Clears the session, cancels renewal, and broadcasts [`SessionEvent::LoggedOut`].
	pub fn logout(&self) {
		let inner = &self.inner;
		let had_session = inner.store.exclusive(|w| {
			let had = w.has_any();
			inner.epoch.fetch_add(1, Ordering::SeqCst);
			if let Err(err) = w.clear() {
				warn!(target = "soot.session", error = %err, "failed to clear session store");
			}
			had
		});
		inner.detach_inflight();
		inner.cancel_timer();

		let reason = LogoutReason::UserRequested;
		info!(target = "soot.session", had_session, "logged out");
		inner.emit(SessionEvent::LoggedOut { reason });
	}

	/// Current session epoch. Any logout or install moves it on.
	pub(crate) fn epoch(&self) -> u64 {
		self.inner.epoch.load(Ordering::SeqCst)
	}

	/// Clears the session after `failure`, but only if it is still the one from `epoch`.
	pub(crate) fn end_renewed_session(&self, epoch: u64, failure: RenewalFailure) {
		self.inner.terminate(epoch, failure);
	}

	/// Stores a complete session obtained elsewhere and arms its renewal.
	pub fn install(&self, session: &Session) -> Result<()> {
		let inner = &self.inner;
		inner.store.exclusive(|w| {
			inner.epoch.fetch_add(1, Ordering::SeqCst);
			w.save(session)
		})?;
		inner.detach_inflight();
		self.schedule_renewal();
		info!(
			target = "soot.session",
			token = %token_preview(&session.access_token),
			expires_at = session.expires_at,
			"session established"
		);
		inner.emit(SessionEvent::Established {
			expires_at: session.expires_at,
		});
		Ok(())
	}

	/// Exchanges an OAuth authorization code for a new session.
	pub async fn login_with_code(&self, code: &str) -> Result<Session> {
		let url = join_url(&self.inner.auth_base_url, LOGIN_PATH);
		let request = HttpRequest::post_json(&url, &CodeExchangeRequest { code: code.to_string() })?;
		let response = self.inner.http.send(request).await?;
		if !response.is_success() {
			return Err(Error::LoginRejected(format!("HTTP {}", response.status)));
		}

		let tokens: TokenResponse = response.json()?;
		let access_token = tokens
			.access_token()
			.ok_or_else(|| Error::LoginRejected("response carried no access token".into()))?;
		let refresh_token = tokens
			.refresh_token()
			.ok_or_else(|| Error::LoginRejected("response carried no refresh token".into()))?;

		let session = Session {
			access_token: access_token.to_string(),
			refresh_token: refresh_token.to_string(),
			expires_at: self.inner.clock.now_ms().saturating_add(tokens.expires_in_ms()),
		};
		self.install(&session)?;
		Ok(session)
	}

	pub fn report(&self) -> SessionReport {
		let stored = self.inner.store.load();
		let now = self.inner.clock.now_ms();
		SessionReport {
			state: self.state(),
			has_access_token: stored.access_token.is_some(),
			has_refresh_token: stored.refresh_token.is_some(),
			has_expiry: stored.expires_at.is_some(),
			expires_at: stored.expires_at,
			remaining_ms: stored.expires_at.map(|e| e.saturating_sub(now)),
			pending_renewal: self.pending_renewal(),
		}
	}
}

impl Inner {
	fn emit(&self, event: SessionEvent) {
		// No receivers is fine.
		let _ = self.events.send(event);
	}

	/// Removes the timer slot if it still belongs to timer `id`.
	fn disarm(&self, id: u64) -> bool {
		let mut slot = self.timer.lock();
		match slot.take() {
			Some(timer) if timer.id == id => {
				timer.release();
				true
			}
			other => {
				*slot = other;
				false
			}
		}
	}

	fn cancel_timer(&self) {
		if self.timer.lock().take().is_some() {
			debug!(target = "soot.session", "renewal timer cancelled");
		}
	}

	fn detach_inflight(&self) {
		self.inflight.lock().take();
	}

	fn finish_flight(&self, id: u64) {
		let mut slot = self.inflight.lock();
		if slot.as_ref().is_some_and(|flight| flight.id == id) {
			slot.take();
		}
	}

	async fn exchange_refresh_token(&self) -> std::result::Result<TokenResponse, RenewalFailure> {
		let refresh_token = self
			.store
			.refresh_token()
			.filter(|t| !t.is_empty())
			.ok_or(RenewalFailure::MissingRefreshToken)?;

		let url = join_url(&self.auth_base_url, REFRESH_PATH);
		let request = HttpRequest::post_json(&url, &RefreshRequest { refresh_token })
			.map_err(|e| RenewalFailure::Transport(e.to_string()))?;

		let started = std::time::Instant::now();
		let response = self
			.http
			.send(request)
			.await
			.map_err(|e| RenewalFailure::Transport(e.to_string()))?;
		debug!(
			target = "soot.session",
			status = response.status,
			elapsed_ms = started.elapsed().as_millis() as u64,
			"refresh response received"
		);

		if !response.is_success() {
			return Err(RenewalFailure::Rejected(response.status));
		}
		let tokens: TokenResponse = response
			.json()
			.map_err(|e| RenewalFailure::InvalidResponse(e.to_string()))?;
		if tokens.access_token().is_none() {
			return Err(RenewalFailure::MissingAccessToken);
		}
		Ok(tokens)
	}

	/// Writes renewed tokens if the session epoch is still `epoch`.
	fn commit(&self, epoch: u64, tokens: &TokenResponse) -> RenewalResult {
		let access_token = tokens.access_token().ok_or(RenewalFailure::MissingAccessToken)?;
		let expires_at = self.clock.now_ms().saturating_add(tokens.expires_in_ms());

		self.store.exclusive(|w| {
			if self.epoch.load(Ordering::SeqCst) != epoch {
				return Err(RenewalFailure::Superseded);
			}
			let refresh_token = tokens
				.refresh_token()
				.map(str::to_string)
				.or_else(|| w.refresh_token())
				.ok_or(RenewalFailure::MissingRefreshToken)?;
			let session = Session {
				access_token: access_token.to_string(),
				refresh_token,
				expires_at,
			};
			w.save(&session).map_err(|e| RenewalFailure::Store(e.to_string()))?;
			Ok(Renewal { expires_at })
		})
	}

	/// Clears the session after a failed renewal, unless it already ended.
	fn terminate(&self, epoch: u64, failure: RenewalFailure) {
		let cleared = self.store.exclusive(|w| {
			if self.epoch.load(Ordering::SeqCst) != epoch {
				return false;
			}
			self.epoch.fetch_add(1, Ordering::SeqCst);
			if let Err(err) = w.clear() {
				warn!(target = "soot.session", error = %err, "failed to clear session store");
			}
			true
		});
		if !cleared {
			return;
		}
		self.cancel_timer();
		warn!(target = "soot.session", %failure, "renewal failed, session cleared");
		self.emit(SessionEvent::LoggedOut {
			reason: LogoutReason::RenewalFailed(failure),
		});
	}
}

async fn run_renewal(inner: &Arc<Inner>, epoch: u64) -> RenewalResult {
	debug!(target = "soot.session", epoch, "starting renewal");

	let outcome = match inner.exchange_refresh_token().await {
		Ok(tokens) => inner.commit(epoch, &tokens),
		Err(failure) => Err(failure),
	};

	match outcome {
		Ok(renewal) => {
			info!(target = "soot.session", expires_at = renewal.expires_at, "session renewed");
			SessionManager { inner: Arc::clone(inner) }.schedule_renewal();
			inner.emit(SessionEvent::Renewed {
				expires_at: renewal.expires_at,
			});
			Ok(renewal)
		}
		Err(RenewalFailure::Superseded) => {
			debug!(target = "soot.session", "session ended during renewal; discarding response");
			Err(RenewalFailure::Superseded)
		}
		Err(failure) => {
			inner.terminate(epoch, failure.clone());
			Err(failure)
		}
	}
}

/// Releases a renewal's in-flight slot however its task ends.
///
/// A task that panics or is dropped before settling fails closed: the session
/// it started under is cleared as [`RenewalFailure::Interrupted`].
struct FlightGuard {
	inner: Arc<Inner>,
	id: u64,
	epoch: u64,
	settled: bool,
}

impl FlightGuard {
	fn new(inner: Arc<Inner>, id: u64, epoch: u64) -> Self {
		Self {
			inner,
			id,
			epoch,
			settled: false,
		}
	}

	fn settle(mut self) {
		self.settled = true;
	}
}

impl Drop for FlightGuard {
	fn drop(&mut self) {
		if !self.settled {
			self.inner.terminate(self.epoch, RenewalFailure::Interrupted);
		}
		self.inner.finish_flight(self.id);
	}
}

/// First characters of a token, for logs.
pub(crate) fn token_preview(token: &str) -> String {
	let prefix: String = token.chars().take(10).collect();
	format!("{prefix}...")
}
