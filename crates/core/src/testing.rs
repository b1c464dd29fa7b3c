//! Scripted fakes shared by unit tests.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::clock::ManualClock;
use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::http::{HttpClient, HttpRequest, HttpResponse};
use crate::session::SessionManager;
use crate::store::{MemoryStore, Session};

pub(crate) const NOW: i64 = 1_700_000_000_000;
pub(crate) const MINUTE: i64 = 60_000;

#[derive(Clone)]
pub(crate) enum Reply {
	Respond(HttpResponse),
	Fail(String),
	/// Respond after sleeping on the tokio clock.
	Delayed(Duration, HttpResponse),
	/// Fail after sleeping on the tokio clock.
	DelayedStatus(Duration, u16),
	/// Panic inside the transport.
	Panic(&'static str),
}

impl Reply {
	pub(crate) fn json(status: u16, body: serde_json::Value) -> Self {
		Reply::Respond(HttpResponse::new(status, body.to_string()))
	}

	pub(crate) fn status(status: u16) -> Self {
		Reply::Respond(HttpResponse::new(status, Vec::new()))
	}

	pub(crate) fn bytes(body: &[u8]) -> Self {
		Reply::Respond(HttpResponse::new(200, body.to_vec()))
	}
}

struct Route {
	fragment: String,
	replies: VecDeque<Reply>,
}

/// [`HttpClient`] answering from per-URL reply queues.
///
/// Replies are consumed in order; the last one repeats. Unknown URLs get 404.
#[derive(Default)]
pub(crate) struct ScriptedHttp {
	routes: Mutex<Vec<Route>>,
	log: Mutex<Vec<HttpRequest>>,
}

impl ScriptedHttp {
	pub(crate) fn new() -> Arc<Self> {
		Arc::new(Self::default())
	}

	/// Queues `reply` for URLs containing `fragment`.
	pub(crate) fn on(&self, fragment: &str, reply: Reply) -> &Self {
		let mut routes = self.routes.lock();
		match routes.iter_mut().find(|r| r.fragment == fragment) {
			Some(route) => route.replies.push_back(reply),
			None => routes.push(Route {
				fragment: fragment.to_string(),
				replies: VecDeque::from([reply]),
			}),
		}
		self
	}

	pub(crate) fn requests(&self) -> Vec<HttpRequest> {
		self.log.lock().clone()
	}

	pub(crate) fn count(&self, fragment: &str) -> usize {
		self.log.lock().iter().filter(|r| r.url.contains(fragment)).count()
	}

	fn next_reply(&self, url: &str) -> Option<Reply> {
		let mut routes = self.routes.lock();
		let route = routes.iter_mut().find(|r| url.contains(&r.fragment))?;
		if route.replies.len() > 1 {
			route.replies.pop_front()
		} else {
			route.replies.front().cloned()
		}
	}
}

#[async_trait]
impl HttpClient for ScriptedHttp {
	async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
		let url = request.url.clone();
		self.log.lock().push(request);
		match self.next_reply(&url) {
			Some(Reply::Respond(response)) => Ok(response),
			Some(Reply::Fail(message)) => Err(Error::Network(message)),
			Some(Reply::Delayed(delay, response)) => {
				tokio::time::sleep(delay).await;
				Ok(response)
			}
			Some(Reply::DelayedStatus(delay, status)) => {
				tokio::time::sleep(delay).await;
				Ok(HttpResponse::new(status, Vec::new()))
			}
			Some(Reply::Panic(message)) => panic!("{message}"),
			None => Ok(HttpResponse::new(404, Vec::new())),
		}
	}
}

pub(crate) struct Harness {
	pub(crate) http: Arc<ScriptedHttp>,
	pub(crate) kv: Arc<MemoryStore>,
	pub(crate) clock: Arc<ManualClock>,
	pub(crate) manager: SessionManager,
}

impl Harness {
	pub(crate) fn new() -> Self {
		let http = ScriptedHttp::new();
		let kv = Arc::new(MemoryStore::new());
		let clock = Arc::new(ManualClock::new(NOW));
		let manager = SessionManager::new(kv.clone(), http.clone(), clock.clone(), &ClientConfig::default());
		Self { http, kv, clock, manager }
	}

	/// Harness with a session expiring `minutes` from [`NOW`].
	pub(crate) fn with_session(minutes: i64) -> Self {
		let harness = Self::new();
		harness.manager.install(&session(minutes)).unwrap();
		harness
	}
}

pub(crate) fn session(minutes: i64) -> Session {
	Session {
		access_token: "access-0".into(),
		refresh_token: "refresh-0".into(),
		expires_at: NOW + minutes * MINUTE,
	}
}

pub(crate) fn token_reply(access: &str, refresh: Option<&str>, expires_in: u64) -> Reply {
	let mut body = serde_json::json!({ "access_token": access, "expires_in": expires_in });
	if let Some(refresh) = refresh {
		body["refresh_token"] = refresh.into();
	}
	Reply::json(200, body)
}
