//! Minimal HTTP capability used by the session manager and request wrapper.
//!
//! Core logic only sees [`HttpClient`]; [`ReqwestClient`] is the production
//! transport and tests substitute scripted fakes.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::{Error, Result};

pub const AUTHORIZATION: &str = "Authorization";
pub const CONTENT_TYPE: &str = "Content-Type";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
	Get,
	Post,
}

impl std::fmt::Display for Method {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Method::Get => write!(f, "GET"),
			Method::Post => write!(f, "POST"),
		}
	}
}

/// Outbound request. Cloneable so the wrapper can replay it once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
	pub method: Method,
	pub url: String,
	pub headers: Vec<(String, String)>,
	pub body: Option<Vec<u8>>,
}

impl HttpRequest {
	pub fn new(method: Method, url: impl Into<String>) -> Self {
		Self {
			method,
			url: url.into(),
			headers: Vec::new(),
			body: None,
		}
	}

	pub fn get(url: impl Into<String>) -> Self {
		Self::new(Method::Get, url)
	}

	/// POST with a JSON body and matching content type.
	pub fn post_json<T: Serialize + ?Sized>(url: impl Into<String>, body: &T) -> Result<Self> {
		let bytes = serde_json::to_vec(body)?;
		Ok(Self::new(Method::Post, url).header(CONTENT_TYPE, "application/json").body(bytes))
	}

	/// Sets a header, replacing any existing one with the same name (case-insensitive).
	pub fn header(mut self, name: &str, value: impl Into<String>) -> Self {
		self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
		self.headers.push((name.to_string(), value.into()));
		self
	}

	pub fn body(mut self, body: Vec<u8>) -> Self {
		self.body = Some(body);
		self
	}

	pub fn bearer(self, token: &str) -> Self {
		self.header(AUTHORIZATION, format!("Bearer {token}"))
	}

	pub fn header_value(&self, name: &str) -> Option<&str> {
		self.headers
			.iter()
			.find(|(k, _)| k.eq_ignore_ascii_case(name))
			.map(|(_, v)| v.as_str())
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
	pub status: u16,
	pub headers: Vec<(String, String)>,
	pub body: Vec<u8>,
}

impl HttpResponse {
	pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
		Self {
			status,
			headers: Vec::new(),
			body: body.into(),
		}
	}

	pub fn is_success(&self) -> bool {
		(200..300).contains(&self.status)
	}

	pub fn is_unauthorized(&self) -> bool {
		self.status == 401
	}

	pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
		Ok(serde_json::from_slice(&self.body)?)
	}

	/// Returns `self` if the status is 2xx, otherwise [`Error::Status`].
	pub fn error_for_status(self, url: &str) -> Result<Self> {
		if self.is_success() {
			Ok(self)
		} else {
			Err(Error::Status {
				status: self.status,
				url: url.to_string(),
			})
		}
	}
}

/// Transport capability. Transport faults surface as [`Error::Network`];
/// HTTP error statuses are returned as responses.
#[async_trait]
pub trait HttpClient: Send + Sync {
	async fn send(&self, request: HttpRequest) -> Result<HttpResponse>;
}

/// [`HttpClient`] backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct ReqwestClient {
	inner: reqwest::Client,
}

impl ReqwestClient {
	pub fn new(timeout: Option<Duration>) -> Result<Self> {
		let mut builder = reqwest::Client::builder();
		if let Some(timeout) = timeout {
			builder = builder.timeout(timeout);
		}
		let inner = builder.build().map_err(|e| Error::Network(format!("failed to build HTTP client: {e}")))?;
		Ok(Self { inner })
	}
}

#[async_trait]
impl HttpClient for ReqwestClient {
	async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
		let method = match request.method {
			Method::Get => reqwest::Method::GET,
			Method::Post => reqwest::Method::POST,
		};

		let mut builder = self.inner.request(method, &request.url);
		for (name, value) in &request.headers {
			builder = builder.header(name.as_str(), value.as_str());
		}
		if let Some(body) = request.body {
			builder = builder.body(body);
		}

		let started = std::time::Instant::now();
		let response = builder.send().await.map_err(|e| Error::Network(e.to_string()))?;
		let status = response.status().as_u16();
		let headers = response
			.headers()
			.iter()
			.filter_map(|(k, v)| v.to_str().ok().map(|v| (k.to_string(), v.to_string())))
			.collect();
		let body = response.bytes().await.map_err(|e| Error::Network(e.to_string()))?.to_vec();

		debug!(
			target = "soot.http",
			method = %request.method,
			url = %request.url,
			status,
			elapsed_ms = started.elapsed().as_millis() as u64,
			"request completed"
		);

		Ok(HttpResponse { status, headers, body })
	}
}

/// Joins a base URL and an absolute path without doubling the slash.
pub fn join_url(base: &str, path: &str) -> String {
	format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}
