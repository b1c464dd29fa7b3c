//! soot: session lifecycle and clipboard ingestion for the SOOT client.
//!
//! The crate owns three concerns:
//!
//! - [`SessionManager`] keeps the persisted access/refresh token pair alive,
//!   renewing it on a timer before expiry and logging out on any failure.
//! - [`AuthenticatedClient`] sends requests with the current bearer token and
//!   retries once after a renewal when the backend answers 401.
//! - [`Correlator`] pairs SOOT metadata found on the clipboard with the
//!   clipboard's PNG images, and [`MashBackend`] submits the result.
//!
//! Hosts inject storage ([`KeyValueStore`]), transport ([`HttpClient`]), time
//! ([`Clock`]) and the clipboard ([`ClipboardSource`]).
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use soot::{AuthenticatedClient, ClientConfig, JsonFileStore, ReqwestClient, SessionManager, SystemClock};
//!
//! let config = ClientConfig::default();
//! let http = Arc::new(ReqwestClient::new(config.request_timeout())?);
//! let store = Arc::new(JsonFileStore::open("session.json"));
//! let session = SessionManager::new(store, http, Arc::new(SystemClock), &config);
//! session.resume();
//!
//! let client = AuthenticatedClient::new(session);
//! let bytes = client.get_bytes("http://localhost:8000/api/things").await?;
//! ```

mod authenticated;
mod backend;
mod clock;
mod config;
mod error;

pub mod clipboard;
pub mod http;
pub mod session;
pub mod store;

#[cfg(test)]
mod testing;

pub use authenticated::AuthenticatedClient;
pub use backend::{Ingestion, MashBackend};
pub use clipboard::{
	ClipboardItem, ClipboardSnapshot, ClipboardSource, CorrelationReport, Correlator, MalformedItem, MetadataPolicy,
	Representation,
};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ClientConfig, DEFAULT_API_BASE_URL, DEFAULT_RENEWAL_BUFFER};
pub use error::{Error, RenewalFailure, Result, StoreError};
pub use http::{HttpClient, HttpRequest, HttpResponse, Method, ReqwestClient};
pub use session::{LogoutReason, Renewal, RenewalResult, SessionEvent, SessionManager, SessionReport, SessionState};
pub use soot_protocol::{CompositePayload, MetadataEntry, ProcessedEntry, TokenResponse};
pub use store::{JsonFileStore, KeyValueStore, MemoryStore, Session, SessionStore, StoredSession};
