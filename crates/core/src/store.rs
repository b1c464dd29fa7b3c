//! Persistent key-value storage for session state.
//!
//! [`KeyValueStore`] is the narrow capability hosts provide (browser
//! `localStorage`, a JSON file, memory). [`SessionStore`] layers the session
//! triple on top and guarantees readers never see a half-written session.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::error::StoreError;

/// Storage key holding the access token.
pub const ACCESS_TOKEN_KEY: &str = "soot_auth_token";
/// Storage key holding the refresh token.
pub const REFRESH_TOKEN_KEY: &str = "soot_refresh_token";
/// Storage key holding the expiry as epoch milliseconds in decimal text.
pub const EXPIRY_KEY: &str = "soot_token_expiry";

/// Generic persistent string store. No validation; callers interpret contents.
pub trait KeyValueStore: Send + Sync {
	fn get(&self, key: &str) -> Option<String>;
	fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
	fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// In-process store, lost when dropped.
#[derive(Debug, Default)]
pub struct MemoryStore {
	entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
	pub fn new() -> Self {
		Self::default()
	}
}

impl KeyValueStore for MemoryStore {
	fn get(&self, key: &str) -> Option<String> {
		self.entries.lock().get(key).cloned()
	}

	fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
		self.entries.lock().insert(key.to_string(), value.to_string());
		Ok(())
	}

	fn remove(&self, key: &str) -> Result<(), StoreError> {
		self.entries.lock().remove(key);
		Ok(())
	}
}

/// Store backed by a single JSON object on disk.
///
/// The whole file is rewritten on every mutation and restricted to the owner
/// on unix, since it holds bearer credentials.
#[derive(Debug)]
pub struct JsonFileStore {
	path: PathBuf,
	entries: Mutex<BTreeMap<String, String>>,
}

impl JsonFileStore {
	/// Opens the store, treating a missing or unreadable file as empty.
	pub fn open(path: impl Into<PathBuf>) -> Self {
		let path = path.into();
		let entries = load_json(&path).unwrap_or_default();
		Self {
			path,
			entries: Mutex::new(entries),
		}
	}

	pub fn path(&self) -> &Path {
		&self.path
	}
}

impl KeyValueStore for JsonFileStore {
	fn get(&self, key: &str) -> Option<String> {
		self.entries.lock().get(key).cloned()
	}

	fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
		let mut entries = self.entries.lock();
		entries.insert(key.to_string(), value.to_string());
		save_private_json(&self.path, &*entries)
	}

	fn remove(&self, key: &str) -> Result<(), StoreError> {
		let mut entries = self.entries.lock();
		if entries.remove(key).is_some() {
			save_private_json(&self.path, &*entries)?;
		}
		Ok(())
	}
}

fn load_json(path: &Path) -> Option<BTreeMap<String, String>> {
	fs::read_to_string(path)
		.ok()
		.and_then(|content| serde_json::from_str(&content).ok())
}

fn save_private_json(path: &Path, data: &BTreeMap<String, String>) -> Result<(), StoreError> {
	if let Some(parent) = path.parent() {
		if !parent.as_os_str().is_empty() {
			fs::create_dir_all(parent)?;
		}
	}
	fs::write(path, serde_json::to_string_pretty(data)?)?;
	#[cfg(unix)]
	{
		use std::os::unix::fs::PermissionsExt;
		fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
	}
	Ok(())
}

/// Raw view of the persisted session keys.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoredSession {
	pub access_token: Option<String>,
	pub refresh_token: Option<String>,
	/// [`None`] when the key is absent or not a decimal integer.
	pub expires_at: Option<i64>,
}

/// Complete session triple.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
	pub access_token: String,
	pub refresh_token: String,
	/// Epoch milliseconds.
	pub expires_at: i64,
}

/// Session triple persisted through a [`KeyValueStore`].
///
/// All three keys are written or cleared under one write lock; reads take the
/// read lock, so no reader observes a partial update made through this type.
pub struct SessionStore {
	kv: Arc<dyn KeyValueStore>,
	lock: RwLock<()>,
}

impl SessionStore {
	pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
		Self { kv, lock: RwLock::new(()) }
	}

	pub fn load(&self) -> StoredSession {
		let _guard = self.lock.read();
		self.load_unlocked()
	}

	pub fn refresh_token(&self) -> Option<String> {
		let _guard = self.lock.read();
		self.kv.get(REFRESH_TOKEN_KEY)
	}

	/// Runs `f` with exclusive access to the keys.
	///
	/// Used by the session manager to pair an epoch check with a write.
	pub(crate) fn exclusive<R>(&self, f: impl FnOnce(&SessionWriter<'_>) -> R) -> R {
		let _guard = self.lock.write();
		f(&SessionWriter { kv: self.kv.as_ref() })
	}

	pub fn save(&self, session: &Session) -> Result<(), StoreError> {
		self.exclusive(|w| w.save(session))
	}

	pub fn clear(&self) -> Result<(), StoreError> {
		self.exclusive(|w| w.clear())
	}

	fn load_unlocked(&self) -> StoredSession {
		StoredSession {
			access_token: self.kv.get(ACCESS_TOKEN_KEY),
			refresh_token: self.kv.get(REFRESH_TOKEN_KEY),
			expires_at: self.kv.get(EXPIRY_KEY).and_then(|raw| raw.trim().parse().ok()),
		}
	}
}

/// Write access handed out by [`SessionStore::exclusive`].
pub(crate) struct SessionWriter<'a> {
	kv: &'a dyn KeyValueStore,
}

impl SessionWriter<'_> {
	pub(crate) fn refresh_token(&self) -> Option<String> {
		self.kv.get(REFRESH_TOKEN_KEY)
	}

	pub(crate) fn has_any(&self) -> bool {
		[ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, EXPIRY_KEY]
			.iter()
			.any(|key| self.kv.get(key).is_some())
	}

	pub(crate) fn save(&self, session: &Session) -> Result<(), StoreError> {
		let written = self
			.kv
			.set(ACCESS_TOKEN_KEY, &session.access_token)
			.and_then(|_| self.kv.set(REFRESH_TOKEN_KEY, &session.refresh_token))
			.and_then(|_| self.kv.set(EXPIRY_KEY, &session.expires_at.to_string()));
		if written.is_err() {
			// Never leave a partial triple behind.
			let _ = self.clear();
		}
		written
	}

	pub(crate) fn clear(&self) -> Result<(), StoreError> {
		let access = self.kv.remove(ACCESS_TOKEN_KEY);
		let expiry = self.kv.remove(EXPIRY_KEY);
		let refresh = self.kv.remove(REFRESH_TOKEN_KEY);
		access.and(expiry).and(refresh)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use tempfile::TempDir;

	fn session() -> Session {
		Session {
			access_token: "at".into(),
			refresh_token: "rt".into(),
			expires_at: 1_700_000_000_000,
		}
	}

	#[test]
	fn save_then_load_returns_full_triple() {
		let store = SessionStore::new(Arc::new(MemoryStore::new()));
		store.save(&session()).unwrap();

		let loaded = store.load();
		assert_eq!(loaded.access_token.as_deref(), Some("at"));
		assert_eq!(loaded.refresh_token.as_deref(), Some("rt"));
		assert_eq!(loaded.expires_at, Some(1_700_000_000_000));
	}

	#[test]
	fn clear_removes_every_key() {
		let kv = Arc::new(MemoryStore::new());
		let store = SessionStore::new(kv.clone());
		store.save(&session()).unwrap();
		store.clear().unwrap();

		assert_eq!(store.load(), StoredSession::default());
		assert!(kv.get(ACCESS_TOKEN_KEY).is_none());
		assert!(kv.get(REFRESH_TOKEN_KEY).is_none());
		assert!(kv.get(EXPIRY_KEY).is_none());
	}

	#[test]
	fn unparsable_expiry_reads_as_absent() {
		let kv = Arc::new(MemoryStore::new());
		kv.set(EXPIRY_KEY, "soon").unwrap();
		let store = SessionStore::new(kv);
		assert_eq!(store.load().expires_at, None);
	}

	#[test]
	fn json_file_store_survives_reopen() {
		let tmp = TempDir::new().unwrap();
		let path = tmp.path().join("nested").join("session.json");

		let store = JsonFileStore::open(&path);
		store.set(ACCESS_TOKEN_KEY, "at").unwrap();
		store.set(EXPIRY_KEY, "42").unwrap();
		store.remove(EXPIRY_KEY).unwrap();

		let reopened = JsonFileStore::open(&path);
		assert_eq!(reopened.get(ACCESS_TOKEN_KEY).as_deref(), Some("at"));
		assert_eq!(reopened.get(EXPIRY_KEY), None);
	}

	#[cfg(unix)]
	#[test]
	fn json_file_store_is_owner_only() {
		use std::os::unix::fs::PermissionsExt;

		let tmp = TempDir::new().unwrap();
		let path = tmp.path().join("session.json");
		JsonFileStore::open(&path).set(ACCESS_TOKEN_KEY, "at").unwrap();

		let mode = fs::metadata(&path).unwrap().permissions().mode();
		assert_eq!(mode & 0o777, 0o600);
	}

	#[test]
	fn corrupt_file_opens_empty() {
		let tmp = TempDir::new().unwrap();
		let path = tmp.path().join("session.json");
		fs::write(&path, "{not json").unwrap();

		let store = JsonFileStore::open(&path);
		assert_eq!(store.get(ACCESS_TOKEN_KEY), None);
	}
}
