//! Wall-clock source for expiry arithmetic.
//!
//! Session expiry is persisted as epoch milliseconds, so the manager needs
//! wall-clock time rather than [`tokio::time::Instant`]. Timer sleeps still go
//! through tokio.

use std::sync::atomic::{AtomicI64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

pub trait Clock: Send + Sync + 'static {
	/// Milliseconds since the Unix epoch.
	fn now_ms(&self) -> i64;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
	fn now_ms(&self) -> i64 {
		SystemTime::now()
			.duration_since(UNIX_EPOCH)
			.map(|d| d.as_millis() as i64)
			.unwrap_or_default()
	}
}

/// Clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
	now: AtomicI64,
}

impl ManualClock {
	pub fn new(now_ms: i64) -> Self {
		Self {
			now: AtomicI64::new(now_ms),
		}
	}

	pub fn set(&self, now_ms: i64) {
		self.now.store(now_ms, Ordering::SeqCst);
	}

	pub fn advance(&self, ms: i64) {
		self.now.fetch_add(ms, Ordering::SeqCst);
	}
}

impl Clock for ManualClock {
	fn now_ms(&self) -> i64 {
		self.now.load(Ordering::SeqCst)
	}
}
