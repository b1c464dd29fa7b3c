//! One-shot renewal timer.

use tokio::task::JoinHandle;

/// Handle to the scheduled renewal task.
///
/// Dropping the timer aborts the task, so replacing the manager's slot cancels
/// the predecessor. A timer that has fired calls [`release`](Self::release)
/// instead, which detaches without aborting the running task.
pub(crate) struct RenewalTimer {
	pub(crate) id: u64,
	/// Epoch milliseconds at which the renewal fires.
	pub(crate) fires_at: i64,
	handle: Option<JoinHandle<()>>,
}

impl RenewalTimer {
	pub(crate) fn new(id: u64, fires_at: i64, handle: JoinHandle<()>) -> Self {
		Self {
			id,
			fires_at,
			handle: Some(handle),
		}
	}

	pub(crate) fn release(mut self) {
		self.handle.take();
	}
}

impl Drop for RenewalTimer {
	fn drop(&mut self) {
		if let Some(handle) = self.handle.take() {
			handle.abort();
		}
	}
}
