// std
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters for wait-time operations.
#[derive(Debug, Default)]
pub struct CoordinatorMetrics {
	attempts: AtomicU64,
	granted: AtomicU64,
	token_rejections: AtomicU64,
	fail_opens: AtomicU64,
}
impl CoordinatorMetrics {
	/// Returns the total number of wait-time send attempts.
	pub fn attempts(&self) -> u64 {
		self.attempts.load(Ordering::Relaxed)
	}

	/// Returns the number of verdicts granted by the coordinator.
	pub fn granted(&self) -> u64 {
		self.granted.load(Ordering::Relaxed)
	}

	/// Returns the number of token rejections (401) observed.
	pub fn token_rejections(&self) -> u64 {
		self.token_rejections.load(Ordering::Relaxed)
	}

	/// Returns the number of operations that exhausted their retries and failed open.
	pub fn fail_opens(&self) -> u64 {
		self.fail_opens.load(Ordering::Relaxed)
	}

	pub(crate) fn record_attempt(&self) {
		self.attempts.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_granted(&self) {
		self.granted.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_token_rejection(&self) {
		self.token_rejections.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_fail_open(&self) {
		self.fail_opens.fetch_add(1, Ordering::Relaxed);
	}
}
