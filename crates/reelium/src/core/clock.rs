use std::sync::atomic::{AtomicI64, Ordering};

use tokio::time::Instant;

use super::TimeMs;

/// Monotonic time source used by the metric tweens
pub trait Clock: Send + Sync + 'static {
	/// Milliseconds since an arbitrary, fixed origin
	fn now_ms(&self) -> TimeMs;
}

/// Tokio's clock, so paused test time drives it too
#[derive(Debug, Clone, Copy)]
pub struct TokioClock {
	origin: Instant,
}

impl TokioClock {
	pub fn new() -> Self {
		Self { origin: Instant::now() }
	}
}

impl Default for TokioClock {
	fn default() -> Self {
		Self::new()
	}
}

impl Clock for TokioClock {
	fn now_ms(&self) -> TimeMs {
		TimeMs::try_from(self.origin.elapsed().as_millis()).unwrap_or(TimeMs::MAX)
	}
}

/// Hand-driven clock for tests
#[derive(Debug, Default)]
pub struct ManualClock {
	now: AtomicI64,
}

impl ManualClock {
	pub fn new(start_ms: TimeMs) -> Self {
		Self { now: AtomicI64::new(start_ms) }
	}

	pub fn set(&self, ms: TimeMs) {
		self.now.store(ms, Ordering::SeqCst);
	}

	pub fn advance(&self, ms: TimeMs) {
		self.now.fetch_add(ms, Ordering::SeqCst);
	}
}

impl Clock for ManualClock {
	fn now_ms(&self) -> TimeMs {
		self.now.load(Ordering::SeqCst)
	}
}
