use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use super::{TimeMs, TimedCue, Timeline};

// ============================================================================
// Playback scope
// ============================================================================

struct ScopeInner {
	token: CancellationToken,
	/// Held while a cue or frame is applied; cancellation waits for it
	gate: Mutex<()>,
}

/// Shared view of one playback's scope, handed to the work running inside it
#[derive(Clone)]
pub struct PlaybackScope {
	inner: Arc<ScopeInner>,
}

impl PlaybackScope {
	fn new() -> Self {
		Self {
			inner: Arc::new(ScopeInner {
				token: CancellationToken::new(),
				gate: Mutex::new(()),
			}),
		}
	}

	pub fn is_cancelled(&self) -> bool {
		self.inner.token.is_cancelled()
	}

	pub async fn cancelled(&self) {
		self.inner.token.cancelled().await;
	}

	pub fn child_token(&self) -> CancellationToken {
		self.inner.token.child_token()
	}

	/// Run `f` only while the scope is live; `None` once cancelled.
	/// `f` must not cancel the scope it runs in.
	pub fn run_gated<R>(&self, f: impl FnOnce() -> R) -> Option<R> {
		let _gate = self.inner.gate.lock().unwrap_or_else(PoisonError::into_inner);
		if self.inner.token.is_cancelled() {
			return None;
		}
		Some(f())
	}

	fn close(&self) {
		self.inner.token.cancel();
		drop(self.inner.gate.lock().unwrap_or_else(PoisonError::into_inner));
	}
}

impl std::fmt::Debug for PlaybackScope {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("PlaybackScope").field("cancelled", &self.is_cancelled()).finish()
	}
}

/// Owner of one activation's playback. Dropping it cancels the playback.
#[derive(Debug)]
pub struct PlaybackHandle {
	scope: PlaybackScope,
	tasks: Vec<JoinHandle<()>>,
}

impl PlaybackHandle {
	pub fn new() -> Self {
		Self {
			scope: PlaybackScope::new(),
			tasks: Vec::new(),
		}
	}

	pub fn scope(&self) -> PlaybackScope {
		self.scope.clone()
	}

	/// Run `fut` inside this scope; it is stopped on cancellation
	pub fn spawn<F>(&mut self, fut: F)
	where
		F: Future<Output = ()> + Send + 'static,
	{
		let token = self.scope.inner.token.clone();
		self.tasks.retain(|t| !t.is_finished());
		self.tasks.push(tokio::spawn(async move {
			tokio::select! {
				_ = token.cancelled() => {}
				_ = fut => {}
			}
		}));
	}

	pub fn run_gated<R>(&self, f: impl FnOnce() -> R) -> Option<R> {
		self.scope.run_gated(f)
	}

	pub fn child_token(&self) -> CancellationToken {
		self.scope.child_token()
	}

	pub fn is_cancelled(&self) -> bool {
		self.scope.is_cancelled()
	}

	/// Every spawned task has run to completion (or was stopped)
	pub fn is_finished(&self) -> bool {
		self.tasks.iter().all(JoinHandle::is_finished)
	}

	/// Synchronous, idempotent and total: once this returns no cue or frame of
	/// this playback runs again.
	pub fn cancel(&self) {
		if !self.scope.is_cancelled() {
			debug!("Playback cancelled");
		}
		self.scope.close();
		for task in &self.tasks {
			task.abort();
		}
	}
}

impl Default for PlaybackHandle {
	fn default() -> Self {
		Self::new()
	}
}

impl Drop for PlaybackHandle {
	fn drop(&mut self) {
		self.cancel();
	}
}

// ============================================================================
// Sequencer
// ============================================================================

pub struct Sequencer;

impl Sequencer {
	/// Start playing `timeline` from zero, handing each due cue to `on_cue`.
	///
	/// Cues due at time zero are applied before this returns. The rest are
	/// applied by a single driver task in `(at, seq)` order; a late wake-up
	/// catches up on every cue that became due without skipping or repeating any.
	/// Must be called from within a tokio runtime.
	pub fn start<F>(timeline: Arc<Timeline>, mut on_cue: F) -> PlaybackHandle
	where
		F: FnMut(&TimedCue) + Send + 'static,
	{
		let mut handle = PlaybackHandle::new();
		let origin = Instant::now();
		let mut cursor = timeline.cursor();

		cursor.apply_until(&timeline, 0, |cue| on_cue(cue));

		if cursor.next_at(&timeline).is_none() {
			return handle;
		}

		let scope = handle.scope();
		handle.spawn(async move {
			while let Some(at) = cursor.next_at(&timeline) {
				sleep_until(origin + Duration::from_millis(u64::try_from(at).unwrap_or_default())).await;

				let now = elapsed_ms(origin).max(at);
				let applied = scope.run_gated(|| {
					cursor.apply_until(&timeline, now, |cue| {
						trace!(at = cue.at, seq = cue.seq, "Applying cue");
						on_cue(cue);
					});
				});
				if applied.is_none() {
					break;
				}
			}
			debug!(duration_ms = timeline.total_duration(), "Playback reached the end of its timeline");
		});

		handle
	}
}

fn elapsed_ms(origin: Instant) -> TimeMs {
	TimeMs::try_from(origin.elapsed().as_millis()).unwrap_or(TimeMs::MAX)
}
