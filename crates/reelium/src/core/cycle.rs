use std::time::Duration;

use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::debug;

use super::PlaybackScope;

/// Calls `on_step` once per `period`, starting one period after the call,
/// until the scope is cancelled. Steps go through the scope's gate.
pub async fn run_cycle<F>(period: Duration, scope: PlaybackScope, mut on_step: F)
where
	F: FnMut() + Send + 'static,
{
	if period.is_zero() {
		return;
	}

	let mut ticker = interval_at(Instant::now() + period, period);
	ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

	loop {
		tokio::select! {
			_ = scope.cancelled() => {
				debug!("Showcase cycle cancelled");
				break;
			}
			_ = ticker.tick() => {
				if scope.run_gated(&mut on_step).is_none() {
					break;
				}
			}
		}
	}
}
