use anyhow::{Context, Result};
use reelium::core::{ActivationSignal, CompiledVignette, SequencerConfig, VignettePlayer, VignetteState};
use serde::Serialize;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;
use tracing::info;

#[derive(Serialize)]
struct Snapshot<'a> {
	at_ms: u64,
	#[serde(flatten)]
	state: &'a VignetteState,
}

/// Plays `compiled` for `duration`, writing every distinct state as one JSON line.
/// With `deactivate_at` the activation drops mid-run. Returns the number of lines written.
pub async fn play<W: Write>(
	compiled: Arc<CompiledVignette>,
	config: SequencerConfig,
	duration: Duration,
	deactivate_at: Option<Duration>,
	out: &mut W,
) -> Result<usize> {
	let signal = ActivationSignal::new();
	let player = VignettePlayer::new(compiled.clone(), config);
	let mut states = player.subscribe();
	let cancel = CancellationToken::new();
	let task = tokio::spawn(player.run(signal.subscribe(), cancel.clone()));

	let origin = Instant::now();
	let deadline = origin + duration;
	let mut cutoff = deactivate_at.map(|at| origin + at);
	let mut last = states.borrow_and_update().clone();
	let mut written = 0;

	write_snapshot(out, Duration::ZERO, &last)?;
	written += 1;

	info!(vignette = %compiled.id(), ?duration, "Headless playback");
	signal.set(true);

	loop {
		tokio::select! {
			() = sleep_until(deadline) => break,
			() = async { sleep_until(cutoff.unwrap_or(deadline)).await }, if cutoff.is_some() => {
				cutoff = None;
				info!(vignette = %compiled.id(), "Deactivating");
				signal.set(false);
			}
			changed = states.changed() => {
				if changed.is_err() {
					break;
				}
				let state = states.borrow_and_update().clone();
				if state != last {
					write_snapshot(out, origin.elapsed(), &state)?;
					written += 1;
					last = state;
				}
			}
		}
	}

	cancel.cancel();
	task.await.context("player task failed")?;
	out.flush()?;
	Ok(written)
}

fn write_snapshot<W: Write>(out: &mut W, at: Duration, state: &VignetteState) -> Result<()> {
	serde_json::to_writer(&mut *out, &Snapshot {
		at_ms: u64::try_from(at.as_millis()).unwrap_or(u64::MAX),
		state,
	})?;
	out.write_all(b"\n")?;
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::catalog::Catalog;
	use serde_json::Value;

	fn lines(buf: &[u8]) -> Vec<Value> {
		std::str::from_utf8(buf).unwrap().lines().map(|line| serde_json::from_str(line).unwrap()).collect()
	}

	fn compiled(id: &str) -> (Arc<CompiledVignette>, SequencerConfig) {
		let config = SequencerConfig::new();
		let catalog = Catalog::load(&config).unwrap();
		(catalog.find(id).unwrap().clone(), config)
	}

	#[tokio::test(start_paused = true)]
	async fn snapshots_are_json_lines_with_growing_reveals() {
		let (compiled, config) = compiled("heritage");
		let mut buf = Vec::new();
		let written = play(compiled, config, Duration::from_millis(6000), None, &mut buf).await.unwrap();

		let snapshots = lines(&buf);
		assert_eq!(snapshots.len(), written);
		assert_eq!(snapshots[0]["playing"], false);
		assert_eq!(snapshots[0]["vignette_id"], "heritage");

		let visible: Vec<u64> = snapshots.iter().map(|s| s["trace"]["visible_count"].as_u64().unwrap()).collect();
		assert!(visible.windows(2).all(|w| w[0] <= w[1]));
		assert!(*visible.last().unwrap() > 0);

		let scanned: Vec<u64> = snapshots.iter().map(|s| s["showcase"]["progress"][0].as_u64().unwrap()).collect();
		assert!(scanned.windows(2).all(|w| w[0] <= w[1]));
		assert_eq!(*scanned.last().unwrap(), 100);

		let times: Vec<u64> = snapshots.iter().map(|s| s["at_ms"].as_u64().unwrap()).collect();
		assert!(times.windows(2).all(|w| w[0] <= w[1]));
		assert!(*times.last().unwrap() <= 6000);
	}

	#[tokio::test(start_paused = true)]
	async fn deactivation_resets_and_nothing_follows() {
		let (compiled, config) = compiled("sustainability");
		let mut buf = Vec::new();
		play(compiled, config, Duration::from_millis(8000), Some(Duration::from_millis(2500)), &mut buf).await.unwrap();

		let snapshots = lines(&buf);
		let last = snapshots.last().unwrap();
		assert_eq!(last["playing"], false);
		assert_eq!(last["chat"]["visible_count"], 0);
		assert_eq!(last["trace"]["visible_count"], 0);
		assert!(last["at_ms"].as_u64().unwrap() <= 2500);
		assert!(snapshots.iter().any(|s| s["chat"]["visible_count"].as_u64().unwrap() > 0));
	}
}
