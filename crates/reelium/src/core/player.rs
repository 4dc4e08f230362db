use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use reel_events::{MetricDef, Vignette};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::cycle::run_cycle;
use super::error::Result;
use super::tween::run_frames;
use super::{Clock, Edge, MetricState, MetricTween, PlaybackHandle, Sequencer, SequencerConfig, TimedCue, Timeline, TokioClock, VignetteState};

// ============================================================================
// CompiledVignette
// ============================================================================

/// A vignette ready to play: its timeline plus one tween per metric card
#[derive(Debug, Clone)]
pub struct CompiledVignette {
	vignette: Vignette,
	timeline: Arc<Timeline>,
	tweens: Arc<[MetricTween]>,
}

impl CompiledVignette {
	pub fn compile(vignette: &Vignette, config: &SequencerConfig) -> Result<Self> {
		let timeline = Timeline::compile(&vignette.script, config)?;
		let tweens: Vec<MetricTween> = vignette.metrics.iter().enumerate().map(|(i, m)| MetricTween::for_card(&m.value, i, config)).collect();

		debug!(
			vignette = %vignette.id,
			cues = timeline.len(),
			duration_ms = timeline.total_duration(),
			"Compiled vignette"
		);

		Ok(Self {
			vignette: vignette.clone(),
			timeline: Arc::new(timeline),
			tweens: tweens.into(),
		})
	}

	pub fn id(&self) -> &str {
		&self.vignette.id
	}

	pub fn vignette(&self) -> &Vignette {
		&self.vignette
	}

	pub fn timeline(&self) -> &Arc<Timeline> {
		&self.timeline
	}

	pub fn tweens(&self) -> &[MetricTween] {
		&self.tweens
	}

	pub fn metric_defs(&self) -> &[MetricDef] {
		&self.vignette.metrics
	}

	/// The pre-activation picture
	pub fn initial_state(&self) -> VignetteState {
		let metrics = self
			.vignette
			.metrics
			.iter()
			.zip(self.tweens.iter())
			.map(|(def, tween)| MetricState::new(def.label.clone(), tween.zero(), def.suffix.clone()))
			.collect();
		VignetteState::new(self.vignette.id.clone(), &self.timeline, metrics)
	}
}

// ============================================================================
// VignettePlayer
// ============================================================================

/// Owns one vignette's state and restarts its playback on every rising edge
pub struct VignettePlayer {
	compiled: Arc<CompiledVignette>,
	config: SequencerConfig,
	clock: Arc<dyn Clock>,
	state: Arc<Mutex<VignetteState>>,
	state_tx: watch::Sender<VignetteState>,
	playback: Option<PlaybackHandle>,
	active: bool,
}

impl VignettePlayer {
	pub fn new(compiled: Arc<CompiledVignette>, config: SequencerConfig) -> Self {
		let initial = compiled.initial_state();
		let (state_tx, _) = watch::channel(initial.clone());
		Self {
			compiled,
			config,
			clock: Arc::new(TokioClock::new()),
			state: Arc::new(Mutex::new(initial)),
			state_tx,
			playback: None,
			active: false,
		}
	}

	pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
		self.clock = clock;
		self
	}

	pub fn compiled(&self) -> &Arc<CompiledVignette> {
		&self.compiled
	}

	pub fn subscribe(&self) -> watch::Receiver<VignetteState> {
		self.state_tx.subscribe()
	}

	pub fn snapshot(&self) -> VignetteState {
		self.state.lock().unwrap_or_else(PoisonError::into_inner).clone()
	}

	pub fn is_active(&self) -> bool {
		self.active
	}

	/// Follow the activation signal; repeated values are no-ops
	pub fn set_active(&mut self, active: bool) -> Option<Edge> {
		let edge = Edge::between(self.active, active)?;
		self.active = active;

		match edge {
			Edge::Rising => self.start(),
			Edge::Falling => self.stop(),
		}
		Some(edge)
	}

	fn start(&mut self) {
		// A previous playback must be gone before state is reset
		if let Some(previous) = self.playback.take() {
			previous.cancel();
		}
		self.publish(|state| {
			state.reset();
			state.playing = true;
		});

		let state = self.state.clone();
		let state_tx = self.state_tx.clone();
		let mut handle = Sequencer::start(self.compiled.timeline.clone(), move |cue: &TimedCue| {
			let mut guard = state.lock().unwrap_or_else(PoisonError::into_inner);
			guard.apply(cue);
			state_tx.send_replace(guard.clone());
		});

		let state = self.state.clone();
		let state_tx = self.state_tx.clone();
		let scope = handle.scope();
		handle.spawn(run_frames(
			self.compiled.tweens.clone(),
			self.clock.clone(),
			self.config.frame_interval(),
			scope,
			move |displays: &[String]| {
				let mut guard = state.lock().unwrap_or_else(PoisonError::into_inner);
				guard.set_metric_displays(displays);
				state_tx.send_replace(guard.clone());
			},
		));

		let period = self.compiled.timeline.streams().rotating_cycle().and_then(|c| u64::try_from(c.period_ms).ok());
		if let Some(period) = period {
			let state = self.state.clone();
			let state_tx = self.state_tx.clone();
			let scope = handle.scope();
			handle.spawn(run_cycle(Duration::from_millis(period), scope, move || {
				let mut guard = state.lock().unwrap_or_else(PoisonError::into_inner);
				guard.showcase.rotate();
				state_tx.send_replace(guard.clone());
			}));
		}

		info!(vignette = %self.compiled.id(), "Playback started");
		self.playback = Some(handle);
	}

	fn stop(&mut self) {
		if let Some(playback) = self.playback.take() {
			playback.cancel();
		}
		self.publish(VignetteState::reset);
		info!(vignette = %self.compiled.id(), "Playback stopped");
	}

	fn publish(&self, f: impl FnOnce(&mut VignetteState)) {
		let mut guard = self.state.lock().unwrap_or_else(PoisonError::into_inner);
		f(&mut guard);
		self.state_tx.send_replace(guard.clone());
	}

	/// Actor loop: mirror `activation` until it closes or `cancel` fires
	pub async fn run(mut self, mut activation: watch::Receiver<bool>, cancel: CancellationToken) {
		let initial = *activation.borrow_and_update();
		self.set_active(initial);

		loop {
			tokio::select! {
				_ = cancel.cancelled() => {
					debug!(vignette = %self.compiled.id(), "Player cancelled");
					break;
				}
				changed = activation.changed() => {
					if changed.is_err() {
						debug!(vignette = %self.compiled.id(), "Activation signal closed");
						break;
					}
					let active = *activation.borrow_and_update();
					self.set_active(active);
				}
			}
		}

		self.set_active(false);
	}
}

impl Drop for VignettePlayer {
	fn drop(&mut self) {
		if let Some(playback) = self.playback.take() {
			playback.cancel();
		}
	}
}
