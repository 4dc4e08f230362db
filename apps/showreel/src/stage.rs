use reelium::core::{ActivationSignal, CompiledVignette, Edge, SelectionTrigger, SequencerConfig, VignettePlayer, VignetteState, VisibilityTrigger};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::catalog::Catalog;

struct Slot {
	compiled: Arc<CompiledVignette>,
	signal: ActivationSignal,
	state: watch::Receiver<VignetteState>,
}

/// Every vignette as a tab. Only the selected one plays, and only while
/// enough of the stage is on screen.
pub struct Stage {
	slots: Vec<Slot>,
	selection: SelectionTrigger,
	visibility: VisibilityTrigger,
	/// Fraction of each vignette that fits on screen, by tab
	fits: Vec<f64>,
	cancel: CancellationToken,
	tasks: Vec<JoinHandle<()>>,
}

impl Stage {
	/// Spawns one player actor per vignette; must run inside a tokio runtime
	pub fn new(catalog: &Catalog, config: &SequencerConfig, visibility_threshold: f64) -> Self {
		let cancel = CancellationToken::new();
		let mut slots = Vec::with_capacity(catalog.len());
		let mut tasks = Vec::with_capacity(catalog.len());

		for compiled in catalog.iter() {
			let signal = ActivationSignal::new();
			let player = VignettePlayer::new(compiled.clone(), config.clone());
			let state = player.subscribe();
			tasks.push(tokio::spawn(player.run(signal.subscribe(), cancel.child_token())));
			slots.push(Slot {
				compiled: compiled.clone(),
				signal,
				state,
			});
		}

		Self {
			selection: SelectionTrigger::new(slots.len()),
			slots,
			visibility: VisibilityTrigger::new(visibility_threshold),
			fits: Vec::new(),
			cancel,
			tasks,
		}
	}

	pub fn len(&self) -> usize {
		self.slots.len()
	}

	pub fn is_empty(&self) -> bool {
		self.slots.is_empty()
	}

	pub fn selected(&self) -> Option<usize> {
		self.selection.selected()
	}

	pub fn titles(&self) -> impl Iterator<Item = &str> {
		self.slots.iter().map(|slot| slot.compiled.vignette().title.as_str())
	}

	pub fn is_playing(&self, index: usize) -> bool {
		self.slots.get(index).is_some_and(|slot| slot.signal.is_active())
	}

	/// The selected vignette and its latest state
	pub fn current(&self) -> Option<(Arc<CompiledVignette>, VignetteState)> {
		let slot = self.slots.get(self.selected()?)?;
		Some((slot.compiled.clone(), slot.state.borrow().clone()))
	}

	pub fn subscribe(&self, index: usize) -> Option<watch::Receiver<VignetteState>> {
		self.slots.get(index).map(|slot| slot.state.clone())
	}

	pub fn select(&mut self, index: usize) {
		let edges = self.selection.select(index);
		self.apply(edges);
	}

	pub fn next(&mut self) {
		let edges = self.selection.next();
		self.apply(edges);
	}

	pub fn prev(&mut self) {
		let edges = self.selection.prev();
		self.apply(edges);
	}

	/// Feed the fraction of every vignette that fits on screen, by tab
	pub fn observe_viewport(&mut self, fits: Vec<f64>) {
		self.fits = fits;
		let Some(edge) = self.observe_selected_fit() else {
			return;
		};
		if let Some(slot) = self.selected().and_then(|index| self.slots.get(index)) {
			slot.signal.set(edge == Edge::Rising);
		}
	}

	fn observe_selected_fit(&mut self) -> Option<Edge> {
		let visible_ratio = *self.selected().and_then(|index| self.fits.get(index))?;
		let edge = self.visibility.observe(visible_ratio)?;
		info!(?edge, visible_ratio, "Stage visibility changed");
		Some(edge)
	}

	/// Restart the selected vignette from zero
	pub async fn replay(&mut self) {
		let Some(slot) = self.selected().and_then(|index| self.slots.get_mut(index)) else {
			return;
		};
		if slot.signal.set(false).is_some() {
			// the player only sees the latest value; let it observe the falling edge first
			if slot.state.wait_for(|state| !state.playing).await.is_err() {
				return;
			}
		}
		if self.visibility.is_active() {
			slot.signal.set(true);
		}
	}

	/// The newly selected tab is judged by its own fit before it may start
	fn apply(&mut self, edges: Vec<(usize, Edge)>) {
		self.observe_selected_fit();
		for (index, edge) in edges {
			let Some(slot) = self.slots.get(index) else { continue };
			let active = edge == Edge::Rising && self.visibility.is_active();
			debug!(vignette = %slot.compiled.id(), ?edge, active, "Selection edge");
			slot.signal.set(active);
		}
	}

	/// Deactivate everything and wait for the players to wind down
	pub async fn shutdown(self) {
		self.cancel.cancel();
		for task in self.tasks {
			if let Err(e) = task.await {
				tracing::error!("Player task failed: {}", e);
			}
		}
	}
}
