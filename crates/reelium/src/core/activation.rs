use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Edge {
	Rising,
	Falling,
}

impl Edge {
	pub fn between(previous: bool, current: bool) -> Option<Self> {
		match (previous, current) {
			(false, true) => Some(Self::Rising),
			(true, false) => Some(Self::Falling),
			_ => None,
		}
	}
}

/// Boolean active/inactive signal; only real transitions reach subscribers
#[derive(Debug)]
pub struct ActivationSignal {
	tx: watch::Sender<bool>,
}

impl ActivationSignal {
	pub fn new() -> Self {
		let (tx, _) = watch::channel(false);
		Self { tx }
	}

	pub fn subscribe(&self) -> watch::Receiver<bool> {
		self.tx.subscribe()
	}

	pub fn is_active(&self) -> bool {
		*self.tx.borrow()
	}

	/// Repeated equal values are swallowed
	pub fn set(&self, active: bool) -> Option<Edge> {
		let mut edge = None;
		self.tx.send_if_modified(|current| {
			edge = Edge::between(*current, active);
			*current = active;
			edge.is_some()
		});
		if let Some(edge) = edge {
			debug!(?edge, "Activation edge");
		}
		edge
	}
}

impl Default for ActivationSignal {
	fn default() -> Self {
		Self::new()
	}
}

/// Turns a visible-area ratio into activation edges
#[derive(Debug, Clone, PartialEq)]
pub struct VisibilityTrigger {
	threshold: f64,
	active: bool,
}

impl VisibilityTrigger {
	pub const DEFAULT_THRESHOLD: f64 = 0.15;

	pub fn new(threshold: f64) -> Self {
		Self {
			threshold: threshold.clamp(0.0, 1.0),
			active: false,
		}
	}

	pub fn threshold(&self) -> f64 {
		self.threshold
	}

	pub fn is_active(&self) -> bool {
		self.active
	}

	/// A zero threshold means any visible part counts
	pub fn observe(&mut self, visible_ratio: f64) -> Option<Edge> {
		let now = if self.threshold == 0.0 { visible_ratio > 0.0 } else { visible_ratio >= self.threshold };
		let edge = Edge::between(self.active, now);
		self.active = now;
		edge
	}
}

impl Default for VisibilityTrigger {
	fn default() -> Self {
		Self::new(Self::DEFAULT_THRESHOLD)
	}
}

/// Tab-style selection: exactly one of `len` items is active
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionTrigger {
	selected: Option<usize>,
	len: usize,
}

impl SelectionTrigger {
	pub fn new(len: usize) -> Self {
		Self { selected: None, len }
	}

	pub fn selected(&self) -> Option<usize> {
		self.selected
	}

	pub fn len(&self) -> usize {
		self.len
	}

	pub fn is_empty(&self) -> bool {
		self.len == 0
	}

	/// Falling edge for the old selection first, then the rising edge for the new one
	pub fn select(&mut self, index: usize) -> Vec<(usize, Edge)> {
		if index >= self.len || self.selected == Some(index) {
			return Vec::new();
		}

		let mut edges = Vec::with_capacity(2);
		if let Some(previous) = self.selected {
			edges.push((previous, Edge::Falling));
		}
		edges.push((index, Edge::Rising));
		self.selected = Some(index);
		edges
	}

	pub fn next(&mut self) -> Vec<(usize, Edge)> {
		if self.is_empty() {
			return Vec::new();
		}
		let target = self.selected.map_or(0, |i| (i + 1) % self.len);
		self.select(target)
	}

	pub fn prev(&mut self) -> Vec<(usize, Edge)> {
		if self.is_empty() {
			return Vec::new();
		}
		let target = self.selected.map_or(0, |i| (i + self.len - 1) % self.len);
		self.select(target)
	}
}
