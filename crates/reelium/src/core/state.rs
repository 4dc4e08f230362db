use std::collections::BTreeMap;

use reel_events::AgentId;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::{Cue, Surface, TimeMs, TimedCue, Timeline};

// ============================================================================
// Panels
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatState {
	pub visible_count: usize,
	pub total: usize,
	pub typing: bool,
}

impl ChatState {
	pub fn new(total: usize) -> Self {
		Self {
			visible_count: 0,
			total,
			typing: false,
		}
	}

	/// The typing bubble never outlives the last message
	pub fn shows_typing(&self) -> bool {
		self.typing && self.visible_count < self.total
	}

	fn reveal(&mut self, index: usize) {
		self.visible_count = self.visible_count.max(index + 1).min(self.total);
		self.typing = false;
	}

	fn start_typing(&mut self) {
		if self.visible_count < self.total {
			self.typing = true;
		}
	}
}

/// Reveal progress of a single-stream panel (reasoning trace, tool log)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PanelState {
	pub visible_count: usize,
	pub total: usize,
}

impl PanelState {
	pub fn new(total: usize) -> Self {
		Self { visible_count: 0, total }
	}

	/// Some steps are shown but the stream is not finished
	pub fn is_computing(&self) -> bool {
		self.visible_count > 0 && self.visible_count < self.total
	}

	pub fn is_complete(&self) -> bool {
		self.visible_count == self.total
	}

	fn reveal(&mut self, index: usize) {
		self.visible_count = self.visible_count.max(index + 1).min(self.total);
	}
}

/// Showcase reveals, per-item progress and the rotating selector
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShowcaseState {
	pub visible_count: usize,
	pub total: usize,
	/// Percent filled, one slot per item; callouts stay at zero
	pub progress: Vec<u8>,
	pub cycle_index: usize,
	pub cycle_len: usize,
}

impl ShowcaseState {
	pub fn new(total: usize, cycle_len: usize) -> Self {
		Self {
			visible_count: 0,
			total,
			progress: vec![0; total],
			cycle_index: 0,
			cycle_len,
		}
	}

	pub fn percent_of(&self, index: usize) -> u8 {
		self.progress.get(index).copied().unwrap_or_default()
	}

	/// Step the selector forward, wrapping after the last option
	pub fn rotate(&mut self) {
		if self.cycle_len > 0 {
			self.cycle_index = (self.cycle_index + 1) % self.cycle_len;
		}
	}

	fn reveal(&mut self, index: usize) {
		self.visible_count = self.visible_count.max(index + 1).min(self.total);
	}

	fn advance(&mut self, index: usize, percent: u8) {
		if let Some(slot) = self.progress.get_mut(index) {
			*slot = (*slot).max(percent.min(100));
		}
	}

	fn reset(&mut self) {
		self.visible_count = 0;
		self.progress.iter_mut().for_each(|p| *p = 0);
		self.cycle_index = 0;
	}
}

// ============================================================================
// Orchestration diagram
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
	#[default]
	Idle,
	Thinking,
	Executing,
	Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessagePhase {
	Pending,
	Active,
	Completed,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentGraphState {
	/// Exactly one status per roster agent
	pub statuses: BTreeMap<AgentId, AgentStatus>,
	/// Messages currently travelling, in dispatch order
	pub active: SmallVec<[usize; 4]>,
	/// Delivered messages, in delivery order
	pub completed: Vec<usize>,
}

impl AgentGraphState {
	pub fn new<'a>(roster: impl IntoIterator<Item = &'a AgentId>) -> Self {
		Self {
			statuses: roster.into_iter().map(|id| (id.clone(), AgentStatus::Idle)).collect(),
			active: SmallVec::new(),
			completed: Vec::new(),
		}
	}

	pub fn status_of(&self, agent: &str) -> AgentStatus {
		self.statuses.get(agent).copied().unwrap_or_default()
	}

	pub fn phase_of(&self, index: usize) -> MessagePhase {
		if self.active.contains(&index) {
			MessagePhase::Active
		} else if self.completed.contains(&index) {
			MessagePhase::Completed
		} else {
			MessagePhase::Pending
		}
	}

	/// The last `cap` delivered messages, oldest first
	pub fn recent_completed(&self, cap: usize) -> &[usize] {
		let start = self.completed.len().saturating_sub(cap);
		&self.completed[start..]
	}

	fn set(&mut self, agent: &str, status: AgentStatus) {
		if let Some(slot) = self.statuses.get_mut(agent) {
			*slot = status;
		}
	}

	fn dispatch(&mut self, index: usize, from: &str, to: &str) {
		self.set(from, AgentStatus::Executing);
		self.set(to, AgentStatus::Thinking);
		if !self.active.contains(&index) && !self.completed.contains(&index) {
			self.active.push(index);
		}
	}

	fn deliver(&mut self, index: usize, from: &str, to: &str) {
		self.set(from, AgentStatus::Done);
		self.set(to, AgentStatus::Executing);
		self.active.retain(|i| *i != index);
		if !self.completed.contains(&index) {
			self.completed.push(index);
		}
	}

	fn settle(&mut self) {
		self.statuses.values_mut().for_each(|s| *s = AgentStatus::Done);
	}

	fn reset(&mut self) {
		self.statuses.values_mut().for_each(|s| *s = AgentStatus::Idle);
		self.active.clear();
		self.completed.clear();
	}
}

// ============================================================================
// Metrics
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricState {
	pub label: String,
	pub display: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub suffix: Option<String>,
	/// Display before activation and after deactivation
	#[serde(skip)]
	zero: String,
}

impl MetricState {
	pub fn new(label: impl Into<String>, zero: impl Into<String>, suffix: Option<String>) -> Self {
		let zero = zero.into();
		Self {
			label: label.into(),
			display: zero.clone(),
			suffix,
			zero,
		}
	}

	fn reset(&mut self) {
		self.display.clone_from(&self.zero);
	}
}

// ============================================================================
// Vignette
// ============================================================================

/// Everything one vignette shows at a point in time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VignetteState {
	pub vignette_id: String,
	pub playing: bool,
	pub chat: ChatState,
	pub trace: PanelState,
	pub tools: PanelState,
	pub agents: AgentGraphState,
	pub showcase: ShowcaseState,
	pub metrics: Vec<MetricState>,
}

impl VignetteState {
	pub fn new(vignette_id: impl Into<String>, timeline: &Timeline, metrics: Vec<MetricState>) -> Self {
		let streams = timeline.streams();
		let roster: Vec<AgentId> = streams.agents.iter().flat_map(|a| a.roster().map(|d| d.id.clone())).collect();

		Self {
			vignette_id: vignette_id.into(),
			playing: false,
			chat: ChatState::new(streams.chat_len()),
			trace: PanelState::new(streams.trace_len()),
			tools: PanelState::new(streams.tools_len()),
			agents: AgentGraphState::new(&roster),
			showcase: ShowcaseState::new(streams.showcase_len(), streams.rotating_cycle().map_or(0, |c| c.options.len())),
			metrics,
		}
	}

	/// Apply a cue (pure reducer). Cues carry their own time; the wall clock is not an input.
	pub fn apply(&mut self, cue: &TimedCue) {
		match &cue.cue {
			Cue::ShowTyping => self.chat.start_typing(),
			Cue::Reveal { surface, index } => match surface {
				Surface::Chat => self.chat.reveal(*index),
				Surface::Trace => self.trace.reveal(*index),
				Surface::Tools => self.tools.reveal(*index),
				Surface::Showcase => self.showcase.reveal(*index),
			},
			Cue::Dispatch { index, from, to } => self.agents.dispatch(*index, from, to),
			Cue::Deliver { index, from, to } => self.agents.deliver(*index, from, to),
			Cue::Settle => self.agents.settle(),
			Cue::Advance { index, percent } => self.showcase.advance(*index, *percent),
		}
	}

	/// Back to the pre-activation picture
	pub fn reset(&mut self) {
		self.playing = false;
		self.chat.visible_count = 0;
		self.chat.typing = false;
		self.trace.visible_count = 0;
		self.tools.visible_count = 0;
		self.agents.reset();
		self.showcase.reset();
		self.metrics.iter_mut().for_each(MetricState::reset);
	}

	pub fn set_metric_displays(&mut self, displays: &[String]) {
		for (metric, display) in self.metrics.iter_mut().zip(displays) {
			metric.display.clone_from(display);
		}
	}

	/// Replay every cue due at or before `time` onto a fresh state
	pub fn reconstruct_at(&mut self, timeline: &Timeline, time: TimeMs) {
		self.reset();
		timeline.cursor().apply_until(timeline, time, |cue| self.apply(cue));
	}
}
