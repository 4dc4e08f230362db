use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::TimeMs;

/// What to do with an event whose actor has no render surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownActorPolicy {
	/// Fail compilation
	Reject,
	/// Log and skip the event
	Drop,
}

impl Default for UnknownActorPolicy {
	fn default() -> Self {
		if cfg!(debug_assertions) {
			Self::Reject
		} else {
			Self::Drop
		}
	}
}

/// Timing constants of a playback
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequencerConfig {
	/// How long before a responder message the typing indicator appears
	pub typing_preroll_ms: TimeMs,
	/// Offset added to every agent message of the orchestration diagram
	pub agent_start_delay_ms: TimeMs,
	/// Time an agent message spends travelling along its connector
	pub agent_travel_ms: TimeMs,
	/// Delay after the last agent message start before every agent is settled to done
	pub sweep_tail_ms: TimeMs,
	/// Number of completed agent messages that keep a label on screen
	pub completed_label_capacity: usize,
	pub tween_duration_ms: TimeMs,
	/// Start delay between consecutive metric cards
	pub metric_stagger_ms: TimeMs,
	pub frame_interval_ms: u64,
	pub unknown_actor: UnknownActorPolicy,
}

impl SequencerConfig {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_typing_preroll(mut self, ms: TimeMs) -> Self {
		self.typing_preroll_ms = ms;
		self
	}

	pub fn with_agent_timing(mut self, start_delay_ms: TimeMs, travel_ms: TimeMs, sweep_tail_ms: TimeMs) -> Self {
		self.agent_start_delay_ms = start_delay_ms;
		self.agent_travel_ms = travel_ms;
		self.sweep_tail_ms = sweep_tail_ms;
		self
	}

	pub fn with_label_capacity(mut self, capacity: usize) -> Self {
		self.completed_label_capacity = capacity;
		self
	}

	pub fn with_tween(mut self, duration_ms: TimeMs, stagger_ms: TimeMs) -> Self {
		self.tween_duration_ms = duration_ms;
		self.metric_stagger_ms = stagger_ms;
		self
	}

	pub fn with_frame_interval(mut self, ms: u64) -> Self {
		self.frame_interval_ms = ms;
		self
	}

	pub fn with_unknown_actor(mut self, policy: UnknownActorPolicy) -> Self {
		self.unknown_actor = policy;
		self
	}

	pub fn frame_interval(&self) -> Duration {
		Duration::from_millis(self.frame_interval_ms.max(1))
	}

	pub fn validate(&self) -> Result<(), String> {
		let timings = [
			("typing_preroll_ms", self.typing_preroll_ms),
			("agent_start_delay_ms", self.agent_start_delay_ms),
			("agent_travel_ms", self.agent_travel_ms),
			("sweep_tail_ms", self.sweep_tail_ms),
			("metric_stagger_ms", self.metric_stagger_ms),
		];
		if let Some((name, value)) = timings.iter().find(|(_, v)| *v < 0) {
			return Err(format!("{name} must not be negative (got {value})"));
		}
		if self.tween_duration_ms <= 0 {
			return Err(format!("tween_duration_ms must be positive (got {})", self.tween_duration_ms));
		}
		if self.frame_interval_ms == 0 {
			return Err("frame_interval_ms must be positive".to_string());
		}
		Ok(())
	}
}

impl Default for SequencerConfig {
	fn default() -> Self {
		Self {
			typing_preroll_ms: 1200,
			agent_start_delay_ms: 600,
			agent_travel_ms: 800,
			sweep_tail_ms: 1600,
			completed_label_capacity: 2,
			tween_duration_ms: 1500,
			metric_stagger_ms: 150,
			frame_interval_ms: 16,
			unknown_actor: UnknownActorPolicy::default(),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn defaults_match_the_narrative_clock() {
		let config = SequencerConfig::default();
		assert_eq!(config.typing_preroll_ms, 1200);
		assert_eq!(config.agent_start_delay_ms, 600);
		assert_eq!(config.agent_travel_ms, 800);
		assert_eq!(config.sweep_tail_ms, 1600);
		assert_eq!(config.completed_label_capacity, 2);
		assert_eq!(config.tween_duration_ms, 1500);
		assert!(config.validate().is_ok());
	}

	#[test]
	fn negative_timings_are_rejected() {
		let config = SequencerConfig::default().with_typing_preroll(-1);
		assert!(config.validate().unwrap_err().contains("typing_preroll_ms"));

		let config = SequencerConfig::default().with_tween(0, 150);
		assert!(config.validate().is_err());
	}
}
