use reel_events::{EventKind, EventsError};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SequencerError>;

#[derive(Debug, Error)]
pub enum SequencerError {
	#[error("No surface accepts {kind} events for actor '{actor}'")]
	UnknownActor { actor: String, kind: EventKind },

	#[error("Agent '{agent}' is not part of the orchestration roster")]
	UnknownAgent { agent: String },

	#[error("Invalid sequencer configuration: {0}")]
	InvalidConfig(String),

	#[error(transparent)]
	Events(#[from] EventsError),
}

impl SequencerError {
	/// Script reference errors can be dropped in lenient mode; everything else cannot
	pub fn is_recoverable(&self) -> bool {
		matches!(self, Self::UnknownActor { .. } | Self::UnknownAgent { .. })
	}
}
