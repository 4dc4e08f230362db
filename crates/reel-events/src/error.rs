use thiserror::Error;

use crate::TimeMs;

pub type Result<T> = std::result::Result<T, EventsError>;

#[derive(Error, Debug)]
pub enum EventsError {
	#[error("Serialization error: {0}")]
	Json(#[from] serde_json::Error),

	#[error("Event {index} on actor '{actor}' has negative offset {offset_ms}ms")]
	NegativeOffset { index: usize, actor: String, offset_ms: TimeMs },
}
