mod activation;
mod clock;
mod config;
mod cycle;
mod error;
mod player;
mod sequencer;
mod state;
mod timeline;
mod tween;

pub use reel_events::TimeMs;

pub use activation::{ActivationSignal, Edge, SelectionTrigger, VisibilityTrigger};
pub use clock::{Clock, ManualClock, TokioClock};
pub use config::{SequencerConfig, UnknownActorPolicy};
pub use cycle::run_cycle;
pub use error::{Result, SequencerError};
pub use player::{CompiledVignette, VignettePlayer};
pub use sequencer::{PlaybackHandle, PlaybackScope, Sequencer};
pub use state::{AgentGraphState, AgentStatus, ChatState, MessagePhase, MetricState, PanelState, ShowcaseState, VignetteState};
pub use timeline::{AgentLink, AgentStream, ChatLine, ChatStream, Cue, Cursor, PanelStream, ShowcaseItem, ShowcaseStream, Speaker, Streams, Surface, TimedCue, Timeline, ToolLine, TraceLine};
pub use tween::{ease_out_cubic, run_frames, MetricTween, NumberFormat};
