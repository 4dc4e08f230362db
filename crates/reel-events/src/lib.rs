pub mod error;
pub mod script;
pub mod types;
pub mod vignette;

pub use error::{EventsError, Result};
pub use script::{AgentDef, AgentsCast, CalloutStyle, Cast, ChatCast, CycleDef, CycleOption, Event, EventKind, PanelCast, Payload, Script, ShowcaseCast, ToolDirection, TraceKind};
pub use types::{ActorId, AgentId, TimeMs};
pub use vignette::{MetricDef, Vignette};
