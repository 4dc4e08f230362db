use serde::{Deserialize, Serialize};

use crate::error::{EventsError, Result};
use crate::types::{ActorId, AgentId, TimeMs};

// ============================================================================
// Events
// ============================================================================

/// One authored, timed event of a vignette script
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
	/// Offset from the activation edge
	pub offset_ms: TimeMs,
	/// Actor the event targets; resolved against the script's [`Cast`]
	pub actor: ActorId,
	#[serde(flatten)]
	pub payload: Payload,
}

impl Event {
	pub fn new(offset_ms: TimeMs, actor: impl Into<ActorId>, payload: Payload) -> Self {
		Self {
			offset_ms,
			actor: actor.into(),
			payload,
		}
	}

	pub fn message(offset_ms: TimeMs, actor: impl Into<ActorId>, content: impl Into<String>) -> Self {
		Self::new(offset_ms, actor, Payload::Message { content: content.into() })
	}

	pub fn trace_step(offset_ms: TimeMs, actor: impl Into<ActorId>, step: TraceKind, agent: Option<&str>, content: impl Into<String>) -> Self {
		Self::new(
			offset_ms,
			actor,
			Payload::TraceStep {
				step,
				agent: agent.map(String::from),
				content: content.into(),
			},
		)
	}

	pub fn tool_call(offset_ms: TimeMs, actor: impl Into<ActorId>, direction: ToolDirection, tool: impl Into<String>, body: serde_json::Value) -> Self {
		Self::new(
			offset_ms,
			actor,
			Payload::ToolCall {
				direction,
				tool: tool.into(),
				body,
				latency: None,
			},
		)
	}

	pub fn agent_message(offset_ms: TimeMs, actor: impl Into<ActorId>, from: impl Into<AgentId>, to: impl Into<AgentId>, label: impl Into<String>) -> Self {
		Self::new(
			offset_ms,
			actor,
			Payload::AgentMessage {
				from: from.into(),
				to: to.into(),
				label: label.into(),
			},
		)
	}

	pub fn callout(offset_ms: TimeMs, actor: impl Into<ActorId>, style: CalloutStyle, content: impl Into<String>) -> Self {
		Self::new(offset_ms, actor, Payload::Callout { style, content: content.into() })
	}

	pub fn progress(offset_ms: TimeMs, actor: impl Into<ActorId>, label: impl Into<String>, duration_ms: TimeMs, steps: u32) -> Self {
		Self::new(
			offset_ms,
			actor,
			Payload::Progress {
				label: label.into(),
				duration_ms,
				steps,
			},
		)
	}

	pub fn kind(&self) -> EventKind {
		self.payload.kind()
	}
}

/// Discriminant of [`Payload`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
	Message,
	TraceStep,
	ToolCall,
	AgentMessage,
	Callout,
	Progress,
}

impl std::fmt::Display for EventKind {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let name = match self {
			Self::Message => "message",
			Self::TraceStep => "trace_step",
			Self::ToolCall => "tool_call",
			Self::AgentMessage => "agent_message",
			Self::Callout => "callout",
			Self::Progress => "progress",
		};
		f.write_str(name)
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Payload {
	/// Chat bubble spoken by the event's actor
	Message { content: String },
	/// One line of the reasoning trace
	TraceStep {
		step: TraceKind,
		#[serde(default, skip_serializing_if = "Option::is_none")]
		agent: Option<String>,
		content: String,
	},
	/// One entry of the tool-call log
	ToolCall {
		direction: ToolDirection,
		tool: String,
		#[serde(default)]
		body: serde_json::Value,
		#[serde(default, skip_serializing_if = "Option::is_none")]
		latency: Option<String>,
	},
	/// A message travelling between two agents of the orchestration diagram
	AgentMessage { from: AgentId, to: AgentId, label: String },
	/// A line of the showcase panel: alert card, table row, drafted text
	Callout {
		#[serde(default)]
		style: CalloutStyle,
		content: String,
	},
	/// A bar on the showcase panel filling from 0 to 100% over `duration_ms` in `steps` increments
	Progress {
		label: String,
		duration_ms: TimeMs,
		#[serde(default = "default_progress_steps")]
		steps: u32,
	},
}

const fn default_progress_steps() -> u32 {
	50
}

impl Payload {
	pub fn kind(&self) -> EventKind {
		match self {
			Self::Message { .. } => EventKind::Message,
			Self::TraceStep { .. } => EventKind::TraceStep,
			Self::ToolCall { .. } => EventKind::ToolCall,
			Self::AgentMessage { .. } => EventKind::AgentMessage,
			Self::Callout { .. } => EventKind::Callout,
			Self::Progress { .. } => EventKind::Progress,
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraceKind {
	Thinking,
	ToolCall,
	Observation,
	Decision,
	Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolDirection {
	Request,
	Response,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalloutStyle {
	Heading,
	#[default]
	Body,
	Alert,
}

// ============================================================================
// Cast
// ============================================================================

/// Chat participants: the user and the responder whose messages get a typing pre-roll
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatCast {
	pub title: String,
	pub user: ActorId,
	pub responder: ActorId,
}

/// A single-actor panel (reasoning trace, tool-call log)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PanelCast {
	pub id: ActorId,
	pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentDef {
	pub id: AgentId,
	pub label: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub role: Option<String>,
}

impl AgentDef {
	pub fn new(id: impl Into<AgentId>, label: impl Into<String>) -> Self {
		Self {
			id: id.into(),
			label: label.into(),
			role: None,
		}
	}

	pub fn with_role(mut self, role: impl Into<String>) -> Self {
		self.role = Some(role.into());
		self
	}
}

/// Orchestration diagram: one supervisor fanning out to workers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentsCast {
	pub id: ActorId,
	pub supervisor: AgentDef,
	pub workers: Vec<AgentDef>,
}

impl AgentsCast {
	/// Supervisor first, then workers in declaration order
	pub fn roster(&self) -> impl Iterator<Item = &AgentDef> {
		std::iter::once(&self.supervisor).chain(self.workers.iter())
	}

	pub fn contains(&self, agent: &str) -> bool {
		self.roster().any(|a| a.id == agent)
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleOption {
	pub name: String,
	#[serde(default)]
	pub detail: String,
}

impl CycleOption {
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			detail: String::new(),
		}
	}

	pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
		self.detail = detail.into();
		self
	}
}

/// Options the showcase rotates through every `period_ms` while active
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleDef {
	pub period_ms: TimeMs,
	pub options: Vec<CycleOption>,
}

/// The vignette's own visual panel: timed callouts, progress bars and an optional rotating selector
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShowcaseCast {
	pub id: ActorId,
	pub title: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub cycle: Option<CycleDef>,
}

/// Which actors a script may address, and the surface that owns each of them
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cast {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub chat: Option<ChatCast>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub trace: Option<PanelCast>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub tools: Option<PanelCast>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub agents: Option<AgentsCast>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub showcase: Option<ShowcaseCast>,
}

impl Cast {
	pub fn with_chat(mut self, title: impl Into<String>, user: impl Into<ActorId>, responder: impl Into<ActorId>) -> Self {
		self.chat = Some(ChatCast {
			title: title.into(),
			user: user.into(),
			responder: responder.into(),
		});
		self
	}

	pub fn with_trace(mut self, id: impl Into<ActorId>, title: impl Into<String>) -> Self {
		self.trace = Some(PanelCast { id: id.into(), title: title.into() });
		self
	}

	pub fn with_tools(mut self, id: impl Into<ActorId>, title: impl Into<String>) -> Self {
		self.tools = Some(PanelCast { id: id.into(), title: title.into() });
		self
	}

	pub fn with_agents(mut self, id: impl Into<ActorId>, supervisor: AgentDef, workers: Vec<AgentDef>) -> Self {
		self.agents = Some(AgentsCast {
			id: id.into(),
			supervisor,
			workers,
		});
		self
	}

	pub fn with_showcase(mut self, id: impl Into<ActorId>, title: impl Into<String>, cycle: Option<CycleDef>) -> Self {
		self.showcase = Some(ShowcaseCast {
			id: id.into(),
			title: title.into(),
			cycle,
		});
		self
	}
}

// ============================================================================
// Script
// ============================================================================

/// The immutable, authored event list of one vignette
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Script {
	pub cast: Cast,
	pub events: Vec<Event>,
}

impl Script {
	pub fn new(cast: Cast, events: Vec<Event>) -> Self {
		Self { cast, events }
	}

	pub fn events(&self) -> &[Event] {
		&self.events
	}

	pub fn len(&self) -> usize {
		self.events.len()
	}

	pub fn is_empty(&self) -> bool {
		self.events.is_empty()
	}

	pub fn validate_offsets(&self) -> Result<()> {
		match self.events.iter().enumerate().find(|(_, e)| e.offset_ms < 0) {
			Some((index, event)) => Err(EventsError::NegativeOffset {
				index,
				actor: event.actor.clone(),
				offset_ms: event.offset_ms,
			}),
			None => Ok(()),
		}
	}

	pub fn from_json(json: &str) -> Result<Self> {
		let script: Self = serde_json::from_str(json)?;
		script.validate_offsets()?;
		Ok(script)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn showcase_payloads_and_cycle() {
		let json = r#"{
			"cast": { "showcase": { "id": "visual", "title": "Scenario Modeling",
				"cycle": { "period_ms": 3500, "options": [ { "name": "Residential Focus", "detail": "Livability 88" }, { "name": "Mixed-Use" } ] } } },
			"events": [
				{ "offset_ms": 0, "actor": "visual", "kind": "progress", "label": "Structural scan", "duration_ms": 2000 },
				{ "offset_ms": 2800, "actor": "visual", "kind": "callout", "style": "alert", "content": "Anomaly Detected" },
				{ "offset_ms": 3000, "actor": "visual", "kind": "callout", "content": "GDP Growth" }
			]
		}"#;

		let script = Script::from_json(json).unwrap();
		let showcase = script.cast.showcase.as_ref().unwrap();
		let cycle = showcase.cycle.as_ref().unwrap();
		assert_eq!(cycle.period_ms, 3500);
		assert_eq!(cycle.options[1].detail, "");

		assert_eq!(script.events()[0].kind(), EventKind::Progress);
		assert!(matches!(script.events()[0].payload, Payload::Progress { steps: 50, duration_ms: 2000, .. }));
		assert!(matches!(script.events()[1].payload, Payload::Callout { style: CalloutStyle::Alert, .. }));
		assert!(matches!(script.events()[2].payload, Payload::Callout { style: CalloutStyle::Body, .. }));
		assert_eq!(EventKind::Callout.to_string(), "callout");
	}

	#[test]
	fn payload_is_tagged_by_kind() {
		let json = r#"{
			"cast": { "trace": { "id": "trace", "title": "ReAct Trace" } },
			"events": [
				{ "offset_ms": 600, "actor": "trace", "kind": "trace_step", "step": "tool_call", "agent": "Vision", "content": "analyze_image()" },
				{ "offset_ms": 400, "actor": "tools", "kind": "tool_call", "direction": "response", "tool": "compose_email", "body": { "paragraphs": 4 }, "latency": "89ms" }
			]
		}"#;

		let script = Script::from_json(json).unwrap();
		assert_eq!(script.events()[0].kind(), EventKind::TraceStep);
		assert_eq!(script.events()[1].kind(), EventKind::ToolCall);
		match &script.events()[1].payload {
			Payload::ToolCall { body, latency, .. } => {
				assert_eq!(body["paragraphs"], 4);
				assert_eq!(latency.as_deref(), Some("89ms"));
			}
			other => panic!("unexpected payload {other:?}"),
		}
	}

	#[test]
	fn negative_offsets_are_rejected() {
		let json = r#"{ "cast": {}, "events": [ { "offset_ms": -5, "actor": "user", "kind": "message", "content": "hi" } ] }"#;
		assert!(matches!(Script::from_json(json), Err(EventsError::NegativeOffset { index: 0, .. })));
	}

	#[test]
	fn roster_lists_supervisor_first() {
		let cast = Cast::default().with_agents("agents", AgentDef::new("sensor", "Sensor Agent"), vec![AgentDef::new("anomaly", "Anomaly")]);
		let agents = cast.agents.unwrap();
		let ids: Vec<_> = agents.roster().map(|a| a.id.as_str()).collect();
		assert_eq!(ids, vec!["sensor", "anomaly"]);
		assert!(agents.contains("anomaly"));
		assert!(!agents.contains("diagnostic"));
	}
}
