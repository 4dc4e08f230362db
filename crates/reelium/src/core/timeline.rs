use reel_events::{AgentDef, AgentId, AgentsCast, CalloutStyle, CycleDef, Event, EventKind, Payload, Script, ToolDirection, TraceKind};
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::error::{Result, SequencerError};
use super::{SequencerConfig, TimeMs, UnknownActorPolicy};

// ============================================================================
// Cues
// ============================================================================

/// Render surface that owns a revealed item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Surface {
	Chat,
	Trace,
	Tools,
	Showcase,
}

/// One compiled state transition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "cue", rename_all = "snake_case")]
pub enum Cue {
	/// Responder typing indicator
	ShowTyping,
	/// Item `index` of a surface's stream becomes visible
	Reveal { surface: Surface, index: usize },
	/// Agent message `index` leaves `from`
	Dispatch { index: usize, from: AgentId, to: AgentId },
	/// Agent message `index` arrives at `to`
	Deliver { index: usize, from: AgentId, to: AgentId },
	/// Every agent settles to done
	Settle,
	/// Showcase progress bar `index` reaches `percent`
	Advance { index: usize, percent: u8 },
}

/// A cue with its due time; `seq` breaks ties between equal times
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimedCue {
	pub at: TimeMs,
	pub seq: u32,
	pub cue: Cue,
}

// ============================================================================
// Streams
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Speaker {
	User,
	Responder,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatLine {
	pub speaker: Speaker,
	pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceLine {
	pub step: TraceKind,
	pub agent: Option<String>,
	pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolLine {
	pub direction: ToolDirection,
	pub tool: String,
	pub body: serde_json::Value,
	pub latency: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentLink {
	pub from: AgentId,
	pub to: AgentId,
	pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "item", rename_all = "snake_case")]
pub enum ShowcaseItem {
	Callout { style: CalloutStyle, content: String },
	Progress { label: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShowcaseStream {
	pub title: String,
	pub items: Vec<ShowcaseItem>,
	pub cycle: Option<CycleDef>,
}

impl ShowcaseStream {
	/// A cycle needs at least two options and a positive period to rotate
	pub fn rotating_cycle(&self) -> Option<&CycleDef> {
		self.cycle.as_ref().filter(|c| c.options.len() > 1 && c.period_ms > 0)
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatStream {
	pub title: String,
	pub lines: Vec<ChatLine>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PanelStream<T> {
	pub title: String,
	pub lines: Vec<T>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentStream {
	pub supervisor: AgentDef,
	pub workers: Vec<AgentDef>,
	pub links: Vec<AgentLink>,
}

impl AgentStream {
	pub fn roster(&self) -> impl Iterator<Item = &AgentDef> {
		std::iter::once(&self.supervisor).chain(self.workers.iter())
	}

	pub fn label_of<'a>(&'a self, agent: &'a str) -> &'a str {
		self.roster().find(|a| a.id == agent).map_or(agent, |a| a.label.as_str())
	}
}

/// Per-surface item lists, each in reveal order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Streams {
	pub chat: Option<ChatStream>,
	pub trace: Option<PanelStream<TraceLine>>,
	pub tools: Option<PanelStream<ToolLine>>,
	pub agents: Option<AgentStream>,
	pub showcase: Option<ShowcaseStream>,
}

impl Streams {
	pub fn chat_len(&self) -> usize {
		self.chat.as_ref().map_or(0, |c| c.lines.len())
	}

	pub fn trace_len(&self) -> usize {
		self.trace.as_ref().map_or(0, |t| t.lines.len())
	}

	pub fn tools_len(&self) -> usize {
		self.tools.as_ref().map_or(0, |t| t.lines.len())
	}

	pub fn showcase_len(&self) -> usize {
		self.showcase.as_ref().map_or(0, |s| s.items.len())
	}

	pub fn rotating_cycle(&self) -> Option<&CycleDef> {
		self.showcase.as_ref().and_then(ShowcaseStream::rotating_cycle)
	}
}

// ============================================================================
// Timeline
// ============================================================================

/// An immutable timeline of cues, sorted by `(at, seq)`
#[derive(Debug, Clone)]
pub struct Timeline {
	cues: Box<[TimedCue]>,
	streams: Streams,
	total_duration: TimeMs,
}

impl Timeline {
	/// Resolve every event to its surface and expand it into cues
	pub fn compile(script: &Script, config: &SequencerConfig) -> Result<Self> {
		config.validate().map_err(SequencerError::InvalidConfig)?;
		script.validate_offsets()?;

		let accepted = resolve(script, config.unknown_actor)?;

		// Stable sort per surface: equal offsets keep declaration order
		let mut chat: Vec<&Event> = accepted.iter().filter(|(s, _)| *s == Owner::Chat).map(|(_, e)| *e).collect();
		let mut trace: Vec<&Event> = accepted.iter().filter(|(s, _)| *s == Owner::Trace).map(|(_, e)| *e).collect();
		let mut tools: Vec<&Event> = accepted.iter().filter(|(s, _)| *s == Owner::Tools).map(|(_, e)| *e).collect();
		let mut agents: Vec<&Event> = accepted.iter().filter(|(s, _)| *s == Owner::Agents).map(|(_, e)| *e).collect();
		let mut showcase: Vec<&Event> = accepted.iter().filter(|(s, _)| *s == Owner::Showcase).map(|(_, e)| *e).collect();
		for stream in [&mut chat, &mut trace, &mut tools, &mut agents, &mut showcase] {
			stream.sort_by_key(|e| e.offset_ms);
		}

		let mut cues = Vec::new();
		let mut seq: u32 = 0;
		let mut push = |at: TimeMs, cue: Cue| {
			cues.push(TimedCue { at, seq, cue });
			seq += 1;
		};

		let responder = script.cast.chat.as_ref().map(|c| c.responder.as_str());
		let mut last_agent_offset: Option<TimeMs> = None;

		for (owner, event) in &accepted {
			let offset = event.offset_ms;
			match owner {
				Owner::Chat => {
					let index = position_of(&chat, event);
					if Some(event.actor.as_str()) == responder {
						push((offset - config.typing_preroll_ms).max(0), Cue::ShowTyping);
					}
					push(offset, Cue::Reveal { surface: Surface::Chat, index });
				}
				Owner::Trace => push(offset, Cue::Reveal { surface: Surface::Trace, index: position_of(&trace, event) }),
				Owner::Tools => push(offset, Cue::Reveal { surface: Surface::Tools, index: position_of(&tools, event) }),
				Owner::Agents => {
					let Payload::AgentMessage { from, to, .. } = &event.payload else { continue };
					let index = position_of(&agents, event);
					let start = config.agent_start_delay_ms + offset;
					push(
						start,
						Cue::Dispatch {
							index,
							from: from.clone(),
							to: to.clone(),
						},
					);
					push(
						start + config.agent_travel_ms,
						Cue::Deliver {
							index,
							from: from.clone(),
							to: to.clone(),
						},
					);
					last_agent_offset = last_agent_offset.max(Some(offset));
				}
				Owner::Showcase => {
					let index = position_of(&showcase, event);
					push(offset, Cue::Reveal { surface: Surface::Showcase, index });
					if let Payload::Progress { duration_ms, steps, .. } = &event.payload {
						let steps = (*steps).max(1);
						let duration = (*duration_ms).max(0);
						for step in 1..=steps {
							let at = offset + duration * TimeMs::from(step) / TimeMs::from(steps);
							let percent = u8::try_from(step * 100 / steps).unwrap_or(100);
							push(at, Cue::Advance { index, percent });
						}
					}
				}
			}
		}

		if let Some(last) = last_agent_offset {
			push(last + config.agent_start_delay_ms + config.sweep_tail_ms, Cue::Settle);
		}

		cues.sort_by_key(|c| (c.at, c.seq));
		let total_duration = cues.last().map_or(0, |c| c.at);

		let streams = build_streams(script, &chat, &trace, &tools, &agents, &showcase);

		Ok(Self {
			cues: cues.into_boxed_slice(),
			streams,
			total_duration,
		})
	}

	pub fn total_duration(&self) -> TimeMs {
		self.total_duration
	}

	pub fn is_empty(&self) -> bool {
		self.cues.is_empty()
	}

	pub fn len(&self) -> usize {
		self.cues.len()
	}

	pub fn cues(&self) -> &[TimedCue] {
		&self.cues
	}

	pub fn streams(&self) -> &Streams {
		&self.streams
	}

	/// Create a cursor for this timeline
	pub fn cursor(&self) -> Cursor {
		Cursor::new()
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Owner {
	Chat,
	Trace,
	Tools,
	Agents,
	Showcase,
}

/// Pair each event with the surface that owns its actor, in declaration order
fn resolve(script: &Script, policy: UnknownActorPolicy) -> Result<Vec<(Owner, &Event)>> {
	let cast = &script.cast;
	let mut accepted = Vec::with_capacity(script.len());

	for event in script.events() {
		let actor = event.actor.as_str();
		let resolved = match &event.payload {
			Payload::Message { .. } => cast.chat.as_ref().filter(|c| c.user == actor || c.responder == actor).map(|_| Owner::Chat).ok_or_else(|| unknown_actor(event)),
			Payload::TraceStep { .. } => cast.trace.as_ref().filter(|p| p.id == actor).map(|_| Owner::Trace).ok_or_else(|| unknown_actor(event)),
			Payload::ToolCall { .. } => cast.tools.as_ref().filter(|p| p.id == actor).map(|_| Owner::Tools).ok_or_else(|| unknown_actor(event)),
			Payload::AgentMessage { from, to, .. } => match cast.agents.as_ref().filter(|a| a.id == actor) {
				None => Err(unknown_actor(event)),
				Some(agents) => check_roster(agents, from).and_then(|()| check_roster(agents, to)).map(|()| Owner::Agents),
			},
			Payload::Callout { .. } | Payload::Progress { .. } => cast.showcase.as_ref().filter(|s| s.id == actor).map(|_| Owner::Showcase).ok_or_else(|| unknown_actor(event)),
		};

		match resolved {
			Ok(owner) => accepted.push((owner, event)),
			Err(e) => match policy {
				UnknownActorPolicy::Reject => return Err(e),
				UnknownActorPolicy::Drop => warn!(offset_ms = event.offset_ms, actor = %event.actor, "Dropping event: {}", e),
			},
		}
	}

	Ok(accepted)
}

/// Index of `event` within its sorted surface stream
fn position_of(stream: &[&Event], event: &Event) -> usize {
	stream.iter().position(|e| std::ptr::eq(*e, event)).unwrap_or_default()
}

fn unknown_actor(event: &Event) -> SequencerError {
	SequencerError::UnknownActor {
		actor: event.actor.clone(),
		kind: event.kind(),
	}
}

fn check_roster(agents: &AgentsCast, agent: &str) -> Result<()> {
	if agents.contains(agent) {
		Ok(())
	} else {
		Err(SequencerError::UnknownAgent { agent: agent.to_string() })
	}
}

fn build_streams(script: &Script, chat: &[&Event], trace: &[&Event], tools: &[&Event], agents: &[&Event], showcase: &[&Event]) -> Streams {
	let cast = &script.cast;

	let chat = cast.chat.as_ref().map(|c| ChatStream {
		title: c.title.clone(),
		lines: chat
			.iter()
			.filter_map(|e| match &e.payload {
				Payload::Message { content } => Some(ChatLine {
					speaker: if e.actor == c.responder { Speaker::Responder } else { Speaker::User },
					content: content.clone(),
				}),
				_ => None,
			})
			.collect(),
	});

	let trace = cast.trace.as_ref().map(|p| PanelStream {
		title: p.title.clone(),
		lines: trace
			.iter()
			.filter_map(|e| match &e.payload {
				Payload::TraceStep { step, agent, content } => Some(TraceLine {
					step: *step,
					agent: agent.clone(),
					content: content.clone(),
				}),
				_ => None,
			})
			.collect(),
	});

	let tools = cast.tools.as_ref().map(|p| PanelStream {
		title: p.title.clone(),
		lines: tools
			.iter()
			.filter_map(|e| match &e.payload {
				Payload::ToolCall { direction, tool, body, latency } => Some(ToolLine {
					direction: *direction,
					tool: tool.clone(),
					body: body.clone(),
					latency: latency.clone(),
				}),
				_ => None,
			})
			.collect(),
	});

	let agents = cast.agents.as_ref().map(|a| AgentStream {
		supervisor: a.supervisor.clone(),
		workers: a.workers.clone(),
		links: agents
			.iter()
			.filter_map(|e| match &e.payload {
				Payload::AgentMessage { from, to, label } => Some(AgentLink {
					from: from.clone(),
					to: to.clone(),
					label: label.clone(),
				}),
				_ => None,
			})
			.collect(),
	});

	let showcase = cast.showcase.as_ref().map(|s| ShowcaseStream {
		title: s.title.clone(),
		items: showcase
			.iter()
			.filter_map(|e| match &e.payload {
				Payload::Callout { style, content } => Some(ShowcaseItem::Callout {
					style: *style,
					content: content.clone(),
				}),
				Payload::Progress { label, .. } => Some(ShowcaseItem::Progress { label: label.clone() }),
				_ => None,
			})
			.collect(),
		cycle: s.cycle.clone(),
	});

	Streams {
		chat,
		trace,
		tools,
		agents,
		showcase,
	}
}

// ============================================================================
// Cursor
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct Cursor {
	frontier: usize,
}

impl Cursor {
	pub fn new() -> Self {
		Self { frontier: 0 }
	}

	pub fn reset(&mut self) {
		self.frontier = 0;
	}

	pub fn applied_frontier(&self) -> usize {
		self.frontier
	}

	/// Due time of the next unapplied cue
	pub fn next_at(&self, timeline: &Timeline) -> Option<TimeMs> {
		timeline.cues().get(self.frontier).map(|c| c.at)
	}

	/// Apply cues up to (and including) the given time.
	/// Each cue is applied exactly once; the frontier never moves backwards.
	pub fn apply_until<F>(&mut self, timeline: &Timeline, time: TimeMs, mut on_cue: F)
	where
		F: FnMut(&TimedCue),
	{
		let cues = timeline.cues();

		while self.frontier < cues.len() {
			let cue = &cues[self.frontier];
			if cue.at > time {
				break;
			}

			on_cue(cue);
			self.frontier += 1;
		}
	}
}
