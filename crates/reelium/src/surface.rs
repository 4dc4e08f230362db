//! Render surfaces: pure functions from a stream and its reducer state to a styled panel.
//! They own no timers; whoever paints them decides colours for each [`Tone`].

pub mod agents;
pub mod chat;
pub mod metrics;
pub mod showcase;
pub mod tools;
pub mod trace;

use serde::{Deserialize, Serialize};

/// Semantic colour of a span
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
	Plain,
	Muted,
	Accent,
	User,
	Responder,
	Thinking,
	Action,
	Observation,
	Decision,
	Error,
	Done,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Align {
	#[default]
	Left,
	Right,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
	pub text: String,
	pub tone: Tone,
}

impl Span {
	pub fn new(text: impl Into<String>, tone: Tone) -> Self {
		Self { text: text.into(), tone }
	}

	pub fn plain(text: impl Into<String>) -> Self {
		Self::new(text, Tone::Plain)
	}
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Line {
	pub spans: Vec<Span>,
	pub align: Align,
}

impl Line {
	pub fn new(spans: Vec<Span>) -> Self {
		Self { spans, align: Align::Left }
	}

	pub fn from_span(span: Span) -> Self {
		Self::new(vec![span])
	}

	pub fn right(mut self) -> Self {
		self.align = Align::Right;
		self
	}

	pub fn text(&self) -> String {
		self.spans.iter().map(|s| s.text.as_str()).collect()
	}

	pub fn width(&self) -> usize {
		self.spans.iter().map(|s| s.text.chars().count()).sum()
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Panel {
	pub title: String,
	/// Header badge, e.g. a live pulse while something is in progress
	pub indicator: Option<Span>,
	pub lines: Vec<Line>,
}

impl Panel {
	pub fn new(title: impl Into<String>) -> Self {
		Self {
			title: title.into(),
			indicator: None,
			lines: Vec::new(),
		}
	}

	pub fn with_indicator(mut self, indicator: Span) -> Self {
		self.indicator = Some(indicator);
		self
	}

	pub fn push(&mut self, line: Line) {
		self.lines.push(line);
	}
}
