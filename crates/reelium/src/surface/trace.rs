use reel_events::TraceKind;

use super::{Line, Panel, Span, Tone};
use crate::core::{PanelState, PanelStream, TraceLine};

fn style(step: TraceKind) -> (&'static str, &'static str, Tone) {
	match step {
		TraceKind::Thinking => ("?", "Thinking", Tone::Thinking),
		TraceKind::ToolCall => ("\u{2699}", "Tool Call", Tone::Action),
		TraceKind::Observation => ("\u{21B3}", "Result", Tone::Observation),
		TraceKind::Decision => ("\u{2713}", "Decision", Tone::Decision),
		TraceKind::Error => ("!", "Error", Tone::Error),
	}
}

pub fn render(stream: &PanelStream<TraceLine>, state: &PanelState) -> Panel {
	let mut panel = Panel::new(&stream.title);
	if state.is_computing() {
		panel = panel.with_indicator(Span::new("\u{25CF} live", Tone::Accent));
	}

	for step in stream.lines.iter().take(state.visible_count) {
		let (icon, label, tone) = style(step.step);
		let mut spans = vec![Span::new(format!("{icon} "), tone), Span::new(label, tone)];
		if let Some(agent) = &step.agent {
			spans.push(Span::new(format!(" [{agent}]"), Tone::Accent));
		}
		spans.push(Span::plain(format!("  {}", step.content)));
		panel.push(Line::new(spans));
	}

	if state.is_computing() {
		panel.push(Line::from_span(Span::new("\u{2026} computing", Tone::Muted)));
	}

	panel
}
