use reel_events::ToolDirection;

use super::{Line, Panel, Span, Tone};
use crate::core::{PanelState, PanelStream, ToolLine};

pub fn render(stream: &PanelStream<ToolLine>, state: &PanelState) -> Panel {
	let mut panel = Panel::new(&stream.title);

	for call in stream.lines.iter().take(state.visible_count) {
		let (arrow, verb, tone) = match call.direction {
			ToolDirection::Request => ("\u{2192}", "tool_use", Tone::Action),
			ToolDirection::Response => ("\u{2190}", "tool_result", Tone::Observation),
		};

		let mut header = vec![Span::new(format!("{arrow} {verb}: "), tone), Span::new(&call.tool, Tone::Accent)];
		if let Some(latency) = &call.latency {
			header.push(Span::new(format!("  {latency}"), Tone::Muted));
		}
		panel.push(Line::new(header));

		if !call.body.is_null() {
			let body = serde_json::to_string(&call.body).unwrap_or_default();
			panel.push(Line::from_span(Span::new(format!("  {body}"), Tone::Muted)));
		}
	}

	panel
}
