use super::{Line, Panel, Span, Tone};
use crate::core::{AgentGraphState, AgentStatus, AgentStream};

const LEGEND: [AgentStatus; 4] = [AgentStatus::Idle, AgentStatus::Thinking, AgentStatus::Executing, AgentStatus::Done];

fn glyph(status: AgentStatus) -> (&'static str, &'static str, Tone) {
	match status {
		AgentStatus::Idle => ("\u{25CB}", "idle", Tone::Muted),
		AgentStatus::Thinking => ("\u{25D0}", "thinking", Tone::Thinking),
		AgentStatus::Executing => ("\u{25CF}", "executing", Tone::Accent),
		AgentStatus::Done => ("\u{2714}", "done", Tone::Done),
	}
}

fn node(label: &str, role: Option<&str>, status: AgentStatus, indent: &str) -> Line {
	let (icon, name, tone) = glyph(status);
	let mut spans = vec![Span::plain(indent), Span::new(format!("{icon} "), tone), Span::new(label, Tone::Plain)];
	if let Some(role) = role {
		spans.push(Span::new(format!(" \u{00B7} {role}"), Tone::Muted));
	}
	spans.push(Span::new(format!("  {name}"), tone));
	Line::new(spans)
}

/// Supervisor and workers with their status, messages in flight, the last
/// `label_capacity` delivered labels and a status legend
pub fn render(title: &str, stream: &AgentStream, state: &AgentGraphState, label_capacity: usize) -> Panel {
	let mut panel = Panel::new(title);
	if !state.active.is_empty() {
		panel = panel.with_indicator(Span::new(format!("\u{25CF} {} in flight", state.active.len()), Tone::Accent));
	}

	let supervisor = &stream.supervisor;
	panel.push(node(&supervisor.label, supervisor.role.as_deref(), state.status_of(&supervisor.id), ""));
	for worker in &stream.workers {
		panel.push(node(&worker.label, worker.role.as_deref(), state.status_of(&worker.id), "  \u{2514}\u{2500} "));
	}

	for &index in &state.active {
		let Some(link) = stream.links.get(index) else { continue };
		panel.push(Line::new(vec![
			Span::new(stream.label_of(&link.from), Tone::Plain),
			Span::new(" \u{2500}\u{25CF}\u{2192} ", Tone::Accent),
			Span::new(stream.label_of(&link.to), Tone::Plain),
			Span::new(format!("  {}", link.label), Tone::Accent),
		]));
	}

	for &index in state.recent_completed(label_capacity) {
		let Some(link) = stream.links.get(index) else { continue };
		panel.push(Line::new(vec![
			Span::new(format!("{} \u{2192} {}", stream.label_of(&link.from), stream.label_of(&link.to)), Tone::Muted),
			Span::new(format!("  {}", link.label), Tone::Done),
		]));
	}

	let legend = LEGEND
		.iter()
		.flat_map(|status| {
			let (icon, name, tone) = glyph(*status);
			[Span::new(format!("{icon} "), tone), Span::new(format!("{name}  "), Tone::Muted)]
		})
		.collect();
	panel.push(Line::new(legend));

	panel
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::core::AgentLink;
	use reel_events::{AgentDef, AgentId};

	fn stream() -> AgentStream {
		AgentStream {
			supervisor: AgentDef::new("sensor", "Sensor Agent").with_role("IoT Reader"),
			workers: vec![AgentDef::new("anomaly", "Anomaly"), AgentDef::new("report", "Reporter")],
			links: vec![
				AgentLink {
					from: "sensor".into(),
					to: "anomaly".into(),
					label: "readings".into(),
				},
				AgentLink {
					from: "anomaly".into(),
					to: "report".into(),
					label: "spike".into(),
				},
				AgentLink {
					from: "report".into(),
					to: "sensor".into(),
					label: "summary".into(),
				},
			],
		}
	}

	fn graph() -> AgentGraphState {
		let roster: Vec<AgentId> = vec!["sensor".into(), "anomaly".into(), "report".into()];
		AgentGraphState::new(&roster)
	}

	#[test]
	fn idle_graph_draws_roster_and_legend() {
		let panel = render("Orchestration", &stream(), &graph(), 2);
		assert_eq!(panel.lines.len(), 4);
		assert!(panel.lines[0].text().contains("Sensor Agent \u{00B7} IoT Reader"));
		assert!(panel.lines[0].text().contains("idle"));
		assert!(panel.lines[3].text().contains("executing"));
		assert!(panel.indicator.is_none());
	}

	#[test]
	fn in_flight_and_recent_labels() {
		let mut state = graph();
		state.completed = vec![0, 1];
		state.active.push(2);
		state.statuses.insert("report".into(), AgentStatus::Executing);

		let panel = render("Orchestration", &stream(), &state, 1);
		let text: Vec<_> = panel.lines.iter().map(Line::text).collect();
		assert!(text[3].starts_with("Reporter \u{2500}\u{25CF}\u{2192} Sensor Agent"));
		assert!(text[4].contains("spike"));
		assert!(!text.iter().any(|l| l.contains("readings")));
		assert!(panel.indicator.is_some());
	}
}
