use reel_events::Vignette;
use reelium::core::{CompiledVignette, VignetteState};
use reelium::surface::{self, Line, Panel, Span, Tone};

pub const AGENTS_TITLE: &str = "Agent Orchestration";
pub const METRICS_TITLE: &str = "Impact";

pub fn header(vignette: &Vignette) -> Line {
	Line::new(vec![
		Span::new(format!("{} ", vignette.number), Tone::Accent),
		Span::new(&vignette.title, Tone::Plain),
		Span::new(format!("  {}", vignette.subtitle), Tone::Muted),
	])
}

/// Every surface the vignette's cast has, in reading order, showcase then metrics last
pub fn panels(compiled: &CompiledVignette, state: &VignetteState, label_capacity: usize) -> Vec<Panel> {
	let streams = compiled.timeline().streams();
	let mut panels = Vec::with_capacity(6);

	if let Some(chat) = &streams.chat {
		panels.push(surface::chat::render(chat, &state.chat));
	}
	if let Some(trace) = &streams.trace {
		panels.push(surface::trace::render(trace, &state.trace));
	}
	if let Some(tools) = &streams.tools {
		panels.push(surface::tools::render(tools, &state.tools));
	}
	if let Some(agents) = &streams.agents {
		panels.push(surface::agents::render(AGENTS_TITLE, agents, &state.agents, label_capacity));
	}
	if let Some(showcase) = &streams.showcase {
		panels.push(surface::showcase::render(showcase, &state.showcase));
	}
	if !state.metrics.is_empty() {
		panels.push(surface::metrics::render(METRICS_TITLE, &state.metrics));
	}
	panels
}

/// Rows needed to paint `panels`: a title row per panel, its lines, one blank row after
pub fn height(panels: &[Panel]) -> usize {
	panels.iter().map(|panel| panel.lines.len() + 2).sum()
}

/// Rows the vignette needs once everything has been revealed
pub fn full_height(compiled: &CompiledVignette, label_capacity: usize) -> usize {
	let timeline = compiled.timeline();
	let mut state = compiled.initial_state();
	state.reconstruct_at(timeline, timeline.total_duration());
	// header row plus the tab strip
	height(&panels(compiled, &state, label_capacity)) + 2
}
