use reel_events::CalloutStyle;

use super::{Line, Panel, Span, Tone};
use crate::core::{ShowcaseItem, ShowcaseState, ShowcaseStream};

const BAR_WIDTH: usize = 20;

fn bar(percent: u8) -> String {
	let filled = usize::from(percent.min(100)) * BAR_WIDTH / 100;
	format!("[{}{}]", "\u{2588}".repeat(filled), "\u{2591}".repeat(BAR_WIDTH - filled))
}

fn callout(style: CalloutStyle, content: &str) -> Line {
	match style {
		CalloutStyle::Heading => Line::from_span(Span::new(content, Tone::Accent)),
		CalloutStyle::Body => Line::from_span(Span::plain(content)),
		CalloutStyle::Alert => Line::new(vec![Span::new("\u{26A0} ", Tone::Error), Span::new(content, Tone::Error)]),
	}
}

pub fn render(stream: &ShowcaseStream, state: &ShowcaseState) -> Panel {
	let mut panel = Panel::new(&stream.title);

	if let Some(cycle) = &stream.cycle {
		let strip = cycle
			.options
			.iter()
			.enumerate()
			.map(|(index, option)| {
				let tone = if index == state.cycle_index { Tone::Accent } else { Tone::Muted };
				Span::new(format!(" {} ", option.name), tone)
			})
			.collect();
		panel.push(Line::new(strip));
		if let Some(active) = cycle.options.get(state.cycle_index).filter(|o| !o.detail.is_empty()) {
			panel.push(Line::from_span(Span::plain(&active.detail)));
		}
	}

	let mut scanning = false;
	for (index, item) in stream.items.iter().enumerate().take(state.visible_count) {
		match item {
			ShowcaseItem::Callout { style, content } => panel.push(callout(*style, content)),
			ShowcaseItem::Progress { label } => {
				let percent = state.percent_of(index);
				scanning |= percent < 100;
				let tone = if percent < 100 { Tone::Accent } else { Tone::Done };
				panel.push(Line::new(vec![
					Span::plain(format!("{label} ")),
					Span::new(bar(percent), tone),
					Span::new(format!(" {percent}%"), tone),
				]));
			}
		}
	}

	if scanning {
		panel = panel.with_indicator(Span::new("\u{25CF} scanning", Tone::Accent));
	}

	panel
}
