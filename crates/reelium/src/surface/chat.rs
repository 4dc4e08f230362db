use super::{Line, Panel, Span, Tone};
use crate::core::{ChatState, ChatStream, Speaker};

const TYPING: &str = "\u{2022}\u{2022}\u{2022}";

pub fn render(stream: &ChatStream, state: &ChatState) -> Panel {
	let mut panel = Panel::new(&stream.title);
	if state.shows_typing() {
		panel = panel.with_indicator(Span::new("\u{25CF} typing", Tone::Accent));
	}

	for line in stream.lines.iter().take(state.visible_count) {
		match line.speaker {
			Speaker::User => panel.push(Line::from_span(Span::new(&line.content, Tone::User)).right()),
			Speaker::Responder => panel.push(Line::from_span(Span::new(&line.content, Tone::Responder))),
		}
	}

	if state.shows_typing() {
		panel.push(Line::from_span(Span::new(TYPING, Tone::Muted)));
	}

	panel
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::core::ChatLine;
	use crate::surface::Align;

	fn stream() -> ChatStream {
		ChatStream {
			title: "Investor Chat".into(),
			lines: vec![
				ChatLine {
					speaker: Speaker::User,
					content: "What is the yield?".into(),
				},
				ChatLine {
					speaker: Speaker::Responder,
					content: "Roughly 7%.".into(),
				},
			],
		}
	}

	#[test]
	fn only_visible_bubbles_are_drawn() {
		let state = ChatState {
			visible_count: 1,
			total: 2,
			typing: false,
		};
		let panel = render(&stream(), &state);
		assert_eq!(panel.lines.len(), 1);
		assert_eq!(panel.lines[0].align, Align::Right);
		assert!(panel.indicator.is_none());
	}

	#[test]
	fn typing_bubble_follows_the_last_visible_message() {
		let state = ChatState {
			visible_count: 1,
			total: 2,
			typing: true,
		};
		let panel = render(&stream(), &state);
		assert_eq!(panel.lines.len(), 2);
		assert_eq!(panel.lines[1].text(), TYPING);
		assert!(panel.indicator.is_some());

		let done = ChatState {
			visible_count: 2,
			total: 2,
			typing: true,
		};
		assert!(!render(&stream(), &done).lines.iter().any(|l| l.text() == TYPING));
	}
}
