use super::{Line, Panel, Span, Tone};
use crate::core::MetricState;

pub fn render(title: &str, metrics: &[MetricState]) -> Panel {
	let mut panel = Panel::new(title);
	for metric in metrics {
		let mut value = metric.display.clone();
		if let Some(suffix) = &metric.suffix {
			value.push_str(suffix);
		}
		panel.push(Line::new(vec![Span::new(format!("{value:>10}"), Tone::Accent), Span::new(format!("  {}", metric.label), Tone::Muted)]));
	}
	panel
}
