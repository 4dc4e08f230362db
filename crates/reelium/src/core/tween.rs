use std::sync::Arc;
use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;
use tokio::time::{interval, MissedTickBehavior};
use tracing::debug;

use super::{Clock, PlaybackScope, SequencerConfig, TimeMs};

/// First numeric run: digits, optional thousands separators, optional decimals
static NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d(?:[\d,]*\d)?(?:\.\d+)?").expect("number pattern is valid"));

pub fn ease_out_cubic(progress: f64) -> f64 {
	let p = progress.clamp(0.0, 1.0);
	1.0 - (1.0 - p).powi(3)
}

/// How a metric value is written: the text around its number, grouping and precision
#[derive(Debug, Clone, PartialEq)]
pub struct NumberFormat {
	source: String,
	prefix: String,
	suffix: String,
	target: f64,
	decimals: usize,
	grouped: bool,
}

impl NumberFormat {
	/// `None` when the value has no digits
	pub fn parse(value: &str) -> Option<Self> {
		let found = NUMBER.find(value)?;
		let number = found.as_str();
		let target: f64 = number.replace(',', "").parse().ok()?;

		Some(Self {
			source: value.to_string(),
			prefix: value[..found.start()].to_string(),
			suffix: value[found.end()..].to_string(),
			target,
			decimals: number.split_once('.').map_or(0, |(_, frac)| frac.len()),
			grouped: number.contains(','),
		})
	}

	pub fn target(&self) -> f64 {
		self.target
	}

	/// Render `value` the way the source writes its number
	pub fn format(&self, value: f64) -> String {
		let fixed = format!("{:.*}", self.decimals, value.max(0.0));
		let (int_part, frac_part) = match fixed.split_once('.') {
			Some((i, f)) => (i.to_string(), Some(f.to_string())),
			None => (fixed, None),
		};

		let int_part = if self.grouped { group_thousands(&int_part) } else { int_part };
		match frac_part {
			Some(frac) => format!("{}{}.{}{}", self.prefix, int_part, frac, self.suffix),
			None => format!("{}{}{}", self.prefix, int_part, self.suffix),
		}
	}

	/// Progress 0 renders zero, progress 1 renders the source verbatim
	pub fn at_progress(&self, progress: f64) -> String {
		if progress >= 1.0 {
			return self.source.clone();
		}
		let current = (self.target * ease_out_cubic(progress)).min(self.target);
		self.format(current)
	}
}

fn group_thousands(digits: &str) -> String {
	let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
	for (i, ch) in digits.chars().enumerate() {
		if i > 0 && (digits.len() - i) % 3 == 0 {
			grouped.push(',');
		}
		grouped.push(ch);
	}
	grouped
}

/// Count-up of one metric card
#[derive(Debug, Clone, PartialEq)]
pub struct MetricTween {
	literal: String,
	format: Option<NumberFormat>,
	start_delay_ms: TimeMs,
	duration_ms: TimeMs,
}

impl MetricTween {
	pub fn new(value: &str, start_delay_ms: TimeMs, duration_ms: TimeMs) -> Self {
		Self {
			literal: value.to_string(),
			format: NumberFormat::parse(value),
			start_delay_ms,
			duration_ms: duration_ms.max(1),
		}
	}

	/// Card `index` of a vignette, staggered after the previous one
	pub fn for_card(value: &str, index: usize, config: &SequencerConfig) -> Self {
		let index = TimeMs::try_from(index).unwrap_or(TimeMs::MAX / 2);
		Self::new(value, index.saturating_mul(config.metric_stagger_ms), config.tween_duration_ms)
	}

	/// Displayed text before the tween starts
	pub fn zero(&self) -> String {
		self.format.as_ref().map_or_else(|| self.literal.clone(), |f| f.at_progress(0.0))
	}

	#[allow(clippy::cast_precision_loss)]
	pub fn progress(&self, elapsed_ms: TimeMs) -> f64 {
		let local = elapsed_ms - self.start_delay_ms;
		(local as f64 / self.duration_ms as f64).clamp(0.0, 1.0)
	}

	pub fn sample(&self, elapsed_ms: TimeMs) -> String {
		match &self.format {
			Some(format) => format.at_progress(self.progress(elapsed_ms)),
			None => self.literal.clone(),
		}
	}

	pub fn is_complete(&self, elapsed_ms: TimeMs) -> bool {
		self.format.is_none() || elapsed_ms >= self.start_delay_ms + self.duration_ms
	}
}

/// Per-frame loop driving every metric tween of one playback.
/// Frames go through the scope's gate, so nothing is written once the scope is cancelled.
pub async fn run_frames<F>(tweens: Arc<[MetricTween]>, clock: Arc<dyn Clock>, frame_interval: Duration, scope: PlaybackScope, mut on_frame: F)
where
	F: FnMut(&[String]) + Send + 'static,
{
	if tweens.is_empty() {
		return;
	}

	let origin = clock.now_ms();
	let mut ticker = interval(frame_interval);
	ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

	loop {
		tokio::select! {
			_ = scope.cancelled() => {
				debug!("Tween frames cancelled");
				break;
			}
			_ = ticker.tick() => {
				let elapsed = clock.now_ms() - origin;
				let displays: Vec<String> = tweens.iter().map(|t| t.sample(elapsed)).collect();
				let done = tweens.iter().all(|t| t.is_complete(elapsed));

				if scope.run_gated(|| on_frame(&displays)).is_none() || done {
					break;
				}
			}
		}
	}
}
