use clap::{Parser, ValueEnum};
use reelium::core::{SequencerConfig, TimeMs, UnknownActorPolicy};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
	/// Interactive terminal stage with every vignette as a tab
	#[default]
	Tui,
	/// Play one vignette and print each state change as a JSON line
	Headless,
}

#[derive(Parser, Clone, Debug, Serialize, Deserialize)]
#[command(author, version, about, long_about = None)]
pub struct Config {
	#[arg(long, value_enum, env = "SHOWREEL_MODE", default_value = "tui", help = "Front end to run")]
	pub mode: Mode,

	#[arg(long, env = "SHOWREEL_VIGNETTE", default_value = "investment", help = "Vignette selected at startup")]
	pub vignette: String,

	#[arg(long, env = "TYPING_PREROLL_MS", default_value = "1200", help = "How long the typing indicator leads a responder message")]
	pub typing_preroll_ms: TimeMs,

	#[arg(long, env = "AGENT_START_DELAY_MS", default_value = "600", help = "Delay added to every agent message offset")]
	pub agent_start_delay_ms: TimeMs,

	#[arg(long, env = "AGENT_TRAVEL_MS", default_value = "800", help = "Time an agent message spends in flight")]
	pub agent_travel_ms: TimeMs,

	#[arg(long, env = "SWEEP_TAIL_MS", default_value = "1600", help = "Pause after the last agent message before all agents settle")]
	pub sweep_tail_ms: TimeMs,

	#[arg(long, env = "COMPLETED_LABELS", default_value = "2", help = "Delivered agent messages kept on screen")]
	pub completed_labels: usize,

	#[arg(long, env = "TWEEN_DURATION_MS", default_value = "1500", help = "Metric count-up duration")]
	pub tween_duration_ms: TimeMs,

	#[arg(long, env = "METRIC_STAGGER_MS", default_value = "150", help = "Delay between consecutive metric cards")]
	pub metric_stagger_ms: TimeMs,

	#[arg(long, env = "FRAME_INTERVAL_MS", default_value = "16", help = "Metric tween frame interval")]
	pub frame_interval_ms: u64,

	#[arg(long, env = "VISIBILITY_THRESHOLD", default_value = "0.15", help = "Visible fraction of the stage needed to keep playing")]
	pub visibility_threshold: f64,

	#[arg(
        long,
        env = "HEADLESS_DURATION_MS",
        default_value = "10000",
        value_parser = parse_millis,
        help = "How long headless mode plays before exiting"
    )]
	pub headless_duration: Duration,

	#[arg(
        long,
        env = "DEACTIVATE_AT_MS",
        value_parser = parse_millis,
        help = "Headless only: deactivate the vignette at this offset"
    )]
	pub deactivate_at: Option<Duration>,

	#[arg(long, env = "STRICT_SCRIPTS", help = "Reject events from actors missing from the cast")]
	pub strict: bool,

	#[arg(long, env = "RUST_LOG", help = "Tracing filter directives; logging is off without them")]
	pub rust_log: Option<String>,

	#[arg(long, env = "LOG_JSON", help = "Emit logs as JSON")]
	pub log_json: bool,

	#[arg(long, env = "SHOWREEL_LOG_FILE", help = "Write logs to this file instead of stderr")]
	pub log_file: Option<PathBuf>,
}

impl Config {
	pub fn sequencer_config(&self) -> SequencerConfig {
		let policy = if self.strict { UnknownActorPolicy::Reject } else { UnknownActorPolicy::default() };
		SequencerConfig::new()
			.with_typing_preroll(self.typing_preroll_ms)
			.with_agent_timing(self.agent_start_delay_ms, self.agent_travel_ms, self.sweep_tail_ms)
			.with_label_capacity(self.completed_labels)
			.with_tween(self.tween_duration_ms, self.metric_stagger_ms)
			.with_frame_interval(self.frame_interval_ms)
			.with_unknown_actor(policy)
	}
}

fn parse_millis(s: &str) -> Result<Duration, std::num::ParseIntError> {
	s.parse::<u64>().map(Duration::from_millis)
}
