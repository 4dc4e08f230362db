use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::str::FromStr;
use std::sync::Mutex;
use tracing_subscriber::fmt::{format::JsonFields, writer::BoxMakeWriter};
use tracing_subscriber::{filter::EnvFilter, layer::SubscriberExt, util::SubscriberInitExt, Layer};

use crate::config::{Config, Mode};

/// Installs the global subscriber. Returns `false` when logging stays off:
/// no filter was given, or the TUI owns the terminal and no log file was set.
pub fn init_tracing(config: &Config) -> Result<bool> {
	let Some(directives) = config.rust_log.as_deref() else {
		return Ok(false);
	};

	let writer = match &config.log_file {
		Some(path) => {
			let file = OpenOptions::new()
				.create(true)
				.append(true)
				.open(path)
				.with_context(|| format!("opening log file {}", path.display()))?;
			BoxMakeWriter::new(Mutex::new(file))
		}
		None if config.mode == Mode::Tui => return Ok(false),
		None => BoxMakeWriter::new(std::io::stderr),
	};

	let filter = EnvFilter::from_str(directives).context("invalid RUST_LOG directives")?;
	let ansi = config.log_file.is_none();

	tracing_subscriber::registry()
		.with(if config.log_json {
			Box::new(
				tracing_subscriber::fmt::layer()
					.fmt_fields(JsonFields::default())
					.event_format(tracing_subscriber::fmt::format().json().flatten_event(true).with_span_list(false))
					.with_writer(writer)
					.with_filter(filter),
			) as Box<dyn Layer<_> + Send + Sync>
		} else {
			Box::new(
				tracing_subscriber::fmt::layer()
					.event_format(tracing_subscriber::fmt::format().pretty())
					.with_ansi(ansi)
					.with_writer(writer)
					.with_filter(filter),
			)
		})
		.try_init()
		.context("tracing subscriber already installed")?;

	Ok(true)
}
