use anyhow::{Context, Result};
use crossterm::{
	cursor,
	event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
	style::{Color, Print, ResetColor, SetForegroundColor},
	terminal::{self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen},
	ExecutableCommand, QueueableCommand,
};
use reelium::core::{CompiledVignette, VignetteState};
use reelium::surface::{Align, Line, Span, Tone};
use std::io::{self, Write};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{info, warn};

use crate::catalog::Catalog;
use crate::config::Config;
use crate::stage::Stage;
use crate::view;

const FRAME: Duration = Duration::from_millis(33);
const KEY_POLL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
	Next,
	Prev,
	Replay,
	Quit,
}

impl Command {
	pub fn from_key(key: KeyEvent) -> Option<Self> {
		if key.kind != KeyEventKind::Press {
			return None;
		}
		match key.code {
			KeyCode::Right | KeyCode::Char('l') | KeyCode::Tab => Some(Self::Next),
			KeyCode::Left | KeyCode::Char('h') | KeyCode::BackTab => Some(Self::Prev),
			KeyCode::Char('r') => Some(Self::Replay),
			KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => Some(Self::Quit),
			KeyCode::Char('q') | KeyCode::Esc => Some(Self::Quit),
			_ => None,
		}
	}
}

/// Raw mode plus alternate screen for as long as it lives
struct TerminalGuard;

impl TerminalGuard {
	fn enter() -> io::Result<Self> {
		terminal::enable_raw_mode()?;
		let mut stdout = io::stdout();
		stdout.execute(EnterAlternateScreen)?;
		stdout.execute(cursor::Hide)?;
		Ok(Self)
	}
}

impl Drop for TerminalGuard {
	fn drop(&mut self) {
		let mut stdout = io::stdout();
		let _ = stdout.execute(cursor::Show);
		let _ = stdout.execute(LeaveAlternateScreen);
		let _ = terminal::disable_raw_mode();
	}
}

pub async fn run(catalog: &Catalog, config: &Config) -> Result<()> {
	let sequencer = config.sequencer_config();
	let label_capacity = sequencer.completed_label_capacity;
	let heights: Vec<usize> = catalog.iter().map(|compiled| view::full_height(compiled, label_capacity)).collect();

	let initial = catalog.position(&config.vignette).unwrap_or_else(|| {
		warn!(vignette = %config.vignette, "Unknown vignette, starting with the first");
		0
	});

	let mut stage = Stage::new(catalog, &sequencer, config.visibility_threshold);
	let guard = TerminalGuard::enter().context("entering raw mode")?;

	let (key_tx, mut keys) = mpsc::channel(16);
	let reader = tokio::task::spawn_blocking(move || read_keys(&key_tx));

	stage.select(initial);
	let mut frame = interval(FRAME);
	frame.set_missed_tick_behavior(MissedTickBehavior::Skip);
	let mut stdout = io::stdout();

	let outcome: Result<()> = loop {
		tokio::select! {
			_ = frame.tick() => {
				if let Err(e) = draw(&mut stdout, &mut stage, &heights, label_capacity) {
					break Err(e).context("painting the stage");
				}
			}
			command = keys.recv() => match command {
				Some(Command::Next) => stage.next(),
				Some(Command::Prev) => stage.prev(),
				Some(Command::Replay) => stage.replay().await,
				Some(Command::Quit) | None => break Ok(()),
			}
		}
	};

	drop(keys);
	drop(guard);
	stage.shutdown().await;
	info!("Stage closed");
	outcome.and(reader_outcome(reader).await)
}

fn draw<W: Write>(out: &mut W, stage: &mut Stage, heights: &[usize], label_capacity: usize) -> io::Result<()> {
	let (cols, rows) = terminal::size()?;
	stage.observe_viewport(heights.iter().map(|needed| visible_ratio(rows, *needed)).collect());
	let Some((compiled, state)) = stage.current() else {
		return Ok(());
	};
	let tabs: Vec<_> = stage.titles().map(str::to_owned).collect();
	let lines = compose(&tabs, stage.selected(), &compiled, &state, label_capacity);
	paint(out, &lines, compiled.vignette().accent_rgb(), cols, rows)
}

async fn reader_outcome(reader: tokio::task::JoinHandle<io::Result<()>>) -> Result<()> {
	reader.await.context("key reader panicked")?.context("reading terminal events")
}

/// Blocking loop; ends when the receiving side is dropped
fn read_keys(tx: &mpsc::Sender<Command>) -> io::Result<()> {
	while !tx.is_closed() {
		if !event::poll(KEY_POLL)? {
			continue;
		}
		if let Event::Key(key) = event::read()? {
			if let Some(command) = Command::from_key(key) {
				if tx.blocking_send(command).is_err() {
					break;
				}
			}
		}
	}
	Ok(())
}

#[allow(clippy::cast_precision_loss)]
fn visible_ratio(rows: u16, needed: usize) -> f64 {
	if needed == 0 {
		return 1.0;
	}
	(f64::from(rows) / needed as f64).min(1.0)
}

/// Full screen as styled lines: tab strip, header, then each panel
pub fn compose(tabs: &[String], selected: Option<usize>, compiled: &CompiledVignette, state: &VignetteState, label_capacity: usize) -> Vec<Line> {
	let strip = tabs
		.iter()
		.enumerate()
		.map(|(index, title)| {
			let tone = if Some(index) == selected { Tone::Accent } else { Tone::Muted };
			Span::new(format!(" {} {title} ", index + 1), tone)
		})
		.collect();

	let mut lines = vec![Line::new(strip), view::header(compiled.vignette())];
	for panel in view::panels(compiled, state, label_capacity) {
		let mut title = vec![Span::new(format!("\u{2500}\u{2500} {}", panel.title), Tone::Accent)];
		if let Some(indicator) = panel.indicator {
			title.push(Span::plain("  "));
			title.push(indicator);
		}
		lines.push(Line::new(title));
		lines.extend(panel.lines.into_iter().map(|mut line| {
			line.spans.insert(0, Span::plain("  "));
			line
		}));
		lines.push(Line::default());
	}
	lines
}

fn color(tone: Tone, accent: (u8, u8, u8)) -> Color {
	match tone {
		Tone::Plain => Color::Reset,
		Tone::Muted => Color::DarkGrey,
		Tone::Accent => Color::Rgb {
			r: accent.0,
			g: accent.1,
			b: accent.2,
		},
		Tone::User => Color::Cyan,
		Tone::Responder => Color::White,
		Tone::Thinking => Color::Yellow,
		Tone::Action => Color::Blue,
		Tone::Observation | Tone::Done => Color::Green,
		Tone::Decision => Color::Magenta,
		Tone::Error => Color::Red,
	}
}

/// Draws as many lines as fit, each clipped to `cols`
pub fn paint<W: Write>(out: &mut W, lines: &[Line], accent: (u8, u8, u8), cols: u16, rows: u16) -> io::Result<()> {
	let cols = usize::from(cols);
	out.queue(Clear(ClearType::All))?;

	for (row, line) in (0..rows).zip(lines) {
		out.queue(cursor::MoveTo(0, row))?;
		let mut room = cols;
		if line.align == Align::Right {
			let pad = cols.saturating_sub(line.width() + 2);
			out.queue(Print(" ".repeat(pad)))?;
			room -= pad;
		}
		for span in &line.spans {
			if room == 0 {
				break;
			}
			let text: String = span.text.chars().take(room).collect();
			room -= text.chars().count();
			out.queue(SetForegroundColor(color(span.tone, accent)))?.queue(Print(text))?;
		}
		out.queue(ResetColor)?;
	}

	out.flush()
}
