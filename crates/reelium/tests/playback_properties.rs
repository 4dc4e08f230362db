// tests/playback_properties.rs
// Timing properties of a playback, driven by tokio's paused clock

use std::sync::{Arc, Mutex};
use std::time::Duration;

use reel_events::{AgentDef, CalloutStyle, Cast, CycleDef, CycleOption, Event, MetricDef, Script, ToolDirection, TraceKind, Vignette};
use reelium::core::*;
use tokio_util::sync::CancellationToken;

// ============================================================================
// Fixtures
// ============================================================================

fn strict() -> SequencerConfig {
	SequencerConfig::default().with_unknown_actor(UnknownActorPolicy::Reject)
}

fn chat_scenario() -> Script {
	Script::new(
		Cast::default().with_chat("Assistant", "user", "assistant"),
		vec![Event::message(0, "user", "Plan my heritage tour"), Event::message(2500, "assistant", "Here is a two-day route")],
	)
}

fn full_vignette() -> Vignette {
	let cast = Cast::default()
		.with_chat("Investor Assistant", "user", "assistant")
		.with_trace("trace", "Agent Reasoning")
		.with_tools("tools", "MCP Tool Calls")
		.with_agents(
			"agents",
			AgentDef::new("supervisor", "Supervisor"),
			vec![AgentDef::new("research", "Research"), AgentDef::new("finance", "Finance"), AgentDef::new("writer", "Writer")],
		);

	let events = vec![
		Event::message(0, "user", "Summarise Q3 for investors"),
		Event::message(3000, "assistant", "Revenue grew 12%."),
		Event::message(4200, "user", "And the outlook?"),
		Event::message(6500, "assistant", "Guidance raised."),
		Event::trace_step(200, "trace", TraceKind::Thinking, None, "Identify data sources"),
		Event::trace_step(900, "trace", TraceKind::ToolCall, Some("Research"), "fetch_filings()"),
		Event::trace_step(1800, "trace", TraceKind::Observation, Some("Research"), "3 filings"),
		Event::trace_step(2600, "trace", TraceKind::Decision, None, "Draft summary"),
		Event::tool_call(400, "tools", ToolDirection::Request, "fetch_filings", serde_json::json!({ "quarter": "Q3" })),
		Event::tool_call(2400, "tools", ToolDirection::Response, "fetch_filings", serde_json::json!({ "count": 3 })),
		Event::agent_message(0, "agents", "supervisor", "research", "gather"),
		Event::agent_message(1200, "agents", "research", "finance", "figures"),
		Event::agent_message(1200, "agents", "supervisor", "writer", "outline"),
		Event::agent_message(2800, "agents", "finance", "writer", "numbers"),
	];

	Vignette {
		id: "investor-relations".into(),
		number: "06".into(),
		title: "Investor Relations".into(),
		subtitle: "Automated Reporting".into(),
		description: String::new(),
		accent: "#3B82F6".into(),
		metrics: vec![MetricDef::new("Reports Generated", "2,847"), MetricDef::new("Accuracy", "99.2").with_suffix("%")],
		script: Script::new(cast, events),
	}
}

fn compiled(vignette: &Vignette) -> Arc<CompiledVignette> {
	Arc::new(CompiledVignette::compile(vignette, &strict()).unwrap())
}

/// Every state the reducer passes through during one playback, in order
fn record_playback(timeline: Arc<Timeline>, initial: VignetteState) -> (PlaybackHandle, Arc<Mutex<Vec<VignetteState>>>) {
	let snapshots = Arc::new(Mutex::new(Vec::new()));
	let sink = snapshots.clone();
	let mut state = initial;
	let handle = Sequencer::start(timeline, move |cue| {
		state.apply(cue);
		sink.lock().unwrap().push(state.clone());
	});
	(handle, snapshots)
}

async fn sleep_ms(ms: u64) {
	tokio::time::sleep(Duration::from_millis(ms)).await;
}

// ============================================================================
// 1. Replay idempotence
// ============================================================================

#[tokio::test(start_paused = true)]
async fn replay_produces_identical_snapshots() {
	let compiled = compiled(&full_vignette());
	let timeline = compiled.timeline().clone();
	let run_for = u64::try_from(timeline.total_duration()).unwrap() + 100;

	let (first, first_snapshots) = record_playback(timeline.clone(), compiled.initial_state());
	sleep_ms(run_for).await;
	first.cancel();

	let (second, second_snapshots) = record_playback(timeline.clone(), compiled.initial_state());
	sleep_ms(run_for).await;
	second.cancel();

	let first = first_snapshots.lock().unwrap().clone();
	let second = second_snapshots.lock().unwrap().clone();
	assert_eq!(first.len(), timeline.len());
	assert_eq!(first, second);
}

#[tokio::test(start_paused = true)]
async fn reactivating_a_player_restarts_from_zero() {
	let mut player = VignettePlayer::new(compiled(&full_vignette()), strict());
	let samples = [1, 701, 1501, 2601, 4001, 7001];

	let mut runs = Vec::new();
	for _ in 0..2 {
		player.set_active(true);
		let start = tokio::time::Instant::now();
		let mut seen = Vec::new();
		for at in samples {
			tokio::time::sleep_until(start + Duration::from_millis(at)).await;
			seen.push(player.snapshot());
		}
		player.set_active(false);
		assert_eq!(player.snapshot(), player.compiled().initial_state());
		runs.push(seen);
	}

	assert_eq!(runs[0], runs[1]);
}

// ============================================================================
// 2. Cancellation totality
// ============================================================================

#[tokio::test(start_paused = true)]
async fn nothing_fires_after_deactivation() {
	let compiled = compiled(&full_vignette());
	let timeline = compiled.timeline().clone();

	for cutoff in [0_u64, 150, 1000, 1999, 3100, 5100] {
		let (handle, snapshots) = record_playback(timeline.clone(), compiled.initial_state());
		sleep_ms(cutoff).await;
		handle.cancel();
		let applied = snapshots.lock().unwrap().len();

		sleep_ms(20_000).await;
		assert_eq!(snapshots.lock().unwrap().len(), applied, "a cue fired after cancelling at {cutoff}ms");

		let due = timeline.cues().iter().filter(|c| c.at <= TimeMs::try_from(cutoff).unwrap()).count();
		assert_eq!(applied, due);
	}
}

#[tokio::test(start_paused = true)]
async fn closing_the_activation_signal_stops_playback() {
	let player = VignettePlayer::new(compiled(&full_vignette()), strict());
	let (tx, rx) = tokio::sync::watch::channel(true);
	let mut states = player.subscribe();
	let cancel = CancellationToken::new();
	let task = tokio::spawn(player.run(rx, cancel.clone()));

	sleep_ms(1000).await;
	drop(tx);
	task.await.unwrap();

	let final_state = states.borrow_and_update().clone();
	assert!(!final_state.playing);
	sleep_ms(20_000).await;
	assert!(states.has_changed().is_err() || !states.has_changed().unwrap());
}

// ============================================================================
// 3. Monotonic cursor
// ============================================================================

#[tokio::test(start_paused = true)]
async fn visible_counts_never_decrease() {
	let mut player = VignettePlayer::new(compiled(&full_vignette()), strict());
	player.set_active(true);

	let mut last = player.snapshot();
	for _ in 0..80 {
		sleep_ms(100).await;
		let now = player.snapshot();
		assert!(now.chat.visible_count >= last.chat.visible_count);
		assert!(now.trace.visible_count >= last.trace.visible_count);
		assert!(now.tools.visible_count >= last.tools.visible_count);
		assert!(now.agents.completed.len() >= last.agents.completed.len());
		last = now;
	}

	assert_eq!(last.chat.visible_count, 4);
	assert_eq!(last.trace.visible_count, 4);
	assert_eq!(last.tools.visible_count, 2);
}

// ============================================================================
// 4. Orchestrator status exclusivity
// ============================================================================

#[test]
fn every_message_is_in_exactly_one_phase() {
	let compiled = compiled(&full_vignette());
	let timeline = compiled.timeline();
	let links = timeline.streams().agents.as_ref().unwrap().links.len();
	let mut state = compiled.initial_state();

	for t in (0..=timeline.total_duration() + 500).step_by(50) {
		state.reconstruct_at(timeline, t);
		for index in 0..links {
			let active = state.agents.active.contains(&index);
			let completed = state.agents.completed.contains(&index);
			assert!(!(active && completed), "message {index} is both active and completed at {t}ms");
			let phase = state.agents.phase_of(index);
			match phase {
				MessagePhase::Active => assert!(active),
				MessagePhase::Completed => assert!(completed),
				MessagePhase::Pending => assert!(!active && !completed),
			}
		}
		assert_eq!(state.agents.statuses.len(), 4);
	}
}

#[test]
fn settle_follows_every_delivery() {
	let compiled = compiled(&full_vignette());
	let cues = compiled.timeline().cues();
	let settle = cues.iter().find(|c| c.cue == Cue::Settle).unwrap();
	let last_delivery = cues.iter().filter(|c| matches!(c.cue, Cue::Deliver { .. })).map(|c| c.at).max().unwrap();
	assert!(settle.at > last_delivery);
	assert_eq!(settle.at, 2800 + 600 + 1600);
}

// ============================================================================
// 5. Tween boundary
// ============================================================================

#[tokio::test(start_paused = true)]
async fn metric_counts_up_to_exactly_the_target() {
	let clock = Arc::new(ManualClock::new(0));
	let mut player = VignettePlayer::new(compiled(&full_vignette()), strict()).with_clock(clock.clone());
	assert_eq!(player.snapshot().metrics[0].display, "0");

	player.set_active(true);
	sleep_ms(20).await;
	assert_eq!(player.snapshot().metrics[0].display, "0");

	let mut last = 0.0;
	for _ in 0..30 {
		clock.advance(50);
		sleep_ms(20).await;
		let shown: f64 = player.snapshot().metrics[0].display.replace(',', "").parse().unwrap();
		assert!(shown <= 2847.0);
		assert!(shown >= last);
		last = shown;
	}

	let state = player.snapshot();
	assert_eq!(state.metrics[0].display, "2,847");
	assert_eq!(state.metrics[1].display, "99.1");

	clock.advance(150);
	sleep_ms(20).await;
	assert_eq!(player.snapshot().metrics[1].display, "99.2");
}

// ============================================================================
// 6. Typing pre-roll scenario
// ============================================================================

#[tokio::test(start_paused = true)]
async fn typing_preroll_scenario() {
	let vignette = Vignette {
		id: "tourism".into(),
		number: "04".into(),
		title: "Tourism".into(),
		subtitle: "Personalised itineraries".into(),
		description: String::new(),
		accent: "#E07A5F".into(),
		metrics: Vec::new(),
		script: chat_scenario(),
	};
	let mut player = VignettePlayer::new(compiled(&vignette), strict().with_typing_preroll(1200));
	let start = tokio::time::Instant::now();
	player.set_active(true);

	let state = player.snapshot();
	assert_eq!(state.chat.visible_count, 1);
	assert!(!state.chat.typing);

	tokio::time::sleep_until(start + Duration::from_millis(1301)).await;
	assert!(player.snapshot().chat.typing);

	tokio::time::sleep_until(start + Duration::from_millis(2501)).await;
	let state = player.snapshot();
	assert!(!state.chat.typing);
	assert_eq!(state.chat.visible_count, 2);
}

#[tokio::test(start_paused = true)]
async fn deactivating_before_the_preroll_prevents_it() {
	let vignette = Vignette {
		id: "tourism".into(),
		number: "04".into(),
		title: "Tourism".into(),
		subtitle: "Personalised itineraries".into(),
		description: String::new(),
		accent: "#E07A5F".into(),
		metrics: Vec::new(),
		script: chat_scenario(),
	};
	let mut player = VignettePlayer::new(compiled(&vignette), strict());
	let mut states = player.subscribe();
	player.set_active(true);

	sleep_ms(1000).await;
	player.set_active(false);
	let state = states.borrow_and_update().clone();
	assert_eq!(state.chat.visible_count, 0);
	assert!(!state.chat.typing);

	sleep_ms(5000).await;
	assert!(!states.has_changed().unwrap());
	assert_eq!(player.snapshot(), state);
}

// ============================================================================
// Activation triggers and tie-break
// ============================================================================

#[tokio::test(start_paused = true)]
async fn selection_drives_exactly_one_active_player() {
	let vignettes = [full_vignette(), {
		let mut v = full_vignette();
		v.id = "economic-impact".into();
		v
	}];
	let mut players: Vec<_> = vignettes.iter().map(|v| VignettePlayer::new(compiled(v), strict())).collect();
	let mut tabs = SelectionTrigger::new(players.len());

	for (index, edge) in tabs.select(0) {
		players[index].set_active(edge == Edge::Rising);
	}
	sleep_ms(1000).await;
	for (index, edge) in tabs.select(1) {
		players[index].set_active(edge == Edge::Rising);
	}
	sleep_ms(500).await;

	assert!(!players[0].is_active());
	assert_eq!(players[0].snapshot().chat.visible_count, 0);
	assert!(players[1].is_active());
	assert_eq!(players[1].snapshot().chat.visible_count, 1);
	assert!(tabs.select(1).is_empty());
}

#[tokio::test(start_paused = true)]
async fn equal_offsets_apply_in_declaration_order() {
	let script = Script::new(
		Cast::default().with_trace("trace", "Trace").with_tools("tools", "Tools"),
		vec![
			Event::trace_step(800, "trace", TraceKind::Thinking, None, "a"),
			Event::tool_call(800, "tools", ToolDirection::Request, "b", serde_json::Value::Null),
			Event::trace_step(800, "trace", TraceKind::Decision, None, "c"),
		],
	);
	let timeline = Arc::new(Timeline::compile(&script, &strict()).unwrap());
	let order = Arc::new(Mutex::new(Vec::new()));
	let sink = order.clone();
	let _handle = Sequencer::start(timeline, move |cue| sink.lock().unwrap().push(cue.cue.clone()));

	sleep_ms(801).await;
	assert_eq!(
		*order.lock().unwrap(),
		vec![
			Cue::Reveal { surface: Surface::Trace, index: 0 },
			Cue::Reveal { surface: Surface::Tools, index: 0 },
			Cue::Reveal { surface: Surface::Trace, index: 1 },
		]
	);
}

#[test]
fn lenient_compile_drops_unknown_actors() {
	let mut vignette = full_vignette();
	vignette.script.events.push(Event::message(100, "ghost", "boo"));
	vignette.script.events.push(Event::agent_message(100, "agents", "supervisor", "nobody", "lost"));

	assert!(CompiledVignette::compile(&vignette, &strict()).is_err());

	let lenient = SequencerConfig::default().with_unknown_actor(UnknownActorPolicy::Drop);
	let compiled = CompiledVignette::compile(&vignette, &lenient).unwrap();
	assert_eq!(compiled.timeline().streams().chat_len(), 4);
	assert_eq!(compiled.timeline().streams().agents.as_ref().unwrap().links.len(), 4);
}

// ============================================================================
// Showcase panel
// ============================================================================

fn scan_vignette(cycle: Option<CycleDef>) -> Vignette {
	let mut vignette = full_vignette();
	vignette.id = "heritage".into();
	vignette.script = Script::new(
		Cast::default().with_showcase("visual", "Structural Scan", cycle),
		vec![
			Event::progress(0, "visual", "Scanning", 2000, 50),
			Event::callout(2500, "visual", CalloutStyle::Alert, "Roof erosion"),
		],
	);
	vignette
}

#[tokio::test(start_paused = true)]
async fn scan_progress_fills_then_findings_appear() {
	let mut player = VignettePlayer::new(compiled(&scan_vignette(None)), strict());
	player.set_active(true);

	sleep_ms(1).await;
	assert_eq!(player.snapshot().showcase.visible_count, 1);
	assert_eq!(player.snapshot().showcase.percent_of(0), 0);

	sleep_ms(1000).await;
	assert_eq!(player.snapshot().showcase.percent_of(0), 50);

	sleep_ms(1000).await;
	let state = player.snapshot();
	assert_eq!(state.showcase.percent_of(0), 100);
	assert_eq!(state.showcase.visible_count, 1);

	sleep_ms(500).await;
	assert_eq!(player.snapshot().showcase.visible_count, 2);
}

#[tokio::test(start_paused = true)]
async fn deactivation_clears_the_scan_and_stops_the_cycle() {
	let cycle = CycleDef {
		period_ms: 3500,
		options: vec![CycleOption::new("Residential Focus"), CycleOption::new("Mixed-Use"), CycleOption::new("Green Priority")],
	};
	let mut player = VignettePlayer::new(compiled(&scan_vignette(Some(cycle))), strict());
	let mut rx = player.subscribe();
	player.set_active(true);

	sleep_ms(3501).await;
	let state = player.snapshot();
	assert_eq!(state.showcase.cycle_index, 1);
	assert_eq!(state.showcase.percent_of(0), 100);

	player.set_active(false);
	let state = player.snapshot();
	assert_eq!(state.showcase.visible_count, 0);
	assert_eq!(state.showcase.percent_of(0), 0);
	assert_eq!(state.showcase.cycle_index, 0);

	rx.borrow_and_update();
	sleep_ms(10_000).await;
	assert!(!rx.has_changed().unwrap(), "neither cues nor rotations may publish after deactivation");
}
