use anyhow::{Context, Result};
use clap::Parser;
use showreel::{headless, telemetry, terminal, Catalog, Config, Mode};

#[tokio::main]
async fn main() -> Result<()> {
	dotenv::dotenv().ok();
	let config = Config::parse();
	telemetry::init_tracing(&config)?;

	let sequencer = config.sequencer_config();
	sequencer.validate().map_err(anyhow::Error::msg).context("invalid sequencer timings")?;

	tracing::info!(mode = ?config.mode, vignette = %config.vignette, "Starting showreel");
	let catalog = Catalog::load(&sequencer)?;

	match config.mode {
		Mode::Tui => terminal::run(&catalog, &config).await?,
		Mode::Headless => {
			let Some(compiled) = catalog.find(&config.vignette) else {
				let known: Vec<_> = catalog.iter().map(|c| c.id().to_owned()).collect();
				anyhow::bail!("unknown vignette {:?}, expected one of {}", config.vignette, known.join(", "));
			};
			let mut stdout = std::io::stdout().lock();
			let written = headless::play(compiled.clone(), sequencer, config.headless_duration, config.deactivate_at, &mut stdout).await?;
			tracing::info!(snapshots = written, "Headless run finished");
		}
	}

	Ok(())
}
