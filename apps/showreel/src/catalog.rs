use anyhow::{Context, Result};
use reel_events::Vignette;
use reelium::core::{CompiledVignette, SequencerConfig};
use std::sync::Arc;

/// Embedded vignette scripts in stage order
const SOURCES: [(&str, &str); 7] = [
	("investment", include_str!("../vignettes/investment.json")),
	("urban-planning", include_str!("../vignettes/urban-planning.json")),
	("sustainability", include_str!("../vignettes/sustainability.json")),
	("tourism", include_str!("../vignettes/tourism.json")),
	("heritage", include_str!("../vignettes/heritage.json")),
	("investor-relations", include_str!("../vignettes/investor-relations.json")),
	("economic-impact", include_str!("../vignettes/economic-impact.json")),
];

#[derive(Debug, Clone)]
pub struct Catalog {
	entries: Vec<Arc<CompiledVignette>>,
}

impl Catalog {
	/// Parse and compile every embedded vignette
	pub fn load(config: &SequencerConfig) -> Result<Self> {
		Self::from_sources(SOURCES.iter().copied(), config)
	}

	pub fn from_sources<'a>(sources: impl IntoIterator<Item = (&'a str, &'a str)>, config: &SequencerConfig) -> Result<Self> {
		let entries = sources
			.into_iter()
			.map(|(name, json)| {
				let vignette = Vignette::from_json(json).with_context(|| format!("parsing vignette {name}"))?;
				let compiled = CompiledVignette::compile(&vignette, config).with_context(|| format!("compiling vignette {name}"))?;
				tracing::debug!(vignette = name, cues = compiled.timeline().len(), "Vignette compiled");
				Ok(Arc::new(compiled))
			})
			.collect::<Result<Vec<_>>>()?;
		Ok(Self { entries })
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	pub fn get(&self, index: usize) -> Option<&Arc<CompiledVignette>> {
		self.entries.get(index)
	}

	pub fn position(&self, id: &str) -> Option<usize> {
		self.entries.iter().position(|entry| entry.id() == id)
	}

	pub fn find(&self, id: &str) -> Option<&Arc<CompiledVignette>> {
		self.position(id).and_then(|index| self.get(index))
	}

	pub fn iter(&self) -> impl Iterator<Item = &Arc<CompiledVignette>> {
		self.entries.iter()
	}
}
