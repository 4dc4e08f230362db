use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::script::Script;

/// A metric card: `value` is counted up from zero, `suffix` is rendered as-is
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricDef {
	pub label: String,
	pub value: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub suffix: Option<String>,
}

impl MetricDef {
	pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
		Self {
			label: label.into(),
			value: value.into(),
			suffix: None,
		}
	}

	pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
		self.suffix = Some(suffix.into());
		self
	}
}

/// One self-contained scripted use case
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vignette {
	pub id: String,
	pub number: String,
	pub title: String,
	pub subtitle: String,
	#[serde(default)]
	pub description: String,
	/// Accent colour as `#RRGGBB`
	pub accent: String,
	#[serde(default)]
	pub metrics: Vec<MetricDef>,
	pub script: Script,
}

impl Vignette {
	pub fn from_json(json: &str) -> Result<Self> {
		let vignette: Self = serde_json::from_str(json)?;
		vignette.script.validate_offsets()?;
		Ok(vignette)
	}

	/// Accent colour as an RGB triple; falls back to white on malformed input
	pub fn accent_rgb(&self) -> (u8, u8, u8) {
		parse_hex_rgb(&self.accent).unwrap_or((255, 255, 255))
	}
}

fn parse_hex_rgb(hex: &str) -> Option<(u8, u8, u8)> {
	let hex = hex.strip_prefix('#')?;
	if hex.len() != 6 {
		return None;
	}
	let channel = |range: std::ops::Range<usize>| u8::from_str_radix(hex.get(range)?, 16).ok();
	Some((channel(0..2)?, channel(2..4)?, channel(4..6)?))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn accent_parses_hex() {
		let vignette = Vignette {
			id: "heritage".into(),
			number: "05".into(),
			title: "Heritage Conservation".into(),
			subtitle: "AI-Assisted Preservation".into(),
			description: String::new(),
			accent: "#C5A55A".into(),
			metrics: vec![MetricDef::new("Sites Assessed", "47")],
			script: Script::default(),
		};
		assert_eq!(vignette.accent_rgb(), (0xC5, 0xA5, 0x5A));
	}

	#[test]
	fn malformed_accent_falls_back() {
		assert_eq!(parse_hex_rgb("C5A55A"), None);
		assert_eq!(parse_hex_rgb("#C5A5"), None);
		assert_eq!(parse_hex_rgb("#GGA55A"), None);
	}
}
