use std::path::Path;
use anyhow::{Context, Result};
use serde::Deserialize;
use vpa_coord::Gav;
use vpa_sig::Signature;

/// The disclosed-vulnerability record that seeds a propagation run: one upstream GAV and the set
/// of vulnerable function signatures anchored there. CVE metadata ingestion itself is out of
/// scope (§1); this is just the shape the engine reads off disk.
#[derive(Debug, Clone, Deserialize)]
pub struct CveRecord {
	pub id: String,
	pub vulnerable_gav: String,
	pub functions: Vec<String>,
}

impl CveRecord {
	pub fn load(path: &Path) -> Result<CveRecord> {
		let bytes = std::fs::read(path).with_context(|| format!("reading CVE record {path:?}"))?;
		serde_json::from_slice(&bytes).with_context(|| format!("parsing CVE record {path:?}"))
	}

	pub fn vulnerable_gav(&self) -> Result<Gav> {
		self.vulnerable_gav.parse().with_context(|| format!("parsing vulnerable GAV of CVE {}", self.id))
	}

	pub fn sink_functions(&self) -> Result<Vec<Signature>> {
		self.functions.iter()
			.map(|f| f.parse().with_context(|| format!("parsing sink function of CVE {}: {f:?}", self.id)))
			.collect()
	}
}
