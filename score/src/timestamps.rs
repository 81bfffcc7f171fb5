use std::collections::HashMap;
use std::path::Path;
use anyhow::{Context, Result};
use serde::Deserialize;
use vpa_coord::Gav;

/// Earliest known publish timestamp (Unix seconds) per GAV, the index the VPSS scorer
/// time-slices the ecosystem graph against (§4.J: "only GAVs with earliest-timestamp ≤ the
/// sample timestamp participate").
#[derive(Debug, Default, Clone)]
pub struct GavTimestampIndex {
	timestamps: HashMap<Gav, i64>,
}

impl GavTimestampIndex {
	pub fn new() -> GavTimestampIndex {
		GavTimestampIndex::default()
	}

	/// Records `gav`'s publish timestamp, keeping the earliest one seen for a given GAV (the CSV
	/// this is built from is append-friendly, not guaranteed deduplicated upstream).
	pub fn record(&mut self, gav: Gav, timestamp: i64) {
		self.timestamps.entry(gav).and_modify(|existing| *existing = (*existing).min(timestamp)).or_insert(timestamp);
	}

	pub fn get(&self, gav: &Gav) -> Option<i64> {
		self.timestamps.get(gav).copied()
	}

	/// Whether `gav` should participate at `sample` (its own publish time, seconds since epoch).
	/// A GAV absent from the index is treated as already published - an unknown publish date
	/// should not silently exclude a GAV the propagation engine found real call evidence for.
	pub fn published_by(&self, gav: &Gav, sample: i64) -> bool {
		match self.get(gav) {
			Some(published) => published <= sample,
			None => true,
		}
	}

	pub fn iter(&self) -> impl Iterator<Item = (&Gav, &i64)> {
		self.timestamps.iter()
	}

	pub fn len(&self) -> usize {
		self.timestamps.len()
	}

	pub fn is_empty(&self) -> bool {
		self.timestamps.is_empty()
	}
}

#[derive(Debug, Deserialize)]
struct Row {
	#[serde(rename = "GroupId")]
	group: String,
	#[serde(rename = "ArtifactId")]
	artifact: String,
	#[serde(rename = "Version")]
	version: String,
	#[serde(rename = "Timestamp")]
	timestamp: i64,
}

/// Parses a `GroupId,ArtifactId,Version,Timestamp` CSV into a [`GavTimestampIndex`] - this is the
/// raw export `gav_csv_to_json.py` reads as *input* (via `csv.DictReader`) and folds into a
/// `group -> artifact -> version -> timestamp` JSON tree; this function is an alternative
/// ingestion path straight from that same CSV, skipping the intermediate JSON tree.
pub fn gav_timestamps_from_csv(path: &Path) -> Result<GavTimestampIndex> {
	let mut reader = csv::Reader::from_path(path).with_context(|| format!("opening {path:?}"))?;
	let mut index = GavTimestampIndex::new();

	for result in reader.deserialize() {
		let row: Row = result.with_context(|| format!("parsing row of {path:?}"))?;
		let gav = Gav::new(row.group, row.artifact, row.version).context("invalid GAV in timestamp CSV")?;
		index.record(gav, row.timestamp);
	}

	Ok(index)
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;
	use tempfile::TempDir;
	use super::*;

	#[test]
	fn keeps_the_earliest_timestamp_for_duplicate_rows() {
		let mut index = GavTimestampIndex::new();
		let gav = Gav::new("com.ex", "dep", "1.0").unwrap();
		index.record(gav.clone(), 2000);
		index.record(gav.clone(), 1000);
		assert_eq!(index.get(&gav), Some(1000));
	}

	#[test]
	fn unknown_gav_is_treated_as_already_published() {
		let index = GavTimestampIndex::new();
		let gav = Gav::new("com.ex", "dep", "1.0").unwrap();
		assert!(index.published_by(&gav, 0));
	}

	#[test]
	fn parses_csv_rows_into_an_index() {
		let dir = TempDir::new().unwrap();
		let path = dir.path().join("timestamps.csv");
		std::fs::write(&path, "GroupId,ArtifactId,Version,Timestamp\ncom.ex,dep,1.0,1000\ncom.ex,dep,2.0,2000\n").unwrap();

		let index = gav_timestamps_from_csv(&path).unwrap();
		assert_eq!(index.len(), 2);
		assert_eq!(index.get(&Gav::new("com.ex", "dep", "1.0").unwrap()), Some(1000));
		assert_eq!(index.get(&Gav::new("com.ex", "dep", "2.0").unwrap()), Some(2000));
	}
}
