use std::collections::HashMap;
use std::path::PathBuf;
use std::str::FromStr;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use vpa_coord::Gav;
use crate::persist;

/// Tri-state reflection flag, persisted alongside the owned-prefix list for each GAV.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[repr(i8)]
pub enum ReflectionFlag {
	Unknown = -1,
	No = 0,
	Yes = 1,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Row {
	prefixes: Vec<String>,
	reflection: ReflectionFlag,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Table(HashMap<String, Row>);

/// The persisted KV store behind the package-prefix oracle and the reflection probe: one row per
/// `(g,a,v)`, holding the owned package-prefix list and the reflection probe result. Backed by a
/// single JSON map file instead of an embedded SQL database (see DESIGN.md for why) - all writes
/// go through [`persist::update_json_locked`], giving `INSERT OR REPLACE` semantics under one
/// write lock.
#[derive(Clone)]
pub struct PrefixStore {
	path: PathBuf,
}

impl PrefixStore {
	pub fn new(path: impl Into<PathBuf>) -> PrefixStore {
		PrefixStore { path: path.into() }
	}

	pub fn get(&self, gav: &Gav) -> Result<Option<(Vec<String>, ReflectionFlag)>> {
		let table: Table = persist::read_json_or_default(&self.path)?;
		Ok(table.0.get(&gav.to_string()).map(|row| (row.prefixes.clone(), row.reflection)))
	}

	pub fn get_prefixes(&self, gav: &Gav) -> Result<Option<Vec<String>>> {
		Ok(self.get(gav)?.map(|(prefixes, _)| prefixes))
	}

	pub fn get_reflection(&self, gav: &Gav) -> Result<ReflectionFlag> {
		Ok(self.get(gav)?.map(|(_, flag)| flag).unwrap_or(ReflectionFlag::Unknown))
	}

	/// Sets the owned-prefix list for a GAV, leaving its reflection flag at `Unknown` if this is
	/// the row's first write.
	pub fn put_prefixes(&self, gav: &Gav, prefixes: Vec<String>) -> Result<()> {
		let key = gav.to_string();
		persist::update_json_locked(&self.path, |table: &mut Table| {
			let row = table.0.entry(key).or_insert(Row { prefixes: Vec::new(), reflection: ReflectionFlag::Unknown });
			row.prefixes = prefixes;
		})?;
		Ok(())
	}

	/// Sets the reflection flag for a GAV, leaving its prefix list untouched (or empty if this is
	/// the row's first write - callers normally call [`Self::put_prefixes`] first, since the
	/// prefix oracle runs ahead of the reflection probe).
	pub fn put_reflection(&self, gav: &Gav, flag: ReflectionFlag) -> Result<()> {
		let key = gav.to_string();
		persist::update_json_locked(&self.path, |table: &mut Table| {
			let row = table.0.entry(key).or_insert(Row { prefixes: Vec::new(), reflection: ReflectionFlag::Unknown });
			row.reflection = flag;
		})?;
		Ok(())
	}

	/// Re-validates that every key parses as a GAV. At-most-one-row-per-(g,a,v) holds
	/// structurally since the table is a map; this just catches a corrupt or hand-edited file.
	pub fn validate_schema(&self) -> Result<()> {
		let table: Table = persist::read_json_or_default(&self.path)?;
		for key in table.0.keys() {
			Gav::from_str(key)?;
		}
		Ok(())
	}
}
