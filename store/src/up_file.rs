use std::collections::BTreeSet;
use std::path::PathBuf;
use std::str::FromStr;
use anyhow::{Context, Result};
use vpa_coord::Ga;
use crate::lock::NamedLock;

/// The per-GA `up` file: the set of upstream GAs this GA is currently being analyzed on behalf
/// of, append-only under lock. One GA canonical string per line, deduplicated on read.
pub struct UpFile {
	path: PathBuf,
}

impl UpFile {
	pub fn new(path: impl Into<PathBuf>) -> UpFile {
		UpFile { path: path.into() }
	}

	pub fn read(&self) -> Result<BTreeSet<Ga>> {
		match std::fs::read_to_string(&self.path) {
			Ok(content) => content.lines()
				.filter(|line| !line.is_empty())
				.map(|line| Ga::from_str(line).with_context(|| format!("parsing GA from {:?}", self.path)))
				.collect(),
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeSet::new()),
			Err(e) => Err(e).with_context(|| format!("reading {:?}", self.path)),
		}
	}

	/// Appends `ga` under the named lock if not already present; returns the resulting full set.
	/// Append-only: an existing upstream GA is never removed.
	pub fn add(&self, ga: &Ga) -> Result<BTreeSet<Ga>> {
		let lock = NamedLock::for_path(&self.path);
		let _guard = lock.lock()?;

		let mut set = match std::fs::read_to_string(&self.path) {
			Ok(content) => content.lines()
				.filter(|line| !line.is_empty())
				.map(Ga::from_str)
				.collect::<Result<BTreeSet<_>>>()?,
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeSet::new(),
			Err(e) => return Err(e).with_context(|| format!("reading {:?}", self.path)),
		};

		if set.insert(ga.clone()) {
			if let Some(parent) = self.path.parent() {
				std::fs::create_dir_all(parent).with_context(|| format!("creating {parent:?}"))?;
			}
			let content = set.iter().map(Ga::to_string).collect::<Vec<_>>().join("\n") + "\n";
			std::fs::write(&self.path, content).with_context(|| format!("writing {:?}", self.path))?;
		}

		Ok(set)
	}
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;
	use tempfile::TempDir;
	use super::*;

	#[test]
	fn append_only_and_deduplicated() {
		let dir = TempDir::new().unwrap();
		let up = UpFile::new(dir.path().join("up"));

		assert_eq!(up.read().unwrap(), BTreeSet::new());

		let a = Ga::new("com.ex", "vuln");
		let b = Ga::new("com.ex", "other");

		up.add(&a).unwrap();
		up.add(&b).unwrap();
		up.add(&a).unwrap(); // duplicate, no-op

		let set = up.read().unwrap();
		assert_eq!(set, BTreeSet::from([a, b]));
	}
}
