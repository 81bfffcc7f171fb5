use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use anyhow::{Context, Result};
use vpa_coord::Ga;
use vpa_sig::Signature;
use vpa_store::persist;

/// `downstream-GA -> {upstream-version -> [downstream-versions]}`, the shape shared by
/// `gav_deps.json`, `filtered_gav_deps.json` and `filtered_gav_deps_cg.json` (§3 invariant 2:
/// each is a subset of the previous one).
pub type GavDeps = BTreeMap<String, BTreeMap<String, BTreeSet<String>>>;

/// `downstream-GA -> v_up -> v_down -> entry-point -> [callers in downstream]`.
pub type DepCalls = BTreeMap<String, BTreeMap<String, BTreeMap<String, BTreeMap<String, Vec<String>>>>>;

/// `version -> sink signatures known for this GA at that version`. Monotonically grows across
/// iterations (§3 invariant 4) - entries are only ever added by [`merge_sinks`].
pub type Tfs = BTreeMap<String, BTreeSet<String>>;

/// Per-CVE, per-GA working directory: the file layout of §3, rooted at
/// `{working_dir}/{cve_id}/{group}/{artifact}/`.
#[derive(Debug, Clone)]
pub struct GaDir {
	root: PathBuf,
}

impl GaDir {
	pub fn new(working_dir: &Path, cve_id: &str, ga: &Ga) -> GaDir {
		GaDir { root: working_dir.join(cve_id).join(&ga.group).join(&ga.artifact) }
	}

	pub fn path(&self) -> &Path {
		&self.root
	}

	pub fn ga_deps_path(&self) -> PathBuf {
		self.root.join("ga-deps.json")
	}

	pub fn gav_deps_path(&self) -> PathBuf {
		self.root.join("gav_deps.json")
	}

	pub fn filtered_gav_deps_path(&self) -> PathBuf {
		self.root.join("filtered_gav_deps.json")
	}

	pub fn filtered_gav_deps_cg_path(&self) -> PathBuf {
		self.root.join("filtered_gav_deps_cg.json")
	}

	pub fn dep_calls_path(&self) -> PathBuf {
		self.root.join("dep_calls.json")
	}

	pub fn tfs_path(&self) -> PathBuf {
		self.root.join("tfs.json")
	}

	pub fn up_path(&self) -> PathBuf {
		self.root.join("up")
	}

	pub fn read_ga_deps(&self) -> Result<BTreeSet<String>> {
		persist::read_json_or_default(self.ga_deps_path())
	}

	/// Acquires the path's named lock via `spawn_blocking`, matching
	/// `CallgraphOracleClient::callgraph`'s lock-acquisition pattern, so contention on this file
	/// never stalls a `tokio` executor worker thread.
	pub async fn write_ga_deps(&self, deps: &BTreeSet<String>) -> Result<()> {
		persist::write_json_atomic_async(self.ga_deps_path(), deps).await
	}

	pub fn read_gav_deps(&self) -> Result<GavDeps> {
		persist::read_json_or_default(self.gav_deps_path())
	}

	pub fn read_filtered_gav_deps(&self) -> Result<GavDeps> {
		persist::read_json_or_default(self.filtered_gav_deps_path())
	}

	pub fn read_filtered_gav_deps_cg(&self) -> Result<GavDeps> {
		persist::read_json_or_default(self.filtered_gav_deps_cg_path())
	}

	pub fn read_dep_calls(&self) -> Result<DepCalls> {
		persist::read_json_or_default(self.dep_calls_path())
	}

	pub fn read_tfs(&self) -> Result<Tfs> {
		persist::read_json_or_default(self.tfs_path())
	}

	/// Merges `entry` into `gav_deps.json` (or `filtered_gav_deps*.json`, same shape): adds the
	/// `(downstream-GA, v_up, v_down)` triple to whichever of the three files `path` names.
	/// Never overwrites, only unions - matching §5's "order-independent set union is used to
	/// merge results." Lock acquisition runs on a `spawn_blocking` thread, same as [`write_ga_deps`].
	///
	/// [`write_ga_deps`]: GaDir::write_ga_deps
	pub async fn merge_gav_deps_entry(path: PathBuf, downstream_ga: &str, v_up: &str, v_down: &str) -> Result<()> {
		let downstream_ga = downstream_ga.to_owned();
		let v_up = v_up.to_owned();
		let v_down = v_down.to_owned();
		persist::update_json_locked_async(path, move |deps: &mut GavDeps| {
			deps.entry(downstream_ga).or_default().entry(v_up).or_default().insert(v_down);
		}).await?;
		Ok(())
	}

	/// Merges a batch of `dep_calls.json` entries under lock, union-ing caller lists per
	/// entry-point rather than overwriting them (§9 open question 2's disposition: dedupe on
	/// full signature, no capping). Lock acquisition runs on a `spawn_blocking` thread, same as
	/// [`write_ga_deps`].
	///
	/// [`write_ga_deps`]: GaDir::write_ga_deps
	pub async fn merge_dep_calls(
		path: PathBuf,
		downstream_ga: &str,
		v_up: &str,
		v_down: &str,
		callers: &BTreeMap<String, Vec<String>>,
	) -> Result<()> {
		let downstream_ga = downstream_ga.to_owned();
		let v_up = v_up.to_owned();
		let v_down = v_down.to_owned();
		let callers = callers.clone();
		persist::update_json_locked_async(path, move |deps: &mut DepCalls| {
			let bucket = deps.entry(downstream_ga)
				.or_default()
				.entry(v_up)
				.or_default()
				.entry(v_down)
				.or_default();
			for (entry_point, new_callers) in callers {
				let existing = bucket.entry(entry_point).or_default();
				let mut set: BTreeSet<String> = existing.drain(..).collect();
				set.extend(new_callers);
				existing.extend(set);
			}
		}).await?;
		Ok(())
	}

	/// Acquires the path's named lock via `spawn_blocking`, see [`write_ga_deps`].
	///
	/// [`write_ga_deps`]: GaDir::write_ga_deps
	pub async fn write_tfs(&self, tfs: &Tfs) -> Result<()> {
		persist::write_json_atomic_async(self.tfs_path(), tfs).await
	}
}

/// Computes the sink-diff between a GA's previously-known sinks and the sinks proposed this
/// iteration: `merged` is the union (what gets written back to `tfs.json`), `added` is only the
/// new signatures per version (what steps 4-6 must actually search for, per §4.I "revisited with
/// new sinks re-runs only the incremental work for those sinks"), and `has_new` gates the whole
/// sink-diff step.
pub fn sink_diff(previous: &Tfs, proposed: &BTreeMap<String, BTreeSet<Signature>>) -> (bool, Tfs, BTreeMap<String, BTreeSet<Signature>>) {
	let mut merged = previous.clone();
	let mut added: BTreeMap<String, BTreeSet<Signature>> = BTreeMap::new();
	let mut has_new = false;

	for (version, sinks) in proposed {
		let existing = merged.entry(version.clone()).or_default();
		for sink in sinks {
			let sig_string = sink.to_string();
			if existing.insert(sig_string) {
				added.entry(version.clone()).or_default().insert(sink.clone());
				has_new = true;
			}
		}
	}

	(has_new, merged, added)
}

pub fn parse_signatures(strings: impl IntoIterator<Item = String>) -> Result<Vec<Signature>> {
	strings.into_iter()
		.map(|s| s.parse().with_context(|| format!("parsing signature {s:?}")))
		.collect()
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;
	use tempfile::TempDir;
	use super::*;

	fn sig(s: &str) -> Signature {
		s.parse().unwrap()
	}

	#[test]
	fn sink_diff_reports_only_newly_added_signatures() {
		let mut previous: Tfs = BTreeMap::new();
		previous.insert("1.0".to_owned(), BTreeSet::from(["<com.ex.A: void a()>".to_owned()]));

		let mut proposed: BTreeMap<String, BTreeSet<Signature>> = BTreeMap::new();
		proposed.insert("1.0".to_owned(), BTreeSet::from([sig("<com.ex.A: void a()>"), sig("<com.ex.A: void b()>")]));
		proposed.insert("2.0".to_owned(), BTreeSet::from([sig("<com.ex.A: void c()>")]));

		let (has_new, merged, added) = sink_diff(&previous, &proposed);

		assert!(has_new);
		assert_eq!(merged.get("1.0").unwrap().len(), 2);
		assert_eq!(added.get("1.0").unwrap(), &BTreeSet::from([sig("<com.ex.A: void b()>")]));
		assert_eq!(added.get("2.0").unwrap(), &BTreeSet::from([sig("<com.ex.A: void c()>")]));
	}

	#[test]
	fn no_new_sinks_means_no_op() {
		let mut previous: Tfs = BTreeMap::new();
		previous.insert("1.0".to_owned(), BTreeSet::from(["<com.ex.A: void a()>".to_owned()]));

		let mut proposed: BTreeMap<String, BTreeSet<Signature>> = BTreeMap::new();
		proposed.insert("1.0".to_owned(), BTreeSet::from([sig("<com.ex.A: void a()>")]));

		let (has_new, merged, added) = sink_diff(&previous, &proposed);
		assert!(!has_new);
		assert_eq!(merged, previous);
		assert!(added.is_empty());
	}

	#[tokio::test]
	async fn gav_deps_merge_unions_across_calls() {
		let dir = TempDir::new().unwrap();
		let path = dir.path().join("gav_deps.json");

		GaDir::merge_gav_deps_entry(path.clone(), "com.ex:dep", "1.0", "2.0").await.unwrap();
		GaDir::merge_gav_deps_entry(path.clone(), "com.ex:dep", "1.0", "3.0").await.unwrap();

		let deps: GavDeps = persist::read_json_or_default(&path).unwrap();
		assert_eq!(
			deps.get("com.ex:dep").unwrap().get("1.0").unwrap(),
			&BTreeSet::from(["2.0".to_owned(), "3.0".to_owned()]),
		);
	}

	#[tokio::test]
	async fn dep_calls_merge_unions_caller_lists() {
		let dir = TempDir::new().unwrap();
		let path = dir.path().join("dep_calls.json");

		let mut first = BTreeMap::new();
		first.insert("<com.ex.dep.B: public void entry()>".to_owned(), vec!["<com.dep.X: public void use()>".to_owned()]);
		GaDir::merge_dep_calls(path.clone(), "com.ex:dep", "1.0", "2.0", &first).await.unwrap();

		let mut second = BTreeMap::new();
		second.insert("<com.ex.dep.B: public void entry()>".to_owned(), vec!["<com.dep.Y: public void other()>".to_owned()]);
		GaDir::merge_dep_calls(path.clone(), "com.ex:dep", "1.0", "2.0", &second).await.unwrap();

		let deps: DepCalls = persist::read_json_or_default(&path).unwrap();
		let callers = &deps["com.ex:dep"]["1.0"]["2.0"]["<com.ex.dep.B: public void entry()>"];
		assert_eq!(callers.len(), 2);
	}
}
