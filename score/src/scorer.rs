use std::collections::{HashMap, HashSet, VecDeque};
use std::path::Path;
use anyhow::{Context, Result};
use vpa_coord::{Ga, Gav};
use vpa_engine::workdir::GaDir;
use crate::dep_graph::GaDependencyGraph;
use crate::timestamps::GavTimestampIndex;
use crate::vpss::{vpss, VpssInputs};

/// The part of the propagation engine's on-disk output that actually reached a sink, re-derived as
/// GA and GAV hop distances from the vulnerable root - the shape [`VpssScorer`] needs to fill in
/// the direct/transitive counts of [`VpssInputs`].
///
/// Built by re-walking each visited GA's `filtered_gav_deps_cg.json` (§3: the "subset that reaches
/// an externally-reachable sink through an actual call path" file), rather than by re-running the
/// engine - the same file the engine itself would consult if a CVE's worklist were reopened.
#[derive(Debug, Default, Clone)]
pub struct AffectedSubgraph {
	/// Hop distance from the root GA to every downstream GA the propagation actually reached
	/// (root excluded).
	pub ga_depths: HashMap<Ga, u32>,
	/// Hop distance from the root GAV to every downstream GAV the propagation actually reached
	/// (root excluded).
	pub gav_depths: HashMap<Gav, u32>,
	/// The GA-level shape of the affected subgraph itself (root -> downstream GA edges only, one
	/// edge per first-discovered hop), mirroring `gen_package_dep_graph`'s `ga_graph` - what
	/// `max_len`/`avg_len` are measured over, since both are GA-granularity quantities in the
	/// original `get_cve_vpa_stat`.
	pub ga_graph: GaDependencyGraph,
}

impl AffectedSubgraph {
	/// BFS over `{working_dir}/{cve_id}/**/filtered_gav_deps_cg.json`, starting at `root` (the
	/// vulnerable GAV). At each step, `root`'s or a downstream GA's file maps its own version to the
	/// downstream versions it was found to affect; only the versions already known-affected (the
	/// versions reached so far) are followed further, so a GA visited at an unrelated version never
	/// contributes an edge.
	pub fn from_working_dir(working_dir: &Path, cve_id: &str, root: &Gav) -> Result<AffectedSubgraph> {
		let root_ga = root.ga();

		let mut ga_depths = HashMap::new();
		let mut gav_depths = HashMap::new();
		let mut ga_graph = GaDependencyGraph::new();
		let mut visited: HashSet<(Ga, String)> = HashSet::from([(root_ga.clone(), root.version.clone())]);
		let mut queue: VecDeque<(Ga, String, u32)> = VecDeque::from([(root_ga, root.version.clone(), 0)]);

		while let Some((ga, version, depth)) = queue.pop_front() {
			let gav_deps = GaDir::new(working_dir, cve_id, &ga).read_filtered_gav_deps_cg()
				.with_context(|| format!("reading filtered_gav_deps_cg.json for {ga}"))?;

			for (downstream_ga_str, v_up_map) in &gav_deps {
				let Some(v_downs) = v_up_map.get(&version) else { continue };
				let downstream_ga: Ga = downstream_ga_str.parse()
					.with_context(|| format!("parsing downstream GA {downstream_ga_str:?}"))?;

				for v_down in v_downs {
					let key = (downstream_ga.clone(), v_down.clone());
					if !visited.insert(key) {
						continue;
					}

					let next_depth = depth + 1;
					ga_depths.entry(downstream_ga.clone()).or_insert(next_depth);
					ga_graph.add_edge(&ga, &downstream_ga);
					let gav = downstream_ga.with_version(v_down.clone())
						.with_context(|| format!("invalid downstream GAV {downstream_ga}:{v_down}"))?;
					gav_depths.insert(gav, next_depth);
					queue.push_back((downstream_ga.clone(), v_down.clone(), next_depth));
				}
			}
		}

		Ok(AffectedSubgraph { ga_depths, gav_depths, ga_graph })
	}
}

/// Ties the ecosystem-wide [`GaDependencyGraph`] and [`GavTimestampIndex`] to one CVE's
/// [`AffectedSubgraph`], turning them into the eight-count [`VpssInputs`] the pure [`vpss`]
/// function scores.
pub struct VpssScorer<'a> {
	ecosystem: &'a GaDependencyGraph,
	timestamps: &'a GavTimestampIndex,
}

impl<'a> VpssScorer<'a> {
	pub fn new(ecosystem: &'a GaDependencyGraph, timestamps: &'a GavTimestampIndex) -> VpssScorer<'a> {
		VpssScorer { ecosystem, timestamps }
	}

	/// Derives [`VpssInputs`] for `root` at `sample` (Unix seconds): `total_P`/`total_PV` come from
	/// the time-sliced ecosystem graph, the direct/transitive counts come from `affected` with a
	/// GA/GAV hop distance of 1 treated as direct and anything further as transitive. `max_len` and
	/// `avg_len` are GA-granularity quantities measured over `affected.ga_graph` alone, matching
	/// `get_cve_vpa_stat`: `max_len` is `nx.dag_longest_path`'s node count (not hop count) of the
	/// longest path from `root`, and `avg_len` is `average_path_length_to_leaves`'s hop count
	/// averaged only over paths that reach a leaf of the affected subgraph - neither is time-sliced
	/// or GAV-granular, since the original never folds the timestamp index into either.
	pub fn inputs_at(&self, root: &Ga, affected: &AffectedSubgraph, sample: i64) -> VpssInputs {
		let reachable = self.ecosystem.reachable_from(root);
		let total_p = reachable.len() as u64;
		let total_pv = self.timestamps.iter()
			.filter(|(gav, &timestamp)| reachable.contains_key(&gav.ga()) && timestamp <= sample)
			.count() as u64;

		let (mut p_dir, mut p_trans) = (0u64, 0u64);
		for &depth in affected.ga_depths.values() {
			if depth == 1 { p_dir += 1 } else { p_trans += 1 }
		}

		let (mut pv_dir, mut pv_trans) = (0u64, 0u64);
		for (gav, &depth) in &affected.gav_depths {
			if !self.timestamps.published_by(gav, sample) {
				continue;
			}
			if depth == 1 { pv_dir += 1 } else { pv_trans += 1 }
		}

		let max_len = affected.ga_graph.longest_path_node_count_from(root);
		let avg_len = affected.ga_graph.avg_leaf_path_hops_from(root);

		VpssInputs { total_p, total_pv, p_dir, p_trans, pv_dir, pv_trans, max_len, avg_len }
	}

	pub fn score_at(&self, root: &Ga, affected: &AffectedSubgraph, sample: i64) -> f64 {
		vpss(&self.inputs_at(root, affected, sample))
	}
}

#[cfg(test)]
mod tests {
	use std::collections::{BTreeMap, BTreeSet};
	use pretty_assertions::assert_eq;
	use tempfile::TempDir;
	use super::*;

	fn write_filtered_gav_deps_cg(working_dir: &Path, cve_id: &str, ga: &Ga, entries: &[(&str, &str, &str)]) {
		let mut deps: BTreeMap<String, BTreeMap<String, BTreeSet<String>>> = BTreeMap::new();
		for (downstream, v_up, v_down) in entries {
			deps.entry((*downstream).to_owned()).or_default().entry((*v_up).to_owned()).or_default().insert((*v_down).to_owned());
		}
		let dir = GaDir::new(working_dir, cve_id, ga);
		std::fs::create_dir_all(dir.path()).unwrap();
		std::fs::write(dir.filtered_gav_deps_cg_path(), serde_json::to_vec(&deps).unwrap()).unwrap();
	}

	#[test]
	fn bfs_follows_only_the_versions_already_known_affected() {
		let dir = TempDir::new().unwrap();
		let root = Ga::new("com.ex", "vuln");
		let mid = Ga::new("com.ex", "mid");
		let leaf = Ga::new("com.ex", "leaf");

		write_filtered_gav_deps_cg(dir.path(), "CVE-1", &root, &[
			("com.ex:mid", "1.0", "2.0"),
			("com.ex:mid", "9.9", "9.9"), // an unrelated v_up, must not be followed
		]);
		write_filtered_gav_deps_cg(dir.path(), "CVE-1", &mid, &[("com.ex:leaf", "2.0", "3.0")]);

		let root_gav = Gav::new("com.ex", "vuln", "1.0").unwrap();
		let affected = AffectedSubgraph::from_working_dir(dir.path(), "CVE-1", &root_gav).unwrap();

		assert_eq!(affected.ga_depths.get(&mid), Some(&1));
		assert_eq!(affected.ga_depths.get(&leaf), Some(&2));
		assert_eq!(affected.gav_depths.get(&Gav::new("com.ex", "mid", "2.0").unwrap()), Some(&1));
		assert_eq!(affected.gav_depths.get(&Gav::new("com.ex", "leaf", "3.0").unwrap()), Some(&2));
		assert_eq!(affected.gav_depths.get(&Gav::new("com.ex", "mid", "9.9").unwrap()), None);
		// the affected GA graph mirrors the same root -> mid -> leaf shape, edge for edge.
		assert_eq!(affected.ga_graph.longest_path_node_count_from(&root), 3);
		assert_eq!(affected.ga_graph.avg_leaf_path_hops_from(&root), 2.0);
	}

	#[test]
	fn inputs_at_splits_direct_from_transitive_and_respects_the_time_slice() {
		let root = Ga::new("com.ex", "vuln");
		let mid = Ga::new("com.ex", "mid");
		let leaf = Ga::new("com.ex", "leaf");

		let mut ecosystem = GaDependencyGraph::new();
		ecosystem.add_edge(&root, &mid);
		ecosystem.add_edge(&mid, &leaf);

		let mut timestamps = GavTimestampIndex::new();
		timestamps.record(Gav::new("com.ex", "mid", "2.0").unwrap(), 1_000);
		timestamps.record(Gav::new("com.ex", "leaf", "3.0").unwrap(), 5_000);

		let mut affected = AffectedSubgraph::default();
		affected.ga_depths.insert(mid.clone(), 1);
		affected.ga_depths.insert(leaf.clone(), 2);
		affected.gav_depths.insert(Gav::new("com.ex", "mid", "2.0").unwrap(), 1);
		affected.gav_depths.insert(Gav::new("com.ex", "leaf", "3.0").unwrap(), 2);
		affected.ga_graph.add_edge(&root, &mid);
		affected.ga_graph.add_edge(&mid, &leaf);

		let scorer = VpssScorer::new(&ecosystem, &timestamps);

		// sample before leaf@3.0 was published: pv_* is time-sliced, max_len/avg_len are not (the
		// affected GA graph has no notion of a sample time, matching get_cve_vpa_stat).
		let inputs = scorer.inputs_at(&root, &affected, 2_000);
		assert_eq!(inputs.total_p, 2);
		assert_eq!(inputs.p_dir, 1);
		assert_eq!(inputs.p_trans, 1);
		assert_eq!(inputs.pv_dir, 1);
		assert_eq!(inputs.pv_trans, 0);
		assert_eq!(inputs.max_len, 3);
		assert_eq!(inputs.avg_len, 2.0);

		// sample after both were published: pv_* catches up, max_len/avg_len are unchanged.
		let inputs = scorer.inputs_at(&root, &affected, 6_000);
		assert_eq!(inputs.pv_dir, 1);
		assert_eq!(inputs.pv_trans, 1);
		assert_eq!(inputs.max_len, 3);
		assert_eq!(inputs.avg_len, 2.0);
	}
}
