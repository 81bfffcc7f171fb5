use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;
use anyhow::{Context, Result};
use log::{info, warn};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use vpa_analysis::direction_filter::references_upstream;
use vpa_analysis::reflection_probe::probe_reflection;
use vpa_analysis::{BytecodeAnalyzer, CgEngine, ClassRefTool, PrefixOracle};
use vpa_artifact::{fetch_jar, FetchOutcome};
use vpa_callgraph::caller_resolver::{has_possible_callers, resolve_callers};
use vpa_callgraph::{CallgraphOracleClient, EntryPointFinder};
use vpa_coord::{is_valid_version, Ga, Gav};
use vpa_depgraph::GraphStore;
use vpa_pom::coord::MavenCoord;
use vpa_pom::http_downloader::HttpDownloader;
use vpa_pom::resolver::Resolver;
use vpa_pom::DependencyScope;
use vpa_sig::Signature;
use vpa_store::{markers, PrefixStore, ReflectionFlag, UpFile};

use crate::annotations::Annotations;
use crate::config::Config;
use crate::cve::CveRecord;
use crate::prefix_file::write_prefix_file;
use crate::workdir::{parse_signatures, sink_diff, GaDir};
use crate::worklist::Worklist;

/// The cheap, cloneable handles the engine's bounded worker pools need in their spawned tasks -
/// everything except the worklist and the per-run memoization tables, which only the single
/// driving loop ever touches.
#[derive(Clone)]
struct Collaborators {
	config: Arc<Config>,
	client: reqwest::Client,
	prefix_oracle: PrefixOracle,
	reflection_store: PrefixStore,
	analyzer: BytecodeAnalyzer,
	class_ref_tool: ClassRefTool,
	cg_client: CallgraphOracleClient,
	cg_engine: CgEngine,
}

impl Collaborators {
	fn dest_dir(&self) -> std::path::PathBuf {
		self.config.working_dir.join("artifacts")
	}

	async fn ensure_jar(&self, gav: &Gav) -> Result<Option<std::path::PathBuf>> {
		match fetch_jar(&self.client, &self.config.repo_base, gav, &self.dest_dir()).await? {
			FetchOutcome::Success(path) => Ok(Some(path)),
			FetchOutcome::NotFound => {
				warn!("{gav}: not found as jar or war, dropping");
				Ok(None)
			}
			FetchOutcome::NetworkError(e) => {
				warn!("{gav}: network error fetching artifact ({e}), will retry on the next run");
				Ok(None)
			}
		}
	}

	async fn owned_prefixes(&self, gav: &Gav, supplementary: &[String]) -> Result<Vec<String>> {
		let mut prefixes = self.prefix_oracle.owned_prefixes(&self.client, gav).await?;
		for extra in supplementary {
			let extra_gav: Gav = extra.parse().with_context(|| format!("parsing supplementary GAV {extra:?}"))?;
			prefixes.extend(self.prefix_oracle.owned_prefixes(&self.client, &extra_gav).await?);
		}
		Ok(prefixes)
	}

	async fn direct_dependencies(&self, gav: &Gav) -> Result<Vec<(MavenCoord, DependencyScope)>> {
		let downloader = HttpDownloader::new(self.client.clone());
		let resolver = Resolver::new("primary", &self.config.repo_base);
		let resolvers = [resolver];
		let coord = MavenCoord::from_group_artifact_version(&gav.group, &gav.artifact, &gav.version);
		vpa_pom::get_direct_dependencies(&downloader, &resolvers, &coord).await
	}

	async fn reflection_flag(&self, gav: &Gav, jar: &Path, annotations: &Annotations) -> Result<ReflectionFlag> {
		let method_list = annotations.reflection_annotations.as_deref().unwrap_or(&self.config.reflection_method_list);
		probe_reflection(&self.analyzer, &self.reflection_store, gav, jar, method_list, None, self.config.cg_timeout()).await
	}

	/// Dependency-Direction Filter (4.E) for a single candidate `(upstream, downstream)` pair:
	/// fetches the downstream jar, derives both sides' owned prefixes, probes for reflection, and
	/// asks the class-reference tool whether downstream bytecode actually reaches upstream
	/// bytecode.
	async fn direction_filter_one(&self, item: &Ga, v_up: &str, d: &Ga, v_down: &str, annotations: &Annotations) -> Result<bool> {
		let upstream_gav = item.with_version(v_up.to_owned())?;
		let downstream_gav = d.with_version(v_down.to_owned())?;

		let Some(downstream_jar) = self.ensure_jar(&downstream_gav).await? else { return Ok(false) };

		let upstream_supplementary = annotations.supplementary_ga(&upstream_gav.to_string());
		let downstream_supplementary = annotations.supplementary_ga(&downstream_gav.to_string());
		let upstream_prefixes = self.owned_prefixes(&upstream_gav, upstream_supplementary).await?;
		let downstream_prefixes = self.owned_prefixes(&downstream_gav, downstream_supplementary).await?;

		let reflection_flag = self.reflection_flag(&downstream_gav, &downstream_jar, annotations).await?;

		references_upstream(
			&self.class_ref_tool,
			reflection_flag,
			self.cg_engine.is_reflection_unaware(),
			&downstream_jar,
			&downstream_prefixes,
			&upstream_prefixes,
		).await
	}

	/// CG-level check (4.F-4.H) for a single downstream candidate against an already-computed set
	/// of upstream entry points: cheap `check-call` pre-filter, then (only if that or a confirmed
	/// reflective call says "maybe") the downstream's full callgraph and caller resolution.
	async fn caller_check_one(
		&self,
		d: &Ga,
		v_down: &str,
		entry_points: &HashSet<Signature>,
		annotations: &Annotations,
	) -> Result<Option<HashMap<Signature, Vec<Signature>>>> {
		let downstream_gav = d.with_version(v_down.to_owned())?;
		let Some(downstream_jar) = self.ensure_jar(&downstream_gav).await? else { return Ok(None) };

		let supplementary = annotations.supplementary_ga(&downstream_gav.to_string());
		let downstream_prefixes = self.owned_prefixes(&downstream_gav, supplementary).await?;
		let reflection_flag = self.reflection_flag(&downstream_gav, &downstream_jar, annotations).await?;

		let entry_points_vec: Vec<Signature> = entry_points.iter().cloned().collect();
		let prefix_file = write_prefix_file(&downstream_prefixes)?;

		let has_callers = reflection_flag == ReflectionFlag::Yes
			|| has_possible_callers(&self.analyzer, &downstream_jar, &entry_points_vec, Some(prefix_file.path()), self.config.cg_timeout()).await;
		if !has_callers {
			return Ok(None);
		}

		let only_app = annotations.only_app_code(&downstream_gav.to_string());
		let Some(downstream_cg) = self.cg_client.callgraph(&downstream_jar, &downstream_gav, &downstream_prefixes, &[], only_app, Some(prefix_file.path())).await? else {
			return Ok(None);
		};

		let callers = resolve_callers(entry_points, &downstream_cg);
		if callers.is_empty() { Ok(None) } else { Ok(Some(callers)) }
	}
}

/// Component I: the fixed-point worklist traversal described in §4.I. Walks the GA dependency
/// graph downstream from a CVE's vulnerable GAV, re-deriving at each step only the work implied
/// by sinks that are actually new (§3 invariant 4), until the worklist drains.
pub struct PropagationEngine {
	collab: Collaborators,
	graph_store: Arc<dyn GraphStore>,
	entry_finder: EntryPointFinder,
	worklist: Worklist,
	visits: HashMap<Ga, u32>,
}

impl PropagationEngine {
	pub fn new(config: Arc<Config>, graph_store: Arc<dyn GraphStore>) -> PropagationEngine {
		let client = reqwest::Client::new();
		let reflection_store = PrefixStore::new(config.working_dir.join("prefix_store.json"));
		let prefix_oracle = PrefixOracle::new(config.repo_base.clone(), config.working_dir.join("artifacts"), reflection_store.clone());
		let analyzer = BytecodeAnalyzer::new(config.bytecode_analyzer_path.clone());
		let class_ref_tool = ClassRefTool::new(config.class_ref_tool_path.clone());
		let cg_engine = config.cg_tool.to_engine();
		let cg_client = CallgraphOracleClient::new(analyzer.clone(), cg_engine, config.working_dir.join("callgraphs"), config.cg_timeout());

		PropagationEngine {
			collab: Collaborators { config, client, prefix_oracle, reflection_store, analyzer, class_ref_tool, cg_client, cg_engine },
			graph_store,
			entry_finder: EntryPointFinder::new(),
			worklist: Worklist::new(),
			visits: HashMap::new(),
		}
	}

	/// Runs the propagation for one CVE to completion: seeds the worklist with the vulnerable
	/// GAV's own GA, then pops and processes until nothing is left to visit.
	pub async fn run(&mut self, cve: &CveRecord) -> Result<()> {
		let vulnerable_gav = cve.vulnerable_gav()?;
		let sink_functions = cve.sink_functions()?;
		let annotations = Annotations::load(&self.collab.config.working_dir, &cve.id)?;
		let root_ga = vulnerable_gav.ga();

		self.worklist.push(root_ga);
		let mut root = true;

		while let Some(item) = self.worklist.pop() {
			self.process_item(&cve.id, &item, root, &vulnerable_gav, &sink_functions, &annotations).await
				.with_context(|| format!("processing {item} for {}", cve.id))?;
			root = false;
		}

		Ok(())
	}

	async fn process_item(
		&mut self,
		cve_id: &str,
		item: &Ga,
		root: bool,
		vulnerable_gav: &Gav,
		sink_functions: &[Signature],
		annotations: &Annotations,
	) -> Result<()> {
		let visits = self.visits.entry(item.clone()).or_insert(0);
		*visits += 1;
		if *visits > self.collab.config.max_visits_per_ga {
			warn!("[{cve_id}] {item}: exceeded max_visits_per_ga ({}), treating as terminated", self.collab.config.max_visits_per_ga);
			return Ok(());
		}

		let dir = GaDir::new(&self.collab.config.working_dir, cve_id, item);
		std::fs::create_dir_all(dir.path()).with_context(|| format!("creating working directory for {item}"))?;

		// Step 1: an orphaned non-root GA (no upstream currently claims it) has nothing to do.
		let up_set = UpFile::new(dir.up_path()).read()?;
		if up_set.is_empty() && !root {
			info!("[{cve_id}] {item}: no upstream reference remains, skipping");
			return Ok(());
		}

		// Step 2: sink diff. The root GA's proposed sinks are the CVE's own; every other GA's come
		// from whatever its upstreams have already resolved as reaching it.
		let previous_tfs = dir.read_tfs()?;
		let proposed = if root {
			let mut map: BTreeMap<String, BTreeSet<Signature>> = BTreeMap::new();
			map.insert(vulnerable_gav.version.clone(), sink_functions.iter().cloned().collect());
			map
		} else {
			self.collect_sinks_from_upstreams(cve_id, item, &up_set)?
		};
		let (has_new, merged_tfs, added) = sink_diff(&previous_tfs, &proposed);
		if !has_new {
			info!("[{cve_id}] {item}: no new sinks since the last visit, skipping");
			return Ok(());
		}

		// Step 3: one-hop descendants from the dependency-graph store.
		let descendants = self.graph_store.one_hop_descendants(item).await
			.with_context(|| format!("querying dependency-graph store for {item}"))?;
		dir.write_ga_deps(&descendants.iter().map(Ga::to_string).collect()).await?;

		// Step 4: version mapping - which (v_up, downstream-GA, v_down) triples actually declare
		// item:v_up as a direct dependency, restricted to the versions whose sinks are new.
		let candidate_pairs = self.map_versions(cve_id, item, &dir, &descendants, &added).await?;

		// Step 5: Dependency-Direction Filter, one bounded worker pool per CVE-GA visit.
		let surviving = self.run_direction_filter(cve_id, item, &dir, candidate_pairs, annotations).await?;

		// Step 6: CG-level filter - grouped by v_up, since the upstream callgraph and its entry
		// points are shared across every downstream candidate at that version.
		self.run_cg_filter(cve_id, item, &dir, &added, surviving, annotations).await?;

		// Step 7: persist the merged sink set, now that every downstream effect of the new sinks
		// has been computed.
		dir.write_tfs(&merged_tfs).await?;

		// Step 8: propagate - every GA that passed the CG-level filter gets `item` recorded as one
		// of its upstreams and is (re-)queued.
		let filtered_cg = dir.read_filtered_gav_deps_cg()?;
		for d_string in filtered_cg.keys() {
			let d: Ga = d_string.parse().with_context(|| format!("parsing downstream GA {d_string:?}"))?;
			let d_dir = GaDir::new(&self.collab.config.working_dir, cve_id, &d);
			std::fs::create_dir_all(d_dir.path())?;
			UpFile::new(d_dir.up_path()).add(item)?;
			self.worklist.push(d);
		}

		// Step 9: root only ever applies to the first item popped from the worklist.
		Ok(())
	}

	/// For a non-root GA, the sinks it must search for are the union, across every upstream that
	/// currently claims it, of the entry-point signatures that upstream's `dep_calls.json` already
	/// recorded as reaching it at each downstream version.
	fn collect_sinks_from_upstreams(&self, cve_id: &str, item: &Ga, up_set: &BTreeSet<Ga>) -> Result<BTreeMap<String, BTreeSet<Signature>>> {
		let mut result: BTreeMap<String, BTreeSet<Signature>> = BTreeMap::new();
		let item_key = item.to_string();

		for upstream in up_set {
			let upstream_dir = GaDir::new(&self.collab.config.working_dir, cve_id, upstream);
			let dep_calls = upstream_dir.read_dep_calls()?;
			let Some(by_v_up) = dep_calls.get(&item_key) else { continue };
			for by_v_down in by_v_up.values() {
				for (v_down, entry_points) in by_v_down {
					let sigs = parse_signatures(entry_points.keys().cloned())?;
					result.entry(v_down.clone()).or_default().extend(sigs);
				}
			}
		}

		Ok(result)
	}

	/// Step 4: for every one-hop descendant GA, every published version, checks whether that
	/// version's effective POM declares `item` as a direct dependency at one of the freshly-added
	/// versions. Matching triples are persisted to `gav_deps.json` as they're found.
	async fn map_versions(
		&self,
		cve_id: &str,
		item: &Ga,
		dir: &GaDir,
		descendants: &BTreeSet<Ga>,
		added: &BTreeMap<String, BTreeSet<Signature>>,
	) -> Result<Vec<(Ga, String, String)>> {
		let mut pairs = Vec::new();

		for d in descendants {
			let versions = match vpa_pom::metadata::list_versions(&self.collab.client, &self.collab.config.repo_base, d).await {
				Ok(v) => v,
				Err(e) => {
					warn!("[{cve_id}] could not list versions of {d}: {e:#}");
					continue;
				}
			};

			for v_down in versions {
				if !is_valid_version(&v_down) {
					continue;
				}
				let Ok(d_gav) = d.with_version(v_down.clone()) else { continue };

				let direct_deps = match self.collab.direct_dependencies(&d_gav).await {
					Ok(deps) => deps,
					Err(e) => {
						warn!("[{cve_id}] could not resolve POM of {d_gav}: {e:#}");
						continue;
					}
				};

				for (dep_coord, _scope) in direct_deps {
					if dep_coord.group != item.group || dep_coord.artifact != item.artifact {
						continue;
					}
					if !is_valid_version(&dep_coord.version) || !added.contains_key(&dep_coord.version) {
						continue;
					}
					GaDir::merge_gav_deps_entry(dir.gav_deps_path(), &d.to_string(), &dep_coord.version, &v_down).await?;
					pairs.push((d.clone(), dep_coord.version.clone(), v_down.clone()));
				}
			}
		}

		Ok(pairs)
	}

	/// Step 5: runs the Dependency-Direction Filter over every candidate pair with a worker pool
	/// bounded by `proc_num_deps` - one `tokio` task per pair, at most `proc_num_deps` in flight.
	async fn run_direction_filter(
		&self,
		cve_id: &str,
		item: &Ga,
		dir: &GaDir,
		pairs: Vec<(Ga, String, String)>,
		annotations: &Annotations,
	) -> Result<Vec<(Ga, String, String)>> {
		let semaphore = Arc::new(Semaphore::new(self.collab.config.proc_num_deps.max(1)));
		let mut tasks = JoinSet::new();

		for (d, v_up, v_down) in pairs {
			let semaphore = semaphore.clone();
			let collab = self.collab.clone();
			let item = item.clone();
			let annotations = annotations.clone();
			tasks.spawn(async move {
				let _permit = semaphore.acquire_owned().await.expect("semaphore is never closed");
				let kept = collab.direction_filter_one(&item, &v_up, &d, &v_down, &annotations).await;
				(d, v_up, v_down, kept)
			});
		}

		let mut surviving = Vec::new();
		while let Some(joined) = tasks.join_next().await {
			let (d, v_up, v_down, kept) = joined.context("direction-filter worker task panicked")?;
			match kept {
				Ok(true) => {
					let marker = self.collab.config.working_dir.join(cve_id).join("selected")
						.join(&v_up).join(&d.group).join(&d.artifact).join(&v_down);
					markers::mark(&marker)?;
					GaDir::merge_gav_deps_entry(dir.filtered_gav_deps_path(), &d.to_string(), &v_up, &v_down).await?;
					surviving.push((d, v_up, v_down));
				}
				Ok(false) => {}
				Err(e) => warn!("[{cve_id}] direction filter failed for {d}:{v_down} (upstream {item}:{v_up}): {e:#}"),
			}
		}

		Ok(surviving)
	}

	/// Step 6: grouped by `v_up` so the upstream callgraph and its entry points (4.F, 4.G) are
	/// computed once per version rather than once per downstream candidate, then the
	/// Caller-Resolver (4.H) runs over every candidate for that version with a worker pool bounded
	/// by `proc_num_cg`.
	async fn run_cg_filter(
		&mut self,
		cve_id: &str,
		item: &Ga,
		dir: &GaDir,
		added: &BTreeMap<String, BTreeSet<Signature>>,
		surviving: Vec<(Ga, String, String)>,
		annotations: &Annotations,
	) -> Result<()> {
		let mut by_v_up: BTreeMap<String, Vec<(Ga, String)>> = BTreeMap::new();
		for (d, v_up, v_down) in surviving {
			by_v_up.entry(v_up).or_default().push((d, v_down));
		}

		for (v_up, pairs) in by_v_up {
			let Some(sinks) = added.get(&v_up) else { continue };
			let sinks_vec: Vec<Signature> = sinks.iter().cloned().collect();

			let upstream_gav = item.with_version(v_up.clone())?;
			let Some(upstream_jar) = self.collab.ensure_jar(&upstream_gav).await? else { continue };

			let upstream_supplementary = annotations.supplementary_ga(&upstream_gav.to_string());
			let upstream_prefixes = self.collab.owned_prefixes(&upstream_gav, upstream_supplementary).await?;
			let prefix_file = write_prefix_file(&upstream_prefixes)?;

			let only_app = annotations.only_app_code(&upstream_gav.to_string());
			let Some(upstream_cg) = self.collab.cg_client.callgraph(&upstream_jar, &upstream_gav, &upstream_prefixes, &[], only_app, Some(prefix_file.path())).await? else {
				warn!("[{cve_id}] could not generate callgraph for upstream {upstream_gav}, skipping {} downstream candidate(s)", pairs.len());
				continue;
			};

			let cache_path = self.collab.cg_client.cache_path(&upstream_gav);
			let entry_points = self.entry_finder.entry_points(&sinks_vec, &cache_path, &upstream_cg);
			if entry_points.is_empty() {
				info!("[{cve_id}] {item}:{v_up}: no externally-reachable entry point reaches the new sinks");
				continue;
			}

			self.run_cg_filter_for_version(cve_id, item, &v_up, dir, pairs, &entry_points, annotations).await?;
		}

		Ok(())
	}

	async fn run_cg_filter_for_version(
		&self,
		cve_id: &str,
		item: &Ga,
		v_up: &str,
		dir: &GaDir,
		pairs: Vec<(Ga, String)>,
		entry_points: &HashSet<Signature>,
		annotations: &Annotations,
	) -> Result<()> {
		let semaphore = Arc::new(Semaphore::new(self.collab.config.proc_num_cg.max(1)));
		let mut tasks = JoinSet::new();

		for (d, v_down) in pairs {
			let semaphore = semaphore.clone();
			let collab = self.collab.clone();
			let entry_points = entry_points.clone();
			let annotations = annotations.clone();
			tasks.spawn(async move {
				let _permit = semaphore.acquire_owned().await.expect("semaphore is never closed");
				let result = collab.caller_check_one(&d, &v_down, &entry_points, &annotations).await;
				(d, v_down, result)
			});
		}

		while let Some(joined) = tasks.join_next().await {
			let (d, v_down, result) = joined.context("cg-filter worker task panicked")?;
			match result {
				Ok(Some(callers)) => {
					let marker = self.collab.config.working_dir.join(cve_id).join("selected_cg")
						.join(v_up).join(&d.group).join(&d.artifact).join(&v_down);
					markers::mark(&marker)?;
					GaDir::merge_gav_deps_entry(dir.filtered_gav_deps_cg_path(), &d.to_string(), v_up, &v_down).await?;

					let callers_json: BTreeMap<String, Vec<String>> = callers.into_iter()
						.map(|(sig, callers)| (sig.to_string(), callers.into_iter().map(|c| c.to_string()).collect()))
						.collect();
					GaDir::merge_dep_calls(dir.dep_calls_path(), &d.to_string(), v_up, &v_down, &callers_json).await?;
				}
				Ok(None) => {}
				Err(e) => warn!("[{cve_id}] cg-level filter failed for {d}:{v_down} (upstream {item}:{v_up}): {e:#}"),
			}
		}

		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use async_trait::async_trait;
	use pretty_assertions::assert_eq;
	use tempfile::TempDir;
	use super::*;

	struct FakeGraphStore {
		edges: BTreeMap<Ga, BTreeSet<Ga>>,
	}

	#[async_trait]
	impl GraphStore for FakeGraphStore {
		async fn one_hop_descendants(&self, start: &Ga) -> Result<BTreeSet<Ga>> {
			Ok(self.edges.get(start).cloned().unwrap_or_default())
		}
	}

	fn test_config(working_dir: &Path) -> Arc<Config> {
		Arc::new(Config {
			repo_base: "https://repo.example.org".to_owned(),
			depgraph_uri: "bolt://localhost:7687".to_owned(),
			depgraph_user: "neo4j".to_owned(),
			depgraph_password: "secret".to_owned(),
			bytecode_analyzer_path: "/bin/false".into(),
			class_ref_tool_path: "/bin/false".into(),
			reflection_method_list: "/dev/null".into(),
			working_dir: working_dir.to_owned(),
			cg_tool: crate::config::CgToolChoice::PointsTo,
			proc_num_deps: 4,
			proc_num_cg: 4,
			max_visits_per_ga: 1000,
			cg_timeout_secs: 1,
		})
	}

	#[tokio::test]
	async fn collect_sinks_from_upstreams_reads_entry_point_keys() {
		let dir = TempDir::new().unwrap();
		let config = test_config(dir.path());
		let graph_store: Arc<dyn GraphStore> = Arc::new(FakeGraphStore { edges: BTreeMap::new() });
		let engine = PropagationEngine::new(config.clone(), graph_store);

		let upstream = Ga::new("com.ex", "vuln");
		let item = Ga::new("com.ex", "dep");
		let upstream_dir = GaDir::new(&config.working_dir, "CVE-2024-0001", &upstream);

		let mut callers = BTreeMap::new();
		callers.insert("<com.ex.dep.B: public void entry()>".to_owned(), vec!["<com.ex.vuln.A: void caller()>".to_owned()]);
		GaDir::merge_dep_calls(upstream_dir.dep_calls_path(), "com.ex:dep", "1.0", "2.0", &callers).await.unwrap();

		let up_set = BTreeSet::from([upstream]);
		let sinks = engine.collect_sinks_from_upstreams("CVE-2024-0001", &item, &up_set).unwrap();

		assert_eq!(sinks.get("2.0").unwrap().len(), 1);
		assert_eq!(sinks["2.0"].iter().next().unwrap().to_string(), "<com.ex.dep.B: public void entry()>");
	}

	#[tokio::test]
	async fn max_visits_per_ga_stops_a_runaway_revisit_loop() {
		let dir = TempDir::new().unwrap();
		let mut config_owned = (*test_config(dir.path())).clone();
		config_owned.max_visits_per_ga = 1;
		let config = Arc::new(config_owned);

		let graph_store: Arc<dyn GraphStore> = Arc::new(FakeGraphStore { edges: BTreeMap::new() });
		let mut engine = PropagationEngine::new(config, graph_store);

		let item = Ga::new("com.ex", "dep");
		let vulnerable_gav = Gav::new("com.ex", "vuln", "1.0").unwrap();
		let sinks: Vec<Signature> = vec!["<com.ex.A: void sink()>".parse().unwrap()];
		let annotations = Annotations::default();

		engine.process_item("CVE-2024-0001", &item, true, &vulnerable_gav, &sinks, &annotations).await.unwrap();
		// second visit exceeds max_visits_per_ga and must return cleanly rather than error
		engine.process_item("CVE-2024-0001", &item, false, &vulnerable_gav, &sinks, &annotations).await.unwrap();

		assert_eq!(engine.visits[&item], 2);
	}
}
