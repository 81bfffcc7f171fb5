use std::path::{Path, PathBuf};
use std::time::Duration;
use anyhow::{Context, Result};
use vpa_analysis::{BytecodeAnalyzer, CgEngine, ToolOutcome};
use vpa_coord::Gav;
use vpa_sig::CallGraph;
use vpa_store::NamedLock;

/// Generates and caches per-GAV callgraphs via the external bytecode analyzer, post-filtering
/// each one down to the GAV's own owned packages.
#[derive(Clone)]
pub struct CallgraphOracleClient {
	analyzer: BytecodeAnalyzer,
	engine: CgEngine,
	cache_dir: PathBuf,
	timeout: Duration,
}

impl CallgraphOracleClient {
	pub fn new(analyzer: BytecodeAnalyzer, engine: CgEngine, cache_dir: impl Into<PathBuf>, timeout: Duration) -> CallgraphOracleClient {
		CallgraphOracleClient { analyzer, engine, cache_dir: cache_dir.into(), timeout }
	}

	pub fn cache_path(&self, gav: &Gav) -> PathBuf {
		self.cache_dir.join(&gav.group).join(&gav.artifact).join(format!("{}.cg.json", gav.version))
	}

	/// Ensures the callgraph for `gav` exists, generating it if this is the first request. A
	/// previously-generated graph is returned from cache without re-invoking the generator - the
	/// named lock on the output path means a concurrent caller either waits for the in-flight
	/// generation or finds the cached file afterwards.
	///
	/// Returns `None` if generation failed, timed out, or produced no output file - the caller
	/// drops the corresponding downstream GAV, per the "timed-out or non-zero exits ... return
	/// null" contract.
	pub async fn callgraph(
		&self,
		jar_path: &Path,
		gav: &Gav,
		owned_prefixes: &[String],
		supplementary_prefixes: &[String],
		only_app: bool,
		package_prefix_file: Option<&Path>,
	) -> Result<Option<CallGraph>> {
		let out_path = self.cache_path(gav);
		let lock = NamedLock::for_path(&out_path);
		let _guard = tokio::task::spawn_blocking(move || lock.lock()).await.context("join lock task")??;

		if out_path.is_file() {
			let bytes = std::fs::read(&out_path).with_context(|| format!("reading cached callgraph {out_path:?}"))?;
			return Ok(Some(CallGraph::from_json_bytes(&bytes)?));
		}

		if let Some(parent) = out_path.parent() {
			std::fs::create_dir_all(parent).with_context(|| format!("creating {parent:?}"))?;
		}

		match self.analyzer.gen_cg(jar_path, self.engine, &out_path, only_app, package_prefix_file, self.timeout).await {
			ToolOutcome::Success(()) => {}
			ToolOutcome::ToolCrash | ToolOutcome::Timeout => return Ok(None),
		}

		if !out_path.is_file() {
			return Ok(None);
		}

		let bytes = std::fs::read(&out_path).with_context(|| format!("reading generated callgraph {out_path:?}"))?;
		let mut cg = CallGraph::from_json_bytes(&bytes)?;

		let mut all_owned_prefixes = owned_prefixes.to_vec();
		all_owned_prefixes.extend(supplementary_prefixes.iter().cloned());
		cg.filter_to_owned_prefixes(&all_owned_prefixes);

		let filtered_bytes = cg.to_json_bytes()?;
		vpa_store::persist::write_atomic(&out_path, &filtered_bytes)?;

		Ok(Some(cg))
	}
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;
	use tempfile::TempDir;
	use super::*;

	#[test]
	fn cache_path_is_keyed_by_gav() {
		let client = CallgraphOracleClient::new(
			BytecodeAnalyzer::new("/bin/true"),
			CgEngine::PointsTo,
			"/tmp/vpa-cg-cache",
			Duration::from_secs(30),
		);
		let gav = Gav::new("com.ex", "dep", "2.0").unwrap();
		assert_eq!(client.cache_path(&gav), PathBuf::from("/tmp/vpa-cg-cache/com.ex/dep/2.0.cg.json"));
	}

	#[tokio::test]
	async fn returns_cached_graph_without_regenerating() {
		let dir = TempDir::new().unwrap();
		let client = CallgraphOracleClient::new(
			BytecodeAnalyzer::new("/bin/false"), // would fail if actually invoked
			CgEngine::PointsTo,
			dir.path(),
			Duration::from_secs(1),
		);
		let gav = Gav::new("com.ex", "dep", "2.0").unwrap();
		let cache_path = client.cache_path(&gav);
		std::fs::create_dir_all(cache_path.parent().unwrap()).unwrap();

		let mut cg = CallGraph::new();
		let sig: vpa_sig::Signature = "<com.ex.dep.B: public void entry()>".parse().unwrap();
		cg.ensure_node(sig, vpa_sig::Modifier::Public);
		std::fs::write(&cache_path, cg.to_json_bytes().unwrap()).unwrap();

		let result = client.callgraph(Path::new("/nonexistent.jar"), &gav, &[], &[], false, None).await.unwrap();
		assert_eq!(result.unwrap().node_count(), 1);
	}
}
