use std::path::{Path, PathBuf};
use std::time::Duration;
use anyhow::{Context, Result};
use serde::Deserialize;
use vpa_analysis::CgEngine;

/// Everything the propagation engine needs to know before it can run, loaded from a TOML file
/// and overridable from the CLI (`vpa propagate --proc-num-deps ...`). Carried explicitly as an
/// `Arc<Config>` rather than a global, per the Design Notes' "port as explicit configuration"
/// instruction - there is no module-level `static CONFIG` anywhere in this workspace.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
	/// Base URL of the Maven-layout artifact repository, e.g. `https://repo1.maven.org/maven2`.
	pub repo_base: String,
	/// Connection URI of the dependency-graph store.
	pub depgraph_uri: String,
	pub depgraph_user: String,
	pub depgraph_password: String,
	/// Path to the external bytecode analyzer binary (`--task gen-cg|check-call|check-reflect`).
	pub bytecode_analyzer_path: PathBuf,
	/// Path to the `jdeps`-equivalent class-reference utility.
	pub class_ref_tool_path: PathBuf,
	/// Path to the reflection-API method list fed to `check-reflect`.
	pub reflection_method_list: PathBuf,
	/// Root of the per-CVE working directories (§3) and the artifact download cache.
	pub working_dir: PathBuf,
	/// Which external callgraph generator is configured.
	#[serde(default = "default_cg_tool")]
	pub cg_tool: CgToolChoice,
	/// Size of the worker pool used by propagation-engine step 3 (dependency-direction filter).
	#[serde(default = "default_proc_num_deps")]
	pub proc_num_deps: usize,
	/// Size of the worker pool used by propagation-engine step 6 (CG-level filter).
	#[serde(default = "default_proc_num_cg")]
	pub proc_num_cg: usize,
	/// Backstop for the monotone-sink termination argument (§9 open question 3): a GA visited
	/// more than this many times is treated as a no-op and logged, rather than re-enqueued
	/// forever by an aggressive reflection-aware generator that keeps finding "new" sinks.
	#[serde(default = "default_max_visits_per_ga")]
	pub max_visits_per_ga: u32,
	/// Timeout for a single callgraph-generation invocation (§6 "Timeout: configurable").
	#[serde(default = "default_cg_timeout_secs")]
	pub cg_timeout_secs: u64,
	/// Directory of per-GA `dependencies.json` files the VPSS Scorer builds its ecosystem graph
	/// from (`vpa score`). Not read by `vpa propagate`.
	#[serde(default)]
	pub ecosystem_graph_dir: Option<PathBuf>,
	/// `group,artifact,version,timestamp` CSV the VPSS Scorer builds its publish-time index from
	/// (`vpa score`). Not read by `vpa propagate`.
	#[serde(default)]
	pub gav_timestamps_csv: Option<PathBuf>,
}

fn default_proc_num_deps() -> usize { 8 }
fn default_proc_num_cg() -> usize { 4 }
fn default_max_visits_per_ga() -> u32 { 1000 }
fn default_cg_timeout_secs() -> u64 { 300 }
fn default_cg_tool() -> CgToolChoice { CgToolChoice::PointsTo }

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CgToolChoice {
	PointsTo,
	ReflectionAware,
}

impl CgToolChoice {
	pub fn to_engine(self) -> CgEngine {
		match self {
			CgToolChoice::PointsTo => CgEngine::PointsTo,
			CgToolChoice::ReflectionAware => CgEngine::ReflectionAware,
		}
	}
}

impl Config {
	/// Loads the TOML config file the `vpa` binary is pointed at with `--config`.
	pub fn load(path: &Path) -> Result<Config> {
		let contents = std::fs::read_to_string(path).with_context(|| format!("reading config file {path:?}"))?;
		toml::from_str(&contents).with_context(|| format!("parsing config file {path:?}"))
	}

	pub fn cg_timeout(&self) -> Duration {
		Duration::from_secs(self.cg_timeout_secs)
	}
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;
	use super::*;

	#[test]
	fn defaults_fill_in_missing_fields() {
		let toml = r#"
			repo_base = "https://repo.example.org"
			depgraph_uri = "bolt://localhost:7687"
			depgraph_user = "neo4j"
			depgraph_password = "secret"
			bytecode_analyzer_path = "/usr/local/bin/bytecode-analyzer"
			class_ref_tool_path = "/usr/local/bin/jdeps"
			reflection_method_list = "/etc/vpa/reflection-methods.txt"
			working_dir = "/var/lib/vpa"
		"#;
		let config: Config = toml::from_str(toml).unwrap();
		assert_eq!(config.proc_num_deps, 8);
		assert_eq!(config.proc_num_cg, 4);
		assert_eq!(config.max_visits_per_ga, 1000);
		assert_eq!(config.cg_tool, CgToolChoice::PointsTo);
	}

	#[test]
	fn load_reads_a_config_file_from_disk() {
		let dir = tempfile::TempDir::new().unwrap();
		let path = dir.path().join("vpa.toml");
		std::fs::write(&path, r#"
			repo_base = "https://repo.example.org"
			depgraph_uri = "bolt://localhost:7687"
			depgraph_user = "neo4j"
			depgraph_password = "secret"
			bytecode_analyzer_path = "/usr/local/bin/bytecode-analyzer"
			class_ref_tool_path = "/usr/local/bin/jdeps"
			reflection_method_list = "/etc/vpa/reflection-methods.txt"
			working_dir = "/var/lib/vpa"
			proc_num_deps = 16
		"#).unwrap();

		let config = Config::load(&path).unwrap();
		assert_eq!(config.repo_base, "https://repo.example.org");
		assert_eq!(config.proc_num_deps, 16);
	}
}
