use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use anyhow::{Context, Result};
use serde::Deserialize;
use vpa_store::persist;

/// `annotations/{cve}/config.json` (§6): per-CVE overrides to the callgraph generator and
/// analysis classpath. All fields are optional - a CVE without an annotation file behaves as if
/// every field were empty/default.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Annotations {
	/// Forwarded to the generator as extra reflection-handling hints.
	pub reflection_annotations: Option<PathBuf>,
	/// GAV (canonical string) -> whether to pass `--only-app` to the generator for it.
	#[serde(default, rename = "only-app-code")]
	pub only_app_code: BTreeMap<String, bool>,
	/// GAV (canonical string) -> extra GAVs to add to the analysis classpath; their owned
	/// prefixes are unioned into the prefix filter for that GAV.
	#[serde(default)]
	pub supplementary_ga: BTreeMap<String, Vec<String>>,
}

impl Annotations {
	/// Loads `annotations/{cve}/config.json` under `working_dir`, or the empty default if the
	/// CVE has no annotation file - most CVEs don't need one.
	pub fn load(working_dir: &Path, cve_id: &str) -> Result<Annotations> {
		let path = working_dir.join("annotations").join(cve_id).join("config.json");
		persist::read_json_or_default(&path).with_context(|| format!("reading annotations {path:?}"))
	}

	pub fn only_app_code(&self, gav: &str) -> bool {
		self.only_app_code.get(gav).copied().unwrap_or(false)
	}

	pub fn supplementary_ga(&self, gav: &str) -> &[String] {
		self.supplementary_ga.get(gav).map(Vec::as_slice).unwrap_or(&[])
	}
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;
	use tempfile::TempDir;
	use super::*;

	#[test]
	fn missing_annotation_file_is_the_empty_default() {
		let dir = TempDir::new().unwrap();
		let annotations = Annotations::load(dir.path(), "CVE-2024-0001").unwrap();
		assert!(!annotations.only_app_code("com.ex:vuln:1.0"));
		assert!(annotations.supplementary_ga("com.ex:vuln:1.0").is_empty());
	}

	#[test]
	fn parses_present_annotation_file() {
		let dir = TempDir::new().unwrap();
		let path = dir.path().join("annotations").join("CVE-2024-0001").join("config.json");
		std::fs::create_dir_all(path.parent().unwrap()).unwrap();
		std::fs::write(&path, r#"{
			"only-app-code": {"com.ex:dep:2.0": true},
			"supplementary_ga": {"com.ex:dep:2.0": ["com.ex:helper:1.0"]}
		}"#).unwrap();

		let annotations = Annotations::load(dir.path(), "CVE-2024-0001").unwrap();
		assert!(annotations.only_app_code("com.ex:dep:2.0"));
		assert_eq!(annotations.supplementary_ga("com.ex:dep:2.0"), &["com.ex:helper:1.0".to_owned()]);
	}
}
