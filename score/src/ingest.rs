use std::collections::HashMap;
use std::path::Path;
use anyhow::{Context, Result};
use walkdir::WalkDir;
use vpa_coord::Ga;
use crate::dep_graph::GaDependencyGraph;

/// Folds a tree of `dependencies.json` files - each a GAV-keyed JSON object mapping
/// `"group:artifact:version"` to the list of `"group:artifact:version"` strings it directly
/// depends on, the shape `build_dependency_graph.py`'s `load_dependencies` walks with `os.walk`
/// (a file named `dependencies.json` anywhere under `dir`, at no fixed per-GA path) - into the
/// same [`GaDependencyGraph`] the VPSS scorer builds internally. Offered as a standalone entry
/// point for offline inspection/export of the ecosystem graph independent of a live
/// dependency-graph store.
///
/// GA identity is derived from each GAV key/value by keeping only its `group:artifact` prefix
/// (`extract_ga` in the source script); a string with fewer than two colon-separated, non-empty
/// parts is skipped, matching the script's own `if not ga: continue`.
///
/// Edges are stored inverted from the source files (dependency -> dependent), matching the
/// dependency-graph store's own `RELATED` direction: a vulnerability propagates from a GA to the
/// GAs that depend on it, not to the GAs it depends on.
pub fn ga_dependency_graph_from_jsons(dir: &Path) -> Result<GaDependencyGraph> {
	let mut graph = GaDependencyGraph::new();

	for entry in WalkDir::new(dir) {
		let entry = entry.with_context(|| format!("walking {dir:?}"))?;
		if entry.file_name() != "dependencies.json" {
			continue;
		}

		let bytes = std::fs::read(entry.path()).with_context(|| format!("reading {:?}", entry.path()))?;
		let data: HashMap<String, Vec<String>> = serde_json::from_slice(&bytes)
			.with_context(|| format!("parsing {:?} as a GAV-keyed dependency map", entry.path()))?;

		for (gav, dependencies) in data {
			let Some(ga) = extract_ga(&gav) else { continue };

			for dep_gav in dependencies {
				let Some(dep_ga) = extract_ga(&dep_gav) else { continue };
				graph.add_edge(&dep_ga, &ga);
			}
		}
	}

	Ok(graph)
}

/// `"group:artifact:version"` (or bare `"group:artifact"`) -> `Ga { group, artifact }`. Returns
/// `None` for anything with fewer than two non-empty colon-separated parts, matching the source
/// script's `extract_ga`.
fn extract_ga(gav: &str) -> Option<Ga> {
	let mut parts = gav.splitn(3, ':');
	let group = parts.next()?;
	let artifact = parts.next()?;
	if group.is_empty() || artifact.is_empty() {
		return None;
	}
	Some(Ga::new(group, artifact))
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;
	use tempfile::TempDir;
	use super::*;

	#[test]
	fn folds_gav_keyed_dependency_maps_into_one_graph() {
		let dir = TempDir::new().unwrap();

		// no fixed per-GA directory layout: this one lives a couple of levels deep and keys by GAV.
		let nested = dir.path().join("kb").join("deps").join("com.ex").join("vuln");
		std::fs::create_dir_all(&nested).unwrap();
		std::fs::write(nested.join("dependencies.json"), r#"{"com.ex:vuln:1.0": ["com.ex:dep:2.0"]}"#).unwrap();

		let graph = ga_dependency_graph_from_jsons(dir.path()).unwrap();
		let depths = graph.reachable_from(&Ga::new("com.ex", "vuln"));
		assert_eq!(depths.get(&Ga::new("com.ex", "dep")), Some(&1));
	}

	#[test]
	fn skips_malformed_gav_strings() {
		assert!(extract_ga("").is_none());
		assert!(extract_ga("just-a-group").is_none());
		assert_eq!(extract_ga("com.ex:dep:1.0"), Some(Ga::new("com.ex", "dep")));
	}
}
