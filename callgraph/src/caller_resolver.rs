use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::time::Duration;
use vpa_analysis::{BytecodeAnalyzer, ToolOutcome};
use vpa_sig::{CallGraph, Signature};

/// Cheap pre-filter before building a downstream GAV's full callgraph: a textual "does this jar
/// reference any of these methods" check via the external analyzer's `check-call` task. A tool
/// crash or timeout is treated conservatively (build the callgraph anyway), matching the
/// tool-crash policy used throughout this workspace.
pub async fn has_possible_callers(
	analyzer: &BytecodeAnalyzer,
	jar_path: &Path,
	entry_points: &[Signature],
	package_prefix_file: Option<&Path>,
	timeout: Duration,
) -> bool {
	match analyzer.check_call(jar_path, entry_points, package_prefix_file, timeout).await {
		ToolOutcome::Success(positive) => positive,
		ToolOutcome::ToolCrash | ToolOutcome::Timeout => true,
	}
}

/// Given entry-point signatures (computed on the upstream's callgraph) and a downstream GAV's
/// callgraph, returns the map entry-point -> callers found in the downstream graph. An
/// entry-point absent from the downstream graph, or with no incoming edges, is omitted - an
/// empty overall map means the downstream GAV does not actually call any entry-point.
pub fn resolve_callers(entry_points: &HashSet<Signature>, downstream_graph: &CallGraph) -> HashMap<Signature, Vec<Signature>> {
	let mut result = HashMap::new();
	for entry in entry_points {
		if !downstream_graph.contains(entry) {
			continue;
		}
		let callers = downstream_graph.callers_of(entry);
		if !callers.is_empty() {
			result.insert(entry.clone(), callers);
		}
	}
	result
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;
	use super::*;

	fn sig(s: &str) -> Signature {
		s.parse().unwrap()
	}

	#[test]
	fn resolves_callers_for_present_entry_points() {
		let mut cg = CallGraph::new();
		let caller = sig("<com.dep.X: public void use()>");
		let entry = sig("<com.ex.dep.B: public void entry()>");
		cg.ensure_node(caller.clone(), vpa_sig::Modifier::Public);
		cg.ensure_node(entry.clone(), vpa_sig::Modifier::Public);
		cg.add_edge(&caller, &entry);

		let entry_points = HashSet::from([entry.clone()]);
		let result = resolve_callers(&entry_points, &cg);

		assert_eq!(result.get(&entry), Some(&vec![caller]));
	}

	#[test]
	fn omits_entry_points_with_no_downstream_callers() {
		let mut cg = CallGraph::new();
		let entry = sig("<com.ex.dep.B: public void entry()>");
		cg.ensure_node(entry.clone(), vpa_sig::Modifier::Public);

		let entry_points = HashSet::from([entry]);
		let result = resolve_callers(&entry_points, &cg);
		assert!(result.is_empty());
	}

	#[test]
	fn omits_entry_points_absent_from_the_graph() {
		let cg = CallGraph::new();
		let entry = sig("<com.ex.dep.B: public void entry()>");
		let entry_points = HashSet::from([entry]);
		assert!(resolve_callers(&entry_points, &cg).is_empty());
	}
}
