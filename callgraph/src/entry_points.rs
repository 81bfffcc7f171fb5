use std::collections::{HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};
use vpa_sig::{CallGraph, Modifier, Signature};

/// Reverse-reachability search: given a set of sink signatures and a callgraph, finds every
/// externally-reachable (public/protected) method that can reach one of the sinks. Memoized by
/// `(sink set, callgraph file)`, since the same upstream GAV's callgraph is queried repeatedly as
/// new sinks accumulate across propagation-engine iterations.
#[derive(Default)]
pub struct EntryPointFinder {
	memo: HashMap<(Vec<Signature>, PathBuf), HashSet<Signature>>,
}

impl EntryPointFinder {
	pub fn new() -> EntryPointFinder {
		EntryPointFinder::default()
	}

	pub fn entry_points(&mut self, sinks: &[Signature], graph_path: &Path, graph: &CallGraph) -> HashSet<Signature> {
		let mut sink_key = sinks.to_vec();
		sink_key.sort();
		sink_key.dedup();
		let key = (sink_key, graph_path.to_owned());

		if let Some(cached) = self.memo.get(&key) {
			return cached.clone();
		}

		let mut reached: HashSet<Signature> = HashSet::new();
		let mut queue: VecDeque<Signature> = VecDeque::new();
		for sink in sinks {
			if reached.insert(sink.clone()) {
				queue.push_back(sink.clone());
			}
		}
		while let Some(current) = queue.pop_front() {
			for caller in graph.callers_of(&current) {
				if reached.insert(caller.clone()) {
					queue.push_back(caller);
				}
			}
		}

		let entry_points: HashSet<Signature> = reached.into_iter()
			.filter(|sig| graph.modifier_of(sig).is_some_and(Modifier::is_externally_reachable))
			.collect();

		self.memo.insert(key, entry_points.clone());
		entry_points
	}
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;
	use super::*;

	fn sig(s: &str) -> Signature {
		s.parse().unwrap()
	}

	#[test]
	fn finds_public_ancestor_of_a_sink() {
		let mut cg = CallGraph::new();
		let entry = sig("<com.ex.dep.B: public void entry()>");
		let intermediate = sig("<com.ex.dep.C: package void helper()>");
		let sink = sig("<com.ex.A: void sink()>");

		cg.ensure_node(entry.clone(), vpa_sig::Modifier::Public);
		cg.ensure_node(intermediate.clone(), vpa_sig::Modifier::Package);
		cg.ensure_node(sink.clone(), vpa_sig::Modifier::Package);
		cg.add_edge(&entry, &intermediate);
		cg.add_edge(&intermediate, &sink);

		let mut finder = EntryPointFinder::new();
		let found = finder.entry_points(&[sink], Path::new("cg.json"), &cg);

		assert_eq!(found, HashSet::from([entry]));
	}

	#[test]
	fn excludes_private_and_package_ancestors() {
		let mut cg = CallGraph::new();
		let private_caller = sig("<com.ex.dep.B: private void helper()>");
		let sink = sig("<com.ex.A: void sink()>");
		cg.ensure_node(private_caller.clone(), vpa_sig::Modifier::Private);
		cg.ensure_node(sink.clone(), vpa_sig::Modifier::Package);
		cg.add_edge(&private_caller, &sink);

		let mut finder = EntryPointFinder::new();
		let found = finder.entry_points(&[sink], Path::new("cg.json"), &cg);
		assert!(found.is_empty());
	}

	#[test]
	fn memoizes_by_sink_set_and_graph_path() {
		let mut cg = CallGraph::new();
		let entry = sig("<com.ex.dep.B: public void entry()>");
		let sink = sig("<com.ex.A: void sink()>");
		cg.ensure_node(entry.clone(), vpa_sig::Modifier::Public);
		cg.ensure_node(sink.clone(), vpa_sig::Modifier::Package);
		cg.add_edge(&entry, &sink);

		let mut finder = EntryPointFinder::new();
		let path = Path::new("cg.json");
		let first = finder.entry_points(&[sink.clone()], path, &cg);
		assert_eq!(finder.memo.len(), 1);
		let second = finder.entry_points(&[sink], path, &cg);
		assert_eq!(first, second);
		assert_eq!(finder.memo.len(), 1);
	}
}
