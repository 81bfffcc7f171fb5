use std::collections::{HashMap, VecDeque};
use log::warn;
use petgraph::algo::{has_path_connecting, toposort};
use petgraph::graph::{DiGraph, NodeIndex};
use vpa_coord::Ga;

/// The full ecosystem dependency graph the VPSS scorer normalizes its direct/transitive counts
/// against - a `DiGraph<Ga, ()>` in the same shape [`vpa_sig::CallGraph`] uses for method call
/// edges, generalized to GA nodes.
///
/// Kept acyclic by construction: [`GaDependencyGraph::add_edge`] refuses an edge that would close
/// a cycle back to its own source, since the scoring counts below assume a DAG rooted at the
/// vulnerable GA.
#[derive(Debug, Default, Clone)]
pub struct GaDependencyGraph {
	graph: DiGraph<Ga, ()>,
	indices: HashMap<Ga, NodeIndex>,
}

impl GaDependencyGraph {
	pub fn new() -> GaDependencyGraph {
		GaDependencyGraph::default()
	}

	fn ensure_node(&mut self, ga: &Ga) -> NodeIndex {
		if let Some(&idx) = self.indices.get(ga) {
			idx
		} else {
			let idx = self.graph.add_node(ga.clone());
			self.indices.insert(ga.clone(), idx);
			idx
		}
	}

	/// Adds a `from -> to` edge. If `to` can already reach `from`, the edge would close a cycle;
	/// it is dropped and logged rather than inserted, per the "broken by dropping the last edge
	/// that would introduce one" rule. Returns whether the edge was actually inserted, so a caller
	/// walking a frontier (like `gen_package_dep_graph`'s BFS) can skip exploring further through an
	/// edge that was dropped.
	pub fn add_edge(&mut self, from: &Ga, to: &Ga) -> bool {
		let to_idx = self.ensure_node(to);
		let from_idx = self.ensure_node(from);

		if has_path_connecting(&self.graph, to_idx, from_idx, None) {
			warn!("dependency graph edge {from} -> {to} would close a cycle, dropping it");
			return false;
		}

		self.graph.update_edge(from_idx, to_idx, ());
		true
	}

	pub fn node_count(&self) -> usize {
		self.graph.node_count()
	}

	/// BFS hop distance from `root` to every other node reachable by following edges forward.
	/// `root` itself is not included in the result.
	pub fn reachable_from(&self, root: &Ga) -> HashMap<Ga, u32> {
		let Some(&root_idx) = self.indices.get(root) else { return HashMap::new() };

		let mut depths = HashMap::new();
		let mut queue = VecDeque::new();
		queue.push_back((root_idx, 0u32));
		let mut seen = std::collections::HashSet::from([root_idx]);

		while let Some((idx, depth)) = queue.pop_front() {
			for neighbor in self.graph.neighbors(idx) {
				if seen.insert(neighbor) {
					let ga = self.graph[neighbor].clone();
					depths.insert(ga, depth + 1);
					queue.push_back((neighbor, depth + 1));
				}
			}
		}

		depths
	}

	/// Node count of the longest path starting at `root`, matching `nx.dag_longest_path`'s
	/// `len(longest_path)` restricted to paths through `root` - a topological-order DP over
	/// longest-hop-distance, not the BFS shortest-hop distance `reachable_from` gives. `root` itself
	/// counts as one node, so a root with no outgoing edges returns 1.
	pub fn longest_path_node_count_from(&self, root: &Ga) -> u32 {
		let Some(&root_idx) = self.indices.get(root) else { return 0 };

		let Ok(order) = toposort(&self.graph, None) else {
			warn!("dependency graph has a cycle despite add_edge's cycle check, cannot compute longest path");
			return 0;
		};

		let mut dist: HashMap<NodeIndex, u32> = HashMap::from([(root_idx, 0)]);
		for idx in order {
			let Some(&here) = dist.get(&idx) else { continue };
			for neighbor in self.graph.neighbors(idx) {
				let candidate = here + 1;
				dist.entry(neighbor).and_modify(|d| *d = (*d).max(candidate)).or_insert(candidate);
			}
		}

		dist.values().copied().max().unwrap_or(0) + 1
	}

	/// Average hop count of every root-to-leaf path starting at `root`, where a leaf is a node with
	/// no outgoing edges - `average_path_length_to_leaves`'s DFS enumeration, weighting each leaf by
	/// how many distinct root-to-leaf paths reach it (no memoization, same as the source). Returns
	/// `0.0` if `root` is unknown or has no reachable leaf (e.g. `root` is itself a leaf).
	pub fn avg_leaf_path_hops_from(&self, root: &Ga) -> f64 {
		let Some(&root_idx) = self.indices.get(root) else { return 0.0 };

		let mut lengths = Vec::new();
		let mut stack = vec![(root_idx, 0u32)];
		while let Some((idx, hops)) = stack.pop() {
			let mut has_outgoing = false;
			for neighbor in self.graph.neighbors(idx) {
				has_outgoing = true;
				stack.push((neighbor, hops + 1));
			}
			if !has_outgoing && idx != root_idx {
				lengths.push(hops);
			}
		}

		if lengths.is_empty() {
			0.0
		} else {
			lengths.iter().copied().sum::<u32>() as f64 / lengths.len() as f64
		}
	}
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;
	use super::*;

	#[test]
	fn bfs_hop_distances_from_root() {
		let mut graph = GaDependencyGraph::new();
		let root = Ga::new("com.ex", "vuln");
		let dep = Ga::new("com.ex", "dep");
		let transitive = Ga::new("com.ex", "transitive");

		graph.add_edge(&root, &dep);
		graph.add_edge(&dep, &transitive);

		let depths = graph.reachable_from(&root);
		assert_eq!(depths.get(&dep), Some(&1));
		assert_eq!(depths.get(&transitive), Some(&2));
		assert!(!depths.contains_key(&root));
	}

	#[test]
	fn drops_edge_that_would_close_a_cycle() {
		let mut graph = GaDependencyGraph::new();
		let a = Ga::new("com.ex", "a");
		let b = Ga::new("com.ex", "b");

		assert!(graph.add_edge(&a, &b));
		assert!(!graph.add_edge(&b, &a)); // would close a cycle, must be dropped

		let depths = graph.reachable_from(&a);
		assert_eq!(depths.get(&b), Some(&1));
		// b -> a was dropped, so a is not reachable from b
		assert!(graph.reachable_from(&b).get(&a).is_none());
	}

	#[test]
	fn unknown_root_has_no_reachable_nodes() {
		let graph = GaDependencyGraph::new();
		let root = Ga::new("com.ex", "unknown");
		assert!(graph.reachable_from(&root).is_empty());
	}

	#[test]
	fn longest_path_counts_nodes_not_hops() {
		let mut graph = GaDependencyGraph::new();
		let root = Ga::new("com.ex", "vuln");
		let mid = Ga::new("com.ex", "mid");
		let leaf = Ga::new("com.ex", "leaf");

		graph.add_edge(&root, &mid);
		graph.add_edge(&mid, &leaf);

		// two hops, three nodes on the path: root, mid, leaf.
		assert_eq!(graph.longest_path_node_count_from(&root), 3);
	}

	#[test]
	fn longest_path_takes_the_longer_of_two_branches() {
		let mut graph = GaDependencyGraph::new();
		let root = Ga::new("com.ex", "vuln");
		let short_leaf = Ga::new("com.ex", "short-leaf");
		let mid = Ga::new("com.ex", "mid");
		let long_leaf = Ga::new("com.ex", "long-leaf");

		graph.add_edge(&root, &short_leaf);
		graph.add_edge(&root, &mid);
		graph.add_edge(&mid, &long_leaf);

		assert_eq!(graph.longest_path_node_count_from(&root), 3);
	}

	#[test]
	fn root_with_no_edges_has_a_longest_path_of_one_node() {
		let mut graph = GaDependencyGraph::new();
		let root = Ga::new("com.ex", "lonely");
		graph.add_edge(&root, &Ga::new("com.ex", "other")); // give it a node without an edge from root
		assert_eq!(graph.longest_path_node_count_from(&Ga::new("com.ex", "other")), 1);
	}

	#[test]
	fn avg_leaf_path_hops_averages_over_distinct_leaves_with_multiplicity() {
		let mut graph = GaDependencyGraph::new();
		let root = Ga::new("com.ex", "vuln");
		let a = Ga::new("com.ex", "a");
		let b = Ga::new("com.ex", "b");
		let leaf1 = Ga::new("com.ex", "leaf1");
		let leaf2 = Ga::new("com.ex", "leaf2");

		// root -> a -> leaf1 (2 hops), root -> b -> leaf2 (2 hops), root -> leaf1 directly (1 hop)
		graph.add_edge(&root, &a);
		graph.add_edge(&a, &leaf1);
		graph.add_edge(&root, &b);
		graph.add_edge(&b, &leaf2);
		graph.add_edge(&root, &leaf1);

		// (2 + 2 + 1) / 3
		assert_eq!(graph.avg_leaf_path_hops_from(&root), 5.0 / 3.0);
	}

	#[test]
	fn unreachable_or_leaf_root_has_zero_average() {
		let graph = GaDependencyGraph::new();
		assert_eq!(graph.avg_leaf_path_hops_from(&Ga::new("com.ex", "unknown")), 0.0);

		let mut leaf_graph = GaDependencyGraph::new();
		let root = Ga::new("com.ex", "lonely");
		leaf_graph.add_edge(&Ga::new("com.ex", "other"), &root);
		assert_eq!(leaf_graph.avg_leaf_path_hops_from(&root), 0.0);
	}
}
