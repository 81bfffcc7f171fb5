use std::collections::HashMap;
use anyhow::{Context, Result};
use petgraph::graph::{DiGraph, NodeIndex};
use serde::{Deserialize, Serialize};
use crate::signature::{Modifier, Signature};

/// The `{nodes:[{signature,modifier}], edges:[{src,tgt}]}` shape the external bytecode analyzer
/// writes to its `--out` file.
#[derive(Debug, Serialize, Deserialize)]
struct CallGraphJson {
	nodes: Vec<NodeJson>,
	edges: Vec<EdgeJson>,
}

#[derive(Debug, Serialize, Deserialize)]
struct NodeJson {
	signature: String,
	modifier: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct EdgeJson {
	src: String,
	tgt: String,
}

/// A directed graph of method signatures under the "invokes" relation, as produced by the external
/// callgraph generator and consumed by the entry-point finder and the caller-resolver.
///
/// Mirrors the `DiGraph` + name-to-`NodeIndex` index shape used elsewhere in the corpus for
/// call-graph reachability (signature strings stand in for the method-id strings there).
#[derive(Debug, Default, Clone)]
pub struct CallGraph {
	graph: DiGraph<Signature, ()>,
	indices: HashMap<Signature, NodeIndex>,
	modifiers: HashMap<Signature, Modifier>,
}

impl CallGraph {
	pub fn new() -> CallGraph {
		CallGraph::default()
	}

	/// Inserts a node if absent, returning its index either way (idempotent).
	pub fn ensure_node(&mut self, signature: Signature, modifier: Modifier) -> NodeIndex {
		if let Some(&idx) = self.indices.get(&signature) {
			self.modifiers.entry(signature).or_insert(modifier);
			idx
		} else {
			let idx = self.graph.add_node(signature.clone());
			self.indices.insert(signature.clone(), idx);
			self.modifiers.insert(signature, modifier);
			idx
		}
	}

	pub fn add_edge(&mut self, source: &Signature, target: &Signature) {
		if let (Some(&s), Some(&t)) = (self.indices.get(source), self.indices.get(target)) {
			self.graph.update_edge(s, t, ());
		}
	}

	pub fn modifier_of(&self, signature: &Signature) -> Option<Modifier> {
		self.modifiers.get(signature).copied()
	}

	pub fn contains(&self, signature: &Signature) -> bool {
		self.indices.contains_key(signature)
	}

	pub fn node_count(&self) -> usize {
		self.graph.node_count()
	}

	pub fn edge_count(&self) -> usize {
		self.graph.edge_count()
	}

	pub fn signatures(&self) -> impl Iterator<Item = &Signature> {
		self.indices.keys()
	}

	pub(crate) fn graph(&self) -> &DiGraph<Signature, ()> {
		&self.graph
	}

	pub(crate) fn index_of(&self, signature: &Signature) -> Option<NodeIndex> {
		self.indices.get(signature).copied()
	}

	/// Direct callers of `target`: every signature with an edge `caller -> target`.
	pub fn callers_of(&self, target: &Signature) -> Vec<Signature> {
		let Some(idx) = self.indices.get(target) else { return Vec::new() };
		self.graph.neighbors_directed(*idx, petgraph::Direction::Incoming)
			.map(|n| self.graph[n].clone())
			.collect()
	}

	/// Drops every edge whose source signature's class is not under any of `owned_prefixes`,
	/// restricting the graph to the owning GAV.
	///
	/// Implemented by rebuilding the edge set rather than mutating in place, since `petgraph`
	/// does not offer a retain-edges-by-predicate primitive on `DiGraph` directly.
	pub fn filter_to_owned_prefixes(&mut self, owned_prefixes: &[String]) {
		let kept_edges: Vec<(NodeIndex, NodeIndex)> = self.graph.edge_indices()
			.filter_map(|e| {
				let (s, t) = self.graph.edge_endpoints(e)?;
				let source_class = &self.graph[s].class;
				if owned_prefixes.iter().any(|p| source_class.starts_with(p.as_str())) {
					Some((s, t))
				} else {
					None
				}
			})
			.collect();

		self.graph.clear_edges();
		for (s, t) in kept_edges {
			self.graph.update_edge(s, t, ());
		}
	}

	pub fn to_json_bytes(&self) -> Result<Vec<u8>> {
		let nodes = self.indices.keys()
			.map(|sig| NodeJson {
				signature: sig.to_string(),
				modifier: self.modifiers.get(sig).copied().unwrap_or(Modifier::Package).to_string(),
			})
			.collect();

		let edges = self.graph.edge_indices()
			.filter_map(|e| self.graph.edge_endpoints(e))
			.map(|(s, t)| EdgeJson { src: self.graph[s].to_string(), tgt: self.graph[t].to_string() })
			.collect();

		serde_json::to_vec_pretty(&CallGraphJson { nodes, edges }).context("serializing callgraph")
	}

	pub fn from_json_bytes(bytes: &[u8]) -> Result<CallGraph> {
		let parsed: CallGraphJson = serde_json::from_slice(bytes).context("parsing callgraph JSON")?;

		let mut cg = CallGraph::new();
		for node in &parsed.nodes {
			let sig: Signature = node.signature.parse()
				.with_context(|| format!("parsing node signature {:?}", node.signature))?;
			let modifier: Modifier = node.modifier.parse()
				.with_context(|| format!("parsing modifier {:?} for {}", node.modifier, node.signature))?;
			cg.ensure_node(sig, modifier);
		}
		for edge in &parsed.edges {
			let src: Signature = edge.src.parse()
				.with_context(|| format!("parsing edge source {:?}", edge.src))?;
			let tgt: Signature = edge.tgt.parse()
				.with_context(|| format!("parsing edge target {:?}", edge.tgt))?;
			cg.add_edge(&src, &tgt);
		}
		Ok(cg)
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
	fn filters_edges_outside_owned_prefixes() {
		let mut cg = CallGraph::new();
		let entry = sig("<com.ex.dep.B: public void entry()>");
		let sink = sig("<com.ex.A: void sink()>");
		let other = sig("<org.other.C: void m()>");

		cg.ensure_node(entry.clone(), Modifier::Public);
		cg.ensure_node(sink.clone(), Modifier::Package);
		cg.ensure_node(other.clone(), Modifier::Public);

		cg.add_edge(&entry, &sink);
		cg.add_edge(&other, &sink);

		cg.filter_to_owned_prefixes(&["com.ex.dep".to_owned()]);

		assert_eq!(cg.callers_of(&sink), vec![entry]);
	}

	#[test]
	fn json_round_trip() {
		let mut cg = CallGraph::new();
		let entry = sig("<com.ex.dep.B: public void entry()>");
		let sink = sig("<com.ex.A: void sink()>");
		cg.ensure_node(entry.clone(), Modifier::Public);
		cg.ensure_node(sink.clone(), Modifier::Package);
		cg.add_edge(&entry, &sink);

		let bytes = cg.to_json_bytes().unwrap();
		let back = CallGraph::from_json_bytes(&bytes).unwrap();

		assert_eq!(back.callers_of(&sink), vec![entry]);
		assert_eq!(back.modifier_of(&sig("<com.ex.dep.B: public void entry()>")), Some(Modifier::Public));
	}
}
