//! Vulnerability Propagation Severity Scoring: turns a CVE's propagation-engine output into the
//! bounded VPSS exposure score (§4.J), sampled against a time-sliced view of the ecosystem
//! dependency graph.

pub mod dep_graph;
pub mod ingest;
pub mod scorer;
pub mod timestamps;
pub mod vpss;

pub use dep_graph::GaDependencyGraph;
pub use ingest::ga_dependency_graph_from_jsons;
pub use scorer::{AffectedSubgraph, VpssScorer};
pub use timestamps::{gav_timestamps_from_csv, GavTimestampIndex};
pub use vpss::{vpss, VpssInputs};
