pub mod callgraph;
pub mod signature;

pub use callgraph::CallGraph;
pub use signature::{Modifier, Signature};
