mod store;

pub use store::{DependencyGraphStore, GraphStore};
