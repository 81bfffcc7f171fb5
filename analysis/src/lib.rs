pub mod direction_filter;
pub mod jdeps_client;
pub mod prefix_oracle;
pub mod reflection_probe;
pub mod tool_client;

pub use jdeps_client::ClassRefTool;
pub use prefix_oracle::PrefixOracle;
pub use tool_client::{scaled_timeout, BytecodeAnalyzer, CgEngine, ToolOutcome};
