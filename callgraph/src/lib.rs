pub mod caller_resolver;
pub mod entry_points;
pub mod oracle_client;

pub use caller_resolver::{has_possible_callers, resolve_callers};
pub use entry_points::EntryPointFinder;
pub use oracle_client::CallgraphOracleClient;
