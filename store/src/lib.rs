pub mod lock;
pub mod markers;
pub mod persist;
pub mod prefix_store;
pub mod up_file;

pub use lock::NamedLock;
pub use prefix_store::{PrefixStore, ReflectionFlag};
pub use up_file::UpFile;
