pub mod class_surface;
pub mod fetcher;

pub use class_surface::class_names;
pub use fetcher::{fetch_jar, FetchOutcome};
