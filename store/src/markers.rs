use std::path::Path;
use anyhow::{Context, Result};

/// `selected/` and `selected_cg/` marker directories: presence, not content, is the cache hit.
/// Creating one is idempotent - re-running the engine after a completed step touches no existing
/// marker.
pub fn mark(dir: impl AsRef<Path>) -> Result<()> {
	std::fs::create_dir_all(&dir).with_context(|| format!("creating marker {:?}", dir.as_ref()))
}

pub fn is_marked(dir: impl AsRef<Path>) -> bool {
	dir.as_ref().is_dir()
}

#[cfg(test)]
mod tests {
	use tempfile::TempDir;
	use super::*;

	#[test]
	fn marking_is_idempotent() {
		let base = TempDir::new().unwrap();
		let marker = base.path().join("selected").join("1.0").join("com.ex").join("dep").join("2.0");

		assert!(!is_marked(&marker));
		mark(&marker).unwrap();
		assert!(is_marked(&marker));
		mark(&marker).unwrap(); // no error on re-mark
		assert!(is_marked(&marker));
	}
}
