use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use anyhow::{Context, Result};
use fs2::FileExt;

/// A named, cross-process exclusive lock keyed on a path: every persisted JSON file and the
/// package-prefix / reflection KV table are written through one of these, keyed on the target path.
///
/// The lock file is a sibling of `path` with a `.lock` suffix, never the file being protected
/// itself, so the locked file can still be atomically replaced (temp-file + rename) while held.
pub struct NamedLock {
	lock_path: PathBuf,
}

impl NamedLock {
	pub fn for_path(path: impl AsRef<Path>) -> NamedLock {
		let mut lock_path = path.as_ref().as_os_str().to_owned();
		lock_path.push(".lock");
		NamedLock { lock_path: lock_path.into() }
	}

	/// Blocks the current thread until the lock is acquired. `fs2::lock_exclusive` is a blocking
	/// syscall; callers running inside the async engine invoke this via `spawn_blocking`.
	pub fn lock(&self) -> Result<LockGuard> {
		if let Some(parent) = self.lock_path.parent() {
			std::fs::create_dir_all(parent).with_context(|| format!("creating {parent:?}"))?;
		}
		let file = OpenOptions::new().create(true).write(true).open(&self.lock_path)
			.with_context(|| format!("opening lock file {:?}", self.lock_path))?;
		file.lock_exclusive().with_context(|| format!("locking {:?}", self.lock_path))?;
		Ok(LockGuard { file })
	}
}

/// Releases the lock (via `Drop` on the underlying file) when dropped.
pub struct LockGuard {
	file: std::fs::File,
}

impl Drop for LockGuard {
	fn drop(&mut self) {
		let _ = fs2::FileExt::unlock(&self.file);
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn lock_file_is_sibling_not_target() {
		let lock = NamedLock::for_path("/tmp/vpa-store-test/tfs.json");
		assert_eq!(lock.lock_path, PathBuf::from("/tmp/vpa-store-test/tfs.json.lock"));
	}
}
