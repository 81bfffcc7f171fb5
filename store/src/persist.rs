use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use crate::lock::NamedLock;

/// Writes `bytes` to a fresh file at `tmp_path`, `fsync`s it, and returns the open file - shared
/// by [`write_atomic`] and [`update_json_locked`] so both writers durably commit `path.tmp` to
/// disk before the rename that makes it visible as `path`.
fn write_and_sync(tmp_path: &Path, bytes: &[u8]) -> Result<()> {
	let mut file = File::create(tmp_path).with_context(|| format!("creating {tmp_path:?}"))?;
	file.write_all(bytes).with_context(|| format!("writing {tmp_path:?}"))?;
	file.sync_all().with_context(|| format!("fsyncing {tmp_path:?}"))?;
	Ok(())
}

fn tmp_path_for(path: &Path) -> std::path::PathBuf {
	path.with_extension(match path.extension() {
		Some(ext) => format!("{}.tmp", ext.to_string_lossy()),
		None => "tmp".to_owned(),
	})
}

/// Writes `bytes` to `path` atomically: write to `path.tmp`, `fsync` it, then rename over `path`,
/// so no partial state is ever observable. Assumes the path's named lock is already held.
fn write_atomic_locked(path: &Path, bytes: &[u8]) -> Result<()> {
	if let Some(parent) = path.parent() {
		std::fs::create_dir_all(parent).with_context(|| format!("creating {parent:?}"))?;
	}

	let tmp_path = tmp_path_for(path);
	write_and_sync(&tmp_path, bytes)?;
	std::fs::rename(&tmp_path, path).with_context(|| format!("renaming {tmp_path:?} to {path:?}"))?;
	Ok(())
}

/// Writes `bytes` to `path` atomically, acquiring the path's named lock first.
pub fn write_atomic(path: impl AsRef<Path>, bytes: &[u8]) -> Result<()> {
	let path = path.as_ref();
	let lock = NamedLock::for_path(path);
	let _guard = lock.lock()?;
	write_atomic_locked(path, bytes)
}

/// Async twin of [`write_atomic`] for callers running on a `tokio` executor: the blocking
/// `NamedLock::lock()` call runs on a `spawn_blocking` thread, the same way
/// `callgraph::oracle_client::CallgraphOracleClient::callgraph` and `artifact::fetcher::fetch_jar`
/// acquire their own per-path locks, so lock contention never stalls an executor worker thread.
pub async fn write_atomic_async(path: PathBuf, bytes: Vec<u8>) -> Result<()> {
	let lock = NamedLock::for_path(&path);
	let _guard = tokio::task::spawn_blocking(move || lock.lock()).await.context("join lock task")??;
	write_atomic_locked(&path, &bytes)
}

/// Reads and deserializes a JSON file, returning `default()` if it does not exist yet - the common
/// shape for per-GA artifacts that start empty and grow across iterations.
pub fn read_json_or_default<T: DeserializeOwned + Default>(path: impl AsRef<Path>) -> Result<T> {
	let path = path.as_ref();
	match std::fs::read(path) {
		Ok(bytes) => serde_json::from_slice(&bytes).with_context(|| format!("parsing {path:?}")),
		Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(T::default()),
		Err(e) => Err(e).with_context(|| format!("reading {path:?}")),
	}
}

pub fn write_json_atomic<T: Serialize>(path: impl AsRef<Path>, value: &T) -> Result<()> {
	let bytes = serde_json::to_vec_pretty(value).context("serializing to JSON")?;
	write_atomic(path, &bytes)
}

/// Async twin of [`write_json_atomic`], see [`write_atomic_async`].
pub async fn write_json_atomic_async<T: Serialize>(path: PathBuf, value: &T) -> Result<()> {
	let bytes = serde_json::to_vec_pretty(value).context("serializing to JSON")?;
	write_atomic_async(path, bytes).await
}

/// Reads the current value, applies `modify`, and atomically writes the result back. Assumes the
/// path's named lock is already held.
fn update_json_locked_body<T, F>(path: &Path, modify: F) -> Result<T>
where
	T: DeserializeOwned + Serialize + Default + Clone,
	F: FnOnce(&mut T),
{
	let mut value: T = match std::fs::read(path) {
		Ok(bytes) => serde_json::from_slice(&bytes).with_context(|| format!("parsing {path:?}"))?,
		Err(e) if e.kind() == std::io::ErrorKind::NotFound => T::default(),
		Err(e) => return Err(e).with_context(|| format!("reading {path:?}")),
	};

	modify(&mut value);

	if let Some(parent) = path.parent() {
		std::fs::create_dir_all(parent).with_context(|| format!("creating {parent:?}"))?;
	}
	let tmp_path = tmp_path_for(path);
	let bytes = serde_json::to_vec_pretty(&value).context("serializing to JSON")?;
	write_and_sync(&tmp_path, &bytes)?;
	std::fs::rename(&tmp_path, path).with_context(|| format!("renaming {tmp_path:?} to {path:?}"))?;

	Ok(value)
}

/// Reads the current value, applies `modify`, and atomically writes the result back - all while
/// holding the path's named lock, so the read-modify-write is a single critical section. The
/// same `INSERT OR REPLACE`-under-one-lock pattern the prefix/reflection KV store uses, made
/// generic over any JSON-backed per-GA artifact.
pub fn update_json_locked<T, F>(path: impl AsRef<Path>, modify: F) -> Result<T>
where
	T: DeserializeOwned + Serialize + Default + Clone,
	F: FnOnce(&mut T),
{
	let path = path.as_ref();
	let lock = NamedLock::for_path(path);
	let _guard = lock.lock()?;
	update_json_locked_body(path, modify)
}

/// Async twin of [`update_json_locked`], see [`write_atomic_async`].
pub async fn update_json_locked_async<T, F>(path: PathBuf, modify: F) -> Result<T>
where
	T: DeserializeOwned + Serialize + Default + Clone + Send + 'static,
	F: FnOnce(&mut T) + Send + 'static,
{
	let lock = NamedLock::for_path(&path);
	let _guard = tokio::task::spawn_blocking(move || lock.lock()).await.context("join lock task")??;
	update_json_locked_body(&path, modify)
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;
	use std::collections::BTreeMap;
	use tempfile::TempDir;
	use super::*;

	#[test]
	fn write_then_read_round_trips() {
		let dir = TempDir::new().unwrap();
		let path = dir.path().join("tfs.json");

		let mut map: BTreeMap<String, Vec<String>> = BTreeMap::new();
		map.insert("1.0".to_owned(), vec!["<com.ex.A: void sink()>".to_owned()]);
		write_json_atomic(&path, &map).unwrap();

		let back: BTreeMap<String, Vec<String>> = read_json_or_default(&path).unwrap();
		assert_eq!(back, map);
	}

	#[test]
	fn missing_file_reads_as_default() {
		let dir = TempDir::new().unwrap();
		let path = dir.path().join("does-not-exist.json");
		let back: BTreeMap<String, Vec<String>> = read_json_or_default(&path).unwrap();
		assert_eq!(back, BTreeMap::new());
	}

	#[test]
	fn update_json_locked_merges_with_existing_content() {
		let dir = TempDir::new().unwrap();
		let path = dir.path().join("tfs.json");

		update_json_locked(&path, |map: &mut BTreeMap<String, Vec<String>>| {
			map.entry("1.0".to_owned()).or_default().push("sink_a".to_owned());
		}).unwrap();

		let result = update_json_locked(&path, |map: &mut BTreeMap<String, Vec<String>>| {
			map.entry("1.0".to_owned()).or_default().push("sink_b".to_owned());
		}).unwrap();

		assert_eq!(result.get("1.0").unwrap(), &vec!["sink_a".to_owned(), "sink_b".to_owned()]);
	}

	#[tokio::test]
	async fn async_write_and_update_round_trip_through_spawn_blocking() {
		let dir = TempDir::new().unwrap();
		let path = dir.path().join("tfs.json");

		let mut map: BTreeMap<String, Vec<String>> = BTreeMap::new();
		map.insert("1.0".to_owned(), vec!["<com.ex.A: void sink()>".to_owned()]);
		write_json_atomic_async(path.clone(), &map).await.unwrap();

		let result = update_json_locked_async(path.clone(), |map: &mut BTreeMap<String, Vec<String>>| {
			map.entry("1.0".to_owned()).or_default().push("sink_b".to_owned());
		}).await.unwrap();

		assert_eq!(result.get("1.0").unwrap(), &vec!["<com.ex.A: void sink()>".to_owned(), "sink_b".to_owned()]);
	}
}
