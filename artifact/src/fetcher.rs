use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};
use anyhow::{Context, Result};
use log::{debug, info, warn};
use vpa_coord::Gav;
use vpa_store::NamedLock;

/// Outcome of a fetch attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
	/// Local path to a `.jar` file (war artifacts are repackaged into one before this is returned).
	Success(PathBuf),
	/// 404 on both `.jar` and `.war`.
	NotFound,
	/// Transient HTTP failure; the caller should retry on a later run, no state was written.
	NetworkError(String),
}

/// `GET {base}/{group-with-slashes}/{artifact}/{version}/{artifact}-{version}.{ext}`.
fn artifact_url(base: &str, gav: &Gav, ext: &str) -> String {
	format!("{base}{slash}{group}/{artifact}/{version}/{artifact}-{version}.{ext}",
		base = base,
		slash = if base.ends_with('/') { "" } else { "/" },
		group = gav.group.replace('.', "/"),
		artifact = gav.artifact,
		version = gav.version,
		ext = ext,
	)
}

/// Idempotent download of the jar for `gav` into `dest_dir/group/artifact/version/artifact-version.jar`.
/// A named lock on that destination path serializes concurrent downloaders within and across
/// processes; a caller finding the file already present returns immediately without touching the
/// network.
pub async fn fetch_jar(client: &reqwest::Client, repo_base: &str, gav: &Gav, dest_dir: &Path) -> Result<FetchOutcome> {
	let dest = dest_dir.join(&gav.group).join(&gav.artifact).join(&gav.version)
		.join(format!("{}-{}.jar", gav.artifact, gav.version));

	let lock = NamedLock::for_path(&dest);
	let _guard = tokio::task::spawn_blocking(move || lock.lock())
		.await
		.context("join lock task")??;

	if dest.is_file() {
		debug!("{gav} already present at {dest:?}");
		return Ok(FetchOutcome::Success(dest));
	}

	if let Some(parent) = dest.parent() {
		std::fs::create_dir_all(parent).with_context(|| format!("creating {parent:?}"))?;
	}

	let jar_url = artifact_url(repo_base, gav, "jar");
	match get_bytes(client, &jar_url).await? {
		GetResult::Ok(bytes) => {
			std::fs::write(&dest, bytes).with_context(|| format!("writing {dest:?}"))?;
			info!("fetched {gav} from {jar_url}");
			return Ok(FetchOutcome::Success(dest));
		}
		GetResult::NotFound => {}
		GetResult::NetworkError(e) => return Ok(FetchOutcome::NetworkError(e)),
	}

	let war_url = artifact_url(repo_base, gav, "war");
	match get_bytes(client, &war_url).await? {
		GetResult::Ok(bytes) => {
			repack_war_as_jar(&bytes, &dest).with_context(|| format!("repackaging war for {gav}"))?;
			info!("fetched {gav} as war from {war_url}, repackaged to {dest:?}");
			Ok(FetchOutcome::Success(dest))
		}
		GetResult::NotFound => {
			warn!("{gav} not found as jar or war");
			Ok(FetchOutcome::NotFound)
		}
		GetResult::NetworkError(e) => Ok(FetchOutcome::NetworkError(e)),
	}
}

enum GetResult {
	Ok(bytes::Bytes),
	NotFound,
	NetworkError(String),
}

async fn get_bytes(client: &reqwest::Client, url: &str) -> Result<GetResult> {
	let response = match client.get(url).send().await {
		Ok(response) => response,
		Err(e) => return Ok(GetResult::NetworkError(e.to_string())),
	};

	if response.status() == reqwest::StatusCode::NOT_FOUND {
		return Ok(GetResult::NotFound);
	}
	if !response.status().is_success() {
		return Ok(GetResult::NetworkError(format!("status {}", response.status())));
	}

	match response.bytes().await {
		Ok(bytes) => Ok(GetResult::Ok(bytes)),
		Err(e) => Ok(GetResult::NetworkError(e.to_string())),
	}
}

/// Extracts `WEB-INF/classes/**` from a war and re-packs it as a plain jar at `dest`. No scratch
/// directories are used - both extraction and repacking happen in memory, so there is nothing to
/// clean up afterwards.
fn repack_war_as_jar(war_bytes: &[u8], dest: &Path) -> Result<()> {
	let mut war = zip::ZipArchive::new(Cursor::new(war_bytes)).context("opening war as zip")?;

	let mut buf = Vec::new();
	let mut writer = zip::ZipWriter::new(Cursor::new(&mut buf));
	let options = zip::write::FileOptions::default();

	for i in 0..war.len() {
		let mut entry = war.by_index(i).context("reading war entry")?;
		let Some(name) = entry.name().strip_prefix("WEB-INF/classes/") else { continue };
		if name.is_empty() {
			continue;
		}

		let mut contents = Vec::new();
		entry.read_to_end(&mut contents).context("reading war entry contents")?;

		writer.start_file(name, options).context("starting jar entry")?;
		std::io::Write::write_all(&mut writer, &contents).context("writing jar entry")?;
	}

	writer.finish().context("finishing repacked jar")?;
	std::fs::write(dest, buf).with_context(|| format!("writing {dest:?}"))
}
