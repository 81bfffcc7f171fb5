use std::io::{Cursor, Read, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use anyhow::Result;
use log::warn;
use vpa_store::ReflectionFlag;
use crate::jdeps_client::ClassRefTool;
use crate::tool_client::{scaled_timeout, ToolOutcome};

/// Decides whether a downstream artifact's bytecode actually references classes owned by an
/// upstream one, so the propagation engine can skip downstream artifacts that merely depend on
/// the upstream GA in the dependency graph without ever calling into the affected packages.
///
/// When `reflection_unaware_generator` is set and the downstream's reflection probe came back
/// `Yes`, the filter short-circuits to "keep" without running the class-reference tool at all: a
/// reflection-unaware callgraph can't be trusted to have captured every call path, so direction
/// can't safely be ruled out.
pub async fn references_upstream(
	class_ref_tool: &ClassRefTool,
	reflection_flag: ReflectionFlag,
	reflection_unaware_generator: bool,
	downstream_jar: &Path,
	downstream_prefixes: &[String],
	upstream_prefixes: &[String],
) -> Result<bool> {
	if reflection_unaware_generator && reflection_flag == ReflectionFlag::Yes {
		return Ok(true);
	}

	let jar_for_scan = strip_module_info(downstream_jar)?;
	let jar_size = std::fs::metadata(&jar_for_scan)?.len();
	let timeout = scaled_timeout(jar_size);

	match class_ref_tool.class_references(&jar_for_scan, timeout).await {
		ToolOutcome::Success(edges) => Ok(edges.iter().any(|(downstream_class, upstream_class)| {
			downstream_prefixes.iter().any(|p| downstream_class.starts_with(p.as_str()))
				&& upstream_prefixes.iter().any(|p| upstream_class.starts_with(p.as_str()))
		})),
		ToolOutcome::ToolCrash | ToolOutcome::Timeout => {
			warn!("class-reference scan failed for {downstream_jar:?}, keeping the edge conservatively");
			Ok(true)
		}
	}
}

/// Removes `module-info.class` from a copy of the jar before handing it to the class-reference
/// tool - some versions choke on Java 9+ module descriptors. If the archive is corrupt, retries
/// once by re-packing only the entries that could be read; if that also fails, gives up and
/// returns the original path so the caller's tool invocation fails naturally (and is then treated
/// as a tool-crash, i.e. the conservative "keep" path).
fn strip_module_info(jar_path: &Path) -> Result<PathBuf> {
	let bytes = std::fs::read(jar_path)?;

	match rewrite_without_module_info(&bytes) {
		Ok(stripped) => write_sibling(jar_path, &stripped),
		Err(e) => {
			warn!("jar {jar_path:?} looked corrupt while stripping module-info.class ({e:#}), repacking and retrying once");
			match repack_readable_entries(&bytes) {
				Ok(repacked) => match rewrite_without_module_info(&repacked) {
					Ok(stripped) => write_sibling(jar_path, &stripped),
					Err(_) => Ok(jar_path.to_owned()),
				},
				Err(_) => Ok(jar_path.to_owned()),
			}
		}
	}
}

fn write_sibling(original: &Path, bytes: &[u8]) -> Result<PathBuf> {
	let sibling = original.with_extension("stripped.jar");
	std::fs::write(&sibling, bytes)?;
	Ok(sibling)
}

fn rewrite_without_module_info(bytes: &[u8]) -> Result<Vec<u8>> {
	let mut archive = zip::ZipArchive::new(Cursor::new(bytes))?;

	let mut buf = Vec::new();
	let mut writer = zip::ZipWriter::new(Cursor::new(&mut buf));
	let options = zip::write::FileOptions::default();

	for i in 0..archive.len() {
		let mut entry = archive.by_index(i)?;
		if entry.name() == "module-info.class" {
			continue;
		}
		let name = entry.name().to_owned();
		let mut contents = Vec::new();
		entry.read_to_end(&mut contents)?;
		writer.start_file(name, options)?;
		writer.write_all(&contents)?;
	}

	writer.finish()?;
	Ok(buf)
}

/// Re-packs only the zip entries that can be individually read, dropping whatever triggered the
/// corruption. Used once as a repack-and-retry step before giving up on a jar entirely.
fn repack_readable_entries(bytes: &[u8]) -> Result<Vec<u8>> {
	let mut archive = zip::ZipArchive::new(Cursor::new(bytes))?;

	let mut buf = Vec::new();
	let mut writer = zip::ZipWriter::new(Cursor::new(&mut buf));
	let options = zip::write::FileOptions::default();

	for i in 0..archive.len() {
		let Ok(mut entry) = archive.by_index(i) else { continue };
		let name = entry.name().to_owned();
		let mut contents = Vec::new();
		if entry.read_to_end(&mut contents).is_err() {
			continue;
		}
		writer.start_file(name, options)?;
		writer.write_all(&contents)?;
	}

	writer.finish()?;
	Ok(buf)
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;
	use super::*;

	fn make_jar(entries: &[(&str, &[u8])]) -> Vec<u8> {
		let mut buf = Vec::new();
		let mut writer = zip::ZipWriter::new(Cursor::new(&mut buf));
		let options = zip::write::FileOptions::default();
		for (name, contents) in entries {
			writer.start_file(*name, options).unwrap();
			writer.write_all(contents).unwrap();
		}
		writer.finish().unwrap();
		buf
	}

	#[test]
	fn strips_module_info_but_keeps_other_entries() {
		let jar = make_jar(&[
			("module-info.class", b"module descriptor"),
			("com/ex/A.class", b"classfile"),
		]);
		let stripped = rewrite_without_module_info(&jar).unwrap();

		let mut archive = zip::ZipArchive::new(Cursor::new(stripped)).unwrap();
		assert_eq!(archive.len(), 1);
		assert_eq!(archive.by_index(0).unwrap().name(), "com/ex/A.class");
	}
}
