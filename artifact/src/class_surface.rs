use std::io::Cursor;
use std::path::Path;
use anyhow::{Context, Result};
use log::warn;

/// Extracts the sorted set of fully-qualified class names from a jar: every `.class` entry
/// not under `META-INF/`. Tolerant of corrupt zip trailers - if the archive can be opened but
/// individual entries fail to read, those entries are skipped rather than aborting the whole
/// extraction, mirroring `dukebox`'s own `for_each_class` iteration over `ZipArchive::by_index`.
/// A wholly unreadable jar (the archive itself fails to open) returns an empty set.
pub fn class_names(jar_bytes: &[u8]) -> Vec<String> {
	let mut archive = match zip::ZipArchive::new(Cursor::new(jar_bytes)) {
		Ok(archive) => archive,
		Err(e) => {
			warn!("jar is not a readable zip archive: {e}");
			return Vec::new();
		}
	};

	let mut names = Vec::new();
	for i in 0..archive.len() {
		let entry = match archive.by_index(i) {
			Ok(entry) => entry,
			Err(e) => {
				warn!("skipping unreadable zip entry {i}: {e}");
				continue;
			}
		};

		let name = entry.name();
		if name.starts_with("META-INF/") || !name.ends_with(".class") {
			continue;
		}

		let class_name = name.trim_end_matches(".class").replace('/', ".");
		names.push(class_name);
	}

	names.sort();
	names.dedup();
	names
}

pub fn class_names_of_file(path: &Path) -> Result<Vec<String>> {
	let bytes = std::fs::read(path).with_context(|| format!("reading {path:?}"))?;
	Ok(class_names(&bytes))
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;
	use super::*;

	fn make_jar(entries: &[&str]) -> Vec<u8> {
		let mut buf = Vec::new();
		let mut writer = zip::ZipWriter::new(Cursor::new(&mut buf));
		let options = zip::write::FileOptions::default();
		for entry in entries {
			writer.start_file(*entry, options).unwrap();
		}
		writer.finish().unwrap();
		buf
	}

	#[test]
	fn extracts_and_sorts_class_names_excluding_meta_inf() {
		let jar = make_jar(&[
			"com/ex/B.class",
			"com/ex/A.class",
			"META-INF/MANIFEST.MF",
			"META-INF/versions/9/com/ex/A.class",
			"com/ex/resource.txt",
		]);

		assert_eq!(class_names(&jar), vec!["com.ex.A", "com.ex.B"]);
	}

	#[test]
	fn unreadable_jar_returns_empty() {
		assert_eq!(class_names(b"not a zip file"), Vec::<String>::new());
	}
}
