use anyhow::{Context, Result};
use tempfile::NamedTempFile;

/// Materializes a package-prefix list into a file the external bytecode analyzer's
/// `--package-prefix` flag can point at (one prefix per line). Kept alive as long as the
/// returned [`NamedTempFile`] is; callers pass `.path()` to the analyzer invocation.
pub fn write_prefix_file(prefixes: &[String]) -> Result<NamedTempFile> {
	let file = NamedTempFile::new().context("creating package-prefix temp file")?;
	let content = prefixes.join("\n");
	std::fs::write(file.path(), content).context("writing package-prefix temp file")?;
	Ok(file)
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;
	use super::*;

	#[test]
	fn writes_one_prefix_per_line() {
		let file = write_prefix_file(&["com.ex.dep".to_owned(), "com.ex.dep.internal".to_owned()]).unwrap();
		let content = std::fs::read_to_string(file.path()).unwrap();
		assert_eq!(content, "com.ex.dep\ncom.ex.dep.internal");
	}
}
