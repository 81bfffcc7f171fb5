use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use log::warn;
use tokio::process::Command;
use crate::tool_client::ToolOutcome;

/// Wraps a `jdeps`-like class-reference utility: given a jar, it lists every `source-class ->
/// target-class` edge it finds by scanning the constant pool of each class file. Used by the
/// dependency-direction filter to decide whether a downstream artifact actually references
/// classes owned by an upstream one.
#[derive(Clone)]
pub struct ClassRefTool {
	binary: PathBuf,
}

impl ClassRefTool {
	pub fn new(binary: impl Into<PathBuf>) -> ClassRefTool {
		ClassRefTool { binary: binary.into() }
	}

	pub async fn class_references(&self, jar: &Path, timeout: Duration) -> ToolOutcome<Vec<(String, String)>> {
		let mut cmd = Command::new(&self.binary);
		cmd.args(["--multi-release", "base", "-verbose:class"]).arg(jar).stdout(Stdio::piped()).stderr(Stdio::piped());

		let output = match tokio::time::timeout(timeout, cmd.output()).await {
			Err(_) => return ToolOutcome::Timeout,
			Ok(Err(e)) => {
				warn!("failed to spawn class-reference tool {:?}: {e}", self.binary);
				return ToolOutcome::ToolCrash;
			}
			Ok(Ok(output)) => output,
		};

		if !output.status.success() {
			warn!("class-reference tool exited with {}", output.status);
			return ToolOutcome::ToolCrash;
		}

		let stdout = String::from_utf8_lossy(&output.stdout);
		ToolOutcome::Success(parse_edges(&stdout))
	}
}

/// Parses lines of the form `   com.ex.A -> com.ex.B               dep.jar`, keeping only the
/// source and target class names and ignoring whatever trails the arrow.
fn parse_edges(stdout: &str) -> Vec<(String, String)> {
	stdout.lines()
		.filter_map(|line| {
			let (source, rest) = line.split_once("->")?;
			let target = rest.split_whitespace().next()?;
			Some((source.trim().to_owned(), target.to_owned()))
		})
		.collect()
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;
	use super::*;

	#[test]
	fn parses_arrow_separated_lines() {
		let stdout = "   com.ex.A -> com.ex.B               dep.jar\n\
			   com.ex.A -> java.lang.Object          java.base\n\
			not an edge line\n";
		let edges = parse_edges(stdout);
		assert_eq!(edges, vec![
			("com.ex.A".to_owned(), "com.ex.B".to_owned()),
			("com.ex.A".to_owned(), "java.lang.Object".to_owned()),
		]);
	}

	#[test]
	fn ignores_lines_without_an_arrow() {
		assert_eq!(parse_edges("com.ex.A depends on nothing listed here\n"), Vec::<(String, String)>::new());
	}
}
