use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use log::warn;
use tokio::process::Command;
use vpa_sig::Signature;

/// Which external callgraph generator is configured: a points-to-based one, or a
/// reflection-aware one. The choice also decides whether the reflection short-circuit below
/// is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CgEngine {
	PointsTo,
	ReflectionAware,
}

impl CgEngine {
	pub fn cli_name(self) -> &'static str {
		match self {
			CgEngine::PointsTo => "points-to",
			CgEngine::ReflectionAware => "reflection-aware",
		}
	}

	/// The reflection short-circuit in the direction filter only fires when the active
	/// callgraph generator is the reflection-unaware one.
	pub fn is_reflection_unaware(self) -> bool {
		matches!(self, CgEngine::PointsTo)
	}
}

/// Result of invoking an external tool. Mirrors the outcome shape used across this codebase for
/// fallible external calls, narrowed to the subset that applies to child-process tools: there's
/// no "not-found" or "network-error" for a local binary invocation.
#[derive(Debug)]
pub enum ToolOutcome<T> {
	Success(T),
	ToolCrash,
	Timeout,
}

/// `jdeps`-style timeout scaling: `1.6 * jar_size_MB + 10` seconds.
pub fn scaled_timeout(jar_size_bytes: u64) -> Duration {
	let mb = jar_size_bytes as f64 / (1024.0 * 1024.0);
	Duration::from_secs_f64(1.6 * mb + 10.0)
}

/// Thin wrapper over the external bytecode analyzer child process: `--task gen-cg`,
/// `--task check-call`, `--task check-reflect`.
#[derive(Clone)]
pub struct BytecodeAnalyzer {
	binary: PathBuf,
}

impl BytecodeAnalyzer {
	pub fn new(binary: impl Into<PathBuf>) -> BytecodeAnalyzer {
		BytecodeAnalyzer { binary: binary.into() }
	}

	async fn run(&self, args: &[String], timeout: Duration) -> ToolOutcome<String> {
		let mut cmd = Command::new(&self.binary);
		cmd.args(args).stdout(Stdio::piped()).stderr(Stdio::piped());

		match tokio::time::timeout(timeout, cmd.output()).await {
			Err(_) => ToolOutcome::Timeout,
			Ok(Err(e)) => {
				warn!("failed to spawn bytecode analyzer {:?}: {e}", self.binary);
				ToolOutcome::ToolCrash
			}
			Ok(Ok(output)) => {
				if output.status.success() {
					ToolOutcome::Success(String::from_utf8_lossy(&output.stdout).into_owned())
				} else {
					warn!("bytecode analyzer exited with {}", output.status);
					ToolOutcome::ToolCrash
				}
			}
		}
	}

	pub async fn check_reflect(&self, jar: &Path, method_list: &Path, package_prefix: Option<&Path>, timeout: Duration) -> ToolOutcome<bool> {
		let mut args = vec![
			"--task".to_owned(), "check-reflect".to_owned(),
			"--jar-path".to_owned(), jar.display().to_string(),
			"--method-list".to_owned(), method_list.display().to_string(),
		];
		if let Some(p) = package_prefix {
			args.push("--package-prefix".to_owned());
			args.push(p.display().to_string());
		}

		match self.run(&args, timeout).await {
			ToolOutcome::Success(stdout) => match serde_json::from_str::<serde_json::Value>(&stdout) {
				Ok(v) => ToolOutcome::Success(v.get("foundReflection").and_then(|b| b.as_bool()).unwrap_or(false)),
				Err(e) => {
					warn!("could not parse check-reflect output {stdout:?}: {e}");
					ToolOutcome::ToolCrash
				}
			},
			ToolOutcome::ToolCrash => ToolOutcome::ToolCrash,
			ToolOutcome::Timeout => ToolOutcome::Timeout,
		}
	}

	pub async fn check_call(&self, jar: &Path, methods: &[Signature], package_prefix: Option<&Path>, timeout: Duration) -> ToolOutcome<bool> {
		let joined = methods.iter().map(Signature::to_string).collect::<Vec<_>>().join(",");
		let mut args = vec![
			"--task".to_owned(), "check-call".to_owned(),
			"--jar-path".to_owned(), jar.display().to_string(),
			"-m".to_owned(), joined,
		];
		if let Some(p) = package_prefix {
			args.push("--package-prefix".to_owned());
			args.push(p.display().to_string());
		}

		match self.run(&args, timeout).await {
			ToolOutcome::Success(stdout) => ToolOutcome::Success(stdout.trim() == "YES"),
			ToolOutcome::ToolCrash => ToolOutcome::ToolCrash,
			ToolOutcome::Timeout => ToolOutcome::Timeout,
		}
	}

	/// Runs `--task gen-cg`; on success, `out` now contains the callgraph JSON. A timed-out or
	/// non-zero exit leaves no output file - the caller checks `out`'s existence, this wrapper
	/// only reports whether the process itself succeeded.
	///
	/// `only_app` forwards a CVE annotation's `only-app-code` hint as `--only-app`, restricting
	/// the generator to application code rather than the whole classpath.
	pub async fn gen_cg(&self, jar: &Path, engine: CgEngine, out: &Path, only_app: bool, package_prefix: Option<&Path>, timeout: Duration) -> ToolOutcome<()> {
		let mut args = vec![
			"--task".to_owned(), "gen-cg".to_owned(),
			"--cg-type".to_owned(), engine.cli_name().to_owned(),
			"--jar-path".to_owned(), jar.display().to_string(),
			"--out".to_owned(), out.display().to_string(),
		];
		if only_app {
			args.push("--only-app".to_owned());
		}
		if let Some(p) = package_prefix {
			args.push("--package-prefix".to_owned());
			args.push(p.display().to_string());
		}

		match self.run(&args, timeout).await {
			ToolOutcome::Success(_) => ToolOutcome::Success(()),
			ToolOutcome::ToolCrash => ToolOutcome::ToolCrash,
			ToolOutcome::Timeout => ToolOutcome::Timeout,
		}
	}
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;
	use super::*;

	#[test]
	fn timeout_scales_with_jar_size() {
		// 10 MB jar -> 1.6*10 + 10 = 26s
		let t = scaled_timeout(10 * 1024 * 1024);
		assert!((t.as_secs_f64() - 26.0).abs() < 0.01);
	}

	#[test]
	fn engine_reflection_awareness() {
		assert!(CgEngine::PointsTo.is_reflection_unaware());
		assert!(!CgEngine::ReflectionAware.is_reflection_unaware());
	}
}
