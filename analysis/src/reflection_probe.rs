use std::path::Path;
use std::time::Duration;
use anyhow::Result;
use log::warn;
use vpa_coord::Gav;
use vpa_store::{PrefixStore, ReflectionFlag};
use crate::tool_client::{BytecodeAnalyzer, ToolOutcome};

/// Determines whether `gav`'s jar makes any reflective call, memoized per GAV in the same
/// persisted table the package-prefix oracle uses. A tool crash or timeout is recorded (and
/// returned) as [`ReflectionFlag::Unknown`] rather than retried within the same run - the caller
/// decides how to treat "unknown" (the direction filter's short-circuit only fires on a
/// confirmed `Yes`).
pub async fn probe_reflection(
	analyzer: &BytecodeAnalyzer,
	store: &PrefixStore,
	gav: &Gav,
	jar_path: &Path,
	method_list: &Path,
	package_prefix_file: Option<&Path>,
	timeout: Duration,
) -> Result<ReflectionFlag> {
	let cached = store.get_reflection(gav)?;
	if cached != ReflectionFlag::Unknown {
		return Ok(cached);
	}

	let flag = match analyzer.check_reflect(jar_path, method_list, package_prefix_file, timeout).await {
		ToolOutcome::Success(found) => if found { ReflectionFlag::Yes } else { ReflectionFlag::No },
		ToolOutcome::ToolCrash => {
			warn!("reflection probe crashed for {gav}, recording as unknown");
			ReflectionFlag::Unknown
		}
		ToolOutcome::Timeout => {
			warn!("reflection probe timed out for {gav}, recording as unknown");
			ReflectionFlag::Unknown
		}
	};

	store.put_reflection(gav, flag)?;
	Ok(flag)
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;
	use tempfile::TempDir;
	use super::*;

	#[test]
	fn unknown_flag_is_not_cached_as_a_final_answer() {
		let dir = TempDir::new().unwrap();
		let store = PrefixStore::new(dir.path().join("prefix_store.json"));
		let gav = Gav::new("com.ex", "dep", "1.0").unwrap();

		assert_eq!(store.get_reflection(&gav).unwrap(), ReflectionFlag::Unknown);
		store.put_reflection(&gav, ReflectionFlag::Yes).unwrap();
		assert_eq!(store.get_reflection(&gav).unwrap(), ReflectionFlag::Yes);
	}
}
