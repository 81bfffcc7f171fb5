//! GA/GAV coordinates for the package ecosystem graph the propagation engine walks.
//!
//! Unlike [`maven_dependency_resolver`'s `MavenCoord`](../vpa_pom/coord/struct.MavenCoord.html),
//! which also tracks classifier and packaging type for artifact resolution, [`Ga`] and [`Gav`] are
//! the plain group:artifact(:version) identity the rest of this workspace reasons about: worklist
//! entries, dependency-graph node names, and JSON map keys.

use std::fmt::{Display, Formatter};
use std::str::FromStr;
use anyhow::{anyhow, bail, Context, Error};
use serde::{Deserialize, Serialize};

/// A `group:artifact` pair. Canonical string form is `g:a`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Ga {
	pub group: String,
	pub artifact: String,
}

impl Ga {
	pub fn new(group: impl Into<String>, artifact: impl Into<String>) -> Ga {
		Ga { group: group.into(), artifact: artifact.into() }
	}

	pub fn with_version(&self, version: impl Into<String>) -> Result<Gav, Error> {
		Gav::new(self.group.clone(), self.artifact.clone(), version)
	}
}

impl Display for Ga {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}:{}", self.group, self.artifact)
	}
}

impl FromStr for Ga {
	type Err = Error;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let (group, artifact) = s.split_once(':')
			.with_context(|| anyhow!("expected \"group:artifact\", got {s:?}"))?;
		if artifact.contains(':') {
			bail!("expected exactly one \":\" in a GA, got {s:?}");
		}
		Ok(Ga::new(group, artifact))
	}
}

/// Rejects version ranges: a version string containing `,` or `[` denotes a Maven version range,
/// not a point version, and the engine does not attempt range solving.
pub fn is_valid_version(version: &str) -> bool {
	!version.contains(',') && !version.contains('[')
}

/// A `group:artifact:version` triple. Canonical string form is `g:a:v`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Gav {
	pub group: String,
	pub artifact: String,
	pub version: String,
}

impl Gav {
	pub fn new(group: impl Into<String>, artifact: impl Into<String>, version: impl Into<String>) -> Result<Gav, Error> {
		let version = version.into();
		if !is_valid_version(&version) {
			bail!("version {version:?} looks like a version range (contains ',' or '['), which is not a point version");
		}
		Ok(Gav { group: group.into(), artifact: artifact.into(), version })
	}

	pub fn ga(&self) -> Ga {
		Ga { group: self.group.clone(), artifact: self.artifact.clone() }
	}
}

impl Display for Gav {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}:{}:{}", self.group, self.artifact, self.version)
	}
}

impl FromStr for Gav {
	type Err = Error;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let mut iter = s.split(':');
		let group = iter.next().with_context(|| anyhow!("no group specified: {s:?}"))?;
		let artifact = iter.next().with_context(|| anyhow!("no artifact specified: {s:?}"))?;
		let version = iter.next().with_context(|| anyhow!("no version specified: {s:?}"))?;
		if iter.next().is_some() {
			bail!("expected exactly two \":\" in a GAV, got {s:?}");
		}
		Gav::new(group, artifact, version)
	}
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;
	use super::*;

	#[test]
	fn ga_round_trips() {
		let ga = Ga::from_str("org.example:foo").unwrap();
		assert_eq!(ga, Ga::new("org.example", "foo"));
		assert_eq!(ga.to_string(), "org.example:foo");
	}

	#[test]
	fn ga_rejects_wrong_colon_count() {
		assert!(Ga::from_str("org.example").is_err());
		assert!(Ga::from_str("org.example:foo:1.0").is_err());
	}

	#[test]
	fn gav_round_trips() {
		let gav = Gav::from_str("org.example:foo:1.0").unwrap();
		assert_eq!(gav, Gav::new("org.example", "foo", "1.0").unwrap());
		assert_eq!(gav.to_string(), "org.example:foo:1.0");
		assert_eq!(gav.ga(), Ga::new("org.example", "foo"));
	}

	#[test]
	fn gav_rejects_version_ranges() {
		assert!(Gav::new("org.example", "foo", "[1.0,2.0)").is_err());
		assert!(Gav::from_str("org.example:foo:[1.0,2.0)").is_err());
		assert!(Gav::new("org.example", "foo", "1.0,1.1").is_err());
	}

	#[test]
	fn gav_rejects_malformed_strings() {
		assert!(Gav::from_str("org.example:foo").is_err());
		assert!(Gav::from_str("org.example:foo:1.0:extra").is_err());
	}
}
