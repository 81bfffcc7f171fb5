pub mod coord;
pub mod http_downloader;
pub mod maven_pom;
mod maven_pom_done;
pub mod metadata;
pub mod resolver;
pub mod tree;

use std::borrow::Cow;
use std::collections::HashSet;
use std::fmt::{Debug, Display, Formatter};
use std::future::Future;
use std::str::FromStr;
use anyhow::{anyhow, bail, Context, Error, Result};
use log::{trace, warn};
use serde::{Deserialize, Serialize};
use crate::coord::MavenCoord;
use crate::maven_pom::MavenPom;
use crate::maven_pom_done::{get_merged_pom};
use crate::resolver::Resolver;
use crate::tree::{Forest, Tree};

/// A scope for a dependency.
///
/// Note: this type supports round trips with [Display] and [FromStr].
#[derive(Copy, Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub enum DependencyScope {
	#[default]
	#[serde(rename = "compile")]
	Compile,
	#[serde(rename = "runtime")]
	Runtime,
	#[serde(rename = "test")]
	Test,
	#[serde(rename = "system")]
	System,
	#[serde(rename = "provided")]
	Provided,
}

impl Display for DependencyScope {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		Display::fmt(match self {
			DependencyScope::Compile => "compile",
			DependencyScope::Runtime => "runtime",
			DependencyScope::Test => "test",
			DependencyScope::System => "system",
			DependencyScope::Provided => "provided",
		}, f)
	}
}

impl FromStr for DependencyScope {
	type Err = Error;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Ok(match s {
			"compile" => DependencyScope::Compile,
			"runtime" => DependencyScope::Runtime,
			"test" => DependencyScope::Test,
			"system" => DependencyScope::System,
			"provided" => DependencyScope::Provided,
			scope => bail!("unknown scope {scope:?}, scope is one of \"compile\", \"runtime\", \"test\", \"system\" and \"provided\""),
		})
	}
}

pub trait Downloader {
	// note: can't rewrite with async, bc of `+ Send`
	#[allow(clippy::manual_async_fn)]
	fn get_maven_pom(&self, url: &str) -> impl Future<Output = Result<Option<MavenPom>>> + Send;
}

impl MavenPom {
	fn get_parent_coord(&self) -> Option<MavenCoord> {
		self.parent.as_ref().map(|parent| MavenCoord {
			group: parent.group_id.clone(),
			artifact: parent.artifact_id.clone(),
			version: parent.version.clone(),
			classifier: None,
			type_: "pom".to_owned()
		})
	}
}

// TODO: doc
pub async fn get_maven_dependencies<'a>(downloader: &(impl Downloader + Sync), resolvers: &'a [Resolver<'_>],
		dependencies_list: &[(MavenCoord, DependencyScope)]) -> Result<Vec<FoundDependency<'a>>> {

	let mut dependencies_forest = Vec::with_capacity(dependencies_list.len());

	for (coord, sc) in dependencies_list {
		let c = get_dependencies_tree(downloader, resolvers, coord, *sc).await?;

		dependencies_forest.push(c);
	}

	let cleaned_dependencies_forest = clean_up_dependencies(dependencies_forest);

	Ok(Forest::into_breadth_first(cleaned_dependencies_forest).collect())
}

/// Note that gradle, other than maven, does select the highest of the dependencies found, and not the "nearest" one.
// TODO? implement a gradle like filtering as well?
fn clean_up_dependencies(mut forest: Vec<Tree<FoundDependency<'_>>>) -> Vec<Tree<FoundDependency<'_>>> {

	let mut set = forest.iter()
		.flat_map(Tree::breadth_first)
		.map(|dep| dep.coord.dependency_collision_id())
		.collect::<HashSet<_>>();

	// note that this keeps the first dependency found, and removes all later ones with the same collision id
	Forest::breadth_first_retain(&mut forest, |dep| {
		// retain if it was contained
		set.remove(&dep.coord.dependency_collision_id())
	});

	forest
}

/// A resolved dependency.
///
/// [FoundDependency] implements [TryFrom<&str>]. Format is `group:artifact[:type[:classifier]]:version:scope @ url`.
/// This format is adopted from [MavenCoord]. Note that [TryFrom<&str>] is used instead of [FromStr] because the latter
/// doesn't allow us to specify the lifetime.
///
/// The [Display] implementation allows round trips with [TryFrom<&str>]. Note: round trips remove the repositories name.
// TODO: tests for both TryFrom<&str>, and Display...
#[derive(Debug, PartialEq)]
pub struct FoundDependency<'a> {
	pub resolver: Resolver<'a>,
	pub coord: MavenCoord,
	pub scope: DependencyScope,
}

impl FoundDependency<'_> {
	pub fn make_url(&self) -> String {
		self.coord.make_url(&self.resolver)
	}
}

impl Display for FoundDependency<'_> {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		write!(f, "{coord}:{scope} @ {url}",
			coord = self.coord,
			scope = self.scope,
			url = self.resolver.maven,
		)
	}
}

impl<'a> TryFrom<&'a str> for FoundDependency<'a> {
	type Error = Error;

	fn try_from(value: &'a str) -> std::result::Result<Self, Self::Error> {
		let (left, url) = value.split_once(" @ ")
			.with_context(|| anyhow!("expected \" @ \" to separate the url from the main part: {value:?}"))?;
		let (coord, scope) = left.rsplit_once(':')
			.with_context(|| anyhow!("expected \":\" to separate the scope from the coordinate: {value:?}"))?;

		Ok(FoundDependency {
			resolver: Resolver::new(url, url),
			coord: MavenCoord::from_str(coord).with_context(|| anyhow!("failed to parse coordinate part: {value:?}"))?,
			scope: DependencyScope::from_str(scope).with_context(|| anyhow!("failed to parse scope part: {value:?}"))?,
		})
	}
}

/// Returns the direct (non-transitive) dependencies declared by a GAV's effective POM.
///
/// This is what the Package-Prefix Oracle and the propagation engine's version-mapping step need:
/// the immediate `<dependencies>` of `coord` after parent inheritance and `dependencyManagement`
/// resolution, without walking further down the tree. Optional dependencies are excluded, matching
/// how Maven itself treats them as not participating in further resolution.
pub async fn get_direct_dependencies<'a>(downloader: &(impl Downloader + Sync), resolvers: &'a [Resolver<'a>], coord: &MavenCoord)
		-> Result<Vec<(MavenCoord, DependencyScope)>> {
	let (_, pom) = get_merged_pom(downloader, resolvers, coord).await?;

	Ok(pom.dependencies.into_iter()
		.filter(|dependency| !dependency.optional.unwrap_or(false))
		.map(|dependency| (dependency.coord, dependency.scope.unwrap_or(DependencyScope::Compile)))
		.collect())
}

// TODO: recursion limiter!
#[async_recursion::async_recursion]
async fn get_dependencies_tree<'a>(downloader: &(impl Downloader + Sync), resolvers: &'a [Resolver], coord: &MavenCoord, scope: DependencyScope)
		-> Result<Tree<FoundDependency<'a>>> {

	let (resolver, pom) = get_merged_pom(downloader, resolvers, coord).await?;

	let mut tree = Tree::new(FoundDependency {
		resolver: resolver.clone(),
		coord: coord.clone(),
		scope,
	});

	for dependency in pom.dependencies {
		let is_optional = dependency.optional.unwrap_or(false);
		let dependency_scope = dependency.scope.unwrap_or(DependencyScope::Compile);

		if !is_optional {
			/// None means the `-` from the [table](https://maven.apache.org/guides/introduction/introduction-to-dependency-mechanism.html#dependency-scope)
			fn the_scope_table(left_column: DependencyScope, top_row: DependencyScope) -> Option<DependencyScope> {
				match (top_row, left_column) {
					(DependencyScope::Runtime, DependencyScope::Compile) => Some(DependencyScope::Runtime),
					(DependencyScope::Compile | DependencyScope::Runtime, left_column) => Some(left_column),
					(DependencyScope::Provided | DependencyScope::Test | DependencyScope::System, _) => None, // a comment says "system" is similar to "provided"
				}
			}

			// this skips all the ones with None
			if let Some(scope_after_table) = the_scope_table(scope, dependency_scope) {
				let c = get_dependencies_tree(downloader, resolvers, &dependency.coord, scope_after_table).await?; // TODO: err msg
				tree.children.push(c);
			}
		}
	}

	Ok(tree)
}

// TODO: write test with examples from
//  https://maven.apache.org/guides/introduction/introduction-to-the-pom.html
//  https://maven.apache.org/guides/introduction/introduction-to-dependency-mechanism.html
//  failure case: wrong model_version, parent without pom as packaging, cyclic dependencies



#[cfg(test)]
mod testing2 {
	use pretty_assertions::assert_eq;
	use crate::coord::MavenCoord;
	use crate::{clean_up_dependencies, FoundDependency, DependencyScope};
	use crate::resolver::Resolver;
	use crate::tree::helper::{l, t};

	fn dep(artifact: &str, version: &str) -> FoundDependency<'static> {
		FoundDependency {
			resolver: Resolver::new("foo", "bar"),
			coord: MavenCoord::from_group_artifact_version("org.example", artifact, version),
			scope: DependencyScope::Compile,
		}
	}

	// example from https://maven.apache.org/guides/introduction/introduction-to-dependency-mechanism.html#transitive-dependencies
	#[test]
	fn mediation_example() {
		// A is the root node, we don't have this here
		let input = vec![
			t(dep("B", "1"), [
				t(dep("C", "1"), [
					l(dep("D", "2.0")),
				]),
			]),
			t(dep("E", "1"), [
				l(dep("D", "1.0")),
			]),
		];

		let expected = vec![
			t(dep("B", "1"), [
				l(dep("C", "1")),
			]),
			t(dep("E", "1"), [
				l(dep("D", "1.0")),
			]),
		];

		assert_eq!(clean_up_dependencies(input), expected);
	}

	// example from https://maven.apache.org/guides/introduction/introduction-to-dependency-mechanism.html#transitive-dependencies
	#[test]
	fn mediation_example_override() {
		// A is the root node, we don't have this here
		let input = vec![
			t(dep("B", "1"), [
				t(dep("C", "1"), [
					l(dep("D", "2.0")),
				]),
			]),
			t(dep("E", "1"), [
				l(dep("D", "1.0")),
			]),
			l(dep("D", "2.0")),
		];

		let expected = vec![
			t(dep("B", "1"), [
				l(dep("C", "1")),
			]),
			l(dep("E", "1")),
			l(dep("D", "2.0")),
		];

		assert_eq!(clean_up_dependencies(input), expected);
	}

	#[test]
	fn mediation_first_on_same_depth_wins() {
		// A is the root node, we don't have this here
		let input = vec![
			t(dep("B", "1"), [
				l(dep("C", "1.0")),
			]),
			t(dep("D", "1"), [
				l(dep("C", "2.0")),
			]),
		];

		let expected = vec![
			t(dep("B", "1"), [
				l(dep("C", "1.0")),
			]),
			l(dep("D", "1")),
		];

		assert_eq!(clean_up_dependencies(input), expected);
	}
}
