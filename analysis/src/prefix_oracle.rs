use std::collections::BTreeSet;
use std::path::PathBuf;
use anyhow::Result;
use log::warn;
use vpa_artifact::{class_surface, fetch_jar, FetchOutcome};
use vpa_coord::Gav;
use vpa_pom::coord::MavenCoord;
use vpa_pom::http_downloader::HttpDownloader;
use vpa_pom::resolver::Resolver;
use vpa_store::PrefixStore;

/// Where the oracle fetches artifacts from and caches them to, plus the persisted table it
/// memoizes results in.
#[derive(Clone)]
pub struct PrefixOracle {
	repo_base: String,
	dest_dir: PathBuf,
	store: PrefixStore,
}

impl PrefixOracle {
	pub fn new(repo_base: impl Into<String>, dest_dir: impl Into<PathBuf>, store: PrefixStore) -> PrefixOracle {
		PrefixOracle { repo_base: repo_base.into(), dest_dir: dest_dir.into(), store }
	}

	/// Returns the set of package prefixes "owned" by `gav`: its own classes, minus the classes
	/// contributed by its direct Maven dependencies. Memoized in the prefix store - repeated calls
	/// for the same GAV after the first one are a single locked file read.
	///
	/// If the POM cannot be resolved, falls back conservatively to every package the artifact's own
	/// jar defines, since we then have no way to subtract out dependency classes.
	pub async fn owned_prefixes(&self, client: &reqwest::Client, gav: &Gav) -> Result<Vec<String>> {
		if let Some(prefixes) = self.store.get_prefixes(gav)? {
			return Ok(prefixes);
		}

		let own_classes = match fetch_jar(client, &self.repo_base, gav, &self.dest_dir).await? {
			FetchOutcome::Success(jar_path) => class_surface::class_names_of_file(&jar_path)?,
			FetchOutcome::NotFound | FetchOutcome::NetworkError(_) => {
				warn!("could not fetch artifact for {gav}, treating it as having no owned prefixes");
				Vec::new()
			}
		};

		let downloader = HttpDownloader::new(client.clone());
		let resolver = Resolver::new("primary", &self.repo_base);
		let resolvers = [resolver];
		let maven_coord = MavenCoord::from_group_artifact_version(&gav.group, &gav.artifact, &gav.version);

		let remaining_classes = match vpa_pom::get_direct_dependencies(&downloader, &resolvers, &maven_coord).await {
			Ok(direct_deps) => self.subtract_dependency_classes(client, own_classes, direct_deps).await?,
			Err(e) => {
				warn!("could not resolve pom for {gav}, keeping all own classes as owned: {e:#}");
				own_classes
			}
		};

		self.store.put_prefixes(gav, remaining_classes.clone())?;
		Ok(remaining_classes)
	}

	async fn subtract_dependency_classes(
		&self,
		client: &reqwest::Client,
		own_classes: Vec<String>,
		direct_deps: Vec<(MavenCoord, vpa_pom::DependencyScope)>,
	) -> Result<Vec<String>> {
		let mut remaining: BTreeSet<String> = own_classes.into_iter().collect();

		for (dep_coord, _scope) in direct_deps {
			if !vpa_coord::is_valid_version(&dep_coord.version) {
				continue;
			}
			let Ok(dep_gav) = Gav::new(dep_coord.group.clone(), dep_coord.artifact.clone(), dep_coord.version.clone()) else { continue };

			match fetch_jar(client, &self.repo_base, &dep_gav, &self.dest_dir).await? {
				FetchOutcome::Success(dep_jar) => {
					for class in class_surface::class_names_of_file(&dep_jar)? {
						remaining.remove(&class);
					}
				}
				FetchOutcome::NotFound | FetchOutcome::NetworkError(_) => {
					warn!("could not fetch dependency {dep_gav}, its classes remain counted as owned");
				}
			}
		}

		Ok(remaining.into_iter().collect())
	}
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;
	use super::*;

	#[tokio::test]
	async fn subtract_dependency_classes_removes_only_the_dependencys_own_classes() {
		let store = PrefixStore::new(tempfile::NamedTempFile::new().unwrap().path().to_owned());
		let oracle = PrefixOracle::new("https://repo.example.org", tempfile::TempDir::new().unwrap().path().to_owned(), store);

		let own = vec!["com.ex.dep.A".to_owned(), "com.ex.dep.B".to_owned()];
		let remaining = oracle.subtract_dependency_classes(&reqwest::Client::new(), own.clone(), Vec::new()).await.unwrap();

		// no direct dependencies: every raw class name survives untouched, no package collapsing.
		let mut remaining = remaining;
		remaining.sort();
		assert_eq!(remaining, own);
	}
}
