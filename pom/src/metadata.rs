use anyhow::{Context, Result};
use serde::Deserialize;
use vpa_coord::Ga;

/// The subset of `maven-metadata.xml` the propagation engine's version-mapping step needs: the
/// full list of published versions for a `g:a`.
#[derive(Debug, Deserialize)]
struct Metadata {
	versioning: Versioning,
}

#[derive(Debug, Deserialize)]
struct Versioning {
	versions: Versions,
}

#[derive(Debug, Deserialize)]
struct Versions {
	#[serde(rename = "version", default)]
	version: Vec<String>,
}

fn metadata_url(repo_base: &str, ga: &Ga) -> String {
	format!("{base}{slash}{group}/{artifact}/maven-metadata.xml",
		base = repo_base,
		slash = if repo_base.ends_with('/') { "" } else { "/" },
		group = ga.group.replace('.', "/"),
		artifact = ga.artifact,
	)
}

/// Lists every version published for `ga`, per `maven-metadata.xml`. Used by the propagation
/// engine's version-mapping step to enumerate a descendant GA's versions before checking each
/// one's declared direct dependencies.
pub async fn list_versions(client: &reqwest::Client, repo_base: &str, ga: &Ga) -> Result<Vec<String>> {
	let url = metadata_url(repo_base, ga);
	let response = client.get(&url).send().await.with_context(|| format!("requesting {url}"))?;

	if response.status() == reqwest::StatusCode::NOT_FOUND {
		return Ok(Vec::new());
	}
	if !response.status().is_success() {
		anyhow::bail!("unexpected status {} for {url}", response.status());
	}

	let body = response.text().await.with_context(|| format!("reading body of {url}"))?;
	let metadata: Metadata = serde_xml_rs::from_str(&body).with_context(|| format!("parsing maven-metadata.xml from {url}"))?;
	Ok(metadata.versioning.versions.version)
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;
	use super::*;

	#[test]
	fn builds_metadata_url_from_ga() {
		let ga = Ga::new("org.example", "foo");
		assert_eq!(metadata_url("https://repo.example.org", &ga), "https://repo.example.org/org/example/foo/maven-metadata.xml");
	}

	#[test]
	fn parses_version_list_from_xml() {
		let xml = r#"<metadata>
			<groupId>org.example</groupId>
			<artifactId>foo</artifactId>
			<versioning>
				<versions>
					<version>1.0</version>
					<version>2.0</version>
				</versions>
			</versioning>
		</metadata>"#;
		let metadata: Metadata = serde_xml_rs::from_str(xml).unwrap();
		assert_eq!(metadata.versioning.versions.version, vec!["1.0".to_owned(), "2.0".to_owned()]);
	}
}
