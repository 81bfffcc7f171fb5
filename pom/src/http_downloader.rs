use std::future::Future;
use anyhow::{Context, Result};
use crate::maven_pom::MavenPom;
use crate::Downloader;

/// A [`Downloader`] backed by a real `reqwest::Client`, for use outside of tests. 404s become
/// `Ok(None)` (the shape [`Downloader::get_maven_pom`] expects for "try the next resolver");
/// any other non-2xx status or transport failure is an `Err`, consistent with how the rest of the
/// propagation engine treats artifact-network failures.
pub struct HttpDownloader {
	client: reqwest::Client,
}

impl HttpDownloader {
	pub fn new(client: reqwest::Client) -> HttpDownloader {
		HttpDownloader { client }
	}
}

impl Downloader for HttpDownloader {
	#[allow(clippy::manual_async_fn)]
	fn get_maven_pom(&self, url: &str) -> impl Future<Output = Result<Option<MavenPom>>> + Send {
		let client = self.client.clone();
		let url = url.to_owned();
		async move {
			let response = client.get(&url).send().await.with_context(|| format!("requesting {url}"))?;

			if response.status() == reqwest::StatusCode::NOT_FOUND {
				return Ok(None);
			}
			if !response.status().is_success() {
				anyhow::bail!("unexpected status {} for {url}", response.status());
			}

			let body = response.text().await.with_context(|| format!("reading body of {url}"))?;
			let pom: MavenPom = serde_xml_rs::from_str(&body).with_context(|| format!("parsing pom xml from {url}"))?;
			Ok(Some(pom))
		}
	}
}
