use crate::checksum;
use crate::version::{Version, VersionSpec};
use anyhow::{Context, Result, anyhow};
use regex::Regex;
use serde::Deserialize;
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::{Arc, LazyLock};
use std::time::Duration;
use thiserror::Error;

const USER_AGENT: &str = concat!("bazel-check-updates/", env!("CARGO_PKG_VERSION"));

pub const API_URL: &str = "https://api.github.com";

/// One published release as the hosting API reports it
#[derive(Debug, Clone, Deserialize)]
pub struct Release {
    #[serde(rename = "tag_name")]
    pub tag: String,
    #[serde(default)]
    pub assets: Vec<ReleaseAsset>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReleaseAsset {
    pub name: String,
    #[serde(rename = "browser_download_url")]
    pub download_url: String,
}

/// Source of release listings, so resolution logic can run against the real
/// API or a pre-seeded double
#[async_trait::async_trait]
pub trait ReleaseLister: Send + Sync {
    async fn list_releases(&self, owner: &str, repo: &str) -> Result<Vec<Release>>;
}

/// GitHub REST API client
pub struct GitHubClient {
    client: reqwest::Client,
    base_url: String,
}

impl GitHubClient {
    pub fn new(token: Option<&str>) -> Self {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static("application/vnd.github+json"),
        );
        if let Some(token) = token {
            if let Ok(mut value) =
                reqwest::header::HeaderValue::from_str(&format!("Bearer {token}"))
            {
                value.set_sensitive(true);
                headers.insert(reqwest::header::AUTHORIZATION, value);
            }
        }
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            base_url: API_URL.to_string(),
        }
    }

    /// Override the API base URL (for tests or GitHub Enterprise)
    pub fn with_api_url(mut self, url: &str) -> Self {
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }
}

#[async_trait::async_trait]
impl ReleaseLister for GitHubClient {
    async fn list_releases(&self, owner: &str, repo: &str) -> Result<Vec<Release>> {
        let url = format!("{}/repos/{owner}/{repo}/releases", self.base_url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Failed to list releases for {owner}/{repo}"))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(anyhow!("Repository {owner}/{repo} not found"));
        }
        if !response.status().is_success() {
            return Err(anyhow!(
                "GitHub API returned {} for {owner}/{repo}",
                response.status()
            ));
        }

        response
            .json::<Vec<Release>>()
            .await
            .with_context(|| format!("Failed to parse releases for {owner}/{repo}"))
    }
}

/// Pre-seedable in-memory release source for tests
#[derive(Debug, Clone, Default)]
pub struct FakeReleases {
    releases: HashMap<(String, String), Vec<Release>>,
}

impl FakeReleases {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed one release with no downloadable assets
    pub fn add_bare_release(&mut self, owner: &str, repo: &str, tag: &str) {
        self.releases
            .entry((owner.to_string(), repo.to_string()))
            .or_default()
            .push(Release {
                tag: tag.to_string(),
                assets: Vec::new(),
            });
    }

    /// Seed one release carrying a single asset at `download_url`
    pub fn add_release(&mut self, owner: &str, repo: &str, tag: &str, download_url: &str) {
        let name = download_url
            .rsplit('/')
            .next()
            .unwrap_or(download_url)
            .to_string();
        self.releases
            .entry((owner.to_string(), repo.to_string()))
            .or_default()
            .push(Release {
                tag: tag.to_string(),
                assets: vec![ReleaseAsset {
                    name,
                    download_url: download_url.to_string(),
                }],
            });
    }
}

#[async_trait::async_trait]
impl ReleaseLister for FakeReleases {
    async fn list_releases(&self, owner: &str, repo: &str) -> Result<Vec<Release>> {
        Ok(self
            .releases
            .get(&(owner.to_string(), repo.to_string()))
            .cloned()
            .unwrap_or_default())
    }
}

#[derive(Error, Debug)]
pub enum ResolveError {
    /// Not a recognized release-asset or source-archive URL
    #[error("url does not match a known release pattern")]
    PatternMismatch,
    /// The version the URL carries today could not be parsed
    #[error("current version '{0}' is not parseable")]
    CurrentVersion(String),
    /// Everything parsed, nothing newer satisfied the constraint
    #[error("no newer version found")]
    NoNewerVersion,
    /// Listing releases failed (network, auth, missing repository)
    #[error("listing releases failed: {0}")]
    ListReleases(anyhow::Error),
    /// Downloading the chosen asset for checksum computation failed
    #[error("downloading release asset {url} failed: {source}")]
    AssetDownload { url: String, source: anyhow::Error },
}

impl ResolveError {
    /// Expected outcomes the scan stays quiet about
    pub fn is_silent_skip(&self) -> bool {
        matches!(
            self,
            Self::PatternMismatch | Self::CurrentVersion(_) | Self::NoNewerVersion
        )
    }

    /// Asset download failures abort the whole run
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::AssetDownload { .. })
    }
}

/// A successful lookup: the version the URL carries today, the newest
/// acceptable release, and the digest of its matching asset when one exists
#[derive(Debug, Clone)]
pub struct ResolvedUpgrade {
    pub current: String,
    pub newest: Version,
    pub sha256: Option<String>,
}

static RELEASE_ASSET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"https://github\.com/([a-zA-Z0-9_-]+)/([a-zA-Z0-9_-]+)/releases/download/v?([a-z0-9.]+)/.*\.tar\.gz",
    )
    .expect("pattern is valid")
});

static SOURCE_ARCHIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"https://github\.com/([a-zA-Z0-9_-]+)/([a-zA-Z0-9_-]+)/archive/v?([a-z0-9.]+)\.zip")
        .expect("pattern is valid")
});

#[derive(Debug, PartialEq, Eq)]
struct GitHubUrl {
    owner: String,
    repo: String,
    /// Tag text as written, leading `v` already dropped by the pattern
    tag: String,
    extension: &'static str,
}

fn classify_url(url: &str) -> Option<GitHubUrl> {
    for (pattern, extension) in [(&RELEASE_ASSET, "tar.gz"), (&SOURCE_ARCHIVE, "zip")] {
        if let Some(captures) = pattern.captures(url) {
            return Some(GitHubUrl {
                owner: captures[1].to_string(),
                repo: captures[2].to_string(),
                tag: captures[3].to_string(),
                extension,
            });
        }
    }
    None
}

/// Finds newer releases for GitHub-hosted archive URLs
pub struct GitHubResolver {
    lister: Arc<dyn ReleaseLister>,
    http: reqwest::Client,
}

impl GitHubResolver {
    pub fn new(lister: Arc<dyn ReleaseLister>) -> Self {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self { lister, http }
    }

    /// Find the newest release strictly newer than the version in `url` that
    /// satisfies `spec`, along with the SHA-256 digest of the release asset
    /// matching the URL's archive extension.
    pub async fn find_newer_release(
        &self,
        url: &str,
        spec: &VersionSpec,
    ) -> Result<ResolvedUpgrade, ResolveError> {
        let Some(archive) = classify_url(url) else {
            return Err(ResolveError::PatternMismatch);
        };
        let current = Version::from_str(&archive.tag)
            .map_err(|_| ResolveError::CurrentVersion(archive.tag.clone()))?;

        let releases = self
            .lister
            .list_releases(&archive.owner, &archive.repo)
            .await
            .map_err(ResolveError::ListReleases)?;

        let mut newest = current;
        let mut best: Option<&Release> = None;
        for release in &releases {
            let Ok(version) = Version::from_str(release.tag.trim_start_matches('v')) else {
                continue;
            };
            if version > newest && spec.satisfies(&version) {
                newest = version;
                best = Some(release);
            }
        }
        let Some(release) = best else {
            return Err(ResolveError::NoNewerVersion);
        };

        let suffix = format!(".{}", archive.extension);
        let mut sha256 = None;
        if let Some(asset) = release
            .assets
            .iter()
            .find(|a| a.download_url.ends_with(&suffix))
        {
            let bytes = self.download(&asset.download_url).await?;
            sha256 = Some(checksum::sha256_hex(&bytes));
        }

        Ok(ResolvedUpgrade {
            current: archive.tag,
            newest,
            sha256,
        })
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>, ResolveError> {
        let fail = |source: anyhow::Error| ResolveError::AssetDownload {
            url: url.to_string(),
            source,
        };
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| fail(e.into()))?;
        if !response.status().is_success() {
            return Err(fail(anyhow!("status {}", response.status())));
        }
        let bytes = response.bytes().await.map_err(|e| fail(e.into()))?;
        Ok(bytes.to_vec())
    }
}
