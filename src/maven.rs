use crate::checksum::SHA1_HEX_LEN;
use crate::version::{Version, VersionSpec};
use anyhow::{Context, Result, anyhow};
use regex::Regex;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;
use std::time::Duration;
use thiserror::Error;

/// Maven Central, the default registry
pub const CENTRAL_URL: &str = "https://repo1.maven.org/maven2";

#[derive(Error, Debug)]
pub enum MavenError {
    #[error("coordinate '{0}' is not group:artifact:version")]
    Coordinate(String),
    #[error("no version of {group}:{artifact} satisfies {spec}")]
    NoSatisfyingVersion {
        group: String,
        artifact: String,
        spec: String,
    },
    #[error("checksum file for {coordinate} is malformed: {reason}")]
    ChecksumFile { coordinate: String, reason: String },
    #[error(transparent)]
    Fetch(#[from] anyhow::Error),
}

/// A `group:artifact:version` coordinate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Coordinate {
    pub group: String,
    pub artifact: String,
    pub version: String,
}

impl Coordinate {
    /// Strict three-segment parse. Upgrades substitute the whole coordinate
    /// string, so anything with extra segments (packaging, classifier) is
    /// rejected rather than mangled.
    pub fn parse(s: &str) -> Result<Self, MavenError> {
        let parts: Vec<&str> = s.split(':').collect();
        if parts.len() != 3 || parts.iter().any(|p| p.is_empty()) {
            return Err(MavenError::Coordinate(s.to_string()));
        }
        Ok(Self {
            group: parts[0].to_string(),
            artifact: parts[1].to_string(),
            version: parts[2].to_string(),
        })
    }

    /// Lenient parse for pinned coordinates: first segment is the group,
    /// second the artifact, last the version, packaging segments in between
    /// are ignored.
    pub fn parse_lenient(s: &str) -> Result<Self, MavenError> {
        let parts: Vec<&str> = s.split(':').collect();
        let (Some(group), Some(artifact), Some(version)) =
            (parts.first(), parts.get(1), parts.last())
        else {
            return Err(MavenError::Coordinate(s.to_string()));
        };
        if parts.len() < 3 || group.is_empty() || artifact.is_empty() || version.is_empty() {
            return Err(MavenError::Coordinate(s.to_string()));
        }
        Ok(Self {
            group: (*group).to_string(),
            artifact: (*artifact).to_string(),
            version: (*version).to_string(),
        })
    }

    pub fn with_version(&self, version: &str) -> Coordinate {
        Coordinate {
            group: self.group.clone(),
            artifact: self.artifact.clone(),
            version: version.to_string(),
        }
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.group, self.artifact, self.version)
    }
}

static VERSION_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<version>([^<]+)</version>").expect("pattern is valid"));

/// Plain-GET client for a Maven-layout registry
#[derive(Clone)]
pub struct MavenClient {
    client: reqwest::Client,
    base_url: String,
}

impl Default for MavenClient {
    fn default() -> Self {
        Self::new()
    }
}

impl MavenClient {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .user_agent(concat!("bazel-check-updates/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            base_url: CENTRAL_URL.to_string(),
        }
    }

    /// Override the registry base URL (for tests or mirrors)
    pub fn with_repo_url(&self, url: &str) -> Self {
        Self {
            client: self.client.clone(),
            base_url: url.trim_end_matches('/').to_string(),
        }
    }

    fn artifact_dir(&self, group: &str, artifact: &str) -> String {
        format!("{}/{}/{artifact}", self.base_url, group.replace('.', "/"))
    }

    async fn fetch_text(&self, url: &str, what: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("Failed to fetch {what}"))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(anyhow!("{what} not found at {url}"));
        }
        if !response.status().is_success() {
            return Err(anyhow!("registry returned {} for {what}", response.status()));
        }

        response
            .text()
            .await
            .with_context(|| format!("Failed to read {what}"))
    }

    /// Every parseable version the registry's metadata document advertises
    pub async fn versions(&self, group: &str, artifact: &str) -> Result<Vec<Version>> {
        let url = format!("{}/maven-metadata.xml", self.artifact_dir(group, artifact));
        let body = self
            .fetch_text(&url, &format!("metadata for {group}:{artifact}"))
            .await?;
        Ok(VERSION_TAG
            .captures_iter(&body)
            .filter_map(|c| Version::from_str(&c[1]).ok())
            .collect())
    }

    /// Newest advertised version that satisfies `spec`
    pub async fn newest_version(
        &self,
        group: &str,
        artifact: &str,
        spec: &VersionSpec,
    ) -> Result<Version, MavenError> {
        let versions = self.versions(group, artifact).await?;
        versions
            .into_iter()
            .filter(|v| spec.satisfies(v))
            .max()
            .ok_or_else(|| MavenError::NoSatisfyingVersion {
                group: group.to_string(),
                artifact: artifact.to_string(),
                spec: spec.to_string(),
            })
    }

    /// SHA-1 hex digest the registry publishes next to the jar
    pub async fn version_sha1(&self, coordinate: &Coordinate) -> Result<String, MavenError> {
        let url = format!(
            "{}/{}/{}-{}.jar.sha1",
            self.artifact_dir(&coordinate.group, &coordinate.artifact),
            coordinate.version,
            coordinate.artifact,
            coordinate.version
        );
        let body = self
            .fetch_text(&url, &format!("checksum for {coordinate}"))
            .await?;

        // hash files sometimes carry a "<hash>  <filename>" tail
        let hash = body.split_whitespace().next().unwrap_or("");
        if hash.len() != SHA1_HEX_LEN {
            return Err(MavenError::ChecksumFile {
                coordinate: coordinate.to_string(),
                reason: format!(
                    "expected {SHA1_HEX_LEN} hex characters, got {}",
                    hash.len()
                ),
            });
        }
        Ok(hash.to_string())
    }

    /// Raw POM document of one artifact version
    pub async fn pom(&self, group: &str, artifact: &str, version: &str) -> Result<String> {
        let url = format!(
            "{}/{version}/{artifact}-{version}.pom",
            self.artifact_dir(group, artifact)
        );
        self.fetch_text(&url, &format!("POM for {group}:{artifact}:{version}"))
            .await
    }
}
