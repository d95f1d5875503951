//! License report mode: instead of upgrading anything, derive a license
//! string for every Maven-backed dependency and emit `name,license` rows.
//!
//! POMs rarely need full XML treatment for this. Most carry one of a few
//! well-known license texts verbatim, so those are probed first; after that
//! a single `<licenses><license><name>` entry is trusted, then the parent
//! POM chain, and as a last resort the newest version of the same artifact.

use crate::eval::Declaration;
use crate::maven::{Coordinate, MavenClient};
use crate::version::VersionSpec;
use anyhow::{Result, anyhow};
use colored::Colorize;
use regex::Regex;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::sync::LazyLock;

/// Texts that identify a license regardless of how the POM is structured,
/// probed in order
const VERBATIM_LICENSES: [(&str, &str); 4] = [
    (
        "http://www.apache.org/licenses/LICENSE-2.0",
        "Apache License, Version 2.0",
    ),
    ("Apache License, Version 2.0", "Apache License, Version 2.0"),
    ("Eclipse Public License v1.0", "Eclipse Public License v1.0"),
    (
        "GNU Lesser General Public License version 2.1",
        "GNU Lesser General Public License version 2.1",
    ),
];

/// Parent chains are short in practice; this only guards against cycles
const MAX_POM_HOPS: usize = 8;

static LICENSES_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<licenses>(.*?)</licenses>").expect("pattern is valid"));
static LICENSE_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<name>([^<]+)</name>").expect("pattern is valid"));
static PARENT_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<parent>(.*?)</parent>").expect("pattern is valid"));
static GROUP_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<groupId>([^<]+)</groupId>").expect("pattern is valid"));
static ARTIFACT_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<artifactId>([^<]+)</artifactId>").expect("pattern is valid"));
static VERSION_FIELD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<version>([^<]+)</version>").expect("pattern is valid"));

/// One `name,license` output row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LicenseRow {
    pub name: String,
    pub license: String,
}

pub struct LicenseChecker {
    maven: MavenClient,
}

impl LicenseChecker {
    pub fn new(maven: MavenClient) -> Self {
        Self { maven }
    }

    /// Derive rows for every Maven-backed declaration. Failures are logged
    /// per dependency and never block the rest of the report.
    pub async fn report(
        &self,
        declarations: &[Declaration],
        prefix: &str,
        workspace: &Path,
    ) -> Vec<LicenseRow> {
        let mut rows = Vec::new();
        for decl in declarations {
            if !decl.name().starts_with(prefix) {
                continue;
            }
            match decl.rule.as_str() {
                "maven_jar" => {
                    if let Some(row) = self.jar_license(decl).await {
                        rows.push(row);
                    }
                }
                "maven_install" => rows.extend(self.install_licenses(decl, workspace).await),
                _ => {}
            }
        }
        rows
    }

    async fn jar_license(&self, decl: &Declaration) -> Option<LicenseRow> {
        let name = decl.name().to_string();
        let Some(artifact) = decl.str_kwarg("artifact") else {
            eprintln!("{} {name}: no artifact coordinate", "warning:".yellow());
            return None;
        };
        let coordinate = match Coordinate::parse_lenient(&artifact.value) {
            Ok(coordinate) => coordinate,
            Err(err) => {
                eprintln!("{} {name}: {err}", "warning:".yellow());
                return None;
            }
        };

        // A declaration can point its POM lookups at another registry
        let maven = match decl.str_kwarg("repository") {
            Some(repository) => self.maven.with_repo_url(&repository.value),
            None => self.maven.clone(),
        };

        match pom_license(&maven, &coordinate).await {
            Ok(license) => Some(LicenseRow { name, license }),
            Err(err) => {
                eprintln!("{} {name}: {err}", "warning:".yellow());
                None
            }
        }
    }

    async fn install_licenses(&self, decl: &Declaration, workspace: &Path) -> Vec<LicenseRow> {
        let Some(label) = decl.str_kwarg("maven_install_json") else {
            eprintln!(
                "{} maven_install has no maven_install_json pin file",
                "warning:".yellow()
            );
            return Vec::new();
        };

        // "//:maven_install.json" is a label relative to the scanned file's
        // directory; colons separate the package from the target
        let relative = label.value.replace(':', "/");
        let pin_path = workspace
            .parent()
            .unwrap_or(Path::new(""))
            .join(relative.trim_start_matches('/'));

        let pinned = match read_pinned(&pin_path) {
            Ok(pinned) => pinned,
            Err(err) => {
                eprintln!("{} {}: {err}", "warning:".yellow(), pin_path.display());
                return Vec::new();
            }
        };

        let mut rows = Vec::new();
        for coord in pinned {
            let coordinate = match Coordinate::parse_lenient(&coord) {
                Ok(coordinate) => coordinate,
                Err(err) => {
                    eprintln!("{} {coord}: {err}", "warning:".yellow());
                    continue;
                }
            };
            match pom_license(&self.maven, &coordinate).await {
                Ok(license) => rows.push(LicenseRow {
                    name: coord,
                    license,
                }),
                Err(err) => eprintln!("{} {coord}: {err}", "warning:".yellow()),
            }
        }
        rows
    }
}

#[derive(Deserialize)]
struct PinningFile {
    #[serde(default)]
    dependency_tree: DependencyTree,
}

#[derive(Deserialize, Default)]
struct DependencyTree {
    #[serde(default)]
    dependencies: Vec<PinnedDependency>,
}

#[derive(Deserialize)]
struct PinnedDependency {
    coord: String,
}

fn read_pinned(path: &Path) -> Result<Vec<String>> {
    let data = fs::read_to_string(path)?;
    let pinned: PinningFile = serde_json::from_str(&data)?;
    Ok(pinned
        .dependency_tree
        .dependencies
        .into_iter()
        .map(|d| d.coord)
        .collect())
}

/// Walk POMs until a license surfaces: verbatim text, a lone
/// `<license><name>`, the parent chain, then one retry at the newest version
async fn pom_license(maven: &MavenClient, start: &Coordinate) -> Result<String> {
    let mut coordinate = start.clone();
    let mut retried_newest = false;

    for _ in 0..MAX_POM_HOPS {
        let pom = maven
            .pom(&coordinate.group, &coordinate.artifact, &coordinate.version)
            .await?;

        for (needle, license) in VERBATIM_LICENSES {
            if pom.contains(needle) {
                return Ok(license.to_string());
            }
        }
        if let Some(name) = single_license_name(&pom) {
            return Ok(name);
        }
        if let Some(parent) = parent_coordinate(&pom) {
            coordinate = parent;
            continue;
        }
        if !retried_newest {
            retried_newest = true;
            if let Ok(newest) = maven
                .newest_version(&coordinate.group, &coordinate.artifact, &VersionSpec::Any)
                .await
            {
                if newest.original != coordinate.version {
                    coordinate = coordinate.with_version(&newest.original);
                    continue;
                }
            }
        }
        break;
    }

    Err(anyhow!("no license found for {start}"))
}

/// The license name, but only when the POM declares exactly one
fn single_license_name(pom: &str) -> Option<String> {
    let block = LICENSES_BLOCK.captures(pom)?;
    let mut names = LICENSE_NAME.captures_iter(&block[1]);
    let first = names.next()?;
    if names.next().is_some() {
        return None;
    }
    Some(first[1].trim().to_string())
}

fn parent_coordinate(pom: &str) -> Option<Coordinate> {
    let block = PARENT_BLOCK.captures(pom)?;
    let parent = &block[1];
    Some(Coordinate {
        group: GROUP_ID.captures(parent)?[1].trim().to_string(),
        artifact: ARTIFACT_ID.captures(parent)?[1].trim().to_string(),
        version: VERSION_FIELD.captures(parent)?[1].trim().to_string(),
    })
}
