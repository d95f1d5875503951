//! Upgrades `maven_jar` declarations against the registry's version
//! metadata, refreshing the pinned jar checksum alongside the coordinate.

use crate::constraint::upgrade_constraint;
use crate::eval::Declaration;
use crate::maven::{Coordinate, MavenClient};
use crate::replace::Edit;
use crate::rules::{RuleHandler, display_name};
use anyhow::Result;
use colored::Colorize;

pub struct MavenJar {
    maven: MavenClient,
}

impl MavenJar {
    pub fn new(maven: MavenClient) -> Self {
        Self { maven }
    }
}

#[async_trait::async_trait]
impl RuleHandler for MavenJar {
    async fn check(&self, decl: &Declaration, prefix: &str) -> Result<Vec<Edit>> {
        if !decl.name().starts_with(prefix) {
            return Ok(Vec::new());
        }
        println!("Checking {}", display_name(decl).bold());

        let Some(artifact) = decl.str_kwarg("artifact") else {
            println!(
                "  {} declaration has no artifact coordinate",
                "warning:".yellow()
            );
            return Ok(Vec::new());
        };
        let coordinate = match Coordinate::parse(&artifact.value) {
            Ok(coordinate) => coordinate,
            Err(err) => {
                println!("  {} {err}: '{}'", "warning:".yellow(), artifact.value);
                return Ok(Vec::new());
            }
        };

        let spec = match upgrade_constraint(&decl.comments) {
            Ok(spec) => spec,
            Err(err) => {
                println!("  {} bad upgrade constraint: {err}", "warning:".yellow());
                return Ok(Vec::new());
            }
        };

        let newest = match self
            .maven
            .newest_version(&coordinate.group, &coordinate.artifact, &spec)
            .await
        {
            Ok(newest) => newest,
            Err(err) => {
                println!("  {} {err}", "warning:".yellow());
                return Ok(Vec::new());
            }
        };
        if newest.original == coordinate.version {
            return Ok(Vec::new());
        }

        let upgraded = coordinate.with_version(&newest.original);

        // Refresh the checksum before touching anything, so a registry
        // hiccup can't leave the coordinate upgraded with a stale hash
        let sha1 = decl.str_kwarg("sha1").filter(|v| !v.value.is_empty());
        let new_sha1 = match sha1 {
            Some(_) => match self.maven.version_sha1(&upgraded).await {
                Ok(hash) => Some(hash),
                Err(err) => {
                    println!("  {} {err}", "warning:".yellow());
                    return Ok(Vec::new());
                }
            },
            None => None,
        };

        println!(
            "  {} {} -> {newest}",
            "upgrade".green(),
            coordinate.version
        );

        let mut edits = Vec::new();
        for location in &artifact.locations {
            edits.push(Edit {
                file: location.file.clone(),
                line: location.line,
                find: artifact.value.clone(),
                substitution: upgraded.to_string(),
            });
        }
        if let (Some(old), Some(new)) = (sha1, new_sha1) {
            for location in &old.locations {
                edits.push(Edit {
                    file: location.file.clone(),
                    line: location.line,
                    find: old.value.clone(),
                    substitution: new.clone(),
                });
            }
        }
        Ok(edits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::scan_file;
    use crate::starlark;
    use std::path::{Path, PathBuf};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const METADATA: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<metadata>
  <groupId>com.google.zxing</groupId>
  <artifactId>core</artifactId>
  <versioning>
    <latest>3.4.0</latest>
    <release>3.4.0</release>
    <versions>
      <version>3.3.3</version>
      <version>3.4.0</version>
    </versions>
  </versioning>
</metadata>
"#;

    async fn run(source: &str, maven: MavenClient, prefix: &str) -> Vec<Edit> {
        let file = starlark::parse(source).unwrap();
        let decls = scan_file(&file, Path::new("WORKSPACE")).unwrap();
        let handler = MavenJar::new(maven);
        let mut edits = Vec::new();
        for decl in decls.iter().filter(|d| d.rule == "maven_jar") {
            edits.extend(handler.check(decl, prefix).await.unwrap());
        }
        edits
    }

    fn edit(line: usize, find: &str, substitution: &str) -> Edit {
        Edit {
            file: PathBuf::from("WORKSPACE"),
            line,
            find: find.to_string(),
            substitution: substitution.to_string(),
        }
    }

    const SOURCE: &str = r#"maven_jar(
    name = "com_google_zxing_core",
    artifact = "com.google.zxing:core:3.3.3",
    sha1 = "b640badcc97f18867c4dfd249ef8d20ec0204c07",
)
"#;

    #[tokio::test]
    async fn test_upgrades_coordinate_and_sha1() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/com/google/zxing/core/maven-metadata.xml"))
            .respond_with(ResponseTemplate::new(200).set_body_string(METADATA))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/com/google/zxing/core/3.4.0/core-3.4.0.jar.sha1"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("0cf270e0c75e2145fae1e3f7b2cd33149d02d45a"),
            )
            .mount(&server)
            .await;

        let maven = MavenClient::new().with_repo_url(&server.uri());
        let edits = run(SOURCE, maven, "").await;

        assert_eq!(
            edits,
            vec![
                edit(
                    3,
                    "com.google.zxing:core:3.3.3",
                    "com.google.zxing:core:3.4.0",
                ),
                edit(
                    4,
                    "b640badcc97f18867c4dfd249ef8d20ec0204c07",
                    "0cf270e0c75e2145fae1e3f7b2cd33149d02d45a",
                ),
            ]
        );
    }

    #[tokio::test]
    async fn test_already_newest_is_quiet() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/com/google/zxing/core/maven-metadata.xml"))
            .respond_with(ResponseTemplate::new(200).set_body_string(METADATA))
            .mount(&server)
            .await;

        let source = r#"maven_jar(
    name = "com_google_zxing_core",
    artifact = "com.google.zxing:core:3.4.0",
)
"#;
        let maven = MavenClient::new().with_repo_url(&server.uri());
        let edits = run(source, maven, "").await;
        assert!(edits.is_empty());
    }

    #[tokio::test]
    async fn test_prefix_mismatch_skips_without_fetching() {
        // never touches the network, so the default client is fine
        let edits = run(SOURCE, MavenClient::new(), "org_").await;
        assert!(edits.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_coordinate_is_a_local_failure() {
        let source = r#"maven_jar(
    name = "broken",
    artifact = "com.google.zxing:core",
)
"#;
        let edits = run(source, MavenClient::new(), "").await;
        assert!(edits.is_empty());
    }

    #[tokio::test]
    async fn test_missing_checksum_file_skips_the_declaration() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/com/google/zxing/core/maven-metadata.xml"))
            .respond_with(ResponseTemplate::new(200).set_body_string(METADATA))
            .mount(&server)
            .await;
        // no .jar.sha1 mock: the registry 404s the checksum

        let maven = MavenClient::new().with_repo_url(&server.uri());
        let edits = run(SOURCE, maven, "").await;
        assert!(edits.is_empty());
    }

    #[tokio::test]
    async fn test_constraint_comment_holds_the_version_back() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/com/google/zxing/core/maven-metadata.xml"))
            .respond_with(ResponseTemplate::new(200).set_body_string(METADATA))
            .mount(&server)
            .await;

        let source = r#"maven_jar(
    name = "com_google_zxing_core",
    # bcu: <3.4
    artifact = "com.google.zxing:core:3.3.3",
)
"#;
        let maven = MavenClient::new().with_repo_url(&server.uri());
        let edits = run(source, maven, "").await;
        assert!(edits.is_empty());
    }
}
