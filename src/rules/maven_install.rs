//! Upgrades the coordinate strings inside a `maven_install` artifacts list.
//! Entries stand alone: one bad or unresolvable coordinate never blocks the
//! rest of the list.

use crate::constraint::upgrade_constraint;
use crate::eval::Declaration;
use crate::maven::{Coordinate, MavenClient};
use crate::replace::Edit;
use crate::rules::{RuleHandler, display_name};
use anyhow::Result;
use colored::Colorize;

pub struct MavenInstall {
    maven: MavenClient,
}

impl MavenInstall {
    pub fn new(maven: MavenClient) -> Self {
        Self { maven }
    }
}

#[async_trait::async_trait]
impl RuleHandler for MavenInstall {
    async fn check(&self, decl: &Declaration, prefix: &str) -> Result<Vec<Edit>> {
        if !decl.name().starts_with(prefix) {
            return Ok(Vec::new());
        }
        println!("Checking {}", display_name(decl).bold());

        let Some(artifacts) = decl.list_kwarg("artifacts") else {
            println!(
                "  {} declaration has no artifacts list",
                "warning:".yellow()
            );
            return Ok(Vec::new());
        };

        let spec = match upgrade_constraint(&decl.comments) {
            Ok(spec) => spec,
            Err(err) => {
                println!("  {} bad upgrade constraint: {err}", "warning:".yellow());
                return Ok(Vec::new());
            }
        };

        let mut edits = Vec::new();
        for entry in artifacts {
            let coordinate = match Coordinate::parse(&entry.value) {
                Ok(coordinate) => coordinate,
                Err(err) => {
                    println!("  {} {err}: '{}'", "warning:".yellow(), entry.value);
                    continue;
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
                    continue;
                }
            };
            if newest.original == coordinate.version {
                continue;
            }

            let upgraded = coordinate.with_version(&newest.original);
            println!(
                "  {} {} -> {newest}",
                "upgrade".green(),
                coordinate.version
            );
            for location in &entry.locations {
                edits.push(Edit {
                    file: location.file.clone(),
                    line: location.line,
                    find: entry.value.clone(),
                    substitution: upgraded.to_string(),
                });
            }
        }
        Ok(edits)
    }
}
