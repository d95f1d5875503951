//! Upgrades `http_archive` declarations whose URLs point at GitHub release
//! assets or source archives.

use crate::constraint::upgrade_constraint;
use crate::eval::{Declaration, TrackedValue, Value};
use crate::github::GitHubResolver;
use crate::replace::Edit;
use crate::rules::{RuleHandler, display_name};
use anyhow::Result;
use colored::Colorize;

pub struct HttpArchive {
    resolver: GitHubResolver,
}

impl HttpArchive {
    pub fn new(resolver: GitHubResolver) -> Self {
        Self { resolver }
    }
}

#[async_trait::async_trait]
impl RuleHandler for HttpArchive {
    async fn check(&self, decl: &Declaration, prefix: &str) -> Result<Vec<Edit>> {
        if !decl.name().starts_with(prefix) {
            return Ok(Vec::new());
        }
        println!("Checking {}", display_name(decl).bold());

        // url and urls both feed the same pool, in source order
        let mut urls: Vec<&TrackedValue> = Vec::new();
        let mut sha256 = None;
        let mut strip_prefix = None;
        for (key, value) in &decl.kwargs {
            match (key.as_str(), value) {
                ("url", Value::Str(v)) => urls.push(v),
                ("urls", Value::List(items)) => urls.extend(items.iter()),
                ("sha256", Value::Str(v)) => sha256 = Some(v),
                ("strip_prefix", Value::Str(v)) => strip_prefix = Some(v),
                _ => {}
            }
        }

        let spec = match upgrade_constraint(&decl.comments) {
            Ok(spec) => spec,
            Err(err) => {
                println!("  {} bad upgrade constraint: {err}", "warning:".yellow());
                return Ok(Vec::new());
            }
        };

        for url in &urls {
            let upgrade = match self.resolver.find_newer_release(&url.value, &spec).await {
                Ok(upgrade) => upgrade,
                Err(err) if err.is_fatal() => return Err(err.into()),
                Err(err) if err.is_silent_skip() => continue,
                Err(err) => {
                    println!("  {} {err}", "warning:".yellow());
                    continue;
                }
            };

            // A declaration that pins a checksum needs a fresh digest to pin;
            // without a matching asset we'd write a stale hash.
            if sha256.is_some() && upgrade.sha256.is_none() {
                println!(
                    "  {} release {} has no matching archive asset, skipping",
                    "warning:".yellow(),
                    upgrade.newest
                );
                continue;
            }

            let newest = upgrade.newest.to_string();
            println!("  {} {} -> {newest}", "upgrade".green(), upgrade.current);

            let mut edits = Vec::new();
            for value in &urls {
                for location in &value.locations {
                    edits.push(Edit {
                        file: location.file.clone(),
                        line: location.line,
                        find: upgrade.current.clone(),
                        substitution: newest.clone(),
                    });
                }
            }
            if let Some(sha) = sha256 {
                if sha.value.is_empty() {
                    println!(
                        "  {} sha256 is empty, leaving it alone",
                        "warning:".yellow()
                    );
                } else if let Some(digest) = &upgrade.sha256 {
                    for location in &sha.locations {
                        edits.push(Edit {
                            file: location.file.clone(),
                            line: location.line,
                            find: sha.value.clone(),
                            substitution: digest.clone(),
                        });
                    }
                }
            }
            if let Some(strip) = strip_prefix {
                for location in &strip.locations {
                    edits.push(Edit {
                        file: location.file.clone(),
                        line: location.line,
                        find: upgrade.current.clone(),
                        substitution: newest.clone(),
                    });
                }
            }
            // One resolved URL settles the declaration
            return Ok(edits);
        }

        Ok(Vec::new())
    }
}
