pub mod http_archive;
pub mod maven_install;
pub mod maven_jar;

use crate::eval::Declaration;
use crate::github::GitHubResolver;
use crate::maven::MavenClient;
use crate::replace::Edit;
use anyhow::Result;
use std::collections::HashMap;

/// One declaration kind's upgrade logic.
///
/// Handlers deal with local failures themselves (log, produce what they
/// can); returning an error aborts the whole run.
#[async_trait::async_trait]
pub trait RuleHandler: Send + Sync {
    async fn check(&self, decl: &Declaration, prefix: &str) -> Result<Vec<Edit>>;
}

/// Dispatch table from call-function name to handler. Calls with no entry
/// (`load`, toolchain setup, ...) are ignored.
pub struct Handlers {
    map: HashMap<&'static str, Box<dyn RuleHandler>>,
}

impl Handlers {
    /// The full upgrade set: archive rules resolve against the hosting
    /// API, registry rules against the Maven client
    pub fn upgrade_set(resolver: GitHubResolver, maven: MavenClient) -> Self {
        let mut map: HashMap<&'static str, Box<dyn RuleHandler>> = HashMap::new();
        map.insert(
            "http_archive",
            Box::new(http_archive::HttpArchive::new(resolver)),
        );
        map.insert(
            "maven_jar",
            Box::new(maven_jar::MavenJar::new(maven.clone())),
        );
        map.insert(
            "maven_install",
            Box::new(maven_install::MavenInstall::new(maven)),
        );
        Self { map }
    }

    /// Run every recognized declaration through its handler, in source
    /// order, accumulating the proposed edits
    pub async fn collect(&self, declarations: &[Declaration], prefix: &str) -> Result<Vec<Edit>> {
        let mut edits = Vec::new();
        for decl in declarations {
            if let Some(handler) = self.map.get(decl.rule.as_str()) {
                edits.extend(handler.check(decl, prefix).await?);
            }
        }
        Ok(edits)
    }
}

/// Label for progress output: the declaration's name, or its rule kind for
/// anonymous declarations
pub(crate) fn display_name(decl: &Declaration) -> &str {
    let name = decl.name();
    if name.is_empty() { &decl.rule } else { name }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::scan_file;
    use crate::github::FakeReleases;
    use crate::starlark;
    use std::path::Path;
    use std::sync::Arc;

    fn offline_handlers() -> Handlers {
        let resolver = GitHubResolver::new(Arc::new(FakeReleases::new()));
        Handlers::upgrade_set(resolver, MavenClient::new())
    }

    #[tokio::test]
    async fn test_unregistered_calls_are_ignored() {
        let file = starlark::parse(
            "load(\"bzl\", \"http_archive\")\ngo_register_toolchains(name = \"x\")\n",
        )
        .unwrap();
        let decls = scan_file(&file, Path::new("WORKSPACE")).unwrap();
        let edits = offline_handlers().collect(&decls, "").await.unwrap();
        assert!(edits.is_empty());
    }

    #[tokio::test]
    async fn test_prefix_filter_produces_no_edits() {
        // a filtered declaration is skipped before any resolution happens,
        // so no release source needs to exist
        let file = starlark::parse(
            "http_archive(\n    name = \"rules_go\",\n    url = \"https://github.com/b/r/archive/1.0.0.zip\",\n)\n",
        )
        .unwrap();
        let decls = scan_file(&file, Path::new("WORKSPACE")).unwrap();
        let edits = offline_handlers().collect(&decls, "zzz_").await.unwrap();
        assert!(edits.is_empty());
    }
}
