use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Helper to create a temporary Bazel workspace directory
pub struct TempWorkspace {
    pub dir: TempDir,
}

impl TempWorkspace {
    /// Create a new temporary workspace
    pub fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp directory");
        Self { dir }
    }

    /// Get the path to the workspace directory
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Create a file in the workspace with the given content
    pub fn create_file(&self, relative_path: &str, content: &str) {
        let file_path = self.dir.path().join(relative_path);

        // Create parent directories if needed
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directories");
        }

        fs::write(&file_path, content).expect("Failed to write file");
    }

    /// Get the absolute path to a file in the workspace
    pub fn file_path(&self, relative_path: &str) -> PathBuf {
        self.dir.path().join(relative_path)
    }
}

impl Default for TempWorkspace {
    fn default() -> Self {
        Self::new()
    }
}

/// A WORKSPACE with one GitHub-hosted archive and one Maven jar
pub fn sample_workspace() -> &'static str {
    r#"load("@bazel_tools//tools/build_defs/repo:http.bzl", "http_archive")

http_archive(
    name = "io_bazel_rules_go",
    url = "https://github.com/bazelbuild/rules_go/releases/download/0.18.3/rules_go-0.18.3.tar.gz",
    sha256 = "86ae934bd4c43b99893fc64be9d9fc684b81461581df7ea8fc291c816f5ee8c5",
)

maven_jar(
    name = "com_google_zxing_core",
    artifact = "com.google.zxing:core:3.3.3",
    sha1 = "b640badcc97f18867c4dfd249ef8d20ec0204c07",
)
"#
}

/// A WORKSPACE where the version lives in a variable and surfaces in the
/// URL and the strip_prefix through interpolation
pub fn sample_workspace_with_variables() -> &'static str {
    r#"RULES_SASS_VERSION = "1.15.2"

http_archive(
    name = "io_bazel_rules_sass",
    url = "https://github.com/bazelbuild/rules_sass/archive/%s.zip" % RULES_SASS_VERSION,
    sha256 = "d8b89e47b05092a6eed3fa199f2de7cf671a4b9165d0bf38f12a0363dda928d3",
    strip_prefix = "rules_sass-%s" % RULES_SASS_VERSION,
)
"#
}

/// A WORKSPACE whose URLs never match a known release host, so a run
/// touches no network at all
pub fn sample_offline_workspace() -> &'static str {
    r#"http_archive(
    name = "zlib",
    url = "https://zlib.net/zlib-1.2.11.tar.gz",
    sha256 = "c3e5e9fdd5004dcb542feda5ee4f0ff0744628baf8ed2dd5d66f8ca1197cb1a1",
)
"#
}

/// A WORKSPACE with a pinned maven_install for license reporting
pub fn sample_pinned_workspace() -> &'static str {
    r#"maven_install(
    artifacts = ["com.google.guava:guava:28.0-jre"],
    maven_install_json = "//:maven_install.json",
)
"#
}

pub fn sample_maven_install_json() -> &'static str {
    r#"{
  "dependency_tree": {
    "dependencies": [
      {
        "coord": "com.google.guava:guava:28.0-jre",
        "file": "v1/https/repo1.maven.org/maven2/com/google/guava/guava/28.0-jre/guava-28.0-jre.jar",
        "sha256": "63b09db6861011e7fb2481be7790c7fd4b03f0bb884b3de2ecba8823ad19bf3f",
        "url": "https://repo1.maven.org/maven2/com/google/guava/guava/28.0-jre/guava-28.0-jre.jar"
      }
    ],
    "version": "0.1.0"
  }
}
"#
}

/// Create a TempWorkspace with a WORKSPACE file holding `content`
pub fn create_workspace(content: &str) -> TempWorkspace {
    let workspace = TempWorkspace::new();
    workspace.create_file("WORKSPACE", content);
    workspace
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temp_workspace_creation() {
        let workspace = TempWorkspace::new();
        assert!(workspace.path().exists());
        assert!(workspace.path().is_dir());
    }

    #[test]
    fn test_create_file() {
        let workspace = TempWorkspace::new();
        workspace.create_file("WORKSPACE", "# empty");

        let file_path = workspace.file_path("WORKSPACE");
        assert!(file_path.exists());

        let content = fs::read_to_string(file_path).unwrap();
        assert_eq!(content, "# empty");
    }

    #[test]
    fn test_create_file_with_subdirs() {
        let workspace = TempWorkspace::new();
        workspace.create_file("third_party/WORKSPACE", "# empty");

        let file_path = workspace.file_path("third_party/WORKSPACE");
        assert!(file_path.exists());
    }
}
