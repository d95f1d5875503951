use crate::starlark::Comments;
use crate::version::{VersionError, VersionSpec};

/// Comment marker that pins how far a dependency may be upgraded, e.g.
/// `# bcu: ^0.19` or `# bcu: <2.0.0`
pub const SENTINEL: &str = "bcu:";

/// Extract the upgrade constraint attached to a declaration.
///
/// Leading comments are scanned before trailing ones and the first sentinel
/// wins. Without a sentinel any newer version is acceptable.
pub fn upgrade_constraint(comments: &Comments) -> Result<VersionSpec, VersionError> {
    for comment in comments.leading.iter().chain(&comments.trailing) {
        let text = comment.text.trim_start_matches('#').trim_start();
        if let Some(expr) = text.strip_prefix(SENTINEL) {
            return VersionSpec::parse(expr);
        }
    }
    Ok(VersionSpec::Any)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::scan_file;
    use crate::starlark;
    use crate::version::Version;
    use std::path::Path;

    fn constraint_of(source: &str) -> VersionSpec {
        let file = starlark::parse(source).unwrap();
        let decls = scan_file(&file, Path::new("WORKSPACE")).unwrap();
        upgrade_constraint(&decls[0].comments).unwrap()
    }

    #[test]
    fn test_no_sentinel_means_any() {
        let spec = constraint_of("# just a note\nhttp_archive(name = \"x\")\n");
        assert_eq!(spec, VersionSpec::Any);
    }

    #[test]
    fn test_leading_sentinel() {
        let spec = constraint_of("# bcu: ^0.19\nhttp_archive(name = \"x\")\n");
        assert_eq!(spec, VersionSpec::Caret(Version::new(0, 19, 0)));
    }

    #[test]
    fn test_trailing_sentinel() {
        let spec = constraint_of("http_archive(name = \"x\")  # bcu: <2.0.0\n");
        assert_eq!(spec, VersionSpec::LessThan(Version::new(2, 0, 0)));
    }

    #[test]
    fn test_leading_wins_over_trailing() {
        let spec = constraint_of("# bcu: ==1.2.3\nhttp_archive(name = \"x\")  # bcu: <9\n");
        assert_eq!(spec, VersionSpec::Pinned(Version::new(1, 2, 3)));
    }

    #[test]
    fn test_first_leading_sentinel_wins() {
        let spec = constraint_of("# bcu: ~1.2\n# bcu: >3\nhttp_archive(name = \"x\")\n");
        assert_eq!(spec, VersionSpec::Tilde(Version::new(1, 2, 0)));
    }

    #[test]
    fn test_sentinel_between_arguments() {
        let spec = constraint_of(
            "http_archive(\n    name = \"x\",\n    # bcu: 1.2.*\n    sha256 = \"abc\",\n)\n",
        );
        assert_eq!(
            spec,
            VersionSpec::Wildcard {
                prefix: "1.2".to_string()
            }
        );
    }

    #[test]
    fn test_malformed_expression_errors() {
        let file = starlark::parse("# bcu: ^oops\nhttp_archive(name = \"x\")\n").unwrap();
        let decls = scan_file(&file, Path::new("WORKSPACE")).unwrap();
        assert!(upgrade_constraint(&decls[0].comments).is_err());
    }
}
