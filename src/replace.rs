use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// One pending substitution: on `line` of `file`, replace every occurrence
/// of `find` with `substitution`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit {
    pub file: PathBuf,
    pub line: usize,
    pub find: String,
    pub substitution: String,
}

/// Apply edits to file content line by line.
///
/// Splitting on '\n' keeps the trailing newline and any '\r' endings
/// byte-identical; only the replaced tokens change. Lines are 1-based and
/// out-of-range edits are skipped. Edits targeting the same line apply in
/// order, each replacing all occurrences of its own find text.
pub fn apply_edits(content: &str, edits: &[Edit]) -> String {
    let mut lines: Vec<String> = content.split('\n').map(String::from).collect();
    for edit in edits {
        let Some(line) = edit.line.checked_sub(1).and_then(|i| lines.get_mut(i)) else {
            continue;
        };
        *line = line.replace(&edit.find, &edit.substitution);
    }
    lines.join("\n")
}

/// Read `path`, apply the edits, and write the result back in place
pub fn rewrite_file(path: &Path, edits: &[Edit]) -> Result<()> {
    let content =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let updated = apply_edits(&content, edits);
    fs::write(path, updated).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}
