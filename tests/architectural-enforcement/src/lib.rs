//! Architectural Enforcement Integration Tests
//!
//! This package contains integration tests that enforce architectural principles:
//! - No blocking sleeps in production code; all waiting goes through Tokio timers
//! - No panicking shortcuts (`unwrap`, `expect`) outside tests
//! - The core library stays free of rendering and terminal dependencies
//!
//! The helpers below scan source trees; the checks themselves live in `tests/`.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

/// A forbidden pattern found in production code
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// File containing the match
    pub path: PathBuf,
    /// 1-based line number
    pub line: usize,
    /// The offending line, trimmed
    pub text: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}: {}", self.path.display(), self.line, self.text)
    }
}

/// Root of the workspace this crate lives in
pub fn workspace_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .ancestors()
        .nth(2)
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
}

/// Every `.rs` file under `dir`, sorted
pub fn rust_sources(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .map(walkdir::DirEntry::into_path)
        .filter(|p| p.extension().is_some_and(|ext| ext == "rs"))
        .collect();
    files.sort();
    files
}

/// Lines of `content` that belong to production code
///
/// Everything from the first `#[cfg(test)]` on is treated as test code, as
/// are line comments and doc comments.
pub fn production_lines(content: &str) -> impl Iterator<Item = (usize, &str)> {
    content
        .lines()
        .enumerate()
        .take_while(|(_, line)| line.trim() != "#[cfg(test)]")
        .filter(|(_, line)| !line.trim_start().starts_with("//"))
        .map(|(i, line)| (i + 1, line))
}

/// Production lines under `dir` containing any of `needles`
pub fn find_violations(dir: &Path, needles: &[&str]) -> Vec<Violation> {
    let mut violations = Vec::new();
    for path in rust_sources(dir) {
        let Ok(content) = fs::read_to_string(&path) else {
            continue;
        };
        for (line, text) in production_lines(&content) {
            if needles.iter().any(|n| text.contains(n)) {
                violations.push(Violation {
                    path: path.clone(),
                    line,
                    text: text.trim().to_string(),
                });
            }
        }
    }
    violations
}

/// Render violations one per line for an assertion message
pub fn report(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_production_lines_stop_at_test_module() {
        let source = "fn a() {}\n// x.unwrap()\n#[cfg(test)]\nmod tests { fn b() { x.unwrap(); } }\n";
        let lines: Vec<_> = production_lines(source).collect();
        assert_eq!(lines, vec![(1, "fn a() {}")]);
    }

    #[test]
    fn test_workspace_root_has_manifest() {
        assert!(workspace_root().join("Cargo.toml").exists());
    }
}
