//! Path validation: confine tool paths to the sandbox root.
//!
//! Relative paths are joined onto the root; absolute paths are accepted only
//! when they already point inside it. `..` components are folded lexically and
//! the result is canonicalized so symlinks cannot lead outside.

use std::path::{Component, Path, PathBuf};
use tracing::debug;

/// Error returned when path validation fails.
#[derive(Debug, thiserror::Error)]
pub enum PathValidationError {
    #[error("path '{path}' is outside the sandbox root")]
    OutsideSandbox { path: String },

    #[error("sandbox root '{root}' is not usable: {reason}")]
    InvalidRoot { root: String, reason: String },

    #[error("failed to canonicalize path '{path}': {reason}")]
    CanonicalizeFailed { path: String, reason: String },
}

/// Resolve `requested` against `root` and check that it stays inside.
///
/// An empty request (or `.`) resolves to the root itself. The returned path is
/// canonical when it exists; for a missing path the deepest existing ancestor
/// is canonicalized and the remainder appended, so callers can still report
/// "not found" for paths that are inside the sandbox.
pub fn resolve_in_sandbox(root: &Path, requested: &str) -> Result<PathBuf, PathValidationError> {
    let canonical_root = root
        .canonicalize()
        .map_err(|e| PathValidationError::InvalidRoot {
            root: root.display().to_string(),
            reason: e.to_string(),
        })?;

    let requested = requested.trim();
    if requested.is_empty() || requested == "." {
        return Ok(canonical_root);
    }

    let raw = Path::new(requested);
    let candidate = if raw.is_absolute() {
        raw.to_path_buf()
    } else {
        canonical_root.join(raw)
    };

    let normalized = normalize_lexically(&candidate);
    let resolved = canonicalize_existing_prefix(&normalized).map_err(|reason| {
        PathValidationError::CanonicalizeFailed {
            path: requested.into(),
            reason,
        }
    })?;

    if !resolved.starts_with(&canonical_root) {
        debug!(path = %requested, root = %canonical_root.display(), "Rejected path outside sandbox");
        return Err(PathValidationError::OutsideSandbox {
            path: requested.into(),
        });
    }

    Ok(resolved)
}

/// Fold `.` and `..` without touching the filesystem.
fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                // Popping past the filesystem root is a no-op, same as the OS.
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Canonicalize the deepest existing ancestor and re-attach the missing tail.
fn canonicalize_existing_prefix(path: &Path) -> Result<PathBuf, String> {
    if path.exists() {
        return path.canonicalize().map_err(|e| e.to_string());
    }

    let mut tail = Vec::new();
    let mut cursor = path;
    while let Some(parent) = cursor.parent() {
        if let Some(name) = cursor.file_name() {
            tail.push(name.to_os_string());
        }
        if parent.exists() {
            let mut resolved = parent.canonicalize().map_err(|e| e.to_string())?;
            for name in tail.iter().rev() {
                resolved.push(name);
            }
            return Ok(resolved);
        }
        cursor = parent;
    }

    Ok(path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn sandbox() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("src")).unwrap();
        fs::write(dir.path().join("src/main.rs"), "fn main() {}").unwrap();
        fs::write(dir.path().join("README.md"), "# readme").unwrap();
        dir
    }

    #[test]
    fn empty_request_is_root() {
        let dir = sandbox();
        let resolved = resolve_in_sandbox(dir.path(), "").unwrap();
        assert_eq!(resolved, dir.path().canonicalize().unwrap());
        assert_eq!(resolve_in_sandbox(dir.path(), ".").unwrap(), resolved);
    }

    #[test]
    fn relative_path_resolves_under_root() {
        let dir = sandbox();
        let resolved = resolve_in_sandbox(dir.path(), "src/main.rs").unwrap();
        assert!(resolved.ends_with("src/main.rs"));
        assert!(resolved.starts_with(dir.path().canonicalize().unwrap()));
    }

    #[test]
    fn absolute_path_outside_root_blocked() {
        let dir = sandbox();
        match resolve_in_sandbox(dir.path(), "/etc/passwd") {
            Err(PathValidationError::OutsideSandbox { path }) => assert_eq!(path, "/etc/passwd"),
            other => panic!("Expected OutsideSandbox, got: {other:?}"),
        }
    }

    #[test]
    fn absolute_path_inside_root_allowed() {
        let dir = sandbox();
        let inside = dir.path().canonicalize().unwrap().join("README.md");
        let resolved = resolve_in_sandbox(dir.path(), inside.to_str().unwrap()).unwrap();
        assert_eq!(resolved, inside);
    }

    #[test]
    fn path_traversal_blocked() {
        let dir = sandbox();
        let result = resolve_in_sandbox(dir.path(), "../../../etc/passwd");
        assert!(matches!(result, Err(PathValidationError::OutsideSandbox { .. })));
    }

    #[test]
    fn traversal_that_stays_inside_is_allowed() {
        let dir = sandbox();
        let resolved = resolve_in_sandbox(dir.path(), "src/../README.md").unwrap();
        assert!(resolved.ends_with("README.md"));
    }

    #[test]
    fn missing_path_inside_root_resolves() {
        let dir = sandbox();
        let resolved = resolve_in_sandbox(dir.path(), "missing/deeper.txt").unwrap();
        assert!(resolved.starts_with(dir.path().canonicalize().unwrap()));
        assert!(!resolved.exists());
    }

    #[test]
    fn sibling_with_common_prefix_blocked() {
        let parent = tempfile::tempdir().unwrap();
        let root = parent.path().join("repo");
        let sibling = parent.path().join("repo2");
        fs::create_dir(&root).unwrap();
        fs::create_dir(&sibling).unwrap();
        let result = resolve_in_sandbox(&root, sibling.to_str().unwrap());
        assert!(matches!(result, Err(PathValidationError::OutsideSandbox { .. })));
    }

    #[cfg(unix)]
    #[test]
    fn symlink_escape_blocked() {
        let dir = sandbox();
        let outside = tempfile::tempdir().unwrap();
        fs::write(outside.path().join("secret.txt"), "secret").unwrap();
        std::os::unix::fs::symlink(outside.path(), dir.path().join("link")).unwrap();
        let result = resolve_in_sandbox(dir.path(), "link/secret.txt");
        assert!(matches!(result, Err(PathValidationError::OutsideSandbox { .. })));
    }

    #[test]
    fn missing_root_rejected() {
        let result = resolve_in_sandbox(Path::new("/nonexistent/repochat/root"), "file.txt");
        assert!(matches!(result, Err(PathValidationError::InvalidRoot { .. })));
    }
}
