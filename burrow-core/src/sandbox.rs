//! Path Sandbox
//!
//! Resolves untrusted relative paths against the configured working-directory
//! root. Validation is re-derived on every call; nothing about a previous
//! resolution is cached.

use std::io;
use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Rejection from the sandbox resolver. A normal return value, never a panic.
#[derive(Debug, Error)]
pub enum SandboxError {
    /// The candidate path escapes the working-directory root.
    #[error("Cannot access \"{path}\" as it is outside the permitted working directory")]
    OutsideRoot { path: String },

    /// The root (or an existing ancestor of the candidate) could not be
    /// canonicalized.
    #[error("failed to resolve \"{path}\": {source}")]
    Resolve {
        path: String,
        #[source]
        source: io::Error,
    },
}

// ---------------------------------------------------------------------------
// Sandbox root
// ---------------------------------------------------------------------------

/// The configured working-directory root. Tool calls may not read, write,
/// list, or execute outside it.
#[derive(Debug, Clone)]
pub struct SandboxRoot {
    root: PathBuf,
}

/// A resolved absolute path proven to lie within the root at resolution time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SandboxPath {
    absolute: PathBuf,
}

impl SandboxPath {
    pub fn as_path(&self) -> &Path {
        &self.absolute
    }
}

impl AsRef<Path> for SandboxPath {
    fn as_ref(&self) -> &Path {
        &self.absolute
    }
}

impl SandboxRoot {
    /// Create a sandbox rooted at `root`. The directory must exist.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let metadata = std::fs::metadata(&root)
            .with_context(|| format!("working directory \"{}\" is not accessible", root.display()))?;
        if !metadata.is_dir() {
            anyhow::bail!("working directory \"{}\" is not a directory", root.display());
        }
        Ok(Self { root })
    }

    /// The configured (un-canonicalized) root path.
    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Resolve an untrusted relative path to an absolute path inside the
    /// root, or reject it.
    ///
    /// Both the root and the joined candidate are canonicalized (resolving
    /// `.`, `..`, and symlinks). Containment is checked component-wise, so a
    /// sibling whose name merely shares a string prefix with the root
    /// (`/work` vs `/workspace`) is rejected. Candidates that do not exist
    /// yet are resolved through their deepest existing ancestor, which keeps
    /// `write_file` destinations checkable.
    pub fn resolve(&self, relative: &str) -> Result<SandboxPath, SandboxError> {
        let root = std::fs::canonicalize(&self.root).map_err(|source| SandboxError::Resolve {
            path: self.root.display().to_string(),
            source,
        })?;

        let joined = root.join(relative);
        let normalized = normalize_lexically(&joined);
        let absolute =
            resolve_existing_prefix(&normalized).map_err(|source| SandboxError::Resolve {
                path: relative.to_string(),
                source,
            })?;

        if absolute.starts_with(&root) {
            Ok(SandboxPath { absolute })
        } else {
            Err(SandboxError::OutsideRoot {
                path: relative.to_string(),
            })
        }
    }
}

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

/// Remove `.` components and apply `..` lexically. `..` at the filesystem
/// root stays at the root.
fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Canonicalize the deepest existing ancestor of `path` (resolving
/// symlinks), then re-append the components that do not exist yet.
fn resolve_existing_prefix(path: &Path) -> io::Result<PathBuf> {
    let mut existing: &Path = path;
    let mut pending: Vec<std::ffi::OsString> = Vec::new();

    while !existing.exists() {
        match (existing.file_name(), existing.parent()) {
            (Some(name), Some(parent)) => {
                pending.push(name.to_os_string());
                existing = parent;
            }
            _ => break,
        }
    }

    let mut resolved = existing.canonicalize()?;
    for name in pending.iter().rev() {
        resolved.push(name);
    }
    Ok(resolved)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn sandbox() -> (tempfile::TempDir, SandboxRoot) {
        let dir = tempfile::tempdir().unwrap();
        let root = SandboxRoot::new(dir.path()).unwrap();
        (dir, root)
    }

    #[test]
    fn accepts_root_itself() {
        let (dir, root) = sandbox();
        let resolved = root.resolve(".").unwrap();
        assert_eq!(resolved.as_path(), dir.path().canonicalize().unwrap());
    }

    #[test]
    fn accepts_nested_nonexistent_target() {
        let (dir, root) = sandbox();
        let resolved = root.resolve("sub/new.txt").unwrap();
        assert!(resolved
            .as_path()
            .starts_with(dir.path().canonicalize().unwrap()));
        assert!(resolved.as_path().ends_with("sub/new.txt"));
    }

    #[test]
    fn rejects_parent_traversal() {
        let (_dir, root) = sandbox();
        let err = root.resolve("../escape.txt").unwrap_err();
        assert!(matches!(err, SandboxError::OutsideRoot { .. }));
        assert!(err.to_string().contains("../escape.txt"));
    }

    #[test]
    fn rejects_deep_traversal_through_nonexistent_dirs() {
        let (_dir, root) = sandbox();
        let err = root.resolve("newdir/../../../../etc/passwd").unwrap_err();
        assert!(matches!(err, SandboxError::OutsideRoot { .. }));
    }

    #[test]
    fn rejects_absolute_path_outside_root() {
        let (_dir, root) = sandbox();
        let err = root.resolve("/etc/passwd").unwrap_err();
        assert!(matches!(err, SandboxError::OutsideRoot { .. }));
    }

    #[test]
    fn rejects_sibling_sharing_root_name_prefix() {
        // root `<base>/work` must not accept `<base>/workspace/evil` even
        // though the string "<base>/workspace" starts with "<base>/work".
        let base = tempfile::tempdir().unwrap();
        std::fs::create_dir(base.path().join("work")).unwrap();
        std::fs::create_dir(base.path().join("workspace")).unwrap();
        let root = SandboxRoot::new(base.path().join("work")).unwrap();

        let err = root.resolve("../workspace/evil").unwrap_err();
        assert!(matches!(err, SandboxError::OutsideRoot { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn rejects_symlink_escape() {
        let outside = tempfile::tempdir().unwrap();
        std::fs::write(outside.path().join("secret.txt"), "secret").unwrap();

        let (dir, root) = sandbox();
        std::os::unix::fs::symlink(outside.path(), dir.path().join("link")).unwrap();

        let err = root.resolve("link/secret.txt").unwrap_err();
        assert!(matches!(err, SandboxError::OutsideRoot { .. }));
    }

    #[test]
    fn revalidates_on_every_call() {
        let (dir, root) = sandbox();
        assert!(root.resolve("a.txt").is_ok());
        // A second call re-derives the same result from scratch.
        assert!(root.resolve("a.txt").is_ok());
        drop(dir);
        // Root gone: resolution now fails instead of reusing stale state.
        assert!(matches!(
            root.resolve("a.txt"),
            Err(SandboxError::Resolve { .. })
        ));
    }

    #[test]
    fn new_rejects_missing_root() {
        assert!(SandboxRoot::new("/definitely/not/a/real/dir").is_err());
    }
}
