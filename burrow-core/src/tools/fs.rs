//! Filesystem tools: directory listing, bounded file reads, file writes.

use tracing::debug;

use crate::sandbox::SandboxRoot;
use crate::tools::ToolError;

/// List the immediate entries of `directory`, one line per entry.
///
/// No ordering is imposed beyond the platform's native enumeration order.
pub async fn list_directory(root: &SandboxRoot, directory: &str) -> Result<String, ToolError> {
    let path = root.resolve(directory)?;

    let metadata = tokio::fs::metadata(path.as_path())
        .await
        .map_err(|_| ToolError::NotADirectory(directory.to_string()))?;
    if !metadata.is_dir() {
        return Err(ToolError::NotADirectory(directory.to_string()));
    }

    let mut entries = tokio::fs::read_dir(path.as_path()).await?;
    let mut lines = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let metadata = entry.metadata().await?;
        lines.push(format!(
            "{}: size={} bytes, is_dir={}",
            entry.file_name().to_string_lossy(),
            metadata.len(),
            metadata.is_dir()
        ));
    }

    debug!(directory, entries = lines.len(), "listed directory");
    Ok(lines.join("\n"))
}

/// Read `file_path`, truncating at `limit` characters with an explicit
/// truncation marker.
pub async fn read_file(
    root: &SandboxRoot,
    file_path: &str,
    limit: usize,
) -> Result<String, ToolError> {
    let path = root.resolve(file_path)?;

    let metadata = tokio::fs::metadata(path.as_path())
        .await
        .map_err(|_| ToolError::NotAFile(file_path.to_string()))?;
    if !metadata.is_file() {
        return Err(ToolError::NotAFile(file_path.to_string()));
    }

    let raw = tokio::fs::read_to_string(path.as_path()).await?;
    if raw.chars().count() > limit {
        let prefix: String = raw.chars().take(limit).collect();
        debug!(file_path, limit, "read truncated");
        return Ok(format!(
            "{prefix}[...File \"{file_path}\" truncated at {limit} characters]"
        ));
    }

    Ok(raw)
}

/// Overwrite `file_path` with `content`, creating missing parent
/// directories.
pub async fn write_file(
    root: &SandboxRoot,
    file_path: &str,
    content: &str,
) -> Result<String, ToolError> {
    let path = root.resolve(file_path)?;

    if let Some(parent) = path.as_path().parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path.as_path(), content).await?;

    let written = content.chars().count();
    debug!(file_path, written, "wrote file");
    Ok(format!(
        "Successfully wrote to \"{file_path}\" ({written} characters written)"
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn sandbox() -> (tempfile::TempDir, SandboxRoot) {
        let dir = tempfile::tempdir().unwrap();
        let root = SandboxRoot::new(dir.path()).unwrap();
        (dir, root)
    }

    #[tokio::test]
    async fn list_reports_every_entry_once() {
        let (dir, root) = sandbox();
        std::fs::write(dir.path().join("a.txt"), "hello").unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();

        let listing = list_directory(&root, ".").await.unwrap();
        let lines: HashSet<&str> = listing.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines.contains("a.txt: size=5 bytes, is_dir=false"), "got: {listing}");
        assert!(lines.iter().any(|l| l.starts_with("sub: size=") && l.ends_with("is_dir=true")));
    }

    #[tokio::test]
    async fn list_is_idempotent_as_a_set() {
        let (dir, root) = sandbox();
        for name in ["x.txt", "y.txt", "z.txt"] {
            std::fs::write(dir.path().join(name), "1").unwrap();
        }

        let first: HashSet<String> = list_directory(&root, ".")
            .await
            .unwrap()
            .lines()
            .map(String::from)
            .collect();
        let second: HashSet<String> = list_directory(&root, ".")
            .await
            .unwrap()
            .lines()
            .map(String::from)
            .collect();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn list_rejects_file_target() {
        let (dir, root) = sandbox();
        std::fs::write(dir.path().join("a.txt"), "hello").unwrap();

        let err = list_directory(&root, "a.txt").await.unwrap_err();
        assert!(matches!(err, ToolError::NotADirectory(_)));
        assert_eq!(err.to_string(), "\"a.txt\" is not a directory");
    }

    #[tokio::test]
    async fn list_outside_root_is_rejected() {
        let (_dir, root) = sandbox();
        let err = list_directory(&root, "../..").await.unwrap_err();
        assert!(err
            .to_string()
            .contains("outside the permitted working directory"));
    }

    #[tokio::test]
    async fn write_then_read_round_trip() {
        let (_dir, root) = sandbox();
        let content = "line one\nline two\n";

        let confirmation = write_file(&root, "notes/out.txt", content).await.unwrap();
        assert_eq!(
            confirmation,
            format!(
                "Successfully wrote to \"notes/out.txt\" ({} characters written)",
                content.chars().count()
            )
        );

        let read_back = read_file(&root, "notes/out.txt", 10_000).await.unwrap();
        assert_eq!(read_back, content);
    }

    #[tokio::test]
    async fn read_truncates_at_character_budget() {
        let (_dir, root) = sandbox();
        let content = "x".repeat(150);
        write_file(&root, "big.txt", &content).await.unwrap();

        let result = read_file(&root, "big.txt", 100).await.unwrap();
        assert!(result.starts_with(&"x".repeat(100)));
        assert!(result.contains("[...File \"big.txt\" truncated at 100 characters]"));
        // prefix is exactly the budget
        let marker_at = result.find("[...File").unwrap();
        assert_eq!(marker_at, 100);
    }

    #[tokio::test]
    async fn read_missing_file() {
        let (_dir, root) = sandbox();
        let err = read_file(&root, "ghost.txt", 100).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "File not found or is not a regular file: \"ghost.txt\""
        );
    }

    #[tokio::test]
    async fn read_outside_root_never_touches_filesystem() {
        let (_dir, root) = sandbox();
        let err = read_file(&root, "../../etc/hostname", 100).await.unwrap_err();
        assert!(matches!(err, ToolError::Sandbox(_)));
    }

    #[tokio::test]
    async fn write_overwrites_existing_content() {
        let (_dir, root) = sandbox();
        write_file(&root, "f.txt", "old content").await.unwrap();
        write_file(&root, "f.txt", "new").await.unwrap();

        let read_back = read_file(&root, "f.txt", 100).await.unwrap();
        assert_eq!(read_back, "new");
    }

    #[tokio::test]
    async fn write_outside_root_is_rejected() {
        let (_dir, root) = sandbox();
        let err = write_file(&root, "../evil.txt", "nope").await.unwrap_err();
        assert!(matches!(err, ToolError::Sandbox(_)));
    }
}
