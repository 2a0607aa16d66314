//! Sandboxed filesystem capability.
//!
//! The terminal never owns filesystem state; it issues commands through the
//! [`Filesystem`] trait and receives text or typed [`FsError`]s. The default
//! implementation, [`SandboxFs`], maps a virtual Linux-like tree onto a
//! single rooted host directory and refuses to step outside it.

use std::path::PathBuf;

use async_trait::async_trait;

use crate::errors::FsError;

/// Home directory inside the virtual tree.
pub const HOME_DIR: &str = "/home/user";

/// Directories seeded into a fresh sandbox.
const SEED_DIRS: &[&str] = &[
    "home",
    "home/user",
    "home/user/documents",
    "home/user/downloads",
    "bin",
    "etc",
    "usr",
    "usr/bin",
    "usr/local",
    "var",
    "tmp",
];

/// Filesystem capability consumed by the command dispatcher.
///
/// All paths are virtual absolute paths (`/home/user/notes.txt`); callers
/// resolve relative arguments against the session's working directory
/// before calling in.
#[async_trait]
pub trait Filesystem: Send + Sync {
    /// List a directory: one `d name/` or `- name` line per entry, sorted,
    /// or `Empty directory`.
    async fn list(&self, path: &str) -> Result<String, FsError>;

    /// Create a directory (and missing parents).
    async fn make_dir(&self, path: &str) -> Result<(), FsError>;

    /// Remove a file, or a directory when `recursive` is set.
    async fn remove(&self, path: &str, recursive: bool) -> Result<(), FsError>;

    /// Create an empty file, or update its timestamp if it exists.
    async fn touch(&self, path: &str) -> Result<(), FsError>;

    /// Read a file's contents.
    async fn read(&self, path: &str) -> Result<String, FsError>;

    /// Write content to a file, creating parents as needed.
    async fn write(&self, path: &str, content: &str) -> Result<(), FsError>;

    /// Resolve a `cd` target against the current directory.
    ///
    /// `~` goes home, `..` goes to the parent, a leading `/` is absolute,
    /// anything else is joined onto `current`. A missing or non-directory
    /// target is a no-op: the unchanged `current` is returned, not an error.
    async fn change_directory(&self, current: &str, target: &str) -> Result<String, FsError>;

    /// Host-side location of a virtual path, for the external code
    /// executor collaborator.
    fn host_path(&self, path: &str) -> Result<PathBuf, FsError>;
}

/// Normalize a virtual path: collapse `.` and `..` components, clamping at
/// the root so `..` can never escape the tree.
pub fn normalize_virtual(path: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for comp in path.split('/') {
        match comp {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            other => parts.push(other),
        }
    }
    if parts.is_empty() {
        "/".to_string()
    } else {
        format!("/{}", parts.join("/"))
    }
}

/// Join a possibly-relative argument onto a current directory, producing a
/// normalized virtual absolute path. `~` expands to the home directory.
pub fn resolve_virtual(current: &str, arg: &str) -> String {
    if arg == "~" {
        return HOME_DIR.to_string();
    }
    if let Some(rest) = arg.strip_prefix("~/") {
        return normalize_virtual(&format!("{}/{}", HOME_DIR, rest));
    }
    if arg.starts_with('/') {
        return normalize_virtual(arg);
    }
    normalize_virtual(&format!("{}/{}", current, arg))
}

/// Parent of a virtual path (`/home/user` → `/home`; `/` → `/`).
pub fn virtual_parent(path: &str) -> String {
    let normalized = normalize_virtual(path);
    match normalized.rfind('/') {
        Some(0) | None => "/".to_string(),
        Some(idx) => normalized[..idx].to_string(),
    }
}

/// A virtual filesystem rooted at a host directory.
pub struct SandboxFs {
    root: PathBuf,
}

impl SandboxFs {
    /// Open a sandbox at `root`, seeding the standard tree on first use.
    pub async fn init(root: PathBuf) -> Result<Self, FsError> {
        let fresh = !root.exists();
        tokio::fs::create_dir_all(&root).await?;
        if fresh {
            for dir in SEED_DIRS {
                tokio::fs::create_dir_all(root.join(dir)).await?;
            }
            tokio::fs::write(root.join("home/user/.bashrc"), "# .bashrc\n").await?;
        }
        Ok(Self { root })
    }

    /// Map a virtual path to its host path. Normalization happens first,
    /// so the result can never leave the root.
    fn real(&self, virtual_path: &str) -> PathBuf {
        let normalized = normalize_virtual(virtual_path);
        self.root.join(normalized.trim_start_matches('/'))
    }
}

#[async_trait]
impl Filesystem for SandboxFs {
    async fn list(&self, path: &str) -> Result<String, FsError> {
        let dir = self.real(path);
        if !dir.exists() {
            return Err(FsError::NotFound(path.to_string()));
        }
        if !dir.is_dir() {
            return Err(FsError::NotADirectory(path.to_string()));
        }

        let mut entries = tokio::fs::read_dir(&dir).await?;
        let mut items: Vec<(bool, String)> = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name().to_string_lossy().to_string();
            let is_dir = entry
                .file_type()
                .await
                .map(|ft| ft.is_dir())
                .unwrap_or(false);
            items.push((is_dir, name));
        }

        if items.is_empty() {
            return Ok("Empty directory".to_string());
        }

        items.sort_by(|a, b| a.1.cmp(&b.1));
        let lines: Vec<String> = items
            .into_iter()
            .map(|(is_dir, name)| {
                if is_dir {
                    format!("d {}/", name)
                } else {
                    format!("- {}", name)
                }
            })
            .collect();
        Ok(lines.join("\n"))
    }

    async fn make_dir(&self, path: &str) -> Result<(), FsError> {
        let dir = self.real(path);
        if dir.exists() {
            return Err(FsError::AlreadyExists(path.to_string()));
        }
        tokio::fs::create_dir_all(&dir).await?;
        Ok(())
    }

    async fn remove(&self, path: &str, recursive: bool) -> Result<(), FsError> {
        let target = self.real(path);
        if normalize_virtual(path) == "/" {
            return Err(FsError::AccessDenied(path.to_string()));
        }
        if !target.exists() {
            return Err(FsError::NotFound(path.to_string()));
        }
        if target.is_dir() {
            if !recursive {
                return Err(FsError::NotAFile(format!("{} is a directory", path)));
            }
            tokio::fs::remove_dir_all(&target).await?;
        } else {
            tokio::fs::remove_file(&target).await?;
        }
        Ok(())
    }

    async fn touch(&self, path: &str) -> Result<(), FsError> {
        let file = self.real(path);
        if let Some(parent) = file.parent() {
            if !parent.exists() {
                return Err(FsError::NotFound(path.to_string()));
            }
        }
        if !file.exists() {
            tokio::fs::write(&file, "").await?;
        } else {
            // Refresh mtime by rewriting existing content.
            let content = tokio::fs::read(&file).await?;
            tokio::fs::write(&file, content).await?;
        }
        Ok(())
    }

    async fn read(&self, path: &str) -> Result<String, FsError> {
        let file = self.real(path);
        if !file.exists() {
            return Err(FsError::NotFound(path.to_string()));
        }
        if !file.is_file() {
            return Err(FsError::NotAFile(path.to_string()));
        }
        Ok(tokio::fs::read_to_string(&file).await?)
    }

    async fn write(&self, path: &str, content: &str) -> Result<(), FsError> {
        let file = self.real(path);
        if let Some(parent) = file.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&file, content).await?;
        Ok(())
    }

    async fn change_directory(&self, current: &str, target: &str) -> Result<String, FsError> {
        let candidate = if target.is_empty() {
            "/".to_string()
        } else if target == "~" || target.starts_with("~/") {
            resolve_virtual(current, target)
        } else if target == ".." {
            virtual_parent(current)
        } else {
            resolve_virtual(current, target)
        };

        let real = self.real(&candidate);
        if !real.exists() || !real.is_dir() {
            return Ok(current.to_string());
        }
        Ok(candidate)
    }

    fn host_path(&self, path: &str) -> Result<PathBuf, FsError> {
        Ok(self.real(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn sandbox() -> (TempDir, SandboxFs) {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("tree");
        let fs = SandboxFs::init(root).await.unwrap();
        (dir, fs)
    }

    // -- path helper tests --

    #[test]
    fn test_normalize_collapses_dots() {
        assert_eq!(normalize_virtual("/home/user/../user/./docs"), "/home/user/docs");
    }

    #[test]
    fn test_normalize_clamps_at_root() {
        assert_eq!(normalize_virtual("/../../etc"), "/etc");
        assert_eq!(normalize_virtual("/.."), "/");
    }

    #[test]
    fn test_resolve_relative() {
        assert_eq!(resolve_virtual("/home/user", "notes.txt"), "/home/user/notes.txt");
    }

    #[test]
    fn test_resolve_absolute() {
        assert_eq!(resolve_virtual("/home/user", "/tmp/x"), "/tmp/x");
    }

    #[test]
    fn test_resolve_tilde() {
        assert_eq!(resolve_virtual("/tmp", "~"), "/home/user");
        assert_eq!(resolve_virtual("/tmp", "~/docs"), "/home/user/docs");
    }

    #[test]
    fn test_virtual_parent() {
        assert_eq!(virtual_parent("/home/user"), "/home");
        assert_eq!(virtual_parent("/home"), "/");
        assert_eq!(virtual_parent("/"), "/");
    }

    // -- SandboxFs tests --

    #[tokio::test]
    async fn test_init_seeds_tree() {
        let (_guard, fs) = sandbox().await;
        let listing = fs.list("/home/user").await.unwrap();
        assert!(listing.contains("d documents/"));
        assert!(listing.contains("d downloads/"));
        assert!(listing.contains("- .bashrc"));
    }

    #[tokio::test]
    async fn test_write_and_read() {
        let (_guard, fs) = sandbox().await;
        fs.write("/home/user/hello.txt", "hi").await.unwrap();
        assert_eq!(fs.read("/home/user/hello.txt").await.unwrap(), "hi");
    }

    #[tokio::test]
    async fn test_read_missing_is_not_found() {
        let (_guard, fs) = sandbox().await;
        let err = fs.read("/home/user/ghost").await.unwrap_err();
        assert!(matches!(err, FsError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_mkdir_then_exists_fails() {
        let (_guard, fs) = sandbox().await;
        fs.make_dir("/home/user/proj").await.unwrap();
        let err = fs.make_dir("/home/user/proj").await.unwrap_err();
        assert!(matches!(err, FsError::AlreadyExists(_)));
    }

    #[tokio::test]
    async fn test_remove_dir_requires_recursive() {
        let (_guard, fs) = sandbox().await;
        fs.make_dir("/home/user/proj").await.unwrap();
        assert!(fs.remove("/home/user/proj", false).await.is_err());
        fs.remove("/home/user/proj", true).await.unwrap();
        assert!(fs.list("/home/user/proj").await.is_err());
    }

    #[tokio::test]
    async fn test_touch_creates_empty_file() {
        let (_guard, fs) = sandbox().await;
        fs.touch("/home/user/empty").await.unwrap();
        assert_eq!(fs.read("/home/user/empty").await.unwrap(), "");
    }

    #[tokio::test]
    async fn test_cd_parent() {
        let (_guard, fs) = sandbox().await;
        let dir = fs.change_directory("/home/user", "..").await.unwrap();
        assert_eq!(dir, "/home");
    }

    #[tokio::test]
    async fn test_cd_home() {
        let (_guard, fs) = sandbox().await;
        let dir = fs.change_directory("/var", "~").await.unwrap();
        assert_eq!(dir, "/home/user");
    }

    #[tokio::test]
    async fn test_cd_nonexistent_is_noop() {
        let (_guard, fs) = sandbox().await;
        let dir = fs.change_directory("/home/user", "nonexistent").await.unwrap();
        assert_eq!(dir, "/home/user");
    }

    #[tokio::test]
    async fn test_cd_to_file_is_noop() {
        let (_guard, fs) = sandbox().await;
        fs.write("/home/user/f.txt", "x").await.unwrap();
        let dir = fs.change_directory("/home/user", "f.txt").await.unwrap();
        assert_eq!(dir, "/home/user");
    }

    #[tokio::test]
    async fn test_escape_attempt_stays_inside_root() {
        let (_guard, fs) = sandbox().await;
        // "/../../etc" normalizes to "/etc", which the seed tree contains.
        let listing = fs.list("/../../etc").await.unwrap();
        assert_eq!(listing, "Empty directory");
    }

    #[tokio::test]
    async fn test_list_empty_directory() {
        let (_guard, fs) = sandbox().await;
        assert_eq!(fs.list("/tmp").await.unwrap(), "Empty directory");
    }
}
