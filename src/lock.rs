//! Single-instance lock for continuous sessions.
//!
//! Two continuous sessions would fight over the same gamma ramps, so the
//! binary takes an exclusive `fs2` lock on a file in the runtime directory
//! before creating its backend. The lock file holds the owner's PID.

use anyhow::{Context, Result};
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::constants::LOCK_FILE_NAME;
use crate::logger::Log;

/// Held exclusive lock. Dropping it unlocks and removes the file.
#[derive(Debug)]
pub struct InstanceLock {
    file: File,
    path: PathBuf,
}

impl InstanceLock {
    /// `$XDG_RUNTIME_DIR/solarshift.lock`, falling back to the temp directory.
    pub fn default_path() -> PathBuf {
        std::env::var_os("XDG_RUNTIME_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(std::env::temp_dir)
            .join(LOCK_FILE_NAME)
    }

    /// Take the lock at `path`.
    ///
    /// The file is opened without truncation so a running owner's PID stays
    /// readable when the lock is refused.
    ///
    /// # Errors
    /// Returns an error naming the owner if another process holds the lock.
    pub fn acquire(path: &Path) -> Result<Self> {
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .with_context(|| format!("Failed to open lock file {}", path.display()))?;

        if file.try_lock_exclusive().is_err() {
            let owner = fs::read_to_string(path)
                .ok()
                .and_then(|content| content.trim().parse::<u32>().ok());
            match owner {
                Some(pid) => anyhow::bail!(
                    "Another instance of solarshift is already running (PID {})",
                    pid
                ),
                None => anyhow::bail!("Another instance of solarshift is already running"),
            }
        }

        file.set_len(0)
            .and_then(|_| file.seek(SeekFrom::Start(0)))
            .and_then(|_| writeln!(file, "{}", std::process::id()))
            .and_then(|_| file.flush())
            .with_context(|| format!("Failed to write lock file {}", path.display()))?;

        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for InstanceLock {
    fn drop(&mut self) {
        // Remove before unlocking so a waiting instance never sees our PID
        if let Err(e) = fs::remove_file(&self.path) {
            Log::log_warning(&format!("Failed to remove lock file: {}", e));
        }
        let _ = FileExt::unlock(&self.file);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_lock_writes_pid_and_cleans_up() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("test.lock");

        let lock = InstanceLock::acquire(&path).unwrap();
        let content = fs::read_to_string(lock.path()).unwrap();
        assert_eq!(content.trim(), std::process::id().to_string());

        drop(lock);
        assert!(!path.exists());
    }

    #[test]
    fn test_second_acquire_is_refused() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("test.lock");

        let _first = InstanceLock::acquire(&path).unwrap();
        let err = InstanceLock::acquire(&path).unwrap_err();
        assert!(err.to_string().contains("already running"));
        assert!(err.to_string().contains(&std::process::id().to_string()));

        // Refusal must not clobber the owner's PID
        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content.trim(), std::process::id().to_string());
    }

    #[test]
    fn test_stale_file_is_reused() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("test.lock");
        fs::write(&path, "99999999\nleftover\n").unwrap();

        let lock = InstanceLock::acquire(&path).unwrap();
        let content = fs::read_to_string(lock.path()).unwrap();
        assert_eq!(content.trim(), std::process::id().to_string());
    }
}
