// file: src/storage/lock.rs
// description: run-scoped lock file guarding artifacts against concurrent runs
// reference: https://doc.rust-lang.org/std/fs/struct.OpenOptions.html#method.create_new

use crate::error::{PipelineError, Result};
use std::fs::{self, File, OpenOptions};
use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use uuid::Uuid;

pub const LOCK_FILE: &str = ".pipeline.lock";

/// Held for the duration of a pipeline run; the lock file is removed on drop.
///
/// A lock whose recorded pid no longer names a live process is reclaimed by
/// the next `acquire`. Locks that cannot be attributed stay in place until
/// `force_release`.
#[derive(Debug)]
pub struct RunLock {
    path: PathBuf,
    run_id: Uuid,
}

impl RunLock {
    pub fn acquire(root: &Path) -> Result<Self> {
        fs::create_dir_all(root).map_err(|e| PipelineError::storage(root, e))?;

        let path = root.join(LOCK_FILE);
        let run_id = Uuid::new_v4();

        let mut file = match create_lock_file(&path) {
            Err(e) if e.kind() == ErrorKind::AlreadyExists => match holder_pid(&path) {
                Some(pid) if !process_alive(pid) => {
                    warn!(
                        "Reclaiming stale run lock {} left by pid {}",
                        path.display(),
                        pid
                    );
                    match fs::remove_file(&path) {
                        Ok(()) => {}
                        Err(e) if e.kind() == ErrorKind::NotFound => {}
                        Err(e) => return Err(PipelineError::storage(&path, e)),
                    }
                    create_lock_file(&path)
                }
                _ => Err(e),
            },
            other => other,
        }
        .map_err(|e| match e.kind() {
            ErrorKind::AlreadyExists => PipelineError::RunInProgress(path.clone()),
            _ => PipelineError::storage(&path, e),
        })?;

        writeln!(file, "run_id={}\npid={}", run_id, std::process::id())
            .map_err(|e| PipelineError::storage(&path, e))?;

        debug!("Acquired run lock {} ({})", path.display(), run_id);
        Ok(Self { path, run_id })
    }

    /// Removes the lock file regardless of its holder. Returns whether one existed.
    pub fn force_release(root: &Path) -> Result<bool> {
        let path = root.join(LOCK_FILE);
        match fs::remove_file(&path) {
            Ok(()) => {
                info!("Removed run lock {}", path.display());
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(PipelineError::storage(&path, e)),
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }
}

impl Drop for RunLock {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            warn!("Failed to release run lock {}: {}", self.path.display(), e);
        }
    }
}

fn create_lock_file(path: &Path) -> io::Result<File> {
    OpenOptions::new().write(true).create_new(true).open(path)
}

/// Pid recorded by the run that wrote the lock file.
fn holder_pid(path: &Path) -> Option<u32> {
    let content = fs::read_to_string(path).ok()?;
    content
        .lines()
        .find_map(|line| line.strip_prefix("pid="))
        .and_then(|pid| pid.trim().parse().ok())
}

#[cfg(target_os = "linux")]
fn process_alive(pid: u32) -> bool {
    Path::new("/proc").join(pid.to_string()).exists()
}

// No portable liveness check; treat the holder as alive.
#[cfg(not(target_os = "linux"))]
fn process_alive(_pid: u32) -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_second_acquire_fails_while_held() {
        let temp = TempDir::new().unwrap();

        let lock = RunLock::acquire(temp.path()).unwrap();
        let err = RunLock::acquire(temp.path()).unwrap_err();
        assert!(matches!(err, PipelineError::RunInProgress(_)));

        drop(lock);
        assert!(!temp.path().join(LOCK_FILE).exists());
        assert!(RunLock::acquire(temp.path()).is_ok());
    }

    #[test]
    fn test_holder_pid_is_read_back() {
        let temp = TempDir::new().unwrap();
        let lock = RunLock::acquire(temp.path()).unwrap();

        assert_eq!(holder_pid(&temp.path().join(LOCK_FILE)), Some(std::process::id()));
        drop(lock);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_lock_of_dead_process_is_reclaimed() {
        let temp = TempDir::new().unwrap();
        // pid above the kernel's pid_max, so no such process exists
        fs::write(
            temp.path().join(LOCK_FILE),
            format!("run_id={}\npid={}\n", Uuid::new_v4(), u32::MAX),
        )
        .unwrap();

        let lock = RunLock::acquire(temp.path()).unwrap();
        assert_eq!(holder_pid(&temp.path().join(LOCK_FILE)), Some(std::process::id()));
        drop(lock);
    }

    #[test]
    fn test_leaked_guard_is_cleared_by_force_release() {
        let temp = TempDir::new().unwrap();
        std::mem::forget(RunLock::acquire(temp.path()).unwrap());

        // the recorded pid is this live process, so the lock still counts as held
        let err = RunLock::acquire(temp.path()).unwrap_err();
        assert!(matches!(err, PipelineError::RunInProgress(_)));

        assert!(RunLock::force_release(temp.path()).unwrap());
        assert!(!RunLock::force_release(temp.path()).unwrap());
        assert!(RunLock::acquire(temp.path()).is_ok());
    }

    #[test]
    fn test_unattributed_lock_is_not_reclaimed() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(LOCK_FILE), "").unwrap();

        let err = RunLock::acquire(temp.path()).unwrap_err();
        assert!(matches!(err, PipelineError::RunInProgress(_)));
    }
}
