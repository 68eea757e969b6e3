use fs2::FileExt;
use std::fs::{File, OpenOptions};

use crate::error::{InstallError, Result};
use crate::paths::WeftPaths;

/// Exclusive workspace lock backed by `.weft/LOCK`.
/// Automatically released when dropped.
pub struct WorkspaceLock {
    _file: File,
}

impl WorkspaceLock {
    /// Try to acquire the workspace lock (non-blocking).
    /// Returns an error if already locked by another process.
    pub fn acquire(paths: &WeftPaths) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .read(true)
            .write(true)
            .open(&paths.lock_file)
            .map_err(|e| InstallError::io(&paths.lock_file, e))?;

        file.try_lock_exclusive()
            .map_err(|_| InstallError::Locked(paths.lock_file.clone()))?;

        Ok(Self { _file: file })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acquire_and_drop() {
        let tmp = tempfile::tempdir().unwrap();
        let p = WeftPaths::discover(tmp.path());
        p.ensure_layout().unwrap();

        let lock = WorkspaceLock::acquire(&p).unwrap();
        // Second acquire should fail while first is held
        assert!(matches!(
            WorkspaceLock::acquire(&p),
            Err(InstallError::Locked(_))
        ));
        drop(lock);
        let _lock2 = WorkspaceLock::acquire(&p).unwrap();
    }
}
