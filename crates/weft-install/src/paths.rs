use std::path::{Path, PathBuf};

/// All well-known paths under `.weft/`.
#[derive(Debug, Clone)]
pub struct WeftPaths {
    pub root: PathBuf,
    pub weft_dir: PathBuf,
    pub config_json: PathBuf,
    pub installed_json: PathBuf,
    pub lock_file: PathBuf,
}

impl WeftPaths {
    /// Derive all paths from an application root. Pure computation, no I/O.
    pub fn discover(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let weft_dir = root.join(".weft");
        Self {
            config_json: weft_dir.join("config.json"),
            installed_json: weft_dir.join("installed.json"),
            lock_file: weft_dir.join("LOCK"),
            weft_dir,
            root,
        }
    }

    /// Create `.weft/`. Idempotent.
    pub fn ensure_layout(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.weft_dir)
    }

    pub fn is_initialized(&self) -> bool {
        self.weft_dir.is_dir()
    }

    /// Walk up from `start` looking for a directory containing `.weft/`.
    pub fn find_root(start: &Path) -> Option<PathBuf> {
        let mut cur = start.to_path_buf();
        loop {
            if cur.join(".weft").is_dir() {
                return Some(cur);
            }
            if !cur.pop() {
                return None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discover_builds_correct_paths() {
        let p = WeftPaths::discover("/tmp/app");
        assert_eq!(p.weft_dir, PathBuf::from("/tmp/app/.weft"));
        assert_eq!(p.config_json, PathBuf::from("/tmp/app/.weft/config.json"));
        assert_eq!(
            p.installed_json,
            PathBuf::from("/tmp/app/.weft/installed.json")
        );
        assert_eq!(p.lock_file, PathBuf::from("/tmp/app/.weft/LOCK"));
    }

    #[test]
    fn find_root_walks_up() {
        let tmp = tempfile::tempdir().unwrap();
        let p = WeftPaths::discover(tmp.path());
        p.ensure_layout().unwrap();
        let nested = tmp.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();
        assert_eq!(WeftPaths::find_root(&nested), Some(tmp.path().to_path_buf()));
    }
}
