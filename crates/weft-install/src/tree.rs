//! Copying a module's file tree into the application and removing it again.
//!
//! Both walks collect per-entry failures instead of stopping, so one
//! unreadable file does not leave the rest of the tree half done.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, warn};

/// Paths are relative to the destination root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CopyReport {
    pub copied: Vec<PathBuf>,
    pub skipped: Vec<PathBuf>,
    pub errors: Vec<(PathBuf, String)>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RemovalReport {
    pub removed: Vec<PathBuf>,
    /// Entries left in place: symlinks, non-empty directories, or entries
    /// already gone.
    pub kept: Vec<PathBuf>,
    pub errors: Vec<(PathBuf, String)>,
}

/// Copy every file under `src` to the same relative path under `dst`.
/// Existing files are overwritten only when `replace` is set.
pub fn copy_tree(src: &Path, dst: &Path, replace: bool) -> CopyReport {
    let mut report = CopyReport::default();
    let mut entries = Vec::new();
    if let Err(e) = walk(src, Path::new(""), &mut entries) {
        report.errors.push((PathBuf::new(), e.to_string()));
        return report;
    }

    for (rel, is_dir) in entries {
        let target = dst.join(&rel);
        let result = if is_dir {
            fs::create_dir_all(&target).map(|_| false)
        } else if target.exists() && !replace {
            Ok(false)
        } else {
            target
                .parent()
                .map_or(Ok(()), fs::create_dir_all)
                .and_then(|_| fs::copy(src.join(&rel), &target))
                .map(|_| true)
        };
        match result {
            Ok(true) => report.copied.push(rel),
            Ok(false) if !is_dir => report.skipped.push(rel),
            Ok(false) => {}
            Err(e) => {
                warn!(path = %target.display(), error = %e, "copy failed");
                report.errors.push((rel, e.to_string()));
            }
        }
    }
    debug!(
        copied = report.copied.len(),
        skipped = report.skipped.len(),
        "tree copied"
    );
    report
}

/// Remove from `dst` the entries that exist under `manifest`.
///
/// Deepest entries go first. Anything that is, or sits below, a symlink in
/// `dst` is left alone, and directories are removed only once empty.
pub fn remove_tree_by_manifest(manifest: &Path, dst: &Path) -> RemovalReport {
    let mut report = RemovalReport::default();
    let mut entries = Vec::new();
    if let Err(e) = walk(manifest, Path::new(""), &mut entries) {
        report.errors.push((PathBuf::new(), e.to_string()));
        return report;
    }

    for (rel, is_dir) in entries.into_iter().rev() {
        let target = dst.join(&rel);
        if crosses_symlink(dst, &rel) {
            debug!(path = %target.display(), "symlink kept");
            report.kept.push(rel);
            continue;
        }
        let result = match fs::symlink_metadata(&target) {
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e),
            Ok(meta) if meta.is_dir() => is_empty_dir(&target).and_then(|empty| {
                if is_dir && empty {
                    fs::remove_dir(&target).map(|_| true)
                } else {
                    Ok(false)
                }
            }),
            Ok(_) if is_dir => Ok(false),
            Ok(_) => fs::remove_file(&target).map(|_| true),
        };
        match result {
            Ok(true) => report.removed.push(rel),
            Ok(false) => report.kept.push(rel),
            Err(e) => {
                warn!(path = %target.display(), error = %e, "remove failed");
                report.errors.push((rel, e.to_string()));
            }
        }
    }
    report
}

/// Pre-order walk: each directory precedes its contents.
fn walk(root: &Path, rel: &Path, out: &mut Vec<(PathBuf, bool)>) -> io::Result<()> {
    let mut children: Vec<_> = fs::read_dir(root.join(rel))?.collect::<io::Result<_>>()?;
    children.sort_by_key(|e| e.file_name());
    for child in children {
        let child_rel = rel.join(child.file_name());
        let is_dir = fs::metadata(child.path())?.is_dir();
        out.push((child_rel.clone(), is_dir));
        if is_dir {
            walk(root, &child_rel, out)?;
        }
    }
    Ok(())
}

fn crosses_symlink(root: &Path, rel: &Path) -> bool {
    let mut cur = root.to_path_buf();
    for part in rel.components() {
        cur.push(part);
        if fs::symlink_metadata(&cur).is_ok_and(|m| m.file_type().is_symlink()) {
            return true;
        }
    }
    false
}

fn is_empty_dir(path: &Path) -> io::Result<bool> {
    Ok(fs::read_dir(path)?.next().is_none())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(path: &Path, text: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, text).unwrap();
    }

    fn manifest(tmp: &Path) -> PathBuf {
        let src = tmp.join("files");
        write(&src.join("public/billing.js"), "js");
        write(&src.join("views/billing/index.tpl"), "tpl");
        src
    }

    #[test]
    fn copies_and_respects_replace() {
        let tmp = tempfile::tempdir().unwrap();
        let src = manifest(tmp.path());
        let dst = tmp.path().join("app");
        write(&dst.join("public/billing.js"), "mine");

        let report = copy_tree(&src, &dst, false);
        assert_eq!(report.copied, vec![PathBuf::from("views/billing/index.tpl")]);
        assert_eq!(report.skipped, vec![PathBuf::from("public/billing.js")]);
        assert_eq!(fs::read_to_string(dst.join("public/billing.js")).unwrap(), "mine");

        let report = copy_tree(&src, &dst, true);
        assert_eq!(report.copied.len(), 2);
        assert_eq!(fs::read_to_string(dst.join("public/billing.js")).unwrap(), "js");
    }

    #[test]
    fn missing_source_is_reported() {
        let tmp = tempfile::tempdir().unwrap();
        let report = copy_tree(&tmp.path().join("nope"), &tmp.path().join("app"), true);
        assert_eq!(report.errors.len(), 1);
    }

    #[test]
    fn removal_keeps_foreign_files_and_dirs() {
        let tmp = tempfile::tempdir().unwrap();
        let src = manifest(tmp.path());
        let dst = tmp.path().join("app");
        copy_tree(&src, &dst, true);
        write(&dst.join("public/site.css"), "css");

        let report = remove_tree_by_manifest(&src, &dst);
        assert!(report.errors.is_empty());
        assert!(!dst.join("public/billing.js").exists());
        assert!(!dst.join("views").exists());
        assert!(dst.join("public/site.css").exists());
        assert!(report.kept.contains(&PathBuf::from("public")));
    }

    #[cfg(unix)]
    #[test]
    fn removal_skips_symlinks() {
        let tmp = tempfile::tempdir().unwrap();
        let src = manifest(tmp.path());
        let dst = tmp.path().join("app");
        let shared = tmp.path().join("shared");
        write(&shared.join("billing/index.tpl"), "shared");
        fs::create_dir_all(dst.join("views")).unwrap();
        std::os::unix::fs::symlink(&shared.join("billing"), dst.join("views/billing")).unwrap();
        write(&dst.join("public/billing.js"), "js");

        remove_tree_by_manifest(&src, &dst);
        assert!(shared.join("billing/index.tpl").exists());
        assert!(fs::symlink_metadata(dst.join("views/billing")).is_ok());
        assert!(!dst.join("public/billing.js").exists());
    }
}
