use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;
use weft_core::ModuleRegistry;
use weft_source::write_atomic;

use crate::error::{InstallError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstalledModule {
    pub name: String,
    pub installed_at: String,
}

/// Ordered list of installed modules, persisted as `installed.json`.
#[derive(Debug, Clone)]
pub struct InstalledModules {
    path: PathBuf,
    modules: Vec<InstalledModule>,
}

impl InstalledModules {
    /// Read `path`; a missing file is an empty registry.
    pub fn load(path: &Path) -> Result<Self> {
        let modules = if path.exists() {
            let content = std::fs::read_to_string(path).map_err(|e| InstallError::io(path, e))?;
            serde_json::from_str(&content).map_err(|e| InstallError::Json {
                path: path.to_path_buf(),
                source: e,
            })?
        } else {
            Vec::new()
        };
        Ok(Self {
            path: path.to_path_buf(),
            modules,
        })
    }

    pub fn save(&self) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.modules).map_err(|e| InstallError::Json {
            path: self.path.clone(),
            source: e,
        })?;
        write_atomic(&self.path, json.as_bytes()).map_err(|e| InstallError::io(&self.path, e))
    }

    pub fn entries(&self) -> &[InstalledModule] {
        &self.modules
    }

    /// Append `module` unless already present. Returns whether it was added.
    pub fn add(&mut self, module: &str) -> bool {
        if self.is_installed(module) {
            return false;
        }
        self.modules.push(InstalledModule {
            name: module.to_string(),
            installed_at: now_rfc3339(),
        });
        debug!(module, "module registered");
        true
    }

    /// Returns whether `module` was present.
    pub fn remove(&mut self, module: &str) -> bool {
        let before = self.modules.len();
        self.modules.retain(|m| m.name != module);
        before != self.modules.len()
    }
}

impl ModuleRegistry for InstalledModules {
    fn installed(&self) -> Vec<String> {
        self.modules.iter().map(|m| m.name.clone()).collect()
    }
}

fn now_rfc3339() -> String {
    let now = time::OffsetDateTime::now_utc();
    now.format(&time::format_description::well_known::Rfc3339)
        .expect("RFC3339 formatting should not fail")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_is_idempotent_and_ordered() {
        let tmp = tempfile::tempdir().unwrap();
        let mut reg = InstalledModules::load(&tmp.path().join("installed.json")).unwrap();
        assert!(reg.add("Billing"));
        assert!(reg.add("Audit"));
        assert!(!reg.add("Billing"));
        assert_eq!(reg.installed(), vec!["Billing", "Audit"]);
        assert!(reg.is_installed("Audit"));
    }

    #[test]
    fn remove_absent_is_noop() {
        let tmp = tempfile::tempdir().unwrap();
        let mut reg = InstalledModules::load(&tmp.path().join("installed.json")).unwrap();
        reg.add("Billing");
        assert!(!reg.remove("Audit"));
        assert!(reg.remove("Billing"));
        assert!(reg.installed().is_empty());
    }

    #[test]
    fn save_and_reload() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("installed.json");
        let mut reg = InstalledModules::load(&path).unwrap();
        reg.add("Billing");
        reg.save().unwrap();

        let reloaded = InstalledModules::load(&path).unwrap();
        assert_eq!(reloaded.entries(), reg.entries());
        let ts = &reloaded.entries()[0].installed_at;
        assert!(time::OffsetDateTime::parse(
            ts,
            &time::format_description::well_known::Rfc3339
        )
        .is_ok());
    }
}
