use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{info, warn};
use weft_core::naming;
use weft_core::{MethodSource, ModuleRegistry};
use weft_source::{Catalog, FsStore};
use weft_weave::{PromotionReport, ServicePromoter, WeaveReport, Weaver};

use crate::config::WeftConfig;
use crate::error::{InstallError, Result};
use crate::lock::WorkspaceLock;
use crate::paths::WeftPaths;
use crate::registry::InstalledModules;
use crate::steps::StepTracker;
use crate::tree::{self, CopyReport, RemovalReport};

const STEP_FILES: &str = "files";
const STEP_SERVICES: &str = "services";
const STEP_HOOKS: &str = "hooks";

/// Everything one install or uninstall did. Steps that did not apply are
/// `None`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct InstallReport {
    pub module: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub copied: Option<CopyReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub removed: Option<RemovalReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub services: Option<PromotionReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hooks: Option<WeaveReport>,
}

/// Runs the file, service and hook steps for one module against an
/// initialized application root.
pub struct Installer {
    paths: WeftPaths,
    config: WeftConfig,
}

impl Installer {
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let paths = WeftPaths::discover(root);
        if !paths.is_initialized() {
            return Err(InstallError::NotInitialized(paths.root));
        }
        let config = WeftConfig::load(&paths.config_json)?;
        Ok(Self { paths, config })
    }

    pub fn config(&self) -> &WeftConfig {
        &self.config
    }

    pub fn root(&self) -> &Path {
        &self.paths.root
    }

    pub fn registry(&self) -> Result<InstalledModules> {
        InstalledModules::load(&self.paths.installed_json)
    }

    pub fn catalog(&self) -> Catalog<FsStore> {
        Catalog::new(FsStore::new(self.config.locator(&self.paths.root)))
    }

    /// Copy files, promote services, bind hooks, then register the module.
    pub fn install(&self, module: &str, progress: impl Write) -> Result<InstallReport> {
        naming::validate_module_name(module)?;
        let module_dir = self.config.module_dir(&self.paths.root, module);
        if !module_dir.is_dir() {
            return Err(InstallError::ModuleNotFound(module_dir));
        }
        let _lock = WorkspaceLock::acquire(&self.paths)?;
        let mut registry = self.registry()?;
        let mut catalog = self.catalog();
        let files = files_dir(&module_dir);
        let services_class = naming::services_class(module);
        let hooks_class = naming::hooks_class(module);

        let mut steps = StepTracker::new(progress);
        if files.is_dir() {
            steps.register(STEP_FILES, "Copying files");
        }
        if catalog.has_class(&services_class) {
            steps.register(STEP_SERVICES, "Promoting services");
        }
        if catalog.has_class(&hooks_class) {
            steps.register(STEP_HOOKS, "Binding hooks");
        }
        if steps.is_empty() {
            warn!(module, "module has no files, services or hooks");
        }

        let mut report = InstallReport {
            module: module.to_string(),
            ..Default::default()
        };

        if files.is_dir() {
            steps.start_step(STEP_FILES)?;
            let copied = tree::copy_tree(&files, &self.paths.root, self.config.replace_files);
            steps.stop_step(STEP_FILES, &copy_status(&copied))?;
            report.copied = Some(copied);
        }

        if catalog.has_class(&services_class) {
            steps.start_step(STEP_SERVICES)?;
            let promoted = ServicePromoter::new(&mut catalog, &self.config.services_class)
                .bind_services(&services_class)?;
            steps.stop_step(STEP_SERVICES, &format!("{} promoted", promoted.changed.len()))?;
            report.services = Some(promoted);
        }

        if catalog.has_class(&hooks_class) {
            steps.start_step(STEP_HOOKS)?;
            let woven = Weaver::new(&mut catalog, &registry, &self.config.host_class)
                .bind_module(module)?;
            steps.stop_step(STEP_HOOKS, &woven.summary())?;
            report.hooks = Some(woven);
        }

        if registry.add(module) {
            registry.save()?;
        }
        info!(module, "module installed");
        Ok(report)
    }

    /// Unbind hooks, remove services and files, then unregister the module.
    pub fn uninstall(&self, module: &str, progress: impl Write) -> Result<InstallReport> {
        naming::validate_module_name(module)?;
        let _lock = WorkspaceLock::acquire(&self.paths)?;
        let mut registry = self.registry()?;
        if !registry.is_installed(module) {
            return Err(InstallError::NotInstalled(module.to_string()));
        }
        let mut catalog = self.catalog();
        let files = files_dir(&self.config.module_dir(&self.paths.root, module));
        let services_class = naming::services_class(module);
        let host_bound = catalog.has_class(&self.config.host_class);
        let promoted = catalog.has_class(&services_class)
            && catalog.has_class(&self.config.services_class);

        let mut steps = StepTracker::new(progress);
        if host_bound {
            steps.register(STEP_HOOKS, "Unbinding hooks");
        }
        if promoted {
            steps.register(STEP_SERVICES, "Removing services");
        }
        if files.is_dir() {
            steps.register(STEP_FILES, "Removing files");
        }

        let mut report = InstallReport {
            module: module.to_string(),
            ..Default::default()
        };

        if host_bound {
            steps.start_step(STEP_HOOKS)?;
            let unwoven = Weaver::new(&mut catalog, &registry, &self.config.host_class)
                .unbind_module(module)?;
            steps.stop_step(STEP_HOOKS, &unwoven.summary())?;
            report.hooks = Some(unwoven);
        }

        if promoted {
            steps.start_step(STEP_SERVICES)?;
            let removed = ServicePromoter::new(&mut catalog, &self.config.services_class)
                .unbind_services(&services_class)?;
            steps.stop_step(STEP_SERVICES, &format!("{} removed", removed.changed.len()))?;
            report.services = Some(removed);
        }

        if files.is_dir() {
            steps.start_step(STEP_FILES)?;
            let removed = tree::remove_tree_by_manifest(&files, &self.paths.root);
            let status = if removed.errors.is_empty() {
                format!("{} removed", removed.removed.len())
            } else {
                format!("{} removed, {} errors", removed.removed.len(), removed.errors.len())
            };
            steps.stop_step(STEP_FILES, &status)?;
            report.removed = Some(removed);
        }

        registry.remove(module);
        registry.save()?;
        info!(module, "module uninstalled");
        Ok(report)
    }
}

fn files_dir(module_dir: &Path) -> PathBuf {
    module_dir.join("files").join("app")
}

fn copy_status(report: &CopyReport) -> String {
    if report.errors.is_empty() {
        format!("{} copied, {} kept", report.copied.len(), report.skipped.len())
    } else {
        format!(
            "{} copied, {} kept, {} errors",
            report.copied.len(),
            report.skipped.len(),
            report.errors.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use weft_weave::HookAction;

    const HOST: &str = "<?php\n\nnamespace Core\\Services;\n\nclass Hooks\n{\n}\n";
    const X: &str = "<?php\n\nnamespace Core\\Services;\n\nclass X\n{\n}\n";
    const BILLING_HOOKS: &str = r#"<?php

namespace Module\Billing;

class BillingHooks
{
    protected static function Billing_onInvoice($invoice)
    {
        log("invoice");
    }
}
"#;
    const BILLING_SERVICES: &str = r#"<?php

namespace Module\Billing;

class BillingServices
{
    public static function Billing_invoicer()
    {
        return new Invoicer();
    }
}
"#;
    const AUDIT_HOOKS: &str = r#"<?php

namespace Module\Audit;

class AuditHooks
{
    public static function Billing_onInvoice($invoice)
    {
        audit("invoice");
    }
}
"#;

    fn write(path: &Path, text: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, text).unwrap();
    }

    fn app() -> tempfile::TempDir {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        WeftPaths::discover(root).ensure_layout().unwrap();
        write(&root.join("class/Core/Services/Hooks.php"), HOST);
        write(&root.join("class/Core/Services/X.php"), X);
        let billing = root.join("class-modules/Billing");
        write(&billing.join("BillingHooks.php"), BILLING_HOOKS);
        write(&billing.join("BillingServices.php"), BILLING_SERVICES);
        write(&billing.join("files/app/public/billing.js"), "js");
        write(&root.join("class-modules/Audit/AuditHooks.php"), AUDIT_HOOKS);
        tmp
    }

    fn host(root: &Path) -> String {
        fs::read_to_string(root.join("class/Core/Services/Hooks.php")).unwrap()
    }

    #[test]
    fn open_requires_init() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(matches!(
            Installer::open(tmp.path()),
            Err(InstallError::NotInitialized(_))
        ));
    }

    #[test]
    fn install_runs_every_step_and_registers() {
        let tmp = app();
        let installer = Installer::open(tmp.path()).unwrap();
        let mut out = Vec::new();
        let report = installer.install("Billing", &mut out).unwrap();

        let progress = String::from_utf8(out).unwrap();
        assert!(progress.starts_with("----> Step 1/3: Copying files ... "));
        assert!(progress.contains("----> Step 3/3: Binding hooks ... 1 applied"));

        assert_eq!(report.copied.unwrap().copied.len(), 1);
        assert_eq!(report.services.unwrap().changed, vec!["Billing_invoicer"]);
        assert!(tmp.path().join("public/billing.js").is_file());
        assert!(host(tmp.path()).contains("public static function Billing_onInvoice($invoice)"));
        assert!(installer.registry().unwrap().is_installed("Billing"));
    }

    #[test]
    fn install_order_does_not_change_result() {
        let a = app();
        let installer = Installer::open(a.path()).unwrap();
        installer.install("Audit", std::io::sink()).unwrap();
        installer.install("Billing", std::io::sink()).unwrap();

        let b = app();
        let installer = Installer::open(b.path()).unwrap();
        installer.install("Billing", std::io::sink()).unwrap();
        let report = installer.install("Audit", std::io::sink()).unwrap();
        assert_eq!(
            report.hooks.unwrap().action_for("Billing_onInvoice"),
            Some(&HookAction::Applied)
        );

        assert_eq!(host(a.path()), host(b.path()));
        assert!(host(a.path()).contains("// weave-start:Audit"));
    }

    #[test]
    fn uninstall_restores_host_and_files() {
        let tmp = app();
        let installer = Installer::open(tmp.path()).unwrap();
        installer.install("Billing", std::io::sink()).unwrap();
        installer.install("Audit", std::io::sink()).unwrap();

        installer.uninstall("Audit", std::io::sink()).unwrap();
        assert!(!host(tmp.path()).contains("audit("));

        installer.uninstall("Billing", std::io::sink()).unwrap();
        assert_eq!(host(tmp.path()), HOST);
        assert_eq!(
            fs::read_to_string(tmp.path().join("class/Core/Services/X.php")).unwrap(),
            X
        );
        assert!(!tmp.path().join("public").exists());
        assert!(installer.registry().unwrap().installed().is_empty());
    }

    #[test]
    fn uninstall_unknown_module_fails() {
        let tmp = app();
        let installer = Installer::open(tmp.path()).unwrap();
        assert!(matches!(
            installer.uninstall("Billing", std::io::sink()),
            Err(InstallError::NotInstalled(_))
        ));
    }

    #[test]
    fn install_missing_module_dir_fails() {
        let tmp = app();
        let installer = Installer::open(tmp.path()).unwrap();
        assert!(matches!(
            installer.install("Crm", std::io::sink()),
            Err(InstallError::ModuleNotFound(_))
        ));
        assert!(matches!(
            installer.install("bad name", std::io::sink()),
            Err(InstallError::Weave(_))
        ));
    }

    #[test]
    fn install_is_locked_out_while_held() {
        let tmp = app();
        let installer = Installer::open(tmp.path()).unwrap();
        let _held = WorkspaceLock::acquire(&WeftPaths::discover(tmp.path())).unwrap();
        assert!(matches!(
            installer.install("Billing", std::io::sink()),
            Err(InstallError::Locked(_))
        ));
    }
}
