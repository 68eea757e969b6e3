use std::io;
use std::path::Path;

use weft_install::{InstallReport, Installer};
use weft_weave::HookAction;

/// `weft install <module>`
pub fn install(repo_root: &Path, module: &str, json: bool) -> anyhow::Result<()> {
    let installer = Installer::open(repo_root)?;
    let report = if json {
        installer.install(module, io::sink())?
    } else {
        installer.install(module, io::stdout().lock())?
    };
    emit(&report, json, "Installed")
}

/// `weft uninstall <module>`
pub fn uninstall(repo_root: &Path, module: &str, json: bool) -> anyhow::Result<()> {
    let installer = Installer::open(repo_root)?;
    let report = if json {
        installer.uninstall(module, io::sink())?
    } else {
        installer.uninstall(module, io::stdout().lock())?
    };
    emit(&report, json, "Uninstalled")
}

fn emit(report: &InstallReport, json: bool, verb: &str) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }
    if let Some(hooks) = &report.hooks {
        for outcome in &hooks.outcomes {
            match &outcome.action {
                HookAction::Skipped { reason } => {
                    println!("  skipped {}: {reason}", outcome.method)
                }
                HookAction::Failed { reason } => {
                    println!("  FAILED  {}: {reason}", outcome.method)
                }
                HookAction::Latent => println!("  latent  {}", outcome.method),
                HookAction::Applied | HookAction::AlreadyBound => {}
            }
        }
    }
    if let Some(copied) = &report.copied {
        for (path, err) in &copied.errors {
            println!("  FAILED  {}: {err}", path.display());
        }
    }
    if let Some(removed) = &report.removed {
        for (path, err) in &removed.errors {
            println!("  FAILED  {}: {err}", path.display());
        }
    }
    println!("{verb} {}", report.module);
    Ok(())
}
