use std::path::Path;

use weft_install::{InstalledModules, WeftConfig, WeftPaths};

pub fn execute(repo_root: &Path) -> anyhow::Result<()> {
    let paths = WeftPaths::discover(repo_root);
    let already = paths.is_initialized();

    paths.ensure_layout()?;
    if !paths.config_json.exists() {
        WeftConfig::default().save(&paths.config_json)?;
    }
    if !paths.installed_json.exists() {
        InstalledModules::load(&paths.installed_json)?.save()?;
    }

    if already {
        println!("Already initialized at {}", paths.weft_dir.display());
    } else {
        println!("Initialized {}", paths.weft_dir.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_writes_defaults_and_is_idempotent() {
        let tmp = tempfile::tempdir().unwrap();
        execute(tmp.path()).unwrap();
        let paths = WeftPaths::discover(tmp.path());
        assert_eq!(
            WeftConfig::load(&paths.config_json).unwrap(),
            WeftConfig::default()
        );
        assert_eq!(std::fs::read_to_string(&paths.installed_json).unwrap(), "[]");

        weft_install::config::set(&paths.config_json, "modules_dir", "mods").unwrap();
        execute(tmp.path()).unwrap();
        assert_eq!(WeftConfig::load(&paths.config_json).unwrap().modules_dir, "mods");
    }
}
