use std::path::Path;

use weft_install::Installer;

/// `weft list`
pub fn execute(repo_root: &Path) -> anyhow::Result<()> {
    let registry = Installer::open(repo_root)?.registry()?;
    if registry.entries().is_empty() {
        println!("(no modules installed)");
        return Ok(());
    }
    for entry in registry.entries() {
        println!("{}  {}", entry.name, entry.installed_at);
    }
    Ok(())
}
