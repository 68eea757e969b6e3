use clap::Subcommand;
use std::path::Path;

use weft_install::{config, WeftConfig, WeftPaths};

// ── CLI Schema ──

#[derive(Subcommand)]
pub enum ConfigCmd {
    /// Set a config value
    Set {
        /// Config key (e.g. modules_dir, or classes.<ClassId> for a path override)
        key: String,
        /// Config value (true/false for replace_files, text otherwise)
        value: String,
    },
    /// Get a config value
    Get {
        /// Config key
        key: String,
    },
    /// List all effective config values
    List,
}

// ── Dispatch ──

pub fn run(cmd: ConfigCmd, repo_root: &Path) -> anyhow::Result<()> {
    match cmd {
        ConfigCmd::Set { key, value } => set(repo_root, &key, &value),
        ConfigCmd::Get { key } => get(repo_root, &key),
        ConfigCmd::List => list(repo_root),
    }
}

// ── Command Implementations ──

fn initialized(repo_root: &Path) -> anyhow::Result<WeftPaths> {
    let paths = WeftPaths::discover(repo_root);
    if !paths.is_initialized() {
        anyhow::bail!("No .weft/ workspace found. Run `weft init` first.");
    }
    Ok(paths)
}

/// `weft config set <key> <value>`
pub fn set(repo_root: &Path, key: &str, value: &str) -> anyhow::Result<()> {
    let paths = initialized(repo_root)?;
    config::set(&paths.config_json, key, value)?;
    println!("{key} = {value}");
    Ok(())
}

/// `weft config get <key>`
pub fn get(repo_root: &Path, key: &str) -> anyhow::Result<()> {
    let paths = initialized(repo_root)?;
    match config::get(&paths.config_json, key)? {
        Some(val) => println!("{val}"),
        None => println!("(not set)"),
    }
    Ok(())
}

/// `weft config list`
pub fn list(repo_root: &Path) -> anyhow::Result<()> {
    let paths = initialized(repo_root)?;
    let cfg = WeftConfig::load(&paths.config_json)?;
    for (k, v) in config::list_effective(&cfg) {
        println!("{k} = {v}");
    }
    Ok(())
}
