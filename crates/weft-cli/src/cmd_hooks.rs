use std::path::Path;

use serde::Serialize;
use weft_core::naming::HOOK_SEPARATOR;
use weft_core::{MethodFilter, MethodSource};
use weft_install::Installer;
use weft_weave::Dispatcher;

#[derive(Debug, Serialize)]
struct HookEntry {
    method: String,
    provider: String,
    contributors: Vec<String>,
}

/// `weft hooks`
pub fn execute(repo_root: &Path, json: bool) -> anyhow::Result<()> {
    let installer = Installer::open(repo_root)?;
    let entries = collect(&installer)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }
    if entries.is_empty() {
        println!("(no hooks bound on {})", installer.config().host_class);
        return Ok(());
    }
    for e in &entries {
        if e.contributors.is_empty() {
            println!("{}  [{}]", e.method, e.provider);
        } else {
            println!("{}  [{}] <- {}", e.method, e.provider, e.contributors.join(", "));
        }
    }
    Ok(())
}

fn collect(installer: &Installer) -> anyhow::Result<Vec<HookEntry>> {
    let catalog = installer.catalog();
    let host = &installer.config().host_class;
    let mut entries = Vec::new();
    for name in catalog.list_methods(host, MethodFilter::DISPATCHERS)? {
        let Some((provider, _)) = name.split_once(HOOK_SEPARATOR) else {
            continue;
        };
        let method = catalog.get_method(host, &name)?;
        let contributors = Dispatcher::parse(&method.body)
            .contributors()
            .into_iter()
            .map(str::to_string)
            .collect();
        entries.push(HookEntry {
            provider: provider.to_string(),
            method: name,
            contributors,
        });
    }
    Ok(entries)
}
