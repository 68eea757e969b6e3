//! Hook naming convention: `<Module>_<hook>`.
//!
//! A hook method whose prefix is the owning module's name is a provider;
//! any other prefix makes it a subscriber to the module of that name. For
//! the Billing module's hook class:
//!
//! - `Billing_onInvoice` provides the `onInvoice` hook
//! - `Crm_onContact` subscribes to Crm's `onContact` hook

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::error::{Result, WeaveError};
use crate::method::{Method, Visibility};

pub const HOOK_SEPARATOR: char = '_';

static MODULE_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9]*$").unwrap());

static VISIBILITY_KEYWORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bprotected\b").unwrap());

/// Role of a hook method relative to the module declaring it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum HookRole {
    Provider { hook: String },
    Subscriber { target: String, hook: String },
}

impl HookRole {
    pub fn hook(&self) -> &str {
        match self {
            HookRole::Provider { hook } | HookRole::Subscriber { hook, .. } => hook,
        }
    }
}

/// Classify `method_name` declared by `owning_module`.
///
/// A name without separator classifies as a provider with an empty hook
/// name; callers must surface that case instead of binding it.
pub fn classify(method_name: &str, owning_module: &str) -> HookRole {
    let Some((prefix, suffix)) = method_name.split_once(HOOK_SEPARATOR) else {
        return HookRole::Provider {
            hook: String::new(),
        };
    };
    if prefix == owning_module {
        HookRole::Provider {
            hook: suffix.to_string(),
        }
    } else {
        HookRole::Subscriber {
            target: prefix.to_string(),
            hook: suffix.to_string(),
        }
    }
}

/// Name of the dispatcher method `module` provides for `hook`.
pub fn dispatcher_name(module: &str, hook: &str) -> String {
    format!("{module}{HOOK_SEPARATOR}{hook}")
}

/// Whether the host method `name` is a dispatcher provided by `module`.
pub fn is_owned_by(name: &str, module: &str) -> bool {
    name.strip_prefix(module)
        .is_some_and(|rest| rest.starts_with(HOOK_SEPARATOR))
}

/// Hook-source class declaring the provider/subscriber methods of `module`.
pub fn hooks_class(module: &str) -> String {
    format!("Module\\{module}\\{module}Hooks")
}

/// Class declaring the static services `module` promotes.
pub fn services_class(module: &str) -> String {
    format!("Module\\{module}\\{module}Services")
}

pub fn validate_module_name(name: &str) -> Result<()> {
    let reason = if name.is_empty() {
        "module name is empty"
    } else if name.contains(HOOK_SEPARATOR) {
        "module name must not contain the hook separator '_'"
    } else if !MODULE_NAME.is_match(name) {
        "module name must be ASCII alphanumeric and start with a letter"
    } else {
        return Ok(());
    };
    Err(WeaveError::InvalidModuleName {
        name: name.to_string(),
        reason,
    })
}

/// Rewrite a `protected` declaration to `public`.
///
/// Only the visibility keyword in the signature changes; the body is left
/// alone and other visibilities pass through untouched.
pub fn normalize_visibility(method: &Method) -> Method {
    if method.visibility != Visibility::Protected {
        return method.clone();
    }
    Method {
        signature: VISIBILITY_KEYWORD
            .replace(&method.signature, Visibility::Public.keyword())
            .into_owned(),
        visibility: Visibility::Public,
        ..method.clone()
    }
}
