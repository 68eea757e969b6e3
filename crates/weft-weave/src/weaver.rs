use tracing::{debug, info, warn};
use weft_core::naming::{self, HookRole};
use weft_core::{marker, Method, MethodFilter, MethodSource, ModuleRegistry, Result, WeaveError};

use crate::dispatcher::Dispatcher;
use crate::report::{HookAction, WeaveReport};

/// Result of binding one provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderBinding {
    pub action: HookAction,
    /// Installed modules whose latent contribution could not be read,
    /// with the reason.
    pub unwoven: Vec<(String, String)>,
}

impl ProviderBinding {
    fn new(action: HookAction) -> Self {
        Self {
            action,
            unwoven: Vec::new(),
        }
    }
}

/// Binds and unbinds module hooks on a shared host class.
///
/// Per hook the host goes `Unbound -> ProviderBound -> ProviderBound + k
/// subscribers`. A subscriber whose provider is not bound yet stays latent
/// in its own hook class; the provider picks it up when it binds, so the
/// final dispatcher body does not depend on install order.
pub struct Weaver<'a> {
    source: &'a mut dyn MethodSource,
    registry: &'a dyn ModuleRegistry,
    host: String,
}

impl<'a> Weaver<'a> {
    pub fn new(
        source: &'a mut dyn MethodSource,
        registry: &'a dyn ModuleRegistry,
        host: impl Into<String>,
    ) -> Self {
        Self {
            source,
            registry,
            host: host.into(),
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// Bind every hook declared by `module`: providers first, then
    /// subscribers grouped by target in registry order.
    ///
    /// A missing hook or host class aborts the whole call; a malformed hook
    /// only fails that hook.
    pub fn bind_module(&mut self, module: &str) -> Result<WeaveReport> {
        naming::validate_module_name(module)?;
        let class = naming::hooks_class(module);
        let names = self.source.list_methods(&class, MethodFilter::HOOKS)?;
        self.require_host()?;

        let mut report = WeaveReport::new(module);
        let mut providers = Vec::new();
        let mut subscribers = Vec::new();
        for name in names {
            match naming::classify(&name, module) {
                HookRole::Provider { hook } if hook.is_empty() => {
                    warn!(module, method = %name, "hook method has no separator, not bound");
                    report.push(
                        &name,
                        HookRole::Provider { hook },
                        HookAction::Skipped {
                            reason: "no hook separator in method name".into(),
                        },
                    );
                }
                role @ HookRole::Provider { .. } => providers.push((name, role)),
                role @ HookRole::Subscriber { .. } => subscribers.push((name, role)),
            }
        }

        let installed = self.registry.installed();
        subscribers.sort_by_key(|(_, role)| match role {
            HookRole::Subscriber { target, .. } => installed
                .iter()
                .position(|m| m == target)
                .unwrap_or(installed.len()),
            HookRole::Provider { .. } => 0,
        });

        for (name, role) in providers.into_iter().chain(subscribers) {
            let mut unwoven = Vec::new();
            let action = match self.source.get_method(&class, &name) {
                Ok(method) => match &role {
                    HookRole::Provider { .. } => {
                        self.bind_provider(module, &method).map(|binding| {
                            unwoven = binding.unwoven;
                            binding.action
                        })
                    }
                    HookRole::Subscriber { target, .. } => {
                        self.bind_subscriber(module, target, &method)
                    }
                },
                Err(err) => Err(err),
            };
            let hook = role.hook().to_string();
            report.push(&name, role, settle(module, &name, action)?);
            for (other, reason) in unwoven {
                report.push(
                    &name,
                    HookRole::Subscriber {
                        target: module.to_string(),
                        hook: hook.clone(),
                    },
                    HookAction::Failed {
                        reason: format!("contribution from {other} not woven: {reason}"),
                    },
                );
            }
        }

        info!(module, summary = %report.summary(), "hooks bound");
        Ok(report)
    }

    /// Create the dispatcher for `provider` on the host, weaving in any
    /// latent subscriber already declared by an installed module.
    ///
    /// A latent subscriber that cannot be read is left out and listed in
    /// [`ProviderBinding::unwoven`]; structural errors abort the call.
    pub fn bind_provider(&mut self, module: &str, provider: &Method) -> Result<ProviderBinding> {
        if self.source.has_method(&self.host, &provider.name)? {
            debug!(module, method = %provider.name, "dispatcher already bound");
            return Ok(ProviderBinding::new(HookAction::AlreadyBound));
        }

        let provider = naming::normalize_visibility(provider);
        let mut dispatcher = Dispatcher::new(&provider.body);
        let mut unwoven = Vec::new();
        for other in self.registry.installed() {
            if other == module {
                continue;
            }
            let class = naming::hooks_class(&other);
            match self.source.find_method(&class, &provider.name) {
                Ok(Some(latent)) => {
                    debug!(module = %other, method = %provider.name, "weaving latent contribution");
                    dispatcher.push(&other, &latent.body);
                }
                Ok(None) | Err(WeaveError::ClassNotFound(_)) => {}
                Err(err) if err.is_fatal() => return Err(err),
                Err(err) => {
                    warn!(module = %other, method = %provider.name, error = %err, "latent contribution not woven");
                    unwoven.push((other, err.to_string()));
                }
            }
        }

        let woven = Method {
            body: dispatcher.render(),
            ..provider
        };
        self.source.append_method(&woven, &self.host)?;
        info!(module, method = %woven.name, contributors = ?dispatcher.contributors(), "dispatcher created");
        Ok(ProviderBinding {
            action: HookAction::Applied,
            unwoven,
        })
    }

    /// Append `module`'s contribution to `target`'s dispatcher, if both the
    /// target is installed and its dispatcher exists.
    pub fn bind_subscriber(
        &mut self,
        module: &str,
        target: &str,
        subscriber: &Method,
    ) -> Result<HookAction> {
        if !self.registry.is_installed(target) {
            debug!(module, target, method = %subscriber.name, "target not installed, contribution stays latent");
            return Ok(HookAction::Latent);
        }
        let Some(current) = self.source.find_method(&self.host, &subscriber.name)? else {
            debug!(module, target, method = %subscriber.name, "no dispatcher yet, contribution stays latent");
            return Ok(HookAction::Latent);
        };
        if marker::contains(&current.body, module) {
            return Ok(HookAction::AlreadyBound);
        }

        let mut dispatcher = Dispatcher::parse(&current.body);
        dispatcher.push(module, &subscriber.body);
        self.source
            .set_inner_body(&self.host, &subscriber.name, &dispatcher.render())?;
        info!(module, method = %subscriber.name, "contribution woven");
        Ok(HookAction::Applied)
    }

    /// Unbind subscribers first, then remove every dispatcher `module` owns.
    pub fn unbind_module(&mut self, module: &str) -> Result<WeaveReport> {
        naming::validate_module_name(module)?;
        let mut report = self.unbind_subscribers(module)?;

        let owned: Vec<String> = self
            .source
            .list_methods(&self.host, MethodFilter::DISPATCHERS)?
            .into_iter()
            .filter(|name| naming::is_owned_by(name, module))
            .collect();
        for name in owned {
            let role = naming::classify(&name, module);
            let action = self.unbind_provider(module, role.hook());
            report.push(&name, role, settle(module, &name, action)?);
        }

        info!(module, summary = %report.summary(), "hooks unbound");
        Ok(report)
    }

    /// Strip `module`'s marked contribution from every dispatcher it does
    /// not own. Other modules' marker blocks are never touched.
    pub fn unbind_subscribers(&mut self, module: &str) -> Result<WeaveReport> {
        let mut report = WeaveReport::new(module);
        let names = self
            .source
            .list_methods(&self.host, MethodFilter::DISPATCHERS)?;

        for name in names {
            if naming::is_owned_by(&name, module) {
                continue;
            }
            let current = match self.source.get_method(&self.host, &name) {
                Ok(m) => m,
                Err(err) if !err.is_fatal() => {
                    warn!(module, method = %name, error = %err, "dispatcher unreadable, skipped");
                    continue;
                }
                Err(err) => return Err(err),
            };
            if !marker::contains(&current.body, module) {
                continue;
            }
            let stripped = marker::extract_and_strip(&current.body, module);
            if stripped == current.body {
                warn!(module, method = %name, "start marker without end marker, left in place");
                report.push(
                    &name,
                    naming::classify(&name, module),
                    HookAction::Failed {
                        reason: "unterminated marker".into(),
                    },
                );
                continue;
            }
            let action = self
                .source
                .set_inner_body(&self.host, &name, &stripped)
                .map(|()| HookAction::Applied);
            report.push(
                &name,
                naming::classify(&name, module),
                settle(module, &name, action)?,
            );
            debug!(module, method = %name, "contribution removed");
        }
        Ok(report)
    }

    /// Remove the dispatcher for `hook` entirely. Subscriber contributions
    /// inside it go with it.
    pub fn unbind_provider(&mut self, module: &str, hook: &str) -> Result<HookAction> {
        let name = naming::dispatcher_name(module, hook);
        if self.source.remove_method(&name, &self.host)? {
            info!(module, method = %name, "dispatcher removed");
            Ok(HookAction::Applied)
        } else {
            Ok(HookAction::Skipped {
                reason: "dispatcher not bound".into(),
            })
        }
    }

    fn require_host(&self) -> Result<()> {
        if self.source.has_class(&self.host) {
            Ok(())
        } else {
            Err(WeaveError::ClassNotFound(self.host.clone()))
        }
    }
}

/// Turn per-hook errors into outcomes; structural errors propagate.
fn settle(module: &str, method: &str, result: Result<HookAction>) -> Result<HookAction> {
    match result {
        Ok(action) => Ok(action),
        Err(err) if err.is_fatal() => Err(err),
        Err(err @ WeaveError::MethodNotFound { .. }) => Ok(HookAction::Skipped {
            reason: err.to_string(),
        }),
        Err(err) => {
            warn!(module, method, error = %err, "hook failed");
            Ok(HookAction::Failed {
                reason: err.to_string(),
            })
        }
    }
}
