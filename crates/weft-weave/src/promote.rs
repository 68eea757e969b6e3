//! Service promotion: copy a module's static service methods into the
//! shared services class. First writer wins; nothing is merged.

use serde::Serialize;
use tracing::{info, warn};
use weft_core::naming;
use weft_core::{MethodFilter, MethodSource, Result};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PromotionReport {
    pub class: String,
    /// Methods written to (or removed from) the services class.
    pub changed: Vec<String>,
    /// Methods left alone because the services class already had (or no
    /// longer had) a method of that name.
    pub unchanged: Vec<String>,
    /// Methods that could not be read, with the reason.
    pub failed: Vec<(String, String)>,
}

pub struct ServicePromoter<'a> {
    source: &'a mut dyn MethodSource,
    target: String,
}

impl<'a> ServicePromoter<'a> {
    pub fn new(source: &'a mut dyn MethodSource, target: impl Into<String>) -> Self {
        Self {
            source,
            target: target.into(),
        }
    }

    /// Append every static public/protected method of `class` the services
    /// class does not declare yet, as public.
    pub fn bind_services(&mut self, class: &str) -> Result<PromotionReport> {
        let names = self.source.list_methods(class, MethodFilter::HOOKS)?;
        let mut report = PromotionReport {
            class: class.to_string(),
            ..Default::default()
        };

        for name in names {
            if self.source.has_method(&self.target, &name)? {
                report.unchanged.push(name);
                continue;
            }
            let method = match self.source.get_method(class, &name) {
                Ok(m) => m,
                Err(err) if !err.is_fatal() => {
                    warn!(class, method = %name, error = %err, "service not promoted");
                    report.failed.push((name, err.to_string()));
                    continue;
                }
                Err(err) => return Err(err),
            };
            self.source
                .append_method(&naming::normalize_visibility(&method), &self.target)?;
            report.changed.push(name);
        }

        info!(class, promoted = report.changed.len(), "services bound");
        Ok(report)
    }

    /// Remove from the services class every method named like one of
    /// `class`'s own static services.
    pub fn unbind_services(&mut self, class: &str) -> Result<PromotionReport> {
        let names = self.source.list_methods(class, MethodFilter::HOOKS)?;
        let mut report = PromotionReport {
            class: class.to_string(),
            ..Default::default()
        };
        for name in names {
            if self.source.remove_method(&name, &self.target)? {
                report.changed.push(name);
            } else {
                report.unchanged.push(name);
            }
        }
        info!(class, removed = report.changed.len(), "services unbound");
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use weft_source::{Catalog, MemoryStore};

    const X: &str = "Core\\Services\\X";
    const X_SRC: &str = "<?php\n\nnamespace Core\\Services;\n\nclass X\n{\n    public static function existing()\n    {\n        return 1;\n    }\n}\n";
    const SERVICES: &str = "Module\\Billing\\BillingServices";
    const SERVICES_SRC: &str = r#"<?php

class BillingServices
{
    protected static function Billing_invoicer()
    {
        return new Invoicer();
    }

    public static function existing()
    {
        return 2;
    }

    private static function internal()
    {
    }
}
"#;

    fn catalog() -> Catalog<MemoryStore> {
        Catalog::new(
            MemoryStore::new()
                .with_class(X, X_SRC)
                .with_class(SERVICES, SERVICES_SRC),
        )
    }

    #[test]
    fn promotes_missing_methods_as_public() {
        let mut c = catalog();
        let report = ServicePromoter::new(&mut c, X).bind_services(SERVICES).unwrap();
        assert_eq!(report.changed, vec!["Billing_invoicer"]);
        assert_eq!(report.unchanged, vec!["existing"]);

        let m = c.get_method(X, "Billing_invoicer").unwrap();
        assert_eq!(m.signature, "public static function Billing_invoicer()");
        assert_eq!(m.body, "return new Invoicer();");
        // first writer keeps its body
        assert_eq!(c.get_method(X, "existing").unwrap().body, "return 1;");
        assert!(!c.has_method(X, "internal").unwrap());
    }

    #[test]
    fn bind_is_idempotent() {
        let mut c = catalog();
        ServicePromoter::new(&mut c, X).bind_services(SERVICES).unwrap();
        let once = c.store().get(X).unwrap().to_string();
        let again = ServicePromoter::new(&mut c, X).bind_services(SERVICES).unwrap();
        assert!(again.changed.is_empty());
        assert_eq!(c.store().get(X).unwrap(), once);
    }

    #[test]
    fn unbind_removes_names_declared_by_module() {
        let mut c = catalog();
        ServicePromoter::new(&mut c, X).bind_services(SERVICES).unwrap();
        let report = ServicePromoter::new(&mut c, X).unbind_services(SERVICES).unwrap();
        assert_eq!(report.changed, vec!["Billing_invoicer", "existing"]);
        assert!(c.list_methods(X, MethodFilter::ALL).unwrap().is_empty());
    }
}
