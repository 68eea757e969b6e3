use weft_core::marker::{self, Segment};

/// Ordered contributions of one dispatcher body.
///
/// The unmarked provider fragment comes first, followed by one marked
/// fragment per subscriber. Text is produced only by [`Dispatcher::render`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dispatcher {
    segments: Vec<Segment>,
}

impl Dispatcher {
    pub fn new(provider_body: &str) -> Self {
        Self {
            segments: marker::split_segments(provider_body),
        }
    }

    /// Rebuild from a persisted dispatcher body.
    pub fn parse(body: &str) -> Self {
        Self::new(body)
    }

    pub fn contains(&self, module: &str) -> bool {
        self.segments.iter().any(|s| s.is_marked_by(module))
    }

    /// Append `module`'s contribution. Returns `false` if it already has one.
    pub fn push(&mut self, module: &str, body: &str) -> bool {
        if self.contains(module) {
            return false;
        }
        self.segments.push(Segment::Marked {
            module: module.to_string(),
            text: body.trim_end().to_string(),
        });
        true
    }

    /// Drop `module`'s first contribution. Returns `false` if it had none.
    pub fn strip(&mut self, module: &str) -> bool {
        match self.segments.iter().position(|s| s.is_marked_by(module)) {
            Some(idx) => {
                self.segments.remove(idx);
                true
            }
            None => false,
        }
    }

    /// Subscriber modules in weave order.
    pub fn contributors(&self) -> Vec<&str> {
        self.segments
            .iter()
            .filter_map(|s| match s {
                Segment::Marked { module, .. } => Some(module.as_str()),
                Segment::Plain(_) => None,
            })
            .collect()
    }

    pub fn render(&self) -> String {
        marker::join_segments(&self.segments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_first_then_subscribers_in_push_order() {
        let mut d = Dispatcher::new("log(\"invoice\");");
        assert!(d.push("Audit", "audit(\"invoice\");"));
        assert!(d.push("Crm", "crm();"));
        assert!(!d.push("Audit", "again();"));
        assert_eq!(d.contributors(), vec!["Audit", "Crm"]);
        assert_eq!(
            d.render(),
            "log(\"invoice\");\n\n// weave-start:Audit\naudit(\"invoice\");\n// weave-end:Audit\n\n// weave-start:Crm\ncrm();\n// weave-end:Crm"
        );
    }

    #[test]
    fn parse_render_is_stable() {
        let mut d = Dispatcher::new("a();\n\nb();");
        d.push("Audit", "audit();");
        let text = d.render();
        assert_eq!(Dispatcher::parse(&text), d);
        assert_eq!(Dispatcher::parse(&text).render(), text);
    }

    #[test]
    fn strip_restores_provider_only_body() {
        let mut d = Dispatcher::new("log();");
        d.push("Audit", "audit();");
        assert!(d.strip("Audit"));
        assert!(!d.strip("Audit"));
        assert_eq!(d.render(), "log();");
    }

    #[test]
    fn empty_provider_body() {
        let mut d = Dispatcher::new("");
        d.push("Audit", "audit();");
        assert_eq!(
            d.render(),
            "// weave-start:Audit\naudit();\n// weave-end:Audit"
        );
        d.strip("Audit");
        assert_eq!(d.render(), "");
    }
}
