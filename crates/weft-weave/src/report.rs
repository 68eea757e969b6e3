use serde::Serialize;
use weft_core::HookRole;

/// What happened to one hook method during a bind or unbind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum HookAction {
    /// The host class was changed.
    Applied,
    /// The dispatcher or marker was already there; nothing written.
    AlreadyBound,
    /// Target provider not bound yet; picked up when it binds.
    Latent,
    Skipped { reason: String },
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HookOutcome {
    pub method: String,
    #[serde(flatten)]
    pub role: HookRole,
    #[serde(flatten)]
    pub action: HookAction,
}

/// Per-hook outcomes of one module's bind or unbind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WeaveReport {
    pub module: String,
    pub outcomes: Vec<HookOutcome>,
}

impl WeaveReport {
    pub fn new(module: &str) -> Self {
        Self {
            module: module.to_string(),
            outcomes: Vec::new(),
        }
    }

    pub fn push(&mut self, method: &str, role: HookRole, action: HookAction) {
        self.outcomes.push(HookOutcome {
            method: method.to_string(),
            role,
            action,
        });
    }

    pub fn applied(&self) -> impl Iterator<Item = &HookOutcome> {
        self.outcomes
            .iter()
            .filter(|o| o.action == HookAction::Applied)
    }

    pub fn failed(&self) -> impl Iterator<Item = &HookOutcome> {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.action, HookAction::Failed { .. }))
    }

    pub fn action_for(&self, method: &str) -> Option<&HookAction> {
        self.outcomes
            .iter()
            .find(|o| o.method == method)
            .map(|o| &o.action)
    }

    /// One-line summary, e.g. `3 applied, 1 latent, 0 failed`.
    pub fn summary(&self) -> String {
        let latent = self
            .outcomes
            .iter()
            .filter(|o| o.action == HookAction::Latent)
            .count();
        format!(
            "{} applied, {} latent, {} failed",
            self.applied().count(),
            latent,
            self.failed().count()
        )
    }
}
