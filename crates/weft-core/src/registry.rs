/// Read-only view of the modules currently installed.
///
/// `installed` must enumerate in a stable order (install order); the weaver
/// composes latent contributions in that order.
pub trait ModuleRegistry {
    fn installed(&self) -> Vec<String>;

    fn is_installed(&self, module: &str) -> bool {
        self.installed().iter().any(|m| m == module)
    }
}

impl ModuleRegistry for Vec<String> {
    fn installed(&self) -> Vec<String> {
        self.clone()
    }
}
