use crate::error::{Result, WeaveError};
use crate::method::{Method, MethodFilter};

/// Class/method access the weaver depends on.
///
/// Implementations resolve logical class ids (e.g. `Core\Services\Hooks`)
/// and must be read-after-write consistent within one process.
pub trait MethodSource {
    fn has_class(&self, class: &str) -> bool;

    /// Names of the methods matching `filter`, in declaration order.
    fn list_methods(&self, class: &str, filter: MethodFilter) -> Result<Vec<String>>;

    fn get_method(&self, class: &str, name: &str) -> Result<Method>;

    /// Replace the statements of `class::name`, keeping its signature.
    fn set_inner_body(&mut self, class: &str, name: &str, body: &str) -> Result<()>;

    /// Append `method` to `target`. Returns `false` when a method of that
    /// name already exists (nothing is written).
    fn append_method(&mut self, method: &Method, target: &str) -> Result<bool>;

    /// Remove `name` from `target`. Returns `false` when it was absent.
    fn remove_method(&mut self, name: &str, target: &str) -> Result<bool>;

    fn has_method(&self, class: &str, name: &str) -> Result<bool> {
        Ok(self
            .list_methods(class, MethodFilter::ALL)?
            .iter()
            .any(|m| m == name))
    }

    /// Like `get_method`, but a missing method is `None`.
    fn find_method(&self, class: &str, name: &str) -> Result<Option<Method>> {
        match self.get_method(class, name) {
            Ok(method) => Ok(Some(method)),
            Err(WeaveError::MethodNotFound { .. }) => Ok(None),
            Err(err) => Err(err),
        }
    }
}
