pub mod error;
pub mod marker;
pub mod method;
pub mod naming;
pub mod registry;
pub mod source;

pub use error::{Result, WeaveError};
pub use method::{Method, MethodFilter, Visibility};
pub use naming::{classify, HookRole};
pub use registry::ModuleRegistry;
pub use source::MethodSource;
