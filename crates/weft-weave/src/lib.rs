//! Hook weaving.
//!
//! A module's hook class declares `<Module>_<hook>` methods. Methods prefixed
//! with the module's own name provide a hook; the [`Weaver`] copies them to
//! the shared host class as dispatchers. Methods prefixed with another
//! module's name subscribe to that module's hook; their bodies are woven
//! into the dispatcher between `// weave-start:<Module>` and
//! `// weave-end:<Module>` markers.

mod dispatcher;
pub mod promote;
mod report;
mod weaver;

pub use dispatcher::Dispatcher;
pub use promote::{PromotionReport, ServicePromoter};
pub use report::{HookAction, HookOutcome, WeaveReport};
pub use weaver::{ProviderBinding, Weaver};
