pub mod atomic;
pub mod catalog;
mod scanner;
pub mod store;

pub use atomic::write_atomic;
pub use catalog::Catalog;
pub use store::{ClassLocator, ClassStore, FsStore, MemoryStore};
