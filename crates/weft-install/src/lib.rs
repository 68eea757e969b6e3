pub mod config;
pub mod error;
pub mod installer;
pub mod lock;
pub mod paths;
pub mod registry;
pub mod steps;
pub mod tree;

pub use config::WeftConfig;
pub use error::InstallError;
pub use installer::{InstallReport, Installer};
pub use lock::WorkspaceLock;
pub use paths::WeftPaths;
pub use registry::{InstalledModule, InstalledModules};
pub use steps::StepTracker;
pub use tree::{copy_tree, remove_tree_by_manifest, CopyReport, RemovalReport};
