use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;
use weft_core::{Result, WeaveError};

use crate::atomic::write_atomic;

/// Raw class text keyed by logical class id.
pub trait ClassStore {
    fn contains(&self, class: &str) -> bool;
    fn load(&self, class: &str) -> Result<String>;
    fn store(&mut self, class: &str, text: &str) -> Result<()>;
}

/// In-memory class texts.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    classes: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_class(mut self, class: &str, text: &str) -> Self {
        self.insert(class, text);
        self
    }

    pub fn insert(&mut self, class: &str, text: &str) {
        self.classes.insert(class.to_string(), text.to_string());
    }

    pub fn get(&self, class: &str) -> Option<&str> {
        self.classes.get(class).map(String::as_str)
    }
}

impl ClassStore for MemoryStore {
    fn contains(&self, class: &str) -> bool {
        self.classes.contains_key(class)
    }

    fn load(&self, class: &str) -> Result<String> {
        self.classes
            .get(class)
            .cloned()
            .ok_or_else(|| WeaveError::ClassNotFound(class.to_string()))
    }

    fn store(&mut self, class: &str, text: &str) -> Result<()> {
        self.classes.insert(class.to_string(), text.to_string());
        Ok(())
    }
}

/// Maps logical class ids to source files.
///
/// Explicit overrides win; otherwise `Module\<M>\<Class>` lives at
/// `<modules_dir>/<M>/<Class>.php` and any other `A\B\C` at
/// `<class_root>/A/B/C.php`. Relative paths are joined to `root`.
#[derive(Debug, Clone)]
pub struct ClassLocator {
    root: PathBuf,
    modules_dir: PathBuf,
    class_root: PathBuf,
    overrides: BTreeMap<String, PathBuf>,
}

impl ClassLocator {
    pub fn new(
        root: impl Into<PathBuf>,
        modules_dir: impl AsRef<Path>,
        class_root: impl AsRef<Path>,
    ) -> Self {
        let root = root.into();
        Self {
            modules_dir: root.join(modules_dir),
            class_root: root.join(class_root),
            overrides: BTreeMap::new(),
            root,
        }
    }

    pub fn with_override(mut self, class: &str, path: impl AsRef<Path>) -> Self {
        self.overrides
            .insert(class.to_string(), self.root.join(path));
        self
    }

    pub fn resolve(&self, class: &str) -> PathBuf {
        if let Some(path) = self.overrides.get(class) {
            return path.clone();
        }
        let parts: Vec<&str> = class.split('\\').filter(|p| !p.is_empty()).collect();
        let (base, rest) = match parts.as_slice() {
            ["Module", module, rest @ ..] if !rest.is_empty() => {
                (self.modules_dir.join(module), rest)
            }
            _ => (self.class_root.clone(), parts.as_slice()),
        };
        let mut path = base;
        for part in rest {
            path.push(part);
        }
        path.set_extension("php");
        path
    }
}

/// Class texts stored as files, written atomically.
#[derive(Debug, Clone)]
pub struct FsStore {
    locator: ClassLocator,
}

impl FsStore {
    pub fn new(locator: ClassLocator) -> Self {
        Self { locator }
    }

    pub fn locator(&self) -> &ClassLocator {
        &self.locator
    }
}

impl ClassStore for FsStore {
    fn contains(&self, class: &str) -> bool {
        self.locator.resolve(class).is_file()
    }

    fn load(&self, class: &str) -> Result<String> {
        let path = self.locator.resolve(class);
        fs::read_to_string(&path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => WeaveError::ClassNotFound(class.to_string()),
            _ => WeaveError::io(&path, e),
        })
    }

    fn store(&mut self, class: &str, text: &str) -> Result<()> {
        let path = self.locator.resolve(class);
        write_atomic(&path, text.as_bytes()).map_err(|e| WeaveError::io(&path, e))?;
        debug!(class, path = %path.display(), "class source written");
        Ok(())
    }
}
