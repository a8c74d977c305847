use std::collections::BTreeMap;
use std::fs;
use std::path::{Component, Path, PathBuf};

use trial_core::errors::{ErrorInfo, TrialError};

/// Source of raw resource bytes, keyed by resource name.
pub trait ResourceStore {
    /// Returns the bytes registered under `name`.
    fn get_resource(&self, name: &str) -> Result<Vec<u8>, TrialError>;
}

/// Resources registered in memory ahead of time.
#[derive(Debug, Clone, Default)]
pub struct MemoryResources {
    entries: BTreeMap<String, Vec<u8>>,
}

impl MemoryResources {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `bytes` under `name`, replacing any earlier entry.
    pub fn register(&mut self, name: impl Into<String>, bytes: impl Into<Vec<u8>>) {
        self.entries.insert(name.into(), bytes.into());
    }

    /// Builder form of [`MemoryResources::register`].
    pub fn with(mut self, name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        self.register(name, bytes);
        self
    }
}

impl ResourceStore for MemoryResources {
    fn get_resource(&self, name: &str) -> Result<Vec<u8>, TrialError> {
        self.entries
            .get(name)
            .cloned()
            .ok_or_else(|| missing_resource(name))
    }
}

/// Resources read from files below a root directory.
#[derive(Debug, Clone)]
pub struct DirectoryResources {
    root: PathBuf,
}

impl DirectoryResources {
    /// Store rooted at `root`; resource names are relative to it.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory resource names resolve against.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, name: &str) -> Result<PathBuf, TrialError> {
        let relative = Path::new(name);
        let escapes = relative
            .components()
            .any(|part| !matches!(part, Component::Normal(_) | Component::CurDir));
        if name.is_empty() || escapes {
            return Err(TrialError::Import(
                ErrorInfo::new("resource-name", "resource name must stay inside the root")
                    .with_context("resource", name)
                    .with_context("root", self.root.display().to_string()),
            ));
        }
        Ok(self.root.join(relative))
    }
}

impl ResourceStore for DirectoryResources {
    fn get_resource(&self, name: &str) -> Result<Vec<u8>, TrialError> {
        let path = self.resolve(name)?;
        if !path.is_file() {
            return Err(TrialError::Import(
                ErrorInfo::new("resource-missing", "resource is not registered")
                    .with_context("resource", name)
                    .with_context("path", path.display().to_string()),
            ));
        }
        fs::read(&path).map_err(|err| {
            TrialError::Import(
                ErrorInfo::new("resource-read", "failed to read resource")
                    .with_context("resource", name)
                    .with_context("path", path.display().to_string())
                    .with_cause(err),
            )
        })
    }
}

fn missing_resource(name: &str) -> TrialError {
    TrialError::Import(
        ErrorInfo::new("resource-missing", "resource is not registered")
            .with_context("resource", name),
    )
}
