//! Configuration types for the golden-file runner.

use std::path::{Path, PathBuf};

use crate::filter::Filter;

/// Directory used for golden files when none is configured.
pub const DEFAULT_DIRECTORY: &str = "testdata";

/// Configuration for the golden-file runner.
pub struct RunnerConfig {
    /// Whether the runner writes golden files instead of comparing against
    /// them.
    pub update: bool,
    /// Directory in which golden files are stored. An empty path stands for
    /// [`DEFAULT_DIRECTORY`].
    pub directory: PathBuf,
    /// Filters applied to content given to the runner, in order.
    pub filters: Vec<Box<dyn Filter>>,
}

impl RunnerConfig {
    /// Creates a check-mode config with no filters, storing golden files under
    /// `directory`.
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            update: false,
            directory: directory.into(),
            filters: vec![],
        }
    }

    /// Sets whether the runner operates in update mode.
    #[must_use]
    pub const fn with_update(mut self, update: bool) -> Self {
        self.update = update;
        self
    }

    /// Sets the golden-file directory.
    #[must_use]
    pub fn with_directory(mut self, directory: impl Into<PathBuf>) -> Self {
        self.directory = directory.into();
        self
    }

    /// Appends a filter; it runs after all previously added ones.
    #[must_use]
    pub fn with_filter(mut self, filter: impl Filter + 'static) -> Self {
        self.filters.push(Box::new(filter));
        self
    }

    /// Returns the directory golden files live in, substituting the default for
    /// an empty path.
    pub fn effective_directory(&self) -> &Path {
        if self.directory.as_os_str().is_empty() {
            Path::new(DEFAULT_DIRECTORY)
        } else {
            &self.directory
        }
    }
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self::new(DEFAULT_DIRECTORY)
    }
}

impl std::fmt::Debug for RunnerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunnerConfig")
            .field("update", &self.update)
            .field("directory", &self.directory)
            .field("filters", &self.filters.len())
            .finish()
    }
}
