//! Golden-file runner implementation.

use std::path::{Path, PathBuf};

use crate::config::RunnerConfig;
use crate::error::{ComparisonError, Error};
use crate::filter::{self, Filter};
use crate::trace_categories;

/// Writes or checks golden files.
///
/// The update flag is read at the start of every call, so it can be toggled
/// between calls with [`Runner::set_update`]. A runner is not synchronized;
/// callers sharing a directory must serialize their calls.
#[derive(Debug, Default)]
pub struct Runner {
    config: RunnerConfig,
}

impl Runner {
    /// Creates a check-mode runner with no filters that stores golden files
    /// under `directory`.
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self::from_config(RunnerConfig::new(directory))
    }

    /// Creates a runner from an explicit configuration.
    pub const fn from_config(config: RunnerConfig) -> Self {
        Self { config }
    }

    /// Returns the runner's configuration.
    pub const fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Returns whether the runner is in update mode.
    pub const fn is_update(&self) -> bool {
        self.config.update
    }

    /// Switches between update mode and check mode for subsequent calls.
    pub const fn set_update(&mut self, update: bool) {
        self.config.update = update;
    }

    /// Returns the directory golden files are stored in.
    pub fn directory(&self) -> &Path {
        self.config.effective_directory()
    }

    /// Appends a filter; it runs after all previously added ones.
    pub fn add_filter(&mut self, filter: impl Filter + 'static) {
        self.config.filters.push(Box::new(filter));
    }

    /// Returns the location of the golden file for `path`.
    pub fn golden_path(&self, path: impl AsRef<Path>) -> PathBuf {
        self.directory().join(path)
    }

    /// Resets the golden directory when in update mode by deleting it, along
    /// with its contents, and recreating it empty. Does nothing in check mode.
    pub fn prepare(&self) -> Result<(), Error> {
        if !self.config.update {
            return Ok(());
        }

        let dir = self.directory();
        tracing::debug!(target: trace_categories::STORAGE, "resetting golden directory: {}", dir.display());

        match std::fs::remove_dir_all(dir) {
            Ok(()) => (),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => (),
            Err(err) => return Err(Error::RemoveDirectory(dir.to_path_buf(), err)),
        }

        std::fs::create_dir_all(dir).map_err(|err| Error::CreateDirectory(dir.to_path_buf(), err))
    }

    /// Checks `content` against the golden file at `path`, relative to the
    /// runner's directory.
    ///
    /// Filters are applied to `content` first. In update mode the filtered
    /// content is written to the golden file instead, creating any missing
    /// directories. Only `Ok(())` means the contents matched (or were
    /// written); differing content yields [`Error::Comparison`].
    pub fn test(&self, path: impl AsRef<Path>, content: impl AsRef<[u8]>) -> Result<(), Error> {
        let path = self.golden_path(path);
        let filtered = filter::apply_filters(&self.config.filters, content.as_ref());

        if self.config.update {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .map_err(|err| Error::CreateDirectory(parent.to_path_buf(), err))?;
            }

            tracing::debug!(target: trace_categories::STORAGE, "writing golden file: {} ({} bytes)", path.display(), filtered.len());

            std::fs::write(&path, &*filtered).map_err(|err| Error::WriteFile(path, err))?;
        } else {
            let stored = std::fs::read(&path).map_err(|err| Error::ReadFile(path.clone(), err))?;

            tracing::debug!(target: trace_categories::STORAGE, "read golden file: {} ({} bytes)", path.display(), stored.len());

            if stored != *filtered {
                tracing::debug!(
                    target: trace_categories::STORAGE,
                    "golden file differs: {} (stored {} bytes, got {} bytes)",
                    path.display(),
                    stored.len(),
                    filtered.len()
                );

                return Err(ComparisonError.into());
            }
        }

        Ok(())
    }
}
