//! Trace utilities

/// Trace category for content filtering.
pub const FILTERS: &str = "gold::filters";
/// Trace category for golden-file storage.
pub const STORAGE: &str = "gold::storage";
