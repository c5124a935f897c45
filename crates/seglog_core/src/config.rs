//! Log configuration.

use crate::error::{CoreError, CoreResult};
use seglog_storage::ENTRY_WIDTH;

/// Store size used when none is configured.
pub const DEFAULT_MAX_STORE_BYTES: u64 = 1024;

/// Index size used when none is configured.
pub const DEFAULT_MAX_INDEX_BYTES: u64 = 1024;

/// Per-segment limits and the offset of the very first segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentConfig {
    /// Store size at which a segment is considered maxed.
    pub max_store_bytes: u64,

    /// Index capacity; a segment holds at most `max_index_bytes / 12`
    /// records.
    pub max_index_bytes: u64,

    /// Base offset of the first segment of an empty log.
    pub initial_offset: u64,
}

impl Default for SegmentConfig {
    fn default() -> Self {
        Self {
            max_store_bytes: DEFAULT_MAX_STORE_BYTES,
            max_index_bytes: DEFAULT_MAX_INDEX_BYTES,
            initial_offset: 0,
        }
    }
}

/// Configuration for opening a log.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Config {
    /// Segment limits.
    pub segment: SegmentConfig,
}

impl Config {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the store size at which segments rotate.
    #[must_use]
    pub const fn max_store_bytes(mut self, bytes: u64) -> Self {
        self.segment.max_store_bytes = bytes;
        self
    }

    /// Sets the index capacity of each segment.
    #[must_use]
    pub const fn max_index_bytes(mut self, bytes: u64) -> Self {
        self.segment.max_index_bytes = bytes;
        self
    }

    /// Sets the base offset of the first segment.
    #[must_use]
    pub const fn initial_offset(mut self, offset: u64) -> Self {
        self.segment.initial_offset = offset;
        self
    }

    /// Replaces zero limits with the defaults.
    #[must_use]
    pub const fn with_defaults(mut self) -> Self {
        if self.segment.max_store_bytes == 0 {
            self.segment.max_store_bytes = DEFAULT_MAX_STORE_BYTES;
        }
        if self.segment.max_index_bytes == 0 {
            self.segment.max_index_bytes = DEFAULT_MAX_INDEX_BYTES;
        }
        self
    }

    /// Checks that the limits can hold at least one record.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidConfig`] if the store limit is zero or
    /// the index cannot hold a single entry.
    pub fn validate(&self) -> CoreResult<()> {
        if self.segment.max_store_bytes == 0 {
            return Err(CoreError::invalid_config("max_store_bytes must be nonzero"));
        }
        if self.segment.max_index_bytes < ENTRY_WIDTH {
            return Err(CoreError::invalid_config(format!(
                "max_index_bytes must be at least {ENTRY_WIDTH}, got {}",
                self.segment.max_index_bytes
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert_eq!(config.segment.max_store_bytes, 1024);
        assert_eq!(config.segment.max_index_bytes, 1024);
        assert_eq!(config.segment.initial_offset, 0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn builder_pattern() {
        let config = Config::new()
            .max_store_bytes(32)
            .max_index_bytes(36)
            .initial_offset(16);

        assert_eq!(config.segment.max_store_bytes, 32);
        assert_eq!(config.segment.max_index_bytes, 36);
        assert_eq!(config.segment.initial_offset, 16);
    }

    #[test]
    fn zero_limits_get_defaults() {
        let config = Config::new()
            .max_store_bytes(0)
            .max_index_bytes(0)
            .with_defaults();

        assert_eq!(config.segment.max_store_bytes, DEFAULT_MAX_STORE_BYTES);
        assert_eq!(config.segment.max_index_bytes, DEFAULT_MAX_INDEX_BYTES);
    }

    #[test]
    fn tiny_index_rejected() {
        let config = Config::new().max_index_bytes(ENTRY_WIDTH - 1);
        assert!(matches!(
            config.validate(),
            Err(CoreError::InvalidConfig { .. })
        ));
    }
}
