//! Arena configuration parameters.

use crate::block::HEADER_SIZE;
use crate::error::ArenaError;

/// Configuration for an [`Arena`](crate::Arena).
///
/// Controls the pooled block size and an optional ceiling on total raw
/// memory. Validated at construction; immutable afterwards.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArenaConfig {
    /// Usable bytes in each pooled block.
    ///
    /// Requests larger than this get a dedicated one-off block; smaller ones
    /// are bump-allocated from pooled blocks of this size. Must be non-zero.
    ///
    /// Default: `4096 - HEADER_SIZE`, so a pooled block plus its header
    /// occupies exactly one page before size-class rounding.
    pub min_block_size: usize,

    /// Ceiling on the raw bytes (headers included) the arena may hold.
    ///
    /// Default: `usize::MAX` (unlimited).
    pub size_limit: usize,
}

impl ArenaConfig {
    /// Default pooled block size in usable bytes.
    pub const DEFAULT_MIN_BLOCK_SIZE: usize = 4096 - HEADER_SIZE;

    /// Default size limit (none).
    pub const DEFAULT_SIZE_LIMIT: usize = usize::MAX;

    /// Create a config with the given pooled block size.
    pub fn new(min_block_size: usize) -> Self {
        Self {
            min_block_size,
            size_limit: Self::DEFAULT_SIZE_LIMIT,
        }
    }

    /// Set the raw-byte ceiling.
    pub fn with_size_limit(mut self, size_limit: usize) -> Self {
        self.size_limit = size_limit;
        self
    }

    /// Check the invariants the arena relies on.
    pub fn validate(&self) -> Result<(), ArenaError> {
        if self.min_block_size == 0 {
            return Err(ArenaError::InvalidConfig {
                reason: "min_block_size must be non-zero".to_string(),
            });
        }
        Ok(())
    }
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MIN_BLOCK_SIZE)
    }
}
