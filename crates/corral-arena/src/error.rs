//! Arena-specific error types.

use std::error::Error;
use std::fmt;

use corral_core::AllocError;

/// Errors that can occur during arena operations.
///
/// Every failing operation leaves the arena exactly as it was before the
/// call: no block is linked and the bump cursor does not move.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ArenaError {
    /// The backing allocator could not supply a block.
    Backing(AllocError),
    /// Acquiring another block would push the arena past its size limit.
    SizeLimitExceeded {
        /// Raw bytes the new block would need, header included.
        requested: usize,
        /// Raw bytes already held by the arena.
        held: usize,
        /// The configured ceiling.
        limit: usize,
    },
    /// The request size overflows once header and alignment are added.
    SizeOverflow {
        /// Number of bytes requested.
        requested: usize,
    },
    /// The arena configuration violates an invariant.
    InvalidConfig {
        /// Which invariant was violated.
        reason: String,
    },
}

impl fmt::Display for ArenaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Backing(err) => write!(f, "backing allocator failed: {err}"),
            Self::SizeLimitExceeded {
                requested,
                held,
                limit,
            } => {
                write!(
                    f,
                    "arena size limit exceeded: block of {requested} bytes on top of {held} held, limit {limit} bytes"
                )
            }
            Self::SizeOverflow { requested } => {
                write!(f, "allocation size overflow: requested {requested} bytes")
            }
            Self::InvalidConfig { reason } => {
                write!(f, "invalid arena config: {reason}")
            }
        }
    }
}

impl Error for ArenaError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Backing(err) => Some(err),
            _ => None,
        }
    }
}

impl From<AllocError> for ArenaError {
    fn from(err: AllocError) -> Self {
        Self::Backing(err)
    }
}
