//! Error types reported by backing allocators.

use std::error::Error;
use std::fmt;

/// Failure to obtain raw memory from a [`BackingAlloc`](crate::BackingAlloc).
///
/// This is the only failure an arena's allocation path can surface from
/// below; arenas wrap it without modification.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AllocError {
    /// The underlying memory source returned nothing.
    OutOfMemory {
        /// Number of bytes requested.
        requested: usize,
    },
    /// The request exceeds the largest size this source can ever serve.
    TooLarge {
        /// Number of bytes requested.
        requested: usize,
        /// Largest servable request in bytes.
        limit: usize,
    },
    /// Every slot of a fixed-capacity source is in use.
    Exhausted {
        /// Number of bytes requested.
        requested: usize,
        /// Total slots owned by the source.
        slots: usize,
    },
}

impl fmt::Display for AllocError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfMemory { requested } => {
                write!(f, "out of memory: requested {requested} bytes")
            }
            Self::TooLarge { requested, limit } => {
                write!(
                    f,
                    "request too large: requested {requested} bytes, limit {limit} bytes"
                )
            }
            Self::Exhausted { requested, slots } => {
                write!(
                    f,
                    "allocator exhausted: requested {requested} bytes, all {slots} slots in use"
                )
            }
        }
    }
}

impl Error for AllocError {}
