//! Corral: a region-based arena allocator.
//!
//! This is the top-level facade crate that re-exports the public API from
//! the Corral sub-crates. For most users, adding `corral` as a single
//! dependency is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use corral::prelude::*;
//!
//! let arena = Arena::system(ArenaConfig::default()).unwrap();
//!
//! // Many small allocations share one pooled block.
//! let name = arena.alloc_copy(b"request-42").unwrap();
//! let scratch = arena.alloc_zeroed(256).unwrap();
//! scratch[0] = name[0];
//! assert_eq!(arena.block_count(), 1);
//!
//! // An oversized request gets a block of its own and leaves the
//! // pooled block's remaining capacity alone.
//! let remaining = arena.remaining();
//! arena.alloc_zeroed(64 * 1024).unwrap();
//! assert_eq!(arena.remaining(), remaining);
//! assert_eq!(arena.block_count(), 2);
//!
//! // Per-worker arenas can be folded into one for a single teardown.
//! let worker = Arena::system(ArenaConfig::default()).unwrap();
//! worker.alloc_copy(b"from a worker").unwrap();
//! arena.merge(worker);
//! assert_eq!(arena.block_count(), 3);
//! // Everything is released when `arena` goes out of scope.
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`arena`] | `corral-arena` | `Arena`, `Block`, config, errors, stats |
//! | [`backing`] | `corral-core` | `BackingAlloc` trait, `SystemHeap`, `FixedPool` |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Arena, blocks, and arena accounting (`corral-arena`).
pub use corral_arena as arena;

/// Backing-allocator contract and raw memory sources (`corral-core`).
///
/// Implement [`backing::BackingAlloc`] to plug a custom memory source into
/// an [`arena::Arena`].
pub use corral_core as backing;

/// Common imports for typical Corral usage.
///
/// ```rust
/// use corral::prelude::*;
/// ```
pub mod prelude {
    // Arena
    pub use corral_arena::{Arena, ArenaConfig, ArenaStats, SysArena};

    // Backing allocators
    pub use corral_core::{BackingAlloc, FixedPool, SystemHeap, MAX_ALIGN};

    // Errors
    pub use corral_arena::ArenaError;
    pub use corral_core::AllocError;
}
