//! Block-based bump arena for the Corral allocator.
//!
//! Hands out variably sized, maximally aligned regions in O(1) amortised
//! time and releases everything at once when the arena is dropped. There
//! is no per-allocation free.
//!
//! # Architecture
//!
//! ```text
//! Arena (owner, bump cursor ptr..end)
//! ├── &BackingAlloc (borrowed for the arena's lifetime)
//! └── VecDeque<Block>
//!     ├── front: current pooled block (bump target), older pooled blocks
//!     └── back:  one-off large blocks
//! ```
//!
//! - **Fast path:** the request fits between `ptr` and `end`; bump `ptr`.
//! - **Slow path, small request:** acquire a pooled block of
//!   `min_block_size` usable bytes (widened to the backing allocator's
//!   natural size), push it to the front and make it the bump target.
//! - **Slow path, large request:** acquire an exact-size block, push it to
//!   the back, leave the cursor untouched.
//! - **Merge:** splice another arena's blocks onto the front; no copying.
//!
//! # Unsafe code
//!
//! Confined to [`block`] and [`arena`], the two modules that touch raw
//! memory. Every `unsafe` block carries a `// SAFETY:` comment.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

pub mod arena;
pub mod block;
pub mod config;
pub mod error;
pub mod stats;

// Public re-exports for the primary API surface.
pub use arena::{Arena, SysArena};
pub use block::{Block, BlockKind, HEADER_SIZE};
pub use config::ArenaConfig;
pub use error::ArenaError;
pub use stats::ArenaStats;
