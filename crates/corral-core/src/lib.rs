//! Core types and traits for the Corral arena allocator.
//!
//! This is the leaf crate with zero internal dependencies. It defines the
//! capability contract an arena consumes from its raw memory source, the
//! alignment constants every layer agrees on, and two concrete sources:
//!
//! - [`SystemHeap`]: the process-wide global allocator.
//! - [`FixedPool`]: a fixed number of equal-sized slots, handy for tests
//!   that need deterministic exhaustion.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

pub mod align;
pub mod backing;
pub mod error;
pub mod heap;
pub mod pool;

pub use align::{is_aligned, round_up, MAX_ALIGN};
pub use backing::BackingAlloc;
pub use error::AllocError;
pub use heap::SystemHeap;
pub use pool::FixedPool;
