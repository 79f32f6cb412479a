//! The capability contract between an arena and its raw memory source.

#![allow(unsafe_code)]

use std::ptr::NonNull;

use crate::error::AllocError;

/// A source of raw, untyped memory.
///
/// Arenas borrow a backing allocator for their whole lifetime and call it
/// only on the slow path: once per block acquired, once per block released.
/// Methods take `&self`; stateful implementations use interior mutability.
///
/// # Contract
///
/// - [`allocate`](Self::allocate) returns at least `size` bytes whose start
///   is aligned to [`MAX_ALIGN`](crate::MAX_ALIGN), or fails without side
///   effects.
/// - [`deallocate`](Self::deallocate) receives exactly the pointer and size
///   of an earlier successful `allocate` on the same instance, at most once.
/// - [`natural_size`](Self::natural_size) never returns less than its input.
pub trait BackingAlloc {
    /// Obtain at least `size` bytes aligned to `MAX_ALIGN`.
    fn allocate(&self, size: usize) -> Result<NonNull<u8>, AllocError>;

    /// Return memory obtained from [`allocate`](Self::allocate).
    ///
    /// # Safety
    ///
    /// `ptr` must come from `self.allocate(size)` with the same `size`, must
    /// not have been deallocated already, and no reference into the range
    /// may be used afterwards.
    unsafe fn deallocate(&self, ptr: NonNull<u8>, size: usize);

    /// The size this source would actually reserve for a `size`-byte request.
    ///
    /// Callers that are about to carve many small pieces out of one request
    /// can ask for this rounded size up front and use the slack instead of
    /// wasting it. The default reports no slack.
    fn natural_size(&self, size: usize) -> usize {
        size
    }

    /// Whether memory from `other` may be released through `self`.
    ///
    /// Arenas check this before splicing blocks from one into another. The
    /// default compares instance addresses; stateless sources that share one
    /// underlying heap should return `true`.
    fn is_same(&self, other: &Self) -> bool {
        std::ptr::eq(self, other)
    }
}
