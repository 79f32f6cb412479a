//! Alignment constants and size rounding.

use std::ptr::NonNull;

/// The strictest scalar alignment the arena guarantees for every address
/// it hands out.
///
/// Matches `alignof(max_align_t)` on the 64-bit targets we care about, and
/// the granularity of the common `malloc` implementations.
pub const MAX_ALIGN: usize = 16;

/// Round `n` up to the next multiple of `align`.
///
/// `align` must be a power of two. Returns `None` if the result does not
/// fit in a `usize`.
#[inline]
pub fn round_up(n: usize, align: usize) -> Option<usize> {
    debug_assert!(align.is_power_of_two());
    let mask = align - 1;
    n.checked_add(mask).map(|v| v & !mask)
}

/// Whether `ptr` is a multiple of `align`.
#[inline]
pub fn is_aligned(ptr: NonNull<u8>, align: usize) -> bool {
    (ptr.as_ptr() as usize) & (align - 1) == 0
}
