//! Reusable backing-allocator fixtures.
//!
//! - [`NoSlack`]: forwards to an inner allocator but reports no size-class
//!   slack, so block capacities are exactly what was asked for.
//! - [`Misaligned`]: hands out pointers one byte off `MAX_ALIGN`, to
//!   exercise alignment checks.

#![allow(unsafe_code)]

use std::ptr::NonNull;

use corral_core::{AllocError, BackingAlloc, SystemHeap, MAX_ALIGN};

/// Forwards to `A` with `natural_size` pinned to the identity.
///
/// Useful when a test wants to predict cursor positions without depending
/// on the inner allocator's size classes.
#[derive(Debug, Default)]
pub struct NoSlack<A>(pub A);

impl<A: BackingAlloc> BackingAlloc for NoSlack<A> {
    fn allocate(&self, size: usize) -> Result<NonNull<u8>, AllocError> {
        self.0.allocate(size)
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, size: usize) {
        // SAFETY: forwarded unchanged; the caller upholds the contract.
        unsafe { self.0.deallocate(ptr, size) }
    }

    fn is_same(&self, other: &Self) -> bool {
        self.0.is_same(&other.0)
    }
}

/// Returns every allocation offset by one byte from `MAX_ALIGN`.
///
/// Violates the [`BackingAlloc`] contract on purpose.
#[derive(Debug, Default)]
pub struct Misaligned;

impl BackingAlloc for Misaligned {
    fn allocate(&self, size: usize) -> Result<NonNull<u8>, AllocError> {
        let padded = size.checked_add(MAX_ALIGN).ok_or(AllocError::TooLarge {
            requested: size,
            limit: usize::MAX - MAX_ALIGN,
        })?;
        let base = SystemHeap.allocate(padded)?;
        // SAFETY: `padded` > 1, so offset 1 stays inside the allocation.
        Ok(unsafe { NonNull::new_unchecked(base.as_ptr().add(1)) })
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, size: usize) {
        // SAFETY: undoes the offset applied in `allocate`.
        unsafe {
            let base = NonNull::new_unchecked(ptr.as_ptr().sub(1));
            SystemHeap.deallocate(base, size + MAX_ALIGN);
        }
    }
}
