//! The process heap as a backing allocator.

#![allow(unsafe_code)]

use std::alloc::{self, Layout};
use std::ptr::NonNull;

use crate::align::{round_up, MAX_ALIGN};
use crate::backing::BackingAlloc;
use crate::error::AllocError;

/// Largest size served with the fine 16-byte spacing before switching to
/// the geometric size-class ladder.
const SMALL_CLASS_MAX: usize = 128;

/// Backing allocator over the Rust global allocator.
///
/// Every request is laid out with [`MAX_ALIGN`] alignment. Zero-byte
/// requests are served as `MAX_ALIGN`-byte allocations so the global
/// allocator is never asked for an empty layout.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SystemHeap;

impl SystemHeap {
    fn layout(size: usize) -> Result<Layout, AllocError> {
        Layout::from_size_align(size.max(MAX_ALIGN), MAX_ALIGN).map_err(|_| {
            AllocError::TooLarge {
                requested: size,
                limit: isize::MAX as usize - (MAX_ALIGN - 1),
            }
        })
    }
}

impl BackingAlloc for SystemHeap {
    fn allocate(&self, size: usize) -> Result<NonNull<u8>, AllocError> {
        let layout = Self::layout(size)?;
        // SAFETY: `layout` has non-zero size (clamped to MAX_ALIGN above).
        let ptr = unsafe { alloc::alloc(layout) };
        NonNull::new(ptr).ok_or(AllocError::OutOfMemory { requested: size })
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, size: usize) {
        // `allocate` already validated this size, so the layout rebuilds.
        if let Ok(layout) = Self::layout(size) {
            // SAFETY: the caller guarantees `ptr` came from `allocate(size)`,
            // which used exactly this layout.
            unsafe { alloc::dealloc(ptr.as_ptr(), layout) };
        }
    }

    /// Size classes in the style of jemalloc: 16-byte steps up to 128 bytes,
    /// then four evenly spaced classes per power-of-two group.
    fn natural_size(&self, size: usize) -> usize {
        if size <= SMALL_CLASS_MAX {
            return round_up(size.max(1), MAX_ALIGN).unwrap_or(size);
        }
        let Some(group_top) = size.checked_next_power_of_two() else {
            return size;
        };
        let spacing = (group_top / 8).max(MAX_ALIGN);
        round_up(size, spacing).unwrap_or(size)
    }

    fn is_same(&self, _other: &Self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::align::is_aligned;

    #[test]
    fn allocate_is_max_aligned() {
        let heap = SystemHeap;
        for size in [0usize, 1, 7, 16, 100, 4096, 70_000] {
            let p = heap.allocate(size).unwrap();
            assert!(is_aligned(p, MAX_ALIGN), "size {size} misaligned");
            // SAFETY: just allocated with the same size.
            unsafe { heap.deallocate(p, size) };
        }
    }

    #[test]
    fn allocation_is_writable() {
        let heap = SystemHeap;
        let p = heap.allocate(64).unwrap();
        // SAFETY: 64 bytes were just allocated at `p`.
        unsafe {
            std::ptr::write_bytes(p.as_ptr(), 0xAB, 64);
            assert_eq!(*p.as_ptr().add(63), 0xAB);
            heap.deallocate(p, 64);
        }
    }

    #[test]
    fn huge_request_is_rejected_not_aborted() {
        let heap = SystemHeap;
        let err = heap.allocate(usize::MAX).unwrap_err();
        assert!(matches!(err, AllocError::TooLarge { .. }));
    }

    #[test]
    fn natural_size_ladder() {
        let heap = SystemHeap;
        assert_eq!(heap.natural_size(0), 16);
        assert_eq!(heap.natural_size(1), 16);
        assert_eq!(heap.natural_size(100), 112);
        assert_eq!(heap.natural_size(128), 128);
        assert_eq!(heap.natural_size(129), 160);
        assert_eq!(heap.natural_size(4096), 4096);
        assert_eq!(heap.natural_size(4097), 5120);
    }

    #[test]
    fn natural_size_overflow_returns_input() {
        let heap = SystemHeap;
        assert_eq!(heap.natural_size(usize::MAX), usize::MAX);
    }

    #[test]
    fn distinct_instances_are_compatible() {
        let a = SystemHeap;
        let b = SystemHeap;
        assert!(a.is_same(&b));
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn natural_size_never_shrinks(n in 0usize..(1 << 48)) {
                let heap = SystemHeap;
                let m = heap.natural_size(n);
                prop_assert!(m >= n);
                prop_assert_eq!(m % MAX_ALIGN, 0);
            }

            #[test]
            fn natural_size_is_idempotent(n in 1usize..(1 << 32)) {
                let heap = SystemHeap;
                let m = heap.natural_size(n);
                prop_assert_eq!(heap.natural_size(m), m);
            }
        }
    }
}
