//! Fixed-slot pool backing allocator.
//!
//! [`FixedPool`] reserves one region at construction and serves it as
//! `slot_count` equal slots. It never grows, which makes it useful for
//! exercising exhaustion paths deterministically and for workloads with a
//! hard memory ceiling.

#![allow(unsafe_code)]

use std::alloc::{self, Layout};
use std::cell::RefCell;
use std::ptr::NonNull;

use crate::align::{round_up, MAX_ALIGN};
use crate::backing::BackingAlloc;
use crate::error::AllocError;

struct SlotState {
    /// Free slot indices; popped from the back, so lower indices go first.
    free: Vec<usize>,
    occupied: Vec<bool>,
}

/// A backing allocator made of `slot_count` slots of `slot_size` bytes.
///
/// Any request up to `slot_size` consumes one whole slot, which is why
/// [`natural_size`](BackingAlloc::natural_size) reports `slot_size` for
/// those requests. Larger requests fail with [`AllocError::TooLarge`].
pub struct FixedPool {
    base: NonNull<u8>,
    region: Layout,
    slot_size: usize,
    slot_count: usize,
    state: RefCell<SlotState>,
}

impl FixedPool {
    /// Reserve a pool of `slot_count` slots of at least `slot_size` bytes.
    ///
    /// `slot_size` is rounded up to [`MAX_ALIGN`] (and to at least
    /// `MAX_ALIGN`) so every slot start stays aligned.
    pub fn new(slot_size: usize, slot_count: usize) -> Result<Self, AllocError> {
        let slot_size = round_up(slot_size.max(1), MAX_ALIGN).ok_or(AllocError::TooLarge {
            requested: slot_size,
            limit: isize::MAX as usize,
        })?;
        let total = slot_size
            .checked_mul(slot_count)
            .ok_or(AllocError::TooLarge {
                requested: usize::MAX,
                limit: isize::MAX as usize,
            })?;
        let region = Layout::from_size_align(total.max(MAX_ALIGN), MAX_ALIGN).map_err(|_| {
            AllocError::TooLarge {
                requested: total,
                limit: isize::MAX as usize,
            }
        })?;
        // SAFETY: `region` has non-zero size.
        let base = NonNull::new(unsafe { alloc::alloc(region) })
            .ok_or(AllocError::OutOfMemory { requested: total })?;

        Ok(Self {
            base,
            region,
            slot_size,
            slot_count,
            state: RefCell::new(SlotState {
                free: (0..slot_count).rev().collect(),
                occupied: vec![false; slot_count],
            }),
        })
    }

    /// Bytes per slot after alignment rounding.
    pub fn slot_size(&self) -> usize {
        self.slot_size
    }

    /// Total number of slots.
    pub fn slot_count(&self) -> usize {
        self.slot_count
    }

    /// Number of slots currently handed out.
    pub fn in_use(&self) -> usize {
        let state = self.state.borrow();
        self.slot_count - state.free.len()
    }

    fn slot_index(&self, ptr: NonNull<u8>) -> Option<usize> {
        let offset = (ptr.as_ptr() as usize).checked_sub(self.base.as_ptr() as usize)?;
        if offset % self.slot_size != 0 {
            return None;
        }
        let index = offset / self.slot_size;
        (index < self.slot_count).then_some(index)
    }
}

impl BackingAlloc for FixedPool {
    fn allocate(&self, size: usize) -> Result<NonNull<u8>, AllocError> {
        if size > self.slot_size {
            return Err(AllocError::TooLarge {
                requested: size,
                limit: self.slot_size,
            });
        }
        let mut state = self.state.borrow_mut();
        let index = state.free.pop().ok_or(AllocError::Exhausted {
            requested: size,
            slots: self.slot_count,
        })?;
        state.occupied[index] = true;
        // SAFETY: index < slot_count, so the offset stays inside `region`.
        let ptr = unsafe { self.base.as_ptr().add(index * self.slot_size) };
        // SAFETY: derived from a non-null base by an in-bounds offset.
        Ok(unsafe { NonNull::new_unchecked(ptr) })
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, size: usize) {
        debug_assert!(size <= self.slot_size);
        let index = self
            .slot_index(ptr)
            .unwrap_or_else(|| panic!("pointer {ptr:p} does not belong to this pool"));
        let mut state = self.state.borrow_mut();
        assert!(state.occupied[index], "double free of pool slot {index}");
        state.occupied[index] = false;
        state.free.push(index);
    }

    fn natural_size(&self, size: usize) -> usize {
        if size <= self.slot_size {
            self.slot_size
        } else {
            size
        }
    }
}

impl Drop for FixedPool {
    fn drop(&mut self) {
        // SAFETY: `base` was allocated in `new` with exactly `region`.
        unsafe { alloc::dealloc(self.base.as_ptr(), self.region) };
    }
}

impl std::fmt::Debug for FixedPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FixedPool")
            .field("slot_size", &self.slot_size)
            .field("slot_count", &self.slot_count)
            .field("in_use", &self.in_use())
            .finish()
    }
}
