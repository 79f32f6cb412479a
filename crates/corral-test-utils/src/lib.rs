//! Test utilities and instrumented backing allocators for Corral development.
//!
//! [`TrackingAlloc`] wraps any [`BackingAlloc`] and records every live raw
//! allocation, so tests can assert that an arena's teardown returned
//! everything, that sizes round-trip, and that failures leave no residue.
//! The [`fixtures`] module holds small single-purpose allocators.

#![deny(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

use std::ptr::NonNull;
use std::sync::Mutex;

use corral_core::{AllocError, BackingAlloc};
use indexmap::IndexMap;

pub use fixtures::NoSlack;

#[derive(Default)]
struct TrackingState {
    /// Live allocations: address -> size, in allocation order.
    live: IndexMap<usize, usize>,
    allocate_calls: usize,
    deallocate_calls: usize,
    failed_calls: usize,
    /// Successful allocations left before injected failures start.
    fail_after: Option<usize>,
}

/// Backing allocator wrapper that audits every allocate/deallocate pair.
///
/// Panics on a deallocation of an unknown pointer or with a size that does
/// not match the allocation, which catches double frees and foreign frees.
/// State sits behind a `Mutex`, so a `TrackingAlloc` over a `Sync` source is
/// itself `Sync` and can back arenas on several threads.
pub struct TrackingAlloc<A> {
    inner: A,
    state: Mutex<TrackingState>,
}

impl<A: BackingAlloc> TrackingAlloc<A> {
    pub fn new(inner: A) -> Self {
        Self {
            inner,
            state: Mutex::new(TrackingState::default()),
        }
    }

    /// The wrapped allocator.
    pub fn inner(&self) -> &A {
        &self.inner
    }

    /// Allocations not yet returned.
    pub fn outstanding(&self) -> usize {
        self.with_state(|s| s.live.len())
    }

    /// Bytes held by allocations not yet returned.
    pub fn live_bytes(&self) -> usize {
        self.with_state(|s| s.live.values().sum())
    }

    /// Sizes of live allocations, oldest first.
    pub fn live_sizes(&self) -> Vec<usize> {
        self.with_state(|s| s.live.values().copied().collect())
    }

    /// Successful `allocate` calls so far.
    pub fn allocate_calls(&self) -> usize {
        self.with_state(|s| s.allocate_calls)
    }

    /// `deallocate` calls so far.
    pub fn deallocate_calls(&self) -> usize {
        self.with_state(|s| s.deallocate_calls)
    }

    /// `allocate` calls that failed, injected or not.
    pub fn failed_calls(&self) -> usize {
        self.with_state(|s| s.failed_calls)
    }

    /// Let `n` more allocations succeed, then fail every later one with
    /// [`AllocError::OutOfMemory`].
    pub fn fail_after(&self, n: usize) {
        self.with_state(|s| s.fail_after = Some(n));
    }

    /// Stop injecting failures.
    pub fn disarm(&self) {
        self.with_state(|s| s.fail_after = None);
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut TrackingState) -> R) -> R {
        let mut state = self.state.lock().expect("tracking state poisoned");
        f(&mut state)
    }
}

#[allow(unsafe_code)]
impl<A: BackingAlloc> BackingAlloc for TrackingAlloc<A> {
    fn allocate(&self, size: usize) -> Result<NonNull<u8>, AllocError> {
        self.with_state(|s| {
            if let Some(left) = s.fail_after.as_mut() {
                if *left == 0 {
                    s.failed_calls += 1;
                    return Err(AllocError::OutOfMemory { requested: size });
                }
                *left -= 1;
            }
            match self.inner.allocate(size) {
                Ok(ptr) => {
                    let prev = s.live.insert(ptr.as_ptr() as usize, size);
                    assert!(prev.is_none(), "allocator returned live pointer {ptr:p} twice");
                    s.allocate_calls += 1;
                    Ok(ptr)
                }
                Err(err) => {
                    s.failed_calls += 1;
                    Err(err)
                }
            }
        })
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, size: usize) {
        self.with_state(|s| {
            match s.live.shift_remove(&(ptr.as_ptr() as usize)) {
                Some(recorded) => assert_eq!(
                    recorded, size,
                    "deallocate size mismatch for {ptr:p}"
                ),
                None => panic!("deallocate of untracked pointer {ptr:p}"),
            }
            s.deallocate_calls += 1;
        });
        // SAFETY: the pointer was live in `inner` with this size (checked
        // against the tracking table above).
        unsafe { self.inner.deallocate(ptr, size) };
    }

    fn natural_size(&self, size: usize) -> usize {
        self.inner.natural_size(size)
    }
}
