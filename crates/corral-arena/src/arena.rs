//! The arena: block ownership, bump allocation, merge, and teardown.
//!
//! [`Arena`] owns a list of [`Block`]s and a bump cursor (`ptr`, `end`)
//! into the current pooled block. Requests that fit the cursor are served
//! by advancing it. Everything else goes through the slow path, which picks
//! one of two block shapes:
//!
//! ```text
//! rounded size <= min_block_size   pooled block, slack-rounded, pushed to
//!                                  the front, becomes the bump target
//! rounded size >  min_block_size   large block, exact size, pushed to the
//!                                  back, cursor left alone
//! ```
//!
//! Nothing is ever freed individually. Blocks go back to the backing
//! allocator when the arena is dropped, front to back.

#![allow(unsafe_code)]

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fmt;
use std::ptr::{self, NonNull};

use corral_core::{round_up, AllocError, BackingAlloc, SystemHeap, MAX_ALIGN};
use tracing::{debug, trace};

use crate::block::{Block, BlockKind};
use crate::config::ArenaConfig;
use crate::error::ArenaError;
use crate::stats::ArenaStats;

static SYSTEM_HEAP: SystemHeap = SystemHeap;

/// An arena drawing from the process heap.
pub type SysArena<'a> = Arena<'a, SystemHeap>;

/// Region allocator with O(1) bump allocation and whole-arena release.
///
/// Allocation takes `&self`, so any number of allocations can be alive at
/// once; each borrows the arena, which the compiler then refuses to drop or
/// move while they are in use. Raw pointers from [`Arena::allocate`] carry
/// no such tie and dangle once the arena is dropped.
///
/// # Thread safety
///
/// `Arena` is `Send` when its backing allocator is `Sync`, and never `Sync`:
/// hand arenas between threads, but serialise all use of any one arena.
pub struct Arena<'a, A: BackingAlloc> {
    backing: &'a A,
    config: ArenaConfig,
    /// Owned blocks. Pooled blocks are pushed to the front, large blocks to
    /// the back, merged blocks spliced in at the front.
    blocks: RefCell<VecDeque<Block>>,
    /// Next free byte in the current pooled block, or null.
    ptr: Cell<*mut u8>,
    /// One past the current pooled block's last usable byte, or null.
    end: Cell<*mut u8>,
    /// Raw bytes of all owned blocks, headers included.
    total_size: Cell<usize>,
    /// Bytes handed out to callers.
    bytes_used: Cell<usize>,
}

// SAFETY: the arena exclusively owns its blocks; the raw cursor only points
// into them. The one shared resource is `&A`, which is `Send` iff `A: Sync`.
// `Cell`/`RefCell` keep the arena `!Sync`, so moving it is the only sharing.
unsafe impl<A: BackingAlloc + Sync> Send for Arena<'_, A> {}

impl Arena<'static, SystemHeap> {
    /// Create an arena backed by the process heap.
    pub fn system(config: ArenaConfig) -> Result<Self, ArenaError> {
        Self::new(&SYSTEM_HEAP, config)
    }
}

impl<'a, A: BackingAlloc> Arena<'a, A> {
    /// Create an empty arena bound to `backing`.
    ///
    /// No memory is acquired until the first allocation. Returns
    /// [`ArenaError::InvalidConfig`] if `config` fails validation.
    pub fn new(backing: &'a A, config: ArenaConfig) -> Result<Self, ArenaError> {
        config.validate()?;
        Ok(Self {
            backing,
            config,
            blocks: RefCell::new(VecDeque::new()),
            ptr: Cell::new(ptr::null_mut()),
            end: Cell::new(ptr::null_mut()),
            total_size: Cell::new(0),
            bytes_used: Cell::new(0),
        })
    }

    /// Create an arena with the given pooled block size and no size limit.
    pub fn with_min_block_size(backing: &'a A, min_block_size: usize) -> Result<Self, ArenaError> {
        Self::new(backing, ArenaConfig::new(min_block_size))
    }

    /// Allocate `size` bytes, [`MAX_ALIGN`]-aligned.
    ///
    /// `size` is rounded up to a multiple of `MAX_ALIGN` for the bump
    /// cursor. Any request that fits the current bump region is served from
    /// it, including one larger than `min_block_size` when the backing
    /// allocator's slack left enough room; the size class only decides what
    /// kind of block the slow path acquires. Zero-size requests return an aligned pointer that must not be
    /// read or written. The memory is uninitialised and stays valid until
    /// the arena (or the arena it is merged into) is dropped.
    ///
    /// On failure the arena is left exactly as before the call.
    #[inline]
    pub fn allocate(&self, size: usize) -> Result<NonNull<u8>, ArenaError> {
        let rounded =
            round_up(size, MAX_ALIGN).ok_or(ArenaError::SizeOverflow { requested: size })?;
        if let Some(cur) = NonNull::new(self.ptr.get()) {
            if self.remaining() >= rounded {
                // SAFETY: `remaining() >= rounded` keeps the new cursor
                // within (or one past) the current block's usable range.
                self.ptr.set(unsafe { cur.as_ptr().add(rounded) });
                self.bytes_used.set(self.bytes_used.get() + rounded);
                return Ok(cur);
            }
        }
        self.allocate_slow(size, rounded)
    }

    #[cold]
    #[inline(never)]
    fn allocate_slow(&self, size: usize, rounded: usize) -> Result<NonNull<u8>, ArenaError> {
        let large = rounded > self.config.min_block_size;
        let (request, allow_slack) = if large {
            (size, false)
        } else {
            (self.config.min_block_size, true)
        };

        let raw = Block::raw_size(self.backing, request, allow_slack)?;
        let held = self.total_size.get();
        if held
            .checked_add(raw)
            .is_none_or(|total| total > self.config.size_limit)
        {
            return Err(ArenaError::SizeLimitExceeded {
                requested: raw,
                held,
                limit: self.config.size_limit,
            });
        }

        let mut blocks = self.blocks.borrow_mut();
        blocks
            .try_reserve(1)
            .map_err(|_| AllocError::OutOfMemory {
                requested: std::mem::size_of::<Block>(),
            })?;
        let (block, usable) = Block::allocate(self.backing, request, allow_slack)?;
        debug_assert!(usable >= size);

        let start = block.start();
        self.total_size.set(held + block.total_size());
        if large {
            blocks.push_back(block);
            self.bytes_used.set(self.bytes_used.get() + rounded);
        } else {
            blocks.push_front(block);
            // SAFETY: rounded <= min_block_size <= usable, so both offsets
            // stay within (or one past) the new block's usable range.
            unsafe {
                self.ptr.set(start.as_ptr().add(rounded));
                self.end.set(start.as_ptr().add(usable));
            }
            self.bytes_used.set(self.bytes_used.get() + rounded);
        }
        trace!(size, large, usable, blocks = blocks.len(), "arena slow path");
        Ok(start)
    }

    /// Allocate `size` zeroed bytes borrowed from the arena.
    #[allow(clippy::mut_from_ref)]
    pub fn alloc_zeroed(&self, size: usize) -> Result<&mut [u8], ArenaError> {
        let ptr = self.allocate(size)?;
        // SAFETY: `allocate` returned `size` bytes that no other allocation
        // overlaps, inside a block that lives at least as long as `&self`.
        unsafe {
            ptr::write_bytes(ptr.as_ptr(), 0, size);
            Ok(std::slice::from_raw_parts_mut(ptr.as_ptr(), size))
        }
    }

    /// Copy `bytes` into the arena and return the copy.
    #[allow(clippy::mut_from_ref)]
    pub fn alloc_copy(&self, bytes: &[u8]) -> Result<&mut [u8], ArenaError> {
        let ptr = self.allocate(bytes.len())?;
        // SAFETY: as in `alloc_zeroed`; the fresh range cannot overlap `bytes`.
        unsafe {
            ptr::copy_nonoverlapping(bytes.as_ptr(), ptr.as_ptr(), bytes.len());
            Ok(std::slice::from_raw_parts_mut(ptr.as_ptr(), bytes.len()))
        }
    }

    /// Take ownership of every block in `other`, consuming it.
    ///
    /// See [`Arena::merge_from`].
    pub fn merge(&self, mut other: Arena<'_, A>) {
        self.merge_from(&mut other);
    }

    /// Move every block owned by `other` to the front of this arena's list.
    ///
    /// No payload is copied. Afterwards `other` owns nothing and has a null
    /// cursor, as if freshly created; its backing allocator and config are
    /// kept. This arena's cursor is unchanged: `other`'s current block is
    /// not promoted to bump target.
    ///
    /// # Panics
    ///
    /// Panics if the two arenas' backing allocators are not
    /// [`is_same`](BackingAlloc::is_same), before any block moves.
    ///
    /// # Aborts
    ///
    /// Growing this arena's block list can abort the process if memory for
    /// the list itself runs out. The list grows before `other` is emptied.
    pub fn merge_from(&self, other: &mut Arena<'_, A>) {
        assert!(
            self.backing.is_same(other.backing),
            "cannot merge arenas bound to different backing allocators"
        );

        let mut ours = self.blocks.borrow_mut();
        ours.reserve(other.blocks.get_mut().len());

        let theirs = std::mem::take(other.blocks.get_mut());
        other.ptr.set(ptr::null_mut());
        other.end.set(ptr::null_mut());
        let moved_bytes = other.total_size.replace(0);
        let moved_used = other.bytes_used.replace(0);
        if theirs.is_empty() {
            return;
        }

        let moved = theirs.len();
        for block in theirs.into_iter().rev() {
            ours.push_front(block);
        }
        self.total_size.set(self.total_size.get() + moved_bytes);
        self.bytes_used.set(self.bytes_used.get() + moved_used);
        debug!(moved, blocks = ours.len(), bytes = moved_bytes, "arena merged");
    }

    /// Bytes left in the current bump region.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.end.get() as usize - self.ptr.get() as usize
    }

    /// The bump cursor `(ptr, end)`, or `None` before the first pooled block.
    pub fn cursor(&self) -> Option<(NonNull<u8>, NonNull<u8>)> {
        Some((NonNull::new(self.ptr.get())?, NonNull::new(self.end.get())?))
    }

    /// Number of blocks owned.
    pub fn block_count(&self) -> usize {
        self.blocks.borrow().len()
    }

    /// Raw bytes held from the backing allocator, headers included.
    pub fn total_size(&self) -> usize {
        self.total_size.get()
    }

    /// Bytes handed out to callers, after alignment rounding.
    pub fn bytes_used(&self) -> usize {
        self.bytes_used.get()
    }

    /// Usable bytes per pooled block requested from the backing allocator.
    pub fn min_block_size(&self) -> usize {
        self.config.min_block_size
    }

    /// The arena's configuration.
    pub fn config(&self) -> &ArenaConfig {
        &self.config
    }

    /// The backing allocator this arena draws from.
    pub fn backing(&self) -> &'a A {
        self.backing
    }

    /// Whether `ptr` falls inside the usable range of a block this arena
    /// owns. Linear in the number of blocks.
    pub fn contains(&self, ptr: NonNull<u8>) -> bool {
        self.blocks.borrow().iter().any(|b| b.contains(ptr))
    }

    /// Block and byte accounting.
    pub fn stats(&self) -> ArenaStats {
        let blocks = self.blocks.borrow();
        let pooled_blocks = blocks
            .iter()
            .filter(|b| b.kind() == BlockKind::Pooled)
            .count();
        ArenaStats {
            block_count: blocks.len(),
            pooled_blocks,
            large_blocks: blocks.len() - pooled_blocks,
            total_bytes: self.total_size.get(),
            bytes_used: self.bytes_used.get(),
            remaining: self.remaining(),
        }
    }
}

impl<A: BackingAlloc> Drop for Arena<'_, A> {
    fn drop(&mut self) {
        let blocks = self.blocks.get_mut();
        if blocks.is_empty() {
            return;
        }
        let count = blocks.len();
        while let Some(block) = blocks.pop_front() {
            // SAFETY: every block was acquired from `self.backing` or from an
            // `is_same` allocator (checked on merge), and `&mut self` proves
            // no borrowed allocation is still alive.
            unsafe { block.deallocate(self.backing) };
        }
        self.ptr.set(ptr::null_mut());
        self.end.set(ptr::null_mut());
        debug!(
            blocks = count,
            bytes = self.total_size.get(),
            "arena released"
        );
    }
}

impl<A: BackingAlloc> fmt::Debug for Arena<'_, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Arena")
            .field("min_block_size", &self.config.min_block_size)
            .field("blocks", &self.block_count())
            .field("total_size", &self.total_size.get())
            .field("bytes_used", &self.bytes_used.get())
            .field("remaining", &self.remaining())
            .finish()
    }
}
