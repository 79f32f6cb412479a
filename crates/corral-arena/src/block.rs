//! Raw memory blocks with an in-place header.
//!
//! A [`Block`] is one allocation from the backing allocator laid out as:
//!
//! ```text
//! raw ─┬─ BlockHeader (padded to HEADER_SIZE) ─┬─ usable bytes ... ─┐
//!      │                                       └ start()            │
//!      └───────────────────── total_size() ─────────────────────────┘
//! ```
//!
//! The header records how many raw bytes were obtained, so a block can be
//! handed back to the backing allocator without the owner remembering the
//! size. `Block` itself is a single pointer to the header.

#![allow(unsafe_code)]

use std::ptr::{self, NonNull};

use corral_core::{is_aligned, BackingAlloc, MAX_ALIGN};
use tracing::trace;

use crate::error::ArenaError;

/// Bytes reserved at the start of every block for its header.
///
/// A multiple of [`MAX_ALIGN`], so the usable range starts maximally
/// aligned whenever the raw allocation does.
pub const HEADER_SIZE: usize = 16;

const _: () = assert!(std::mem::size_of::<BlockHeader>() <= HEADER_SIZE);
const _: () = assert!(HEADER_SIZE % MAX_ALIGN == 0);

/// How a block is used by its arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlockKind {
    /// Sized to the arena's pooled block size and bump-allocated from.
    Pooled,
    /// Sized exactly to one oversized request; never a bump target.
    Large,
}

#[repr(C)]
struct BlockHeader {
    /// Raw bytes obtained from the backing allocator, header included.
    total: usize,
    kind: BlockKind,
}

/// Owning handle to one raw block.
///
/// A `Block` does not release its memory on drop: it does not know its
/// backing allocator. The owning arena must call [`Block::deallocate`]
/// exactly once.
#[derive(Debug)]
pub struct Block {
    header: NonNull<BlockHeader>,
}

impl Block {
    /// Raw bytes a block serving `size` usable bytes will request.
    ///
    /// With `allow_slack`, the total is widened to the backing allocator's
    /// natural size so the rounding slack becomes usable capacity.
    pub fn raw_size<A: BackingAlloc>(
        backing: &A,
        size: usize,
        allow_slack: bool,
    ) -> Result<usize, ArenaError> {
        let total = HEADER_SIZE
            .checked_add(size)
            .ok_or(ArenaError::SizeOverflow { requested: size })?;
        if !allow_slack {
            return Ok(total);
        }
        let natural = backing.natural_size(total);
        debug_assert!(natural >= total, "natural_size shrank {total} to {natural}");
        Ok(natural.max(total))
    }

    /// Acquire a block with at least `size` usable bytes.
    ///
    /// Returns the block and its usable size. Slack-rounded blocks are
    /// [`BlockKind::Pooled`]; exact-size blocks are [`BlockKind::Large`].
    /// A backing failure is returned as [`ArenaError::Backing`] and nothing
    /// is retained.
    pub fn allocate<A: BackingAlloc>(
        backing: &A,
        size: usize,
        allow_slack: bool,
    ) -> Result<(Block, usize), ArenaError> {
        let total = Self::raw_size(backing, size, allow_slack)?;
        let raw = backing.allocate(total)?;
        if !is_aligned(raw, MAX_ALIGN) {
            // SAFETY: `raw` came from `backing.allocate(total)` just above
            // and was never handed out.
            unsafe { backing.deallocate(raw, total) };
            panic!("backing allocator returned misaligned block at {raw:p}");
        }

        let kind = if allow_slack {
            BlockKind::Pooled
        } else {
            BlockKind::Large
        };
        let header = raw.cast::<BlockHeader>();
        // SAFETY: `raw` is MAX_ALIGN-aligned (checked above) and spans at
        // least HEADER_SIZE >= size_of::<BlockHeader>() bytes.
        unsafe { header.as_ptr().write(BlockHeader { total, kind }) };

        let usable = total - HEADER_SIZE;
        trace!(total, usable, ?kind, "block acquired");
        Ok((Block { header }, usable))
    }

    /// Tear down the header and return the block's memory.
    ///
    /// # Safety
    ///
    /// `backing` must be the allocator this block came from (or one for
    /// which [`BackingAlloc::is_same`] holds), and nothing may use a pointer
    /// into the block afterwards.
    pub unsafe fn deallocate<A: BackingAlloc>(self, backing: &A) {
        let total = self.total_size();
        let kind = self.kind();
        let raw = self.header.cast::<u8>();
        // SAFETY: the header was written in `allocate` and is read for the
        // last time above.
        unsafe { ptr::drop_in_place(self.header.as_ptr()) };
        // SAFETY: `raw`/`total` are exactly what `allocate` obtained; the
        // caller guarantees `backing` is compatible and the range is dead.
        unsafe { backing.deallocate(raw, total) };
        trace!(total, ?kind, "block released");
    }

    /// First usable byte, [`MAX_ALIGN`]-aligned.
    #[inline]
    pub fn start(&self) -> NonNull<u8> {
        // SAFETY: every block spans at least HEADER_SIZE bytes, so the
        // offset stays within (or one past) the allocation.
        unsafe { NonNull::new_unchecked(self.header.as_ptr().cast::<u8>().add(HEADER_SIZE)) }
    }

    /// Raw bytes held, header included.
    #[inline]
    pub fn total_size(&self) -> usize {
        self.header().total
    }

    /// Usable bytes following the header.
    #[inline]
    pub fn usable_size(&self) -> usize {
        self.header().total - HEADER_SIZE
    }

    /// Whether this block is pooled or a one-off large block.
    #[inline]
    pub fn kind(&self) -> BlockKind {
        self.header().kind
    }

    /// Whether `ptr` lies in `[start, start + usable_size)`.
    pub fn contains(&self, ptr: NonNull<u8>) -> bool {
        let start = self.start().as_ptr() as usize;
        let addr = ptr.as_ptr() as usize;
        addr >= start && addr - start < self.usable_size()
    }

    fn header(&self) -> &BlockHeader {
        // SAFETY: the header is initialised in `allocate` and lives until
        // `deallocate` consumes the handle.
        unsafe { self.header.as_ref() }
    }
}
