//! Integration test: the canonical block lifecycle walk-through.
//!
//! With a 4096-byte pooled block size: two small requests share one pooled
//! block, a 5000-byte request gets its own exact-size block at the back,
//! and merging a second arena holding two blocks brings the count to four
//! without moving the cursor. Dropping the arena returns every block.

use std::ptr::NonNull;

use corral_arena::{Arena, ArenaConfig, HEADER_SIZE};
use corral_core::{is_aligned, SystemHeap, MAX_ALIGN};
use corral_test_utils::{NoSlack, TrackingAlloc};

fn addr(p: NonNull<u8>) -> usize {
    p.as_ptr() as usize
}

#[test]
fn pooled_large_and_merged_blocks() {
    let heap = TrackingAlloc::new(NoSlack(SystemHeap));
    {
        let arena = Arena::new(&heap, ArenaConfig::new(4096)).unwrap();

        // 100 bytes: new pooled block, cursor past the rounded request.
        let start = arena.allocate(100).unwrap();
        assert!(is_aligned(start, MAX_ALIGN));
        let (ptr, end) = arena.cursor().unwrap();
        assert_eq!(addr(ptr), addr(start) + 112);
        assert_eq!(addr(end), addr(start) + 4096);
        assert_eq!(arena.remaining(), 4096 - 112);

        // 50 more bytes: fast path from the same block.
        let second = arena.allocate(50).unwrap();
        assert_eq!(addr(second), addr(start) + 112);
        assert_eq!(addr(arena.cursor().unwrap().0), addr(start) + 176);
        assert_eq!(heap.allocate_calls(), 1);

        // 5000 bytes: one-off block of exactly 5000 + header, cursor untouched.
        let cursor = arena.cursor();
        let large = arena.allocate(5000).unwrap();
        assert_eq!(arena.cursor(), cursor);
        assert_eq!(heap.live_sizes(), vec![4096 + HEADER_SIZE, 5000 + HEADER_SIZE]);
        assert!(arena.contains(large));

        // A second arena with two blocks.
        let other = Arena::new(&heap, ArenaConfig::new(4096)).unwrap();
        other.allocate(10).unwrap();
        other.allocate(9000).unwrap();
        assert_eq!(other.block_count(), 2);

        arena.merge(other);
        assert_eq!(arena.block_count(), 4);
        assert_eq!(arena.cursor(), cursor);

        let stats = arena.stats();
        assert_eq!(stats.pooled_blocks, 2);
        assert_eq!(stats.large_blocks, 2);
        assert_eq!(
            stats.total_bytes,
            2 * (4096 + HEADER_SIZE) + (5000 + HEADER_SIZE) + (9000 + HEADER_SIZE)
        );
        // Large requests are counted at their rounded size too.
        assert_eq!(stats.bytes_used, 112 + 64 + 5008 + 16 + 9008);
        assert_eq!(heap.outstanding(), 4);
    }
    assert_eq!(heap.outstanding(), 0);
    assert_eq!(heap.allocate_calls(), 4);
    assert_eq!(heap.deallocate_calls(), 4);
}

#[test]
fn payload_survives_merge_without_copying() {
    let heap = TrackingAlloc::new(SystemHeap);
    let target = Arena::new(&heap, ArenaConfig::default()).unwrap();
    let source = Arena::new(&heap, ArenaConfig::default()).unwrap();

    let small = source.alloc_copy(b"small payload").unwrap().as_ptr() as usize;
    let big = source.alloc_copy(&[0xEE; 6000]).unwrap().as_ptr() as usize;

    target.merge(source);

    let small = NonNull::new(small as *mut u8).unwrap();
    let big = NonNull::new(big as *mut u8).unwrap();
    assert!(target.contains(small));
    assert!(target.contains(big));
    // SAFETY: both ranges live in blocks now owned by `target`, which is
    // still alive, and nothing else aliases them.
    unsafe {
        assert_eq!(std::slice::from_raw_parts(small.as_ptr(), 13), b"small payload");
        assert!(std::slice::from_raw_parts(big.as_ptr(), 6000)
            .iter()
            .all(|&b| b == 0xEE));
    }
    assert_eq!(heap.outstanding(), 2);
}

#[test]
fn many_small_requests_amortise_block_acquisition() {
    let heap = TrackingAlloc::new(NoSlack(SystemHeap));
    let arena = Arena::new(&heap, ArenaConfig::new(1024)).unwrap();
    for _ in 0..640 {
        arena.allocate(16).unwrap();
    }
    // 1024 / 16 = 64 requests per pooled block.
    assert_eq!(heap.allocate_calls(), 10);
    assert_eq!(arena.remaining(), 0);
    assert_eq!(arena.stats().overhead_bytes(), 10 * HEADER_SIZE);
}
