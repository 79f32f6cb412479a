//! Benchmark workloads for Corral arenas.
//!
//! Provides deterministic request-size sequences shaped like the workloads
//! arenas are built for:
//!
//! - [`parse_tree_profile`]: many small node-sized requests
//! - [`mixed_profile`]: small requests with periodic oversized buffers
//! - [`fill`]: replay a sequence against an arena

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use corral_arena::{Arena, ArenaError};
use corral_core::BackingAlloc;

/// Node sizes typical of an AST: tokens, leaves, binary and n-ary nodes.
const NODE_SIZES: [usize; 6] = [16, 24, 32, 48, 64, 96];

/// Cheap deterministic mixing step for size selection.
fn mix(seed: u64, i: u64) -> u64 {
    seed.wrapping_mul(6364136223846793005)
        .wrapping_add(i.wrapping_mul(1442695040888963407))
        >> 33
}

/// `nodes` small requests drawn deterministically from typical node sizes.
pub fn parse_tree_profile(nodes: usize, seed: u64) -> Vec<usize> {
    (0..nodes as u64)
        .map(|i| NODE_SIZES[(mix(seed, i) % NODE_SIZES.len() as u64) as usize])
        .collect()
}

/// Like [`parse_tree_profile`], but every `large_every`-th request is a
/// `large_size`-byte buffer.
pub fn mixed_profile(n: usize, seed: u64, large_every: usize, large_size: usize) -> Vec<usize> {
    let mut sizes = parse_tree_profile(n, seed);
    if large_every > 0 {
        for size in sizes.iter_mut().skip(large_every - 1).step_by(large_every) {
            *size = large_size;
        }
    }
    sizes
}

/// Allocate every size in `sizes` from `arena`; returns the bytes requested.
pub fn fill<A: BackingAlloc>(arena: &Arena<'_, A>, sizes: &[usize]) -> Result<usize, ArenaError> {
    let mut total = 0;
    for &size in sizes {
        arena.allocate(size)?;
        total += size;
    }
    Ok(total)
}
