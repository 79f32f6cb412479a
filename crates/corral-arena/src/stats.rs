//! Point-in-time arena accounting.

/// Snapshot of an arena's block and byte accounting.
///
/// Produced by [`Arena::stats`](crate::Arena::stats). All byte counts are
/// exact; nothing is sampled.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ArenaStats {
    /// Blocks owned, pooled and large.
    pub block_count: usize,
    /// Blocks sized to the pooled block size.
    pub pooled_blocks: usize,
    /// One-off blocks sized to a single oversized request.
    pub large_blocks: usize,
    /// Raw bytes held from the backing allocator, headers included.
    pub total_bytes: usize,
    /// Bytes handed out to callers.
    pub bytes_used: usize,
    /// Bytes left in the current bump region.
    pub remaining: usize,
}

impl ArenaStats {
    /// Raw bytes held but not handed out: headers, slack, and the unused
    /// tails of retired pooled blocks.
    pub fn overhead_bytes(&self) -> usize {
        self.total_bytes.saturating_sub(self.bytes_used)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_stats_are_zero() {
        let s = ArenaStats::default();
        assert_eq!(s.block_count, 0);
        assert_eq!(s.total_bytes, 0);
        assert_eq!(s.overhead_bytes(), 0);
    }

    #[test]
    fn overhead_is_total_minus_used() {
        let s = ArenaStats {
            block_count: 1,
            pooled_blocks: 1,
            large_blocks: 0,
            total_bytes: 4096,
            bytes_used: 1000,
            remaining: 3080,
        };
        assert_eq!(s.overhead_bytes(), 3096);
    }
}
