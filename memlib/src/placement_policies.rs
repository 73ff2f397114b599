use crate::block::Block;
use crate::config::StrategyConfig;

/// A generic trait for placement strategies. Can be used to drive a ContiguousAllocator.
pub trait PlacementPolicy {
    /// Chooses which block should satisfy an allocation request
    ///
    /// Implementations must only return the index of a free block at least `size` bytes long, and
    /// must not assume anything about the blocks beyond them being in ascending address order
    ///
    /// # Arguments
    ///
    /// * `blocks`: The allocator's blocks, in ascending start order
    /// * `size`: The requested size in bytes
    ///
    /// returns: Option<usize>
    fn select(&self, blocks: &[Block], size: u64) -> Option<usize>;
}

/// Takes the first free block that is large enough
#[derive(Debug, Default, Copy, Clone)]
pub struct FirstFit;

impl PlacementPolicy for FirstFit {
    fn select(&self, blocks: &[Block], size: u64) -> Option<usize> {
        blocks.iter().position(|b| b.free && b.size >= size)
    }
}

/// Takes the smallest free block that is large enough. The earliest block wins ties
#[derive(Debug, Default, Copy, Clone)]
pub struct BestFit;

impl PlacementPolicy for BestFit {
    fn select(&self, blocks: &[Block], size: u64) -> Option<usize> {
        let mut best: Option<(usize, u64)> = None;
        for (index, block) in blocks.iter().enumerate() {
            if !block.free || block.size < size {
                continue;
            }
            // Strictly smaller only, so the first of equal candidates is kept
            if best.map_or(true, |(_, best_size)| block.size < best_size) {
                best = Some((index, block.size));
            }
        }
        best.map(|(index, _)| index)
    }
}

/// Takes the largest free block, failing if even that one is too small. The earliest block wins
/// ties
#[derive(Debug, Default, Copy, Clone)]
pub struct WorstFit;

impl PlacementPolicy for WorstFit {
    fn select(&self, blocks: &[Block], size: u64) -> Option<usize> {
        let mut worst: Option<(usize, u64)> = None;
        for (index, block) in blocks.iter().enumerate() {
            if block.free && worst.map_or(true, |(_, worst_size)| block.size > worst_size) {
                worst = Some((index, block.size));
            }
        }
        match worst {
            Some((index, worst_size)) if worst_size >= size => Some(index),
            _ => None,
        }
    }
}

/// Enum over the provided strategies, so the allocator can switch between them at runtime
/// without boxing
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Placement {
    FirstFit,
    BestFit,
    WorstFit,
}

impl Default for Placement {
    fn default() -> Self {
        Placement::FirstFit
    }
}

impl From<StrategyConfig> for Placement {
    fn from(value: StrategyConfig) -> Self {
        match value {
            StrategyConfig::FirstFit => Placement::FirstFit,
            StrategyConfig::BestFit => Placement::BestFit,
            StrategyConfig::WorstFit => Placement::WorstFit,
        }
    }
}

impl PlacementPolicy for Placement {
    fn select(&self, blocks: &[Block], size: u64) -> Option<usize> {
        match self {
            Placement::FirstFit => FirstFit.select(blocks, size),
            Placement::BestFit => BestFit.select(blocks, size),
            Placement::WorstFit => WorstFit.select(blocks, size),
        }
    }
}
