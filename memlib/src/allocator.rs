use std::fmt;
use log::debug;
use crate::block::Block;
use crate::error::{require_non_zero, ConfigError};
use crate::placement_policies::{Placement, PlacementPolicy};

/// A contiguous-block allocator over `[0, total_size)`
///
/// The blocks always cover the whole space in ascending, gap-free order, and after every
/// mutating operation no two neighbouring blocks are both free. Owner ids come from a counter
/// starting at 1 and are never handed out twice, even after the owning block is freed
#[derive(Debug, Clone)]
pub struct ContiguousAllocator {
    blocks: Vec<Block>,
    next_id: u64,
    total_size: u64,
    strategy: Placement,
}

impl ContiguousAllocator {
    pub fn new(total_size: u64, strategy: Placement) -> Result<Self, ConfigError> {
        require_non_zero("memory size", total_size)?;
        Ok(Self {
            blocks: vec![Block::free(0, total_size)],
            next_id: 1,
            total_size,
            strategy,
        })
    }

    /// Allocates `size` bytes using the active strategy, returning the new owner id
    ///
    /// Returns `None`, leaving the allocator untouched, if `size` is zero or the strategy can't
    /// find a suitable block
    pub fn allocate(&mut self, size: u64) -> Option<u64> {
        if size == 0 {
            return None;
        }
        let Some(index) = self.strategy.select(&self.blocks, size) else {
            debug!("{:?} couldn't place {size} bytes", self.strategy);
            return None;
        };
        let id = self.next_id;
        self.next_id += 1;

        let remainder = &mut self.blocks[index];
        let allocated = Block::used(remainder.start, size, id);
        remainder.start += size;
        remainder.size -= size;
        if remainder.size == 0 {
            self.blocks[index] = allocated;
        } else {
            self.blocks.insert(index, allocated);
        }
        debug!("{:?} placed id={id} at {allocated}", self.strategy);
        Some(id)
    }

    /// Frees the block owned by `owner_id` and coalesces. Returns false if no block has that owner
    pub fn free(&mut self, owner_id: u64) -> bool {
        let Some(block) = self.blocks.iter_mut().find(|b| b.owner_id == Some(owner_id)) else {
            debug!("free of unknown id={owner_id}");
            return false;
        };
        block.free = true;
        block.owner_id = None;
        debug!("freed id={owner_id}");
        self.coalesce();
        true
    }

    /// Merges every run of neighbouring free blocks into one block
    pub fn coalesce(&mut self) {
        let mut i = 0;
        while i + 1 < self.blocks.len() {
            if self.blocks[i].free && self.blocks[i + 1].free {
                let next = self.blocks.remove(i + 1);
                self.blocks[i].size += next.size;
            } else {
                i += 1;
            }
        }
    }

    /// The blocks in ascending address order
    pub fn dump(&self) -> &[Block] {
        &self.blocks
    }

    pub fn strategy(&self) -> Placement {
        self.strategy
    }

    /// Switches strategy for subsequent requests. Existing blocks are left as they are
    pub fn set_strategy(&mut self, strategy: Placement) {
        self.strategy = strategy;
    }

    pub fn total_size(&self) -> u64 {
        self.total_size
    }

    /// Bytes currently held by allocated blocks
    pub fn used_memory(&self) -> u64 {
        self.blocks.iter().filter(|b| !b.free).map(|b| b.size).sum()
    }

    pub fn free_memory(&self) -> u64 {
        self.total_size - self.used_memory()
    }
}

impl fmt::Display for ContiguousAllocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, block) in self.blocks.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{block}")?;
        }
        Ok(())
    }
}
