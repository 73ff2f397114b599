use std::collections::HashMap;
use log::debug;
use crate::error::{require_power_of_two, ConfigError};

/// A power-of-two buddy allocator
///
/// Free blocks are kept in one stack of start addresses per order, where a block of order `k` is
/// `2^k` bytes and aligned to `2^k`. The most recently freed or split-off block is reused first.
/// Allocations are recorded at the order that was requested, so internal fragmentation is
/// `2^order - requested_size`
#[derive(Debug, Clone)]
pub struct BuddyAllocator {
    size: u64,
    max_order: u32,
    free_lists: Vec<Vec<u64>>,
    used: HashMap<u64, u32>,
}

impl BuddyAllocator {
    /// Creates an allocator with a single free block of `size` bytes, which must be a power of two
    pub fn new(size: u64) -> Result<Self, ConfigError> {
        require_power_of_two("buddy allocator size", size)?;
        let max_order = size.trailing_zeros();
        let mut free_lists = vec![Vec::new(); max_order as usize + 1];
        free_lists[max_order as usize].push(0);
        Ok(Self {
            size,
            max_order,
            free_lists,
            used: HashMap::new(),
        })
    }

    /// Allocates a block large enough for `requested_size`, returning its address
    ///
    /// The request is rounded up to the next power of two. Returns `None` for zero-sized requests,
    /// requests larger than the whole space, or when no free block of a large enough order exists
    pub fn allocate(&mut self, requested_size: u64) -> Option<u64> {
        if requested_size == 0 || requested_size > self.size {
            return None;
        }
        let order = order_for(requested_size);
        let found = (order..=self.max_order).find(|o| !self.free_lists[*o as usize].is_empty())?;
        let addr = self.free_lists[found as usize].pop()?;

        let mut current = found;
        while current > order {
            current -= 1;
            let buddy = addr + (1 << current);
            self.free_lists[current as usize].push(buddy);
            debug!("buddy split: {addr} keeps order {current}, {buddy} freed");
        }
        self.used.insert(addr, order);
        debug!("buddy allocated {requested_size} bytes at {addr} (order {order})");
        Some(addr)
    }

    /// Frees the block at `addr`, merging it with its buddy as far up as possible
    ///
    /// Returns false if `addr` isn't the start of an allocated block
    pub fn free(&mut self, addr: u64) -> bool {
        let Some(mut order) = self.used.remove(&addr) else {
            debug!("buddy free of unknown address {addr}");
            return false;
        };
        let mut addr = addr;
        while order < self.max_order {
            let buddy = addr ^ (1 << order);
            let list = &mut self.free_lists[order as usize];
            let Some(position) = list.iter().position(|a| *a == buddy) else {
                break;
            };
            list.remove(position);
            debug!("buddy merge: {addr} + {buddy} at order {order}");
            addr = addr.min(buddy);
            order += 1;
        }
        self.free_lists[order as usize].push(addr);
        true
    }

    /// Size in bytes of the block allocated at `addr`, if any
    pub fn allocated_size(&self, addr: u64) -> Option<u64> {
        self.used.get(&addr).map(|order| 1 << order)
    }

    /// Free block addresses, indexed by order, next to be reused last
    pub fn free_lists(&self) -> &[Vec<u64>] {
        &self.free_lists
    }

    /// Allocated block addresses and their orders
    pub fn used(&self) -> &HashMap<u64, u32> {
        &self.used
    }

    pub fn max_order(&self) -> u32 {
        self.max_order
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    /// Total bytes held by allocated blocks, rounding included
    pub fn used_memory(&self) -> u64 {
        self.used.values().map(|order| 1u64 << order).sum()
    }
}

/// The smallest order whose block size holds `size` bytes, `size` must be non-zero
///
/// # Examples
///
/// ```
/// use memlib::buddy::order_for;
/// assert_eq!(order_for(1), 0);
/// assert_eq!(order_for(100), 7);
/// assert_eq!(order_for(128), 7);
/// assert_eq!(order_for(129), 8);
/// ```
pub fn order_for(size: u64) -> u32 {
    size.next_power_of_two().trailing_zeros()
}
