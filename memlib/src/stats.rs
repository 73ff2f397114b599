use serde::Serialize;
use crate::block::Block;

/// External fragmentation of a block list, `1 - largest_free / total_free`
///
/// 0 means all free memory is in one block. Returns 0 when nothing is free
pub fn fragmentation(blocks: &[Block]) -> f64 {
    let free = blocks.iter().filter(|b| b.free).map(|b| b.size);
    let total: u64 = free.clone().sum();
    if total == 0 {
        return 0.0;
    }
    let largest = free.max().unwrap_or(0);
    1.0 - largest as f64 / total as f64
}

/// Fraction of `total` in use, 0 for an empty space
pub fn utilization(used: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        used as f64 / total as f64
    }
}

/// Counts allocation requests and their outcomes for a front-end to report
#[derive(Debug, Default, Clone, Serialize)]
pub struct StatsTracker {
    pub total_memory: u64,
    pub total_requests: u64,
    pub successful_allocations: u64,
    pub failed_allocations: u64,
    /// Bytes lost to rounding by the buddy allocator
    pub internal_fragmentation: u64,
}

impl StatsTracker {
    pub fn new(total_memory: u64) -> Self {
        Self {
            total_memory,
            ..Default::default()
        }
    }

    pub fn record_request(&mut self) {
        self.total_requests += 1;
    }

    pub fn record_success(&mut self) {
        self.successful_allocations += 1;
    }

    pub fn record_failure(&mut self) {
        self.failed_allocations += 1;
    }

    /// Adds the difference between the granted and requested size, ignoring non-positive waste
    pub fn add_internal_fragmentation(&mut self, granted: u64, requested: u64) {
        self.internal_fragmentation += granted.saturating_sub(requested);
    }

    pub fn success_rate(&self) -> f64 {
        ratio(self.successful_allocations, self.total_requests)
    }

    pub fn failure_rate(&self) -> f64 {
        ratio(self.failed_allocations, self.total_requests)
    }

    pub fn memory_utilization(&self, used_memory: u64) -> f64 {
        utilization(used_memory, self.total_memory)
    }
}

fn ratio(count: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64
    }
}
