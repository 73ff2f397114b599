use std::error::Error;
use crate::allocator::ContiguousAllocator;
use crate::block::Block;
use crate::buddy::BuddyAllocator;
use crate::placement_policies::Placement;
use crate::stats::{fragmentation, utilization, StatsTracker};

#[test]
fn fragmentation_of_block_lists() {
    assert_eq!(fragmentation(&[Block::free(0, 1024)]), 0.0);
    assert_eq!(fragmentation(&[Block::used(0, 1024, 1)]), 0.0);
    let blocks = [Block::free(0, 100), Block::used(100, 600, 1), Block::free(700, 300)];
    assert!((fragmentation(&blocks) - 0.25).abs() < 1e-12);
}

#[test]
fn utilization_handles_empty_space() {
    assert_eq!(utilization(0, 0), 0.0);
    assert_eq!(utilization(256, 1024), 0.25);
}

#[test]
fn tracker_follows_allocator_outcomes() -> Result<(), Box<dyn Error>> {
    let mut allocator = ContiguousAllocator::new(1024, Placement::FirstFit)?;
    let mut stats = StatsTracker::new(allocator.total_size());
    assert_eq!(stats.success_rate(), 0.0);
    assert_eq!(stats.failure_rate(), 0.0);
    for size in [100, 2000, 412] {
        stats.record_request();
        match allocator.allocate(size) {
            Some(_) => stats.record_success(),
            None => stats.record_failure(),
        }
    }
    assert_eq!((stats.successful_allocations, stats.failed_allocations), (2, 1));
    assert!((stats.success_rate() - 2.0 / 3.0).abs() < 1e-12);
    assert!((stats.failure_rate() - 1.0 / 3.0).abs() < 1e-12);
    assert_eq!(stats.memory_utilization(allocator.used_memory()), 0.5);
    Ok(())
}

#[test]
fn buddy_rounding_counts_as_internal_fragmentation() -> Result<(), Box<dyn Error>> {
    let mut buddy = BuddyAllocator::new(1024)?;
    let mut stats = StatsTracker::new(buddy.size());
    for size in [100, 64] {
        let addr = buddy.allocate(size).ok_or("allocation failed")?;
        let granted = buddy.allocated_size(addr).ok_or("not recorded")?;
        stats.add_internal_fragmentation(granted, size);
    }
    assert_eq!(stats.internal_fragmentation, 28);
    assert_eq!(buddy.used_memory(), 192);
    Ok(())
}
