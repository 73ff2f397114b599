use std::error::Error;
use crate::buddy::BuddyAllocator;
use crate::error::ConfigError;
use crate::test::Lcg;

/// Alignment of every block, no free buddy pairs left unmerged, and the space fully accounted for
fn check_buddy(buddy: &BuddyAllocator) {
    let mut accounted = 0;
    for (order, list) in buddy.free_lists().iter().enumerate() {
        let block_size = 1u64 << order;
        for addr in list {
            assert_eq!(addr % block_size, 0, "free {addr} misaligned at order {order}");
            if order < buddy.max_order() as usize {
                assert!(!list.contains(&(addr ^ block_size)), "unmerged buddies {addr} at order {order}");
            }
            accounted += block_size;
        }
    }
    for (addr, order) in buddy.used() {
        let block_size = 1u64 << order;
        assert_eq!(addr % block_size, 0, "used {addr} misaligned at order {order}");
        accounted += block_size;
    }
    assert_eq!(accounted, buddy.size());
}

fn only_whole_space_free(buddy: &BuddyAllocator) -> bool {
    let max = buddy.max_order() as usize;
    buddy.used().is_empty()
        && buddy.free_lists()[max] == vec![0]
        && buddy.free_lists()[..max].iter().all(|list| list.is_empty())
}

#[test]
fn size_must_be_a_power_of_two() {
    assert!(matches!(BuddyAllocator::new(1000), Err(ConfigError::NotPowerOfTwo { value: 1000, .. })));
    assert!(matches!(BuddyAllocator::new(0), Err(ConfigError::Zero { .. })));
    assert!(BuddyAllocator::new(1).is_ok());
}

#[test]
fn split_and_merge_scenario() -> Result<(), Box<dyn Error>> {
    let mut buddy = BuddyAllocator::new(1024)?;
    assert_eq!(buddy.max_order(), 10);
    assert_eq!(buddy.allocate(100), Some(0));
    assert_eq!(buddy.used().get(&0), Some(&7));
    assert_eq!(buddy.free_lists()[7], vec![128]);
    assert_eq!(buddy.free_lists()[8], vec![256]);
    assert_eq!(buddy.free_lists()[9], vec![512]);
    check_buddy(&buddy);

    assert_eq!(buddy.allocate(100), Some(128));
    check_buddy(&buddy);

    assert!(buddy.free(0));
    assert_eq!(buddy.free_lists()[7], vec![0]);
    check_buddy(&buddy);
    assert!(buddy.free(128));
    assert!(only_whole_space_free(&buddy));
    Ok(())
}

#[test]
fn requested_order_is_recorded_not_the_split_order() -> Result<(), Box<dyn Error>> {
    let mut buddy = BuddyAllocator::new(1024)?;
    let addr = buddy.allocate(1).ok_or("allocation failed")?;
    assert_eq!(buddy.used().get(&addr), Some(&0));
    assert_eq!(buddy.allocated_size(addr), Some(1));
    assert_eq!(buddy.used_memory(), 1);
    // One free block at every order below the top
    for order in 0..10 {
        assert_eq!(buddy.free_lists()[order].len(), 1);
    }
    check_buddy(&buddy);
    Ok(())
}

#[test]
fn exhaustion_returns_none() -> Result<(), Box<dyn Error>> {
    let mut buddy = BuddyAllocator::new(1024)?;
    assert_eq!(buddy.allocate(1024), Some(0));
    assert_eq!(buddy.allocate(1), None);
    assert!(buddy.free(0));
    assert_eq!(buddy.allocate(600), Some(0));
    assert_eq!(buddy.allocate(600), None);
    assert_eq!(buddy.allocate(512), None);
    check_buddy(&buddy);
    Ok(())
}

#[test]
fn zero_and_oversized_requests_fail() -> Result<(), Box<dyn Error>> {
    let mut buddy = BuddyAllocator::new(256)?;
    assert_eq!(buddy.allocate(0), None);
    assert_eq!(buddy.allocate(257), None);
    assert!(only_whole_space_free(&buddy));
    Ok(())
}

#[test]
fn free_unknown_address_changes_nothing() -> Result<(), Box<dyn Error>> {
    let mut buddy = BuddyAllocator::new(1024)?;
    let addr = buddy.allocate(64).ok_or("allocation failed")?;
    let before = buddy.free_lists().to_vec();
    assert!(!buddy.free(addr + 64));
    assert!(!buddy.free(512));
    assert_eq!(buddy.free_lists(), before.as_slice());
    assert!(buddy.free(addr));
    assert!(!buddy.free(addr));
    assert!(only_whole_space_free(&buddy));
    Ok(())
}

#[test]
fn merge_waits_for_both_buddies() -> Result<(), Box<dyn Error>> {
    let mut buddy = BuddyAllocator::new(256)?;
    let a = buddy.allocate(64).ok_or("allocation failed")?;
    let b = buddy.allocate(64).ok_or("allocation failed")?;
    let c = buddy.allocate(128).ok_or("allocation failed")?;
    assert_eq!((a, b, c), (0, 64, 128));
    assert!(buddy.free(c));
    // 128's buddy is the still split block at 0
    assert_eq!(buddy.free_lists()[7], vec![128]);
    assert!(buddy.free(a));
    assert_eq!(buddy.free_lists()[6], vec![0]);
    assert!(buddy.free(b));
    assert!(only_whole_space_free(&buddy));
    Ok(())
}

#[test]
fn most_recently_freed_block_is_reused_first() -> Result<(), Box<dyn Error>> {
    let mut buddy = BuddyAllocator::new(256)?;
    let addresses: Vec<Option<u64>> = (0..4).map(|_| buddy.allocate(64)).collect();
    assert_eq!(addresses, vec![Some(0), Some(64), Some(128), Some(192)]);
    assert!(buddy.free(0));
    assert!(buddy.free(128));
    assert_eq!(buddy.free_lists()[6], vec![0, 128]);
    assert_eq!(buddy.allocate(64), Some(128));
    assert_eq!(buddy.allocate(64), Some(0));
    assert_eq!(buddy.allocate(64), None);
    check_buddy(&buddy);
    Ok(())
}

#[test]
fn merge_keeps_the_order_of_other_free_blocks() -> Result<(), Box<dyn Error>> {
    let mut buddy = BuddyAllocator::new(512)?;
    let addresses: Vec<u64> = (0..8).filter_map(|_| buddy.allocate(64)).collect();
    assert_eq!(addresses, vec![0, 64, 128, 192, 256, 320, 384, 448]);
    for addr in [256, 0, 384] {
        assert!(buddy.free(addr));
    }
    // 320 merges with 256, leaving 0 and 384 where they were
    assert!(buddy.free(320));
    assert_eq!(buddy.free_lists()[6], vec![0, 384]);
    assert_eq!(buddy.free_lists()[7], vec![256]);
    check_buddy(&buddy);
    Ok(())
}

#[test]
fn allocate_then_free_round_trips() -> Result<(), Box<dyn Error>> {
    let mut buddy = BuddyAllocator::new(1024)?;
    buddy.allocate(100).ok_or("allocation failed")?;
    buddy.allocate(30).ok_or("allocation failed")?;
    let before = buddy.free_lists().to_vec();
    let addr = buddy.allocate(200).ok_or("allocation failed")?;
    assert!(buddy.free(addr));
    assert_eq!(buddy.free_lists(), before.as_slice());
    Ok(())
}

#[test]
fn random_sequences_keep_the_buddy_invariants() -> Result<(), Box<dyn Error>> {
    let mut rng = Lcg::new(7);
    let mut buddy = BuddyAllocator::new(4096)?;
    let mut live = Vec::new();
    for _ in 0..500 {
        if live.is_empty() || rng.range(0, 3) > 0 {
            if let Some(addr) = buddy.allocate(rng.range(1, 700)) {
                live.push(addr);
            }
        } else {
            let addr = live.swap_remove(rng.range(0, live.len() as u64) as usize);
            assert!(buddy.free(addr));
        }
        check_buddy(&buddy);
    }
    for addr in live {
        assert!(buddy.free(addr));
    }
    assert!(only_whole_space_free(&buddy));
    Ok(())
}
