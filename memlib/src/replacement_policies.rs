use crate::cache::CacheLine;

/// A generic trait for implementing new replacement policies. Can be used to parameterise a
/// CacheLevel.
pub trait ReplacementPolicy {
    /// Chooses the way within a full set to overwrite on a miss
    ///
    /// Only called when every line in the set is valid; invalid lines are always filled first by
    /// the cache itself. Ties must go to the lowest way so runs are reproducible
    ///
    /// # Arguments
    ///
    /// * `set`: The lines of the set, indexed by way
    ///
    /// returns: usize
    fn select_victim(&self, set: &[CacheLine]) -> usize;
}

/// Least Recently Used replacement policy
///
/// The cache stamps `last_used` with its logical clock on every hit and fill, so the victim is
/// the line with the oldest stamp
#[derive(Debug, Default, Copy, Clone)]
pub struct LeastRecentlyUsed;

impl ReplacementPolicy for LeastRecentlyUsed {
    fn select_victim(&self, set: &[CacheLine]) -> usize {
        oldest_by(set, |line| line.last_used)
    }
}

/// First In First Out replacement policy
///
/// Only the time a line was filled matters, hits don't change the eviction order
#[derive(Debug, Default, Copy, Clone)]
pub struct FirstInFirstOut;

impl ReplacementPolicy for FirstInFirstOut {
    fn select_victim(&self, set: &[CacheLine]) -> usize {
        oldest_by(set, |line| line.insert_time)
    }
}

fn oldest_by(set: &[CacheLine], stamp: impl Fn(&CacheLine) -> u64) -> usize {
    let mut min_value = u64::MAX;
    let mut min_index = 0;
    for (index, line) in set.iter().enumerate() {
        let value = stamp(line);
        if value < min_value {
            min_value = value;
            min_index = index;
        }
    }
    min_index
}
