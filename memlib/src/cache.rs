use std::slice::Chunks;
use log::{debug, trace};
use serde::Serialize;
use crate::config::{CacheConfig, EvictionPolicyConfig};
use crate::error::{require_non_zero, require_power_of_two, ConfigError};
use crate::replacement_policies::{FirstInFirstOut, LeastRecentlyUsed, ReplacementPolicy};

/// One way of a cache set
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq, Serialize)]
pub struct CacheLine {
    pub valid: bool,
    pub tag: Option<u64>,
    /// Logical time of the last hit or fill, used by LRU
    pub last_used: u64,
    /// Logical time of the fill, used by FIFO
    pub insert_time: u64,
}

/// The outcome of a single cache access
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize)]
pub struct CacheAccess {
    pub hit: bool,
    pub set_index: u64,
    /// True only when a valid line was overwritten, filling an empty way is not an eviction
    pub evicted: bool,
}

/// A generic trait for cache levels
///
/// Implemented by every `CacheLevel<R>` and by `GenericCache`, so callers can hold whichever
/// suits them
pub trait CacheTrait {
    /// Splits a physical address into its set index and tag
    ///
    /// # Arguments
    ///
    /// * `address`: A physical address
    ///
    /// returns: (u64, u64)
    fn address_to_set_and_tag(&self, address: u64) -> (u64, u64);

    /// Looks up the line holding `address`, filling or evicting on a miss
    ///
    /// Exactly one line and one of the hit/miss counters change, and the logical clock always
    /// advances by one
    fn access(&mut self, address: u64) -> CacheAccess;

    fn name(&self) -> &str;

    fn hits(&self) -> u64;

    fn misses(&self) -> u64;

    fn block_size(&self) -> u64;

    /// The lines grouped by set, in set order
    fn sets(&self) -> Chunks<'_, CacheLine>;

    /// Gets the number of lines that have never been filled
    fn get_uninitialised_line_count(&self) -> usize;
}

/// A set-associative cache level, parameterised by a replacement policy
///
/// Lines are stored flat, set after set, so set `s` occupies
/// `lines[s * associativity..(s + 1) * associativity]`. Block size and set count are powers of
/// two, which lets the address split be done with shifts and masks
#[derive(Debug, Clone)]
pub struct CacheLevel<R: ReplacementPolicy> {
    name: String,
    block_size: u64,
    associativity: u64,
    num_sets: u64,
    offset_bits: u32,
    set_bits: u32,
    lines: Vec<CacheLine>,
    replacement_policy: R,
    time: u64,
    hits: u64,
    misses: u64,
}

impl<R: ReplacementPolicy> CacheLevel<R> {
    pub fn new(
        name: impl Into<String>,
        cache_size: u64,
        block_size: u64,
        associativity: u64,
        policy: R,
    ) -> Result<Self, ConfigError> {
        require_non_zero("cache size", cache_size)?;
        require_power_of_two("block size", block_size)?;
        require_non_zero("associativity", associativity)?;
        if cache_size % block_size != 0 {
            return Err(ConfigError::NotDivisible { what: "cache size", value: cache_size, divisor: block_size });
        }
        let num_blocks = cache_size / block_size;
        if num_blocks % associativity != 0 {
            return Err(ConfigError::NotDivisible { what: "block count", value: num_blocks, divisor: associativity });
        }
        let num_sets = require_power_of_two("set count", num_blocks / associativity)?;
        Ok(Self {
            name: name.into(),
            block_size,
            associativity,
            num_sets,
            offset_bits: block_size.trailing_zeros(),
            set_bits: num_sets.trailing_zeros(),
            lines: vec![CacheLine::default(); num_blocks as usize],
            replacement_policy: policy,
            time: 0,
            hits: 0,
            misses: 0,
        })
    }

    pub fn num_sets(&self) -> u64 {
        self.num_sets
    }

    pub fn associativity(&self) -> u64 {
        self.associativity
    }

    /// Current value of the logical clock, i.e. the number of accesses so far
    pub fn time(&self) -> u64 {
        self.time
    }
}

impl<R: ReplacementPolicy> CacheTrait for CacheLevel<R> {
    fn address_to_set_and_tag(&self, address: u64) -> (u64, u64) {
        let block_address = address >> self.offset_bits;
        (block_address & (self.num_sets - 1), block_address >> self.set_bits)
    }

    fn access(&mut self, address: u64) -> CacheAccess {
        self.time += 1;
        let (set_index, tag) = self.address_to_set_and_tag(address);
        let lower = (set_index * self.associativity) as usize;
        let set = &mut self.lines[lower..lower + self.associativity as usize];

        if let Some(line) = set.iter_mut().find(|l| l.valid && l.tag == Some(tag)) {
            line.last_used = self.time;
            self.hits += 1;
            trace!("{}: hit {address} in set {set_index}", self.name);
            return CacheAccess { hit: true, set_index, evicted: false };
        }

        self.misses += 1;
        let (way, evicted) = match set.iter().position(|l| !l.valid) {
            Some(way) => (way, false),
            None => (self.replacement_policy.select_victim(set), true),
        };
        if evicted {
            debug!("{}: set {set_index} way {way} evicts tag {:?} for tag {tag}", self.name, set[way].tag);
        }
        set[way] = CacheLine {
            valid: true,
            tag: Some(tag),
            last_used: self.time,
            insert_time: self.time,
        };
        CacheAccess { hit: false, set_index, evicted }
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn hits(&self) -> u64 {
        self.hits
    }

    fn misses(&self) -> u64 {
        self.misses
    }

    fn block_size(&self) -> u64 {
        self.block_size
    }

    fn sets(&self) -> Chunks<'_, CacheLine> {
        self.lines.chunks(self.associativity as usize)
    }

    fn get_uninitialised_line_count(&self) -> usize {
        self.lines.iter().filter(|l| !l.valid).count()
    }
}

/// Enum over the provided cache levels
///
/// Lets a configuration pick the policy at runtime while every access still goes through a
/// concrete, inlinable `CacheLevel<R>` instead of a trait object
#[derive(Debug, Clone)]
pub enum GenericCache {
    LeastRecentlyUsed(CacheLevel<LeastRecentlyUsed>),
    FirstInFirstOut(CacheLevel<FirstInFirstOut>),
}

impl GenericCache {
    /// Builds a cache level from its configuration
    pub fn from_config(config: &CacheConfig) -> Result<Self, ConfigError> {
        let name = config.name.clone();
        Ok(match config.replacement_policy {
            EvictionPolicyConfig::LeastRecentlyUsed => GenericCache::from(CacheLevel::new(
                name, config.size, config.block_size, config.associativity, LeastRecentlyUsed)?),
            EvictionPolicyConfig::FirstInFirstOut => GenericCache::from(CacheLevel::new(
                name, config.size, config.block_size, config.associativity, FirstInFirstOut)?),
        })
    }
}

impl From<CacheLevel<LeastRecentlyUsed>> for GenericCache {
    fn from(value: CacheLevel<LeastRecentlyUsed>) -> Self {
        Self::LeastRecentlyUsed(value)
    }
}

impl From<CacheLevel<FirstInFirstOut>> for GenericCache {
    fn from(value: CacheLevel<FirstInFirstOut>) -> Self {
        Self::FirstInFirstOut(value)
    }
}

impl CacheTrait for GenericCache {
    fn address_to_set_and_tag(&self, address: u64) -> (u64, u64) {
        match self {
            GenericCache::LeastRecentlyUsed(c) => c.address_to_set_and_tag(address),
            GenericCache::FirstInFirstOut(c) => c.address_to_set_and_tag(address),
        }
    }

    fn access(&mut self, address: u64) -> CacheAccess {
        match self {
            GenericCache::LeastRecentlyUsed(c) => c.access(address),
            GenericCache::FirstInFirstOut(c) => c.access(address),
        }
    }

    fn name(&self) -> &str {
        match self {
            GenericCache::LeastRecentlyUsed(c) => c.name(),
            GenericCache::FirstInFirstOut(c) => c.name(),
        }
    }

    fn hits(&self) -> u64 {
        match self {
            GenericCache::LeastRecentlyUsed(c) => c.hits(),
            GenericCache::FirstInFirstOut(c) => c.hits(),
        }
    }

    fn misses(&self) -> u64 {
        match self {
            GenericCache::LeastRecentlyUsed(c) => c.misses(),
            GenericCache::FirstInFirstOut(c) => c.misses(),
        }
    }

    fn block_size(&self) -> u64 {
        match self {
            GenericCache::LeastRecentlyUsed(c) => c.block_size(),
            GenericCache::FirstInFirstOut(c) => c.block_size(),
        }
    }

    fn sets(&self) -> Chunks<'_, CacheLine> {
        match self {
            GenericCache::LeastRecentlyUsed(c) => c.sets(),
            GenericCache::FirstInFirstOut(c) => c.sets(),
        }
    }

    fn get_uninitialised_line_count(&self) -> usize {
        match self {
            GenericCache::LeastRecentlyUsed(c) => c.get_uninitialised_line_count(),
            GenericCache::FirstInFirstOut(c) => c.get_uninitialised_line_count(),
        }
    }
}
