use std::fmt;
use std::time::{Duration, Instant};
use serde::{Deserialize, Serialize};
use crate::cache::{CacheTrait, GenericCache};
use crate::config::SimulationConfig;
use crate::error::ConfigError;
use crate::virtual_memory::VirtualMemoryManager;

/// Which level, if any, served a translated access
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub enum CacheOutcome {
    #[serde(rename = "L1_HIT")]
    L1Hit,
    #[serde(rename = "L2_HIT")]
    L2Hit,
    #[serde(rename = "MISS")]
    Miss,
}

impl fmt::Display for CacheOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CacheOutcome::L1Hit => "L1_HIT",
            CacheOutcome::L2Hit => "L2_HIT",
            CacheOutcome::Miss => "MISS",
        })
    }
}

/// Everything that happened for one virtual address
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize)]
pub struct TraceRecord {
    pub va: u64,
    pub page: u64,
    pub offset: u64,
    pub frame: usize,
    pub pa: u64,
    pub page_fault: bool,
    pub cache_result: CacheOutcome,
}

/// Totals over every access made through a pipeline. Can be serialised for output
#[derive(Debug, Serialize, Deserialize, Eq, PartialEq)]
pub struct PipelineResult {
    pub accesses: u64,
    pub page_faults: u64,
    pub main_memory_accesses: u64,
    pub caches: Vec<CacheResult>,
}

/// The result for an individual cache level
#[derive(Debug, Serialize, Deserialize, Eq, PartialEq)]
pub struct CacheResult {
    pub name: String,
    pub hits: u64,
    pub misses: u64,
}

/// Chains virtual memory translation into a two level cache lookup
///
/// The pipeline only reads the virtual memory manager's result before touching the caches, it
/// never mutates more than one engine at a time. L2 is only consulted when L1 misses
pub struct TranslationPipeline {
    vm: VirtualMemoryManager,
    l1: GenericCache,
    l2: GenericCache,
    accesses: u64,
    main_memory_accesses: u64,
    simulation_time: Duration,
}

impl TranslationPipeline {
    pub fn new(vm: VirtualMemoryManager, l1: GenericCache, l2: GenericCache) -> Self {
        Self {
            vm,
            l1,
            l2,
            accesses: 0,
            main_memory_accesses: 0,
            simulation_time: Duration::new(0, 0),
        }
    }

    /// Creates a pipeline from a configuration, whose `caches` must hold exactly L1 then L2
    ///
    /// # Arguments
    ///
    /// * `config`: A simulation configuration, usually resulting from parsing JSON
    ///
    /// returns: Result<TranslationPipeline, ConfigError>
    pub fn from_config(config: &SimulationConfig) -> Result<Self, ConfigError> {
        let [l1, l2] = config.caches.as_slice() else {
            return Err(ConfigError::CacheLevels(config.caches.len()));
        };
        Ok(Self::new(
            VirtualMemoryManager::from_config(&config.virtual_memory)?,
            GenericCache::from_config(l1)?,
            GenericCache::from_config(l2)?,
        ))
    }

    /// Translates `virtual_address` and looks the physical address up in L1, then L2 on a miss
    pub fn translate_and_access(&mut self, virtual_address: u64) -> TraceRecord {
        let page_access = self.vm.access(virtual_address);
        let pa = page_access.frame as u64 * self.vm.page_size() + page_access.offset;
        let cache_result = if self.l1.access(pa).hit {
            CacheOutcome::L1Hit
        } else if self.l2.access(pa).hit {
            CacheOutcome::L2Hit
        } else {
            self.main_memory_accesses += 1;
            CacheOutcome::Miss
        };
        self.accesses += 1;
        TraceRecord {
            va: virtual_address,
            page: page_access.page,
            offset: page_access.offset,
            frame: page_access.frame,
            pa,
            page_fault: page_access.fault,
            cache_result,
        }
    }

    /// Runs every address of a trace through the pipeline, calling `on_record` for each one
    ///
    /// Can be called repeatedly; totals and the measured time accumulate across calls
    pub fn simulate<I, F>(&mut self, addresses: I, mut on_record: F) -> PipelineResult
    where
        I: IntoIterator<Item = u64>,
        F: FnMut(&TraceRecord),
    {
        let start = Instant::now();
        for address in addresses {
            let record = self.translate_and_access(address);
            on_record(&record);
        }
        self.simulation_time += start.elapsed();
        self.result()
    }

    /// Snapshot of the totals so far
    pub fn result(&self) -> PipelineResult {
        PipelineResult {
            accesses: self.accesses,
            page_faults: self.vm.page_faults(),
            main_memory_accesses: self.main_memory_accesses,
            caches: [&self.l1, &self.l2].iter().map(|cache| CacheResult {
                name: cache.name().to_string(),
                hits: cache.hits(),
                misses: cache.misses(),
            }).collect(),
        }
    }

    /// Gets the wall-clock time spent inside `simulate`
    pub fn get_execution_time(&self) -> &Duration {
        &self.simulation_time
    }

    pub fn virtual_memory(&self) -> &VirtualMemoryManager {
        &self.vm
    }

    pub fn l1(&self) -> &GenericCache {
        &self.l1
    }

    pub fn l2(&self) -> &GenericCache {
        &self.l2
    }
}
