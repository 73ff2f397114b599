use serde::Deserialize;
use crate::error::ConfigError;

/// A full simulation set-up: contiguous memory, buddy space, virtual memory, and the cache
/// hierarchy. Every field can be omitted to get the reference configuration
#[derive(Debug, Deserialize)]
pub struct SimulationConfig {
    #[serde(default = "default_memory_size")]
    pub memory_size: u64,
    #[serde(default = "StrategyConfig::default")]
    pub strategy: StrategyConfig,
    #[serde(default = "default_memory_size")]
    pub buddy_size: u64,
    #[serde(default = "VirtualMemoryConfig::default")]
    pub virtual_memory: VirtualMemoryConfig,
    #[serde(default = "default_caches")]
    pub caches: Vec<CacheConfig>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            memory_size: default_memory_size(),
            strategy: StrategyConfig::default(),
            buddy_size: default_memory_size(),
            virtual_memory: VirtualMemoryConfig::default(),
            caches: default_caches(),
        }
    }
}

impl SimulationConfig {
    /// Parses a configuration from JSON. Values are only validated once engines are built from it
    ///
    /// # Examples
    ///
    /// ```
    /// use memlib::config::{SimulationConfig, StrategyConfig};
    /// let config = SimulationConfig::from_json(r#"{"memory_size": 2048, "strategy": "best"}"#).unwrap();
    /// assert_eq!(config.memory_size, 2048);
    /// assert_eq!(config.strategy, StrategyConfig::BestFit);
    /// assert_eq!(config.caches.len(), 2);
    /// ```
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// A configuration for a single cache level
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    pub name: String,
    pub size: u64,
    pub block_size: u64,
    pub associativity: u64,
    #[serde(default = "EvictionPolicyConfig::default")]
    pub replacement_policy: EvictionPolicyConfig,
}

/// The virtual memory manager's frame pool and page geometry
#[derive(Debug, Clone, Deserialize)]
pub struct VirtualMemoryConfig {
    #[serde(default = "default_frames")]
    pub frames: u64,
    #[serde(default = "default_page_size")]
    pub page_size: u64,
    #[serde(default = "PageReplacementConfig::default")]
    pub replacement_policy: PageReplacementConfig,
}

impl Default for VirtualMemoryConfig {
    fn default() -> Self {
        Self {
            frames: default_frames(),
            page_size: default_page_size(),
            replacement_policy: PageReplacementConfig::default(),
        }
    }
}

/// The placement strategy for the contiguous allocator - first, best, or worst fit. Defaults to
/// first fit
#[derive(Debug, Copy, Clone, Deserialize, Eq, PartialEq)]
pub enum StrategyConfig {
    #[serde(alias = "first", alias = "first_fit")]
    FirstFit,
    #[serde(alias = "best", alias = "best_fit")]
    BestFit,
    #[serde(alias = "worst", alias = "worst_fit")]
    WorstFit,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        StrategyConfig::FirstFit
    }
}

/// The eviction policy of a cache level - lru or fifo. Defaults to lru
#[derive(Debug, Copy, Clone, Deserialize, Eq, PartialEq)]
pub enum EvictionPolicyConfig {
    #[serde(alias = "lru", alias = "LRU")]
    LeastRecentlyUsed,
    #[serde(alias = "fifo", alias = "FIFO")]
    FirstInFirstOut,
}

impl Default for EvictionPolicyConfig {
    fn default() -> Self {
        EvictionPolicyConfig::LeastRecentlyUsed
    }
}

/// Page replacement policy. Only FIFO is implemented
#[derive(Debug, Copy, Clone, Deserialize, Eq, PartialEq)]
pub enum PageReplacementConfig {
    #[serde(alias = "fifo", alias = "FIFO")]
    FirstInFirstOut,
}

impl Default for PageReplacementConfig {
    fn default() -> Self {
        PageReplacementConfig::FirstInFirstOut
    }
}

fn default_memory_size() -> u64 {
    1024
}

fn default_frames() -> u64 {
    8
}

fn default_page_size() -> u64 {
    64
}

fn default_caches() -> Vec<CacheConfig> {
    vec![
        CacheConfig {
            name: "L1".to_string(),
            size: 64,
            block_size: 8,
            associativity: 2,
            replacement_policy: EvictionPolicyConfig::LeastRecentlyUsed,
        },
        CacheConfig {
            name: "L2".to_string(),
            size: 256,
            block_size: 8,
            associativity: 4,
            replacement_policy: EvictionPolicyConfig::FirstInFirstOut,
        },
    ]
}
