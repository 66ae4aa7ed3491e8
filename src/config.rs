// src/config.rs
//! Per-Collection policy bundle (spec §3: "policy bundle: cache config,
//! compression config, concurrency config").

#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub capacity: usize,
    pub ttl: std::time::Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        CacheConfig {
            capacity: 1000,
            ttl: std::time::Duration::from_secs(60),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CompressionConfig {
    pub enabled: bool,
    /// Serialized field byte size at/above which compression is attempted.
    pub threshold_bytes: usize,
}

impl Default for CompressionConfig {
    fn default() -> Self {
        CompressionConfig {
            enabled: true,
            threshold_bytes: 256,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConcurrencyConfig {
    pub min_concurrency: usize,
    pub max_concurrency: usize,
    pub initial_concurrency: usize,
    /// Target latency throttle adjusts towards (spec §4.10).
    pub target_latency: std::time::Duration,
    /// Adjustment factor `f`, default 0.2.
    pub adjustment_factor: f64,
    /// Sample window size `W`, default 100.
    pub window: usize,
}

impl Default for ConcurrencyConfig {
    fn default() -> Self {
        ConcurrencyConfig {
            min_concurrency: 1,
            max_concurrency: 16,
            initial_concurrency: 4,
            target_latency: std::time::Duration::from_millis(10),
            adjustment_factor: 0.2,
            window: 100,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CollectionConfig {
    pub cache: CacheConfig,
    pub compression: CompressionConfig,
    pub concurrency: ConcurrencyConfig,
}
