//! Validated configuration for a single simulation run.

use crate::error::ConfigError;

/// Window sizes the experiment grid is allowed to sweep.
pub const W_VALUES: &[u32] = &[2, 4, 8, 16, 32, 64];

/// Transport payload sizes the experiment grid is allowed to sweep.
pub const L_VALUES: &[usize] = &[128, 256, 512, 1024, 2048, 4096];

/// Default workload size: 100 MiB.
pub const DEFAULT_WORKLOAD_BYTES: usize = 100 * 1024 * 1024;

/// Default receiver buffer capacity: 256 KiB.
pub const DEFAULT_BUFFER_CAPACITY: usize = 256 * 1024;

/// Parameters for one engine run.
///
/// Construct via [`EngineConfig::new`] (validates `window`/`payload_len`
/// against the fixed grid) or [`EngineConfig::builder`] for scenario tests
/// that need a non-default buffer capacity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub window: u32,
    pub payload_len: usize,
    pub seed: u64,
    pub workload_bytes: usize,
    pub buffer_capacity: usize,
}

impl EngineConfig {
    /// Build a config with default workload size and buffer capacity.
    pub fn new(window: u32, payload_len: usize, seed: u64) -> Result<Self, ConfigError> {
        Self::builder(window, payload_len, seed)
            .workload_bytes(DEFAULT_WORKLOAD_BYTES)
            .buffer_capacity(DEFAULT_BUFFER_CAPACITY)
            .build()
    }

    /// Start a builder for scenario tests that need to override defaults.
    pub fn builder(window: u32, payload_len: usize, seed: u64) -> EngineConfigBuilder {
        EngineConfigBuilder {
            window,
            payload_len,
            seed,
            workload_bytes: DEFAULT_WORKLOAD_BYTES,
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
        }
    }

    pub fn total_segments(&self) -> usize {
        self.workload_bytes.div_ceil(self.payload_len)
    }
}

/// Builder for [`EngineConfig`], used when a test scenario needs a
/// non-default workload size or receiver buffer capacity.
pub struct EngineConfigBuilder {
    window: u32,
    payload_len: usize,
    seed: u64,
    workload_bytes: usize,
    buffer_capacity: usize,
}

impl EngineConfigBuilder {
    pub fn workload_bytes(mut self, bytes: usize) -> Self {
        self.workload_bytes = bytes;
        self
    }

    pub fn buffer_capacity(mut self, capacity: usize) -> Self {
        self.buffer_capacity = capacity;
        self
    }

    pub fn build(self) -> Result<EngineConfig, ConfigError> {
        if !W_VALUES.contains(&self.window) {
            return Err(ConfigError::InvalidWindow(self.window, W_VALUES));
        }
        if !L_VALUES.contains(&self.payload_len) {
            return Err(ConfigError::InvalidPayloadLen(self.payload_len, L_VALUES));
        }
        if self.workload_bytes == 0 {
            return Err(ConfigError::EmptyWorkload);
        }
        if self.buffer_capacity < self.payload_len {
            return Err(ConfigError::BufferTooSmall {
                capacity: self.buffer_capacity,
                payload_len: self.payload_len,
            });
        }
        Ok(EngineConfig {
            window: self.window,
            payload_len: self.payload_len,
            seed: self.seed,
            workload_bytes: self.workload_bytes,
            buffer_capacity: self.buffer_capacity,
        })
    }
}
