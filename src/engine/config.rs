//! Plain, explicitly-constructed configuration types.
//!
//! There is no outer configuration-file or environment-variable layer:
//! these are small value types callers construct directly, in the shape
//! of a fee schedule.

use serde::{Deserialize, Serialize};

/// The default top-N depth the Compressor retains per side.
pub const DEFAULT_MAX_OUTPUT_DEPTH: usize = 20;

/// The default checkpoint spacing, in seconds of logical time.
pub const DEFAULT_CACHE_FREQUENCY_SECONDS: i64 = 10;

/// Compressor configuration.
///
/// # Examples
/// ```
/// use ob_history::engine::config::CompressorConfig;
///
/// let cfg = CompressorConfig::new(50);
/// assert_eq!(cfg.max_output_depth, 50);
/// assert_eq!(CompressorConfig::default().max_output_depth, 20);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompressorConfig {
    /// The number of top-of-book levels retained and emitted per side.
    pub max_output_depth: usize,
}

impl CompressorConfig {
    /// Creates a new configuration with the given output depth.
    #[must_use = "CompressorConfig does nothing unless used"]
    pub fn new(max_output_depth: usize) -> Self {
        CompressorConfig { max_output_depth }
    }
}

impl Default for CompressorConfig {
    fn default() -> Self {
        CompressorConfig::new(DEFAULT_MAX_OUTPUT_DEPTH)
    }
}

/// Traverser configuration.
///
/// # Examples
/// ```
/// use ob_history::engine::config::TraverserConfig;
///
/// let cfg = TraverserConfig::new(30);
/// assert_eq!(cfg.cache_frequency_seconds, 30);
/// assert_eq!(TraverserConfig::default().cache_frequency_seconds, 10);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraverserConfig {
    /// Minimum spacing, in seconds of logical time, between checkpoints.
    pub cache_frequency_seconds: i64,
}

impl TraverserConfig {
    /// Creates a new configuration with the given checkpoint spacing.
    #[must_use = "TraverserConfig does nothing unless used"]
    pub fn new(cache_frequency_seconds: i64) -> Self {
        TraverserConfig {
            cache_frequency_seconds,
        }
    }
}

impl Default for TraverserConfig {
    fn default() -> Self {
        TraverserConfig::new(DEFAULT_CACHE_FREQUENCY_SECONDS)
    }
}
