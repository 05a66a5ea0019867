//! # Engine Configuration
//!
//! Policy knobs handed to the billing and inventory components when they are
//! constructed. Nothing here is global: two engines with different GST rates
//! can run side by side in one process.
//!
//! ## Configuration Sources (Priority Order)
//! 1. Environment variables (`RESORT_*`)
//! 2. Defaults (this file)

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::types::Rate;
use crate::{DEFAULT_GST_BPS, DEFAULT_MAX_ATTEMPTS};

/// Engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineConfig {
    /// GST applied to food orders at creation.
    /// Default: 500 bps (5%)
    pub gst_rate: Rate,

    /// Total attempts for an operation that hits `ConcurrentModification`.
    /// Default: 3
    pub max_attempts: u32,

    /// Base delay between attempts; attempt `n` waits `n × backoff`.
    /// Default: 25ms
    pub retry_backoff_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            gst_rate: Rate::from_bps(DEFAULT_GST_BPS),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_backoff_ms: 25,
        }
    }
}

impl EngineConfig {
    /// Creates a configuration from environment variables and defaults.
    ///
    /// ## Environment Variables
    /// - `RESORT_GST_RATE`: GST percentage (e.g., "5" or "12.5")
    /// - `RESORT_MAX_ATTEMPTS`: attempts on contention (minimum 1)
    /// - `RESORT_RETRY_BACKOFF_MS`: base retry delay in milliseconds
    ///
    /// Unparseable values fall back to the default.
    pub fn from_env() -> Self {
        let mut config = EngineConfig::default();

        if let Ok(rate) = std::env::var("RESORT_GST_RATE") {
            if let Ok(pct) = rate.parse::<f64>() {
                if (0.0..=100.0).contains(&pct) {
                    config.gst_rate = Rate::from_percentage(pct);
                }
            }
        }

        if let Ok(attempts) = std::env::var("RESORT_MAX_ATTEMPTS") {
            if let Ok(n) = attempts.parse::<u32>() {
                config.max_attempts = n.max(1);
            }
        }

        if let Ok(backoff) = std::env::var("RESORT_RETRY_BACKOFF_MS") {
            if let Ok(ms) = backoff.parse::<u64>() {
                config.retry_backoff_ms = ms;
            }
        }

        config
    }

    pub fn with_gst_rate(mut self, rate: Rate) -> Self {
        self.gst_rate = rate;
        self
    }

    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    /// Delay before retry number `attempt` (1-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.retry_backoff_ms.saturating_mul(attempt as u64))
    }
}
