//! Delivery pipeline parameters.
//!
//! The queue between capture and consumer is unbounded. These settings make
//! its growth visible and pick what happens to undelivered packets on stop;
//! they never drop or block captures.

use serde::{Deserialize, Serialize};
use validator::{self, Validate};

#[derive(Debug, Serialize, Deserialize, Validate, Clone)]
pub struct DeliveryConfig {
    /// Queue depth that triggers a warning (0 disables it).
    #[serde(default = "default_high_water_mark")]
    pub high_water_mark: usize,

    /// Deliver whatever is still queued when a session stops instead of
    /// discarding it.
    #[serde(default)]
    pub flush_on_stop: bool,
}

fn default_high_water_mark() -> usize {
    100_000
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            high_water_mark: default_high_water_mark(),
            flush_on_stop: false,
        }
    }
}
