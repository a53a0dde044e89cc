//! Room configuration.

use std::time::Duration;

use bingo_tick::TickConfig;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// RoomConfig
// ---------------------------------------------------------------------------

/// Settings shared by every room a registry creates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomConfig {
    /// How long a new (or reset) room waits before starting on its own.
    pub wait_window: Duration,

    /// Capacity of each room actor's command inbox. Callers wait while it
    /// is full.
    pub channel_size: usize,

    /// Capacity of each room's event broadcast. Observers that fall
    /// further behind than this skip ahead.
    pub event_capacity: usize,

    /// How often a waiting room checks its own countdown. `None` means
    /// rooms only start when a snapshot notices the deadline passed.
    pub sweep_interval: Option<Duration>,

    /// How long a room may go without commands and without observers
    /// before [`RoomRegistry::reap_idle`](crate::RoomRegistry::reap_idle)
    /// closes it. `None` keeps rooms until they are closed explicitly.
    pub idle_ttl: Option<Duration>,

    /// Fixed RNG seed for reproducible rounds. Each room mixes in its own
    /// id, so rooms still differ from each other.
    pub seed: Option<u64>,
}

impl RoomConfig {
    /// The sweep schedule for a room actor.
    pub fn tick_config(&self) -> TickConfig {
        match self.sweep_interval {
            Some(interval) => TickConfig::every(interval),
            None => TickConfig::idle(),
        }
        .validated()
    }
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            wait_window: Duration::from_secs(30),
            channel_size: 64,
            event_capacity: 64,
            sweep_interval: Some(Duration::from_secs(1)),
            idle_ttl: Some(Duration::from_secs(600)),
            seed: None,
        }
    }
}
