//! Centralized configuration for the Spyglass host.
//!
//! Compile-time defaults for timeouts and capacity limits. Per-host overrides
//! (for tests or embedders with different latency requirements) go through
//! [`HostBuilder`](crate::host::HostBuilder).

use std::time::Duration;

/// Host-level tunables.
pub struct HostConfig;

impl HostConfig {
    /// How long a `wait_for_record` call waits for a pending registration
    /// before failing with a timeout.
    pub const WAIT_TIMEOUT: Duration = Duration::from_millis(2000);

    /// Maximum number of registration jobs that may sit in the queue at once.
    /// Further enqueues are rejected rather than buffered without bound.
    pub const JOB_QUEUE_DEPTH: usize = 1024;
}
