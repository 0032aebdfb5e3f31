//! Global Constants
//!
//! Centralized constants for configuration and tuning.
//! All magic numbers should be defined here with documentation.

/// Per-client quota constants
pub mod quota {
    /// Maximum concurrently in-flight generation jobs per client
    pub const MAX_CONCURRENT_GENERATIONS: u32 = 2;

    /// Interval between full quota-map resets (seconds)
    ///
    /// The entire client map is cleared on this cadence, regardless of
    /// in-flight jobs. A job that straddles a reset frees its slot early;
    /// the saturating decrement keeps the counter well-defined afterwards.
    pub const RESET_INTERVAL_SECS: u64 = 600;
}

/// Status polling constants
pub mod poll {
    /// Delay between consecutive status queries (seconds)
    pub const INTERVAL_SECS: u64 = 5;

    /// Maximum status queries before giving up on a terminal state
    ///
    /// 60 attempts at 5-second spacing caps the synchronous loop at
    /// roughly five minutes.
    pub const MAX_ATTEMPTS: u32 = 60;
}

/// Refinement pipeline constants
pub mod refine {
    /// Ceiling for the refine submission call itself (seconds)
    ///
    /// Bounds the outbound request that starts refinement, not the
    /// resulting job.
    pub const SUBMIT_TIMEOUT_SECS: u64 = 8;
}

/// HTTP/Network constants
pub mod network {
    /// Request timeout for provider calls (seconds)
    pub const REQUEST_TIMEOUT_SECS: u64 = 30;

    /// Connection timeout (seconds)
    pub const CONNECTION_TIMEOUT_SECS: u64 = 10;
}

/// HTTP server constants
pub mod server {
    /// Default listen port
    pub const DEFAULT_PORT: u16 = 8080;
}
