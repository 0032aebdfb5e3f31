//! genrelay - Generation Job Orchestration Service
//!
//! An asynchronous orchestration and rate-limiting layer in front of
//! third-party AI generation providers: text-to-3D model generation with a
//! preview → refine pipeline, and text-to-skybox generation.
//!
//! ## Core Guarantees
//!
//! - **Per-client admission**: a fixed concurrency ceiling per network
//!   origin, checked before any provider call
//! - **Exactly-once settlement**: every admitted job releases its quota
//!   slot exactly once, on its first observed terminal state
//! - **Bounded polling**: the server-owned poll loop has a hard attempt
//!   budget; the client-driven poll never sleeps server-side
//! - **Defensive provider parsing**: status vocabulary and payload shape
//!   quirks are isolated in one classification module
//!
//! ## Quick Start
//!
//! ```ignore
//! use genrelay::config::ConfigLoader;
//! use genrelay::orchestrator::Orchestrator;
//! use genrelay::provider::{MeshProvider, SkyboxProvider};
//! use genrelay::quota::{InMemoryQuotaStore, RateLimiter};
//!
//! let config = ConfigLoader::load()?;
//! let store = Arc::new(InMemoryQuotaStore::new());
//! let limiter = RateLimiter::new(store.clone(), config.quota.max_concurrent_generations);
//! let orchestrator = Orchestrator::new(
//!     Arc::new(MeshProvider::new(config.providers.mesh_api_key.clone())?),
//!     Arc::new(SkyboxProvider::new(config.providers.skybox_api_key.clone())?),
//!     limiter,
//! );
//! ```
//!
//! ## Modules
//!
//! - [`provider`]: generation provider clients behind one trait seam
//! - [`quota`]: per-client concurrency quota with periodic full reset
//! - [`orchestrator`]: submission, polling, chaining, asset resolution
//! - [`server`]: the HTTP surface
//! - [`config`]: Figment-based configuration loading

pub mod config;
pub mod constants;
pub mod orchestrator;
pub mod provider;
pub mod quota;
pub mod server;
pub mod types;

// =============================================================================
// Core Re-exports
// =============================================================================

// Configuration
pub use config::{Config, ConfigLoader};

// Error Types
pub use types::error::{RelayError, Result};

// Domain Types
pub use types::{ClientId, Job, JobKind, JobStatus, ResolvedAsset, TaskId};

// Orchestration
pub use orchestrator::{Orchestrator, StatusSnapshot};

// Quota
pub use quota::{InMemoryQuotaStore, QuotaResetTask, QuotaStore, RateLimiter};
