//! Audio playback
//!
//! Bounded pools of reusable playback sources. A caller checks a source out
//! with a [`PlaybackRequest`], gets a [`PlaybackHandle`] back, and either
//! releases it or lets the pool release it once playback ends. Completion is
//! observed by per-checkout watches running on a [`TickScheduler`].
//!
//! ```text
//! AudioService
//!     ├── MixerSystem (group volumes)
//!     ├── TickScheduler ──── CompletionWatch per checkout
//!     ├── SourcePool "global" ─┐
//!     └── SourcePool "local"  ─┴── SourceFactory → PlayableSource
//! ```

pub mod backend;
pub mod clip;
pub mod mixer;
pub mod pool;
pub mod scheduler;
pub mod service;
mod watch;

#[cfg(test)]
mod tests;

pub use backend::{Placement, PlayableSource, SlotId, SourceFactory, SourceSettings};
pub use clip::AudioClip;
pub use mixer::{MixerSystem, VolumeGroup};
pub use pool::{ElementId, ElementState, PlaybackHandle, PlaybackPriority, PlaybackRequest, PoolId, PoolStats, SourcePool};
pub use scheduler::{Scheduler, TaskStatus, TickContext, TickScheduler, TickTask};
pub use service::AudioService;

use crate::config::ConfigError;
use thiserror::Error;

/// Audio errors
#[derive(Error, Debug)]
pub enum AudioError {
    /// No idle element, no room to grow, and nothing could be stolen
    #[error("Pool '{pool}' is at capacity ({max_size} sources)")]
    CapacityExceeded {
        /// Pool name
        pool: String,
        /// Configured maximum
        max_size: usize,
    },

    /// The handle's checkout already ended (released, auto-released or stolen)
    #[error("Playback handle was already released")]
    DoubleRelease,

    /// The handle belongs to a different pool
    #[error("Playback handle does not belong to this pool")]
    InvalidHandle,

    /// The pool was shut down while sources were still playing; they were stopped and freed
    #[error("Pool shut down with {active} active source(s)")]
    TeardownWhileActive {
        /// Sources that were forcibly stopped
        active: usize,
    },

    /// The pool no longer accepts checkouts
    #[error("Pool has been shut down")]
    PoolShutDown,

    /// The factory could not build a source
    #[error("Source creation failed: {0}")]
    SourceCreation(String),

    /// The backend failed to start playback
    #[error("Playback failed: {0}")]
    PlaybackFailed(String),

    /// The backend has no output device
    #[error("Audio backend not initialized")]
    BackendNotInitialized,

    /// Invalid pool or service configuration
    #[error("Invalid audio configuration: {0}")]
    InvalidConfig(String),

    /// Configuration file error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}
