//! # Yard Audio
//!
//! Pooled transient audio playback for the crane yard game.
//!
//! ## Features
//!
//! - **Bounded Pools**: Reusable playback sources with a hard capacity
//! - **Completion Watches**: Automatic release and end callbacks, polled per frame
//! - **Mixer**: Group volumes folded into every pooled source
//! - **Backends**: Simulated sources for tests and headless runs, Rodio behind the `rodio` feature
//! - **Config Files**: Pool sizing and volumes from TOML or RON
//!
//! ## Quick Start
//!
//! ```rust
//! use std::time::Duration;
//! use yard_audio::prelude::*;
//!
//! fn main() -> Result<(), AudioError> {
//!     let clock = SharedClock::new();
//!     let audio = AudioService::new(&AudioConfig::default(), SimulatedFactory::new(clock.clone()))?;
//!
//!     let hum = AudioClip::silent("motor_hum", Duration::from_secs(2));
//!     let motor = audio.play(PlaybackRequest::new(hum).attached_to(SlotId(1)).looping())?;
//!     audio.play_at(AudioClip::silent("drop", Duration::from_millis(400)), Vec3::new(12.0, 0.0, 4.0))?;
//!
//!     for _ in 0..30 {
//!         clock.advance(Duration::from_millis(16));
//!         audio.update();
//!     }
//!
//!     audio.release(motor)?;
//!     audio.shutdown()
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

// Core configuration
pub mod core;
pub mod config;

pub mod foundation;
pub mod audio;

pub use audio::{AudioError, AudioService};

/// Common imports for crate users
pub mod prelude {
    pub use crate::{
        audio::{
            backend::simulated::SimulatedFactory,
            AudioClip, AudioError, AudioService, ElementState, MixerSystem, Placement,
            PlayableSource, PlaybackHandle, PlaybackPriority, PlaybackRequest, PoolStats,
            SlotId, SourceFactory, SourcePool, TickScheduler, VolumeGroup,
        },
        config::{Config, ConfigError},
        core::config::{AudioConfig, CapacityPolicy, PoolConfig},
        foundation::{
            math::Vec3,
            time::{FixedStep, SharedClock},
        },
    };
}
