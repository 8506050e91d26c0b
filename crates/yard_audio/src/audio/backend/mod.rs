//! Audio backend implementations
//!
//! Platform-independent abstraction over the things a pool hands out: a
//! playable source and the factory that builds one.
//!
//! # Threading
//! Nothing here is `Send`: sources are created, driven and destroyed on the
//! frame thread.

pub mod simulated;
#[cfg(feature = "rodio")]
pub mod rodio_backend;

use crate::audio::clip::AudioClip;
use crate::audio::mixer::VolumeGroup;
use crate::audio::AudioError;
use crate::foundation::math::Vec3;
use serde::{Deserialize, Serialize};

/// Identifier of an attachment point in the scene (a crane hook, a trolley, ...)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct SlotId(pub u32);

impl SlotId {
    /// The slot idle sources are parked at unless a pool says otherwise
    pub const HOLDING: Self = Self(0);
}

/// Where a source emits from
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Placement {
    /// Fixed world position
    Position(Vec3),
    /// Follows an attachment point
    Slot(SlotId),
}

/// Pool-scoped settings handed to the factory for every source it builds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SourceSettings {
    /// Output level of the owning pool (0.0 to 1.0)
    pub mix_level: f32,
    /// Mixer group the source reports to
    pub group: VolumeGroup,
}

/// A single reusable playback unit
///
/// The pool relies on `is_playing`, `stop`, `set_clip`, `set_volume`,
/// `set_enabled` and `set_placement`; the rest is forwarded on checkout.
pub trait PlayableSource {
    /// Start playing `clip` from the beginning, replacing the current clip
    fn play(&mut self, clip: &AudioClip);

    /// Fire `clip` once without replacing the current clip
    fn play_one_shot(&mut self, clip: &AudioClip);

    /// Stop playback
    fn stop(&mut self);

    /// Whether the source is still producing sound
    fn is_playing(&self) -> bool;

    /// Set or clear the content reference
    fn set_clip(&mut self, clip: Option<AudioClip>);

    /// Current content reference
    fn clip(&self) -> Option<&AudioClip>;

    /// Output volume (0.0 to 1.0)
    fn set_volume(&mut self, volume: f32);

    /// Current output volume
    fn volume(&self) -> f32;

    /// Loop the clip until stopped
    fn set_looping(&mut self, looping: bool);

    /// Enable or disable the source (a disabled source is silent)
    fn set_enabled(&mut self, enabled: bool);

    /// Move the source
    fn set_placement(&mut self, placement: Placement);
}

/// Builds and frees playable sources for a pool
pub trait SourceFactory {
    /// The source type this factory builds
    type Source: PlayableSource;

    /// Build one source
    fn create(&mut self, settings: &SourceSettings) -> Result<Self::Source, AudioError>;

    /// Free a source for good
    fn destroy(&mut self, mut source: Self::Source) {
        source.stop();
    }
}
