//! Simulated audio backend
//!
//! Sources that never touch a device: a source "plays" for as long as its
//! clip's duration has not elapsed on a [`SharedClock`]. The frame loop
//! advances the clock; the pool only ever sees `is_playing` flip.
//!
//! ```
//! use std::time::Duration;
//! use yard_audio::audio::backend::simulated::SimulatedFactory;
//! use yard_audio::audio::backend::{PlayableSource, SourceFactory, SourceSettings};
//! use yard_audio::audio::{AudioClip, VolumeGroup};
//! use yard_audio::foundation::time::SharedClock;
//!
//! let clock = SharedClock::new();
//! let mut factory = SimulatedFactory::new(clock.clone());
//! let settings = SourceSettings { mix_level: 1.0, group: VolumeGroup::Sfx };
//! let mut source = factory.create(&settings).unwrap();
//!
//! source.set_enabled(true);
//! source.play(&AudioClip::silent("beep", Duration::from_millis(100)));
//! assert!(source.is_playing());
//!
//! clock.advance(Duration::from_millis(100));
//! assert!(!source.is_playing());
//! ```

use super::{Placement, PlayableSource, SlotId, SourceFactory, SourceSettings};
use crate::audio::clip::AudioClip;
use crate::audio::AudioError;
use crate::foundation::time::SharedClock;
use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

/// Source whose playback is measured against a simulated clock
#[derive(Debug)]
pub struct SimulatedSource {
    id: u32,
    clock: SharedClock,
    clip: Option<AudioClip>,
    /// Clock time at which the main clip stops, `None` if not playing
    clip_ends_at: Option<Duration>,
    /// Clock time at which the last one-shot stops
    one_shots_end_at: Option<Duration>,
    looping: bool,
    enabled: bool,
    volume: f32,
    placement: Placement,
    plays: u32,
}

impl SimulatedSource {
    fn new(id: u32, clock: SharedClock, settings: &SourceSettings) -> Self {
        Self {
            id,
            clock,
            clip: None,
            clip_ends_at: None,
            one_shots_end_at: None,
            looping: false,
            enabled: false,
            volume: settings.mix_level,
            placement: Placement::Slot(SlotId::HOLDING),
            plays: 0,
        }
    }

    /// Factory-assigned identifier, stable for the source's lifetime
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Current placement
    pub fn placement(&self) -> Placement {
        self.placement
    }

    /// Whether the source is enabled
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Whether the main clip loops
    pub fn is_looping(&self) -> bool {
        self.looping
    }

    /// Number of `play` and `play_one_shot` calls over the source's lifetime
    pub fn play_count(&self) -> u32 {
        self.plays
    }
}

impl PlayableSource for SimulatedSource {
    fn play(&mut self, clip: &AudioClip) {
        self.clip = Some(clip.clone());
        self.clip_ends_at = Some(self.clock.now() + clip.duration());
        self.plays += 1;
    }

    fn play_one_shot(&mut self, clip: &AudioClip) {
        let ends_at = self.clock.now() + clip.duration();
        self.one_shots_end_at = Some(self.one_shots_end_at.map_or(ends_at, |current| current.max(ends_at)));
        self.plays += 1;
    }

    fn stop(&mut self) {
        self.clip_ends_at = None;
        self.one_shots_end_at = None;
    }

    fn is_playing(&self) -> bool {
        if !self.enabled {
            return false;
        }

        let now = self.clock.now();
        let main = match self.clip_ends_at {
            Some(_) if self.looping => true,
            Some(ends_at) => now < ends_at,
            None => false,
        };
        main || self.one_shots_end_at.is_some_and(|ends_at| now < ends_at)
    }

    fn set_clip(&mut self, clip: Option<AudioClip>) {
        if clip.is_none() {
            self.clip_ends_at = None;
        }
        self.clip = clip;
    }

    fn clip(&self) -> Option<&AudioClip> {
        self.clip.as_ref()
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
    }

    fn volume(&self) -> f32 {
        self.volume
    }

    fn set_looping(&mut self, looping: bool) {
        self.looping = looping;
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    fn set_placement(&mut self, placement: Placement) {
        self.placement = placement;
    }
}

#[derive(Debug, Default)]
struct FactoryCounters {
    next_id: Cell<u32>,
    created: Cell<usize>,
    destroyed: Cell<usize>,
}

/// Builds [`SimulatedSource`]s; clones share the clock and counters
#[derive(Debug, Clone)]
pub struct SimulatedFactory {
    clock: SharedClock,
    counters: Rc<FactoryCounters>,
    limit: Option<usize>,
}

impl SimulatedFactory {
    /// Create a factory whose sources read `clock`
    pub fn new(clock: SharedClock) -> Self {
        Self {
            clock,
            counters: Rc::new(FactoryCounters::default()),
            limit: None,
        }
    }

    /// Fail every `create` once `limit` sources exist (live across all clones)
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Sources created so far
    pub fn created(&self) -> usize {
        self.counters.created.get()
    }

    /// Sources destroyed so far
    pub fn destroyed(&self) -> usize {
        self.counters.destroyed.get()
    }

    /// Sources currently alive
    pub fn live(&self) -> usize {
        self.created() - self.destroyed()
    }
}

impl SourceFactory for SimulatedFactory {
    type Source = SimulatedSource;

    fn create(&mut self, settings: &SourceSettings) -> Result<SimulatedSource, AudioError> {
        if let Some(limit) = self.limit {
            if self.live() >= limit {
                return Err(AudioError::SourceCreation(format!(
                    "simulated device limit of {limit} sources reached"
                )));
            }
        }

        let id = self.counters.next_id.get();
        self.counters.next_id.set(id.wrapping_add(1));
        self.counters.created.set(self.counters.created.get() + 1);
        Ok(SimulatedSource::new(id, self.clock.clone(), settings))
    }

    fn destroy(&mut self, mut source: SimulatedSource) {
        source.stop();
        self.counters.destroyed.set(self.counters.destroyed.get() + 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::mixer::VolumeGroup;

    const SETTINGS: SourceSettings = SourceSettings { mix_level: 0.5, group: VolumeGroup::Sfx };

    fn enabled_source(clock: &SharedClock) -> SimulatedSource {
        let mut factory = SimulatedFactory::new(clock.clone());
        let mut source = factory.create(&SETTINGS).unwrap();
        source.set_enabled(true);
        source
    }

    #[test]
    fn test_plays_for_clip_duration() {
        let clock = SharedClock::new();
        let mut source = enabled_source(&clock);
        source.play(&AudioClip::silent("drop", Duration::from_millis(300)));

        clock.advance(Duration::from_millis(200));
        assert!(source.is_playing());
        clock.advance(Duration::from_millis(100));
        assert!(!source.is_playing());
    }

    #[test]
    fn test_looping_plays_until_stopped() {
        let clock = SharedClock::new();
        let mut source = enabled_source(&clock);
        source.set_looping(true);
        source.play(&AudioClip::silent("motor", Duration::from_millis(100)));

        clock.advance(Duration::from_secs(10));
        assert!(source.is_playing());
        source.stop();
        assert!(!source.is_playing());
    }

    #[test]
    fn test_one_shot_keeps_clip() {
        let clock = SharedClock::new();
        let mut source = enabled_source(&clock);
        source.play_one_shot(&AudioClip::silent("click", Duration::from_millis(50)));

        assert!(source.clip().is_none());
        assert!(source.is_playing());
        clock.advance(Duration::from_millis(50));
        assert!(!source.is_playing());
        assert_eq!(source.play_count(), 1);
    }

    #[test]
    fn test_disabled_source_is_silent() {
        let clock = SharedClock::new();
        let mut source = enabled_source(&clock);
        source.play(&AudioClip::silent("horn", Duration::from_secs(1)));
        source.set_enabled(false);
        assert!(!source.is_playing());
    }

    #[test]
    fn test_factory_counters_and_limit() {
        let clock = SharedClock::new();
        let mut factory = SimulatedFactory::new(clock).with_limit(2);
        let mut other = factory.clone();

        let a = factory.create(&SETTINGS).unwrap();
        let b = other.create(&SETTINGS).unwrap();
        assert_ne!(a.id(), b.id());
        assert!(matches!(factory.create(&SETTINGS), Err(AudioError::SourceCreation(_))));

        factory.destroy(a);
        assert_eq!(other.live(), 1);
        assert!(other.create(&SETTINGS).is_ok());
        assert_eq!(factory.created(), 3);
        assert_eq!(factory.destroyed(), 1);
    }
}
