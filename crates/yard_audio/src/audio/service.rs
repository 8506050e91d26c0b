//! Audio service
//!
//! Owns the scheduler, the mixer and the two playback pools the game uses:
//! a global pool for non-positional sounds and a local pool for sounds that
//! come from somewhere in the yard. Both pools run the same lifecycle
//! engine; only their [`PoolConfig`](crate::core::config::PoolConfig)
//! differs.
//!
//! Call [`AudioService::update`] once per frame.

use super::backend::{Placement, SlotId, SourceFactory};
use super::clip::AudioClip;
use super::mixer::{MixerSystem, VolumeGroup};
use super::pool::{PlaybackHandle, PlaybackRequest, SourcePool};
use super::scheduler::{Scheduler, TickScheduler};
use super::AudioError;
use crate::config::Config;
use crate::core::config::AudioConfig;
use crate::foundation::math::Vec3;
use std::path::Path;
use std::rc::Rc;

/// Pooled audio playback for the whole game
pub struct AudioService<F: SourceFactory + 'static> {
    scheduler: Rc<TickScheduler>,
    mixer: MixerSystem,
    global: SourcePool<F>,
    local: SourcePool<F>,
}

impl<F: SourceFactory + Clone + 'static> AudioService<F> {
    /// Create the service; both pools get a clone of `factory`
    ///
    /// # Errors
    /// - `InvalidConfig` if `config` does not validate
    /// - `SourceCreation` if pre-allocation fails
    pub fn new(config: &AudioConfig, factory: F) -> Result<Self, AudioError> {
        config.validate().map_err(AudioError::InvalidConfig)?;

        let scheduler = Rc::new(TickScheduler::new());
        let shared: Rc<dyn Scheduler> = scheduler.clone();
        let mixer = MixerSystem::from_levels(config.group_levels());

        let global = SourcePool::new("global", config.global.clone(), factory.clone(), Rc::clone(&shared))?;
        let local = SourcePool::new("local", config.local.clone(), factory, shared)?;

        let service = Self { scheduler, mixer, global, local };
        service.refresh_levels();
        Ok(service)
    }

    /// Create the service from a `.toml` or `.ron` file, or defaults if it does not exist
    ///
    /// # Errors
    /// `Config` if the file cannot be read or parsed, plus those of [`new`](Self::new).
    pub fn from_config_file(path: impl AsRef<Path>, factory: F) -> Result<Self, AudioError> {
        let config = AudioConfig::load_or_default(path)?;
        Self::new(&config, factory)
    }
}

impl<F: SourceFactory + 'static> AudioService<F> {
    /// Check out a source; unplaced requests go to the global pool, placed ones to the local pool
    ///
    /// # Errors
    /// See [`SourcePool::checkout`].
    pub fn play(&self, request: PlaybackRequest) -> Result<PlaybackHandle, AudioError> {
        match request.placement() {
            Some(_) => self.local.checkout(request),
            None => self.global.checkout(request),
        }
    }

    /// Check out from the global pool regardless of placement
    ///
    /// # Errors
    /// See [`SourcePool::checkout`].
    pub fn play_global(&self, request: PlaybackRequest) -> Result<PlaybackHandle, AudioError> {
        self.global.checkout(request)
    }

    /// Fire-and-forget a clip at a world position
    ///
    /// # Errors
    /// See [`SourcePool::checkout`].
    pub fn play_at(&self, clip: AudioClip, position: Vec3) -> Result<(), AudioError> {
        let request = PlaybackRequest::new(clip).at(position).with_auto_remove(true);
        self.local.checkout(request).map(drop)
    }

    /// Fire-and-forget a clip on an attachment point
    ///
    /// # Errors
    /// See [`SourcePool::checkout`].
    pub fn play_attached(&self, clip: AudioClip, slot: SlotId) -> Result<(), AudioError> {
        let request = PlaybackRequest::new(clip).attached_to(slot).with_auto_remove(true);
        self.local.checkout(request).map(drop)
    }

    /// Fire-and-forget a non-positional one-shot (button clicks and the like)
    ///
    /// # Errors
    /// See [`SourcePool::checkout`].
    pub fn play_ui(&self, clip: AudioClip) -> Result<(), AudioError> {
        let request = PlaybackRequest::new(clip).one_shot().with_auto_remove(true);
        self.global.checkout(request).map(drop)
    }

    /// Release a handle from either pool
    ///
    /// # Errors
    /// See [`SourcePool::release`].
    pub fn release(&self, handle: PlaybackHandle) -> Result<(), AudioError> {
        self.pool_of(&handle).release(handle)
    }

    /// Move a checked-out source
    ///
    /// # Errors
    /// See [`SourcePool::set_placement`].
    pub fn set_placement(&self, handle: &PlaybackHandle, placement: Placement) -> Result<(), AudioError> {
        self.pool_of(handle).set_placement(handle, placement)
    }

    /// Whether the handle's checkout is still live
    pub fn is_active(&self, handle: &PlaybackHandle) -> bool {
        self.pool_of(handle).is_active(handle)
    }

    fn pool_of(&self, handle: &PlaybackHandle) -> &SourcePool<F> {
        if handle.pool_id() == self.global.id() {
            &self.global
        } else {
            &self.local
        }
    }

    /// Advance one frame: every completion watch is polled once
    pub fn update(&self) -> usize {
        self.scheduler.tick()
    }

    /// Set a group volume and re-level both pools
    pub fn set_group_volume(&mut self, group: VolumeGroup, volume: f32) {
        self.mixer.set_group_volume(group, volume);
        self.refresh_levels();
    }

    /// Mute a group and re-level both pools
    pub fn mute_group(&mut self, group: VolumeGroup) {
        self.mixer.mute_group(group);
        self.refresh_levels();
    }

    /// Unmute a group and re-level both pools
    pub fn unmute_group(&mut self, group: VolumeGroup) {
        self.mixer.unmute_group(group);
        self.refresh_levels();
    }

    fn refresh_levels(&self) {
        for pool in [&self.global, &self.local] {
            pool.set_group_gain(self.mixer.effective_volume(pool.group()));
        }
    }

    /// Shut both pools down and drop every pending watch
    ///
    /// # Errors
    /// `TeardownWhileActive` with the total number of sources that had to
    /// be stopped; both pools are torn down regardless.
    pub fn shutdown(&self) -> Result<(), AudioError> {
        let mut active = 0;
        for pool in [&self.global, &self.local] {
            match pool.shutdown() {
                Ok(()) => {}
                Err(AudioError::TeardownWhileActive { active: count }) => active += count,
                Err(e) => return Err(e),
            }
        }
        self.scheduler.clear();

        if active > 0 {
            log::warn!("Audio service shut down with {active} source(s) still playing");
            return Err(AudioError::TeardownWhileActive { active });
        }
        Ok(())
    }

    /// The non-positional pool
    pub fn global(&self) -> &SourcePool<F> {
        &self.global
    }

    /// The positional pool
    pub fn local(&self) -> &SourcePool<F> {
        &self.local
    }

    /// The mixer
    pub fn mixer(&self) -> &MixerSystem {
        &self.mixer
    }

    /// The scheduler driving completion watches
    pub fn scheduler(&self) -> &TickScheduler {
        &self.scheduler
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::backend::simulated::SimulatedFactory;
    use crate::audio::backend::PlayableSource;
    use crate::audio::pool::ElementState;
    use crate::core::config::PoolConfig;
    use crate::foundation::time::SharedClock;
    use approx::assert_relative_eq;
    use std::time::Duration;

    const STEP: Duration = Duration::from_millis(100);

    fn service(config: &AudioConfig) -> (AudioService<SimulatedFactory>, SharedClock) {
        let clock = SharedClock::new();
        let service = AudioService::new(config, SimulatedFactory::new(clock.clone())).unwrap();
        (service, clock)
    }

    fn small_config() -> AudioConfig {
        AudioConfig {
            global: PoolConfig::global().with_sizes(1, 2),
            local: PoolConfig::local().with_sizes(1, 3),
            ..AudioConfig::default()
        }
    }

    fn frame(service: &AudioService<SimulatedFactory>, clock: &SharedClock) {
        clock.advance(STEP);
        service.update();
    }

    #[test]
    fn test_routes_by_placement() {
        let (service, _) = service(&small_config());
        let clip = AudioClip::silent("horn", Duration::from_secs(1));

        let unplaced = service.play(PlaybackRequest::new(clip.clone())).unwrap();
        let placed = service.play(PlaybackRequest::new(clip).at(Vec3::new(3.0, 0.0, 1.0))).unwrap();

        assert_eq!(unplaced.pool_id(), service.global().id());
        assert_eq!(placed.pool_id(), service.local().id());

        service.release(unplaced).unwrap();
        service.release(placed).unwrap();
        assert_eq!(service.global().active_count(), 0);
        assert_eq!(service.local().active_count(), 0);
    }

    #[test]
    fn test_fire_and_forget_returns_to_pool() {
        let (service, clock) = service(&small_config());
        service.play_at(AudioClip::silent("drop", Duration::from_millis(200)), Vec3::zeros()).unwrap();
        service.play_attached(AudioClip::silent("chain", Duration::from_millis(200)), SlotId(4)).unwrap();
        service.play_ui(AudioClip::silent("click", Duration::from_millis(100))).unwrap();
        assert_eq!(service.local().active_count(), 2);
        assert_eq!(service.global().active_count(), 1);

        frame(&service, &clock);
        assert_eq!(service.global().active_count(), 0);
        frame(&service, &clock);
        assert_eq!(service.local().active_count(), 0);
        assert_eq!(service.local().idle_count(), 2);
        assert_eq!(service.scheduler().pending(), 0);
    }

    #[test]
    fn test_mixer_changes_relevel_active_sources() {
        let (mut service, _) = service(&small_config());
        let clip = AudioClip::silent("motor", Duration::from_secs(5));
        let handle = service.play(PlaybackRequest::new(clip).attached_to(SlotId(1))).unwrap();
        let volume = |service: &AudioService<SimulatedFactory>, handle: &PlaybackHandle| {
            service.local().inspect(handle.element(), |source, _| source.volume()).unwrap()
        };
        assert_relative_eq!(volume(&service, &handle), 1.0);

        service.set_group_volume(VolumeGroup::Sfx, 0.5);
        assert_relative_eq!(volume(&service, &handle), 0.5);

        service.mute_group(VolumeGroup::Master);
        assert_relative_eq!(volume(&service, &handle), 0.0);

        service.unmute_group(VolumeGroup::Master);
        assert_relative_eq!(volume(&service, &handle), 0.5);
        assert_relative_eq!(service.mixer().effective_volume(VolumeGroup::Sfx), 0.5);
    }

    #[test]
    fn test_set_placement_routes_to_owner() {
        let (service, _) = service(&small_config());
        let clip = AudioClip::silent("trolley", Duration::from_secs(5));
        let handle = service.play(PlaybackRequest::new(clip).attached_to(SlotId(1))).unwrap();

        service.set_placement(&handle, Placement::Slot(SlotId(2))).unwrap();
        let (placement, state) = service
            .local()
            .inspect(handle.element(), |source, state| (source.placement(), state))
            .unwrap();
        assert_eq!(placement, Placement::Slot(SlotId(2)));
        assert_eq!(state, ElementState::Active);
        assert!(service.is_active(&handle));
    }

    #[test]
    fn test_shutdown_sums_active_sources() {
        let (service, clock) = service(&small_config());
        let clip = AudioClip::silent("alarm", Duration::from_secs(5));
        let _a = service.play(PlaybackRequest::new(clip.clone())).unwrap();
        let _b = service.play(PlaybackRequest::new(clip.clone()).at(Vec3::zeros())).unwrap();
        let _c = service.play(PlaybackRequest::new(clip).at(Vec3::zeros())).unwrap();

        let result = service.shutdown();
        assert!(matches!(result, Err(AudioError::TeardownWhileActive { active: 3 })));
        assert_eq!(service.scheduler().pending(), 0);
        frame(&service, &clock);
        assert!(service.global().is_shut_down());
        assert!(service.local().is_shut_down());
    }

    #[test]
    fn test_invalid_config() {
        let mut config = small_config();
        config.master_volume = 2.0;
        let result = AudioService::new(&config, SimulatedFactory::new(SharedClock::new()));
        assert!(matches!(result, Err(AudioError::InvalidConfig(_))));
    }

    #[test]
    fn test_from_config_file() {
        let path = std::env::temp_dir().join(format!("yard_audio_{}_service.toml", std::process::id()));
        std::fs::write(&path, "[global]\ndefault_size = 2\nmax_size = 3\n").unwrap();

        let service = AudioService::from_config_file(&path, SimulatedFactory::new(SharedClock::new())).unwrap();
        assert_eq!(service.global().idle_count(), 2);
        assert_eq!(service.global().max_size(), 3);
        let _ = std::fs::remove_file(&path);

        std::fs::write(&path, "master_volume = \"loud\"").unwrap();
        let result = AudioService::from_config_file(&path, SimulatedFactory::new(SharedClock::new()));
        assert!(matches!(result, Err(AudioError::Config(_))));
        let _ = std::fs::remove_file(&path);
    }
}
