//! Source pool
//!
//! Hands out bounded, reusable playback sources. Each checkout starts a
//! [`CompletionWatch`](super::watch::CompletionWatch) on the scheduler that
//! notices when the source stops playing, optionally releases it back to the
//! pool, and then fires the request's `on_end` callback exactly once.
//!
//! # Element lifecycle
//!
//! ```text
//!   create ──► Idle ──checkout──► Active ──release──► Idle
//!                │                  │
//!                └──── trim / shutdown ────► Destroyed
//! ```
//!
//! `default_size` elements are created up front; more are created on demand
//! until idle + active reaches `max_size`. Past that the pool's
//! [`CapacityPolicy`] decides between rejecting the checkout and stealing an
//! active element.
//!
//! # Handles
//!
//! A [`PlaybackHandle`] is neither `Clone` nor `Copy` and `release` consumes
//! it. A handle can still outlive its checkout (auto-release, steal); releasing
//! such a handle is reported as [`AudioError::DoubleRelease`] and changes
//! nothing.

use super::backend::{Placement, PlayableSource, SlotId, SourceFactory, SourceSettings};
use super::clip::AudioClip;
use super::mixer::VolumeGroup;
use super::scheduler::Scheduler;
use super::watch::CompletionWatch;
use super::AudioError;
use crate::core::config::{CapacityPolicy, PoolConfig};
use crate::foundation::math::Vec3;
use slotmap::SlotMap;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU32, Ordering};

slotmap::new_key_type! {
    /// Stable identifier of a pooled element
    pub struct ElementId;
}

/// Identifier of a pool, unique for the process lifetime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PoolId(u32);

impl PoolId {
    fn next() -> Self {
        static NEXT: AtomicU32 = AtomicU32::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// Callback fired once when a checkout's playback ends naturally
pub type EndCallback = Box<dyn FnOnce()>;

/// Lifecycle state of a pooled element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementState {
    /// Held by the pool, ready for reuse
    Idle,
    /// Checked out
    Active,
}

/// Priority used when a pool steals elements
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum PlaybackPriority {
    /// Lowest priority (ambient sounds)
    Low = 0,
    /// Normal priority (most sound effects)
    #[default]
    Normal = 1,
    /// High priority (important gameplay sounds)
    High = 2,
    /// Never stolen (UI feedback, player actions)
    Critical = 3,
}

/// What to play and how
pub struct PlaybackRequest {
    clip: AudioClip,
    placement: Option<Placement>,
    auto_remove: bool,
    one_shot: bool,
    looping: bool,
    priority: PlaybackPriority,
    volume: f32,
    on_end: Option<EndCallback>,
}

impl PlaybackRequest {
    /// Play `clip` once, unplaced, at full request volume
    ///
    /// Auto-remove is off: the caller owns the release.
    pub fn new(clip: AudioClip) -> Self {
        Self {
            clip,
            placement: None,
            auto_remove: false,
            one_shot: false,
            looping: false,
            priority: PlaybackPriority::Normal,
            volume: 1.0,
            on_end: None,
        }
    }

    /// Emit from a fixed world position
    pub fn at(self, position: Vec3) -> Self {
        self.with_placement(Placement::Position(position))
    }

    /// Emit from an attachment point
    pub fn attached_to(self, slot: SlotId) -> Self {
        self.with_placement(Placement::Slot(slot))
    }

    /// Set the placement
    pub fn with_placement(mut self, placement: Placement) -> Self {
        self.placement = Some(placement);
        self
    }

    /// Release the source automatically once playback ends
    pub fn with_auto_remove(mut self, auto_remove: bool) -> Self {
        self.auto_remove = auto_remove;
        self
    }

    /// Fire the clip as a one-shot instead of assigning it to the source
    pub fn one_shot(mut self) -> Self {
        self.one_shot = true;
        self
    }

    /// Loop until released
    pub fn looping(mut self) -> Self {
        self.looping = true;
        self
    }

    /// Set the steal priority
    pub fn with_priority(mut self, priority: PlaybackPriority) -> Self {
        self.priority = priority;
        self
    }

    /// Scale the pool's output level for this playback (0.0 to 1.0)
    pub fn with_volume(mut self, volume: f32) -> Self {
        self.volume = volume.clamp(0.0, 1.0);
        self
    }

    /// Call `callback` once when playback ends naturally
    pub fn on_end(mut self, callback: impl FnOnce() + 'static) -> Self {
        self.on_end = Some(Box::new(callback));
        self
    }

    /// The clip to play
    pub fn clip(&self) -> &AudioClip {
        &self.clip
    }

    /// Requested placement, if any
    pub fn placement(&self) -> Option<Placement> {
        self.placement
    }
}

impl fmt::Debug for PlaybackRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlaybackRequest")
            .field("clip", &self.clip.name())
            .field("placement", &self.placement)
            .field("auto_remove", &self.auto_remove)
            .field("one_shot", &self.one_shot)
            .field("looping", &self.looping)
            .field("priority", &self.priority)
            .field("volume", &self.volume)
            .field("on_end", &self.on_end.is_some())
            .finish()
    }
}

/// Token for one checkout; release it exactly once
#[derive(Debug, PartialEq, Eq)]
#[must_use = "dropping a handle leaves the source checked out until the pool shuts down"]
pub struct PlaybackHandle {
    pool: PoolId,
    element: ElementId,
    serial: u64,
}

impl PlaybackHandle {
    /// Pool the handle was issued by
    pub fn pool_id(&self) -> PoolId {
        self.pool
    }

    /// Element the handle was issued for
    pub fn element(&self) -> ElementId {
        self.element
    }
}

/// Lifetime counters of a pool
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Elements built by the factory
    pub created: usize,
    /// Elements handed back to the factory
    pub destroyed: usize,
    /// Successful checkouts
    pub checkouts: usize,
    /// Releases, explicit or automatic
    pub releases: usize,
    /// Playbacks that ended on their own
    pub completions: usize,
    /// Checkouts refused for lack of capacity
    pub rejections: usize,
    /// Active elements taken over by higher-or-equal priority checkouts
    pub steals: usize,
}

struct Element<S> {
    source: S,
    state: ElementState,
    /// Serial of the checkout holding the element, 0 while idle
    serial: u64,
    priority: PlaybackPriority,
    volume: f32,
}

/// What a watch found when it looked at its element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum WatchOutcome {
    /// The checkout is over; the watch must do nothing more
    Cancelled,
    /// Still playing
    Playing,
    /// Playback ended; auto-release (if requested) is done
    Finished,
}

/// Pool state shared between the pool handle and its watches
pub(super) struct PoolCore<F: SourceFactory> {
    id: PoolId,
    name: String,
    config: PoolConfig,
    group_gain: f32,
    factory: F,
    elements: SlotMap<ElementId, Element<F::Source>>,
    /// Reused last-in first-out
    idle: Vec<ElementId>,
    next_serial: u64,
    stats: PoolStats,
    shut_down: bool,
}

impl<F: SourceFactory> PoolCore<F> {
    fn output_level(&self) -> f32 {
        self.config.mix_level * self.group_gain
    }

    fn settings(&self) -> SourceSettings {
        SourceSettings {
            mix_level: self.output_level(),
            group: self.config.group,
        }
    }

    fn active_count(&self) -> usize {
        self.elements.len() - self.idle.len()
    }

    fn create_element(&mut self) -> Result<ElementId, AudioError> {
        let settings = self.settings();
        let mut source = self.factory.create(&settings)?;
        source.set_enabled(false);
        source.set_placement(Placement::Slot(self.config.holding_area));
        self.stats.created += 1;

        Ok(self.elements.insert(Element {
            source,
            state: ElementState::Idle,
            serial: 0,
            priority: PlaybackPriority::Normal,
            volume: 1.0,
        }))
    }

    fn destroy_element(&mut self, id: ElementId) {
        if let Some(element) = self.elements.remove(id) {
            self.factory.destroy(element.source);
            self.stats.destroyed += 1;
        }
    }

    /// Find an element for a checkout at `priority`, leaving it idle-but-unlisted
    fn acquire(&mut self, priority: PlaybackPriority) -> Result<ElementId, AudioError> {
        if let Some(id) = self.idle.pop() {
            return Ok(id);
        }

        if self.elements.len() < self.config.max_size {
            return self.create_element();
        }

        if self.config.policy == CapacityPolicy::Steal {
            if let Some(victim) = self.steal_candidate(priority) {
                log::warn!("Pool '{}' full, stealing {:?} for a {:?} playback", self.name, victim, priority);
                self.reset_element(victim);
                self.stats.steals += 1;
                return Ok(victim);
            }
        }

        self.stats.rejections += 1;
        log::warn!("Pool '{}' at capacity ({} sources), rejecting checkout", self.name, self.config.max_size);
        Err(AudioError::CapacityExceeded {
            pool: self.name.clone(),
            max_size: self.config.max_size,
        })
    }

    /// Lowest priority, then oldest checkout, among stealable active elements
    fn steal_candidate(&self, priority: PlaybackPriority) -> Option<ElementId> {
        self.elements
            .iter()
            .filter(|(_, element)| element.state == ElementState::Active)
            .filter(|(_, element)| element.priority != PlaybackPriority::Critical && element.priority <= priority)
            .min_by_key(|(_, element)| (element.priority, element.serial))
            .map(|(id, _)| id)
    }

    /// On-taken hook: enable, level, place and start playback
    fn take(&mut self, id: ElementId, request: &PlaybackRequest) -> Result<u64, AudioError> {
        self.next_serial += 1;
        let serial = self.next_serial;
        let level = self.output_level();

        let element = self.elements.get_mut(id).ok_or(AudioError::InvalidHandle)?;
        element.state = ElementState::Active;
        element.serial = serial;
        element.priority = request.priority;
        element.volume = request.volume;

        let source = &mut element.source;
        source.set_enabled(true);
        source.set_volume(level * request.volume);
        source.set_looping(request.looping);
        if let Some(placement) = request.placement {
            source.set_placement(placement);
        }

        if request.one_shot {
            source.play_one_shot(&request.clip);
        } else {
            source.play(&request.clip);
        }

        self.stats.checkouts += 1;
        Ok(serial)
    }

    /// On-release hook: silence and park the element without listing it idle
    fn reset_element(&mut self, id: ElementId) {
        let holding_area = self.config.holding_area;
        if let Some(element) = self.elements.get_mut(id) {
            let source = &mut element.source;
            source.stop();
            source.set_clip(None);
            source.set_looping(false);
            source.set_placement(Placement::Slot(holding_area));
            source.set_enabled(false);

            element.state = ElementState::Idle;
            element.serial = 0;
            element.priority = PlaybackPriority::Normal;
            element.volume = 1.0;
        }
    }

    /// Return an active element to the idle set, or destroy it when over capacity
    fn release_element(&mut self, id: ElementId) {
        self.reset_element(id);
        self.stats.releases += 1;

        if self.elements.len() > self.config.max_size {
            log::debug!("Pool '{}' over capacity, destroying released {:?}", self.name, id);
            self.destroy_element(id);
        } else {
            self.idle.push(id);
        }
    }

    /// Whether `serial` still holds `id`
    fn is_current(&self, id: ElementId, serial: u64) -> bool {
        self.elements
            .get(id)
            .is_some_and(|element| element.state == ElementState::Active && element.serial == serial)
    }

    fn check_handle(&self, handle: &PlaybackHandle) -> Result<(), AudioError> {
        if handle.pool != self.id {
            return Err(AudioError::InvalidHandle);
        }
        if self.shut_down {
            return Err(AudioError::PoolShutDown);
        }
        if !self.is_current(handle.element, handle.serial) {
            return Err(AudioError::DoubleRelease);
        }
        Ok(())
    }

    /// Called by a checkout's watch once per tick
    pub(super) fn observe(&mut self, id: ElementId, serial: u64, auto_remove: bool) -> WatchOutcome {
        if self.shut_down || !self.is_current(id, serial) {
            return WatchOutcome::Cancelled;
        }

        let playing = self
            .elements
            .get(id)
            .is_some_and(|element| element.source.is_playing());
        if playing {
            return WatchOutcome::Playing;
        }

        self.stats.completions += 1;
        if auto_remove {
            log::debug!("Pool '{}' auto-releasing finished {:?}", self.name, id);
            self.release_element(id);
        }
        WatchOutcome::Finished
    }

    /// Stop and free every element; returns how many were active
    fn teardown(&mut self) -> usize {
        let active = self.active_count();
        let ids: Vec<ElementId> = self.elements.keys().collect();
        for id in ids {
            if let Some(element) = self.elements.get_mut(id) {
                element.source.stop();
            }
            self.destroy_element(id);
        }
        self.idle.clear();
        self.shut_down = true;
        active
    }

    fn apply_levels(&mut self) {
        let level = self.output_level();
        for element in self.elements.values_mut() {
            if element.state == ElementState::Active {
                element.source.set_volume(level * element.volume);
            }
        }
    }
}

impl<F: SourceFactory> Drop for PoolCore<F> {
    fn drop(&mut self) {
        if self.shut_down {
            return;
        }
        let active = self.teardown();
        if active > 0 {
            log::warn!("Pool '{}' dropped with {} active source(s); stopped them", self.name, active);
        }
    }
}

/// Bounded pool of playback sources
///
/// Single-threaded: the pool, its watches and every callback run on the
/// thread that ticks the scheduler.
pub struct SourcePool<F: SourceFactory + 'static> {
    core: Rc<RefCell<PoolCore<F>>>,
    scheduler: Rc<dyn Scheduler>,
}

impl<F: SourceFactory + 'static> SourcePool<F> {
    /// Create a pool and pre-allocate `config.default_size` elements
    ///
    /// # Errors
    /// - `InvalidConfig` if `config` does not validate
    /// - `SourceCreation` if the factory fails while pre-allocating
    pub fn new(
        name: impl Into<String>,
        config: PoolConfig,
        factory: F,
        scheduler: Rc<dyn Scheduler>,
    ) -> Result<Self, AudioError> {
        config.validate().map_err(AudioError::InvalidConfig)?;

        let name = name.into();
        let mut core = PoolCore {
            id: PoolId::next(),
            name,
            config,
            group_gain: 1.0,
            factory,
            elements: SlotMap::with_key(),
            idle: Vec::new(),
            next_serial: 0,
            stats: PoolStats::default(),
            shut_down: false,
        };

        for _ in 0..core.config.default_size {
            let id = core.create_element()?;
            core.idle.push(id);
        }

        log::info!(
            "Pool '{}' ready: {} pre-allocated, max {}, {:?}",
            core.name,
            core.config.default_size,
            core.config.max_size,
            core.config.policy
        );

        Ok(Self {
            core: Rc::new(RefCell::new(core)),
            scheduler,
        })
    }

    /// Check out a source and start playing `request`
    ///
    /// # Errors
    /// - `PoolShutDown` after [`shutdown`](Self::shutdown)
    /// - `CapacityExceeded` when exhausted and the policy cannot make room
    /// - `SourceCreation` if the factory fails to build a new element
    pub fn checkout(&self, mut request: PlaybackRequest) -> Result<PlaybackHandle, AudioError> {
        let (handle, pool_name) = {
            let mut core = self.core.borrow_mut();
            if core.shut_down {
                return Err(AudioError::PoolShutDown);
            }

            let element = core.acquire(request.priority)?;
            let serial = core.take(element, &request)?;
            let handle = PlaybackHandle { pool: core.id, element, serial };
            (handle, core.name.clone())
        };

        log::debug!(
            "Pool '{}' playing '{}' on {:?} (auto_remove: {})",
            pool_name,
            request.clip.name(),
            handle.element,
            request.auto_remove
        );

        self.scheduler.spawn(Box::new(CompletionWatch::new(
            Rc::downgrade(&self.core),
            handle.element,
            handle.serial,
            request.auto_remove,
            request.on_end.take(),
        )));

        Ok(handle)
    }

    /// Stop the checkout's playback and return its element to the pool
    ///
    /// Cancels the checkout's watch: its `on_end` will not fire.
    ///
    /// # Errors
    /// - `InvalidHandle` for a handle from another pool
    /// - `PoolShutDown` after [`shutdown`](Self::shutdown)
    /// - `DoubleRelease` if the checkout already ended
    pub fn release(&self, handle: PlaybackHandle) -> Result<(), AudioError> {
        let mut core = self.core.borrow_mut();
        core.check_handle(&handle)?;
        core.release_element(handle.element);
        log::debug!("Pool '{}' released {:?}", core.name, handle.element);
        Ok(())
    }

    /// Move a checked-out source
    ///
    /// # Errors
    /// Same as [`release`](Self::release), without consuming the handle.
    pub fn set_placement(&self, handle: &PlaybackHandle, placement: Placement) -> Result<(), AudioError> {
        let mut core = self.core.borrow_mut();
        core.check_handle(handle)?;
        if let Some(element) = core.elements.get_mut(handle.element) {
            element.source.set_placement(placement);
        }
        Ok(())
    }

    /// Whether the handle's checkout is still live
    pub fn is_active(&self, handle: &PlaybackHandle) -> bool {
        self.core.borrow().check_handle(handle).is_ok()
    }

    /// Look at an element's source and state
    pub fn inspect<R>(&self, id: ElementId, f: impl FnOnce(&F::Source, ElementState) -> R) -> Option<R> {
        let core = self.core.borrow();
        core.elements.get(id).map(|element| f(&element.source, element.state))
    }

    /// Change the capacity
    ///
    /// Idle elements over the new limit are destroyed now; active ones are
    /// destroyed as they are released.
    ///
    /// # Errors
    /// `InvalidConfig` if the new size is zero or below `default_size`.
    pub fn resize(&self, max_size: usize) -> Result<(), AudioError> {
        let mut core = self.core.borrow_mut();
        let mut config = core.config.clone();
        config.max_size = max_size;
        config.validate().map_err(AudioError::InvalidConfig)?;
        core.config = config;

        while core.elements.len() > max_size {
            let Some(id) = core.idle.pop() else { break };
            core.destroy_element(id);
        }

        log::info!(
            "Pool '{}' resized to {} ({} over limit still active)",
            core.name,
            max_size,
            core.elements.len().saturating_sub(max_size)
        );
        Ok(())
    }

    /// Set the pool output level and re-level every active source
    pub fn set_mix_level(&self, mix_level: f32) {
        let mut core = self.core.borrow_mut();
        core.config.mix_level = mix_level.clamp(0.0, 1.0);
        core.apply_levels();
    }

    /// Set the mixer gain of the pool's group and re-level every active source
    pub fn set_group_gain(&self, gain: f32) {
        let mut core = self.core.borrow_mut();
        core.group_gain = gain.clamp(0.0, 1.0);
        core.apply_levels();
    }

    /// Stop and free every element, idle or active
    ///
    /// Outstanding watches end silently on their next tick and later
    /// checkouts fail with `PoolShutDown`. Calling this again is a no-op.
    ///
    /// # Errors
    /// `TeardownWhileActive` if active sources had to be stopped; the
    /// teardown itself has completed by then.
    pub fn shutdown(&self) -> Result<(), AudioError> {
        let mut core = self.core.borrow_mut();
        if core.shut_down {
            return Ok(());
        }

        let active = core.teardown();
        log::info!("Pool '{}' shut down ({} active source(s) stopped)", core.name, active);
        if active > 0 {
            return Err(AudioError::TeardownWhileActive { active });
        }
        Ok(())
    }

    /// Identifier of this pool
    pub fn id(&self) -> PoolId {
        self.core.borrow().id
    }

    /// Pool name
    pub fn name(&self) -> String {
        self.core.borrow().name.clone()
    }

    /// Mixer group of the pool's sources
    pub fn group(&self) -> VolumeGroup {
        self.core.borrow().config.group
    }

    /// Pool output level before the group gain
    pub fn mix_level(&self) -> f32 {
        self.core.borrow().config.mix_level
    }

    /// Elements currently checked out
    pub fn active_count(&self) -> usize {
        self.core.borrow().active_count()
    }

    /// Elements waiting for reuse
    pub fn idle_count(&self) -> usize {
        self.core.borrow().idle.len()
    }

    /// Idle plus active elements
    pub fn len(&self) -> usize {
        self.core.borrow().elements.len()
    }

    /// Whether the pool holds no elements at all
    pub fn is_empty(&self) -> bool {
        self.core.borrow().elements.is_empty()
    }

    /// Configured capacity
    pub fn max_size(&self) -> usize {
        self.core.borrow().config.max_size
    }

    /// Whether [`shutdown`](Self::shutdown) has run
    pub fn is_shut_down(&self) -> bool {
        self.core.borrow().shut_down
    }

    /// Lifetime counters
    pub fn stats(&self) -> PoolStats {
        self.core.borrow().stats
    }
}

impl<F: SourceFactory + 'static> fmt::Debug for SourcePool<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let core = self.core.borrow();
        f.debug_struct("SourcePool")
            .field("name", &core.name)
            .field("active", &core.active_count())
            .field("idle", &core.idle.len())
            .field("max_size", &core.config.max_size)
            .finish()
    }
}
