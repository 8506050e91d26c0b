//! # Audio Configuration
//!
//! Configuration for the two playback pools and the mixer. Every field has
//! a serde default, so a config file only needs to name what it changes:
//!
//! ```toml
//! master_volume = 0.8
//!
//! [local]
//! max_size = 24
//! policy = "Steal"
//! ```

use serde::{Deserialize, Serialize};

use crate::audio::backend::SlotId;
use crate::audio::mixer::VolumeGroup;

// Re-export the file-backed config machinery for convenience
pub use crate::config::{Config, ConfigError};

/// What a pool does when a checkout finds no idle element and no room to grow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CapacityPolicy {
    /// Fail the checkout with `CapacityExceeded`
    #[default]
    Reject,
    /// Take over the lowest-priority (then oldest) active element, if its
    /// priority does not exceed the request's
    Steal,
}

/// # Pool Configuration
///
/// Sizing and output level for one playback pool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Elements created up front
    pub default_size: usize,
    /// Hard cap on idle + active elements
    pub max_size: usize,
    /// Pool output level (0.0 to 1.0), scaled further by the mixer group
    pub mix_level: f32,
    /// Mixer group every source of this pool reports to
    pub group: VolumeGroup,
    /// Behavior when the pool is exhausted
    pub policy: CapacityPolicy,
    /// Slot idle sources are parked at
    pub holding_area: SlotId,
}

impl PoolConfig {
    /// Defaults for non-positional playback (UI, stingers)
    pub fn global() -> Self {
        Self {
            default_size: 4,
            max_size: 10,
            mix_level: 1.0,
            group: VolumeGroup::Ui,
            policy: CapacityPolicy::Reject,
            holding_area: SlotId::HOLDING,
        }
    }

    /// Defaults for positional playback in the yard
    pub fn local() -> Self {
        Self {
            default_size: 10,
            max_size: 30,
            mix_level: 1.0,
            group: VolumeGroup::Sfx,
            policy: CapacityPolicy::Reject,
            holding_area: SlotId::HOLDING,
        }
    }

    /// Set pre-allocated and maximum sizes
    pub fn with_sizes(mut self, default_size: usize, max_size: usize) -> Self {
        self.default_size = default_size;
        self.max_size = max_size;
        self
    }

    /// Set the pool output level
    pub fn with_mix_level(mut self, mix_level: f32) -> Self {
        self.mix_level = mix_level;
        self
    }

    /// Set the mixer group
    pub fn with_group(mut self, group: VolumeGroup) -> Self {
        self.group = group;
        self
    }

    /// Set the exhaustion policy
    pub fn with_policy(mut self, policy: CapacityPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Set the holding area slot
    pub fn with_holding_area(mut self, holding_area: SlotId) -> Self {
        self.holding_area = holding_area;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_size == 0 {
            return Err("Pool max_size must be at least 1".to_string());
        }

        if self.default_size > self.max_size {
            return Err(format!(
                "Pool default_size ({}) cannot exceed max_size ({})",
                self.default_size, self.max_size
            ));
        }

        if !(0.0..=1.0).contains(&self.mix_level) {
            return Err(format!("Pool mix_level must be within 0.0..=1.0, got {}", self.mix_level));
        }

        Ok(())
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self::local()
    }
}

/// Per-group volume levels (master lives on [`AudioConfig`])
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupVolumes {
    /// Sound effects
    pub sfx: f32,
    /// Music
    pub music: f32,
    /// User interface
    pub ui: f32,
    /// Ambient yard noise
    pub ambient: f32,
}

impl Default for GroupVolumes {
    fn default() -> Self {
        Self {
            sfx: 1.0,
            music: 1.0,
            ui: 1.0,
            ambient: 0.7,
        }
    }
}

/// # Audio Configuration
///
/// Top-level configuration of the audio service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Master volume (0.0 to 1.0)
    pub master_volume: f32,
    /// Group volume levels
    pub groups: GroupVolumes,
    /// Pool for non-positional playback
    pub global: PoolConfig,
    /// Pool for positional and slot-attached playback
    pub local: PoolConfig,
}

impl AudioConfig {
    /// Mixer levels for every group, master included
    pub fn group_levels(&self) -> [(VolumeGroup, f32); 5] {
        [
            (VolumeGroup::Master, self.master_volume),
            (VolumeGroup::Sfx, self.groups.sfx),
            (VolumeGroup::Music, self.groups.music),
            (VolumeGroup::Ui, self.groups.ui),
            (VolumeGroup::Ambient, self.groups.ambient),
        ]
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        for (group, level) in self.group_levels() {
            if !(0.0..=1.0).contains(&level) {
                return Err(format!("Volume for {group:?} must be within 0.0..=1.0, got {level}"));
            }
        }

        self.global.validate().map_err(|e| format!("global pool: {e}"))?;
        self.local.validate().map_err(|e| format!("local pool: {e}"))?;
        Ok(())
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            master_volume: 1.0,
            groups: GroupVolumes::default(),
            global: PoolConfig::global(),
            local: PoolConfig::local(),
        }
    }
}

impl Config for AudioConfig {}
