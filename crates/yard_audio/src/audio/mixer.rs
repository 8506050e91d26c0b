//! Audio mixer system
//!
//! Per-group volume and mute state. Pools ask the mixer for the effective
//! level of their default group and fold it into the volume they hand to
//! every source they check out.

use serde::{Deserialize, Serialize};

/// Volume group categories for independent volume control
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VolumeGroup {
    /// Master volume (affects all sounds)
    Master,
    /// Sound effects (crane motors, container impacts)
    Sfx,
    /// Background music
    Music,
    /// User interface sounds
    Ui,
    /// Ambient yard noise
    Ambient,
}

impl VolumeGroup {
    /// Every group, master first
    pub const ALL: [Self; 5] = [Self::Master, Self::Sfx, Self::Music, Self::Ui, Self::Ambient];

    fn index(self) -> usize {
        match self {
            Self::Master => 0,
            Self::Sfx => 1,
            Self::Music => 2,
            Self::Ui => 3,
            Self::Ambient => 4,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct GroupState {
    volume: f32,
    muted: bool,
}

/// Audio mixer managing volume groups
#[derive(Debug, Clone)]
pub struct MixerSystem {
    groups: [GroupState; 5],
}

impl MixerSystem {
    /// Create a new mixer with every group at full volume
    pub fn new() -> Self {
        Self {
            groups: [GroupState { volume: 1.0, muted: false }; 5],
        }
    }

    /// Create a mixer from configured levels; unlisted groups stay at 1.0
    pub fn from_levels(levels: impl IntoIterator<Item = (VolumeGroup, f32)>) -> Self {
        let mut mixer = Self::new();
        for (group, volume) in levels {
            mixer.set_group_volume(group, volume);
        }
        mixer
    }

    /// Set volume for a specific group (0.0 to 1.0)
    pub fn set_group_volume(&mut self, group: VolumeGroup, volume: f32) {
        self.groups[group.index()].volume = volume.clamp(0.0, 1.0);
    }

    /// Get volume for a specific group
    pub fn group_volume(&self, group: VolumeGroup) -> f32 {
        self.groups[group.index()].volume
    }

    /// Effective volume for a group, folding in master and mute state
    pub fn effective_volume(&self, group: VolumeGroup) -> f32 {
        if self.is_muted(group) || self.is_muted(VolumeGroup::Master) {
            return 0.0;
        }

        if group == VolumeGroup::Master {
            return self.group_volume(VolumeGroup::Master);
        }

        self.group_volume(group) * self.group_volume(VolumeGroup::Master)
    }

    /// Mute a volume group
    pub fn mute_group(&mut self, group: VolumeGroup) {
        self.groups[group.index()].muted = true;
    }

    /// Unmute a volume group
    pub fn unmute_group(&mut self, group: VolumeGroup) {
        self.groups[group.index()].muted = false;
    }

    /// Check if a group is muted
    pub fn is_muted(&self, group: VolumeGroup) -> bool {
        self.groups[group.index()].muted
    }

    /// Toggle mute state for a group
    pub fn toggle_mute(&mut self, group: VolumeGroup) {
        let state = &mut self.groups[group.index()];
        state.muted = !state.muted;
    }
}

impl Default for MixerSystem {
    fn default() -> Self {
        Self::new()
    }
}
