//! Game balance tuning
//!
//! Every number a designer would want to tweak lives here. Sections default
//! independently, so a tuning file only has to list what it changes.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::TuningError;

/// Per-aggression-tier kid profile
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TierProfile {
    /// Walking speed (pixels/s)
    pub speed: f32,
    /// Running-away speed (pixels/s)
    pub flee_speed: f32,
    /// Seconds between steal attempts
    pub steal_cooldown: f32,
    /// Seconds spent at the shelf before a book comes loose
    pub grab_delay: f32,
    /// Carry dwell range before the kid loses interest (seconds)
    pub carry_min: f32,
    pub carry_max: f32,
    /// Player proximity that triggers fleeing (pixels, center to center)
    pub detection_range: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldTuning {
    pub width: f32,
    pub height: f32,
    /// Survive this long to win (seconds)
    pub target_time: f32,
    pub max_chaos: f32,
    /// Kid entry points (top-left of the spawned body)
    pub spawn_points: Vec<(f32, f32)>,
}

impl Default for WorldTuning {
    fn default() -> Self {
        Self {
            width: 1600.0,
            height: 1040.0,
            target_time: 30.0 * 60.0,
            max_chaos: 100.0,
            spawn_points: vec![(50.0, 520.0), (1550.0, 520.0), (800.0, 50.0), (800.0, 990.0)],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerTuning {
    pub start: (f32, f32),
    /// Meters per second
    pub move_speed: f32,
    /// Meters
    pub pickup_radius: f32,
    /// Meters from any shelf edge
    pub return_radius: f32,
    pub carry_slots: usize,
    pub max_stamina: f32,
    pub sprint_multiplier: f32,
    /// Stamina per second while sprinting
    pub stamina_drain: f32,
    /// Stamina per second while not sprinting
    pub stamina_regen: f32,
    /// Meters; kids carrying a book this close lose it to the player
    pub repel_radius: f32,
}

impl Default for PlayerTuning {
    fn default() -> Self {
        Self {
            start: (50.0, 300.0),
            move_speed: 3.0,
            pickup_radius: 1.0,
            return_radius: 0.5,
            carry_slots: 5,
            max_stamina: 100.0,
            sprint_multiplier: 1.5,
            stamina_drain: 20.0,
            stamina_regen: 10.0,
            repel_radius: 1.5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NpcTuning {
    /// Indexed by aggression tier - 1
    pub tiers: [TierProfile; 3],
    /// Pixels, center to center
    pub shelf_detection_range: f32,
    /// Fleeing ends past this multiple of the detection range
    pub flee_release_factor: f32,
    /// Drop chance per second while fleeing with a book
    pub panic_drop_rate: f32,
    /// Straight-line flee duration when there is no player to run from
    pub blind_flee_time: f32,
    /// Cooldown after finding a target shelf already empty
    pub empty_shelf_cooldown: f32,
    /// Shelves farther than this on either axis are skipped during movement
    pub collision_check_radius: f32,
    /// "Touching the shelf" margin for grabbing
    pub grab_margin: f32,
    /// Distance from a world edge that makes a wandering kid turn back
    pub edge_margin: f32,
}

impl Default for NpcTuning {
    fn default() -> Self {
        Self {
            tiers: [
                TierProfile {
                    speed: 70.0,
                    flee_speed: 100.0,
                    steal_cooldown: 4.0,
                    grab_delay: 1.0,
                    carry_min: 8.0,
                    carry_max: 10.0,
                    detection_range: 96.0,
                },
                TierProfile {
                    speed: 80.0,
                    flee_speed: 110.0,
                    steal_cooldown: 2.5,
                    grab_delay: 0.5,
                    carry_min: 5.0,
                    carry_max: 8.0,
                    detection_range: 88.0,
                },
                TierProfile {
                    speed: 90.0,
                    flee_speed: 120.0,
                    steal_cooldown: 1.5,
                    grab_delay: 0.2,
                    carry_min: 3.0,
                    carry_max: 5.0,
                    detection_range: 80.0,
                },
            ],
            shelf_detection_range: 128.0,
            flee_release_factor: 1.5,
            panic_drop_rate: 2.0,
            blind_flee_time: 1.0,
            empty_shelf_cooldown: 1.0,
            collision_check_radius: 100.0,
            grab_margin: 5.0,
            edge_margin: 10.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EconomyTuning {
    /// Chaos per contested book per second, by elapsed minutes
    pub early_rate: f32,
    pub mid_rate: f32,
    pub late_rate: f32,
    pub early_until_minutes: f32,
    pub mid_until_minutes: f32,
    /// Chaos per second recovered while nothing is contested
    pub passive_decay: f32,
    /// Chaos relief per player action
    pub pickup_relief: f32,
    pub snatch_relief: f32,
    pub return_relief: f32,
    /// Base XP per player action
    pub pickup_xp: u32,
    pub snatch_xp: u32,
    pub return_xp: u32,
    /// XP boost for the opening of a run
    pub early_xp_seconds: f32,
    pub early_xp_multiplier: f32,
    /// XP to reach level 2, and growth per level after that
    pub base_xp_to_next: u32,
    pub xp_growth: f32,
}

impl Default for EconomyTuning {
    fn default() -> Self {
        Self {
            early_rate: 0.05,
            mid_rate: 0.03,
            late_rate: 0.01,
            early_until_minutes: 3.0,
            mid_until_minutes: 5.0,
            passive_decay: 0.1,
            pickup_relief: 0.5,
            snatch_relief: 0.75,
            return_relief: 1.0,
            pickup_xp: 5,
            snatch_xp: 7,
            return_xp: 10,
            early_xp_seconds: 120.0,
            early_xp_multiplier: 1.5,
            base_xp_to_next: 100,
            xp_growth: 1.45,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WaveTuning {
    /// Kids present when the run starts (tier 1)
    pub initial_kids: usize,
    /// Fixed seconds between admissions
    pub spawn_interval: f32,
    /// (minutes_below, cap) steps, ascending
    pub cap_steps: Vec<(f32, usize)>,
    /// Past the last step the cap grows by this much per whole minute
    pub late_growth_per_minute: usize,
    /// Minutes at which spawned kids become tier 2 and tier 3
    pub tier2_minutes: f32,
    pub tier3_minutes: f32,
    /// How long a cap increase stays on screen
    pub notice_seconds: f32,
}

impl Default for WaveTuning {
    fn default() -> Self {
        Self {
            initial_kids: 2,
            spawn_interval: 15.0,
            cap_steps: vec![(1.0, 3), (3.0, 5), (5.0, 7), (10.0, 10)],
            late_growth_per_minute: 2,
            tier2_minutes: 5.0,
            tier3_minutes: 10.0,
            notice_seconds: 3.0,
        }
    }
}

/// Complete balance table
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub world: WorldTuning,
    pub player: PlayerTuning,
    pub npc: NpcTuning,
    pub economy: EconomyTuning,
    pub waves: WaveTuning,
}

impl Tuning {
    /// Parse and validate a JSON tuning table
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Load a tuning table from disk
    pub fn load(path: &Path) -> Result<Self, TuningError> {
        let json = std::fs::read_to_string(path)?;
        let tuning = Self::from_json(&json)?;
        log::info!("Loaded tuning from {}", path.display());
        Ok(tuning)
    }

    /// Profile for an aggression tier (clamped to 1..=3)
    pub fn tier(&self, tier: u8) -> &TierProfile {
        let idx = tier.clamp(1, 3) as usize - 1;
        &self.npc.tiers[idx]
    }

    /// Reject values the simulation cannot run with
    pub fn validate(&self) -> Result<(), TuningError> {
        let w = &self.world;
        if w.width <= 0.0 || w.height <= 0.0 {
            return Err(TuningError::Invalid("world dimensions must be positive"));
        }
        if w.max_chaos <= 0.0 {
            return Err(TuningError::Invalid("max_chaos must be positive"));
        }
        if w.target_time <= 0.0 {
            return Err(TuningError::Invalid("target_time must be positive"));
        }
        if w.spawn_points.is_empty() {
            return Err(TuningError::Invalid("at least one spawn point is required"));
        }
        if self.player.carry_slots == 0 {
            return Err(TuningError::Invalid("carry_slots must be at least 1"));
        }
        if self.player.max_stamina <= 0.0 {
            return Err(TuningError::Invalid("max_stamina must be positive"));
        }
        for tier in &self.npc.tiers {
            if tier.carry_max < tier.carry_min {
                return Err(TuningError::Invalid("tier carry_max is below carry_min"));
            }
            if tier.detection_range <= 0.0 {
                return Err(TuningError::Invalid("tier detection_range must be positive"));
            }
        }
        if self.waves.spawn_interval <= 0.0 {
            return Err(TuningError::Invalid("spawn_interval must be positive"));
        }
        if self
            .waves
            .cap_steps
            .windows(2)
            .any(|pair| pair[1].0 <= pair[0].0)
        {
            return Err(TuningError::Invalid("cap_steps must be sorted by minutes"));
        }
        if self.economy.xp_growth < 1.0 || self.economy.base_xp_to_next == 0 {
            return Err(TuningError::Invalid("xp curve must be non-decreasing"));
        }
        Ok(())
    }
}
