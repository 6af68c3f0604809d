//! Match tuning.
//!
//! Every struct here is `#[serde(default)]`, so a config file only needs to
//! name the values it changes.

use std::time::Duration;

use glam::Vec3;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::light::{SphereLight, SpotLight};
use crate::objectives::TriggerZone;
use crate::occlusion::Aabb;

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

/// When the regeneration cooldown is allowed to accumulate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RegenTrigger {
    /// The cooldown runs while the Shadow is out of shadow form and resets
    /// while it is submerged.
    #[default]
    OutsideShadowForm,
    /// The reverse: a Shadow only heals while hiding in shadow form.
    InsideShadowForm,
}

/// Shadow health tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthConfig {
    pub max_health: f32,
    /// Health lost per second in hostile light.
    pub damage_per_second: f32,
    /// Health gained per second once the cooldown has elapsed.
    pub regen_per_second: f32,
    /// Time without damage before regeneration starts.
    pub regen_cooldown: Duration,
    pub regen_trigger: RegenTrigger,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            max_health: 20.0,
            damage_per_second: 8.0,
            regen_per_second: 2.0,
            regen_cooldown: Duration::from_secs(2),
            regen_trigger: RegenTrigger::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Flashlight
// ---------------------------------------------------------------------------

/// Guardian flashlight and battery tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FlashlightConfig {
    pub max_charge: f32,
    pub drain_per_second: f32,
    /// Global switch. When off the battery never drains.
    pub drain_enabled: bool,
    pub starts_on: bool,
    /// How far the beam reaches.
    pub beam_range: f32,
    /// Half-angle of the beam cone, in degrees.
    pub beam_half_angle_deg: f32,
}

impl Default for FlashlightConfig {
    fn default() -> Self {
        Self {
            max_charge: 240.0,
            drain_per_second: 1.0,
            drain_enabled: true,
            starts_on: false,
            beam_range: 12.0,
            beam_half_angle_deg: 25.0,
        }
    }
}

// ---------------------------------------------------------------------------
// Shadow form
// ---------------------------------------------------------------------------

/// Speeds and jump height handed to the movement collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MovementProfile {
    pub move_speed: f32,
    pub sprint_speed: f32,
    pub jump_height: f32,
}

impl MovementProfile {
    /// The on-foot profile.
    pub const NORMAL: Self = Self {
        move_speed: 2.0,
        sprint_speed: 5.335,
        jump_height: 1.2,
    };

    /// The submerged profile: fast, and no jumping.
    pub const SHADOW: Self = Self {
        move_speed: 7.0,
        sprint_speed: 7.0,
        jump_height: 0.0,
    };
}

impl Default for MovementProfile {
    fn default() -> Self {
        Self::NORMAL
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShadowFormConfig {
    /// Length of both the dive and the emerge transition.
    pub dive_duration: Duration,
    pub normal: MovementProfile,
    pub shadow: MovementProfile,
}

impl Default for ShadowFormConfig {
    fn default() -> Self {
        Self {
            dive_duration: Duration::from_millis(200),
            normal: MovementProfile::NORMAL,
            shadow: MovementProfile::SHADOW,
        }
    }
}

// ---------------------------------------------------------------------------
// Charging stations
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChargingConfig {
    /// How long a full charging session takes, whatever the starting charge.
    pub charging_time: Duration,
    /// Guardians further than this from the station can't charge at it.
    pub detection_range: f32,
}

impl Default for ChargingConfig {
    fn default() -> Self {
        Self {
            charging_time: Duration::from_secs(100),
            detection_range: 3.0,
        }
    }
}

// ---------------------------------------------------------------------------
// Level
// ---------------------------------------------------------------------------

/// A toggleable light placed in the level.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LampConfig {
    pub position: Vec3,
    pub radius: f32,
    #[serde(default = "default_lamp_reach")]
    pub interaction_range: f32,
    #[serde(default = "default_lamp_on")]
    pub on: bool,
}

fn default_lamp_reach() -> f32 {
    1.0
}

fn default_lamp_on() -> bool {
    true
}

/// Static level layout. Lamps and stations get ids in list order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelConfig {
    pub lights: Vec<SphereLight>,
    pub spotlights: Vec<SpotLight>,
    pub lamps: Vec<LampConfig>,
    /// Boxes that block light. Empty means nothing ever blocks.
    pub blockers: Vec<Aabb>,
    pub keys: Vec<TriggerZone>,
    pub exits: Vec<TriggerZone>,
    pub stations: Vec<Vec3>,
    /// Spawn points, used round-robin. Empty means the origin.
    pub guardian_spawns: Vec<Vec3>,
    pub shadow_spawns: Vec<Vec3>,
}

// ---------------------------------------------------------------------------
// MatchConfig
// ---------------------------------------------------------------------------

/// Everything one match needs besides the roster.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    /// Length of the game clock. Running out is a Guardian win.
    pub max_game_time: Duration,
    pub health: HealthConfig,
    pub flashlight: FlashlightConfig,
    pub shadow_form: ShadowFormConfig,
    pub charging: ChargingConfig,
    pub level: LevelConfig,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            max_game_time: Duration::from_secs(300),
            health: HealthConfig::default(),
            flashlight: FlashlightConfig::default(),
            shadow_form: ShadowFormConfig::default(),
            charging: ChargingConfig::default(),
            level: LevelConfig::default(),
        }
    }
}

impl MatchConfig {
    /// Clamps values that would break the simulation. Called by
    /// [`Match::new`](crate::Match::new).
    pub fn validated(mut self) -> Self {
        // Written so NaN fails the check too.
        if !(self.health.max_health.is_finite() && self.health.max_health > 0.0) {
            warn!(
                max_health = self.health.max_health,
                "max_health must be positive, using default"
            );
            self.health.max_health = HealthConfig::default().max_health;
        }
        if !(self.flashlight.max_charge.is_finite() && self.flashlight.max_charge >= 0.0) {
            warn!(
                max_charge = self.flashlight.max_charge,
                "max_charge must be a non-negative number, clamping to 0"
            );
            self.flashlight.max_charge = 0.0;
        }
        self.health.damage_per_second = non_negative(self.health.damage_per_second);
        self.health.regen_per_second = non_negative(self.health.regen_per_second);
        self.flashlight.drain_per_second = non_negative(self.flashlight.drain_per_second);
        self.flashlight.beam_half_angle_deg =
            non_negative(self.flashlight.beam_half_angle_deg).min(180.0);
        self
    }
}

/// NaN and negatives become 0.
fn non_negative(value: f32) -> f32 {
    if value > 0.0 { value } else { 0.0 }
}
