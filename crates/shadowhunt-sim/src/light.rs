//! Light sources.
//!
//! The simulation never asks how a light looks, only whether a point falls
//! inside its volume and whether it hurts.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use shadowhunt_protocol::LampId;

/// A region of space that can light an actor.
///
/// Implementations answer the geometric question only. Obstruction is the
/// [`Occluder`](crate::Occluder)'s job.
pub trait LightSource: Send + Sync {
    /// Is `point` inside the lit volume?
    fn contains(&self, point: Vec3) -> bool;

    /// Does standing in this light damage a Shadow?
    fn is_hostile(&self) -> bool;

    /// Where obstruction rays start.
    fn position(&self) -> Vec3;
}

/// An omnidirectional light.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SphereLight {
    pub position: Vec3,
    pub radius: f32,
    #[serde(default)]
    pub hostile: bool,
}

impl LightSource for SphereLight {
    fn contains(&self, point: Vec3) -> bool {
        self.position.distance_squared(point) <= self.radius * self.radius
    }

    fn is_hostile(&self) -> bool {
        self.hostile
    }

    fn position(&self) -> Vec3 {
        self.position
    }
}

/// A cone of light. Flashlight beams are spotlights rebuilt every tick from
/// the Guardian's position and aim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpotLight {
    pub position: Vec3,
    pub direction: Vec3,
    pub range: f32,
    pub half_angle_deg: f32,
    #[serde(default)]
    pub hostile: bool,
}

impl LightSource for SpotLight {
    fn contains(&self, point: Vec3) -> bool {
        let to_point = point - self.position;
        let distance = to_point.length();
        if distance > self.range {
            return false;
        }
        if distance <= f32::EPSILON {
            return true;
        }
        let axis = self.direction.normalize_or_zero();
        if axis == Vec3::ZERO {
            return false;
        }
        let cos_angle = to_point.dot(axis) / distance;
        cos_angle >= self.half_angle_deg.to_radians().cos()
    }

    fn is_hostile(&self) -> bool {
        self.hostile
    }

    fn position(&self) -> Vec3 {
        self.position
    }
}

/// A level light anyone standing next to it can switch.
///
/// Lamps are always hostile while on; an unlit lamp contains nothing.
#[derive(Debug, Clone, PartialEq)]
pub struct Lamp {
    id: LampId,
    light: SphereLight,
    on: bool,
    interaction_range: f32,
}

impl Lamp {
    pub fn new(id: LampId, position: Vec3, radius: f32, interaction_range: f32, on: bool) -> Self {
        Self {
            id,
            light: SphereLight {
                position,
                radius,
                hostile: true,
            },
            on,
            interaction_range,
        }
    }

    pub fn id(&self) -> LampId {
        self.id
    }

    pub fn is_on(&self) -> bool {
        self.on
    }

    /// Flips the lamp and returns the new state.
    pub fn toggle(&mut self) -> bool {
        self.on = !self.on;
        self.on
    }

    /// Is `point` close enough to reach the switch?
    pub fn within_reach(&self, point: Vec3) -> bool {
        self.light.position.distance(point) <= self.interaction_range
    }
}

impl LightSource for Lamp {
    fn contains(&self, point: Vec3) -> bool {
        self.on && self.light.contains(point)
    }

    fn is_hostile(&self) -> bool {
        true
    }

    fn position(&self) -> Vec3 {
        self.light.position
    }
}
