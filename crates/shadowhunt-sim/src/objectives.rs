//! Key pickups and exit zones.

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// A spherical trigger volume.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TriggerZone {
    pub position: Vec3,
    pub radius: f32,
}

impl TriggerZone {
    pub fn contains(&self, point: Vec3) -> bool {
        self.position.distance_squared(point) <= self.radius * self.radius
    }
}

/// A key lying in the level. Consumed by the first Shadow to touch it.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyZone {
    zone: TriggerZone,
    taken: bool,
}

impl KeyZone {
    pub fn new(zone: TriggerZone) -> Self {
        Self { zone, taken: false }
    }

    pub fn is_taken(&self) -> bool {
        self.taken
    }

    /// Takes the key if it is still here and `point` touches it.
    pub fn try_take(&mut self, point: Vec3) -> bool {
        if self.taken || !self.zone.contains(point) {
            return false;
        }
        self.taken = true;
        true
    }
}
