//! Guardian flashlight and its battery.

use std::time::Duration;

use glam::Vec3;
use tracing::debug;

use crate::config::FlashlightConfig;
use crate::light::SpotLight;

/// A charge pool clamped to `[0, max]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Battery {
    charge: f32,
    max: f32,
}

impl Battery {
    pub fn new(max: f32) -> Self {
        Self { charge: max, max }
    }

    pub fn with_charge(max: f32, charge: f32) -> Self {
        Self {
            charge: charge.clamp(0.0, max),
            max,
        }
    }

    pub fn charge(&self) -> f32 {
        self.charge
    }

    pub fn max(&self) -> f32 {
        self.max
    }

    pub fn missing(&self) -> f32 {
        self.max - self.charge
    }

    pub fn is_empty(&self) -> bool {
        self.charge <= 0.0
    }

    pub fn is_full(&self) -> bool {
        self.charge >= self.max
    }

    /// Charge as a fraction of max, `0.0` for a zero-capacity battery.
    pub fn fraction(&self) -> f32 {
        if self.max > 0.0 {
            self.charge / self.max
        } else {
            0.0
        }
    }

    /// Removes up to `amount`. Returns `true` if this call emptied it.
    pub fn drain(&mut self, amount: f32) -> bool {
        if self.is_empty() {
            return false;
        }
        self.charge = (self.charge - amount.max(0.0)).max(0.0);
        self.is_empty()
    }

    /// Adds `amount`, clamped to max. Negative amounts do nothing.
    pub fn recharge(&mut self, amount: f32) {
        self.charge = (self.charge + amount.max(0.0)).min(self.max);
    }

    pub fn full_recharge(&mut self) {
        self.charge = self.max;
    }
}

/// A Guardian's hostile light source.
///
/// Can't be switched on with an empty battery, and switches itself off the
/// tick the battery runs out.
#[derive(Debug, Clone)]
pub struct Flashlight {
    on: bool,
    battery: Battery,
    drain_per_second: f32,
    drain_enabled: bool,
    beam_range: f32,
    beam_half_angle_deg: f32,
}

impl Flashlight {
    pub fn new(config: &FlashlightConfig) -> Self {
        Self {
            on: config.starts_on && config.max_charge > 0.0,
            battery: Battery::new(config.max_charge),
            drain_per_second: config.drain_per_second,
            drain_enabled: config.drain_enabled,
            beam_range: config.beam_range,
            beam_half_angle_deg: config.beam_half_angle_deg,
        }
    }

    pub fn is_on(&self) -> bool {
        self.on
    }

    pub fn battery(&self) -> &Battery {
        &self.battery
    }

    pub fn battery_mut(&mut self) -> &mut Battery {
        &mut self.battery
    }

    /// Flips the light. Returns `false` (and stays off) when asked to turn
    /// on with an empty battery.
    pub fn try_toggle(&mut self) -> bool {
        if self.on {
            self.on = false;
            return true;
        }
        if self.battery.is_empty() {
            debug!("flashlight toggle refused, battery empty");
            return false;
        }
        self.on = true;
        true
    }

    pub fn switch_off(&mut self) {
        self.on = false;
    }

    /// Drains for one tick. Returns `true` if the battery died this tick,
    /// which also forces the light off.
    pub fn tick(&mut self, dt: Duration) -> bool {
        if !self.on || !self.drain_enabled {
            return false;
        }
        if self.battery.drain(self.drain_per_second * dt.as_secs_f32()) {
            self.on = false;
            return true;
        }
        false
    }

    /// The beam as a light source, or `None` while off.
    pub fn beam(&self, origin: Vec3, aim: Vec3) -> Option<SpotLight> {
        self.on.then(|| SpotLight {
            position: origin,
            direction: aim,
            range: self.beam_range,
            half_angle_deg: self.beam_half_angle_deg,
            hostile: true,
        })
    }
}
