//! Shadow health: damage in hostile light, regeneration after a cooldown.

use std::time::Duration;

use shadowhunt_tick::Stopwatch;

use crate::config::{HealthConfig, RegenTrigger};

/// What one tick did to a [`Health`] pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthChange {
    Unchanged,
    Damaged,
    Regenerated,
    /// Reached zero this tick. Reported once.
    Depleted,
}

#[derive(Debug, Clone)]
pub struct Health {
    current: f32,
    max: f32,
    cooldown: Stopwatch,
    depleted: bool,
}

impl Health {
    /// A full pool.
    pub fn new(max: f32) -> Self {
        Self::with_current(max, max)
    }

    /// A pool starting at `current`, clamped to `[0, max]`.
    pub fn with_current(max: f32, current: f32) -> Self {
        let current = current.clamp(0.0, max);
        Self {
            current,
            max,
            cooldown: Stopwatch::new(),
            depleted: current <= 0.0,
        }
    }

    pub fn current(&self) -> f32 {
        self.current
    }

    pub fn max(&self) -> f32 {
        self.max
    }

    pub fn is_depleted(&self) -> bool {
        self.depleted
    }

    /// Time accumulated toward the regeneration threshold.
    pub fn cooldown_elapsed(&self) -> Duration {
        self.cooldown.elapsed()
    }

    /// Advances one tick.
    ///
    /// Hostile light always wins: it damages and resets the cooldown even if
    /// regeneration would otherwise be due. A depleted pool never changes
    /// again.
    pub fn tick(
        &mut self,
        config: &HealthConfig,
        in_hostile_light: bool,
        in_shadow_form: bool,
        dt: Duration,
    ) -> HealthChange {
        if self.depleted {
            return HealthChange::Unchanged;
        }
        let secs = dt.as_secs_f32();

        if in_hostile_light {
            self.cooldown.reset();
            self.current = (self.current - config.damage_per_second * secs).max(0.0);
            if self.current <= 0.0 {
                self.depleted = true;
                return HealthChange::Depleted;
            }
            return HealthChange::Damaged;
        }

        let counting = match config.regen_trigger {
            RegenTrigger::OutsideShadowForm => !in_shadow_form,
            RegenTrigger::InsideShadowForm => in_shadow_form,
        };
        if !counting {
            self.cooldown.reset();
            return HealthChange::Unchanged;
        }

        self.cooldown.advance(dt);
        if self.cooldown.has_reached(config.regen_cooldown) && self.current < self.max {
            self.current = (self.current + config.regen_per_second * secs).min(self.max);
            return HealthChange::Regenerated;
        }
        HealthChange::Unchanged
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: Duration = Duration::from_millis(100);

    #[test]
    fn test_damage_is_monotone_and_depletes_once() {
        let cfg = HealthConfig::default();
        let mut health = Health::with_current(20.0, 1.0);
        let mut last = health.current();
        let mut depletions = 0;
        for _ in 0..5 {
            match health.tick(&cfg, true, false, DT) {
                HealthChange::Depleted => depletions += 1,
                HealthChange::Damaged => assert!(health.current() < last),
                HealthChange::Unchanged => {}
                HealthChange::Regenerated => panic!("regenerated in hostile light"),
            }
            last = health.current();
        }
        assert_eq!(depletions, 1);
        assert_eq!(health.current(), 0.0);
        assert!(health.is_depleted());
    }

    #[test]
    fn test_regen_waits_for_cooldown() {
        let cfg = HealthConfig::default();
        let mut health = Health::with_current(20.0, 10.0);
        // 1.9 s of waiting: nothing yet.
        for _ in 0..19 {
            assert_eq!(health.tick(&cfg, false, false, DT), HealthChange::Unchanged);
        }
        assert_eq!(health.tick(&cfg, false, false, DT), HealthChange::Regenerated);
        assert!(health.current() > 10.0);
    }

    #[test]
    fn test_damage_resets_cooldown() {
        let cfg = HealthConfig::default();
        let mut health = Health::with_current(20.0, 10.0);
        for _ in 0..15 {
            health.tick(&cfg, false, false, DT);
        }
        health.tick(&cfg, true, false, DT);
        assert_eq!(health.cooldown_elapsed(), Duration::ZERO);
    }

    #[test]
    fn test_shadow_form_resets_cooldown_by_default() {
        let cfg = HealthConfig::default();
        let mut health = Health::with_current(20.0, 10.0);
        for _ in 0..30 {
            assert_eq!(health.tick(&cfg, false, true, DT), HealthChange::Unchanged);
        }
        assert_eq!(health.current(), 10.0);
    }

    #[test]
    fn test_inside_trigger_heals_only_submerged() {
        let cfg = HealthConfig {
            regen_trigger: RegenTrigger::InsideShadowForm,
            ..HealthConfig::default()
        };
        let mut health = Health::with_current(20.0, 10.0);
        for _ in 0..30 {
            health.tick(&cfg, false, true, DT);
        }
        assert!(health.current() > 10.0);
    }

    #[test]
    fn test_regen_caps_at_max() {
        let cfg = HealthConfig {
            regen_cooldown: Duration::ZERO,
            regen_per_second: 100.0,
            ..HealthConfig::default()
        };
        let mut health = Health::with_current(20.0, 19.0);
        health.tick(&cfg, false, false, DT);
        assert_eq!(health.current(), 20.0);
        assert_eq!(health.tick(&cfg, false, false, DT), HealthChange::Unchanged);
    }
}
