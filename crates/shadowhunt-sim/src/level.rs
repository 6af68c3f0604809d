//! Runtime level: lights, lamps, blockers, objectives and stations.

use glam::Vec3;
use shadowhunt_protocol::{LampId, Role, StationId};
use tracing::{debug, warn};

use crate::charging::ChargingStation;
use crate::config::{ChargingConfig, LevelConfig};
use crate::light::{Lamp, LightSource};
use crate::objectives::{KeyZone, TriggerZone};
use crate::occlusion::{BlockingGeometry, Occluder};

pub struct Level {
    lights: Vec<Box<dyn LightSource>>,
    lamps: Vec<Lamp>,
    occluder: Option<Box<dyn Occluder>>,
    keys: Vec<KeyZone>,
    exits: Vec<TriggerZone>,
    stations: Vec<ChargingStation>,
    guardian_spawns: Vec<Vec3>,
    shadow_spawns: Vec<Vec3>,
}

impl Level {
    /// An empty level: no lights, nothing blocking, nowhere to escape to.
    pub fn empty() -> Self {
        Self {
            lights: Vec::new(),
            lamps: Vec::new(),
            occluder: None,
            keys: Vec::new(),
            exits: Vec::new(),
            stations: Vec::new(),
            guardian_spawns: Vec::new(),
            shadow_spawns: Vec::new(),
        }
    }

    pub fn from_config(config: &LevelConfig, charging: &ChargingConfig) -> Self {
        let mut level = Self::empty();

        for light in &config.lights {
            level.add_light(light.clone());
        }
        for light in &config.spotlights {
            level.add_light(light.clone());
        }
        level.lamps = config
            .lamps
            .iter()
            .enumerate()
            .map(|(i, lamp)| {
                Lamp::new(
                    LampId(i as u32),
                    lamp.position,
                    lamp.radius,
                    lamp.interaction_range,
                    lamp.on,
                )
            })
            .collect();

        if config.blockers.is_empty() {
            warn!("level has no blocking geometry, lights are never obstructed");
        } else {
            level.occluder = Some(Box::new(BlockingGeometry::new(config.blockers.clone())));
        }

        level.keys = config.keys.iter().copied().map(KeyZone::new).collect();
        level.exits = config.exits.clone();
        level.stations = config
            .stations
            .iter()
            .enumerate()
            .map(|(i, &position)| {
                ChargingStation::new(
                    StationId(i as u32),
                    position,
                    charging.detection_range,
                    charging.charging_time,
                )
            })
            .collect();
        level.guardian_spawns = config.guardian_spawns.clone();
        level.shadow_spawns = config.shadow_spawns.clone();

        debug!(
            lights = level.lights.len(),
            lamps = level.lamps.len(),
            keys = level.keys.len(),
            exits = level.exits.len(),
            stations = level.stations.len(),
            "level built"
        );
        level
    }

    pub fn add_light(&mut self, light: impl LightSource + 'static) {
        self.lights.push(Box::new(light));
    }

    /// Replaces the obstruction collaborator.
    pub fn set_occluder(&mut self, occluder: impl Occluder + 'static) {
        self.occluder = Some(Box::new(occluder));
    }

    pub fn occluder(&self) -> Option<&dyn Occluder> {
        self.occluder.as_deref()
    }

    /// Every static light plus every lamp. Flashlight beams aren't here;
    /// they move with their Guardian.
    pub fn light_sources(&self) -> impl Iterator<Item = &dyn LightSource> + '_ {
        self.lights
            .iter()
            .map(|light| light.as_ref() as &dyn LightSource)
            .chain(self.lamps.iter().map(|lamp| lamp as &dyn LightSource))
    }

    pub fn lamps(&self) -> &[Lamp] {
        &self.lamps
    }

    pub fn lamp_mut(&mut self, id: LampId) -> Option<&mut Lamp> {
        self.lamps.iter_mut().find(|lamp| lamp.id() == id)
    }

    pub fn add_lamp(&mut self, position: Vec3, radius: f32, interaction_range: f32, on: bool) -> LampId {
        let id = LampId(self.lamps.len() as u32);
        self.lamps
            .push(Lamp::new(id, position, radius, interaction_range, on));
        id
    }

    pub fn station(&self, id: StationId) -> Option<&ChargingStation> {
        self.stations.iter().find(|s| s.id() == id)
    }

    pub fn add_station(&mut self, station: ChargingStation) {
        self.stations.push(station);
    }

    pub fn add_key(&mut self, zone: TriggerZone) {
        self.keys.push(KeyZone::new(zone));
    }

    pub fn add_exit(&mut self, zone: TriggerZone) {
        self.exits.push(zone);
    }

    /// Takes the first untaken key touching `point`.
    pub fn take_key_at(&mut self, point: Vec3) -> bool {
        self.keys.iter_mut().any(|key| key.try_take(point))
    }

    pub fn in_exit(&self, point: Vec3) -> bool {
        self.exits.iter().any(|zone| zone.contains(point))
    }

    /// Spawn point for the `index`-th actor of `role`, cycling through the
    /// configured points.
    pub fn spawn_point(&self, role: Role, index: usize) -> Vec3 {
        let points = match role {
            Role::Shadow => &self.shadow_spawns,
            Role::Guardian => &self.guardian_spawns,
        };
        if points.is_empty() {
            Vec3::ZERO
        } else {
            points[index % points.len()]
        }
    }
}

impl Default for Level {
    fn default() -> Self {
        Self::empty()
    }
}
