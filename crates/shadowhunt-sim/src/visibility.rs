//! Light exposure.

use glam::Vec3;
use tracing::trace;

use crate::light::LightSource;
use crate::occlusion::Occluder;

/// What the lights are doing to one actor this tick.
///
/// `in_hostile_light` implies `in_light`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Exposure {
    pub in_light: bool,
    pub in_hostile_light: bool,
}

/// Evaluates exposure against a set of lights and an optional occluder.
///
/// Without an occluder nothing is ever obstructed.
pub struct VisibilityChecker<'a> {
    occluder: Option<&'a dyn Occluder>,
}

impl<'a> VisibilityChecker<'a> {
    pub fn new(occluder: Option<&'a dyn Occluder>) -> Self {
        Self { occluder }
    }

    /// Does `light` reach `point` unobstructed?
    pub fn is_lit_by(&self, light: &dyn LightSource, point: Vec3) -> bool {
        if !light.contains(point) {
            return false;
        }
        match self.occluder {
            Some(occluder) => !occluder.is_occluded(light.position(), point),
            None => true,
        }
    }

    /// Folds every light into one [`Exposure`].
    ///
    /// Stops at the first hostile hit; nothing after it can change the result.
    pub fn evaluate<'l>(
        &self,
        lights: impl IntoIterator<Item = &'l dyn LightSource>,
        point: Vec3,
    ) -> Exposure {
        let mut exposure = Exposure::default();
        for light in lights {
            if !self.is_lit_by(light, point) {
                continue;
            }
            exposure.in_light = true;
            if light.is_hostile() {
                exposure.in_hostile_light = true;
                break;
            }
        }
        trace!(?point, ?exposure, "exposure evaluated");
        exposure
    }
}

/// An edge in `in_light`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExposureEdge {
    Entered,
    Exited,
}

/// Remembers last tick's exposure so entering and leaving light fire once.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExposureTracker {
    lit: bool,
}

impl ExposureTracker {
    pub fn update(&mut self, exposure: Exposure) -> Option<ExposureEdge> {
        let edge = match (self.lit, exposure.in_light) {
            (false, true) => Some(ExposureEdge::Entered),
            (true, false) => Some(ExposureEdge::Exited),
            _ => None,
        };
        self.lit = exposure.in_light;
        edge
    }

    pub fn is_lit(&self) -> bool {
        self.lit
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::light::SphereLight;
    use crate::occlusion::{Aabb, BlockingGeometry};

    fn sphere(x: f32, hostile: bool) -> SphereLight {
        SphereLight {
            position: Vec3::new(x, 0.0, 0.0),
            radius: 5.0,
            hostile,
        }
    }

    #[test]
    fn test_no_lights_is_dark() {
        let checker = VisibilityChecker::new(None);
        let exposure = checker.evaluate(std::iter::empty(), Vec3::ZERO);
        assert_eq!(exposure, Exposure::default());
    }

    #[test]
    fn test_friendly_light_is_not_hostile() {
        let light = sphere(0.0, false);
        let checker = VisibilityChecker::new(None);
        let exposure = checker.evaluate([&light as &dyn LightSource], Vec3::ZERO);
        assert!(exposure.in_light);
        assert!(!exposure.in_hostile_light);
    }

    #[test]
    fn test_any_hostile_light_marks_hostile() {
        let friendly = sphere(0.0, false);
        let hostile = sphere(1.0, true);
        let checker = VisibilityChecker::new(None);
        let exposure = checker.evaluate(
            [&friendly as &dyn LightSource, &hostile as &dyn LightSource],
            Vec3::ZERO,
        );
        assert!(exposure.in_light && exposure.in_hostile_light);
    }

    #[test]
    fn test_occluded_light_does_not_count() {
        let light = sphere(-4.0, true);
        let walls = BlockingGeometry::new(vec![Aabb::new(
            Vec3::new(-2.0, -1.0, -1.0),
            Vec3::new(-1.0, 1.0, 1.0),
        )]);
        let checker = VisibilityChecker::new(Some(&walls));
        let exposure = checker.evaluate([&light as &dyn LightSource], Vec3::ZERO);
        assert!(!exposure.in_light);
    }

    #[test]
    fn test_hostile_implies_lit_across_a_grid() {
        use crate::light::SpotLight;

        let walls = BlockingGeometry::new(vec![
            Aabb::new(Vec3::new(-1.0, -1.0, -4.0), Vec3::new(1.0, 2.0, -3.0)),
            Aabb::new(Vec3::new(2.0, -1.0, 1.0), Vec3::new(3.0, 2.0, 4.0)),
        ]);
        let ball = |x: f32, z: f32, radius: f32, hostile: bool| SphereLight {
            position: Vec3::new(x, 0.0, z),
            radius,
            hostile,
        };
        let spheres = [
            ball(-4.0, -4.0, 3.0, true),
            ball(0.0, -6.0, 4.0, false),
            ball(4.0, 4.0, 2.5, true),
        ];
        let spots = [
            SpotLight {
                position: Vec3::new(0.0, 0.0, 0.0),
                direction: Vec3::X,
                range: 6.0,
                half_angle_deg: 30.0,
                hostile: true,
            },
            SpotLight {
                position: Vec3::new(-5.0, 0.0, 5.0),
                direction: Vec3::new(1.0, 0.0, -1.0),
                range: 8.0,
                half_angle_deg: 45.0,
                hostile: false,
            },
        ];
        let mut lights: Vec<&dyn LightSource> = Vec::new();
        lights.extend(spheres.iter().map(|l| l as &dyn LightSource));
        lights.extend(spots.iter().map(|l| l as &dyn LightSource));

        let (mut lit, mut hostile, mut dark) = (0, 0, 0);
        for occluder in [None, Some(&walls as &dyn Occluder)] {
            let checker = VisibilityChecker::new(occluder);
            for x in -8..=8 {
                for z in -8..=8 {
                    let point = Vec3::new(x as f32, 0.0, z as f32);
                    let forward = checker.evaluate(lights.iter().copied(), point);
                    let backward = checker.evaluate(lights.iter().rev().copied(), point);
                    for exposure in [forward, backward] {
                        assert!(
                            !exposure.in_hostile_light || exposure.in_light,
                            "hostile but unlit at {point:?}"
                        );
                        let expected_hostile = lights
                            .iter()
                            .any(|l| l.is_hostile() && checker.is_lit_by(*l, point));
                        assert_eq!(exposure.in_hostile_light, expected_hostile, "at {point:?}");
                    }
                    assert_eq!(forward, backward, "order changed the result at {point:?}");
                    match (forward.in_light, forward.in_hostile_light) {
                        (true, true) => hostile += 1,
                        (true, false) => lit += 1,
                        _ => dark += 1,
                    }
                }
            }
        }
        // The grid really covers every case.
        assert!(lit > 0 && hostile > 0 && dark > 0);
    }

    #[test]
    fn test_tracker_fires_edges_once() {
        let mut tracker = ExposureTracker::default();
        let lit = Exposure {
            in_light: true,
            in_hostile_light: false,
        };
        assert_eq!(tracker.update(lit), Some(ExposureEdge::Entered));
        assert_eq!(tracker.update(lit), None);
        assert_eq!(
            tracker.update(Exposure::default()),
            Some(ExposureEdge::Exited)
        );
        assert_eq!(tracker.update(Exposure::default()), None);
    }
}
