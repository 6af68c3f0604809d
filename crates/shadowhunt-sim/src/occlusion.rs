//! Line-of-sight obstruction.

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Answers "is anything in the way between these two points?"
pub trait Occluder: Send + Sync {
    /// `true` if blocking geometry intersects the segment before it
    /// reaches `to`.
    fn is_occluded(&self, from: Vec3, to: Vec3) -> bool;
}

/// Axis-aligned box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn new(a: Vec3, b: Vec3) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Inside or on the surface.
    pub fn contains(&self, point: Vec3) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }

    /// Slab test against the segment `from → to`.
    ///
    /// Returns the segment parameter in `[0, 1]` where the segment first
    /// touches the box, or `None` if it misses.
    pub fn segment_entry(&self, from: Vec3, to: Vec3) -> Option<f32> {
        let delta = to - from;
        let mut t_enter = 0.0f32;
        let mut t_exit = 1.0f32;

        for axis in 0..3 {
            let origin = from[axis];
            let step = delta[axis];
            let (lo, hi) = (self.min[axis], self.max[axis]);

            if step.abs() <= f32::EPSILON {
                if origin < lo || origin > hi {
                    return None;
                }
                continue;
            }

            let inv = 1.0 / step;
            let (mut t0, mut t1) = ((lo - origin) * inv, (hi - origin) * inv);
            if t0 > t1 {
                std::mem::swap(&mut t0, &mut t1);
            }
            t_enter = t_enter.max(t0);
            t_exit = t_exit.min(t1);
            if t_enter > t_exit {
                return None;
            }
        }

        Some(t_enter)
    }
}

/// A static set of boxes.
#[derive(Debug, Clone, Default)]
pub struct BlockingGeometry {
    boxes: Vec<Aabb>,
}

impl BlockingGeometry {
    /// Hits this close to the target are the target's own surface.
    const SURFACE_EPSILON: f32 = 1e-4;

    pub fn new(boxes: Vec<Aabb>) -> Self {
        Self { boxes }
    }

    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }
}

impl Occluder for BlockingGeometry {
    /// A box the segment starts in, or on, never blocks it. A lamp mounted
    /// flush against a wall still lights the room.
    fn is_occluded(&self, from: Vec3, to: Vec3) -> bool {
        self.boxes.iter().filter(|b| !b.contains(from)).any(|b| {
            b.segment_entry(from, to)
                .is_some_and(|t| t < 1.0 - Self::SURFACE_EPSILON)
        })
    }
}
