//! Axis-aligned boxes and swept overlap tests.

use glam::DVec3;
use serde::Serialize;

/// Axis-aligned bounding box used for collisions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Aabb {
    /// Minimum corner.
    pub min: DVec3,
    /// Maximum corner.
    pub max: DVec3,
}

/// First contact of a swept box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweepHit {
    /// Fraction of the velocity travelled before contact, in `[0, 1]`.
    pub time: f64,
    /// Unit normal of the face that was hit, pointing back at the mover.
    pub normal: DVec3,
}

impl Aabb {
    /// Create a new AABB ensuring min <= max per axis.
    pub fn new(min: DVec3, max: DVec3) -> Self {
        debug_assert!(min.cmple(max).all());
        Self { min, max }
    }

    /// Unit cube at the origin, the shape of a full block.
    pub fn unit() -> Self {
        Self::new(DVec3::ZERO, DVec3::ONE)
    }

    /// Copy moved by `offset`.
    pub fn translated(&self, offset: DVec3) -> Self {
        Self {
            min: self.min + offset,
            max: self.max + offset,
        }
    }

    /// Smallest box containing both.
    pub fn union(&self, other: &Self) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Space covered while moving by `velocity`.
    pub fn swept_bounds(&self, velocity: DVec3) -> Self {
        self.union(&self.translated(velocity))
    }

    /// Tests intersection with another AABB. Touching faces count.
    pub fn intersects(&self, other: &Self) -> bool {
        self.min.cmple(other.max).all() && self.max.cmpge(other.min).all()
    }

    /// Sweep this box along `velocity` against a static `other`.
    ///
    /// Returns `None` when the boxes never meet within one velocity step, and
    /// also when they already overlap at the start.
    pub fn sweep(&self, velocity: DVec3, other: &Self) -> Option<SweepHit> {
        let mut entry = f64::NEG_INFINITY;
        let mut exit = f64::INFINITY;
        let mut normal = DVec3::ZERO;

        for axis in 0..3 {
            let v = velocity[axis];
            let (lo, hi) = (self.min[axis], self.max[axis]);
            let (other_lo, other_hi) = (other.min[axis], other.max[axis]);

            if v == 0.0 {
                // No motion on this axis: the slabs must already overlap.
                if hi <= other_lo || lo >= other_hi {
                    return None;
                }
                continue;
            }

            let (near, far) = if v > 0.0 {
                ((other_lo - hi) / v, (other_hi - lo) / v)
            } else {
                ((other_hi - lo) / v, (other_lo - hi) / v)
            };
            if near > entry {
                entry = near;
                normal = DVec3::ZERO;
                normal[axis] = -v.signum();
            }
            exit = exit.min(far);
        }

        if entry > exit || entry < 0.0 || entry > 1.0 {
            return None;
        }
        Some(SweepHit {
            time: entry,
            normal,
        })
    }
}
