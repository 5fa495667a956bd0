/// Geometric value types for the spatial index.
///
/// `BoundingBox` is an immutable axis-aligned box in world space; `Ray` is
/// an origin plus direction. All operations are pure and total: degenerate
/// (zero-extent) boxes behave consistently, and the canonical empty box is
/// the identity element of `union`. NaN inputs produce an unspecified but
/// non-crashing result.

use glam::Vec3;

// ===== BOUNDING BOX =====

/// Axis-Aligned Bounding Box in world space.
///
/// Invariant: `min.x <= max.x` (and likewise for y, z), or the box is the
/// canonical empty sentinel [`BoundingBox::EMPTY`] with +inf min / -inf max,
/// which compares and unions consistently but never intersects anything.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    /// Minimum corner (x, y, z)
    pub min: Vec3,
    /// Maximum corner (x, y, z)
    pub max: Vec3,
}

impl BoundingBox {
    /// The canonical empty box: identity element of `union`,
    /// intersects nothing, contains nothing.
    pub const EMPTY: BoundingBox = BoundingBox {
        min: Vec3::INFINITY,
        max: Vec3::NEG_INFINITY,
    };

    /// Create a box from its corners.
    pub const fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Create a box from a center point and full extents.
    pub fn from_center_size(center: Vec3, size: Vec3) -> Self {
        let half = size * 0.5;
        Self {
            min: center - half,
            max: center + half,
        }
    }

    /// Whether this is the empty box (or otherwise inverted on any axis).
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    /// Whether both corners are finite (no NaN, no infinities) and the box
    /// is not inverted. Objects failing this are rejected as degenerate.
    pub fn is_finite(&self) -> bool {
        self.min.is_finite() && self.max.is_finite() && !self.is_empty()
    }

    /// Compute the center point of this box.
    ///
    /// Meaningless for the empty box.
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Full extents (max - min). Zero for the empty box.
    pub fn size(&self) -> Vec3 {
        if self.is_empty() {
            Vec3::ZERO
        } else {
            self.max - self.min
        }
    }

    /// Smallest box covering both `self` and `other` (component-wise
    /// min/max). The empty box is the identity element.
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Smallest box covering `self` and the point `p`.
    pub fn union_point(&self, p: Vec3) -> BoundingBox {
        BoundingBox {
            min: self.min.min(p),
            max: self.max.max(p),
        }
    }

    /// Test if this box fully contains another box.
    pub fn contains(&self, other: &BoundingBox) -> bool {
        self.min.x <= other.min.x && self.max.x >= other.max.x
        && self.min.y <= other.min.y && self.max.y >= other.max.y
        && self.min.z <= other.min.z && self.max.z >= other.max.z
    }

    /// Test if this box contains a point (boundary inclusive).
    pub fn contains_point(&self, p: Vec3) -> bool {
        self.min.x <= p.x && p.x <= self.max.x
        && self.min.y <= p.y && p.y <= self.max.y
        && self.min.z <= p.z && p.z <= self.max.z
    }

    /// Test if this box intersects (overlaps or touches) another box.
    pub fn intersects(&self, other: &BoundingBox) -> bool {
        self.min.x <= other.max.x && self.max.x >= other.min.x
        && self.min.y <= other.max.y && self.max.y >= other.min.y
        && self.min.z <= other.max.z && self.max.z >= other.min.z
    }

    /// Intersect a ray with this box using the slab method.
    ///
    /// Per-axis interval intersection with early reject on an empty
    /// interval. Returns `Some((t_near, t_far))` for a hit, where distances
    /// are in units of the ray's direction length; `t_near` is negative when
    /// the origin is inside the box. Returns `None` when the ray misses or
    /// the box lies entirely behind the origin.
    ///
    /// Zero-extent boxes intersect as infinitely thin slabs. NaN components
    /// in the ray or box yield an unspecified (but non-crashing) result.
    pub fn intersects_ray(&self, ray: &Ray) -> Option<(f32, f32)> {
        let mut t_near = f32::NEG_INFINITY;
        let mut t_far = f32::INFINITY;

        for axis in 0..3 {
            let origin = ray.origin[axis];
            let dir = ray.direction[axis];

            if dir == 0.0 {
                // Parallel to this slab: hit only if the origin lies inside it
                if origin < self.min[axis] || origin > self.max[axis] {
                    return None;
                }
            } else {
                let inv = 1.0 / dir;
                let mut t0 = (self.min[axis] - origin) * inv;
                let mut t1 = (self.max[axis] - origin) * inv;
                if t0 > t1 {
                    std::mem::swap(&mut t0, &mut t1);
                }
                t_near = t_near.max(t0);
                t_far = t_far.min(t1);
                if t_near > t_far {
                    return None;
                }
            }
        }

        if t_far < 0.0 {
            return None;
        }
        Some((t_near, t_far))
    }

    /// Expand to an equal-sided cube over the largest extent, centered on
    /// this box's center.
    ///
    /// Used by the cubify build mode: octants of a cube are equal cubes,
    /// trading some empty volume for uniform traversal cost.
    pub fn cubified(&self) -> BoundingBox {
        if self.is_empty() {
            return *self;
        }
        let half = Vec3::splat(self.size().max_element() * 0.5);
        let center = self.center();
        BoundingBox {
            min: center - half,
            max: center + half,
        }
    }

    /// Compute the box of a specific octant (0-7) of this box, split at
    /// `center`.
    ///
    /// Octant bit layout: bit0 = X, bit1 = Y, bit2 = Z.
    /// - 0 = low, 1 = high for each axis.
    pub fn octant(&self, center: Vec3, octant: u8) -> BoundingBox {
        BoundingBox {
            min: Vec3::new(
                if octant & 1 == 0 { self.min.x } else { center.x },
                if octant & 2 == 0 { self.min.y } else { center.y },
                if octant & 4 == 0 { self.min.z } else { center.z },
            ),
            max: Vec3::new(
                if octant & 1 == 0 { center.x } else { self.max.x },
                if octant & 2 == 0 { center.y } else { self.max.y },
                if octant & 4 == 0 { center.z } else { self.max.z },
            ),
        }
    }

    /// Total surface area. Zero for the empty box.
    pub fn surface_area(&self) -> f32 {
        let s = self.size();
        2.0 * (s.x * s.y + s.y * s.z + s.z * s.x)
    }

    /// Enclosed volume. Zero for the empty box.
    pub fn volume(&self) -> f32 {
        let s = self.size();
        s.x * s.y * s.z
    }
}

/// Determine which octant a point falls into relative to a center.
///
/// Bit layout: bit0 = X, bit1 = Y, bit2 = Z (0 = low, 1 = high).
pub fn octant_of_point(center: Vec3, point: Vec3) -> u8 {
    ((point.x >= center.x) as u8)
        | (((point.y >= center.y) as u8) << 1)
        | (((point.z >= center.z) as u8) << 2)
}

// ===== RAY =====

/// A ray: origin plus direction.
///
/// The direction is not required to be normalized; hit distances returned
/// by queries are expressed in units of the direction's length.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    /// Ray origin
    pub origin: Vec3,
    /// Ray direction (need not be unit length)
    pub direction: Vec3,
}

impl Ray {
    /// Create a new ray.
    pub const fn new(origin: Vec3, direction: Vec3) -> Self {
        Self { origin, direction }
    }

    /// Point at parameter `t` along the ray.
    pub fn point_at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}

#[cfg(test)]
#[path = "bounds_tests.rs"]
mod tests;
