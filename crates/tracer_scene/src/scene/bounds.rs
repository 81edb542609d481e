//! Axis-aligned bounds and the derived scene dimensions

use crate::foundation::math::{Mat4, Point3, Vec3};

/// Axis-Aligned Bounding Box
///
/// A freshly created box is empty (`min = +inf`, `max = -inf`) and grows as
/// points or other boxes are inserted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// Minimum corner of the bounding box
    pub min: Vec3,
    /// Maximum corner of the bounding box
    pub max: Vec3,
}

impl Aabb {
    /// Create a new AABB from min and max points
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Create an empty AABB
    pub fn empty() -> Self {
        Self {
            min: Vec3::repeat(f32::INFINITY),
            max: Vec3::repeat(f32::NEG_INFINITY),
        }
    }

    /// Whether nothing has been inserted
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    /// Whether the box encloses a non-zero volume
    pub fn is_volume(&self) -> bool {
        self.min.x < self.max.x && self.min.y < self.max.y && self.min.z < self.max.z
    }

    /// Grow to include a point
    pub fn insert_point(&mut self, p: Vec3) {
        self.min = self.min.inf(&p);
        self.max = self.max.sup(&p);
    }

    /// Grow to include another box
    pub fn insert(&mut self, other: &Aabb) {
        if other.is_empty() {
            return;
        }
        self.insert_point(other.min);
        self.insert_point(other.max);
    }

    /// Box enclosing this box after an affine transform
    pub fn transformed(&self, m: &Mat4) -> Aabb {
        let mut out = Aabb::empty();
        if self.is_empty() {
            return out;
        }

        for i in 0..8 {
            let corner = Point3::new(
                if i & 1 == 0 { self.min.x } else { self.max.x },
                if i & 2 == 0 { self.min.y } else { self.max.y },
                if i & 4 == 0 { self.min.z } else { self.max.z },
            );
            out.insert_point(m.transform_point(&corner).coords);
        }
        out
    }

    /// Full size along each axis
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Get the center of the AABB
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Radius of the bounding sphere around [`Aabb::center`]
    pub fn radius(&self) -> f32 {
        self.size().norm() * 0.5
    }
}

impl Default for Aabb {
    fn default() -> Self {
        Self::empty()
    }
}

/// Scene extent summary computed at submit time
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dimensions {
    /// Minimum corner
    pub min: Vec3,
    /// Maximum corner
    pub max: Vec3,
    /// Extent along each axis
    pub size: Vec3,
    /// Center point
    pub center: Vec3,
    /// Bounding sphere radius
    pub radius: f32,
}

impl From<&Aabb> for Dimensions {
    fn from(bbox: &Aabb) -> Self {
        Self {
            min: bbox.min,
            max: bbox.max,
            size: bbox.size(),
            center: bbox.center(),
            radius: bbox.radius(),
        }
    }
}

impl Dimensions {
    /// Bounds these dimensions were derived from
    pub fn bounds(&self) -> Aabb {
        Aabb::new(self.min, self.max)
    }
}
