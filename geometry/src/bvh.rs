use std::fmt::{Debug, Display, Formatter, Result};

use crate::ray::Ray;
use math::{
    float::min_max,
    hcm::{Axis, Point3, Vec3},
};

/// 3D axis-aligned bounding-box type.
/// - Build one from 2 `Point3`s;
/// - Expand it by `b.union()` or `union(b1, b2)`;
/// - Check if it `contains()` a point or `encloses()` another box, or `intersect()`s with a `Ray`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BBox {
    min: Point3,
    max: Point3,
}

impl BBox {
    pub fn empty() -> BBox {
        BBox {
            min: Point3::new(f32::INFINITY, f32::INFINITY, f32::INFINITY),
            max: Point3::new(-f32::INFINITY, -f32::INFINITY, -f32::INFINITY),
        }
    }
    pub fn new(p0: Point3, p1: Point3) -> BBox {
        let (xmin, xmax) = min_max(p0.x, p1.x);
        let (ymin, ymax) = min_max(p0.y, p1.y);
        let (zmin, zmax) = min_max(p0.z, p1.z);
        BBox {
            min: Point3::new(xmin, ymin, zmin),
            max: Point3::new(xmax, ymax, zmax),
        }
    }

    pub fn union(self, p: Point3) -> BBox {
        let mut result = self;
        for i in 0..3 {
            result.min[i] = self.min[i].min(p[i]);
            result.max[i] = self.max[i].max(p[i]);
        }
        result
    }

    pub fn is_empty(&self) -> bool {
        (0..3).any(|i| self.min[i] > self.max[i])
    }

    pub fn midpoint(self) -> Point3 {
        (self.max - self.min) * 0.5 + self.min
    }

    pub fn diag(&self) -> Vec3 {
        self.max - self.min
    }

    /// The axis along which the box is the widest.
    pub fn max_extent_axis(&self) -> Axis {
        self.diag().max_dimension()
    }

    pub fn min(&self) -> Point3 {
        self.min
    }
    pub fn max(&self) -> Point3 {
        self.max
    }

    /// Slab test. The ray parameter interval starts at 0 and ends at `r.t_max`; a hit is reported
    /// iff the three per-axis intervals overlap inside it.
    pub fn intersect(&self, r: &Ray) -> bool {
        let (mut t_min, mut t_max) = (0.0f32, r.t_max);
        for axis in 0..3 {
            let inv_dir = 1.0 / r.dir[axis];
            let t0 = (self.min[axis] - r.origin[axis]) * inv_dir;
            let t1 = (self.max[axis] - r.origin[axis]) * inv_dir;
            let (t0, t1) = min_max(t0, t1);
            // NaN appears when the origin lies on a slab plane of a zero direction component;
            // `max`/`min` ignore it and keep the running interval.
            t_min = t_min.max(t0);
            t_max = t_max.min(t1);
            if t_max < t_min {
                return false;
            }
        }
        true
    }

    pub fn encloses(&self, other: Self) -> bool {
        (0..3).all(|axis| self.min[axis] <= other.min[axis] && self.max[axis] >= other.max[axis])
    }
    pub fn contains(&self, p: Point3) -> bool {
        (0..3).all(|axis| self.min[axis] <= p[axis] && self.max[axis] >= p[axis])
    }
}

impl Display for BBox {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        write!(f, "box[{} -> {}]", self.min, self.max)
    }
}

pub fn union(b0: BBox, b1: BBox) -> BBox {
    b0.union(b1.min).union(b1.max)
}

#[cfg(test)]
mod test {
    use super::*;
    use math::hcm::{point3, vec3};

    #[test]
    fn test_slab() {
        let b = BBox::new(point3(-1.0, -1.0, -1.0), point3(1.0, 1.0, 1.0));
        assert!(b.intersect(&Ray::new(point3(0.0, 0.0, -5.0), Vec3::Z)));
        assert!(!b.intersect(&Ray::new(point3(0.0, 0.0, -5.0), -Vec3::Z)));
        assert!(!b.intersect(&Ray::new(point3(0.0, 0.0, -5.0), Vec3::Z).with_extent(3.0)));
        // Origin inside the box.
        assert!(b.intersect(&Ray::new(Point3::ORIGIN, vec3(0.3, -0.2, 0.9))));
        // Axis-parallel ray passing beside the box.
        assert!(!b.intersect(&Ray::new(point3(2.0, 0.0, -5.0), Vec3::Z)));
    }

    #[test]
    fn test_union_and_extent() {
        let b = union(
            BBox::new(point3(0.0, 0.0, 0.0), point3(1.0, 1.0, 1.0)),
            BBox::empty().union(point3(4.0, -1.0, 0.5)),
        );
        assert_eq!(b.min(), point3(0.0, -1.0, 0.0));
        assert_eq!(b.max(), point3(4.0, 1.0, 1.0));
        assert_eq!(b.max_extent_axis(), Axis::X);
        assert!(BBox::empty().is_empty());
        assert!(b.encloses(BBox::new(point3(1.0, 0.0, 0.0), point3(2.0, 0.5, 0.5))));
    }
}
