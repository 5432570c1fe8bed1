use crate::{PositionSample, Shape, ShapeHitPoint};
use geometry::{bvh::BBox, ray::Ray, SurfacePoint};
use material::Shading;
use math::hcm::{Point3, Vec3};
use sampling::Sampler2D;
use std::f32::consts::PI;

#[derive(Debug, Clone)]
pub struct Sphere {
    center: Point3,
    radius: f32,
    shading: Shading,
}

impl Sphere {
    /// A sphere with the default shading.
    pub fn new(center: Point3, radius: f32) -> Sphere {
        Sphere {
            center,
            radius,
            shading: Shading::default(),
        }
    }
    pub fn with_shading(self, shading: Shading) -> Self {
        Self { shading, ..self }
    }
    pub fn center(&self) -> Point3 {
        self.center
    }
    pub fn radius(&self) -> f32 {
        self.radius
    }
}

impl Shape for Sphere {
    fn intersect(&self, r: &Ray) -> Option<ShapeHitPoint> {
        // |o + t d - c|^2 = R^2, with o - c = oc:
        // (d.d) t^2 + 2 (d.oc) t + (oc.oc - R^2) = 0
        let oc = r.origin - self.center;
        let a = r.dir.norm_squared();
        let b = 2.0 * r.dir.dot(oc);
        let c = oc.norm_squared() - self.radius * self.radius;
        let discr = b * b - 4.0 * a * c;
        if discr < 0.0 || a == 0.0 {
            return None;
        }
        let sqrt_discr = discr.sqrt();
        let (t0, t1) = ((-b - sqrt_discr) / (2.0 * a), (-b + sqrt_discr) / (2.0 * a));
        let t = r.truncated_t(t0).or_else(|| r.truncated_t(t1))?;
        let pos = r.position_at(t);
        let normal = (pos - self.center).try_hat()?;
        Some(ShapeHitPoint::new(
            SurfacePoint::new(pos, normal, t),
            &self.shading,
            self,
        ))
    }

    fn bbox(&self) -> BBox {
        let diag = Vec3::new(self.radius, self.radius, self.radius);
        BBox::new(self.center - diag, self.center + diag)
    }

    fn area(&self) -> f32 {
        4.0 * PI * self.radius * self.radius
    }

    /// Not supported for spheres.
    fn sample_position(&self, _sampler: &mut dyn Sampler2D) -> Option<PositionSample> {
        None
    }

    /// Not supported for spheres: always zero.
    fn sample_pdf(&self, _r: &Ray) -> f32 {
        0.0
    }

    fn shading(&self) -> &Shading {
        &self.shading
    }

    fn summary(&self) -> String {
        format!(
            "Sphere{{center = {}, radius = {}, glow = {:?}}}",
            self.center, self.radius, self.shading.glow
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use math::hcm::point3;

    #[test]
    fn test_nearest_root() {
        let s = Sphere::new(point3(0.0, 0.0, 5.0), 1.0);
        let hit = s.intersect(&Ray::new(Point3::ORIGIN, Vec3::Z)).unwrap();
        assert!((hit.ray_t - 4.0).abs() < 1e-5);
        assert!((hit.normal - (-Vec3::Z)).norm() < 1e-5);
        assert_eq!(hit.uv, (0.0, 0.0));

        // From inside, the far root is the only positive one.
        let hit = s.intersect(&Ray::new(point3(0.0, 0.0, 5.0), Vec3::Z)).unwrap();
        assert!((hit.ray_t - 1.0).abs() < 1e-5);
        assert!((hit.normal - Vec3::Z).norm() < 1e-5);

        // Behind the origin, or beyond the extent.
        assert!(s.intersect(&Ray::new(Point3::ORIGIN, -Vec3::Z)).is_none());
        assert!(s
            .intersect(&Ray::new(Point3::ORIGIN, Vec3::Z).with_extent(3.5))
            .is_none());
    }

    #[test]
    fn test_unnormalized_direction() {
        let s = Sphere::new(point3(3.0, 0.0, 0.0), 1.0);
        let hit = s.intersect(&Ray::new(Point3::ORIGIN, Vec3::X * 2.0)).unwrap();
        assert!((hit.ray_t - 1.0).abs() < 1e-5);
        assert!(hit.pos.distance_to(point3(2.0, 0.0, 0.0)) < 1e-5);
    }
}
