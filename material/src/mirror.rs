use crate::{BsdfSample, Material};
use geometry::{ray::Ray, SurfacePoint};
use math::hcm::{reflect, Vec3};
use radiometry::color::Color;

/// Perfect specular reflector about the geometric normal.
pub struct Mirror {
    pub albedo: Color,
}

impl Mirror {
    pub fn new() -> Self {
        Self {
            albedo: Color::white(),
        }
    }
}

impl Default for Mirror {
    fn default() -> Self {
        Self::new()
    }
}

impl Material for Mirror {
    fn bsdf(&self, _: &SurfacePoint, _: Vec3, _: Vec3) -> Color {
        Color::black()
    }

    fn pdf(&self, _: &SurfacePoint, _: Vec3, _: Vec3) -> f32 {
        0.0
    }

    fn bsdf_sample(&self, hit: &SurfacePoint, dir_out: Vec3) -> BsdfSample {
        let dir_out = match dir_out.try_hat() {
            Some(d) => d,
            None => return BsdfSample::dead(hit),
        };
        let dir_in = reflect(dir_out, hit.normal).hat();
        // A mirror reflects all energy, so the delta-normalized value cancels the cosine.
        let cos = dir_in.dot(hit.normal).abs();
        if cos == 0.0 {
            return BsdfSample::dead(hit);
        }
        BsdfSample {
            bsdf: self.albedo / cos,
            ray: Ray::new(hit.pos, dir_in),
            prob: 1.0,
            specular: true,
        }
    }

    fn has_delta_only(&self) -> bool {
        true
    }

    fn summary(&self) -> String {
        format!("Mirror{{albedo = {}}}", self.albedo)
    }
}
