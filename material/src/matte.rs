use crate::{BsdfSample, Material};
use geometry::{ray::Ray, SurfacePoint};
use math::{
    float::Float,
    hcm::{basis_around, vector_from_basis, Vec3},
};
use radiometry::color::Color;
use sampling::warp::cos_sample_hemisphere;
use std::{f32::consts::FRAC_1_PI, sync::Arc};
use texture::{Solid, Texture};

/// Diffuse surface following the Oren-Nayar model. A zero roughness gives the Lambertian BRDF.
///
/// A transparent matte scatters into both hemispheres with equal weight, and each hemisphere
/// carries half of the energy.
pub struct Matte {
    albedo: Arc<dyn Texture>,
    roughness: f32,
    a: f32,
    b: f32,
    transparent: bool,
}

impl Matte {
    pub fn textured(albedo: Arc<dyn Texture>, roughness: f32, transparent: bool) -> Self {
        let sigma2 = roughness * roughness;
        Self {
            albedo,
            roughness,
            a: 1.0 - 0.5 * sigma2 / (sigma2 + 0.33),
            b: 0.45 * sigma2 / (sigma2 + 0.09),
            transparent,
        }
    }

    pub fn solid(albedo: Color, roughness: f32, transparent: bool) -> Self {
        Self::textured(Arc::new(Solid(albedo)), roughness, transparent)
    }

    fn oren_nayar(&self, hit: &SurfacePoint, dir_in: Vec3, dir_out: Vec3) -> f32 {
        let normal = hit.shading_normal;
        // Flip the viewing side so that both cosines are measured on the hemisphere of dir_in.
        let (mut cos_in, mut cos_out) = (dir_in.dot(normal), dir_out.dot(normal));
        if cos_in < 0.0 {
            cos_in = -cos_in;
        } else {
            cos_out = -cos_out;
        }
        let (sin_alpha, tan_beta) = if cos_in > cos_out {
            (1.0f32.cathetus(cos_out), 1.0f32.cathetus(cos_in) / cos_in)
        } else {
            (1.0f32.cathetus(cos_in), 1.0f32.cathetus(cos_out) / cos_out)
        };
        if !tan_beta.is_finite() {
            return self.a;
        }

        let (bx, by) = basis_around(normal);
        let azimuth = |v: Vec3| {
            let p = v.projected_onto_plane(normal).try_hat().unwrap_or(Vec3::ZERO);
            (p.dot(bx), p.dot(by))
        };
        let (cos_az_in, sin_az_in) = azimuth(dir_in);
        let (cos_az_out, sin_az_out) = azimuth(dir_out);
        let cos_delta = cos_az_in * cos_az_out + sin_az_in * sin_az_out;
        self.a + self.b * cos_delta.max(0.0) * sin_alpha * tan_beta
    }
}

impl Material for Matte {
    fn bsdf(&self, hit: &SurfacePoint, dir_in: Vec3, dir_out: Vec3) -> Color {
        let (dir_in, dir_out) = match (dir_in.try_hat(), dir_out.try_hat()) {
            (Some(i), Some(o)) => (i, o),
            _ => return Color::black(),
        };
        let mul = if self.transparent {
            0.5
        } else if hit.same_side(dir_in, dir_out) {
            return Color::black();
        } else {
            1.0
        };
        let color = self.albedo.value(hit.uv);
        if self.roughness == 0.0 {
            color * (mul * FRAC_1_PI)
        } else {
            color * (mul * self.oren_nayar(hit, dir_in, dir_out) * FRAC_1_PI)
        }
    }

    fn pdf(&self, hit: &SurfacePoint, dir_in: Vec3, dir_out: Vec3) -> f32 {
        let cos_in = hit.cos_geometric(dir_in.try_hat().unwrap_or(Vec3::ZERO));
        if self.transparent {
            return cos_in.abs() * FRAC_1_PI * 0.5;
        }
        if hit.same_side(dir_in, dir_out) {
            return 0.0;
        }
        cos_in.abs() * FRAC_1_PI
    }

    fn bsdf_sample(&self, hit: &SurfacePoint, dir_out: Vec3) -> BsdfSample {
        let rnd2 = (rand::random::<f32>(), rand::random::<f32>());
        let mut local = cos_sample_hemisphere(rnd2).try_hat().unwrap_or(Vec3::Z);
        let mut prob = local.z * FRAC_1_PI;
        if self.transparent {
            prob *= 0.5;
            if rand::random::<f32>() < 0.5 {
                local.z = -local.z;
            }
        } else if hit.cos_geometric(dir_out) > 0.0 {
            local.z = -local.z;
        }
        let (bx, by) = basis_around(hit.normal);
        let dir_in = vector_from_basis(local, (bx, by, hit.normal));
        BsdfSample {
            bsdf: self.bsdf(hit, dir_in, dir_out),
            ray: Ray::new(hit.pos, dir_in),
            prob,
            specular: false,
        }
    }

    fn summary(&self) -> String {
        format!(
            "Matte{{roughness = {}, transparent = {}}}",
            self.roughness, self.transparent
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use math::hcm::Point3;

    #[test]
    fn test_lambertian_value() {
        let hit = SurfacePoint::new(Point3::ORIGIN, Vec3::Z, 1.0);
        let matte = Matte::solid(Color::gray(0.5), 0.0, false);
        let f = matte.bsdf(&hit, Vec3::new(0.3, 0.1, 1.0), Vec3::new(0.2, 0.4, -1.0));
        assert!((f.g - 0.5 * FRAC_1_PI).abs() < 1e-6, "{}", f);
        // Same side: no transmission for an opaque surface.
        let f = matte.bsdf(&hit, Vec3::new(0.3, 0.1, 1.0), Vec3::new(0.2, 0.4, 1.0));
        assert!(f.is_black());
    }

    #[test]
    fn test_sample_on_viewer_side() {
        let hit = SurfacePoint::new(Point3::ORIGIN, Vec3::Z, 1.0);
        let matte = Matte::solid(Color::white(), 0.5, false);
        for _ in 0..100 {
            let s = matte.bsdf_sample(&hit, Vec3::new(0.0, 1.0, -1.0));
            assert!(s.ray.dir.z >= 0.0, "{}", s.ray.dir);
            let s = matte.bsdf_sample(&hit, Vec3::new(0.0, 1.0, 1.0));
            assert!(s.ray.dir.z <= 0.0, "{}", s.ray.dir);
        }
    }
}
