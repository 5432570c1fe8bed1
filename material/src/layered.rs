use crate::{BsdfSample, Material};
use geometry::{fresnel, ray::Ray, SurfacePoint};
use math::hcm::{basis_around, reflect, refract_around, vector_from_basis, Vec3};
use radiometry::color::Color;
use sampling::warp::cos_sample_hemisphere;
use std::{f32::consts::FRAC_1_PI, sync::Arc};

/// A smooth dielectric coating of relative index `n` over a base material.
///
/// Light either reflects specularly off the coating, with probability equal to its Fresnel
/// reflectance, or crosses it twice and scatters off the base in between.
pub struct Layered {
    base: Arc<dyn Material>,
    n: f32,
}

impl Layered {
    pub fn new(base: Arc<dyn Material>, n: f32) -> Self {
        Self { base, n }
    }

    /// Coating reflectance seen by the viewing ray.
    fn coat_reflectance(&self, hit: &SurfacePoint, dir_out: Vec3) -> f32 {
        fresnel::dielectric(self.n, hit.cos_geometric(dir_out).abs())
    }
}

impl Material for Layered {
    fn bsdf(&self, hit: &SurfacePoint, dir_in: Vec3, dir_out: Vec3) -> Color {
        let (dir_in, dir_out) = match (dir_in.try_hat(), dir_out.try_hat()) {
            (Some(i), Some(o)) => (i, o),
            _ => return Color::black(),
        };
        if hit.same_side(dir_in, dir_out) {
            return Color::black();
        }
        // Orient the normal against the viewing ray.
        let mut normal = hit.shading_normal;
        let (mut cos_in, mut cos_out) = (dir_in.dot(normal), dir_out.dot(normal));
        if cos_out > 0.0 {
            normal = -normal;
            cos_in = -cos_in;
            cos_out = -cos_out;
        }
        if cos_out == 0.0 || cos_in <= 0.0 {
            return Color::black();
        }

        let t_in = 1.0 - fresnel::dielectric(self.n, cos_in);
        let t_out = 1.0 - fresnel::dielectric(self.n, -cos_out);
        let refracted = refract_around(dir_out, normal, cos_out, self.n)
            .zip(refract_around(dir_in, normal, cos_in, self.n.recip()));
        match refracted {
            Some((dir_out_t, dir_in_t)) => {
                self.base.bsdf(hit, dir_in_t, dir_out_t) * (t_in * t_out)
            }
            None => Color::black(),
        }
    }

    fn pdf(&self, hit: &SurfacePoint, dir_in: Vec3, dir_out: Vec3) -> f32 {
        if hit.same_side(dir_in, dir_out) {
            return 0.0;
        }
        let cos_in = hit.cos_geometric(dir_in.try_hat().unwrap_or(Vec3::ZERO));
        (1.0 - self.coat_reflectance(hit, dir_out)) * cos_in.abs() * FRAC_1_PI
    }

    fn bsdf_sample(&self, hit: &SurfacePoint, dir_out: Vec3) -> BsdfSample {
        let dir_out = match dir_out.try_hat() {
            Some(d) => d,
            None => return BsdfSample::dead(hit),
        };
        let cos_out = hit.cos_geometric(dir_out);
        let normal = if cos_out > 0.0 { -hit.normal } else { hit.normal };
        let f = self.coat_reflectance(hit, dir_out);

        if rand::random::<f32>() < f {
            let dir_in = reflect(dir_out, hit.shading_normal).hat();
            if hit.same_side(dir_in, dir_out) {
                return BsdfSample::dead(hit);
            }
            let cos_in = hit.cos_shading(dir_in).abs();
            if cos_in == 0.0 {
                return BsdfSample::dead(hit);
            }
            BsdfSample {
                bsdf: Color::gray(f / cos_in),
                ray: Ray::new(hit.pos, dir_in),
                prob: f,
                specular: true,
            }
        } else {
            let rnd2 = (rand::random::<f32>(), rand::random::<f32>());
            let local = cos_sample_hemisphere(rnd2).try_hat().unwrap_or(Vec3::Z);
            let (bx, by) = basis_around(normal);
            let dir_in = vector_from_basis(local, (bx, by, normal));
            BsdfSample {
                bsdf: self.bsdf(hit, dir_in, dir_out),
                ray: Ray::new(hit.pos, dir_in),
                prob: (1.0 - f) * local.z * FRAC_1_PI,
                specular: false,
            }
        }
    }

    fn summary(&self) -> String {
        format!("Layered{{n = {}, base = {}}}", self.n, self.base.summary())
    }
}
