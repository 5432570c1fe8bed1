use crate::{BsdfSample, Material};
use geometry::{fresnel, microfacet::TrowbridgeReitz, ray::Ray, SurfacePoint};
use math::{
    float::Float,
    hcm::{basis_around, reflect, refract_around, vector_from_basis, Vec3},
};
use radiometry::color::Color;

#[derive(Debug, Clone, Copy)]
enum Fresnel {
    Dielectric,
    Conductor { n: Color, k: Color },
    /// Reflects everything; the tint comes from the reflection filter.
    Unit,
}

/// Rough or smooth interface between two media, driven by a Trowbridge-Reitz distribution of
/// microfacet normals. Covers both dielectrics (glass, water) that reflect and refract, and
/// conductors that only reflect.
///
/// A zero roughness gives a perfectly smooth interface: the material becomes delta-only and
/// reflection or refraction is picked with a probability equal to the Fresnel reflectance.
pub struct Microfacet {
    distrib: TrowbridgeReitz,
    transmission: Color,
    reflection: Color,
    /// Relative refractive index, inside over outside. Unused by conductors.
    n: f32,
    fresnel: Fresnel,
}

impl Microfacet {
    /// `transmission` and `reflection` filter the refracted and reflected light; a black filter
    /// disables the corresponding lobe.
    pub fn dielectric(transmission: Color, reflection: Color, n: f32, roughness: f32) -> Self {
        Self {
            distrib: TrowbridgeReitz::from_roughness(roughness),
            transmission,
            reflection,
            n,
            fresnel: Fresnel::Dielectric,
        }
    }

    /// A conductor with complex refractive index `n + ik` per channel.
    pub fn metal(n: Color, k: Color, roughness: f32) -> Self {
        Self {
            distrib: TrowbridgeReitz::from_roughness(roughness),
            transmission: Color::black(),
            reflection: Color::white(),
            n: 0.0,
            fresnel: Fresnel::Conductor { n, k },
        }
    }

    /// A metal reflecting `color` at every angle.
    pub fn tinted_metal(color: Color, roughness: f32) -> Self {
        Self {
            distrib: TrowbridgeReitz::from_roughness(roughness),
            transmission: Color::black(),
            reflection: color,
            n: 1.1,
            fresnel: Fresnel::Unit,
        }
    }

    fn transmits(&self) -> bool {
        !self.transmission.is_black()
    }
    fn reflects(&self) -> bool {
        !self.reflection.is_black()
    }

    fn fresnel(&self, cos_in: f32) -> Color {
        match self.fresnel {
            Fresnel::Dielectric => Color::gray(fresnel::dielectric(self.n, cos_in)),
            Fresnel::Conductor { n, k } => fresnel::conductor(n, k, cos_in),
            Fresnel::Unit => Color::white(),
        }
    }

    /// Probability of choosing the reflection lobe, given the cosine between the microfacet
    /// normal and the direction back to the viewer.
    fn reflection_prob(&self, cos_in_wh: f32) -> f32 {
        if !self.transmits() {
            1.0
        } else if !self.reflects() {
            0.0
        } else {
            fresnel::dielectric(self.n, cos_in_wh)
        }
    }

    /// Microfacet normal that scatters `dir_in` into `dir_out`, oriented so that it lies on the
    /// viewer's side of the macro surface. `None` if no microfacet can connect the two.
    fn half_vector(&self, transmission: bool, cos_out: f32, dir_in: Vec3, dir_out: Vec3) -> Option<Vec3> {
        let wh = if transmission {
            if !self.transmits() {
                return None;
            }
            let eff_n = if cos_out > 0.0 { self.n.recip() } else { self.n };
            (dir_in * eff_n - dir_out).try_hat()?
        } else {
            if !self.reflects() {
                return None;
            }
            (dir_in - dir_out).try_hat()?
        };
        if (dir_out.dot(wh) > 0.0) != (cos_out > 0.0) {
            Some(-wh)
        } else {
            Some(wh)
        }
    }

    fn sample_wh(&self, hit: &SurfacePoint) -> Vec3 {
        if self.distrib.is_smooth() {
            return hit.shading_normal;
        }
        let (cos_theta, phi) = self
            .distrib
            .sample_wh((rand::random::<f32>(), rand::random::<f32>()));
        let sin_theta = 1.0f32.cathetus(cos_theta);
        let local = Vec3::new(sin_theta * phi.cos(), sin_theta * phi.sin(), cos_theta);
        let (bx, by) = basis_around(hit.shading_normal);
        vector_from_basis(local, (bx, by, hit.shading_normal))
    }
}

impl Material for Microfacet {
    fn bsdf(&self, hit: &SurfacePoint, dir_in: Vec3, dir_out: Vec3) -> Color {
        if self.distrib.is_smooth() {
            return Color::black();
        }
        let (dir_in, dir_out) = match (dir_in.try_hat(), dir_out.try_hat()) {
            (Some(i), Some(o)) => (i, o),
            _ => return Color::black(),
        };
        // The view direction travels towards the surface, so both directions on the same side
        // means the light went through it.
        let transmission = hit.same_side(dir_in, dir_out);
        let cos_in = hit.cos_shading(dir_in);
        let cos_out = hit.cos_shading(dir_out);
        if cos_in == 0.0 || cos_out == 0.0 {
            return Color::black();
        }
        let eff_n = if cos_out > 0.0 { self.n.recip() } else { self.n };

        let wh = if transmission {
            if !self.transmits() {
                return Color::black();
            }
            let wh = match (dir_in * eff_n - dir_out).try_hat() {
                Some(wh) => wh,
                None => return Color::black(),
            };
            if (cos_out > 0.0) == (eff_n < 1.0) {
                -wh
            } else {
                wh
            }
        } else {
            if !self.reflects() {
                return Color::black();
            }
            match (dir_in - dir_out).try_hat() {
                Some(wh) => wh,
                None => return Color::black(),
            }
        };
        let cos_out_wh = dir_out.dot(wh);
        let cos_in_wh = dir_in.dot(wh);
        if cos_out_wh == 0.0 {
            return Color::black();
        }
        if transmission && ((cos_in_wh > 0.0) != (cos_out_wh > 0.0)) {
            // No refraction connects these directions.
            return Color::black();
        }

        let d = self.distrib.d(hit.cos_shading(wh));
        let g = self.distrib.g(cos_in);
        let f = self.fresnel(cos_in_wh);

        let value = if transmission {
            let sqrt_denom = cos_out_wh - eff_n * cos_in_wh;
            let denom = sqrt_denom * sqrt_denom * cos_out * cos_in;
            let scale = d * g * (cos_in_wh * cos_out_wh / denom).abs();
            let mut t = Color::ONE - f;
            if cos_in < 0.0 {
                // Light arrives from inside the body.
                t *= self.transmission;
            }
            t * scale
        } else {
            let scale = (d * g / (4.0 * cos_in * cos_out)).abs();
            let mut r = f;
            if cos_in > 0.0 {
                r *= self.reflection;
            }
            r * scale
        };
        if value.is_finite() {
            value
        } else {
            Color::black()
        }
    }

    fn pdf(&self, hit: &SurfacePoint, dir_in: Vec3, dir_out: Vec3) -> f32 {
        if self.distrib.is_smooth() {
            return 0.0;
        }
        let (dir_in, dir_out) = match (dir_in.try_hat(), dir_out.try_hat()) {
            (Some(i), Some(o)) => (i, o),
            _ => return 0.0,
        };
        let transmission = hit.same_side(dir_in, dir_out);
        let cos_out = hit.cos_geometric(dir_out);
        let wh = match self.half_vector(transmission, cos_out, dir_in, dir_out) {
            Some(wh) => wh,
            None => return 0.0,
        };
        let cos_out_wh = dir_out.dot(wh);
        if cos_out_wh == 0.0 {
            return 0.0;
        }
        let cos_in_wh = dir_in.dot(wh);
        // Same lobe choice as `bsdf_sample`, which only knows the viewer side.
        let ref_prob = self.reflection_prob(-cos_out_wh);
        let cos_h = hit.cos_shading(wh);
        let d = self.distrib.d(cos_h);

        let pdf = if transmission {
            if (cos_in_wh > 0.0) != (cos_out_wh > 0.0) {
                return 0.0;
            }
            let eff_n = if cos_out > 0.0 { self.n.recip() } else { self.n };
            let sqrt_denom = cos_out_wh - eff_n * cos_in_wh;
            d * (eff_n * eff_n * cos_in_wh / (sqrt_denom * sqrt_denom)).abs() * (1.0 - ref_prob)
        } else {
            d * cos_h.abs() / (4.0 * cos_out_wh).abs() * ref_prob
        };
        if pdf.is_finite() {
            pdf
        } else {
            0.0
        }
    }

    fn bsdf_sample(&self, hit: &SurfacePoint, dir_out: Vec3) -> BsdfSample {
        let dir_out = match dir_out.try_hat() {
            Some(d) => d,
            None => return BsdfSample::dead(hit),
        };
        let cos_out = hit.cos_geometric(dir_out);
        let mut wh = self.sample_wh(hit);
        let mut cos_out_wh = dir_out.dot(wh);
        if cos_out_wh == 0.0 {
            return BsdfSample::dead(hit);
        }
        if (cos_out_wh > 0.0) != (cos_out > 0.0) {
            // The shading normal put the microfacet on the other side of the macro surface.
            wh = -wh;
            cos_out_wh = -cos_out_wh;
        }

        let ref_prob = self.reflection_prob(-cos_out_wh);
        let reflection = rand::random::<f32>() < ref_prob;
        let dir_in = if reflection {
            let dir_in = reflect(dir_out, wh);
            if (hit.cos_geometric(dir_in) > 0.0) == (cos_out > 0.0) {
                // Reflected through the surface.
                return BsdfSample::dead(hit);
            }
            dir_in
        } else {
            match refract_around(dir_out, wh, cos_out_wh, self.n) {
                Some(dir_in) if (hit.cos_geometric(dir_in) > 0.0) == (cos_out > 0.0) => dir_in,
                // Total internal reflection, or refracted back to the viewer's side.
                _ => return BsdfSample::dead(hit),
            }
        };
        let dir_in = match dir_in.try_hat() {
            Some(d) => d,
            None => return BsdfSample::dead(hit),
        };
        let ray = Ray::new(hit.pos, dir_in);

        if !self.distrib.is_smooth() {
            return BsdfSample {
                bsdf: self.bsdf(hit, dir_in, dir_out),
                ray,
                prob: self.pdf(hit, dir_in, dir_out),
                specular: false,
            };
        }

        let f = self.fresnel(dir_in.dot(wh));
        let cos_in = hit.cos_shading(dir_in).abs();
        if cos_in == 0.0 {
            return BsdfSample::dead(hit);
        }
        let (bsdf, prob) = if reflection {
            let mut bsdf = f / cos_in;
            if cos_out < 0.0 {
                bsdf *= self.reflection;
            }
            (bsdf, ref_prob)
        } else {
            let n = if cos_out < 0.0 { self.n.recip() } else { self.n };
            let mut bsdf = (Color::ONE - f) * (n * n / cos_in);
            if cos_out < 0.0 {
                bsdf *= self.transmission;
            }
            (bsdf, 1.0 - ref_prob)
        };
        BsdfSample {
            bsdf,
            ray,
            prob,
            specular: true,
        }
    }

    fn has_delta_only(&self) -> bool {
        self.distrib.is_smooth()
    }

    fn summary(&self) -> String {
        match self.fresnel {
            Fresnel::Dielectric => format!(
                "Dielectric{{n = {}, alpha2 = {}, transmission = {}, reflection = {}}}",
                self.n, self.distrib.alpha2, self.transmission, self.reflection
            ),
            Fresnel::Conductor { n, k } => format!(
                "Metal{{ior = {} + {}i, alpha2 = {}}}",
                n, k, self.distrib.alpha2
            ),
            Fresnel::Unit => format!(
                "Metal{{color = {}, alpha2 = {}}}",
                self.reflection, self.distrib.alpha2
            ),
        }
    }
}
