use geometry::{ray::Ray, SurfacePoint};
use math::hcm::Vec3;
use radiometry::color::Color;
use std::sync::Arc;

mod blend;
pub mod factory;
mod fourier;
mod layered;
mod matte;
mod microfacet;
mod mirror;

pub use blend::{BlendMap, WeightedSum};
pub use factory::{MaterialDesc, MaterialError};
pub use fourier::FourierMaterial;
pub use layered::Layered;
pub use matte::Matte;
pub use microfacet::Microfacet;
pub use mirror::Mirror;

/// Surface scattering model.
///
/// Direction conventions shared by every method:
/// - `dir_in` points from the surface point towards the light;
/// - `dir_out` is the travelling direction of the viewing ray, i.e. it points from the eye (or
///   the previous vertex of the path) towards the surface point.
///
/// Neither direction needs to be normalized. Numerical dead ends (grazing angles, impossible
/// refractions) yield black values and zero densities, never NaN.
pub trait Material: Send + Sync {
    /// Value of the scattering function for the pair of directions.
    fn bsdf(&self, hit: &SurfacePoint, dir_in: Vec3, dir_out: Vec3) -> Color;

    /// Density, w.r.t. solid angle, with which `bsdf_sample()` produces `dir_in` given `dir_out`.
    fn pdf(&self, hit: &SurfacePoint, dir_in: Vec3, dir_out: Vec3) -> f32;

    /// Importance-samples an incident direction. The returned ray starts exactly at the hit
    /// point and has a unit-length direction.
    fn bsdf_sample(&self, hit: &SurfacePoint, dir_out: Vec3) -> BsdfSample;

    /// True if `bsdf()` is identically zero, i.e. the material only scatters along delta
    /// directions and light sampling cannot contribute.
    fn has_delta_only(&self) -> bool {
        false
    }

    fn summary(&self) -> String;
}

/// Outcome of `Material::bsdf_sample()`.
///
/// A zero `prob` marks a rejected sample; callers terminate the path. For `specular` samples
/// `prob` is a discrete probability and `bsdf` already includes the delta normalisation.
#[derive(Debug, Clone, Copy)]
pub struct BsdfSample {
    pub bsdf: Color,
    pub ray: Ray,
    pub prob: f32,
    pub specular: bool,
}

impl BsdfSample {
    pub fn dead(hit: &SurfacePoint) -> Self {
        Self {
            bsdf: Color::black(),
            ray: Ray::new(hit.pos, Vec3::ZERO),
            prob: 0.0,
            specular: false,
        }
    }

    pub fn is_dead(&self) -> bool {
        !(self.prob > 0.0)
    }
}

/// Appearance attached to a shape or a mesh: how the surface scatters, and the radiance it emits
/// when it is a light source.
#[derive(Clone)]
pub struct Shading {
    pub material: Arc<dyn Material>,
    pub glow: Option<Color>,
}

impl Shading {
    pub fn new(material: Arc<dyn Material>) -> Self {
        Self {
            material,
            glow: None,
        }
    }

    pub fn glowing(material: Arc<dyn Material>, glow: Color) -> Self {
        Self {
            material,
            glow: Some(glow).filter(|c| !c.is_black()),
        }
    }

    pub fn emission(&self) -> Color {
        self.glow.unwrap_or_else(Color::black)
    }

    pub fn is_emissive(&self) -> bool {
        self.glow.is_some()
    }
}

/// Light-blue opaque matte, given to shapes added without an explicit appearance.
impl Default for Shading {
    fn default() -> Self {
        Self::new(Arc::new(Matte::solid(Color::new(0.3, 0.6, 1.0), 0.0, false)))
    }
}

impl std::fmt::Debug for Shading {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Shading")
            .field("material", &self.material.summary())
            .field("glow", &self.glow)
            .finish()
    }
}

/// Power heuristic with exponent 2 for combining two sampling strategies.
pub fn power_heuristic(p: f32, other: f32) -> f32 {
    let (p2, o2) = (p * p, other * other);
    if p2 + o2 > 0.0 {
        p2 / (p2 + o2)
    } else {
        0.0
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_power_heuristic() {
        assert_eq!(power_heuristic(1.0, 0.0), 1.0);
        assert_eq!(power_heuristic(0.0, 0.0), 0.0);
        let w = power_heuristic(1.0, 3.0) + power_heuristic(3.0, 1.0);
        assert!((w - 1.0).abs() < 1e-6, "{}", w);
    }

    #[test]
    fn test_black_glow_is_not_emissive() {
        let shading = Shading::glowing(Arc::new(Mirror::new()), Color::black());
        assert!(!shading.is_emissive());
        assert!(Shading::default().emission().is_black());
    }
}
