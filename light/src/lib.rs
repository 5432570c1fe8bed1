use geometry::ray::Ray;
use math::hcm::{Point3, Vec3};
use math::prob::Prob;
use radiometry::color::Color;
use sampling::Sampler2D;
use std::f32::consts::PI;

mod area;
mod infinite;

pub use area::AreaLight;
pub use infinite::InfiniteLight;

/// Light emitter.
///
/// Directions follow the integrators' convention: `dir` arguments point from the receiving point
/// towards the light.
pub trait Light: Send + Sync {
    /// Picks a point on the light as seen from `dest`, regardless of occlusion. `None` if the
    /// light cannot be sampled from there.
    fn sample_radiance(&self, dest: Point3, sampler: &mut dyn Sampler2D) -> Option<LightSample>;

    /// Density, w.r.t. solid angle at `origin`, with which `sample_radiance()` picks `dir`.
    fn pdf(&self, origin: Point3, dir: Vec3) -> f32;

    /// Radiance carried back along `r` if the ray reaches the light unoccluded.
    fn radiance(&self, r: &Ray) -> Color;

    /// Emitted power, used to pick lights proportionally.
    fn power(&self) -> f32;

    /// True if the light is reached by a single direction from any point, so only light sampling
    /// can find it.
    fn is_delta(&self) -> bool {
        false
    }

    fn as_area(&self) -> Option<&AreaLight> {
        None
    }

    /// Lights placed "at infinity" need to know how far that is.
    fn set_scene_radius(&mut self, _radius: f32) {}

    fn summary(&self) -> String;
}

/// Outcome of `Light::sample_radiance()`.
#[derive(Debug, Clone, Copy)]
pub struct LightSample {
    /// A density w.r.t. solid angle, or a probability mass for delta lights.
    pub prob: Prob,
    pub radiance: Color,
    /// Sampled point on the light. The shadow ray runs from the receiver to this point.
    pub origin: Point3,
}

/// Parallel light arriving from one direction, like sunlight.
#[derive(Debug, Clone)]
pub struct DirectionalLight {
    /// Direction in which the light travels.
    direction: Vec3,
    radiance: Color,
    scene_radius: f32,
}

impl DirectionalLight {
    /// `direction` is the travelling direction of the light. Returns `None` for a zero vector.
    pub fn new(direction: Vec3, radiance: Color) -> Option<Self> {
        Some(Self {
            direction: direction.try_hat()?,
            radiance,
            scene_radius: 1.0,
        })
    }
}

impl Light for DirectionalLight {
    fn sample_radiance(&self, dest: Point3, _sampler: &mut dyn Sampler2D) -> Option<LightSample> {
        // Twice the radius keeps the origin outside the scene bounds from anywhere inside.
        Some(LightSample {
            prob: Prob::Mass(1.0),
            radiance: self.radiance,
            origin: dest - self.direction * (2.0 * self.scene_radius),
        })
    }

    fn pdf(&self, _origin: Point3, _dir: Vec3) -> f32 {
        0.0
    }

    fn radiance(&self, _r: &Ray) -> Color {
        Color::black()
    }

    fn power(&self) -> f32 {
        PI * self.scene_radius * self.scene_radius * self.radiance.power()
    }

    fn is_delta(&self) -> bool {
        true
    }

    fn set_scene_radius(&mut self, radius: f32) {
        self.scene_radius = radius;
    }

    fn summary(&self) -> String {
        format!(
            "DirectionalLight{{direction = {}, radiance = {}}}",
            self.direction, self.radiance
        )
    }
}
