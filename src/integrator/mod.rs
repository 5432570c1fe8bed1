//! Light transport estimators.
//!
//! All tracers share the one-light direct lighting estimator, which combines light sampling and
//! BSDF sampling with the power heuristic.

mod direct;
mod ftl;
mod path;

pub use direct::DirectTracer;
pub use ftl::FtlTracer;
pub use path::PathTracer;

use geometry::ray::Ray;
use light::Light;
use material::power_heuristic;
use math::hcm::Vec3;
use radiometry::color::Color;
use sampling::Sampler2D;
use scene::Scene;
use shape::ShapeHitPoint;

/// Offset along the direction of a shadow ray, away from the surface it leaves.
pub const SHADOW_RAY_OFFSET: f32 = 1e-5;
/// Offset along the direction of a scattered ray.
pub const BOUNCE_RAY_OFFSET: f32 = 1e-4;
/// Shadow rays are blocked by hits closer than this fraction of the way to the light.
const SHADOW_RAY_EXTENT: f32 = 0.999;

/// Per-sample diagnostics switch, handed down from the scheduler.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TraceContext {
    pub pixel: (usize, usize),
    pub sample: usize,
    /// Logs every bounce at trace level when set.
    pub verbose: bool,
}

impl TraceContext {
    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn at(pixel: (usize, usize), sample: usize, verbose: bool) -> Self {
        Self {
            pixel,
            sample,
            verbose,
        }
    }
}

/// Estimates the radiance carried back along camera rays.
pub trait Tracer: Send + Sync {
    /// Radiance arriving at the origin of `ray`.
    fn trace(&self, scene: &Scene, ray: Ray, sampler: &mut dyn Sampler2D, ctx: &TraceContext)
        -> Color;

    /// Number of time frames the estimate is split into.
    fn frame_count(&self) -> usize {
        1
    }

    /// Writes the estimate of each frame in `frames`, whose length is `frame_count()`.
    fn trace_frames(
        &self, scene: &Scene, ray: Ray, sampler: &mut dyn Sampler2D, ctx: &TraceContext,
        frames: &mut [Color],
    ) {
        frames[0] = self.trace(scene, ray, sampler, ctx);
    }
}

/// Radiance escaping the scene along `ray`, seen by every light but the area lights.
pub fn escaped_radiance(scene: &Scene, ray: &Ray) -> Color {
    scene
        .non_area_lights()
        .fold(Color::black(), |acc, light| acc + light.radiance(ray))
}

/// Picks one light and estimates its direct contribution, divided by the selection probability.
pub fn sample_one_light(
    scene: &Scene, hit: &ShapeHitPoint, dir_out: Vec3, sampler: &mut dyn Sampler2D,
    allow_specular: bool, ctx: &TraceContext,
) -> Color {
    let (e, _) = sampler.next_2d();
    match scene.light_at(e) {
        Some((light, prob)) if prob > 0.0 => {
            estimate_direct(scene, hit, dir_out, light, sampler, allow_specular, ctx) / prob
        }
        _ => Color::black(),
    }
}

/// Direct lighting from `light` at `hit`, with multiple importance sampling.
///
/// `dir_out` is the travelling direction of the ray that found `hit`. Specular BSDF samples are
/// only followed when `allow_specular` is set; tracers that add emission after specular bounces
/// themselves must not count it twice.
pub fn estimate_direct(
    scene: &Scene, hit: &ShapeHitPoint, dir_out: Vec3, light: &dyn Light,
    sampler: &mut dyn Sampler2D, allow_specular: bool, ctx: &TraceContext,
) -> Color {
    let material = hit.shading.material.as_ref();
    let mut radiance = Color::black();

    // Sampling the light.
    if !material.has_delta_only() {
        if let Some(sample) = light.sample_radiance(hit.pos, sampler) {
            let light_prob = sample.prob.value();
            let dir_in = sample.origin - hit.pos;
            let shadow = Ray::new(hit.pos, dir_in)
                .nudged(SHADOW_RAY_OFFSET)
                .with_extent(SHADOW_RAY_EXTENT);
            if light_prob > 0.0 && !sample.radiance.is_black() && scene.cast_ray(&shadow).is_none()
            {
                let bsdf = material.bsdf(hit, dir_in, dir_out);
                let cos = match dir_in.try_hat() {
                    Some(unit) => hit.cos_shading(unit).abs(),
                    None => 0.0,
                };
                let weight = if light.is_delta() {
                    1.0
                } else {
                    power_heuristic(light_prob, material.pdf(hit, dir_in, dir_out))
                };
                let contribution = bsdf * sample.radiance * (cos * weight / light_prob);
                if ctx.verbose {
                    log::trace!(
                        "{:?} light sample {} from {}: {}",
                        ctx.pixel,
                        light.summary(),
                        sample.origin,
                        contribution
                    );
                }
                radiance += contribution;
            }
        }
    }

    // Sampling the BSDF. Delta lights cannot be found this way.
    if !light.is_delta() {
        let sample = material.bsdf_sample(hit, dir_out);
        if !sample.is_dead() && !sample.bsdf.is_black() && (allow_specular || !sample.specular) {
            let ray = sample.ray.nudged(BOUNCE_RAY_OFFSET);
            let incident = match scene.cast_ray(&ray) {
                None => light.radiance(&ray),
                Some(next) => match light.as_area() {
                    Some(area) if next.is_on(area.shape()) => area.radiance(&ray),
                    _ => Color::black(),
                },
            };
            if !incident.is_black() {
                let weight = if sample.specular {
                    1.0
                } else {
                    power_heuristic(sample.prob, light.pdf(hit.pos, ray.dir))
                };
                let cos = hit.cos_shading(ray.dir).abs();
                let contribution = sample.bsdf * incident * (cos * weight / sample.prob);
                if ctx.verbose {
                    log::trace!(
                        "{:?} bsdf sample towards {}: {}",
                        ctx.pixel,
                        ray.dir,
                        contribution
                    );
                }
                radiance += contribution;
            }
        }
    }
    radiance
}
