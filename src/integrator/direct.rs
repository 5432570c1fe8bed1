use geometry::ray::Ray;
use radiometry::color::Color;
use sampling::Sampler2D;
use scene::Scene;

use super::{escaped_radiance, sample_one_light, TraceContext, Tracer};

/// Single-bounce tracer: emission seen directly, plus one direct lighting estimate.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectTracer;

impl Tracer for DirectTracer {
    fn trace(
        &self, scene: &Scene, ray: Ray, sampler: &mut dyn Sampler2D, ctx: &TraceContext,
    ) -> Color {
        let hit = match scene.cast_ray(&ray) {
            None => return escaped_radiance(scene, &ray),
            Some(hit) => hit,
        };
        if hit.shading.is_emissive() {
            return hit.shading.emission();
        }
        if ctx.verbose {
            log::trace!("{:?} hit {} at {}", ctx.pixel, hit.shape.summary(), hit.pos);
        }
        sample_one_light(scene, &hit, ray.dir, sampler, true, ctx)
    }
}
