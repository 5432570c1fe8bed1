use geometry::ray::Ray;
use radiometry::color::Color;
use sampling::Sampler2D;
use scene::Scene;

use super::{escaped_radiance, sample_one_light, TraceContext, Tracer, BOUNCE_RAY_OFFSET};

pub const DEFAULT_MIN_DEPTH: usize = 3;
pub const DEFAULT_TERMINATION_PROB: f32 = 0.3;

/// Unidirectional path tracer with next-event estimation and Russian roulette.
#[derive(Debug, Clone, Copy)]
pub struct PathTracer {
    min_depth: usize,
    termination_prob: f32,
}

impl Default for PathTracer {
    fn default() -> Self {
        Self::new(0, 0.0)
    }
}

impl PathTracer {
    /// Paths survive at least `min_depth` bounces, then stop with probability
    /// `termination_prob` at every bounce. Zeros select the defaults (3 and 0.3).
    pub fn new(min_depth: usize, termination_prob: f32) -> Self {
        Self {
            min_depth: if min_depth == 0 {
                DEFAULT_MIN_DEPTH
            } else {
                min_depth
            },
            termination_prob: if termination_prob > 0.0 {
                termination_prob.min(1.0)
            } else {
                DEFAULT_TERMINATION_PROB
            },
        }
    }

    pub fn min_depth(&self) -> usize {
        self.min_depth
    }

    pub fn termination_prob(&self) -> f32 {
        self.termination_prob
    }
}

impl Tracer for PathTracer {
    fn trace(
        &self, scene: &Scene, mut ray: Ray, sampler: &mut dyn Sampler2D, ctx: &TraceContext,
    ) -> Color {
        let mut radiance = Color::black();
        let mut beta = Color::ONE;
        let mut specular_bounce = false;
        for depth in 0.. {
            let hit = scene.cast_ray(&ray);

            // Emission is only counted here where the direct lighting estimate could not see it.
            if depth == 0 || specular_bounce {
                radiance += beta
                    * match &hit {
                        None => escaped_radiance(scene, &ray),
                        Some(hit) => hit.shading.emission(),
                    };
            }
            let hit = match hit {
                None => break,
                Some(hit) => hit,
            };
            if ctx.verbose {
                log::trace!(
                    "{:?} depth {}: hit {} at {}, beta = {}",
                    ctx.pixel,
                    depth,
                    hit.shape.summary(),
                    hit.pos,
                    beta
                );
            }

            radiance += beta * sample_one_light(scene, &hit, ray.dir, sampler, false, ctx);

            // Terminates the path probabilistically with Russian roulette.
            if depth >= self.min_depth {
                let (roulette, _) = sampler.next_2d();
                if roulette < self.termination_prob {
                    break;
                }
                beta = beta / (1.0 - self.termination_prob);
            }

            // Samples the BSDF to get the new path direction.
            let sample = hit.shading.material.bsdf_sample(&hit, ray.dir);
            if sample.is_dead() {
                break;
            }
            let cos = hit.cos_shading(sample.ray.dir).abs();
            beta = beta * sample.bsdf * (cos / sample.prob);
            if beta.is_black() || !beta.is_finite() {
                break;
            }
            specular_bounce = sample.specular;
            ray = sample.ray.nudged(BOUNCE_RAY_OFFSET);
        }
        radiance
    }
}
