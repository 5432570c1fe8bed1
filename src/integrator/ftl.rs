use geometry::ray::Ray;
use radiometry::color::Color;
use sampling::Sampler2D;
use scene::Scene;

use super::path::{DEFAULT_MIN_DEPTH, DEFAULT_TERMINATION_PROB};
use super::{TraceContext, Tracer, BOUNCE_RAY_OFFSET};

/// Time-resolved tracer: light travels one scene unit per second, and the radiance of a path is
/// credited to the frames during which it reaches the camera.
///
/// Follows BSDF samples only, so emitters are found by hitting them.
#[derive(Debug, Clone, Copy)]
pub struct FtlTracer {
    min_depth: usize,
    termination_prob: f32,
    pub n_frames: usize,
    pub fps: f32,
    /// Path length, in seconds of light travel, at which the first frame starts.
    pub time_offset: f32,
    /// How long emitters stay lit.
    pub light_duration: f32,
    /// Ignores the camera-to-first-hit segment, as if the sensor sat on the surfaces.
    pub skip_first_segment: bool,
}

impl FtlTracer {
    /// Zero `min_depth` and `termination_prob` select the path tracer defaults.
    pub fn new(min_depth: usize, termination_prob: f32, n_frames: usize, fps: f32) -> Self {
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
            n_frames: n_frames.max(1),
            fps,
            time_offset: 0.0,
            light_duration: 1.0,
            skip_first_segment: false,
        }
    }

    /// Frames `[start, end)` lit by an emitter reached after travelling `path_length`.
    fn frame_range(&self, path_length: f32) -> (usize, usize) {
        let start = ((path_length - self.time_offset) * self.fps).floor().max(0.0);
        let end = ((path_length - self.time_offset + self.light_duration) * self.fps)
            .floor()
            .max(0.0);
        let start = (start as usize).min(self.n_frames);
        // A negative duration lights nothing.
        let end = (end as usize).min(self.n_frames).max(start);
        (start, end)
    }
}

impl Tracer for FtlTracer {
    /// Sum over all frames.
    fn trace(
        &self, scene: &Scene, ray: Ray, sampler: &mut dyn Sampler2D, ctx: &TraceContext,
    ) -> Color {
        let mut frames = vec![Color::black(); self.n_frames];
        self.trace_frames(scene, ray, sampler, ctx, &mut frames);
        frames.into_iter().fold(Color::black(), |acc, c| acc + c)
    }

    fn frame_count(&self) -> usize {
        self.n_frames
    }

    fn trace_frames(
        &self, scene: &Scene, mut ray: Ray, sampler: &mut dyn Sampler2D, ctx: &TraceContext,
        frames: &mut [Color],
    ) {
        let mut beta = Color::ONE;
        let mut path_length = 0.0;
        for depth in 0.. {
            let hit = match scene.cast_ray(&ray) {
                None => break,
                Some(hit) => hit,
            };
            if depth > 0 || !self.skip_first_segment {
                path_length += hit.pos.distance_to(ray.origin);
            }
            if let Some(glow) = hit.shading.glow {
                let (start, end) = self.frame_range(path_length);
                if ctx.verbose {
                    log::trace!(
                        "{:?} emitter after {} units lights frames {}..{}",
                        ctx.pixel,
                        path_length,
                        start,
                        end
                    );
                }
                for frame in frames[start..end].iter_mut() {
                    *frame += beta * glow;
                }
            }

            if depth >= self.min_depth {
                let (roulette, _) = sampler.next_2d();
                if roulette <= self.termination_prob {
                    break;
                }
                beta = beta / (1.0 - self.termination_prob);
            }

            let sample = hit.shading.material.bsdf_sample(&hit, ray.dir);
            if sample.is_dead() {
                break;
            }
            let cos = hit.cos_shading(sample.ray.dir).abs();
            beta = beta * sample.bsdf * (cos / sample.prob);
            if beta.is_black() || !beta.is_finite() {
                break;
            }
            ray = sample.ray.nudged(BOUNCE_RAY_OFFSET);
        }
    }
}
