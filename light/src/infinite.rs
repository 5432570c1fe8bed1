use crate::{Light, LightSample};
use geometry::ray::Ray;
use math::hcm::{Point3, Vec3};
use math::prob::Prob;
use radiometry::color::Color;
use sampling::{Distribution2D, Sampler2D};
use std::f32::consts::PI;
use texture::Image;

/// Largest resolution of the luminance raster used for importance sampling.
const MAX_DISTRIBUTION_SIZE: usize = 512;

/// Environment map surrounding the scene, in the latitude-longitude layout: `u` is the azimuth
/// around the world z-axis and `v` the zenith angle measured from +z.
pub struct InfiniteLight {
    texture: Image,
    distribution: Distribution2D,
    /// Azimuth offset, in radians.
    rotation: f32,
    scene_radius: f32,
}

impl InfiniteLight {
    /// The texture is multiplied by `scale`. Sampling follows the luminance of the texture,
    /// downscaled to fit in 512x512.
    pub fn new(texture: Image, scale: f32) -> Self {
        let texture = texture.scaled(scale);
        let small = texture.fit_in_rectangle(MAX_DISTRIBUTION_SIZE, MAX_DISTRIBUTION_SIZE);
        let distribution = Distribution2D::new(small.width(), small.height(), &small.luminance());
        log::debug!(
            "environment {}x{} sampled through a {}x{} distribution",
            texture.width(),
            texture.height(),
            small.width(),
            small.height()
        );
        Self {
            texture,
            distribution,
            rotation: 0.0,
            scene_radius: 1.0,
        }
    }

    pub fn with_rotation(self, rotation: f32) -> Self {
        Self { rotation, ..self }
    }

    fn lookup(&self, u: f32, v: f32) -> Color {
        let w = self.texture.width().saturating_sub(1) as f32;
        let h = self.texture.height().saturating_sub(1) as f32;
        self.texture.at(u * w, v * h)
    }

    /// Texture coordinates of a direction, plus the sine of its zenith angle.
    fn uv_of(&self, dir: Vec3) -> Option<(f32, f32, f32)> {
        let dir = dir.try_hat()?;
        let cos_zenith = dir.z.clamp(-1.0, 1.0);
        let mut azimuth = dir.y.atan2(dir.x) - self.rotation;
        azimuth = azimuth.rem_euclid(2.0 * PI);
        let u = (azimuth / (2.0 * PI)).min(1.0);
        let v = cos_zenith.acos() / PI;
        let sin_zenith = (1.0 - cos_zenith * cos_zenith).max(0.0).sqrt();
        Some((u, v, sin_zenith))
    }
}

impl Light for InfiniteLight {
    fn sample_radiance(&self, dest: Point3, sampler: &mut dyn Sampler2D) -> Option<LightSample> {
        let (e1, e2) = sampler.next_2d();
        let (u, v, pdf) = self.distribution.sample(e1, e2);
        let azimuth = u * 2.0 * PI + self.rotation;
        let zenith = v * PI;
        let (sin_z, cos_z) = zenith.sin_cos();
        // The map-to-sphere Jacobian vanishes at the poles.
        let prob = pdf / (2.0 * PI * PI * sin_z);
        if !(prob > 0.0 && prob.is_finite()) {
            return None;
        }
        let (sin_a, cos_a) = azimuth.sin_cos();
        let dir = Vec3::new(sin_z * cos_a, sin_z * sin_a, cos_z);
        Some(LightSample {
            prob: Prob::Density(prob),
            radiance: self.lookup(u, v),
            origin: dest + dir * (2.0 * self.scene_radius),
        })
    }

    fn pdf(&self, _origin: Point3, dir: Vec3) -> f32 {
        match self.uv_of(dir) {
            Some((u, v, sin_z)) if sin_z > 0.0 => {
                self.distribution.pdf(u, v) / (2.0 * PI * PI * sin_z)
            }
            _ => 0.0,
        }
    }

    fn radiance(&self, r: &Ray) -> Color {
        match self.uv_of(r.dir) {
            Some((u, v, _)) => self.lookup(u, v),
            None => Color::black(),
        }
    }

    /// Mean texel power spread over a disk as large as the scene.
    fn power(&self) -> f32 {
        3.0 * self.texture.channel_mean() * PI * self.scene_radius * self.scene_radius
    }

    fn set_scene_radius(&mut self, radius: f32) {
        self.scene_radius = radius;
    }

    fn summary(&self) -> String {
        format!(
            "InfiniteLight{{{}x{}, rotation = {}}}",
            self.texture.width(),
            self.texture.height(),
            self.rotation
        )
    }
}
