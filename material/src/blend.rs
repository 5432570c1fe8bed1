use crate::{BsdfSample, Material};
use geometry::SurfacePoint;
use math::hcm::Vec3;
use radiometry::color::Color;
use rand::Rng;
use std::sync::Arc;
use texture::Texture;

/// Mixes two materials with a spatially varying ratio read from the red channel of `map`:
/// 0 selects `black`, 1 selects `white`.
pub struct BlendMap {
    black: Arc<dyn Material>,
    white: Arc<dyn Material>,
    map: Arc<dyn Texture>,
}

impl BlendMap {
    pub fn new(black: Arc<dyn Material>, white: Arc<dyn Material>, map: Arc<dyn Texture>) -> Self {
        Self { black, white, map }
    }

    fn ratio(&self, hit: &SurfacePoint) -> f32 {
        self.map.value(hit.uv).r.clamp(0.0, 1.0)
    }
}

impl Material for BlendMap {
    fn bsdf(&self, hit: &SurfacePoint, dir_in: Vec3, dir_out: Vec3) -> Color {
        let ratio = self.ratio(hit);
        self.black.bsdf(hit, dir_in, dir_out) * (1.0 - ratio)
            + self.white.bsdf(hit, dir_in, dir_out) * ratio
    }

    fn pdf(&self, hit: &SurfacePoint, dir_in: Vec3, dir_out: Vec3) -> f32 {
        let ratio = self.ratio(hit);
        self.black.pdf(hit, dir_in, dir_out) * (1.0 - ratio)
            + self.white.pdf(hit, dir_in, dir_out) * ratio
    }

    fn bsdf_sample(&self, hit: &SurfacePoint, dir_out: Vec3) -> BsdfSample {
        let ratio = self.ratio(hit);
        let (chosen, other, w_chosen) = if rand::random::<f32>() < ratio {
            (&self.white, &self.black, ratio)
        } else {
            (&self.black, &self.white, 1.0 - ratio)
        };
        let mut sample = chosen.bsdf_sample(hit, dir_out);
        if sample.is_dead() {
            return sample;
        }
        let dir_in = sample.ray.dir;
        sample.bsdf = sample.bsdf * w_chosen + other.bsdf(hit, dir_in, dir_out) * (1.0 - w_chosen);
        sample.prob = sample.prob * w_chosen + other.pdf(hit, dir_in, dir_out) * (1.0 - w_chosen);
        sample
    }

    fn has_delta_only(&self) -> bool {
        self.black.has_delta_only() && self.white.has_delta_only()
    }

    fn summary(&self) -> String {
        format!(
            "BlendMap{{black = {}, white = {}}}",
            self.black.summary(),
            self.white.summary()
        )
    }
}

/// A fixed convex combination of materials. Weights are normalized to sum to one.
pub struct WeightedSum {
    materials: Vec<Arc<dyn Material>>,
    weights: Vec<f32>,
}

impl WeightedSum {
    /// Returns `None` when the lists differ in length, are empty, or the weights do not have a
    /// positive sum.
    pub fn new(materials: Vec<Arc<dyn Material>>, weights: Vec<f32>) -> Option<Self> {
        let total: f32 = weights.iter().sum();
        if materials.is_empty() || materials.len() != weights.len() || !(total > 0.0) {
            return None;
        }
        let weights = weights.into_iter().map(|w| w / total).collect();
        Some(Self { materials, weights })
    }

    pub fn weights(&self) -> &[f32] {
        &self.weights
    }
}

impl Material for WeightedSum {
    fn bsdf(&self, hit: &SurfacePoint, dir_in: Vec3, dir_out: Vec3) -> Color {
        self.materials
            .iter()
            .zip(self.weights.iter())
            .map(|(m, w)| m.bsdf(hit, dir_in, dir_out) * *w)
            .sum()
    }

    /// Components are picked uniformly by `bsdf_sample()`, so the density is their plain mean.
    fn pdf(&self, hit: &SurfacePoint, dir_in: Vec3, dir_out: Vec3) -> f32 {
        let sum: f32 = self.materials.iter().map(|m| m.pdf(hit, dir_in, dir_out)).sum();
        sum / self.materials.len() as f32
    }

    fn bsdf_sample(&self, hit: &SurfacePoint, dir_out: Vec3) -> BsdfSample {
        let chosen = rand::thread_rng().gen_range(0..self.materials.len());
        let mut sample = self.materials[chosen].bsdf_sample(hit, dir_out);
        if sample.is_dead() {
            return sample;
        }
        let dir_in = sample.ray.dir;
        sample.bsdf = sample.bsdf * self.weights[chosen];
        for (i, (m, w)) in self.materials.iter().zip(self.weights.iter()).enumerate() {
            if i != chosen {
                sample.bsdf += m.bsdf(hit, dir_in, dir_out) * *w;
                sample.prob += m.pdf(hit, dir_in, dir_out);
            }
        }
        sample.prob /= self.materials.len() as f32;
        sample
    }

    fn has_delta_only(&self) -> bool {
        self.materials.iter().all(|m| m.has_delta_only())
    }

    fn summary(&self) -> String {
        let parts: Vec<String> = self
            .materials
            .iter()
            .zip(self.weights.iter())
            .map(|(m, w)| format!("{} x {}", w, m.summary()))
            .collect();
        format!("WeightedSum{{{}}}", parts.join(", "))
    }
}
