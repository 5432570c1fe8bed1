use crate::{Light, LightSample};
use geometry::ray::Ray;
use math::hcm::{Point3, Vec3};
use math::prob::Prob;
use radiometry::color::Color;
use sampling::Sampler2D;
use shape::Shape;
use std::f32::consts::PI;
use std::sync::Arc;

/// Emissive shape radiating uniformly from its front side.
pub struct AreaLight {
    shape: Arc<dyn Shape>,
    radiance: Color,
}

impl AreaLight {
    pub fn new(shape: Arc<dyn Shape>, radiance: Color) -> Self {
        Self { shape, radiance }
    }

    pub fn shape(&self) -> &dyn Shape {
        self.shape.as_ref()
    }
}

impl Light for AreaLight {
    fn sample_radiance(&self, dest: Point3, sampler: &mut dyn Sampler2D) -> Option<LightSample> {
        let sample = self.shape.sample_position(sampler)?;
        let pdf = self.shape.sample_pdf(&Ray::new(dest, sample.pos - dest));
        (pdf > 0.0).then(|| LightSample {
            prob: Prob::Density(pdf),
            radiance: self.radiance,
            origin: sample.pos,
        })
    }

    fn pdf(&self, origin: Point3, dir: Vec3) -> f32 {
        self.shape.sample_pdf(&Ray::new(origin, dir))
    }

    fn radiance(&self, r: &Ray) -> Color {
        match self.shape.intersect(r) {
            Some(hit) if hit.normal.dot(r.dir) < 0.0 => self.radiance,
            _ => Color::black(),
        }
    }

    fn power(&self) -> f32 {
        self.radiance.power() * PI * self.shape.area()
    }

    fn as_area(&self) -> Option<&AreaLight> {
        Some(self)
    }

    fn summary(&self) -> String {
        format!(
            "AreaLight{{radiance = {}, shape = {}}}",
            self.radiance,
            self.shape.summary()
        )
    }
}
