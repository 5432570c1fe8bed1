/// RGB float raster with bilinear lookup, box-filter downscaling and PNG decoding.
pub mod image;

pub use crate::image::{Image, ImageError};

use radiometry::color::Color;

/// A color that varies over the (u, v) parameterization of a surface.
pub trait Texture: Send + Sync {
    fn value(&self, uv: (f32, f32)) -> Color;
}

/// Constant color everywhere.
#[derive(Debug, Clone, Copy)]
pub struct Solid(pub Color);

impl Texture for Solid {
    fn value(&self, _: (f32, f32)) -> Color {
        self.0
    }
}

/// Images wrap around in both u and v.
impl Texture for Image {
    fn value(&self, (u, v): (f32, f32)) -> Color {
        self.at_uv(u, v)
    }
}
