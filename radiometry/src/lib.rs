/// RGB spectrum type used for radiance, reflectance and throughput.
pub mod color;

pub use color::Color;
