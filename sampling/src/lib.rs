/// Piecewise-constant 1D and 2D distributions built from histograms.
pub mod distribution;
/// 2D sample generators consumed by lights and the render scheduler.
pub mod sampler;
pub mod warp;

pub use distribution::{Distribution1D, Distribution2D};
pub use sampler::{Sampler2D, StratifiedSampler2D, UniformSampler2D};
