/// Bounding-volume hierarchy over the shapes of a scene.
pub mod bvh;

pub use bvh::{make_bvh, BuildError, BvhNode};
