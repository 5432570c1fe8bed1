use geometry::{bvh::BBox, ray::Ray, SurfacePoint};
use material::Shading;
use math::hcm::{Point3, Vec3};
use sampling::Sampler2D;
use std::ops::Deref;

mod mesh;
mod sphere;

pub use mesh::{Mesh, MeshError, Triangle};
pub use sphere::Sphere;

/// Geometric primitive that can be placed in a scene.
///
/// Shapes are immutable once built and shared between render threads.
pub trait Shape: Send + Sync {
    /// Nearest intersection with `r` inside its extent `(0, r.t_max)`.
    fn intersect(&self, r: &Ray) -> Option<ShapeHitPoint>;

    fn bbox(&self) -> BBox;

    fn area(&self) -> f32;

    /// Picks a point uniformly on the surface. `None` if the shape does not support position
    /// sampling.
    fn sample_position(&self, sampler: &mut dyn Sampler2D) -> Option<PositionSample>;

    /// Density, w.r.t. the solid angle seen from `r.origin`, of reaching the surface point hit by
    /// `r` through `sample_position()`. Zero when the ray misses, when the surface is seen from
    /// its back side, or when position sampling is unsupported.
    fn sample_pdf(&self, r: &Ray) -> f32;

    /// Appearance of the surface. Emissive shadings make the shape an area light.
    fn shading(&self) -> &Shading;

    fn summary(&self) -> String;
}

/// A point picked on a surface by `Shape::sample_position()`.
#[derive(Debug, Clone, Copy)]
pub struct PositionSample {
    pub pos: Point3,
    pub normal: Vec3,
    /// Density w.r.t. surface area.
    pub pdf_area: f32,
}

/// Intersection record handed to integrators: the surface geometry plus what was hit and how it
/// looks. Borrowed from the shape, so it lives no longer than the scene.
#[derive(Clone, Copy)]
pub struct ShapeHitPoint<'a> {
    pub surface: SurfacePoint,
    pub shading: &'a Shading,
    pub shape: &'a dyn Shape,
}

impl<'a> ShapeHitPoint<'a> {
    pub fn new(surface: SurfacePoint, shading: &'a Shading, shape: &'a dyn Shape) -> Self {
        Self {
            surface,
            shading,
            shape,
        }
    }

    /// True if the hit lies on `shape` (identity, not equality).
    pub fn is_on(&self, shape: &dyn Shape) -> bool {
        same_shape(self.shape, shape)
    }
}

impl<'a> Deref for ShapeHitPoint<'a> {
    type Target = SurfacePoint;
    fn deref(&self) -> &SurfacePoint {
        &self.surface
    }
}

impl<'a> std::fmt::Debug for ShapeHitPoint<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShapeHitPoint")
            .field("surface", &self.surface)
            .field("shape", &self.shape.summary())
            .finish()
    }
}

/// Compares two shapes by address. Vtable pointers are ignored since they may differ between
/// codegen units for the same type.
pub fn same_shape(a: &dyn Shape, b: &dyn Shape) -> bool {
    std::ptr::eq(a as *const dyn Shape as *const u8, b as *const dyn Shape as *const u8)
}

/// Nearest hit among `shapes` by linear scan.
pub fn intersect_all<'a, S>(shapes: &'a [S], r: &Ray) -> Option<ShapeHitPoint<'a>>
where
    S: Deref<Target = dyn Shape>,
{
    let mut r = *r;
    let mut nearest = None;
    for shape in shapes.iter() {
        if let Some(hit) = shape.intersect(&r) {
            r.t_max = hit.ray_t;
            nearest = Some(hit);
        }
    }
    nearest
}
