use math::hcm::{Point3, Vec3};

/// Geometric record of a ray-surface intersection, independent of what was hit.
///
/// `normal` is the geometric normal of the surface; `shading_normal` may differ from it when
/// the surface interpolates vertex normals. Both are unit-length. `uv` are the surface
/// parametric coordinates (zero for surfaces without a parameterization) and `ray_t` is the ray
/// parameter of the hit. The partial derivatives are zero when the surface does not provide them.
#[derive(Debug, Clone, Copy)]
pub struct SurfacePoint {
    pub pos: Point3,
    pub normal: Vec3,
    pub shading_normal: Vec3,
    pub uv: (f32, f32),
    pub ray_t: f32,
    pub dpdu: Vec3,
    pub dpdv: Vec3,
    pub dndu: Vec3,
    pub dndv: Vec3,
}

impl SurfacePoint {
    /// A hit with a single normal and no parameterization.
    pub fn new(pos: Point3, normal: Vec3, ray_t: f32) -> Self {
        Self {
            pos,
            normal,
            shading_normal: normal,
            uv: (0.0, 0.0),
            ray_t,
            dpdu: Vec3::ZERO,
            dpdv: Vec3::ZERO,
            dndu: Vec3::ZERO,
            dndv: Vec3::ZERO,
        }
    }

    pub fn with_shading_normal(self, shading_normal: Vec3) -> Self {
        Self {
            shading_normal,
            ..self
        }
    }

    pub fn with_uv(self, uv: (f32, f32)) -> Self {
        Self { uv, ..self }
    }

    /// Cosine between `dir` and the geometric normal.
    pub fn cos_geometric(&self, dir: Vec3) -> f32 {
        dir.dot(self.normal)
    }

    /// Cosine between `dir` and the shading normal.
    pub fn cos_shading(&self, dir: Vec3) -> f32 {
        dir.dot(self.shading_normal)
    }

    /// True if `a` and `b` lie on the same side of the geometric surface. Zero counts as the
    /// negative side.
    pub fn same_side(&self, a: Vec3, b: Vec3) -> bool {
        (self.cos_geometric(a) > 0.0) == (self.cos_geometric(b) > 0.0)
    }
}
