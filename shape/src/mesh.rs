use crate::{PositionSample, Shape, ShapeHitPoint};
use geometry::{bvh::BBox, ray::Ray, SurfacePoint};
use material::Shading;
use math::{
    float::barycentric_lerp,
    hcm::{Axis, Mat3, Point3, Vec3},
};
use sampling::Sampler2D;
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum MeshError {
    #[error("index array length {0} is not a multiple of 3")]
    IndexCount(usize),
    #[error("vertex index {index} out of range ({vertex_count} vertices)")]
    IndexOutOfRange { index: usize, vertex_count: usize },
    #[error("{name}: expected {expected} entries (one per vertex) or none, got {actual}")]
    AttributeCount {
        name: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("vertex {0} has a non-finite position")]
    NonFinite(usize),
}

/// Indexed triangle mesh with one shading for all of its faces.
///
/// `normals` and `uvs` are either empty or hold one entry per vertex. Every consecutive triple of
/// `indices` is a triangle whose geometric normal follows the right-hand rule on
/// `(p0 - p2) x (p1 - p2)`.
#[derive(Debug, Clone)]
pub struct Mesh {
    vertices: Vec<Point3>,
    indices: Vec<usize>,
    normals: Vec<Vec3>,
    uvs: Vec<(f32, f32)>,
    shading: Shading,
}

impl Mesh {
    pub fn new(
        vertices: Vec<Point3>, indices: Vec<usize>, normals: Vec<Vec3>, uvs: Vec<(f32, f32)>,
    ) -> Result<Self, MeshError> {
        if indices.len() % 3 != 0 {
            return Err(MeshError::IndexCount(indices.len()));
        }
        if let Some(&index) = indices.iter().find(|&&i| i >= vertices.len()) {
            return Err(MeshError::IndexOutOfRange {
                index,
                vertex_count: vertices.len(),
            });
        }
        if !normals.is_empty() && normals.len() != vertices.len() {
            return Err(MeshError::AttributeCount {
                name: "normals",
                expected: vertices.len(),
                actual: normals.len(),
            });
        }
        if !uvs.is_empty() && uvs.len() != vertices.len() {
            return Err(MeshError::AttributeCount {
                name: "uvs",
                expected: vertices.len(),
                actual: uvs.len(),
            });
        }
        if let Some(i) = vertices.iter().position(|p| !Vec3::from(*p).is_finite()) {
            return Err(MeshError::NonFinite(i));
        }
        Ok(Self {
            vertices,
            indices,
            normals,
            uvs,
            shading: Shading::default(),
        })
    }

    /// Axis-aligned rectangle in the plane `z = center.z`, facing `-z`.
    pub fn plane(center: Point3, width: f32, height: f32) -> Self {
        let (w, h) = (width * 0.5, height * 0.5);
        let (x, y, z) = center.as_triple();
        // 1--3 ^ y
        // |  | |
        // 0--2 +--> x
        Self {
            vertices: vec![
                Point3::new(x - w, y - h, z),
                Point3::new(x - w, y + h, z),
                Point3::new(x + w, y - h, z),
                Point3::new(x + w, y + h, z),
            ],
            indices: vec![0, 1, 2, 1, 3, 2],
            normals: vec![],
            uvs: vec![(0.0, 0.0), (0.0, 1.0), (1.0, 0.0), (1.0, 1.0)],
            shading: Shading::default(),
        }
    }

    /// Axis-aligned cube with outward-facing triangles and a cross-shaped uv unwrapping.
    pub fn cube(center: Point3, width: f32) -> Self {
        let w = width * 0.5;
        //        2----3 6----7
        // ^ y    |    | |    |
        // |      | z- | | z+ |
        // +--> x 0----1 4----5
        let mut vertices: Vec<Point3> = (0..8)
            .map(|i| {
                let dx = if i % 2 == 0 { -w } else { w };
                let dy = if i % 4 < 2 { -w } else { w };
                let dz = if i < 4 { -w } else { w };
                center + Vec3::new(dx, dy, dz)
            })
            .collect();
        // Seams of the unwrapping need their own uvs.
        for &i in [6, 7, 2, 3, 0, 4].iter() {
            vertices.push(vertices[i]);
        }
        let indices = vec![
            5, 9, 8,   8, 4, 5,
            11, 1, 0,  0, 10, 11,
            2, 6, 7,   3, 2, 7,
            3, 7, 5,   5, 1, 3,
            0, 5, 4,   5, 0, 1,
            12, 13, 6, 6, 2, 12,
        ];
        // 8----9
        // |    |
        // 4----5----7----6----13
        // |    |    |    |    |
        // 0----1----3----2----12
        // |    |
        // 10---11
        let u = [0.0, 0.25, 0.75, 0.5, 0.0, 0.25, 0.75, 0.5, 0.0, 0.25, 0.0, 0.25, 1.0, 1.0];
        let v = [0.5, 0.5, 0.5, 0.5, 0.25, 0.25, 0.25, 0.25, 0.0, 0.0, 0.75, 0.75, 0.5, 0.25];
        Self {
            vertices,
            indices,
            normals: vec![],
            uvs: u.iter().copied().zip(v.iter().copied()).collect(),
            shading: Shading::default(),
        }
    }

    pub fn with_shading(self, shading: Shading) -> Self {
        Self { shading, ..self }
    }

    pub fn translate(&mut self, delta: Vec3) {
        for p in self.vertices.iter_mut() {
            *p += delta;
        }
    }

    /// Scales per axis around `center`.
    pub fn scale(&mut self, scale: Vec3, center: Point3) {
        for p in self.vertices.iter_mut() {
            let offset = *p - center;
            *p = center + Vec3::new(offset.x * scale.x, offset.y * scale.y, offset.z * scale.z);
        }
        // Normals transform with the inverse scale.
        for n in self.normals.iter_mut() {
            let scaled = Vec3::new(n.x / scale.x, n.y / scale.y, n.z / scale.z);
            *n = scaled.try_hat().unwrap_or(*n);
        }
    }

    /// Rotates around the axis through the origin, right-hand rule. A zero axis is ignored.
    pub fn rotate(&mut self, axis: Vec3, radians: f32) {
        let rot = match Mat3::rotater(axis, radians) {
            Some(rot) => rot,
            None => return,
        };
        for p in self.vertices.iter_mut() {
            *p = Point3::from(rot * Vec3::from(*p));
        }
        for n in self.normals.iter_mut() {
            *n = rot * *n;
        }
    }

    pub fn swap_axes(&mut self, a: Axis, b: Axis) {
        for p in self.vertices.iter_mut() {
            *p = Point3::from(Vec3::from(*p).swapped(a, b));
        }
        for n in self.normals.iter_mut() {
            *n = n.swapped(a, b);
        }
    }

    /// Reverses the winding of every triangle, and the vertex normals with it.
    pub fn flip_normals(&mut self) {
        for tri in self.indices.chunks_exact_mut(3) {
            tri.swap(1, 2);
        }
        for n in self.normals.iter_mut() {
            *n = -*n;
        }
    }

    pub fn vertices(&self) -> &[Point3] {
        &self.vertices
    }
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }
    pub fn normals(&self) -> &[Vec3] {
        &self.normals
    }
    pub fn uvs(&self) -> &[(f32, f32)] {
        &self.uvs
    }
    pub fn shading(&self) -> &Shading {
        &self.shading
    }
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn bbox(&self) -> BBox {
        self.vertices
            .iter()
            .fold(BBox::empty(), |b, p| b.union(*p))
    }
}

/// One face of a shared `Mesh`. Holds the mesh and the offset of its first index; vertex data is
/// never copied.
#[derive(Debug, Clone)]
pub struct Triangle {
    mesh: Arc<Mesh>,
    offset: usize,
}

impl Triangle {
    /// The `i`-th face of `mesh`, or `None` if the mesh has fewer faces.
    pub fn new(mesh: Arc<Mesh>, i: usize) -> Option<Self> {
        (i < mesh.triangle_count()).then(|| Self { mesh, offset: i * 3 })
    }

    /// Every face of `mesh`, in index order.
    pub fn all(mesh: &Arc<Mesh>) -> Vec<Triangle> {
        (0..mesh.triangle_count())
            .map(|i| Self {
                mesh: mesh.clone(),
                offset: i * 3,
            })
            .collect()
    }

    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    fn ids(&self) -> (usize, usize, usize) {
        let idx = &self.mesh.indices[self.offset..self.offset + 3];
        (idx[0], idx[1], idx[2])
    }

    pub fn vertices(&self) -> (Point3, Point3, Point3) {
        let (i, j, k) = self.ids();
        let v = &self.mesh.vertices;
        (v[i], v[j], v[k])
    }

    /// Unnormalized geometric normal: twice the area times the unit normal.
    fn area_normal(&self) -> Vec3 {
        let (p0, p1, p2) = self.vertices();
        (p0 - p2).cross(p1 - p2)
    }

    pub fn is_degenerate(&self) -> bool {
        let n = self.area_normal();
        !(n.norm_squared() > 0.0) || !n.is_finite()
    }

    /// Partial derivatives w.r.t. the uv parameterization of a quantity that varies linearly over
    /// the face, given its differences `a0 - a2` and `a1 - a2` between the vertices. Zero
    /// without uvs or when the uvs are degenerate.
    fn uv_derivatives(&self, d02: Vec3, d12: Vec3) -> (Vec3, Vec3) {
        if self.mesh.uvs.is_empty() {
            return (Vec3::ZERO, Vec3::ZERO);
        }
        let (i, j, k) = self.ids();
        let uvs = &self.mesh.uvs;
        let (du02, dv02) = (uvs[i].0 - uvs[k].0, uvs[i].1 - uvs[k].1);
        let (du12, dv12) = (uvs[j].0 - uvs[k].0, uvs[j].1 - uvs[k].1);
        let det = du02 * dv12 - dv02 * du12;
        if det == 0.0 {
            return (Vec3::ZERO, Vec3::ZERO);
        }
        let ddu = (d02 * dv12 - d12 * dv02) / det;
        let ddv = (d12 * du02 - d02 * du12) / det;
        if ddu.is_finite() && ddv.is_finite() {
            (ddu, ddv)
        } else {
            (Vec3::ZERO, Vec3::ZERO)
        }
    }

    fn dp_duv(&self) -> (Vec3, Vec3) {
        let (p0, p1, p2) = self.vertices();
        self.uv_derivatives(p0 - p2, p1 - p2)
    }

    /// Derivatives of the interpolated, unnormalized vertex normal. Zero without vertex normals.
    fn dn_duv(&self) -> (Vec3, Vec3) {
        if self.mesh.normals.is_empty() {
            return (Vec3::ZERO, Vec3::ZERO);
        }
        let (i, j, k) = self.ids();
        let n = &self.mesh.normals;
        self.uv_derivatives(n[i] - n[k], n[j] - n[k])
    }
}

/// Watertight ray-triangle test: the ray is moved to the origin, its dominant axis is permuted to
/// z and the space sheared so that it points along +z; the signs of the 2D edge functions then
/// decide inside-ness without gaps along shared edges.
///
/// Returns the ray parameter and the barycentric weights of `p0`, `p1`, `p2`.
fn intersect_watertight(p0: Point3, p1: Point3, p2: Point3, r: &Ray) -> Option<(f32, [f32; 3])> {
    let kz = r.dir.abs_max_dimension();
    let d = r.dir.swapped(kz, Axis::Z);
    if d.z == 0.0 {
        return None;
    }
    let mut q = [
        (p0 - r.origin).swapped(kz, Axis::Z),
        (p1 - r.origin).swapped(kz, Axis::Z),
        (p2 - r.origin).swapped(kz, Axis::Z),
    ];
    let (sx, sy, sz) = (-d.x / d.z, -d.y / d.z, d.z.recip());
    for v in q.iter_mut() {
        v.x += sx * v.z;
        v.y += sy * v.z;
    }
    let e0 = q[1].x * q[2].y - q[1].y * q[2].x;
    let e1 = q[2].x * q[0].y - q[2].y * q[0].x;
    let e2 = q[0].x * q[1].y - q[0].y * q[1].x;
    let any_neg = e0 < 0.0 || e1 < 0.0 || e2 < 0.0;
    let any_pos = e0 > 0.0 || e1 > 0.0 || e2 > 0.0;
    if any_neg && any_pos {
        return None;
    }
    let det = e0 + e1 + e2;
    if det == 0.0 {
        return None;
    }
    let t_scaled = (e0 * q[0].z + e1 * q[1].z + e2 * q[2].z) * sz;
    if (det > 0.0) != (t_scaled > 0.0) {
        return None;
    }
    let inv_det = det.recip();
    let t = r.truncated_t(t_scaled * inv_det)?;
    Some((t, [e0 * inv_det, e1 * inv_det, e2 * inv_det]))
}

impl Shape for Triangle {
    fn intersect(&self, r: &Ray) -> Option<ShapeHitPoint> {
        let (p0, p1, p2) = self.vertices();
        let (t, [b0, b1, b2]) = intersect_watertight(p0, p1, p2, r)?;
        let bc = (b0, b1, b2);
        let normal = self.area_normal().try_hat()?;
        let pos = barycentric_lerp((p0, p1, p2), bc);
        let (i, j, k) = self.ids();

        let mesh = &self.mesh;
        let shading_normal = if mesh.normals.is_empty() {
            normal
        } else {
            let (n0, n1, n2) = (mesh.normals[i], mesh.normals[j], mesh.normals[k]);
            barycentric_lerp((n0, n1, n2), bc)
                .try_hat()
                .unwrap_or(normal)
        };
        let uv = if mesh.uvs.is_empty() {
            (0.0, 0.0)
        } else {
            let (uv0, uv1, uv2) = (mesh.uvs[i], mesh.uvs[j], mesh.uvs[k]);
            (
                barycentric_lerp((uv0.0, uv1.0, uv2.0), bc),
                barycentric_lerp((uv0.1, uv1.1, uv2.1), bc),
            )
        };
        let (dpdu, dpdv) = self.dp_duv();
        let (dndu, dndv) = self.dn_duv();
        let surface = SurfacePoint {
            dpdu,
            dpdv,
            dndu,
            dndv,
            ..SurfacePoint::new(pos, normal, t)
                .with_shading_normal(shading_normal)
                .with_uv(uv)
        };
        Some(ShapeHitPoint::new(surface, &mesh.shading, self))
    }

    fn bbox(&self) -> BBox {
        let (p0, p1, p2) = self.vertices();
        BBox::new(p0, p1).union(p2)
    }

    fn area(&self) -> f32 {
        0.5 * self.area_normal().norm()
    }

    fn sample_position(&self, sampler: &mut dyn Sampler2D) -> Option<PositionSample> {
        let area = self.area();
        let normal = self.area_normal().try_hat()?;
        if !(area > 0.0) {
            return None;
        }
        let (p0, p1, p2) = self.vertices();
        let (e1, e2) = sampler.next_2d();
        let s = e1.sqrt();
        let (b0, b1) = (1.0 - s, e2 * s);
        Some(PositionSample {
            pos: barycentric_lerp((p0, p1, p2), (b0, b1, 1.0 - b0 - b1)),
            normal,
            pdf_area: area.recip(),
        })
    }

    fn sample_pdf(&self, r: &Ray) -> f32 {
        let hit = match self.intersect(r) {
            Some(hit) => hit,
            None => return 0.0,
        };
        let to_origin = r.origin - hit.pos;
        let dist2 = to_origin.norm_squared();
        if dist2 == 0.0 {
            return 0.0;
        }
        let cos = to_origin.dot(hit.normal) / dist2.sqrt();
        if !(cos > 0.0) {
            return 0.0;
        }
        let pdf = dist2 / (self.area() * cos);
        if pdf.is_finite() {
            pdf
        } else {
            0.0
        }
    }

    fn shading(&self) -> &Shading {
        self.mesh.shading()
    }

    fn summary(&self) -> String {
        let (p0, p1, p2) = self.vertices();
        format!("Triangle{{{}, {}, {}}}", p0, p1, p2)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use math::hcm::point3;

    fn unit_triangle() -> Triangle {
        let mesh = Mesh::new(
            vec![
                point3(0.0, 0.0, 0.0),
                point3(1.0, 0.0, 0.0),
                point3(0.0, 1.0, 0.0),
            ],
            vec![0, 1, 2],
            vec![],
            vec![(0.0, 0.0), (1.0, 0.0), (0.0, 1.0)],
        )
        .unwrap();
        Triangle::new(Arc::new(mesh), 0).unwrap()
    }

    #[test]
    fn test_watertight_hit() {
        let tri = unit_triangle();
        let hit = tri
            .intersect(&Ray::new(point3(0.25, 0.25, 2.0), -Vec3::Z))
            .unwrap();
        assert!((hit.ray_t - 2.0).abs() < 1e-6);
        assert!(hit.pos.distance_to(point3(0.25, 0.25, 0.0)) < 1e-6);
        assert!((hit.uv.0 - 0.25).abs() < 1e-6 && (hit.uv.1 - 0.25).abs() < 1e-6);
        // (p0 - p2) x (p1 - p2) = (0, -1, 0) x (1, -1, 0) = (0, 0, 1)
        assert!((hit.normal - Vec3::Z).norm() < 1e-6);
        assert!((hit.dpdu - Vec3::X).norm() < 1e-5, "{}", hit.dpdu);
        assert!((hit.dpdv - Vec3::Y).norm() < 1e-5, "{}", hit.dpdv);

        // Outside, parallel, and behind.
        assert!(tri
            .intersect(&Ray::new(point3(0.75, 0.75, 2.0), -Vec3::Z))
            .is_none());
        assert!(tri
            .intersect(&Ray::new(point3(-1.0, 0.25, 0.0), Vec3::X))
            .is_none());
        assert!(tri
            .intersect(&Ray::new(point3(0.25, 0.25, 2.0), Vec3::Z))
            .is_none());
    }

    #[test]
    fn test_degenerate_triangle_is_never_hit() {
        let mesh = Mesh::new(
            vec![point3(0.0, 0.0, 0.0), point3(1.0, 1.0, 0.0), point3(2.0, 2.0, 0.0)],
            vec![0, 1, 2],
            vec![],
            vec![],
        )
        .unwrap();
        let tri = Triangle::new(Arc::new(mesh), 0).unwrap();
        assert!(tri.is_degenerate());
        assert!(tri
            .intersect(&Ray::new(point3(1.0, 1.0, 1.0), -Vec3::Z))
            .is_none());
        assert_eq!(tri.area(), 0.0);
    }
}
