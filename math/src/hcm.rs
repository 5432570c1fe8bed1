use std::{
    fmt,
    ops::{Add, AddAssign, Div, Index, IndexMut, Mul, Neg, Sub, SubAssign},
};

use crate::float::Float;

pub fn vec3(x: f32, y: f32, z: f32) -> Vec3 {
    Vec3::new(x, y, z)
}

pub fn point3(x: f32, y: f32, z: f32) -> Point3 {
    Point3::new(x, y, z)
}

/// Represents a 3D vector. Each component is a `f32` number.
/// Components can be accessed using `v.x` `v.y` `v.z`,
/// or indices `v[i]` where i is 0, 1, or 2, or `v[Axis::X]`.
#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct Point3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];
    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }
}

impl fmt::Display for Vec3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let precision = f.precision().unwrap_or(2);
        write!(
            f,
            "({:.p$}, {:.p$}, {:.p$})",
            self.x,
            self.y,
            self.z,
            p = precision
        )
    }
}
impl fmt::Display for Point3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let precision = f.precision().unwrap_or(2);
        write!(
            f,
            "[{:.p$}, {:.p$}, {:.p$}]",
            self.x,
            self.y,
            self.z,
            p = precision
        )
    }
}

impl Vec3 {
    pub const fn new(x: f32, y: f32, z: f32) -> Vec3 {
        Vec3 { x, y, z }
    }
    pub fn as_triple(self) -> (f32, f32, f32) {
        (self.x, self.y, self.z)
    }
    pub const X: Vec3 = Self::new(1.0, 0.0, 0.0);
    pub const Y: Vec3 = Self::new(0.0, 1.0, 0.0);
    pub const Z: Vec3 = Self::new(0.0, 0.0, 1.0);
    pub const ZERO: Vec3 = Self::new(0.0, 0.0, 0.0);

    pub fn dot(self, v: Vec3) -> f32 {
        self.x * v.x + self.y * v.y + self.z * v.z
    }
    pub fn cross(self, v: Vec3) -> Vec3 {
        // x1 y1 z1
        // x2 y2 z2
        // i  j  k
        Vec3::new(
            self.y * v.z - self.z * v.y,
            self.z * v.x - self.x * v.z,
            self.x * v.y - self.y * v.x,
        )
    }

    pub fn norm_squared(self) -> f32 {
        self.dot(self)
    }
    pub fn norm(self) -> f32 {
        f32::sqrt(self.norm_squared())
    }
    pub fn is_zero(self) -> bool {
        self.norm_squared() == 0.0
    }

    /// Returns a normalized (unit-length) `self` vector.
    /// Panics if the vector length is zero, NaN or infinite.
    pub fn hat(self) -> Vec3 {
        let norm2 = self.norm_squared();
        assert!(norm2 != 0.0 && norm2.is_finite());
        let inv_sqrt = 1.0 / self.norm();
        self * inv_sqrt
    }
    pub fn try_hat(self) -> Option<Self> {
        let inv_length = 1.0 / self.norm();
        (inv_length.is_finite() && inv_length != 0.0).then(|| inv_length * self)
    }

    /// Projects `self` onto `other`. Both vectors can be arbitrary finite length.
    /// ```
    /// let a = math::hcm::vec3(1.0, 2.5, 0.0);
    /// let b = math::hcm::vec3(0.6, 0.0, 0.0);
    /// let c = b - b.projected_onto(a);
    /// assert!(c.dot(a).abs() < f32::EPSILON, "c = {}, a = {}", c, a);
    /// ```
    pub fn projected_onto(self, other: Self) -> Self {
        self.dot(other) * other / other.norm_squared()
    }

    /// Removes the component along the unit vector `normal`.
    pub fn projected_onto_plane(self, normal: Self) -> Self {
        self - normal * self.dot(normal)
    }

    pub fn abs(self) -> Self {
        Vec3::new(self.x.abs(), self.y.abs(), self.z.abs())
    }

    /// Returns the axis along which the vector has the largest magnitude.
    pub fn abs_max_dimension(self) -> Axis {
        let a = self.abs();
        if a.x > a.y && a.x > a.z {
            Axis::X
        } else if a.y > a.z {
            Axis::Y
        } else {
            Axis::Z
        }
    }

    pub fn max_dimension(self) -> Axis {
        if self.x > self.y && self.x > self.z {
            Axis::X
        } else if self.y > self.z {
            Axis::Y
        } else {
            Axis::Z
        }
    }

    pub fn swapped(mut self, a: Axis, b: Axis) -> Self {
        let tmp = self[a];
        self[a] = self[b];
        self[b] = tmp;
        self
    }

    pub fn has_nan(self) -> bool {
        self.x.is_nan() || self.y.is_nan() || self.z.is_nan()
    }
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl Add for Vec3 {
    type Output = Self;
    fn add(self, other: Self) -> Vec3 {
        Vec3::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }
}
impl AddAssign for Vec3 {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}
impl Add<Point3> for Vec3 {
    type Output = Point3;
    fn add(self, other: Point3) -> Point3 {
        Point3::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }
}

impl Sub for Vec3 {
    type Output = Self;
    fn sub(self, other: Self) -> Vec3 {
        Vec3::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }
}
impl SubAssign for Vec3 {
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}
impl Neg for Vec3 {
    type Output = Self;
    fn neg(self) -> Vec3 {
        Vec3::new(-self.x, -self.y, -self.z)
    }
}
impl Index<usize> for Vec3 {
    type Output = f32;
    fn index(&self, i: usize) -> &f32 {
        match i {
            0 => &self.x,
            1 => &self.y,
            2 => &self.z,
            _ => panic!("invalid index"),
        }
    }
}
impl IndexMut<usize> for Vec3 {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        match index {
            0 => &mut self.x,
            1 => &mut self.y,
            2 => &mut self.z,
            _ => panic!("invalid index"),
        }
    }
}
impl Index<Axis> for Vec3 {
    type Output = f32;
    fn index(&self, axis: Axis) -> &f32 {
        &self[axis.index()]
    }
}
impl IndexMut<Axis> for Vec3 {
    fn index_mut(&mut self, axis: Axis) -> &mut f32 {
        &mut self[axis.index()]
    }
}

impl Mul<f32> for Vec3 {
    type Output = Self;
    fn mul(self, s: f32) -> Vec3 {
        Vec3::new(self.x * s, self.y * s, self.z * s)
    }
}
impl Mul<Vec3> for f32 {
    type Output = Vec3;
    fn mul(self, v: Vec3) -> Vec3 {
        v * self
    }
}
impl Div<f32> for Vec3 {
    type Output = Self;
    fn div(self, s: f32) -> Vec3 {
        Vec3::new(self.x / s, self.y / s, self.z / s)
    }
}

// Implementation of Points
impl Point3 {
    pub const fn new(x: f32, y: f32, z: f32) -> Point3 {
        Point3 { x, y, z }
    }
    pub const ORIGIN: Point3 = Point3::new(0.0, 0.0, 0.0);
    pub fn as_triple(self) -> (f32, f32, f32) {
        (self.x, self.y, self.z)
    }

    pub fn distance_to(self, p: Self) -> f32 {
        (self - p).norm()
    }
    pub fn squared_distance_to(self, p: Self) -> f32 {
        (self - p).norm_squared()
    }
    pub fn has_nan(self) -> bool {
        self.x.is_nan() || self.y.is_nan() || self.z.is_nan()
    }
}

impl Add<Vec3> for Point3 {
    type Output = Point3;
    fn add(self, v: Vec3) -> Point3 {
        Point3::new(self.x + v.x, self.y + v.y, self.z + v.z)
    }
}
impl AddAssign<Vec3> for Point3 {
    fn add_assign(&mut self, v: Vec3) {
        *self = *self + v;
    }
}

impl Sub for Point3 {
    type Output = Vec3;
    fn sub(self, from: Point3) -> Vec3 {
        Vec3::new(self.x - from.x, self.y - from.y, self.z - from.z)
    }
}
impl Sub<Vec3> for Point3 {
    type Output = Point3;
    fn sub(self, t: Vec3) -> Point3 {
        Point3::new(self.x - t.x, self.y - t.y, self.z - t.z)
    }
}
impl Index<usize> for Point3 {
    type Output = f32;
    fn index(&self, i: usize) -> &f32 {
        match i {
            0 => &self.x,
            1 => &self.y,
            2 => &self.z,
            _ => panic!("invalid index"),
        }
    }
}
impl IndexMut<usize> for Point3 {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        match index {
            0 => &mut self.x,
            1 => &mut self.y,
            2 => &mut self.z,
            _ => panic!("invalid index"),
        }
    }
}
impl Index<Axis> for Point3 {
    type Output = f32;
    fn index(&self, axis: Axis) -> &f32 {
        &self[axis.index()]
    }
}

// Explicit conversion between Vec3 and Point3.
// -------------------------------------------------------------------------------------------------
impl From<Vec3> for Point3 {
    fn from(v: Vec3) -> Self {
        Point3::new(v.x, v.y, v.z)
    }
}

impl From<Point3> for Vec3 {
    fn from(p: Point3) -> Self {
        Vec3::new(p.x, p.y, p.z)
    }
}

/// ------------------------------------------------------------------------------------------------
/// Mat3: implements m * v, m * m and transpose. Used for rotating meshes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mat3 {
    pub cols: [Vec3; 3],
}

impl Mat3 {
    pub const ZERO: Self = Self {
        cols: [Vec3::ZERO; 3],
    };
    pub const IDENTITY: Self = Self {
        cols: [Vec3::X, Vec3::Y, Vec3::Z],
    };
    pub fn from_cols(v0: Vec3, v1: Vec3, v2: Vec3) -> Self {
        Self { cols: [v0, v1, v2] }
    }

    /// Rotation by `radians` around `axis` following the right-hand rule.
    /// Returns `None` if the axis has zero length.
    pub fn rotater(axis: Vec3, radians: f32) -> Option<Self> {
        let axis = axis.try_hat()?;
        let mut mat = Self::IDENTITY;
        let (sin_t, cos_t) = radians.sin_cos();
        for i in 0..3 {
            let mut base = Vec3::ZERO;
            base[i] = 1.0;
            let vc = base.dot(axis) * axis;
            let v1 = base - vc;
            let v2 = axis.cross(v1);
            mat.cols[i] = vc + v1 * cos_t + v2 * sin_t;
        }
        Some(mat)
    }
    pub fn transpose(&self) -> Self {
        let mut mat = Self::ZERO;
        for i in 0..3 {
            for j in 0..3 {
                mat.cols[i][j] = self.cols[j][i];
            }
        }
        mat
    }
    pub fn frobenius_norm_squared(&self) -> f32 {
        (0..3).map(|i| self.cols[i].norm_squared()).sum()
    }
}

impl Mul<Vec3> for Mat3 {
    type Output = Vec3;
    fn mul(self, v: Vec3) -> Vec3 {
        self.cols[0] * v[0] + self.cols[1] * v[1] + self.cols[2] * v[2]
    }
}

impl Mul for Mat3 {
    type Output = Mat3;
    fn mul(self, m: Self) -> Mat3 {
        Mat3::from_cols(self * m.cols[0], self * m.cols[1], self * m.cols[2])
    }
}

impl Sub for Mat3 {
    type Output = Mat3;
    fn sub(self, rhs: Mat3) -> Self::Output {
        Self::from_cols(
            self.cols[0] - rhs.cols[0],
            self.cols[1] - rhs.cols[1],
            self.cols[2] - rhs.cols[2],
        )
    }
}

// Mod-level functions
// -------------------------------------------------------------------------------------------------

/// Computes an orthonormal frame `(x, y)` around the unit vector `z`, with `y = x × z`.
/// ```
/// use math::hcm::{Vec3, Mat3, basis_around};
/// let z = Vec3::new(0.3, 0.4, -0.6).hat();
/// let (x, y) = basis_around(z);
///
/// let basis = Mat3::from_cols(x, y, z);
/// // basis * basis^T should be identity.
/// let diff_to_eye = basis * basis.transpose() - Mat3::IDENTITY;
/// assert!(diff_to_eye.frobenius_norm_squared() < 1e-6);
/// ```
pub fn basis_around(z: Vec3) -> (Vec3, Vec3) {
    let x = if z.x == 0.0 && z.y == 0.0 {
        // z is the z-axis (or its opposite).
        Vec3::new(z.z, 0.0, 0.0).try_hat().unwrap_or(Vec3::X)
    } else {
        Vec3::new(-z.y, z.x, 0.0).hat()
    };
    (x, x.cross(z))
}

/// Expresses the local coordinates `local` in the world space given a frame.
pub fn vector_from_basis(local: Vec3, (x, y, z): (Vec3, Vec3, Vec3)) -> Vec3 {
    x * local.x + y * local.y + z * local.z
}

/// Given a zenith direction and two directions `a` and `b`, computes the cosines of the zenith
/// angles of `a` and `b` and the cosine of the azimuthal difference between them.
///
/// The azimuth cosine is 1 if either direction lies along the zenith.
pub fn spherical_cosines(zenith: Vec3, a: Vec3, b: Vec3) -> (f32, f32, f32) {
    let (cos_a, cos_b) = (a.dot(zenith), b.dot(zenith));
    let (u, v) = basis_around(zenith);
    let (ax, ay) = (a.dot(u), a.dot(v));
    let (bx, by) = (b.dot(u), b.dot(v));
    let denom = ((ax * ax + ay * ay) * (bx * bx + by * by)).sqrt();
    let cos_phi = (ax * bx + ay * by)
        .try_divide(denom)
        .map_or(1.0, |c| c.clamp(-1.0, 1.0));
    (cos_a, cos_b, cos_phi)
}

/// Mirrors `dir` about the plane with unit normal `normal`: `dir - 2 (dir·n) n`.
pub fn reflect(dir: Vec3, normal: Vec3) -> Vec3 {
    dir - normal * (2.0 * dir.dot(normal))
}

/// Refracts the travelling direction `dir_out` at a surface with unit normal `normal`, where
/// `cos_out = dir_out · normal` and `eta` is the relative index of the side the normal points
/// away from. Returns `None` on total internal reflection.
///
/// When `dir_out` travels against the normal (`cos_out < 0`) the ray enters the medium and the
/// ratio used by Snell's law is `1 / eta`.
pub fn refract_around(dir_out: Vec3, normal: Vec3, cos_out: f32, eta: f32) -> Option<Vec3> {
    let (cos1, ratio) = if cos_out < 0.0 {
        (-cos_out, eta.recip())
    } else {
        (cos_out, eta)
    };
    let sin1 = 1.0f32.cathetus(cos1);
    let sin2 = sin1 * ratio;
    if sin2 >= 1.0 {
        return None;
    }
    let cos2 = 1.0f32.cathetus(sin2);
    let vy = normal * cos_out;
    let vx = dir_out - vy;
    let vy = vy.try_hat().unwrap_or(Vec3::ZERO);
    let vx = vx.try_hat().unwrap_or(Vec3::ZERO);
    (vy + vx * (sin2 / cos2)).try_hat()
}

#[macro_export]
macro_rules! assert_close {
    ($left:expr, $right:expr) => {
        if ($left - $right).norm_squared() > 1e-4 {
            panic!(
                "Assertion failed: Close({}, {}) values: {} vs. {}, dist = {}",
                stringify!($left),
                stringify!($right),
                $left,
                $right,
                ($left - $right).norm()
            )
        }
    };
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_reflect() {
        let normal = Vec3::Y;
        let dir = Vec3::new(2.0, -1.0, 0.5);
        let expected = Vec3::new(2.0, 1.0, 0.5);
        let reflected = reflect(dir, normal);
        assert!((reflected - expected).norm_squared() < f32::EPSILON);
    }

    #[test]
    fn test_refract_around() {
        // Entering glass at 45 degrees with IOR sqrt(2): sin2 = 0.5, i.e., 30 degrees.
        let normal = Vec3::Y;
        let dir = Vec3::new(1.0, -1.0, 0.0).hat();
        let cos_out = dir.dot(normal);
        let refracted = refract_around(dir, normal, cos_out, 2.0f32.sqrt()).unwrap();
        let expected = Vec3::new(0.5, -0.75f32.sqrt(), 0.0);
        assert_close!(refracted, expected);

        // Leaving glass (IOR 2) beyond the 30-degree critical angle.
        let leaving = Vec3::new(0.51, 0.75f32.sqrt(), 0.0).hat();
        assert!(refract_around(leaving, normal, leaving.dot(normal), 2.0).is_none());
        let leaving = Vec3::new(0.49, 0.75f32.sqrt(), 0.0).hat();
        assert!(refract_around(leaving, normal, leaving.dot(normal), 2.0).is_some());
    }

    #[test]
    fn test_basis_around_poles() {
        for z in [Vec3::Z, -Vec3::Z, Vec3::new(0.0, 0.6, 0.8)] {
            let (x, y) = basis_around(z);
            assert!(x.dot(z).abs() < 1e-6);
            assert!(y.dot(z).abs() < 1e-6);
            assert!(x.dot(y).abs() < 1e-6);
            assert!((y.norm() - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_spherical_cosines() {
        let a = Vec3::new(1.0, 0.0, 1.0).hat();
        let b = Vec3::new(0.0, 1.0, 1.0).hat();
        let (ca, cb, cphi) = spherical_cosines(Vec3::Z, a, b);
        assert!((ca - 0.5f32.sqrt()).abs() < 1e-6);
        assert!((cb - 0.5f32.sqrt()).abs() < 1e-6);
        assert!(cphi.abs() < 1e-6);

        let (_, _, cphi) = spherical_cosines(Vec3::Z, Vec3::Z, b);
        assert_eq!(cphi, 1.0);
    }

    #[test]
    fn test_rotater() {
        let rot = Mat3::rotater(Vec3::Z, std::f32::consts::FRAC_PI_2).unwrap();
        assert_close!(rot * Vec3::X, Vec3::Y);
        assert!(Mat3::rotater(Vec3::ZERO, 1.0).is_none());
    }
}
