/// 1 - \eps for f32. The largest number below 1.0, used to keep samples inside [0, 1).
pub const ONE_MINUS_EPSILON: f32 = 1.0 - f32::EPSILON;

/// Computes the linear interpolation between `a` and `b`: (0, 1) -> (a, b).
///
/// This function also works if `a` and `b` are not "Scalable" by themselves - as long as `a-b` can
/// be scaled by a `f32`, and the difference can be added to either `a` or `b` to get back `T` then
/// `lerp` can be used.
/// - Although `Point3` can't be scaled, but the difference type `Vec3` can, and point + vector is
///   a point, so `lerp` can be used on 2 points.
pub fn lerp<T, U>(a: T, b: T, t: f32) -> T
where
    T: Copy + std::ops::Sub<T, Output = U>,
    U: Copy + std::ops::Mul<f32, Output = U> + std::ops::Add<T, Output = T>,
{
    (b - a) * t + a
}

/// Computes the barycentric interpolation given 3 attribute values and 3 barycentric coordinates.
/// The attribute can be of various types. If types can be `lerp`ed, then there's a great chance
/// that they can be `barycentric_lerp`ed.
///
/// One more constraint on difference type (type of `T - T`): `U + U -> U`.
pub fn barycentric_lerp<T, U>(values: (T, T, T), bc_coeffs: (f32, f32, f32)) -> T
where
    T: Copy + std::ops::Sub<T, Output = U>,
    U: Copy
        + std::ops::Mul<f32, Output = U>
        + std::ops::Add<T, Output = T>
        + std::ops::Add<U, Output = U>,
{
    let (a, b, c) = values;
    let (bc0, bc1, _) = bc_coeffs;
    //   bc0 * a + bc1 * b + (1 - bc0 - bc1) * c
    // = bc0 * (a-c) + bc1 * (b-c) + c
    (a - c) * bc0 + (b - c) * bc1 + c
}

pub trait Float: Sized {
    /// Returns the length of other leg of the triangle given the hypotenuse and a known one.
    fn cathetus(self, other: Self) -> Self;
    /// Computes `x / y` if y is nonzero; returns `None` if y is zero.
    fn try_divide(self, divisor: Self) -> Option<Self>;
    /// Reciprocal that maps 0 to 0 instead of infinity.
    fn weak_recip(self) -> Self;
    /// Absolute difference between two numbers.
    fn dist_to(self, other: Self) -> Self;
    /// Square root that treats small negative inputs (rounding noise) as zero.
    fn safe_sqrt(self) -> Self;
    /// Evaluates the polynomial c0 + c1 * x + c2 * x^2 + ... + cn * x^n. The coefficients should be
    /// given in increasing order of powers.
    fn polynomial<const N: usize>(self, coeffs: [Self; N]) -> Self;
}

impl Float for f32 {
    /// Computes the other side of the right-angle side given the hypotenuse.
    /// Returns 0.0 if the hypotenuse (self) is shorter than the right-angle side.
    /// ```
    /// use math::float::Float;
    /// assert_eq!(1.0f32.cathetus(0.6), 0.8);
    /// assert_eq!(1.0f32.cathetus(-0.6), 0.8);
    /// ```
    fn cathetus(self, other: f32) -> f32 {
        (self.powi(2) - other.powi(2)).max(0.0).sqrt()
    }

    /// ```
    /// use math::float::Float;
    /// assert_eq!(1.0f32.try_divide(0.0), None);
    /// assert_eq!(1.0f32.try_divide(2.5), Some(0.4));
    /// ```
    fn try_divide(self, divisor: Self) -> Option<Self> {
        if divisor == 0.0 {
            None
        } else {
            Some(self / divisor)
        }
    }

    fn weak_recip(self) -> Self {
        if self == 0.0 {
            0.0
        } else {
            self.recip()
        }
    }

    fn dist_to(self, other: Self) -> Self {
        (self - other).abs()
    }

    fn safe_sqrt(self) -> Self {
        self.max(0.0).sqrt()
    }

    fn polynomial<const N: usize>(self, coeffs: [Self; N]) -> Self {
        // a + b * x + c * x^2 + d * x^3
        // = a + x * (b + x * (c + d * x))
        coeffs.iter().rev().fold(0.0, |d, c| d * self + c)
    }
}

/// Divides the given `interval` evenly into `count` pieces and returns the midpoint of each piece
/// together with the spacing between adjacent midpoints.
pub fn linspace(interval: (f32, f32), count: i32) -> (Vec<f32>, f32) {
    let (a, b) = interval;
    (
        (0..count)
            .map(|i| (i as f32 + 0.5) / count as f32 * (b - a) + a)
            .collect::<Vec<_>>(),
        (b - a) / count as f32,
    )
}

pub fn min_max(a: f32, b: f32) -> (f32, f32) {
    if a < b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Evaluates the cosine series `sum_k coeffs[k] * cos(k * phi)` given `cos(phi)`.
///
/// Uses the Chebyshev recurrence cos((k+1)x) = 2cos(x)cos(kx) - cos((k-1)x) so no trigonometric
/// function is evaluated; accumulation happens in f64.
/// ```
/// let v = math::float::fourier_series(&[1.0, 0.5, 0.25], 0.0);
/// // cos(0) = 1, cos(pi/2) = 0, cos(pi) = -1
/// assert!((v - 0.75).abs() < 1e-6);
/// ```
pub fn fourier_series(coeffs: &[f32], cos_phi: f32) -> f32 {
    let cos_phi = cos_phi as f64;
    let (mut cos_k_minus_one, mut cos_k) = (cos_phi, 1.0f64);
    let mut value = 0.0f64;
    for c in coeffs.iter() {
        value += *c as f64 * cos_k;
        let cos_k_plus_one = 2.0 * cos_phi * cos_k - cos_k_minus_one;
        cos_k_minus_one = cos_k;
        cos_k = cos_k_plus_one;
    }
    value as f32
}

/// Returns the index `i` such that `sorted[i] <= x < sorted[i + 1]`, or `None` if `x` is below
/// the first element. `x` beyond the last element maps to the last bucket start.
pub fn find_interval(sorted: &[f32], x: f32) -> Option<usize> {
    sorted.partition_point(|v| *v <= x).checked_sub(1)
}

#[macro_export]
macro_rules! assert_le {
    ($left:expr, $right:expr) => {
        if $left > $right {
            panic!(
                "Assertion failed: {} <= {} (values: {} vs. {})",
                stringify!($left),
                stringify!($right),
                $left,
                $right
            )
        }
    };
}

#[macro_export]
macro_rules! assert_lt {
    ($left:expr, $right:expr) => {
        if $left >= $right {
            panic!(
                "Assertion failed: {} < {} (values: {} vs. {})",
                stringify!($left),
                stringify! {$right},
                $left,
                $right
            )
        }
    };
}

#[macro_export]
macro_rules! assert_ge {
    ($left:expr, $right:expr) => {
        if $left < $right {
            panic!(
                "Assertion failed: {} >= {} (values: {} vs. {})",
                stringify!($left),
                stringify!($right),
                $left,
                $right
            )
        }
    };
}
