use std::{
    iter::Sum,
    ops::{Add, AddAssign, Div, Mul, MulAssign, Sub},
};

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

/// Clamps an f32 value to [0, 1], mutiplies it by 255 and casts it to u8.
/// Returns 0 if `f` is NaN.
fn saturate_cast_u8(f: f32) -> u8 {
    if f > 1.0 {
        255
    } else if f >= 0.0 {
        (f * 255.0) as u8
    } else {
        0
    }
}

impl Color {
    pub const fn new(r: f32, g: f32, b: f32) -> Color {
        Color { r, g, b }
    }
    pub fn black() -> Color {
        Color::new(0.0, 0.0, 0.0)
    }
    pub fn white() -> Color {
        Color::new(1.0, 1.0, 1.0)
    }
    pub const ONE: Color = Self::new(1.0, 1.0, 1.0);
    pub const RED: Color = Self::new(1.0, 0.0, 0.0);
    pub fn gray(level: f32) -> Color {
        Color::new(level, level, level)
    }
    pub fn rgb(r: u8, g: u8, b: u8) -> Color {
        Color::new(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0)
    }
    pub fn gamma_encode(&self) -> Self {
        Color::new(self.r.sqrt(), self.g.sqrt(), self.b.sqrt())
    }
    /// True only if every channel is exactly zero.
    pub fn is_black(&self) -> bool {
        self.r == 0.0 && self.g == 0.0 && self.b == 0.0
    }
    /// Sum of the three channels.
    pub fn power(&self) -> f32 {
        self.r + self.g + self.b
    }
    /// Rec. 709 luminance.
    pub fn luminance(&self) -> f32 {
        0.2126 * self.r + 0.7152 * self.g + 0.0722 * self.b
    }
    pub fn to_u8(&self) -> [u8; 3] {
        [
            saturate_cast_u8(self.r),
            saturate_cast_u8(self.g),
            saturate_cast_u8(self.b),
        ]
    }
    pub fn has_nan(&self) -> bool {
        self.r.is_nan() || self.g.is_nan() || self.b.is_nan()
    }
    /// Returns true iff all RGB components are finite and free of NaNs.
    pub fn is_finite(&self) -> bool {
        self.r.is_finite() && self.g.is_finite() && self.b.is_finite()
    }

    /// Component-wise (per RGB channel) division.
    pub fn cw_div(&self, other: Self) -> Self {
        Color::new(self.r / other.r, self.g / other.g, self.b / other.b)
    }
    /// Component-wise max.
    pub fn cw_max(&self, x: f32) -> Self {
        Color::new(self.r.max(x), self.g.max(x), self.b.max(x))
    }
    /// Component-wise clamp into [lo, hi].
    pub fn clamp(&self, lo: f32, hi: f32) -> Self {
        Color::new(
            self.r.clamp(lo, hi),
            self.g.clamp(lo, hi),
            self.b.clamp(lo, hi),
        )
    }
}

impl Add for Color {
    type Output = Color;
    fn add(self, rhs: Self) -> Self {
        Color::new(self.r + rhs.r, self.g + rhs.g, self.b + rhs.b)
    }
}

impl AddAssign for Color {
    fn add_assign(&mut self, rhs: Self) {
        self.r += rhs.r;
        self.g += rhs.g;
        self.b += rhs.b;
    }
}

impl Sub for Color {
    type Output = Color;
    fn sub(self, rhs: Self) -> Self::Output {
        Color::new(self.r - rhs.r, self.g - rhs.g, self.b - rhs.b)
    }
}

impl Mul<f32> for Color {
    type Output = Color;
    fn mul(self, s: f32) -> Self {
        Color::new(self.r * s, self.g * s, self.b * s)
    }
}

impl Mul<Color> for f32 {
    type Output = Color;
    fn mul(self, c: Color) -> Color {
        c * self
    }
}

impl Mul for Color {
    type Output = Color;
    fn mul(self, rhs: Color) -> Self::Output {
        Color::new(self.r * rhs.r, self.g * rhs.g, self.b * rhs.b)
    }
}

impl MulAssign for Color {
    fn mul_assign(&mut self, rhs: Color) {
        *self = *self * rhs;
    }
}

impl MulAssign<f32> for Color {
    fn mul_assign(&mut self, s: f32) {
        *self = *self * s;
    }
}

impl Div<f32> for Color {
    type Output = Color;
    fn div(self, s: f32) -> Color {
        Color::new(self.r / s, self.g / s, self.b / s)
    }
}

impl std::fmt::Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let precision = f.precision().unwrap_or(2);
        write!(
            f,
            "rgb({:.precision$}, {:.precision$}, {:.precision$})",
            self.r,
            self.g,
            self.b,
            precision = precision
        )
    }
}

impl std::fmt::LowerHex for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let [r, g, b] = self.to_u8();
        write!(f, "#{:02x}{:02x}{:02x}", r, g, b)
    }
}

impl Sum for Color {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Color::black(), |c0, c1| c0 + c1)
    }
}

#[cfg(test)]
mod test {
    use super::Color;

    #[test]
    fn test_black_is_exact() {
        assert!(Color::black().is_black());
        assert!(!Color::new(0.0, 1e-12, 0.0).is_black());
        assert!(!Color::new(-1.0, 0.0, 0.0).is_black());
    }

    #[test]
    fn test_to_u8_saturates() {
        assert_eq!(Color::new(2.0, -1.0, f32::NAN).to_u8(), [255, 0, 0]);
        assert_eq!(format!("{:x}", Color::new(1.0, 0.0, 1.0)), "#ff00ff");
    }
}
