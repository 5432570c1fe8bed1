use math::float::Float;
use std::f32::consts::PI;

/// Isotropic Trowbridge-Reitz (GGX) microfacet distribution, parameterized by `alpha2` = alpha².
///
/// Models the micro-structure of rough surfaces (metals, plastic, frosted glass) by providing the
/// distribution of microfacet normals as a continuous hemisphere distribution. All angles are
/// given as cosines against the macro-surface normal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrowbridgeReitz {
    pub alpha2: f32,
}

impl TrowbridgeReitz {
    /// Maps a user-facing roughness in [0, 1] to alpha. Values below 0.001 are treated as a
    /// perfectly smooth surface.
    pub fn roughness_to_alpha(roughness: f32) -> f32 {
        if roughness < 1e-3 {
            return 0.0;
        }
        roughness
            .ln()
            .polynomial([1.62142, 0.819955, 0.1734, 0.0171201, 0.000640711])
    }

    pub fn from_roughness(roughness: f32) -> Self {
        Self {
            alpha2: Self::roughness_to_alpha(roughness).powi(2),
        }
    }

    pub fn is_smooth(&self) -> bool {
        self.alpha2 == 0.0
    }

    /// Differential area of microfacets with normal at zenith cosine `cos_h`. Satisfies
    /// ```ignore
    ///  integrate(hemisphere, D(wh) cos_theta(wh) d(wh)) = 1
    /// ```
    pub fn d(&self, cos_h: f32) -> f32 {
        let cos2 = cos_h * cos_h;
        if cos2 == 0.0 {
            return 0.0;
        }
        let tan2 = (1.0 - cos2) / cos2;
        let e = 1.0 + tan2 / self.alpha2;
        (PI * self.alpha2 * cos2 * cos2 * e * e).recip()
    }

    /// Smith masking-shadowing term for a direction at zenith cosine `cos`.
    pub fn g(&self, cos: f32) -> f32 {
        let cos2 = cos * cos;
        if cos2 == 0.0 {
            return 0.0;
        }
        let tan2 = (1.0 - cos2) / cos2;
        let lambda = (-1.0 + (1.0 + self.alpha2 * tan2).sqrt()) * 0.5;
        (1.0 + lambda).recip()
    }

    /// Samples a microfacet normal proportionally to `D(wh) cos(wh)`; returns `(cos_theta, phi)`.
    pub fn sample_wh(&self, (u, v): (f32, f32)) -> (f32, f32) {
        let tan2 = self.alpha2 * u / (1.0 - u);
        let cos_theta = (1.0 + tan2).sqrt().recip();
        (cos_theta, 2.0 * PI * v)
    }
}
