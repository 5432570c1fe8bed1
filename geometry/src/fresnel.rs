use math::float::Float;
use radiometry::color::Color;

/// Fresnel reflectance of a dielectric interface with relative index `n` (inside over outside).
///
/// `cos_in` is the cosine between the incident direction and the outward normal: positive means
/// the light arrives from outside, negative from inside. Beyond the critical angle the result is
/// exactly 1.
/// ```
/// use geometry::fresnel::dielectric;
/// let r = dielectric(1.5, 1.0);
/// assert!((r - 0.04).abs() < 1e-6);
/// ```
pub fn dielectric(n: f32, cos_in: f32) -> f32 {
    let (cos1, n1) = if cos_in < 0.0 {
        (-cos_in, n.recip())
    } else {
        (cos_in, n)
    };
    let sin1 = 1.0f32.cathetus(cos1);
    let sin2 = sin1 / n1;
    if sin2 >= 1.0 {
        return 1.0;
    }
    let cos2 = 1.0f32.cathetus(sin2);
    let r_parl = (n1 * cos1 - cos2) / (n1 * cos1 + cos2);
    let r_perp = (cos1 - n1 * cos2) / (cos1 + n1 * cos2);
    (r_parl * r_parl + r_perp * r_perp) * 0.5
}

/// Fresnel reflectance of a conductor with complex index `n + ik` per RGB channel, seen from a
/// medium of index 1. Only the magnitude of `cos_in` matters.
pub fn conductor(n: Color, k: Color, cos_in: f32) -> Color {
    let channel = |eta: f32, kappa: f32| {
        let cos = cos_in.abs().min(1.0);
        let cos2 = cos * cos;
        let sin2 = 1.0 - cos2;
        let eta2 = eta * eta;
        let kappa2 = kappa * kappa;

        let t0 = eta2 - kappa2 - sin2;
        let a2_plus_b2 = (t0 * t0 + 4.0 * eta2 * kappa2).safe_sqrt();
        let t1 = a2_plus_b2 + cos2;
        let a = (0.5 * (a2_plus_b2 + t0)).safe_sqrt();
        let t2 = 2.0 * cos * a;
        let rs = (t1 - t2) / (t1 + t2);

        let t3 = cos2 * a2_plus_b2 + sin2 * sin2;
        let t4 = t2 * sin2;
        let rp = rs * (t3 - t4) / (t3 + t4);
        let r = 0.5 * (rp + rs);
        if r.is_finite() {
            r.clamp(0.0, 1.0)
        } else {
            1.0
        }
    };
    Color::new(channel(n.r, k.r), channel(n.g, k.g), channel(n.b, k.b))
}
