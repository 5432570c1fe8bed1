use math::{float::Float, hcm::Vec3};
use std::f32::consts::{FRAC_1_PI, FRAC_PI_2, FRAC_PI_4};

/// Maps the unit square onto the unit disk, preserving relative areas (Shirley-Chiu).
pub fn concentric_sample_disk((u, v): (f32, f32)) -> (f32, f32) {
    let x = u * 2.0 - 1.0;
    let y = v * 2.0 - 1.0;
    if x == 0.0 && y == 0.0 {
        return (0.0, 0.0);
    }
    let (r, theta) = if x.abs() > y.abs() {
        (x, FRAC_PI_4 * (y / x))
    } else {
        (y, FRAC_PI_2 - FRAC_PI_4 * (x / y))
    };
    let (sin, cos) = theta.sin_cos();
    (r * cos, r * sin)
}

/// Samples the +z hemisphere with density `cos(theta) / pi` w.r.t. solid angle.
pub fn cos_sample_hemisphere(uv: (f32, f32)) -> Vec3 {
    let (x, y) = concentric_sample_disk(uv);
    let z = (1.0 - x * x - y * y).safe_sqrt();
    Vec3::new(x, y, z)
}

pub fn cos_hemisphere_pdf(cos_theta: f32) -> f32 {
    cos_theta.max(0.0) * FRAC_1_PI
}

#[cfg(test)]
mod test {
    use super::*;
    use math::float::linspace;

    #[test]
    fn test_disk_stays_inside() {
        let (us, _) = linspace((0.0, 1.0), 30);
        for u in us.iter() {
            for v in us.iter() {
                let (x, y) = concentric_sample_disk((*u, *v));
                assert!(x * x + y * y <= 1.0 + 1e-5);
                let w = cos_sample_hemisphere((*u, *v));
                assert!((w.norm() - 1.0).abs() < 1e-4 && w.z >= 0.0, "{}", w);
            }
        }
    }

    #[test]
    fn test_cosine_mean() {
        // E[cos theta] under the cosine-weighted density is 2/3.
        let (us, _) = linspace((0.0, 1.0), 100);
        let mean = us
            .iter()
            .flat_map(|u| us.iter().map(move |v| cos_sample_hemisphere((*u, *v)).z))
            .sum::<f32>()
            / (us.len() * us.len()) as f32;
        assert!((mean - 2.0 / 3.0).abs() < 1e-2, "{}", mean);
    }
}
