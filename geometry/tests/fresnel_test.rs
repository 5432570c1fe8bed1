use geometry::fresnel;
use math::float::Float;
use radiometry::color::Color;

#[test]
fn dielectric_normal_incidence() {
    for n in [1.33f32, 1.5, 2.0].iter().copied() {
        let expected = ((n - 1.0) / (n + 1.0)).powi(2);
        let actual = fresnel::dielectric(n, 1.0);
        assert!(actual.dist_to(expected) < 1e-6, "{} vs {}", actual, expected);
        // Leaving the medium head-on reflects the same amount.
        let actual = fresnel::dielectric(n, -1.0);
        assert!(actual.dist_to(expected) < 1e-6, "{} vs {}", actual, expected);
    }
}

#[test]
fn dielectric_total_internal_reflection() {
    let n = 1.5f32;
    let critical_sin = 1.0 / n;
    let critical_cos = 1.0f32.cathetus(critical_sin);
    // Light travelling inside the glass beyond the critical angle.
    assert_eq!(fresnel::dielectric(n, -(critical_cos - 0.01)), 1.0);
    assert!(fresnel::dielectric(n, -(critical_cos + 0.01)) < 1.0);
    // No total reflection from outside.
    assert!(fresnel::dielectric(n, 0.05) < 1.0);
}

#[test]
fn dielectric_grows_towards_grazing() {
    let values: Vec<f32> = [1.0f32, 0.8, 0.5, 0.2, 0.05]
        .iter()
        .map(|c| fresnel::dielectric(1.5, *c))
        .collect();
    assert!(values.windows(2).all(|w| w[0] <= w[1]), "{:?}", values);
    assert!(values.iter().all(|v| *v >= 0.0 && *v <= 1.0));
}

#[test]
fn conductor_matches_dielectric_without_absorption() {
    let n = Color::gray(1.5);
    for cos in [1.0f32, 0.7, 0.3].iter().copied() {
        let conductor = fresnel::conductor(n, Color::black(), cos);
        let dielectric = fresnel::dielectric(1.5, cos);
        assert!(
            conductor.r.dist_to(dielectric) < 1e-4,
            "cos = {}: {} vs {}",
            cos,
            conductor,
            dielectric
        );
    }
}

#[test]
fn conductor_gold_is_reddish() {
    // Gold-like complex index.
    let n = Color::new(0.143, 0.374, 1.442);
    let k = Color::new(3.983, 2.385, 1.603);
    let r = fresnel::conductor(n, k, 1.0);
    assert!(r.r > r.g && r.g > r.b, "{}", r);
    assert!(r.r <= 1.0 && r.b >= 0.0);
}
