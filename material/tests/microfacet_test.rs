use std::f32::consts::PI;

use geometry::{fresnel, SurfacePoint};
use material::{Material, Microfacet, Mirror};
use math::{
    float::linspace,
    hcm::{Point3, Vec3},
};
use radiometry::color::Color;

fn integrate_sphere<F: Fn(Vec3) -> f32>(f: F) -> f32 {
    let (cos_thetas, d_cos) = linspace((-1.0, 1.0), 400);
    let (phis, d_phi) = linspace((0.0, 2.0 * PI), 200);
    let mut sum = 0.0;
    for cos_theta in cos_thetas.iter() {
        let sin_theta = (1.0 - cos_theta * cos_theta).max(0.0).sqrt();
        for phi in phis.iter() {
            let dir = Vec3::new(sin_theta * phi.cos(), sin_theta * phi.sin(), *cos_theta);
            sum += f(dir) * d_cos * d_phi;
        }
    }
    sum
}

fn up_hit() -> SurfacePoint {
    SurfacePoint::new(Point3::ORIGIN, Vec3::Z, 1.0)
}

#[test]
fn rough_sample_matches_pdf_and_bsdf() {
    let hit = up_hit();
    let glass = Microfacet::dielectric(Color::white(), Color::white(), 1.5, 0.4);
    let metal = Microfacet::metal(Color::new(0.2, 0.9, 1.1), Color::new(3.9, 2.4, 2.2), 0.3);
    let materials: [&dyn Material; 2] = [&glass, &metal];
    for m in materials.iter() {
        assert!(!m.has_delta_only());
        for dir_out in [Vec3::new(0.4, 0.1, -1.0), Vec3::new(-0.2, 0.3, 1.0)].iter() {
            let mut live = 0;
            for _ in 0..300 {
                let s = m.bsdf_sample(&hit, *dir_out);
                if s.is_dead() {
                    continue;
                }
                live += 1;
                assert!(!s.specular);
                let pdf = m.pdf(&hit, s.ray.dir, *dir_out);
                assert!(
                    (pdf - s.prob).abs() <= 1e-3 * pdf.max(1.0),
                    "{}: {} vs {}",
                    m.summary(),
                    pdf,
                    s.prob
                );
                assert!(s.bsdf.is_finite() && !s.bsdf.has_nan());
            }
            assert!(live > 100, "{}: only {} live samples", m.summary(), live);
        }
    }
}

#[test]
fn rough_pdf_integrates_below_one() {
    let hit = up_hit();
    let glass = Microfacet::dielectric(Color::white(), Color::white(), 1.5, 0.5);
    let dir_out = Vec3::new(0.3, 0.0, -1.0).hat();
    let total = integrate_sphere(|dir_in| glass.pdf(&hit, dir_in, dir_out));
    assert!(total <= 1.05 && total > 0.5, "{}", total);
}

#[test]
fn rough_glass_lobe_choice_matches_pdf() {
    let hit = up_hit();
    let glass = Microfacet::dielectric(Color::white(), Color::white(), 1.5, 0.5);
    for dir_out in [Vec3::new(0.3, 0.0, -1.0).hat(), Vec3::new(0.8, 0.0, 0.6)].iter() {
        let below = dir_out.z < 0.0;
        // Mass of the pdf on the far side of the surface, where refracted light comes from.
        let expected = integrate_sphere(|dir_in| {
            if (dir_in.z < 0.0) == below {
                glass.pdf(&hit, dir_in, *dir_out)
            } else {
                0.0
            }
        });
        let n = 20000;
        let transmitted = (0..n)
            .map(|_| glass.bsdf_sample(&hit, *dir_out))
            .filter(|s| !s.is_dead() && (s.ray.dir.z < 0.0) == below)
            .count();
        let fraction = transmitted as f32 / n as f32;
        assert!((fraction - expected).abs() < 0.05, "{} vs {}", fraction, expected);
    }
}

#[test]
fn rough_metal_energy_bounded() {
    let hit = up_hit();
    let metal = Microfacet::tinted_metal(Color::white(), 0.3);
    for dir_out in [Vec3::new(0.0, 0.0, -1.0), Vec3::new(0.5, 0.0, -1.0).hat()].iter() {
        let albedo = integrate_sphere(|dir_in| metal.bsdf(&hit, dir_in, *dir_out).g * dir_in.z.abs());
        assert!(albedo <= 1.05 && albedo > 0.5, "{}", albedo);
    }
}

#[test]
fn smooth_glass_picks_reflection_by_fresnel() {
    let hit = up_hit();
    let glass = Microfacet::dielectric(Color::white(), Color::white(), 1.5, 0.0);
    assert!(glass.has_delta_only());
    assert!(glass.bsdf(&hit, Vec3::Z, -Vec3::Z).is_black());
    assert_eq!(glass.pdf(&hit, Vec3::Z, -Vec3::Z), 0.0);

    let dir_out = Vec3::new(0.0, 0.0, -1.0);
    let (n, mut reflected) = (4000, 0);
    for _ in 0..n {
        let s = glass.bsdf_sample(&hit, dir_out);
        assert!(s.specular && !s.is_dead());
        if s.ray.dir.z > 0.0 {
            reflected += 1;
            assert!((s.prob - 0.04).abs() < 1e-3, "{}", s.prob);
        } else {
            assert!((s.ray.dir - dir_out).norm() < 1e-4, "{}", s.ray.dir);
            assert!((s.prob - 0.96).abs() < 1e-3, "{}", s.prob);
        }
    }
    let fraction = reflected as f32 / n as f32;
    assert!((fraction - 0.04).abs() < 0.02, "{}", fraction);
}

#[test]
fn smooth_glass_total_internal_reflection() {
    let hit = up_hit();
    let glass = Microfacet::dielectric(Color::white(), Color::white(), 1.5, 0.0);
    // Travelling upwards inside the glass at 60 degrees: beyond the critical angle of ~41.8.
    let dir_out = Vec3::new(0.75f32.sqrt(), 0.0, 0.5);
    for _ in 0..50 {
        let s = glass.bsdf_sample(&hit, dir_out);
        assert!(!s.is_dead());
        assert!(s.ray.dir.z < 0.0, "{}", s.ray.dir);
        assert!((s.prob - 1.0).abs() < 1e-6);
    }
}

#[test]
fn smooth_metal_reflects_fresnel() {
    let hit = up_hit();
    let (n, k) = (Color::new(0.2, 0.9, 1.1), Color::new(3.9, 2.4, 2.2));
    let metal = Microfacet::metal(n, k, 0.0);
    let dir_out = Vec3::new(1.0, 0.0, -1.0).hat();
    let s = metal.bsdf_sample(&hit, dir_out);
    assert!(s.specular);
    assert!((s.ray.dir - Vec3::new(1.0, 0.0, 1.0).hat()).norm() < 1e-5);
    let throughput = s.bsdf * (s.ray.dir.z.abs() / s.prob);
    let expected = fresnel::conductor(n, k, s.ray.dir.z);
    assert!((throughput - expected).power().abs() < 1e-4, "{} vs {}", throughput, expected);
}

#[test]
fn mirror_is_delta() {
    let hit = up_hit();
    let mirror = Mirror::new();
    assert!(mirror.has_delta_only());
    let dir_out = Vec3::new(0.3, -0.4, -1.0);
    let s = mirror.bsdf_sample(&hit, dir_out);
    assert!(s.specular);
    assert_eq!(s.prob, 1.0);
    assert!((s.ray.dir - Vec3::new(0.3, -0.4, 1.0).hat()).norm() < 1e-5);
    let throughput = s.bsdf * s.ray.dir.z.abs();
    assert!((throughput.g - 1.0).abs() < 1e-5, "{}", throughput);
    assert!(mirror.bsdf(&hit, s.ray.dir, dir_out).is_black());
}
