use std::f32::consts::FRAC_1_PI;
use std::sync::Arc;

use geometry::ray::Ray;
use light::{DirectionalLight, InfiniteLight};
use lyrender::integrator::{DirectTracer, FtlTracer, PathTracer, TraceContext, Tracer};
use material::{Matte, Mirror, Shading};
use math::hcm::{point3, vec3, Point3, Vec3};
use radiometry::color::Color;
use sampling::UniformSampler2D;
use scene::{preset, Scene};
use shape::{Mesh, Sphere};
use texture::Image;

/// Square at `z = 0`, 4 units wide, facing up.
fn square(shading: Shading) -> Mesh {
    Mesh::new(
        vec![
            point3(-2.0, -2.0, 0.0),
            point3(2.0, -2.0, 0.0),
            point3(2.0, 2.0, 0.0),
            point3(-2.0, 2.0, 0.0),
        ],
        vec![0, 1, 2, 0, 2, 3],
        vec![],
        vec![],
    )
    .unwrap()
    .with_shading(shading)
}

fn floor(albedo: f32) -> Mesh {
    square(Shading::new(Arc::new(Matte::solid(Color::gray(albedo), 0.0, false))))
}

fn finish(mut scene: Scene) -> Scene {
    scene.preprocess();
    scene.build_accelerator().unwrap();
    scene
}

fn mean(tracer: &dyn Tracer, scene: &Scene, ray: Ray, n: usize) -> Color {
    let mut sampler = UniformSampler2D::seeded(17);
    let ctx = TraceContext::disabled();
    let sum: Color = (0..n)
        .map(|_| tracer.trace(scene, ray, &mut sampler, &ctx))
        .sum();
    sum / n as f32
}

fn down_at(x: f32, y: f32) -> Ray {
    Ray::new(point3(x, y, 5.0), -Vec3::Z)
}

#[test]
fn unlit_scene_is_black() {
    let mut scene = Scene::new();
    scene.add_mesh(floor(0.8));
    let scene = finish(scene);
    let ray = down_at(0.3, 0.1);
    assert!(mean(&DirectTracer, &scene, ray, 20).is_black());
    assert!(mean(&PathTracer::default(), &scene, ray, 20).is_black());
}

#[test]
fn directional_light_on_matte_floor() {
    for (dir, cos) in [(vec3(0.0, 0.0, -1.0), 1.0), (vec3(3f32.sqrt(), 0.0, -1.0), 0.5)].iter() {
        let mut scene = Scene::new();
        scene.add_mesh(floor(0.5));
        scene.add_light(Box::new(DirectionalLight::new(*dir, Color::gray(2.0)).unwrap()));
        let scene = finish(scene);

        let value = mean(&DirectTracer, &scene, down_at(0.2, -0.4), 4);
        let expected = 0.5 * FRAC_1_PI * 2.0 * cos;
        assert!(
            (value.r - expected).abs() < 1e-4,
            "light along {}: {} vs {}",
            dir,
            value,
            expected
        );
    }
}

#[test]
fn directional_light_blocked_by_occluder() {
    let mut scene = Scene::new();
    scene.add_mesh(floor(0.5));
    scene
        .add_shape(Arc::new(
            Sphere::new(point3(0.0, 0.0, 1.0), 0.5)
                .with_shading(Shading::new(Arc::new(Matte::solid(Color::white(), 0.0, false)))),
        ))
        .unwrap();
    scene.add_light(Box::new(
        DirectionalLight::new(vec3(0.0, 0.0, -1.0), Color::white()).unwrap(),
    ));
    let scene = finish(scene);
    // The floor right under the sphere is in its shadow.
    let ray = Ray::new(point3(1.2, 0.0, 0.4), vec3(-1.2, 0.0, -0.4));
    assert!(mean(&DirectTracer, &scene, ray, 4).is_black());
    let ray = Ray::new(point3(2.2, 0.0, 0.4), vec3(-1.2, 0.0, -0.4));
    assert!(!mean(&DirectTracer, &scene, ray, 4).is_black());
}

#[test]
fn box_casts_a_shadow_on_the_plane() {
    let preset = preset::sphere_over_plane().unwrap();
    let lit = mean(&DirectTracer, &preset.scene, Ray::new(point3(1.5, 0.0, 10.0), -Vec3::Z), 4000);
    let shadowed = mean(&DirectTracer, &preset.scene, Ray::new(point3(4.5, 0.0, 10.0), -Vec3::Z), 4000);
    assert!(lit.g > 0.005, "lit point reads {}", lit);
    assert!(shadowed.is_black(), "shadowed point reads {}", shadowed);
}

#[test]
fn camera_sees_emitter_directly() {
    let preset = preset::sphere_over_plane().unwrap();
    let ray = Ray::new(point3(0.0, 0.0, 10.0), -Vec3::Z);
    let value = mean(&DirectTracer, &preset.scene, ray, 1);
    assert_eq!(value, Color::white());
}

/// Uniform white sky around a single convex matte object: one bounce reflects `albedo`.
#[test]
fn white_furnace_sphere() {
    let albedo = 0.5;
    let mut scene = Scene::new();
    scene
        .add_shape(Arc::new(Sphere::new(Point3::ORIGIN, 1.0).with_shading(Shading::new(
            Arc::new(Matte::solid(Color::gray(albedo), 0.0, false)),
        ))))
        .unwrap();
    scene.add_light(Box::new(InfiniteLight::new(
        Image::filled(16, 8, Color::white()),
        1.0,
    )));
    let scene = finish(scene);

    let miss = mean(&PathTracer::default(), &scene, Ray::new(point3(3.0, 0.0, 5.0), -Vec3::Z), 4);
    assert!((miss.g - 1.0).abs() < 1e-4, "{}", miss);

    let path = PathTracer::default();
    let tracers: [&dyn Tracer; 2] = [&path, &DirectTracer];
    for tracer in tracers.iter() {
        let hit = mean(*tracer, &scene, down_at(0.0, 0.0), 20000);
        assert!((hit.g - albedo).abs() < 0.03, "{}", hit);
    }
}

#[test]
fn mirror_reflects_the_emitter() {
    let mut scene = Scene::new();
    let mirror = square(Shading::new(Arc::new(Mirror::new())));
    scene.add_mesh(mirror);
    scene
        .add_shape(Arc::new(Sphere::new(point3(0.0, 0.0, 3.0), 0.5).with_shading(
            Shading::glowing(Arc::new(Matte::solid(Color::black(), 0.0, false)), Color::gray(2.0)),
        )))
        .unwrap();
    let scene = finish(scene);

    // Bounces off the mirror at (0.5, 0, 0) towards the underside of the emitter.
    let ray = Ray::new(point3(1.0, 0.0, 2.0), vec3(-1.0, 0.0, -4.0));
    let value = mean(&PathTracer::default(), &scene, ray, 8);
    assert!((value.g - 2.0).abs() < 1e-3, "{}", value);
}

#[test]
fn ftl_credits_the_arrival_frame() {
    let mut scene = Scene::new();
    // Emitter 3 units away from the camera.
    scene
        .add_shape(Arc::new(Sphere::new(point3(0.0, 0.0, 4.0), 1.0).with_shading(
            Shading::glowing(Arc::new(Matte::solid(Color::black(), 0.0, false)), Color::white()),
        )))
        .unwrap();
    let scene = finish(scene);
    let tracer = FtlTracer::new(0, 0.0, 8, 2.0);
    let mut frames = vec![Color::black(); 8];
    tracer.trace_frames(
        &scene,
        Ray::new(Point3::ORIGIN, Vec3::Z),
        &mut UniformSampler2D::seeded(1),
        &TraceContext::disabled(),
        &mut frames,
    );
    // Lit during [3, 4) seconds of light travel, that is frames 6 and 7.
    for (i, frame) in frames.iter().enumerate() {
        let expected = if i >= 6 { 1.0 } else { 0.0 };
        assert!((frame.g - expected).abs() < 1e-4, "frame {}: {}", i, frame);
    }
    let total = tracer.trace(
        &scene,
        Ray::new(Point3::ORIGIN, Vec3::Z),
        &mut UniformSampler2D::seeded(1),
        &TraceContext::disabled(),
    );
    assert!((total.g - 2.0).abs() < 1e-4, "{}", total);
}

#[test]
fn ftl_with_negative_light_duration_is_dark() {
    let mut scene = Scene::new();
    scene
        .add_shape(Arc::new(Sphere::new(point3(0.0, 0.0, 4.0), 1.0).with_shading(
            Shading::glowing(Arc::new(Matte::solid(Color::black(), 0.0, false)), Color::white()),
        )))
        .unwrap();
    let scene = finish(scene);
    let mut tracer = FtlTracer::new(0, 0.0, 8, 2.0);
    tracer.light_duration = -1.0;
    let mut frames = vec![Color::black(); 8];
    tracer.trace_frames(
        &scene,
        Ray::new(Point3::ORIGIN, Vec3::Z),
        &mut UniformSampler2D::seeded(3),
        &TraceContext::disabled(),
        &mut frames,
    );
    assert!(frames.iter().all(|f| f.is_black()), "{:?}", frames);
}
