use std::sync::Arc;
use std::time::Duration;

use geometry::{camera::Camera, ray::Ray};
use lyrender::film::FtlFilm;
use lyrender::image_io;
use lyrender::integrator::{DirectTracer, FtlTracer, TraceContext, Tracer};
use lyrender::render::{self, Region, RenderJob, RenderOptions};
use math::hcm::{point3, Vec3};
use parking_lot::Mutex;
use radiometry::color::Color;
use sampling::Sampler2D;
use scene::{preset, Scene};
use texture::Image;

fn job(tracer: Arc<dyn Tracer>, width: usize, height: usize) -> (RenderJob, Arc<FtlFilm>) {
    let preset = preset::sphere_over_plane().unwrap();
    let film = Arc::new(FtlFilm::new(width, height, tracer.frame_count()));
    let camera: Arc<dyn Camera> = Arc::from(preset.camera);
    (
        RenderJob {
            scene: Arc::new(preset.scene),
            tracer,
            camera,
            film: film.clone(),
        },
        film,
    )
}

fn options(workers: usize, spp: usize) -> RenderOptions {
    RenderOptions {
        workers,
        samples_per_pixel: spp,
        ..RenderOptions::default()
    }
}

#[test]
fn every_pixel_gets_all_its_samples() {
    let (job, film) = job(Arc::new(DirectTracer), 16, 12);
    let handle = render::start(job, options(4, 3)).unwrap();
    let total = handle.total_samples();
    let done = handle.wait();
    assert_eq!(total, 16 * 12 * 3);
    assert_eq!(done, total);
    for y in 0..12 {
        for x in 0..16 {
            assert_eq!(film.frame(0).sample_count(x, y), 3, "pixel ({}, {})", x, y);
            // Each sample weighs between 1/4 and 1/2.
            let weight = film.frame(0).weight_at(x, y);
            assert!((0.75..=1.5).contains(&weight), "pixel ({}, {}) weight {}", x, y, weight);
        }
    }
}

#[test]
fn handle_reports_completion() {
    let (job, _film) = job(Arc::new(DirectTracer), 8, 8);
    let handle = render::start(job, options(2, 2)).unwrap();
    while !handle.done() {
        std::thread::sleep(Duration::from_millis(5));
    }
    assert_eq!(handle.progress(), 1.0);
    assert_eq!(handle.wait(), 8 * 8 * 2);
}

#[test]
fn pause_freezes_progress_until_resumed() {
    let (job, film) = job(Arc::new(DirectTracer), 48, 32);
    let handle = render::start(job, options(3, 4)).unwrap();
    handle.pause();
    assert!(handle.is_paused());
    let frozen = handle.samples_done();
    std::thread::sleep(Duration::from_millis(50));
    assert_eq!(handle.samples_done(), frozen);
    // Pausing again must not block.
    handle.pause();

    // Every pixel is either untouched or complete while paused.
    for y in 0..32 {
        for x in 0..48 {
            let count = film.frame(0).sample_count(x, y);
            assert!(count == 0 || count == 4, "pixel ({}, {}) has {} samples", x, y, count);
        }
    }

    handle.resume();
    assert!(!handle.is_paused());
    assert_eq!(handle.wait(), 48 * 32 * 4);
}

#[test]
fn wait_resumes_a_paused_render() {
    let (job, _film) = job(Arc::new(DirectTracer), 8, 8);
    let handle = render::start(job, options(2, 1)).unwrap();
    handle.pause();
    assert_eq!(handle.wait(), 64);
}

#[test]
fn region_leaves_other_pixels_untouched() {
    let (job, film) = job(Arc::new(DirectTracer), 10, 8);
    let region = Region {
        x1: 2,
        y1: 3,
        x2: 7,
        y2: 6,
    };
    let options = RenderOptions {
        region: Some(region),
        ..options(2, 2)
    };
    assert_eq!(render::render(job, options).unwrap(), 5 * 3 * 2);
    for y in 0..8 {
        for x in 0..10 {
            let inside = (2..7).contains(&x) && (3..6).contains(&y);
            let count = film.frame(0).sample_count(x, y);
            assert_eq!(count, if inside { 2 } else { 0 }, "pixel ({}, {})", x, y);
            if !inside {
                assert_eq!(film.frame(0).value_at(x, y), Color::black());
            }
        }
    }
}

/// Panics on the left column, returns grey elsewhere.
struct FaultyTracer;

impl Tracer for FaultyTracer {
    fn trace(&self, _: &Scene, _: Ray, _: &mut dyn Sampler2D, ctx: &TraceContext) -> Color {
        if ctx.pixel.0 == 0 {
            panic!("faulty sample");
        }
        Color::gray(0.5)
    }
}

#[test]
fn panicking_samples_become_red() {
    let (job, film) = job(Arc::new(FaultyTracer), 4, 3);
    assert_eq!(render::render(job, options(2, 2)).unwrap(), 4 * 3 * 2);
    for y in 0..3 {
        let red = film.frame(0).value_at(0, y);
        assert!((red.r - 1.0).abs() < 1e-5 && red.g == 0.0 && red.b == 0.0, "{}", red);
        let grey = film.frame(0).value_at(2, y);
        assert!((grey.g - 0.5).abs() < 1e-5, "{}", grey);
    }
}

#[test]
fn film_must_match_the_tracer_frames() {
    let preset = preset::sphere_over_plane().unwrap();
    let job = RenderJob {
        scene: Arc::new(preset.scene),
        tracer: Arc::new(FtlTracer::new(0, 0.0, 5, 1.0)),
        camera: Arc::from(preset.camera),
        film: Arc::new(FtlFilm::new(4, 4, 1)),
    };
    assert!(render::start(job, options(1, 1)).is_err());
}

#[test]
fn ftl_render_fills_every_frame_film() {
    let (job, film) = job(Arc::new(FtlTracer::new(0, 0.0, 4, 2.0)), 6, 4);
    assert_eq!(render::render(job, options(2, 2)).unwrap(), 6 * 4 * 2);
    assert_eq!(film.frame_count(), 4);
    for i in 0..4 {
        assert_eq!(film.frame(i).sample_count(3, 2), 2);
    }
}

/// Puts the screen position into the ray origin.
struct ScreenCamera;

impl Camera for ScreenCamera {
    fn generate_ray(&self, x: f32, y: f32) -> Ray {
        Ray::new(point3(x, y, 0.0), Vec3::Z)
    }
}

/// Records the screen position of every sample it traces.
#[derive(Default)]
struct ScreenRecorder {
    samples: Mutex<Vec<((usize, usize), f32, f32)>>,
}

impl Tracer for ScreenRecorder {
    fn trace(&self, _: &Scene, ray: Ray, _: &mut dyn Sampler2D, ctx: &TraceContext) -> Color {
        self.samples.lock().push((ctx.pixel, ray.origin.x, ray.origin.y));
        Color::black()
    }
}

#[test]
fn stratified_samples_span_each_pixel() {
    let (width, height) = (6, 4);
    let recorder = Arc::new(ScreenRecorder::default());
    let job = RenderJob {
        scene: Arc::new(preset::sphere_over_plane().unwrap().scene),
        tracer: recorder.clone(),
        camera: Arc::new(ScreenCamera),
        film: Arc::new(FtlFilm::new(width, height, 1)),
    };
    let options = RenderOptions {
        stratified: true,
        ..options(2, 3)
    };
    assert_eq!(render::render(job, options).unwrap(), 6 * 4 * 3);

    // Three samples per pixel stratify into three columns, one sample each.
    let samples = recorder.samples.lock();
    for py in 0..height {
        for px in 0..width {
            let center = (px as f32 - 0.5 * width as f32) / height as f32;
            let mut offsets: Vec<f32> = samples
                .iter()
                .filter(|(pixel, _, _)| *pixel == (px, py))
                .map(|(_, x, _)| (x - center) * height as f32 + 0.5)
                .collect();
            offsets.sort_by(|a, b| a.partial_cmp(b).unwrap());
            assert_eq!(offsets.len(), 3);
            for (i, dx) in offsets.iter().enumerate() {
                let (lo, hi) = (i as f32 / 3.0, (i + 1) as f32 / 3.0);
                assert!(
                    *dx > lo - 1e-4 && *dx < hi + 1e-4,
                    "pixel ({}, {}) offsets {:?}",
                    px,
                    py,
                    offsets
                );
            }
        }
    }
}

#[test]
fn png_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.png");
    let image = Image::from_fn(5, 3, |x, y| Color::new(x as f32 / 4.0, y as f32 / 2.0, 0.25));
    image_io::save(&image, &path).unwrap();

    let loaded = Image::load_png(&path).unwrap();
    assert_eq!((loaded.width(), loaded.height()), (5, 3));
    // The file holds gamma-encoded values.
    let c = loaded.get(2, 1);
    assert!((c.r - 0.5f32.sqrt()).abs() < 0.01, "{}", c);
    assert!((c.b - 0.5).abs() < 0.01, "{}", c);
}

#[test]
fn exr_and_frames_are_written() {
    let dir = tempfile::tempdir().unwrap();
    let image = Image::filled(4, 4, Color::gray(2.5));
    let exr_path = dir.path().join("out.exr");
    image_io::save(&image, &exr_path).unwrap();
    assert!(std::fs::metadata(&exr_path).unwrap().len() > 0);

    let frames = vec![image.clone(), image.clone(), image];
    image_io::save_frames(&frames, dir.path().join("seq.png")).unwrap();
    for i in 0..3 {
        assert!(dir.path().join(format!("seq_{:03}.png", i)).exists());
    }
    assert!(!dir.path().join("seq.png").exists());

    assert!(image_io::save(&frames[0], dir.path().join("out.jpg")).is_err());
}
