//! Multi-threaded render scheduler.
//!
//! A producer thread feeds pixel tasks, in bit-reversed stripe order, to a bounded queue drained
//! by a fixed pool of workers. Each pixel is rendered by exactly one worker, which draws all of
//! its samples and adds them to the film.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, Receiver, Sender};
use geometry::camera::Camera;
use itertools::iproduct;
use parking_lot::Mutex;
use radiometry::color::Color;
use sampling::{Sampler2D, StratifiedSampler2D, UniformSampler2D};
use scene::Scene;

use crate::film::FtlFilm;
use crate::integrator::{TraceContext, Tracer};
use crate::RenderError;

/// Capacity of the pixel task queue.
const QUEUE_CAPACITY: usize = 1000;
const MAX_STRIPES: usize = 32;

/// Sub-rectangle of the image, `[x1, x2) x [y1, y2)` in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub x1: usize,
    pub y1: usize,
    pub x2: usize,
    pub y2: usize,
}

impl Region {
    pub fn full(width: usize, height: usize) -> Self {
        Self {
            x1: 0,
            y1: 0,
            x2: width,
            y2: height,
        }
    }

    /// Parses `"x1,y1,x2,y2"`.
    pub fn parse(text: &str) -> Result<Self, RenderError> {
        let numbers = text
            .split(',')
            .map(|s| s.trim().parse::<usize>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| RenderError::Options(format!("region {:?}: {}", text, e)))?;
        match numbers.as_slice() {
            &[x1, y1, x2, y2] if x1 <= x2 && y1 <= y2 => Ok(Self { x1, y1, x2, y2 }),
            _ => Err(RenderError::Options(format!(
                "region {:?}: expected x1,y1,x2,y2 with x1 <= x2 and y1 <= y2",
                text
            ))),
        }
    }

    pub fn width(&self) -> usize {
        self.x2 - self.x1
    }
    pub fn height(&self) -> usize {
        self.y2 - self.y1
    }
    pub fn pixel_count(&self) -> usize {
        self.width() * self.height()
    }

    /// Clips the region to a `width x height` image.
    pub fn clipped(self, width: usize, height: usize) -> Self {
        let x2 = self.x2.min(width);
        let y2 = self.y2.min(height);
        Self {
            x1: self.x1.min(x2),
            y1: self.y1.min(y2),
            x2,
            y2,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RenderOptions {
    pub workers: usize,
    pub samples_per_pixel: usize,
    /// `None` renders the whole film.
    pub region: Option<Region>,
    /// Stratified sub-pixel positions instead of independent ones.
    pub stratified: bool,
    /// Pixel whose samples log every bounce.
    pub trace_pixel: Option<(usize, usize)>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            workers: thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            samples_per_pixel: 16,
            region: None,
            stratified: false,
            trace_pixel: None,
        }
    }
}

/// Visits `0..n` (`n` a power of 2) in bit-reversed order: 0, n/2, n/4, 3n/4, ...
pub fn bit_reversed_sequence(n: usize) -> Vec<usize> {
    let bits = n.trailing_zeros();
    (0..n)
        .map(|i| {
            if bits == 0 {
                0
            } else {
                i.reverse_bits() >> (usize::BITS - bits)
            }
        })
        .collect()
}

/// All pixels of `region`, row by row inside horizontal stripes, the stripes visited in
/// bit-reversed order. A partial render thus covers the whole image coarsely.
pub fn pixel_order(region: Region) -> Vec<(usize, usize)> {
    let height = region.height();
    if height == 0 || region.width() == 0 {
        return vec![];
    }
    // Largest power of 2 not above the height.
    let n_stripes = MAX_STRIPES.min(1 << (usize::BITS - 1 - height.leading_zeros()));
    let stripe_height = (height + n_stripes - 1) / n_stripes;
    let mut pixels = Vec::with_capacity(region.pixel_count());
    for stripe in bit_reversed_sequence(n_stripes) {
        let y_from = (stripe * stripe_height).min(height);
        let y_to = ((stripe + 1) * stripe_height).min(height);
        pixels.extend(iproduct!(y_from..y_to, region.x1..region.x2).map(|(y, x)| (x, y + region.y1)));
    }
    pixels
}

/// Weight of a sample at sub-pixel offset `(dx, dy)` in [0, 1)²: 1/2 at the center, 1/4 at the
/// corners.
pub fn sample_weight(dx: f32, dy: f32) -> f32 {
    0.5 - ((dx - 0.5) * (dy - 0.5)).abs()
}

struct Shared {
    samples_done: AtomicU64,
    total_samples: u64,
    finished: AtomicBool,
    /// One token per worker busy with a pixel; filled up by `pause()`.
    in_progress: (Sender<()>, Receiver<()>),
    paused: Mutex<bool>,
    workers: usize,
}

/// Control surface of a running render.
pub struct RenderHandle {
    shared: Arc<Shared>,
    coordinator: Option<JoinHandle<()>>,
}

impl RenderHandle {
    /// Fraction of the samples processed so far, in [0, 1].
    pub fn progress(&self) -> f32 {
        if self.shared.total_samples == 0 {
            return 1.0;
        }
        self.samples_done() as f32 / self.shared.total_samples as f32
    }

    pub fn samples_done(&self) -> u64 {
        self.shared.samples_done.load(Ordering::Acquire)
    }

    pub fn total_samples(&self) -> u64 {
        self.shared.total_samples
    }

    /// Returns once no worker is in the middle of a pixel; workers stay idle until `resume()`.
    /// Pausing twice is a no-op.
    pub fn pause(&self) {
        let mut paused = self.shared.paused.lock();
        if *paused {
            return;
        }
        for _ in 0..self.shared.workers {
            // The receiver lives in `shared`, so the channel cannot be disconnected.
            let _ = self.shared.in_progress.0.send(());
        }
        *paused = true;
    }

    pub fn resume(&self) {
        let mut paused = self.shared.paused.lock();
        if !*paused {
            return;
        }
        for _ in 0..self.shared.workers {
            let _ = self.shared.in_progress.1.recv();
        }
        *paused = false;
    }

    pub fn is_paused(&self) -> bool {
        *self.shared.paused.lock()
    }

    /// True once every pixel task was processed and the workers exited.
    pub fn done(&self) -> bool {
        self.shared.finished.load(Ordering::Acquire)
    }

    /// Blocks until the render completes. Returns the number of samples processed. A paused
    /// render is resumed first.
    pub fn wait(mut self) -> u64 {
        self.resume();
        if let Some(coordinator) = self.coordinator.take() {
            if coordinator.join().is_err() {
                log::error!("render coordinator panicked");
            }
        }
        self.samples_done()
    }
}

/// Everything one render needs. Shared with the workers.
pub struct RenderJob {
    pub scene: Arc<Scene>,
    pub tracer: Arc<dyn Tracer>,
    pub camera: Arc<dyn Camera>,
    pub film: Arc<FtlFilm>,
}

/// Starts rendering in the background.
pub fn start(job: RenderJob, options: RenderOptions) -> Result<RenderHandle, RenderError> {
    let (width, height) = (job.film.width(), job.film.height());
    if job.tracer.frame_count() != job.film.frame_count() {
        return Err(RenderError::Options(format!(
            "the tracer produces {} frames but the film holds {}",
            job.tracer.frame_count(),
            job.film.frame_count()
        )));
    }
    let region = options
        .region
        .unwrap_or_else(|| Region::full(width, height))
        .clipped(width, height);
    let workers = options.workers.max(1);
    let spp = options.samples_per_pixel;
    let shared = Arc::new(Shared {
        samples_done: AtomicU64::new(0),
        total_samples: (region.pixel_count() * spp) as u64,
        finished: AtomicBool::new(false),
        in_progress: bounded(workers),
        paused: Mutex::new(false),
        workers,
    });
    log::info!(
        "rendering {}x{} pixels at {} samples per pixel on {} workers",
        region.width(),
        region.height(),
        spp,
        workers
    );

    let (task_sender, task_receiver) = bounded::<(usize, usize)>(QUEUE_CAPACITY);
    let mut worker_handles = Vec::with_capacity(workers);
    for i in 0..workers {
        let tasks = task_receiver.clone();
        let job = RenderJob {
            scene: job.scene.clone(),
            tracer: job.tracer.clone(),
            camera: job.camera.clone(),
            film: job.film.clone(),
        };
        let shared = shared.clone();
        let handle = thread::Builder::new()
            .name(format!("render-worker-{}", i))
            .spawn(move || worker_loop(&job, &options, &shared, tasks))?;
        worker_handles.push(handle);
    }
    drop(task_receiver);

    let coordinator_shared = shared.clone();
    let coordinator = thread::Builder::new()
        .name("render-producer".to_string())
        .spawn(move || {
            for task in pixel_order(region) {
                if task_sender.send(task).is_err() {
                    log::error!("all render workers exited early");
                    break;
                }
            }
            drop(task_sender);
            for handle in worker_handles {
                if handle.join().is_err() {
                    log::error!("a render worker panicked");
                }
            }
            coordinator_shared.finished.store(true, Ordering::Release);
            log::info!(
                "render finished, {} samples",
                coordinator_shared.samples_done.load(Ordering::Acquire)
            );
        })?;

    Ok(RenderHandle {
        shared,
        coordinator: Some(coordinator),
    })
}

/// Renders synchronously.
pub fn render(job: RenderJob, options: RenderOptions) -> Result<u64, RenderError> {
    Ok(start(job, options)?.wait())
}

fn worker_loop(
    job: &RenderJob, options: &RenderOptions, shared: &Shared, tasks: Receiver<(usize, usize)>,
) {
    let spp = options.samples_per_pixel;
    let (width, height) = (job.film.width() as f32, job.film.height() as f32);
    let pixel_size = 1.0 / height;
    let mut pixel_sampler: Box<dyn Sampler2D> = if options.stratified {
        Box::new(StratifiedSampler2D::new(spp.max(1)))
    } else {
        Box::new(UniformSampler2D::new())
    };
    let mut sampler = UniformSampler2D::new();
    let n_frames = job.tracer.frame_count();
    let mut frames = vec![Color::black(); n_frames];

    loop {
        // Blocks while the render is paused.
        if shared.in_progress.0.send(()).is_err() {
            break;
        }
        let (px, py) = match tasks.recv() {
            Ok(task) => task,
            Err(_) => {
                let _ = shared.in_progress.1.recv();
                break;
            }
        };
        // Screen space: y up, x centered, one unit per image height.
        let x = (px as f32 - 0.5 * width) / height;
        let y = 0.5 - py as f32 / height;
        let verbose = options.trace_pixel == Some((px, py));
        pixel_sampler.start_pixel();
        for s in 0..spp {
            let (dx, dy) = pixel_sampler.next_2d();
            let ray = job
                .camera
                .generate_ray(x + pixel_size * (dx - 0.5), y + pixel_size * (dy - 0.5));
            let ctx = TraceContext::at((px, py), s, verbose);
            frames.iter_mut().for_each(|f| *f = Color::black());
            let traced = catch_unwind(AssertUnwindSafe(|| {
                job.tracer
                    .trace_frames(&job.scene, ray, &mut sampler, &ctx, &mut frames)
            }));
            if let Err(cause) = traced {
                let message = cause
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| cause.downcast_ref::<String>().cloned())
                    .unwrap_or_default();
                log::error!(
                    "panic at pixel [{}, {}], sample {}: {}\n{}",
                    px,
                    py,
                    s,
                    message,
                    std::backtrace::Backtrace::force_capture()
                );
                frames.iter_mut().for_each(|f| *f = Color::RED);
            }
            job.film.add_sample(px, py, &frames, sample_weight(dx, dy));
        }
        shared.samples_done.fetch_add(spp as u64, Ordering::AcqRel);
        let _ = shared.in_progress.1.recv();
    }
}
