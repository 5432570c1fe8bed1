use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use indicatif::{ProgressBar, ProgressStyle};

use lyrender::cli_options::{self, CliOptions, TracerKind};
use lyrender::film::FtlFilm;
use lyrender::image_io;
use lyrender::integrator::{DirectTracer, FtlTracer, PathTracer, Tracer};
use lyrender::render::{self, RenderHandle, RenderJob, RenderOptions};
use lyrender::RenderError;

const POLL_INTERVAL: Duration = Duration::from_millis(200);
const LOG_INTERVAL: Duration = Duration::from_secs(10);

fn format_duration(d: Duration) -> String {
    let secs = d.as_secs();
    format!("{}:{:02}:{:02}", secs / 3600, secs / 60 % 60, secs % 60)
}

/// Waits for the render to finish, reporting progress and saving partial results on the way.
fn monitor(
    handle: &RenderHandle, film: &FtlFilm, out: &Path, save_interval: Option<Duration>,
) -> Result<(), RenderError> {
    let bar = ProgressBar::new(handle.total_samples());
    bar.set_style(
        ProgressStyle::default_bar()
            .template("{spinner} [{bar:40.cyan/blue}] {percent:>3}% ({elapsed_precise}|{eta})")
            .progress_chars("=> "),
    );
    let start_time = Instant::now();
    let mut last_log = start_time;
    let mut last_save = start_time;
    while !handle.done() {
        std::thread::sleep(POLL_INTERVAL);
        bar.set_position(handle.samples_done());

        let now = Instant::now();
        if now.duration_since(last_log) >= LOG_INTERVAL {
            last_log = now;
            let progress = handle.progress();
            let elapsed = now.duration_since(start_time);
            let eta = if progress > 0.0 {
                elapsed.mul_f32((1.0 - progress) / progress)
            } else {
                Duration::ZERO
            };
            log::info!(
                "{:.1}% done, elapsed {}, remaining {}",
                progress * 100.0,
                format_duration(elapsed),
                format_duration(eta)
            );
        }
        if let Some(interval) = save_interval {
            if now.duration_since(last_save) >= interval && !handle.done() {
                last_save = now;
                handle.pause();
                let saved = image_io::save_frames(&film.to_images(), out);
                handle.resume();
                saved?;
                log::info!("saved intermediate result to {}", out.display());
            }
        }
    }
    bar.finish();
    log::info!("rendered in {}", format_duration(start_time.elapsed()));
    Ok(())
}

fn run(options: CliOptions) -> Result<(), RenderError> {
    let preset = scene::preset::by_name(&options.scene_name)
        .ok_or_else(|| RenderError::UnknownPreset(options.scene_name.clone()))??;

    let tracer: Arc<dyn Tracer> = match options.tracer {
        TracerKind::Path => Arc::new(PathTracer::new(options.min_depth, options.termination_prob)),
        TracerKind::Direct => Arc::new(DirectTracer),
        TracerKind::Ftl => Arc::new(FtlTracer::new(
            options.min_depth,
            options.termination_prob,
            options.frames,
            options.fps,
        )),
    };
    let film = Arc::new(FtlFilm::new(
        options.width,
        options.height,
        tracer.frame_count(),
    ));
    let job = RenderJob {
        scene: Arc::new(preset.scene),
        tracer,
        camera: Arc::from(preset.camera),
        film: film.clone(),
    };
    let mut render_options = RenderOptions {
        samples_per_pixel: options.spp,
        region: options.region,
        stratified: options.stratified,
        trace_pixel: options.trace_pixel,
        ..RenderOptions::default()
    };
    if options.threads > 0 {
        render_options.workers = options.threads;
    }

    let out = Path::new(&options.out);
    // Rejects bad output names before spending time on the render.
    match out.extension().and_then(|e| e.to_str()) {
        Some("png") | Some("exr") => {}
        _ => {
            return Err(RenderError::Options(format!(
                "output {} must end in .png or .exr",
                options.out
            )))
        }
    }

    let handle = render::start(job, render_options)?;
    let save_interval = match options.save_interval {
        0 => None,
        s => Some(Duration::from_secs(s)),
    };
    let monitored = monitor(&handle, &film, out, save_interval);
    let samples = handle.wait();
    monitored?;
    log::info!("{} samples traced", samples);

    image_io::save_frames(&film.to_images(), out)?;
    log::info!("image saved to {}", out.display());
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let options = match cli_options::parse_args(std::env::args().collect()) {
        Ok(options) => options,
        Err(e) => {
            eprintln!("{}\nUsage: {}", e, CliOptions::message());
            std::process::exit(1);
        }
    };
    if options.help {
        println!("Usage: {}", CliOptions::message());
        return;
    }
    if let Err(e) = run(options) {
        log::error!("{}", e);
        std::process::exit(1);
    }
}
