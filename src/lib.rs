pub mod cli_options;
pub mod film;
pub mod image_io;
pub mod integrator;
pub mod render;

pub use film::{Film, FtlFilm};
pub use integrator::{DirectTracer, FtlTracer, PathTracer, TraceContext, Tracer};
pub use render::{Region, RenderHandle, RenderJob, RenderOptions};

#[derive(thiserror::Error, Debug)]
pub enum RenderError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("png encoding failed: {0}")]
    Png(#[from] png::EncodingError),
    #[error("exr encoding failed: {0}")]
    Exr(#[from] exr::error::Error),
    #[error("{0}")]
    Options(String),
    #[error("unknown scene {0:?}")]
    UnknownPreset(String),
    #[error(transparent)]
    Scene(#[from] scene::SceneError),
}
