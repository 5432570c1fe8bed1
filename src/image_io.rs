use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use texture::Image;

use crate::RenderError;

/// 8-bit RGB, gamma-encoded and clamped to [0, 1].
pub fn write_png<P: AsRef<Path>>(image: &Image, path: P) -> Result<(), RenderError> {
    let file = File::create(path.as_ref())?;
    let w = BufWriter::new(file);
    let mut encoder = png::Encoder::new(w, image.width() as u32, image.height() as u32);
    encoder.set_color(png::ColorType::RGB);
    encoder.set_depth(png::BitDepth::Eight);
    let mut writer = encoder.write_header()?;

    let data: Vec<u8> = image
        .pixels()
        .iter()
        .flat_map(|c| c.gamma_encode().to_u8())
        .collect();
    writer.write_image_data(&data)?;
    Ok(())
}

/// Linear floating-point RGB.
pub fn write_exr<P: AsRef<Path>>(image: &Image, path: P) -> Result<(), RenderError> {
    exr::prelude::write_rgb_file(path.as_ref(), image.width(), image.height(), |x, y| {
        let c = image.get(x, y);
        (c.r, c.g, c.b)
    })?;
    Ok(())
}

/// Writes PNG or EXR depending on the extension of `path`.
pub fn save<P: AsRef<Path>>(image: &Image, path: P) -> Result<(), RenderError> {
    let path = path.as_ref();
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match extension.as_deref() {
        Some("png") => write_png(image, path),
        Some("exr") => write_exr(image, path),
        _ => Err(RenderError::Options(format!(
            "unsupported output format {}, expected .png or .exr",
            path.display()
        ))),
    }
}

/// `out.png` becomes `out_007.png` for frame 7.
pub fn frame_path(path: &Path, frame: usize) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match path.extension() {
        Some(ext) => format!("{}_{:03}.{}", stem, frame, ext.to_string_lossy()),
        None => format!("{}_{:03}", stem, frame),
    };
    path.with_file_name(name)
}

/// Saves one image per frame, numbered after `path`. A single frame is saved at `path` itself.
pub fn save_frames<P: AsRef<Path>>(images: &[Image], path: P) -> Result<(), RenderError> {
    let path = path.as_ref();
    if images.len() == 1 {
        return save(&images[0], path);
    }
    for (i, image) in images.iter().enumerate() {
        save(image, frame_path(path, i))?;
    }
    log::info!("saved {} frames after {}", images.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_frame_path() {
        assert_eq!(
            frame_path(Path::new("out/render.png"), 7),
            PathBuf::from("out/render_007.png")
        );
        assert_eq!(frame_path(Path::new("render"), 12), PathBuf::from("render_012"));
    }
}
