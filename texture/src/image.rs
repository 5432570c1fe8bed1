use std::{fs::File, io::BufReader, path::Path};

use radiometry::color::Color;
use rayon::prelude::*;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("PNG decoding failed: {0}")]
    Decode(#[from] png::DecodingError),

    #[error("unsupported image: {0}")]
    Unsupported(String),
}

/// Row-major raster of linear RGB values. Pixel `(x, y)` covers `[x, x+1) x [y, y+1)` in image
/// coordinates; row 0 is the top of the picture.
#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    width: usize,
    height: usize,
    data: Vec<Color>,
}

impl Image {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![Color::black(); width * height],
        }
    }

    pub fn filled(width: usize, height: usize, color: Color) -> Self {
        Self {
            width,
            height,
            data: vec![color; width * height],
        }
    }

    /// Builds an image by evaluating `f(x, y)` for every pixel.
    pub fn from_fn<F>(width: usize, height: usize, f: F) -> Self
    where
        F: Fn(usize, usize) -> Color + Sync,
    {
        let data = (0..width * height)
            .into_par_iter()
            .map(|i| f(i % width, i / width))
            .collect();
        Self {
            width,
            height,
            data,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }
    pub fn height(&self) -> usize {
        self.height
    }
    pub fn pixels(&self) -> &[Color] {
        &self.data
    }

    pub fn get(&self, x: usize, y: usize) -> Color {
        self.data[y * self.width + x]
    }
    pub fn set(&mut self, x: usize, y: usize, c: Color) {
        self.data[y * self.width + x] = c;
    }

    /// Bilinear lookup at continuous image coordinates. Coordinates outside the raster are
    /// clamped to the border pixels.
    pub fn at(&self, x: f32, y: f32) -> Color {
        if self.data.is_empty() {
            return Color::black();
        }
        let clamp = |v: f32, n: usize| -> (usize, f32) {
            let i = (v.max(0.0) as usize).min(n - 1);
            let k = if i + 1 < n { (v - i as f32).clamp(0.0, 1.0) } else { 0.0 };
            (i, k)
        };
        let (ix, kx) = clamp(x, self.width);
        let (iy, ky) = clamp(y, self.height);
        let ix1 = (ix + 1).min(self.width - 1);
        let iy1 = (iy + 1).min(self.height - 1);
        let top = self.get(ix, iy) * (1.0 - kx) + self.get(ix1, iy) * kx;
        let bottom = self.get(ix, iy1) * (1.0 - kx) + self.get(ix1, iy1) * kx;
        top * (1.0 - ky) + bottom * ky
    }

    /// Lookup by texture coordinates; `u` and `v` wrap into [0, 1).
    pub fn at_uv(&self, u: f32, v: f32) -> Color {
        let wrap = |t: f32| {
            let t = t.fract();
            if t < 0.0 {
                t + 1.0
            } else {
                t
            }
        };
        self.at(
            wrap(u) * self.width as f32,
            wrap(v) * self.height as f32,
        )
    }

    /// Area-weighted box filter to a smaller resolution. Each target pixel averages the source
    /// pixels it covers, with fractional weights on the borders.
    pub fn downscale(&self, width: usize, height: usize) -> Self {
        let (width, height) = (width.max(1), height.max(1));
        let sx = self.width as f32 / width as f32;
        let sy = self.height as f32 / height as f32;
        // Source index ranges with the covered fraction of each index.
        let spans = |start: f32, end: f32, n: usize| -> Vec<(usize, f32)> {
            let first = start.floor() as usize;
            let last = (end.ceil() as usize).min(n);
            (first..last)
                .map(|i| {
                    let lo = start.max(i as f32);
                    let hi = end.min(i as f32 + 1.0);
                    (i, (hi - lo).max(0.0))
                })
                .collect()
        };
        Self::from_fn(width, height, |x, y| {
            let xs = spans(x as f32 * sx, (x + 1) as f32 * sx, self.width);
            let ys = spans(y as f32 * sy, (y + 1) as f32 * sy, self.height);
            let mut sum = Color::black();
            let mut weight = 0.0;
            for (j, wy) in ys.iter() {
                for (i, wx) in xs.iter() {
                    sum += self.get(*i, *j) * (wx * wy);
                    weight += wx * wy;
                }
            }
            if weight > 0.0 {
                sum / weight
            } else {
                Color::black()
            }
        })
    }

    /// Downscales the image, keeping its aspect ratio, so that it fits in `width x height`.
    /// Images that already fit are returned unchanged.
    pub fn fit_in_rectangle(&self, width: usize, height: usize) -> Self {
        if self.width <= width && self.height <= height {
            return self.clone();
        }
        let ratio = self.width as f32 / self.height as f32;
        if ratio > width as f32 / height as f32 {
            self.downscale(width, (width as f32 / ratio) as usize)
        } else {
            self.downscale((height as f32 * ratio) as usize, height)
        }
    }

    /// Per-pixel luminance plane.
    pub fn luminance(&self) -> Vec<f32> {
        self.data.par_iter().map(|c| c.luminance()).collect()
    }

    pub fn scaled(&self, k: f32) -> Self {
        Self {
            data: self.data.par_iter().map(|c| *c * k).collect(),
            ..self.clone()
        }
    }

    /// Average of all channel values of all pixels.
    pub fn channel_mean(&self) -> f32 {
        if self.data.is_empty() {
            return 0.0;
        }
        self.data.iter().map(|c| c.power()).sum::<f32>() / (3 * self.data.len()) as f32
    }

    /// Loads an 8-bit grayscale, RGB or RGBA PNG file. Values are mapped linearly into [0, 1].
    pub fn load_png<P: AsRef<Path>>(path: P) -> Result<Image, ImageError> {
        let decoder = png::Decoder::new(BufReader::new(File::open(path)?));
        let (info, mut reader) = decoder.read_info()?;
        let mut buf = vec![0; info.buffer_size()];
        reader.next_frame(&mut buf)?;

        if info.bit_depth != png::BitDepth::Eight {
            return Err(ImageError::Unsupported(format!(
                "bit depth {:?}",
                info.bit_depth
            )));
        }
        let num_channels = match info.color_type {
            png::ColorType::Grayscale => 1,
            png::ColorType::GrayscaleAlpha => 2,
            png::ColorType::RGB => 3,
            png::ColorType::RGBA => 4,
            png::ColorType::Indexed => {
                return Err(ImageError::Unsupported("indexed colors".to_owned()))
            }
        };
        let (width, height) = (info.width as usize, info.height as usize);
        let data: Vec<Color> = buf
            .chunks(num_channels)
            .take(width * height)
            .map(|px| match num_channels {
                1 | 2 => Color::gray(px[0] as f32 / 255.0),
                _ => Color::rgb(px[0], px[1], px[2]),
            })
            .collect();
        if data.len() != width * height {
            return Err(ImageError::Unsupported(format!(
                "{} pixels decoded for a {}x{} image",
                data.len(),
                width,
                height
            )));
        }
        Ok(Image {
            width,
            height,
            data,
        })
    }
}
