use parking_lot::Mutex;
use radiometry::color::Color;
use texture::Image;

#[derive(Debug, Clone, Copy, Default)]
struct Cell {
    sum: Color,
    weight: f32,
    count: u32,
}

/// Accumulates weighted radiance samples per pixel.
///
/// Samples for one pixel come from the single worker that owns the pixel task, so the per-cell
/// locks are never contended.
pub struct Film {
    width: usize,
    height: usize,
    cells: Vec<Mutex<Cell>>,
}

impl Film {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: (0..width * height).map(|_| Mutex::new(Cell::default())).collect(),
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }
    pub fn height(&self) -> usize {
        self.height
    }

    fn cell(&self, x: usize, y: usize) -> &Mutex<Cell> {
        assert!(
            x < self.width && y < self.height,
            "pixel ({}, {}) outside a {}x{} film",
            x,
            y,
            self.width,
            self.height
        );
        &self.cells[y * self.width + x]
    }

    pub fn add_sample(&self, x: usize, y: usize, value: Color, weight: f32) {
        let mut cell = self.cell(x, y).lock();
        cell.sum += value * weight;
        cell.weight += weight;
        cell.count += 1;
    }

    /// Weighted mean of the samples; black where nothing was accumulated.
    pub fn value_at(&self, x: usize, y: usize) -> Color {
        let cell = *self.cell(x, y).lock();
        if cell.weight > 0.0 {
            cell.sum / cell.weight
        } else {
            Color::black()
        }
    }

    pub fn weight_at(&self, x: usize, y: usize) -> f32 {
        self.cell(x, y).lock().weight
    }

    pub fn sample_count(&self, x: usize, y: usize) -> u32 {
        self.cell(x, y).lock().count
    }

    pub fn to_image(&self) -> Image {
        Image::from_fn(self.width, self.height, |x, y| self.value_at(x, y))
    }
}

/// One film per time frame, for time-resolved rendering.
pub struct FtlFilm {
    frames: Vec<Film>,
}

impl FtlFilm {
    pub fn new(width: usize, height: usize, n_frames: usize) -> Self {
        Self {
            frames: (0..n_frames.max(1)).map(|_| Film::new(width, height)).collect(),
        }
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn frame(&self, i: usize) -> &Film {
        &self.frames[i]
    }

    pub fn width(&self) -> usize {
        self.frames[0].width()
    }
    pub fn height(&self) -> usize {
        self.frames[0].height()
    }

    /// Adds one value per frame, all with the same weight.
    pub fn add_sample(&self, x: usize, y: usize, values: &[Color], weight: f32) {
        for (film, value) in self.frames.iter().zip(values.iter()) {
            film.add_sample(x, y, *value, weight);
        }
    }

    pub fn to_images(&self) -> Vec<Image> {
        self.frames.iter().map(|f| f.to_image()).collect()
    }
}
