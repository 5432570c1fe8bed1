use rand::{rngs::StdRng, Rng, SeedableRng};

/// Produces a stream of points in [0, 1)².
pub trait Sampler2D {
    fn next_2d(&mut self) -> (f32, f32);

    /// Called before the samples of a new pixel are drawn.
    fn start_pixel(&mut self) {}
}

/// Independent uniform points.
pub struct UniformSampler2D {
    rng: StdRng,
}

impl UniformSampler2D {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for UniformSampler2D {
    fn default() -> Self {
        Self::new()
    }
}

impl Sampler2D for UniformSampler2D {
    fn next_2d(&mut self) -> (f32, f32) {
        (self.rng.gen(), self.rng.gen())
    }
}

/// Jittered samples over an `nx x ny` grid with `nx * ny = n` and `ny` the largest divisor of `n`
/// not above its square root. Cells are visited row by row (x first); after `n` samples, or on
/// `start_pixel`, the walk starts over from the first cell.
pub struct StratifiedSampler2D {
    rng: StdRng,
    nx: usize,
    ny: usize,
    x: usize,
    y: usize,
}

impl StratifiedSampler2D {
    pub fn new(n_samples: usize) -> Self {
        Self::with_rng(n_samples, StdRng::from_entropy())
    }
    pub fn seeded(n_samples: usize, seed: u64) -> Self {
        Self::with_rng(n_samples, StdRng::seed_from_u64(seed))
    }
    fn with_rng(n_samples: usize, rng: StdRng) -> Self {
        let n = n_samples.max(1);
        let root = (n as f64).sqrt() as usize;
        let ny = (1..=root).rev().find(|d| n % d == 0).unwrap_or(1);
        Self {
            rng,
            nx: n / ny,
            ny,
            x: 0,
            y: 0,
        }
    }

    pub fn grid(&self) -> (usize, usize) {
        (self.nx, self.ny)
    }
}

impl Sampler2D for StratifiedSampler2D {
    fn next_2d(&mut self) -> (f32, f32) {
        let x = (self.x as f32 + self.rng.gen::<f32>()) / self.nx as f32;
        let y = (self.y as f32 + self.rng.gen::<f32>()) / self.ny as f32;
        self.x += 1;
        if self.x >= self.nx {
            self.x = 0;
            self.y = (self.y + 1) % self.ny;
        }
        (x.min(math::float::ONE_MINUS_EPSILON), y.min(math::float::ONE_MINUS_EPSILON))
    }

    fn start_pixel(&mut self) {
        self.x = 0;
        self.y = 0;
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_stratified_covers_each_cell_once() {
        let mut sampler = StratifiedSampler2D::seeded(9, 7);
        let mut hits = [[0; 3]; 3];
        for _ in 0..9 {
            let (x, y) = sampler.next_2d();
            hits[(y * 3.0) as usize][(x * 3.0) as usize] += 1;
        }
        assert_eq!(hits, [[1; 3]; 3]);
        assert_eq!(StratifiedSampler2D::seeded(6, 0).grid(), (3, 2));
        assert_eq!(StratifiedSampler2D::seeded(7, 0).grid(), (7, 1));
        assert_eq!(StratifiedSampler2D::seeded(0, 0).grid(), (1, 1));
    }

    #[test]
    fn test_every_pixel_covers_the_whole_grid() {
        let mut sampler = StratifiedSampler2D::seeded(2, 7);
        // A stray draw must not shift the cells of the next pixel.
        sampler.next_2d();
        for _ in 0..4 {
            sampler.start_pixel();
            let (x0, y0) = sampler.next_2d();
            let (x1, y1) = sampler.next_2d();
            assert!(x0 < 0.5 && x1 >= 0.5, "{} {}", x0, x1);
            assert!((0.0..1.0).contains(&y0) && (0.0..1.0).contains(&y1));
        }

        let mut sampler = StratifiedSampler2D::seeded(6, 3);
        for _ in 0..3 {
            sampler.start_pixel();
            let mut hits = [[0; 3]; 2];
            for _ in 0..6 {
                let (x, y) = sampler.next_2d();
                hits[(y * 2.0) as usize][(x * 3.0) as usize] += 1;
            }
            assert_eq!(hits, [[1; 3]; 2]);
        }
    }
}
