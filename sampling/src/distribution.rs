use math::float::ONE_MINUS_EPSILON;

/// A piecewise-constant distribution over [0, 1) that mimics the shape of a histogram.
///
/// `pdf` has one density per bucket and `cdf` has one more entry than `pdf`; the cdf is
/// non-decreasing, starts at 0 and ends at exactly 1. A histogram that sums to zero yields the
/// uniform distribution (all densities 1).
#[derive(Debug, Clone)]
pub struct Distribution1D {
    pdf: Vec<f32>,
    cdf: Vec<f32>,
}

impl Distribution1D {
    /// Builds the distribution and returns it together with the histogram's sum.
    /// An empty histogram is treated as a single zero bucket.
    pub fn new(f: &[f32]) -> (Self, f32) {
        let f = if f.is_empty() { &[0.0][..] } else { f };
        let n = f.len();
        let mut cdf = Vec::with_capacity(n + 1);
        cdf.push(0.0f32);
        for v in f.iter() {
            cdf.push(cdf[cdf.len() - 1] + v);
        }
        let integral = cdf[n];
        let pdf = if integral == 0.0 {
            for (i, c) in cdf.iter_mut().enumerate() {
                *c = i as f32 / n as f32;
            }
            vec![1.0; n]
        } else {
            cdf.iter_mut().for_each(|c| *c /= integral);
            f.iter().map(|v| n as f32 * v / integral).collect()
        };
        cdf[n] = 1.0;
        (Self { pdf, cdf }, integral)
    }

    pub fn len(&self) -> usize {
        self.pdf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pdf.is_empty()
    }

    pub fn pdf(&self) -> &[f32] {
        &self.pdf
    }

    pub fn cdf(&self) -> &[f32] {
        &self.cdf
    }

    /// Density of the bucket containing `x` in [0, 1]. `x = 1` belongs to the last bucket.
    pub fn pdf_at(&self, x: f32) -> f32 {
        self.pdf[self.bucket_of(x)]
    }

    pub fn bucket_of(&self, x: f32) -> usize {
        ((x * self.len() as f32).max(0.0) as usize).min(self.len() - 1)
    }

    /// Maps a uniform `e` in [0, 1) to a position in [0, 1) distributed like the histogram.
    /// Returns the position and its density.
    pub fn sample(&self, e: f32) -> (f32, f32) {
        let e = e.clamp(0.0, ONE_MINUS_EPSILON);
        // The first cdf entry is 0, so at least one element satisfies the predicate.
        let offset = self
            .cdf
            .partition_point(|c| *c <= e)
            .saturating_sub(1)
            .min(self.len() - 1);
        let width = self.cdf[offset + 1] - self.cdf[offset];
        let delta = if width > 0.0 {
            (e - self.cdf[offset]) / width
        } else {
            0.0
        };
        let mut x = ((offset as f32 + delta) / self.len() as f32).min(ONE_MINUS_EPSILON);
        // Rounding may push x onto the next bucket's boundary.
        while x > 0.0 && self.bucket_of(x) > offset {
            x = f32::from_bits(x.to_bits() - 1);
        }
        (x, self.pdf[offset])
    }
}

/// A piecewise-constant distribution over [0, 1)² built from a row-major raster: a marginal
/// distribution over rows and one conditional distribution per row.
#[derive(Debug, Clone)]
pub struct Distribution2D {
    marginal: Distribution1D,
    conditional: Vec<Distribution1D>,
}

impl Distribution2D {
    /// `data` holds `height` rows of `width` values each.
    pub fn new(width: usize, height: usize, data: &[f32]) -> Self {
        let width = width.max(1);
        let (conditional, row_sums): (Vec<_>, Vec<_>) = (0..height.max(1))
            .map(|y| {
                let row = data.get(y * width..(y + 1) * width).unwrap_or(&[]);
                Distribution1D::new(row)
            })
            .unzip();
        let (marginal, _) = Distribution1D::new(&row_sums);
        Self {
            marginal,
            conditional,
        }
    }

    pub fn width(&self) -> usize {
        self.conditional[0].len()
    }
    pub fn height(&self) -> usize {
        self.marginal.len()
    }

    /// Draws a row from the marginal, then a column from that row. Returns `(x, y, pdf)`.
    pub fn sample(&self, e1: f32, e2: f32) -> (f32, f32, f32) {
        let (y, y_pdf) = self.marginal.sample(e1);
        let row = &self.conditional[self.marginal.bucket_of(y)];
        let (x, x_pdf) = row.sample(e2);
        (x, y, x_pdf * y_pdf)
    }

    /// Looks up the bucket of `(x, y)` without interpolation.
    pub fn pdf(&self, x: f32, y: f32) -> f32 {
        let yi = self.marginal.bucket_of(y);
        let row = &self.conditional[yi];
        self.marginal.pdf[yi] * row.pdf[row.bucket_of(x)]
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_sample_inverts_cdf() {
        let (d, integral) = Distribution1D::new(&[1.0, 0.0, 3.0]);
        assert_eq!(integral, 4.0);
        assert_eq!(d.cdf(), &[0.0, 0.25, 0.25, 1.0]);
        let (x, pdf) = d.sample(0.125);
        assert!((x - 1.0 / 6.0).abs() < 1e-6, "{}", x);
        assert_eq!(pdf, 0.75);
        // The empty bucket is skipped.
        let (x, pdf) = d.sample(0.25);
        assert!((x - 2.0 / 3.0).abs() < 1e-6, "{}", x);
        assert_eq!(pdf, 2.25);
        let (x, _) = d.sample(1.0);
        assert!(x < 1.0);
    }
}
