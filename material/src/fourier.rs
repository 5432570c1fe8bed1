use crate::{BsdfSample, Material};
use geometry::{
    fourier::{FourierError, FourierTable},
    ray::Ray,
    SurfacePoint,
};
use math::{
    float::{find_interval, fourier_series, lerp, Float},
    hcm::{basis_around, spherical_cosines, vector_from_basis, Vec3},
};
use radiometry::color::Color;
use std::{f32::consts::PI, path::Path};

/// Measured material evaluated from a tabulated Fourier BSDF.
///
/// The table is indexed by zenith cosines of the directions reversed with respect to the
/// `Material` convention: `mu_i = -dir_in·n` and `mu_o = -dir_out·n`.
pub struct FourierMaterial {
    table: FourierTable,
}

impl FourierMaterial {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, FourierError> {
        Ok(Self::from_table(FourierTable::open(path)?))
    }

    pub fn from_table(table: FourierTable) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &FourierTable {
        &self.table
    }

    /// Bucket containing `mu`; the last knot belongs to the last bucket.
    fn bucket(&self, mu: f32) -> Option<usize> {
        let n = self.table.n_mu();
        self.table
            .find_bucket(mu)
            .or_else(|| Some(n - 2).filter(|_| self.table.mu.last() == Some(&mu)))
    }

    /// Series of one bucket pair, recombined from (luminance, red, blue) to RGB.
    fn series(&self, oo: usize, oi: usize, cos_phi: f32) -> (f32, f32, f32) {
        let c = self.table.coefficients(oo, oi);
        (
            fourier_series(c.y, cos_phi),
            fourier_series(c.r, cos_phi),
            fourier_series(c.b, cos_phi),
        )
    }

    /// Probability of picking incident bucket `oi` for outgoing bucket `oo`, and the cdf row.
    fn bucket_prob(&self, oo: usize, oi: usize) -> Option<f32> {
        let row = self.table.cdf_row(oo);
        let max = *row.last()?;
        let d_cdf = row.get(oi + 1)? - row[oi];
        let width = self.table.mu[oi + 1] - self.table.mu[oi];
        if !(max > 0.0) || !(d_cdf > 0.0) || !(width > 0.0) {
            return None;
        }
        Some(d_cdf / max / width)
    }
}

impl Material for FourierMaterial {
    fn bsdf(&self, hit: &SurfacePoint, dir_in: Vec3, dir_out: Vec3) -> Color {
        let (dir_in, dir_out) = match (dir_in.try_hat(), dir_out.try_hat()) {
            (Some(i), Some(o)) => (-i, -o),
            _ => return Color::black(),
        };
        let (mu_i, mu_o, cos_phi) = spherical_cosines(hit.normal, dir_in, dir_out);
        let (oi, oo) = match (self.bucket(mu_i), self.bucket(mu_o)) {
            (Some(oi), Some(oo)) => (oi, oo),
            _ => return Color::black(),
        };
        let mu = &self.table.mu;
        let weights = |i: usize, x: f32| {
            let t = (x - mu[i]) / (mu[i + 1] - mu[i]);
            [(i, 1.0 - t), (i + 1, t)]
        };

        let (mut y, mut r, mut b) = (0.0, 0.0, 0.0);
        for (o, wo) in weights(oo, mu_o).iter() {
            for (i, wi) in weights(oi, mu_i).iter() {
                let w = wo * wi;
                if w == 0.0 {
                    continue;
                }
                let (sy, sr, sb) = self.series(*o, *i, cos_phi);
                y += sy * w;
                r += sr * w;
                b += sb * w;
            }
        }
        let g = 1.39829 * y - 0.100913 * b - 0.297375 * r;
        let scale = mu_i.abs().weak_recip();
        let color = Color::new(r.max(0.0), g.max(0.0), b.max(0.0)) * scale;
        if color.is_finite() {
            color
        } else {
            Color::black()
        }
    }

    fn pdf(&self, hit: &SurfacePoint, dir_in: Vec3, dir_out: Vec3) -> f32 {
        let (dir_in, dir_out) = match (dir_in.try_hat(), dir_out.try_hat()) {
            (Some(i), Some(o)) => (i, o),
            _ => return 0.0,
        };
        let mu_o = -dir_out.dot(hit.normal);
        let mu_i = -dir_in.dot(hit.normal);
        if mu_o < 0.0 {
            return 0.0;
        }
        match (self.bucket(mu_o), self.bucket(mu_i)) {
            (Some(oo), Some(oi)) => self.bucket_prob(oo, oi).unwrap_or(0.0) / (2.0 * PI),
            _ => 0.0,
        }
    }

    fn bsdf_sample(&self, hit: &SurfacePoint, dir_out: Vec3) -> BsdfSample {
        let dir_out = match dir_out.try_hat() {
            Some(d) => d,
            None => return BsdfSample::dead(hit),
        };
        let mu_o = -dir_out.dot(hit.normal);
        if mu_o < 0.0 {
            return BsdfSample::dead(hit);
        }
        let oo = match self.bucket(mu_o) {
            Some(oo) => oo,
            None => return BsdfSample::dead(hit),
        };

        let row = self.table.cdf_row(oo);
        let max = row[row.len() - 1];
        let e = rand::random::<f32>() * max;
        let oi = match find_interval(row, e).filter(|oi| oi + 1 < row.len()) {
            Some(oi) => oi,
            None => return BsdfSample::dead(hit),
        };
        let prob = match self.bucket_prob(oo, oi) {
            Some(p) => p / (2.0 * PI),
            None => return BsdfSample::dead(hit),
        };
        let t = (e - row[oi]) / (row[oi + 1] - row[oi]);
        let mu_i = -lerp(self.table.mu[oi], self.table.mu[oi + 1], t);

        let azimuth = rand::random::<f32>() * 2.0 * PI;
        let sin_in = 1.0f32.cathetus(mu_i);
        let local = Vec3::new(sin_in * azimuth.cos(), sin_in * azimuth.sin(), mu_i);
        let (bx, by) = basis_around(hit.normal);
        let dir_in = vector_from_basis(local, (bx, by, hit.normal));
        BsdfSample {
            bsdf: self.bsdf(hit, dir_in, dir_out),
            ray: Ray::new(hit.pos, dir_in),
            prob,
            specular: false,
        }
    }

    fn summary(&self) -> String {
        format!(
            "Fourier{{eta = {}, buckets = {}, channels = {}}}",
            self.table.eta,
            self.table.n_mu(),
            self.table.n_channels
        )
    }
}
