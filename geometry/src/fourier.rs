use std::{
    convert::TryFrom,
    fs::File,
    io::{BufReader, Read},
    path::Path,
};

use byteorder::{ByteOrder, LittleEndian, ReadBytesExt};
use math::float::find_interval;
use thiserror::Error;

const MAGIC: &[u8; 8] = b"SCATFUN\x01";

#[derive(Error, Debug)]
pub enum FourierError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("not a Fourier BSDF table: bad magic bytes")]
    InvalidMagic,

    #[error("unsupported table: flags = {flags}, channels = {channels}, bases = {bases}")]
    Unsupported { flags: i32, channels: i32, bases: i32 },

    #[error("invalid table layout: {0}")]
    InvalidStructure(String),
}

/// Measured BSDF tabulated as Fourier cosine series over pairs of zenith-cosine buckets.
///
/// Bucket pair `(oo, oi)` refers to the outgoing bucket `mu[oo] <= mu_o < mu[oo + 1]` and the
/// incident bucket `mu[oi] <= mu_i < mu[oi + 1]`. Its coefficients start at `a[offset]`: `m`
/// luminance terms, then (for 3-channel tables) `m` red and `m` blue terms.
#[derive(Debug, Clone)]
pub struct FourierTable {
    pub eta: f32,
    pub m_max: f32,
    pub n_channels: usize,
    pub mu: Vec<f32>,
    /// Flattened `n_mu x n_mu` cumulative sums of the zeroth-order coefficients, one row per
    /// outgoing bucket.
    pub cdf: Vec<f32>,
    orders: Vec<usize>,
    offsets: Vec<usize>,
    a: Vec<f32>,
    pub a0: Vec<f32>,
}

/// The three channel series of one bucket pair. `r` and `b` alias `y` for monochrome tables.
pub struct Coefficients<'a> {
    pub y: &'a [f32],
    pub r: &'a [f32],
    pub b: &'a [f32],
}

/// Reads `count` 4-byte values. The buffer grows with the data actually read, so a header that
/// announces more values than the file holds fails with an I/O error instead of allocating them.
fn read_words<R: Read>(reader: &mut R, count: usize) -> Result<Vec<u8>, FourierError> {
    let len = count
        .checked_mul(4)
        .ok_or_else(|| FourierError::InvalidStructure(format!("{} values overflow", count)))?;
    let mut bytes = Vec::new();
    Read::take(&mut *reader, len as u64).read_to_end(&mut bytes)?;
    if bytes.len() != len {
        return Err(FourierError::Io(std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            format!("expected {} values, found {}", count, bytes.len() / 4),
        )));
    }
    Ok(bytes)
}

fn read_f32s<R: Read>(reader: &mut R, count: usize) -> Result<Vec<f32>, FourierError> {
    let bytes = read_words(reader, count)?;
    let mut values = vec![0.0f32; count];
    LittleEndian::read_f32_into(&bytes, &mut values);
    Ok(values)
}

fn read_i32s<R: Read>(reader: &mut R, count: usize) -> Result<Vec<i32>, FourierError> {
    let bytes = read_words(reader, count)?;
    let mut values = vec![0i32; count];
    LittleEndian::read_i32_into(&bytes, &mut values);
    Ok(values)
}

fn non_negative(value: i32, what: &str) -> Result<usize, FourierError> {
    usize::try_from(value)
        .map_err(|_| FourierError::InvalidStructure(format!("negative {}: {}", what, value)))
}

impl FourierTable {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, FourierError> {
        let file = File::open(path)?;
        Self::read(&mut BufReader::new(file))
    }

    pub fn read<R: Read>(reader: &mut R) -> Result<Self, FourierError> {
        let mut magic = [0u8; 8];
        reader.read_exact(&mut magic)?;
        if &magic != MAGIC {
            return Err(FourierError::InvalidMagic);
        }
        let flags = reader.read_i32::<LittleEndian>()?;
        let n_mu = reader.read_i32::<LittleEndian>()?;
        let n_coeffs = reader.read_i32::<LittleEndian>()?;
        let m_max = reader.read_f32::<LittleEndian>()?;
        let n_channels = reader.read_i32::<LittleEndian>()?;
        let n_bases = reader.read_i32::<LittleEndian>()?;
        read_i32s(reader, 3)?;
        let eta = reader.read_f32::<LittleEndian>()?;
        read_i32s(reader, 4)?;

        if flags != 1 || !(n_channels == 1 || n_channels == 3) || n_bases != 1 {
            return Err(FourierError::Unsupported {
                flags,
                channels: n_channels,
                bases: n_bases,
            });
        }
        let n_mu = non_negative(n_mu, "bucket count")?;
        let n_coeffs = non_negative(n_coeffs, "coefficient count")?;
        let n_channels = n_channels as usize;
        if n_mu < 2 {
            return Err(FourierError::InvalidStructure(format!(
                "need at least 2 buckets, got {}",
                n_mu
            )));
        }

        let n_pairs = n_mu
            .checked_mul(n_mu)
            .filter(|n| n.checked_mul(2).is_some())
            .ok_or_else(|| {
                FourierError::InvalidStructure(format!("{} buckets overflow", n_mu))
            })?;

        let mu = read_f32s(reader, n_mu)?;
        let cdf = read_f32s(reader, n_pairs)?;
        let offset_and_length = read_i32s(reader, 2 * n_pairs)?;
        let a = read_f32s(reader, n_coeffs)?;

        let mut orders = Vec::with_capacity(n_pairs);
        let mut offsets = Vec::with_capacity(n_pairs);
        let mut a0 = Vec::with_capacity(n_pairs);
        for pair in offset_and_length.chunks_exact(2) {
            let offset = non_negative(pair[0], "coefficient offset")?;
            let length = non_negative(pair[1], "coefficient count")?;
            let end = length
                .checked_mul(n_channels)
                .and_then(|n| n.checked_add(offset));
            if end.map_or(true, |end| end > n_coeffs) {
                return Err(FourierError::InvalidStructure(format!(
                    "coefficients [{}, {}) x {} exceed the array of {}",
                    offset,
                    offset.saturating_add(length),
                    n_channels,
                    n_coeffs
                )));
            }
            a0.push(if length > 0 { a[offset] } else { 0.0 });
            orders.push(length);
            offsets.push(offset);
        }

        Ok(Self {
            eta,
            m_max,
            n_channels,
            mu,
            cdf,
            orders,
            offsets,
            a,
            a0,
        })
    }

    pub fn n_mu(&self) -> usize {
        self.mu.len()
    }

    /// Returns `i` with `mu[i] <= x < mu[i + 1]`. `None` if `x` lies outside the tabulated range
    /// or on its last knot.
    pub fn find_bucket(&self, x: f32) -> Option<usize> {
        find_interval(&self.mu, x).filter(|i| i + 1 < self.n_mu())
    }

    pub fn coefficients(&self, oo: usize, oi: usize) -> Coefficients<'_> {
        let pos = oo * self.n_mu() + oi;
        let (offset, m) = (self.offsets[pos], self.orders[pos]);
        let y = &self.a[offset..offset + m];
        if self.n_channels == 3 {
            Coefficients {
                y,
                r: &self.a[offset + m..offset + 2 * m],
                b: &self.a[offset + 2 * m..offset + 3 * m],
            }
        } else {
            Coefficients { y, r: y, b: y }
        }
    }

    /// The cumulative row used to pick an incident bucket for outgoing bucket `oo`.
    pub fn cdf_row(&self, oo: usize) -> &[f32] {
        let n = self.n_mu();
        let row = (oo + 1).min(n - 1);
        &self.cdf[row * n..(row + 1) * n]
    }

    /// Serializes the table in the same binary layout `read()` accepts.
    pub fn write<W: std::io::Write>(&self, writer: &mut W) -> Result<(), FourierError> {
        use byteorder::WriteBytesExt;
        writer.write_all(MAGIC)?;
        writer.write_i32::<LittleEndian>(1)?;
        writer.write_i32::<LittleEndian>(self.n_mu() as i32)?;
        writer.write_i32::<LittleEndian>(self.a.len() as i32)?;
        writer.write_f32::<LittleEndian>(self.m_max)?;
        writer.write_i32::<LittleEndian>(self.n_channels as i32)?;
        writer.write_i32::<LittleEndian>(1)?;
        for _ in 0..3 {
            writer.write_i32::<LittleEndian>(0)?;
        }
        writer.write_f32::<LittleEndian>(self.eta)?;
        for _ in 0..4 {
            writer.write_i32::<LittleEndian>(0)?;
        }
        for v in self.mu.iter().chain(self.cdf.iter()) {
            writer.write_f32::<LittleEndian>(*v)?;
        }
        for (offset, length) in self.offsets.iter().zip(self.orders.iter()) {
            writer.write_i32::<LittleEndian>(*offset as i32)?;
            writer.write_i32::<LittleEndian>(*length as i32)?;
        }
        for v in self.a.iter() {
            writer.write_f32::<LittleEndian>(*v)?;
        }
        Ok(())
    }

    /// Builds a table from raw arrays. `offsets_and_lengths` holds one `(offset, m)` pair per
    /// bucket pair in `oo`-major order.
    pub fn from_parts(
        eta: f32,
        n_channels: usize,
        mu: Vec<f32>,
        cdf: Vec<f32>,
        offsets_and_lengths: Vec<(usize, usize)>,
        a: Vec<f32>,
    ) -> Result<Self, FourierError> {
        let n = mu.len();
        if n < 2 || cdf.len() != n * n || offsets_and_lengths.len() != n * n {
            return Err(FourierError::InvalidStructure(format!(
                "{} buckets with {} cdf entries and {} coefficient ranges",
                n,
                cdf.len(),
                offsets_and_lengths.len()
            )));
        }
        if !(n_channels == 1 || n_channels == 3) {
            return Err(FourierError::Unsupported {
                flags: 1,
                channels: n_channels as i32,
                bases: 1,
            });
        }
        let mut a0 = Vec::with_capacity(n * n);
        for (offset, m) in offsets_and_lengths.iter().copied() {
            if offset + m * n_channels > a.len() {
                return Err(FourierError::InvalidStructure(format!(
                    "coefficient range at {} of {} x {} exceeds {}",
                    offset,
                    m,
                    n_channels,
                    a.len()
                )));
            }
            a0.push(if m > 0 { a[offset] } else { 0.0 });
        }
        let m_max = offsets_and_lengths
            .iter()
            .map(|(_, m)| *m)
            .max()
            .unwrap_or(0) as f32;
        Ok(Self {
            eta,
            m_max,
            n_channels,
            mu,
            cdf,
            orders: offsets_and_lengths.iter().map(|(_, m)| *m).collect(),
            offsets: offsets_and_lengths.iter().map(|(o, _)| *o).collect(),
            a,
            a0,
        })
    }
}
