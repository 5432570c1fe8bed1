use rand::{rngs::StdRng, Rng, SeedableRng};
use sampling::{Distribution1D, Distribution2D};

fn f32_close(a: f32, b: f32) -> bool {
    (a - b).abs() < 1e-5
}

#[test]
fn cdf_invariants() {
    let mut rng = StdRng::seed_from_u64(42);
    for n in [1usize, 2, 7, 64].iter().copied() {
        let weights: Vec<f32> = (0..n).map(|_| rng.gen::<f32>() * 10.0).collect();
        let (d, integral) = Distribution1D::new(&weights);
        assert!(f32_close(integral, weights.iter().sum()), "{}", integral);

        let cdf = d.cdf();
        assert_eq!(cdf.len(), n + 1);
        assert_eq!(cdf[0], 0.0);
        assert_eq!(cdf[n], 1.0);
        assert!(cdf.windows(2).all(|w| w[0] <= w[1]), "{:?}", cdf);

        let pdf_integral = d.pdf().iter().sum::<f32>() / n as f32;
        assert!((pdf_integral - 1.0).abs() < 1e-4, "{}", pdf_integral);
    }
}

#[test]
fn all_zero_weights_fall_back_to_uniform() {
    let (d, integral) = Distribution1D::new(&[0.0; 5]);
    assert_eq!(integral, 0.0);
    assert!(d.pdf().iter().all(|p| *p == 1.0));
    assert_eq!(d.cdf()[5], 1.0);
    for e in [0.0f32, 0.1, 0.5, 0.99].iter().copied() {
        let (x, pdf) = d.sample(e);
        assert_eq!(pdf, 1.0);
        assert!(f32_close(x, e), "{} vs {}", x, e);
    }
}

#[test]
fn samples_never_land_in_empty_buckets() {
    let (d, _) = Distribution1D::new(&[0.0, 2.0, 0.0, 0.0, 1.0, 0.0]);
    let mut rng = StdRng::seed_from_u64(3);
    for _ in 0..1000 {
        let (x, pdf) = d.sample(rng.gen());
        assert!(pdf > 0.0);
        assert!((0.0..1.0).contains(&x));
        assert_eq!(d.pdf_at(x), pdf);
    }
}

#[test]
fn distribution_2d_pdf_matches_samples() {
    let (w, h) = (8, 4);
    let data: Vec<f32> = (0..w * h)
        .map(|i| {
            let (x, y) = (i % w, i / w);
            if x == 3 && y == 1 {
                0.0
            } else {
                1.0 + (x * y) as f32
            }
        })
        .collect();
    let d = Distribution2D::new(w, h, &data);
    assert_eq!((d.width(), d.height()), (w, h));

    let mut rng = StdRng::seed_from_u64(11);
    let n_samples = 200_000;
    let mut counts = vec![0usize; w * h];
    for _ in 0..n_samples {
        let (x, y, pdf) = d.sample(rng.gen(), rng.gen());
        assert!(pdf > 0.0, "pdf({}, {}) = {}", x, y, pdf);
        assert!(f32_close(d.pdf(x, y), pdf), "{} vs {}", d.pdf(x, y), pdf);
        let (xi, yi) = ((x * w as f32) as usize, (y * h as f32) as usize);
        counts[yi * w + xi] += 1;
    }

    // Pearson's chi-squared against the histogram. 31 degrees of freedom (one empty cell); the
    // 0.999 quantile is about 61.
    let total: f32 = data.iter().sum();
    let chi2: f32 = data
        .iter()
        .zip(counts.iter())
        .filter(|(v, _)| **v > 0.0)
        .map(|(v, c)| {
            let expected = v / total * n_samples as f32;
            (*c as f32 - expected).powi(2) / expected
        })
        .sum();
    assert!(chi2 < 61.0, "chi2 = {}", chi2);
    assert_eq!(counts[1 * w + 3], 0);
}
