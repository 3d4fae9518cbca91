//! Classical face similarity: intensity-histogram correlation averaged with a
//! normalized cross-correlation template match.

use image::GrayImage;

pub const HISTOGRAM_BINS: usize = 256;

/// 256-bin intensity histogram.
pub fn intensity_histogram(image: &GrayImage) -> [f64; HISTOGRAM_BINS] {
    let mut hist = [0.0; HISTOGRAM_BINS];
    for pixel in image.pixels() {
        hist[pixel.0[0] as usize] += 1.0;
    }
    hist
}

/// Rescale in place so the smallest bin becomes 0 and the largest 1.
///
/// A flat histogram becomes all zeros.
pub fn normalize_min_max(hist: &mut [f64]) {
    let min = hist.iter().copied().fold(f64::INFINITY, f64::min);
    let max = hist.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;
    let scale = if range > f64::EPSILON { 1.0 / range } else { 0.0 };

    for bin in hist.iter_mut() {
        *bin = (*bin - min) * scale;
    }
}

/// Pearson correlation between two histograms.
///
/// Two flat histograms are treated as perfectly correlated.
pub fn histogram_correlation(a: &[f64], b: &[f64]) -> f64 {
    let n = a.len().min(b.len()) as f64;
    if n == 0.0 {
        return 1.0;
    }
    let mean_a = a.iter().sum::<f64>() / n;
    let mean_b = b.iter().sum::<f64>() / n;

    let (mut num, mut var_a, mut var_b) = (0.0, 0.0, 0.0);
    for (x, y) in a.iter().zip(b) {
        let da = x - mean_a;
        let db = y - mean_b;
        num += da * db;
        var_a += da * da;
        var_b += db * db;
    }

    let denom = var_a * var_b;
    if denom.abs() > f64::EPSILON {
        num / denom.sqrt()
    } else {
        1.0
    }
}

/// Normalized cross-correlation coefficient between two equally sized images.
///
/// Both images are mean-centred before correlating. Returns 0.0 when either
/// image has no variance; a ratio marginally above 1 from rounding snaps to ±1.
pub fn template_coefficient(a: &GrayImage, b: &GrayImage) -> f64 {
    debug_assert_eq!(a.dimensions(), b.dimensions());

    let n = a.as_raw().len().min(b.as_raw().len()) as f64;
    if n == 0.0 {
        return 0.0;
    }
    let mean_a = a.as_raw().iter().map(|&v| v as f64).sum::<f64>() / n;
    let mean_b = b.as_raw().iter().map(|&v| v as f64).sum::<f64>() / n;

    let (mut num, mut energy_a, mut energy_b) = (0.0, 0.0, 0.0);
    for (&x, &y) in a.as_raw().iter().zip(b.as_raw()) {
        let da = x as f64 - mean_a;
        let db = y as f64 - mean_b;
        num += da * db;
        energy_a += da * da;
        energy_b += db * db;
    }

    let norm = (energy_a * energy_b).sqrt();
    if num.abs() < norm {
        num / norm
    } else if num.abs() < norm * 1.125 {
        num.signum()
    } else {
        0.0
    }
}

/// Similarity of two normalized face crops: the mean of histogram correlation
/// and the template-match coefficient.
pub fn face_similarity(a: &GrayImage, b: &GrayImage) -> f64 {
    let mut hist_a = intensity_histogram(a);
    let mut hist_b = intensity_histogram(b);
    normalize_min_max(&mut hist_a);
    normalize_min_max(&mut hist_b);

    let histogram = histogram_correlation(&hist_a, &hist_b);
    let template = template_coefficient(a, b);

    tracing::debug!(histogram, template, "Face similarity components");
    (histogram + template) / 2.0
}
