//! Descriptive statistics over a peer group's metric values
//!
//! Everything here works on plain `f64` slices with missing values already
//! dropped, so the same helpers serve every chart kind.

use serde::Serialize;

/// Default bin count for histograms
pub const DEFAULT_BINS: usize = 20;

/// Half-width of the strip plot's vertical jitter band
pub const JITTER_WIDTH: f64 = 0.2;

/// Grid extends this many bandwidths beyond the data on each side
const KDE_CUT: f64 = 2.0;

/// Arithmetic mean; `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation (n - 1); `None` below two values.
pub fn std_dev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    Some(var.sqrt())
}

/// Linear-interpolation quantile over an ascending slice.
pub fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

fn sorted(values: &[f64]) -> Vec<f64> {
    let mut v = values.to_vec();
    v.sort_by(|a, b| a.total_cmp(b));
    v
}

// =============================================================================
// Histogram
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bin {
    pub start: f64,
    pub end: f64,
    pub count: usize,
}

/// Equal-width bins over `[min, max]`; the last bin is closed on the right.
/// A single distinct value is centred in a unit-wide range.
pub fn histogram(values: &[f64], bins: usize) -> Vec<Bin> {
    if values.is_empty() || bins == 0 {
        return Vec::new();
    }

    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let (lo, hi) = if min == max {
        (min - 0.5, max + 0.5)
    } else {
        (min, max)
    };
    let width = (hi - lo) / bins as f64;

    let mut out: Vec<Bin> = (0..bins)
        .map(|i| Bin {
            start: lo + width * i as f64,
            end: if i + 1 == bins {
                hi
            } else {
                lo + width * (i + 1) as f64
            },
            count: 0,
        })
        .collect();

    for v in values {
        let idx = (((v - lo) / width) as usize).min(bins - 1);
        out[idx].count += 1;
    }
    out
}

// =============================================================================
// Box summary
// =============================================================================

/// Five-number box summary with Tukey whiskers (1.5 IQR)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoxSummary {
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub whisker_low: f64,
    pub whisker_high: f64,
    pub outliers: Vec<f64>,
}

pub fn box_summary(values: &[f64]) -> Option<BoxSummary> {
    let sorted = sorted(values);
    let q1 = quantile(&sorted, 0.25)?;
    let median = quantile(&sorted, 0.5)?;
    let q3 = quantile(&sorted, 0.75)?;
    let iqr = q3 - q1;
    let (fence_low, fence_high) = (q1 - 1.5 * iqr, q3 + 1.5 * iqr);

    let inside = sorted
        .iter()
        .copied()
        .filter(|v| *v >= fence_low && *v <= fence_high);
    let whisker_low = inside.clone().fold(f64::INFINITY, f64::min);
    let whisker_high = inside.fold(f64::NEG_INFINITY, f64::max);
    let outliers = sorted
        .iter()
        .copied()
        .filter(|v| *v < fence_low || *v > fence_high)
        .collect();

    Some(BoxSummary {
        q1,
        median,
        q3,
        whisker_low,
        whisker_high,
        outliers,
    })
}

// =============================================================================
// Kernel density
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DensityPoint {
    pub x: f64,
    pub density: f64,
}

/// Scott's rule bandwidth: n^(-1/5) * sigma
pub fn scott_bandwidth(values: &[f64]) -> Option<f64> {
    let sigma = std_dev(values)?;
    if sigma <= 0.0 {
        return None;
    }
    Some((values.len() as f64).powf(-0.2) * sigma)
}

/// Gaussian KDE sampled at `points` evenly spaced positions.
/// Degenerate input (fewer than two distinct values) yields an empty curve.
pub fn kde(values: &[f64], points: usize) -> Vec<DensityPoint> {
    let Some(bw) = scott_bandwidth(values) else {
        return Vec::new();
    };
    if points < 2 {
        return Vec::new();
    }

    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let lo = min - KDE_CUT * bw;
    let hi = max + KDE_CUT * bw;
    let step = (hi - lo) / (points - 1) as f64;
    let norm = 1.0 / (values.len() as f64 * bw * (2.0 * std::f64::consts::PI).sqrt());

    (0..points)
        .map(|i| {
            let x = lo + step * i as f64;
            let density = values
                .iter()
                .map(|v| (-0.5 * ((x - v) / bw).powi(2)).exp())
                .sum::<f64>()
                * norm;
            DensityPoint { x, density }
        })
        .collect()
}

// =============================================================================
// Jitter
// =============================================================================

/// Cosmetic vertical scatter for strip plots. Offsets carry no meaning.
pub struct Jitter {
    rng: fastrand::Rng,
}

impl Jitter {
    /// Fresh entropy on every render
    pub fn new() -> Self {
        Self {
            rng: fastrand::Rng::new(),
        }
    }

    /// Reproducible offsets
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: fastrand::Rng::with_seed(seed),
        }
    }

    pub fn from_seed(seed: Option<u64>) -> Self {
        seed.map(Self::seeded).unwrap_or_default()
    }

    /// Next offset in `[-JITTER_WIDTH, JITTER_WIDTH)`
    pub fn offset(&mut self) -> f64 {
        self.rng.f64() * 2.0 * JITTER_WIDTH - JITTER_WIDTH
    }
}

impl Default for Jitter {
    fn default() -> Self {
        Self::new()
    }
}
