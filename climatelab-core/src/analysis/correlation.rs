//! Pairwise-complete Pearson correlation.

use super::AnalysisError;
use crate::domain::Indicator;
use serde::{Deserialize, Serialize};

/// Pearson correlation coefficient of two equal-length samples.
///
/// Needs at least two observations and non-zero variance on both sides.
/// The result is clamped to [-1, 1] to absorb rounding.
pub fn pearson(xs: &[f64], ys: &[f64], subject: &str) -> Result<f64, AnalysisError> {
    let n = xs.len().min(ys.len());
    if n < 2 {
        return Err(AnalysisError::InsufficientData {
            subject: subject.to_string(),
            required: 2,
            found: n,
        });
    }

    let mean_x = xs[..n].iter().sum::<f64>() / n as f64;
    let mean_y = ys[..n].iter().sum::<f64>() / n as f64;

    let mut sxy = 0.0;
    let mut sxx = 0.0;
    let mut syy = 0.0;
    for (x, y) in xs[..n].iter().zip(&ys[..n]) {
        let dx = x - mean_x;
        let dy = y - mean_y;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }

    if sxx == 0.0 || syy == 0.0 {
        return Err(AnalysisError::ZeroVariance {
            subject: subject.to_string(),
        });
    }

    Ok((sxy / (sxx.sqrt() * syy.sqrt())).clamp(-1.0, 1.0))
}

/// Symmetric 3×3 correlation matrix in [`Indicator::ALL`] order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationMatrix {
    pub indicators: [Indicator; 3],
    pub coefficients: [[f64; 3]; 3],
    /// Co-present observations behind each coefficient; the diagonal holds
    /// each field's own present count.
    pub observations: [[usize; 3]; 3],
}

impl CorrelationMatrix {
    pub(crate) fn new() -> Self {
        let mut coefficients = [[0.0; 3]; 3];
        for (i, row) in coefficients.iter_mut().enumerate() {
            row[i] = 1.0;
        }
        Self {
            indicators: Indicator::ALL,
            coefficients,
            observations: [[0; 3]; 3],
        }
    }

    pub(crate) fn set(&mut self, a: Indicator, b: Indicator, r: f64, n: usize) {
        let (i, j) = (a.index(), b.index());
        self.coefficients[i][j] = r;
        self.coefficients[j][i] = r;
        self.observations[i][j] = n;
        self.observations[j][i] = n;
    }

    pub fn get(&self, a: Indicator, b: Indicator) -> f64 {
        self.coefficients[a.index()][b.index()]
    }

    pub fn observations(&self, a: Indicator, b: Indicator) -> usize {
        self.observations[a.index()][b.index()]
    }
}
