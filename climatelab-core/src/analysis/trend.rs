use super::AnalysisError;
use serde::{Deserialize, Serialize};

/// Ordinary least-squares line `y = slope * x + intercept`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrendLine {
    /// Change per unit of x (per year when x is a fractional-year ordinal).
    pub slope: f64,
    pub intercept: f64,
    pub points: usize,
}

impl TrendLine {
    pub fn at(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

/// Fit a straight line through `(x, y)` points.
pub fn linear_fit(points: &[(f64, f64)], subject: &str) -> Result<TrendLine, AnalysisError> {
    let n = points.len();
    if n < 2 {
        return Err(AnalysisError::InsufficientData {
            subject: subject.to_string(),
            required: 2,
            found: n,
        });
    }

    let mean_x = points.iter().map(|p| p.0).sum::<f64>() / n as f64;
    let mean_y = points.iter().map(|p| p.1).sum::<f64>() / n as f64;

    let (sxy, sxx) = points.iter().fold((0.0, 0.0), |(sxy, sxx), &(x, y)| {
        let dx = x - mean_x;
        (sxy + dx * (y - mean_y), sxx + dx * dx)
    });

    if sxx == 0.0 {
        return Err(AnalysisError::ZeroVariance {
            subject: subject.to_string(),
        });
    }

    let slope = sxy / sxx;
    Ok(TrendLine {
        slope,
        intercept: mean_y - slope * mean_x,
        points: n,
    })
}
