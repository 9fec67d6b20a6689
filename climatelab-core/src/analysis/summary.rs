use super::AnalysisError;
use crate::domain::Period;
use serde::{Deserialize, Serialize};

/// Descriptive statistics over one field's present values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SummaryStats {
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation (n - 1); zero for a single value.
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
    pub first: Period,
    pub last: Period,
}

/// Summarize `(period, value)` points given in period order.
pub fn summarize(points: &[(Period, f64)], subject: &str) -> Result<SummaryStats, AnalysisError> {
    let (first, last) = match (points.first(), points.last()) {
        (Some(f), Some(l)) => (f.0, l.0),
        _ => {
            return Err(AnalysisError::InsufficientData {
                subject: subject.to_string(),
                required: 1,
                found: 0,
            })
        }
    };

    let n = points.len();
    let mean = points.iter().map(|p| p.1).sum::<f64>() / n as f64;
    let std_dev = if n > 1 {
        let var = points.iter().map(|p| (p.1 - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
        var.sqrt()
    } else {
        0.0
    };
    let min = points.iter().map(|p| p.1).fold(f64::INFINITY, f64::min);
    let max = points.iter().map(|p| p.1).fold(f64::NEG_INFINITY, f64::max);

    Ok(SummaryStats {
        count: n,
        mean,
        std_dev,
        min,
        max,
        first,
        last,
    })
}

/// Trailing rolling mean. Position `i` is present only when the full window
/// ending at `i` is present.
pub fn rolling_mean(values: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    if window == 0 {
        return vec![None; values.len()];
    }
    (0..values.len())
        .map(|i| {
            if i + 1 < window {
                return None;
            }
            let slice = &values[i + 1 - window..=i];
            let sum = slice.iter().try_fold(0.0, |acc, v| v.map(|x| acc + x))?;
            Some(sum / window as f64)
        })
        .collect()
}
