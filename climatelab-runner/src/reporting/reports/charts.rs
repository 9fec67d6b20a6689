//! Text charts for the markdown report.

const LEVELS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// Widest chart the report renders before averaging neighbouring points.
pub const MAX_WIDTH: usize = 80;

/// One character per value scaled between the present min and max; missing
/// values are blanks. A flat series sits on the middle level.
pub fn sparkline(values: &[Option<f64>]) -> String {
    let present = values.iter().flatten();
    let (min, max) = present.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
        (lo.min(v), hi.max(v))
    });
    if !min.is_finite() {
        return " ".repeat(values.len());
    }
    scaled(values, min, max)
}

/// Sparkline against a fixed `[min, max]` range, so several lines share a scale.
pub fn scaled(values: &[Option<f64>], min: f64, max: f64) -> String {
    let span = max - min;
    values
        .iter()
        .map(|value| match value {
            None => ' ',
            Some(_) if span <= 0.0 => LEVELS[LEVELS.len() / 2],
            Some(v) => {
                let t = ((v - min) / span).clamp(0.0, 1.0);
                LEVELS[(t * (LEVELS.len() - 1) as f64).round() as usize]
            }
        })
        .collect()
}

/// Shrink to at most `width` points by averaging consecutive chunks.
/// A chunk with no present values stays missing.
pub fn downsample(values: &[Option<f64>], width: usize) -> Vec<Option<f64>> {
    if width == 0 || values.len() <= width {
        return values.to_vec();
    }
    let chunk = values.len().div_ceil(width);
    values
        .chunks(chunk)
        .map(|c| {
            let (sum, n) = c
                .iter()
                .flatten()
                .fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
            (n > 0).then(|| sum / n as f64)
        })
        .collect()
}

/// Shade for a correlation coefficient, by magnitude.
pub fn heat(r: f64) -> char {
    match r.abs() {
        a if a >= 0.8 => '█',
        a if a >= 0.6 => '▓',
        a if a >= 0.4 => '▒',
        a if a >= 0.2 => '░',
        _ => '·',
    }
}
