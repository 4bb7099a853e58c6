use csv::StringRecord;

/// Parses a single trial cell. Anything that is not a finite, non-negative
/// number is treated as missing.
pub fn parse_trial_cell(cell: &str) -> Option<f64> {
    let value = cell.trim().parse::<f64>().ok()?;
    if value.is_finite() && value >= 0.0 {
        Some(value)
    } else {
        None
    }
}

/// Position of `column` in a csv header, ignoring surrounding whitespace.
pub fn column_index(headers: &StringRecord, column: &str) -> Option<usize> {
    headers.iter().position(|h| h.trim() == column)
}

/// Sample mean and Bessel-corrected standard deviation. The deviation is
/// `None` for fewer than two samples.
pub fn mean_and_std_dev(samples: &[f64]) -> Option<(f64, Option<f64>)> {
    if samples.is_empty() {
        return None;
    }
    let n = samples.len() as f64;
    let mean = samples.iter().sum::<f64>() / n;
    if samples.len() < 2 {
        return Some((mean, None));
    }
    let variance = samples.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1.0);
    Some((mean, Some(variance.sqrt())))
}
