//! Descriptive Statistics
//!
//! Population statistics accumulated sequentially in `f64`. Every function
//! visits its input in index order so that two callers given the same slice
//! produce bit-identical results.

/// Arithmetic mean (0 for an empty slice)
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population variance (0 for fewer than two values, exactly 0 for a
/// constant series)
pub fn variance(values: &[f64]) -> f64 {
    if values.len() < 2 || values.iter().all(|&v| v == values[0]) {
        return 0.0;
    }
    let m = mean(values);
    values.iter().map(|&v| (v - m) * (v - m)).sum::<f64>() / values.len() as f64
}

/// Population standard deviation
pub fn std_dev(values: &[f64]) -> f64 {
    variance(values).sqrt()
}

/// Coefficient of variation `std / |mean|` (0 when the mean vanishes)
pub fn coefficient_of_variation(values: &[f64]) -> f64 {
    let m = mean(values);
    if m.abs() < 1e-12 {
        return 0.0;
    }
    std_dev(values) / m.abs()
}

/// Median; mean of the two middle elements for even length
pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Nearest-rank percentile of u8 samples via a 256-bin histogram.
///
/// Rank index is `ceil(p/100 * n) - 1`, clamped to `[0, n-1]`.
pub fn percentile_u8(values: &[u8], p: f64) -> u8 {
    if values.is_empty() {
        return 0;
    }
    let mut hist = [0usize; 256];
    for &v in values {
        hist[v as usize] += 1;
    }

    let n = values.len();
    let rank = ((p / 100.0) * n as f64).ceil() as usize;
    let k = rank.saturating_sub(1).min(n - 1);

    let mut cumulative = 0usize;
    for (value, &count) in hist.iter().enumerate() {
        cumulative += count;
        if cumulative > k {
            return value as u8;
        }
    }
    255
}

/// Clamp to [0, 1], mapping NaN to 0
#[inline]
pub fn unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_mean_variance() {
        let v = [1.0, 2.0, 3.0, 4.0];
        assert_relative_eq!(mean(&v), 2.5);
        assert_relative_eq!(variance(&v), 1.25);
        assert_relative_eq!(variance(&[5.0]), 0.0);
    }

    #[test]
    fn test_constant_series_has_no_spread() {
        // 0.3 is not representable, so the summed mean drifts off the samples
        let v = [0.3; 12];
        assert_eq!(variance(&v), 0.0);
        assert_eq!(std_dev(&v), 0.0);
        assert_eq!(coefficient_of_variation(&v), 0.0);
        assert!(variance(&[0.3, 0.3, 0.30000000000000004]) > 0.0);
    }

    #[test]
    fn test_median() {
        assert_relative_eq!(median(&[3.0, 1.0, 2.0]), 2.0);
        assert_relative_eq!(median(&[4.0, 1.0, 2.0, 3.0]), 2.5);
        assert_relative_eq!(median(&[]), 0.0);
    }

    #[test]
    fn test_percentile_nearest_rank() {
        let values: Vec<u8> = (0..100).collect();
        assert_eq!(percentile_u8(&values, 99.0), 98);
        assert_eq!(percentile_u8(&values, 100.0), 99);
        assert_eq!(percentile_u8(&values, 0.0), 0);
        assert_eq!(percentile_u8(&[7u8; 10], 99.0), 7);
    }

    #[test]
    fn test_cv_zero_mean() {
        assert_relative_eq!(coefficient_of_variation(&[0.0, 0.0]), 0.0);
        assert_relative_eq!(coefficient_of_variation(&[1.0, 3.0]), 0.5);
    }

    #[test]
    fn test_unit_clamp() {
        assert_eq!(unit(f64::NAN), 0.0);
        assert_eq!(unit(1.5), 1.0);
        assert_eq!(unit(-0.5), 0.0);
    }
}
