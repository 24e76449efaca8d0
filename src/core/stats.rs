//! Descriptive Statistics
//!
//! Small helpers shared by the validator and the player profile.
//! All functions return 0.0 for empty input instead of NaN.

/// Arithmetic mean.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation.
pub fn std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// Standard score of `value`, dividing by at least `floor`.
///
/// Returns 0.0 when the denominator is not positive.
pub fn z_score(value: f64, mean: f64, std_dev: f64, floor: f64) -> f64 {
    let denom = std_dev.max(floor);
    if denom <= 0.0 || !denom.is_finite() {
        return 0.0;
    }
    (value - mean) / denom
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input() {
        assert_eq!(mean(&[]), 0.0);
        assert_eq!(std_dev(&[]), 0.0);
    }

    #[test]
    fn test_mean_and_std_dev() {
        let values = [0.5, 1.5, 0.5, 1.5, 1.0];
        assert!((mean(&values) - 1.0).abs() < 1e-9);
        // Population variance = (4 * 0.25) / 5 = 0.2
        assert!((std_dev(&values) - 0.2f64.sqrt()).abs() < 1e-9);
    }

    #[test]
    fn test_z_score_uses_floor() {
        // Constant history: std dev 0, floor 0.5
        assert!((z_score(3.0, 1.0, 0.0, 0.5) - 4.0).abs() < 1e-9);
        assert_eq!(z_score(3.0, 1.0, 0.0, 0.0), 0.0);
    }
}
