/// Folds `sample` into a running mean.
///
/// `index` is the zero-based position of `sample` within its bucket and
/// `previous` the mean of the samples before it.
pub fn fold(sample: f64, index: usize, previous: f64) -> f64 {
    if index == 0 {
        return sample;
    }
    let n = (index + 1) as f64;
    previous * (n - 1.0) / n + sample / n
}

#[cfg(test)]
mod tests {
    use super::*;

    fn running_mean(samples: &[f64]) -> f64 {
        samples
            .iter()
            .enumerate()
            .fold(0.0, |mean, (i, x)| fold(*x, i, mean))
    }

    fn direct_mean(samples: &[f64]) -> f64 {
        samples.iter().sum::<f64>() / samples.len() as f64
    }

    #[test]
    fn test_first_sample_is_the_mean() {
        assert_eq!(fold(42.5, 0, 1234.0), 42.5);
        assert_eq!(running_mean(&[7.0]), 7.0);
    }

    #[test]
    fn test_two_samples() {
        assert_eq!(running_mean(&[10.0, 20.0]), 15.0);
        assert!((running_mean(&[0.1, 0.7]) - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_fifty_integer_samples() {
        let samples: Vec<f64> = (1..=50).map(|i| i as f64).collect();
        assert!((running_mean(&samples) - 25.5).abs() < 1e-9);
        assert!((running_mean(&samples) - direct_mean(&samples)).abs() < 1e-9);
    }

    #[test]
    fn test_fifty_fractional_samples() {
        let samples: Vec<f64> = (0..50).map(|i| 100.0 + (i as f64) * 0.37 - 3.3).collect();
        assert!((running_mean(&samples) - direct_mean(&samples)).abs() < 1e-9);
    }

    #[test]
    fn test_recurrence_is_bit_exact() {
        let previous = 3.0;
        let expected = previous * 2.0 / 3.0 + 9.0 / 3.0;
        assert_eq!(fold(9.0, 2, previous).to_bits(), expected.to_bits());
    }
}
