//! Stateless numeric primitives shared by the calculators.

/// Guarded division: `numerator / denominator`, or `0.0` when the
/// denominator is exactly zero.
pub fn safe_divide(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

/// Relative change from `baseline` to `current`, guarded like [`safe_divide`].
pub fn pct_change(current: f64, baseline: f64) -> f64 {
    safe_divide(current - baseline, baseline)
}

/// Running sum/mean over values, skipping NaN.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FiniteAccumulator {
    sum: f64,
    count: usize,
}

impl FiniteAccumulator {
    pub fn push(&mut self, value: f64) {
        if !value.is_nan() {
            self.sum += value;
            self.count += 1;
        }
    }

    /// Sum of the accepted values (`0.0` if none).
    pub fn sum(&self) -> f64 {
        self.sum
    }

    /// Mean of the accepted values, `None` when nothing was accepted.
    pub fn mean(&self) -> Option<f64> {
        if self.count == 0 {
            None
        } else {
            Some(self.sum / self.count as f64)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn safe_divide_guards_zero_denominator() {
        assert_eq!(safe_divide(5000.0, 0.0), 0.0);
        assert_eq!(safe_divide(-1.0, -0.0), 0.0);
        assert_eq!(safe_divide(20000.0, 100000.0), 0.2);
    }

    #[test]
    fn pct_change_uses_baseline() {
        assert!((pct_change(120000.0, 100000.0) - 0.2).abs() < 1e-12);
        assert_eq!(pct_change(5000.0, 0.0), 0.0);
        assert!((pct_change(50.0, 100.0) + 0.5).abs() < 1e-12);
    }

    #[test]
    fn accumulator_skips_nan() {
        let mut acc = FiniteAccumulator::default();
        acc.push(1.0);
        acc.push(f64::NAN);
        acc.push(3.0);
        assert_eq!(acc.sum(), 4.0);
        assert_eq!(acc.mean(), Some(2.0));
    }

    #[test]
    fn empty_accumulator() {
        let mut acc = FiniteAccumulator::default();
        acc.push(f64::NAN);
        assert_eq!(acc.sum(), 0.0);
        assert_eq!(acc.mean(), None);
    }
}
