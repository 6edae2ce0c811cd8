use std::ops::RangeInclusive;

use anyhow::bail;

#[derive(Clone, Debug)]
pub struct BisectionConfig {
    pub bounds: RangeInclusive<f64>,
    pub iterations: u32,
}
impl BisectionConfig {
    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if !self.bounds.start().is_finite() || !self.bounds.end().is_finite() {
            bail!("bounds must be finite")
        }
        if self.bounds.start() >= self.bounds.end() {
            bail!("lower bound must be less than the upper bound")
        }
        if self.iterations == 0 {
            bail!("at least one iteration must be specified")
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BisectionOutcome {
    pub iterations: u32,
    pub optimal_value: f64,
    pub bracket: RangeInclusive<f64>,
}

/// Bisection over a monotonically non-decreasing `f`, locating the point where `f` crosses
/// `target`. Runs for exactly `config.iterations` halvings; the midpoint of the final bracket
/// is returned. Saturates at the nearest bound when `target` is not crossed within `bounds`.
pub fn bisect(
    config: &BisectionConfig,
    target: f64,
    mut f: impl FnMut(f64) -> f64,
) -> Result<BisectionOutcome, anyhow::Error> {
    config.validate()?;

    let (mut lo, mut hi) = (*config.bounds.start(), *config.bounds.end());
    for _ in 0..config.iterations {
        let mid = (lo + hi) / 2.0;
        if f(mid) < target {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    Ok(BisectionOutcome {
        iterations: config.iterations,
        optimal_value: (lo + hi) / 2.0,
        bracket: lo..=hi,
    })
}

#[cfg(test)]
mod tests {
    use assert_float_eq::*;

    use super::*;

    #[test]
    fn bisect_linear() {
        let outcome = bisect(
            &BisectionConfig {
                bounds: 0.0..=10.0,
                iterations: 40,
            },
            3.0,
            |x| 2.0 * x,
        )
        .unwrap();
        assert_eq!(40, outcome.iterations);
        assert_float_absolute_eq!(1.5, outcome.optimal_value, 1e-9);
    }

    #[test]
    fn bisect_saturates_at_bounds() {
        let config = BisectionConfig {
            bounds: 0.3..=3.0,
            iterations: 35,
        };
        let below = bisect(&config, -1.0, |x| x).unwrap();
        assert_float_absolute_eq!(0.3, below.optimal_value, 1e-9);
        let above = bisect(&config, 100.0, |x| x).unwrap();
        assert_float_absolute_eq!(3.0, above.optimal_value, 1e-9);
    }

    #[test]
    fn bisect_invalid_config() {
        let err = bisect(
            &BisectionConfig {
                bounds: 1.0..=1.0,
                iterations: 10,
            },
            0.0,
            |x| x,
        )
        .unwrap_err();
        assert_eq!("lower bound must be less than the upper bound", err.to_string());

        let err = bisect(
            &BisectionConfig {
                bounds: 0.0..=1.0,
                iterations: 0,
            },
            0.0,
            |x| x,
        )
        .unwrap_err();
        assert_eq!("at least one iteration must be specified", err.to_string());
    }
}
