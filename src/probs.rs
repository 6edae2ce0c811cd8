//! Utilities for working with probabilities.

pub trait SliceExt {
    fn sum(&self) -> f64;
    fn mean(&self) -> Option<f64>;
    fn normalise(&mut self, target: f64) -> f64;
    fn scale(&mut self, factor: f64);
    fn sanitise(&mut self);
}
impl SliceExt for [f64] {
    fn sum(&self) -> f64 {
        self.iter().sum()
    }

    fn mean(&self) -> Option<f64> {
        if self.is_empty() {
            None
        } else {
            Some(self.sum() / self.len() as f64)
        }
    }

    fn normalise(&mut self, target: f64) -> f64 {
        let sum = self.sum();
        self.scale(target / sum);
        sum
    }

    fn scale(&mut self, factor: f64) {
        for element in self {
            *element *= factor;
        }
    }

    /// Clamps every element to the unit interval, mapping `NaN` to zero.
    fn sanitise(&mut self) {
        for element in self {
            *element = sanitise(*element);
        }
    }
}

#[inline]
pub fn sanitise(prob: f64) -> f64 {
    if prob.is_nan() {
        0.0
    } else {
        prob.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{assert_slice_f64_near, assert_slice_f64_relative};
    use assert_float_eq::*;

    #[test]
    fn sum() {
        let data = [0.0, 0.1, 0.2];
        assert_f64_near!(0.30000000000000004, data.sum(), 1);
    }

    #[test]
    fn mean() {
        let empty: [f64; 0] = [];
        assert_eq!(None, empty.mean());
        assert_f64_near!(2.0, [1.0, 2.0, 3.0].mean().unwrap());
    }

    #[test]
    fn normalise() {
        let mut data = [0.05, 0.1, 0.15, 0.2];
        let sum = data.normalise(1.0);
        assert_f64_near!(0.5, sum, 1);
        assert_slice_f64_near(&[0.1, 0.2, 0.3, 0.4], &data, 1);
    }

    #[test]
    fn normalise_to_overround() {
        let mut data = [0.25, 0.25];
        data.normalise(1.085);
        assert_slice_f64_relative(&[0.5425, 0.5425], &data, 1e-9);
    }

    #[test]
    fn sanitise() {
        let mut data = [f64::NAN, -0.2, 0.3, 1.7];
        data.sanitise();
        assert_eq!([0.0, 0.0, 0.3, 1.0], data);
    }
}
