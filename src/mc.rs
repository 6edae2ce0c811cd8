//! Monte Carlo simulation of match corner counts.
//!
//! Both sides' counts are drawn from independent Poisson distributions using a single seeded
//! generator: all home draws first, then all away draws. Identical means, sample count and seed
//! always produce identical samples. Downstream probabilities are empirical frequencies over the
//! samples, computed from histograms that are built once per match and shared by every market.

use std::ops::RangeInclusive;

use tinyrand::{Rand, Seeded, Wyrand};

use crate::poisson;

#[derive(Debug, Clone, PartialEq)]
pub struct SimulatedOutcomeSet {
    home: Vec<u16>,
    away: Vec<u16>,
}
impl SimulatedOutcomeSet {
    pub fn simulate(lambda_home: f64, lambda_away: f64, trials: usize, seed: u64) -> Self {
        let mut rand = Wyrand::seed(seed);
        let home = draw(lambda_home, trials, &mut rand);
        let away = draw(lambda_away, trials, &mut rand);
        Self { home, away }
    }

    pub fn home(&self) -> &[u16] {
        &self.home
    }

    pub fn away(&self) -> &[u16] {
        &self.away
    }

    pub fn len(&self) -> usize {
        self.home.len()
    }

    pub fn is_empty(&self) -> bool {
        self.home.is_empty()
    }

    /// Elementwise home minus away.
    pub fn diffs(&self) -> impl Iterator<Item = i32> + '_ {
        self.home
            .iter()
            .zip(&self.away)
            .map(|(&home, &away)| home as i32 - away as i32)
    }

    /// Elementwise home plus away.
    pub fn totals(&self) -> impl Iterator<Item = i32> + '_ {
        self.home
            .iter()
            .zip(&self.away)
            .map(|(&home, &away)| home as i32 + away as i32)
    }

    pub fn distributions(&self) -> OutcomeDistributions {
        OutcomeDistributions {
            home: Histogram::from_values(self.home.iter().map(|&corners| corners as i32)),
            away: Histogram::from_values(self.away.iter().map(|&corners| corners as i32)),
            diff: Histogram::from_values(self.diffs()),
            total: Histogram::from_values(self.totals()),
        }
    }
}

fn draw(lambda: f64, trials: usize, rand: &mut impl Rand) -> Vec<u16> {
    (0..trials).map(|_| poisson::sample(lambda, rand)).collect()
}

/// Empirical distributions of the four quantities the markets settle on.
#[derive(Debug, Clone, PartialEq)]
pub struct OutcomeDistributions {
    pub home: Histogram,
    pub away: Histogram,
    pub diff: Histogram,
    pub total: Histogram,
}

/// Occurrence counts of integer outcomes over a contiguous range.
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    min: i32,
    counts: Vec<usize>,
    samples: usize,
}
impl Histogram {
    pub fn from_values(values: impl IntoIterator<Item = i32>) -> Self {
        let values = values.into_iter().collect::<Vec<_>>();
        let (Some(&min), Some(&max)) = (values.iter().min(), values.iter().max()) else {
            return Self {
                min: 0,
                counts: vec![],
                samples: 0,
            };
        };
        let mut counts = vec![0; (max - min) as usize + 1];
        for value in &values {
            counts[(value - min) as usize] += 1;
        }
        Self {
            min,
            counts,
            samples: values.len(),
        }
    }

    pub fn samples(&self) -> usize {
        self.samples
    }

    /// The smallest and largest outcomes observed.
    pub fn support(&self) -> Option<RangeInclusive<i32>> {
        if self.counts.is_empty() {
            None
        } else {
            Some(self.min..=self.min + self.counts.len() as i32 - 1)
        }
    }

    pub fn count_where(&self, mut predicate: impl FnMut(i32) -> bool) -> usize {
        self.counts
            .iter()
            .enumerate()
            .filter(|(offset, _)| predicate(self.min + *offset as i32))
            .map(|(_, count)| count)
            .sum()
    }

    /// The empirical frequency of outcomes satisfying `predicate`; zero for an empty histogram.
    pub fn prob_where(&self, predicate: impl FnMut(i32) -> bool) -> f64 {
        if self.samples == 0 {
            return 0.0;
        }
        self.count_where(predicate) as f64 / self.samples as f64
    }

    pub fn prob_above(&self, line: f64) -> f64 {
        self.prob_where(|value| value as f64 > line)
    }

    pub fn prob_below(&self, line: f64) -> f64 {
        self.prob_where(|value| (value as f64) < line)
    }

    pub fn prob_at(&self, value: i32) -> f64 {
        self.prob_where(|outcome| outcome == value)
    }
}
