//! Model and market configuration. A [`Config`] is an explicit value passed to every component;
//! there are no global settings.

use std::error::Error;
use std::ops::RangeInclusive;
use std::path::Path;

use anyhow::anyhow;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::file;

#[derive(Debug, Error)]
#[error("{0}")]
pub struct ValidationError(#[from] pub Box<dyn Error + Send + Sync>);

impl From<anyhow::Error> for ValidationError {
    fn from(value: anyhow::Error) -> Self {
        ValidationError(value.into())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", default)]
pub struct Config {
    /// Overround applied to every market.
    pub margin: f64,
    pub n_simulations: usize,
    /// Seed of the Monte Carlo generator. Identical inputs and seed produce identical output.
    pub seed: u64,

    /// Exponent applied to the home/away strength ratio. Smaller values dampen the favourite.
    pub strength_power: f64,

    pub form_n_games: usize,
    pub form_beta: f64,
    pub form_clip_low: f64,
    pub form_clip_high: f64,

    /// Total line the simulated total is softly pulled toward; `None` disables the anchor.
    pub anchor_total_line: Option<f64>,
    pub anchor_target_over_prob: f64,
    /// 0 leaves the estimate untouched; 1 pins the total to the anchor.
    pub anchor_weight: f64,

    pub total_lines: Vec<f64>,
    pub it_lines: Vec<f64>,
    /// Handicap magnitudes; every non-zero line is quoted both ways for both sides.
    pub handicap_lines: Vec<f64>,

    pub min_lambda: f64,
    pub max_lambda: f64,

    /// Permitted deviation of a two-way booksum from `1 + margin` before a warning is raised.
    pub booksum_tolerance: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            margin: 0.085,
            n_simulations: 10_000_000,
            seed: 42,
            strength_power: 0.55,
            form_n_games: 7,
            form_beta: 0.10,
            form_clip_low: 0.92,
            form_clip_high: 1.12,
            anchor_total_line: Some(9.5),
            anchor_target_over_prob: 0.30,
            anchor_weight: 0.35,
            total_lines: vec![8.5, 9.5, 10.5, 11.5],
            it_lines: vec![3.5, 4.5, 5.5, 6.5],
            handicap_lines: vec![0.0, 1.5, 2.5],
            min_lambda: 0.5,
            max_lambda: 20.0,
            booksum_tolerance: 0.05,
        }
    }
}

impl Config {
    pub fn read_json_file(path: impl AsRef<Path>) -> Result<Self, ValidationError> {
        let config: Config = file::read_json(path).map_err(|err| anyhow!(err))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        const MARGIN_RANGE: RangeInclusive<f64> = 0.0..=1.0;
        if !MARGIN_RANGE.contains(&self.margin) || self.margin == 1.0 {
            return Err(anyhow!("margin ({}) must lie in [0, 1)", self.margin).into());
        }
        if self.n_simulations == 0 {
            return Err(anyhow!("number of simulations must be positive").into());
        }
        if !self.strength_power.is_finite() {
            return Err(anyhow!("strength power must be finite").into());
        }

        if self.form_n_games == 0 {
            return Err(anyhow!("form window must span at least one game").into());
        }
        if !self.form_beta.is_finite() {
            return Err(anyhow!("form beta must be finite").into());
        }
        if !(self.form_clip_low > 0.0) || self.form_clip_low > self.form_clip_high {
            return Err(anyhow!(
                "form clip bounds ({}, {}) must be positive and ordered",
                self.form_clip_low,
                self.form_clip_high
            )
            .into());
        }

        if let Some(line) = self.anchor_total_line {
            if !line.is_finite() || line < 0.0 {
                return Err(anyhow!("anchor total line ({line}) must be a non-negative number").into());
            }
        }
        if !(self.anchor_target_over_prob > 0.0 && self.anchor_target_over_prob < 1.0) {
            return Err(anyhow!(
                "anchor target over probability ({}) must lie in (0, 1)",
                self.anchor_target_over_prob
            )
            .into());
        }
        const ANCHOR_WEIGHT_RANGE: RangeInclusive<f64> = 0.0..=1.0;
        if !ANCHOR_WEIGHT_RANGE.contains(&self.anchor_weight) {
            return Err(anyhow!(
                "anchor weight ({}) outside of allowable range {ANCHOR_WEIGHT_RANGE:?}",
                self.anchor_weight
            )
            .into());
        }

        for (name, lines) in [
            ("total", &self.total_lines),
            ("individual total", &self.it_lines),
            ("handicap", &self.handicap_lines),
        ] {
            if let Some(line) = lines.iter().find(|line| !line.is_finite() || **line < 0.0) {
                return Err(anyhow!("{name} line ({line}) must be a non-negative number").into());
            }
        }
        if let Some(line) = self
            .handicap_lines
            .iter()
            .find(|&&line| line != 0.0 && line.fract() != 0.5)
        {
            return Err(anyhow!("handicap line ({line}) must be 0 or a half-line").into());
        }

        if !(self.min_lambda > 0.0) || self.min_lambda > self.max_lambda || !self.max_lambda.is_finite() {
            return Err(anyhow!(
                "lambda bounds ({}, {}) must be positive, finite and ordered",
                self.min_lambda,
                self.max_lambda
            )
            .into());
        }
        if !(self.booksum_tolerance >= 0.0) {
            return Err(anyhow!("booksum tolerance must be non-negative").into());
        }
        Ok(())
    }

    /// The permitted booksum band for a two-way market.
    pub fn booksum_band(&self) -> RangeInclusive<f64> {
        let expected = 1.0 + self.margin;
        expected - self.booksum_tolerance..=expected + self.booksum_tolerance
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        Config::default().validate().unwrap();
    }

    #[test]
    fn deserialize_partial() {
        let config: Config = serde_json::from_str(
            r#"{"MARGIN": 0.05, "N_SIMULATIONS": 1000, "ANCHOR_TOTAL_LINE": null, "TOTAL_LINES": [9.5]}"#,
        )
        .unwrap();
        assert_eq!(0.05, config.margin);
        assert_eq!(1000, config.n_simulations);
        assert_eq!(None, config.anchor_total_line);
        assert_eq!(vec![9.5], config.total_lines);
        assert_eq!(0.55, config.strength_power);
        config.validate().unwrap();
    }

    #[test]
    fn reject_invalid_margin() {
        let config = Config {
            margin: 1.0,
            ..Config::default()
        };
        assert_eq!("margin (1) must lie in [0, 1)", config.validate().unwrap_err().to_string());
    }

    #[test]
    fn reject_inverted_form_clip() {
        let config = Config {
            form_clip_low: 1.2,
            form_clip_high: 1.1,
            ..Config::default()
        };
        assert_eq!(
            "form clip bounds (1.2, 1.1) must be positive and ordered",
            config.validate().unwrap_err().to_string()
        );
    }

    #[test]
    fn reject_anchor_weight() {
        let config = Config {
            anchor_weight: 1.5,
            ..Config::default()
        };
        assert_eq!(
            "anchor weight (1.5) outside of allowable range 0.0..=1.0",
            config.validate().unwrap_err().to_string()
        );
    }

    #[test]
    fn reject_handicap_line() {
        let config = Config {
            handicap_lines: vec![0.0, 1.0],
            ..Config::default()
        };
        assert_eq!(
            "handicap line (1) must be 0 or a half-line",
            config.validate().unwrap_err().to_string()
        );
    }

    #[test]
    fn reject_lambda_bounds() {
        let config = Config {
            min_lambda: 0.0,
            ..Config::default()
        };
        assert!(config.validate().is_err());
        let config = Config {
            min_lambda: 5.0,
            max_lambda: 4.0,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn booksum_band() {
        let band = Config::default().booksum_band();
        assert!((band.start() - 1.035).abs() < 1e-12);
        assert!((band.end() - 1.135).abs() < 1e-12);
    }
}
