//! Estimation of the expected corner counts (the Poisson means) for both sides of a match.
//!
//! The estimate starts from each side's historical base rate in its role, is tilted by the ratio
//! of team strengths, multiplied by the recent-form factors, softly pulled toward a target total
//! line and finally clamped to the configured bounds.

use tracing::debug;

use crate::calc::CalculationError;
use crate::config::{Config, ValidationError};
use crate::data::{Dataset, History};
use crate::form::{form_factor, FormFactor};
use crate::opt::{bisect, BisectionConfig};
use crate::poisson;
use crate::probs::SliceExt;
use crate::profile::TeamProfiles;

/// Guards the strength ratio against a vanishing away strength.
const MIN_STRENGTH_DIVISOR: f64 = 1e-9;

const ANCHOR_SEARCH: BisectionConfig = BisectionConfig {
    bounds: 0.3..=3.0,
    iterations: 35,
};

const ANCHOR_TARGET_BOUNDS: (f64, f64) = (0.001, 0.999);

#[derive(Debug, Clone, PartialEq)]
pub struct MatchRateEstimate {
    pub lambda_home: f64,
    pub lambda_away: f64,
    pub base_lambda_home: f64,
    pub base_lambda_away: f64,
    pub strength_home: f64,
    pub strength_away: f64,
    pub strength_ratio: f64,
    pub form_home: f64,
    pub form_away: f64,
    pub anchor_line: Option<f64>,
    pub anchor_scale: f64,
}
impl MatchRateEstimate {
    pub fn expected_total(&self) -> f64 {
        self.lambda_home + self.lambda_away
    }
}

pub fn estimate(
    dataset: &Dataset,
    profiles: &TeamProfiles,
    home: &str,
    away: &str,
    config: &Config,
) -> Result<MatchRateEstimate, CalculationError> {
    let (base_lambda_home, base_lambda_away) = base_rates(&dataset.history, home, away)?;

    let strength_home = dataset.strengths.get(home);
    let strength_away = dataset.strengths.get(away);
    let strength_ratio = (strength_home / f64::max(MIN_STRENGTH_DIVISOR, strength_away)).powf(config.strength_power);
    let mut lambda_home = base_lambda_home * strength_ratio;
    let mut lambda_away = base_lambda_away / strength_ratio;

    let (form_home, form_away) = match &dataset.form {
        None => (FormFactor::NEUTRAL, FormFactor::NEUTRAL),
        Some(form) => (
            form_factor(form, home, profiles, config),
            form_factor(form, away, profiles, config),
        ),
    };
    lambda_home *= form_home.value;
    lambda_away *= form_away.value;

    let anchor_scale = match config.anchor_total_line {
        None => 1.0,
        Some(line) => {
            let anchor = anchor_scale(
                lambda_home + lambda_away,
                line,
                config.anchor_target_over_prob,
                config.anchor_weight,
            )
            .map_err(ValidationError::from)?;
            anchor.scale
        }
    };
    lambda_home *= anchor_scale;
    lambda_away *= anchor_scale;

    let estimate = MatchRateEstimate {
        lambda_home: clamp_lambda(lambda_home, config),
        lambda_away: clamp_lambda(lambda_away, config),
        base_lambda_home,
        base_lambda_away,
        strength_home,
        strength_away,
        strength_ratio,
        form_home: form_home.value,
        form_away: form_away.value,
        anchor_line: config.anchor_total_line,
        anchor_scale,
    };
    debug!("{home} v {away}: {estimate:?}");
    Ok(estimate)
}

/// Mean corners won by the home side in its home games and by the away side in its away games,
/// each falling back to the league-wide mean for that role.
fn base_rates(history: &History, home: &str, away: &str) -> Result<(f64, f64), CalculationError> {
    let league_home = history
        .records()
        .iter()
        .map(|record| record.home_corners as f64)
        .collect::<Vec<_>>()
        .mean()
        .ok_or(CalculationError::EmptyHistory)?;
    let league_away = history
        .records()
        .iter()
        .map(|record| record.away_corners as f64)
        .collect::<Vec<_>>()
        .mean()
        .ok_or(CalculationError::EmptyHistory)?;

    let home_rate = history
        .records()
        .iter()
        .filter(|record| record.home == home)
        .map(|record| record.home_corners as f64)
        .collect::<Vec<_>>()
        .mean();
    let away_rate = history
        .records()
        .iter()
        .filter(|record| record.away == away)
        .map(|record| record.away_corners as f64)
        .collect::<Vec<_>>()
        .mean();
    if home_rate.is_none() {
        debug!("no home games for {home}, using league mean {league_home:.3}");
    }
    if away_rate.is_none() {
        debug!("no away games for {away}, using league mean {league_away:.3}");
    }
    Ok((home_rate.unwrap_or(league_home), away_rate.unwrap_or(league_away)))
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnchorScale {
    /// The scale at which the total's over probability meets the target.
    pub best_scale: f64,
    /// `best_scale` blended with 1.0 by the anchor weight.
    pub scale: f64,
}

/// Finds the scale `s` for which `P(Poisson(s * mean_total) > line)` meets `target_over_prob`,
/// then blends it with the identity by `weight`.
pub fn anchor_scale(
    mean_total: f64,
    line: f64,
    target_over_prob: f64,
    weight: f64,
) -> Result<AnchorScale, anyhow::Error> {
    let target = target_over_prob.clamp(ANCHOR_TARGET_BOUNDS.0, ANCHOR_TARGET_BOUNDS.1);
    let outcome = bisect(&ANCHOR_SEARCH, target, |scale| {
        poisson::over_prob(mean_total * scale, line)
    })?;
    let best_scale = outcome.optimal_value;
    let scale = (1.0 - weight) + weight * best_scale;
    debug!(
        "anchor: mean total {mean_total:.3}, line {line}, target {target:.3}, best scale {best_scale:.4}, blended {scale:.4}"
    );
    Ok(AnchorScale { best_scale, scale })
}

fn clamp_lambda(lambda: f64, config: &Config) -> f64 {
    lambda.min(config.max_lambda).max(config.min_lambda)
}

#[cfg(test)]
mod tests {
    use assert_float_eq::*;
    use chrono::NaiveDate;

    use crate::data::{FormHistory, HistoricalMatchRecord, RecentFormRecord, TeamStrengthIndex};

    use super::*;

    fn history() -> History {
        History::from(vec![
            HistoricalMatchRecord::new("A", "B", 6, 3),
            HistoricalMatchRecord::new("A", "C", 8, 2),
            HistoricalMatchRecord::new("C", "B", 4, 5),
            HistoricalMatchRecord::new("B", "A", 5, 4),
        ])
    }

    fn unanchored() -> Config {
        Config {
            anchor_total_line: None,
            ..Config::default()
        }
    }

    fn estimate_for(dataset: &Dataset, home: &str, away: &str, config: &Config) -> MatchRateEstimate {
        let profiles = TeamProfiles::from(&dataset.history);
        estimate(dataset, &profiles, home, away, config).unwrap()
    }

    #[test]
    fn base_rates_by_role() {
        let estimate = estimate_for(&Dataset::new(history()), "A", "B", &unanchored());
        assert_float_absolute_eq!(7.0, estimate.base_lambda_home);
        assert_float_absolute_eq!(4.0, estimate.base_lambda_away);
        assert_float_absolute_eq!(7.0, estimate.lambda_home);
        assert_float_absolute_eq!(4.0, estimate.lambda_away);
        assert_float_absolute_eq!(1.0, estimate.strength_ratio);
        assert_float_absolute_eq!(1.0, estimate.form_home);
        assert_float_absolute_eq!(1.0, estimate.form_away);
        assert_eq!(None, estimate.anchor_line);
        assert_float_absolute_eq!(1.0, estimate.anchor_scale);
        assert_float_absolute_eq!(11.0, estimate.expected_total());
    }

    #[test]
    fn base_rates_fall_back_to_league() {
        let estimate = estimate_for(&Dataset::new(history()), "D", "E", &unanchored());
        assert_float_absolute_eq!(23.0 / 4.0, estimate.base_lambda_home);
        assert_float_absolute_eq!(14.0 / 4.0, estimate.base_lambda_away);
    }

    #[test]
    fn empty_history() {
        let dataset = Dataset::new(History::from(vec![]));
        let result = estimate(&dataset, &TeamProfiles::default(), "A", "B", &Config::default());
        assert!(matches!(result, Err(CalculationError::EmptyHistory)));
    }

    #[test]
    fn strength_ratio_tilts_rates() {
        let strengths = TeamStrengthIndex::from_iter([("A", 2.0), ("B", 0.5)]);
        let dataset = Dataset::new(history()).with_strengths(strengths);
        let estimate = estimate_for(&dataset, "A", "B", &unanchored());
        let ratio = 4.0_f64.powf(0.55);
        assert_float_absolute_eq!(2.0, estimate.strength_home);
        assert_float_absolute_eq!(0.5, estimate.strength_away);
        assert_float_absolute_eq!(ratio, estimate.strength_ratio);
        assert_float_absolute_eq!(7.0 * ratio, estimate.lambda_home);
        assert_float_absolute_eq!(4.0 / ratio, estimate.lambda_away);
    }

    #[test]
    fn form_multiplies_rates() {
        let form = FormHistory::from(vec![RecentFormRecord {
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            side_a: "A".into(),
            side_b: "C".into(),
            side_a_corners: 20,
            side_b_corners: 0,
        }]);
        let config = unanchored();
        let dataset = Dataset::new(history()).with_form(form);
        let estimate = estimate_for(&dataset, "A", "B", &config);
        assert_float_absolute_eq!(config.form_clip_high, estimate.form_home);
        assert_float_absolute_eq!(1.0, estimate.form_away);
        assert_float_absolute_eq!(7.0 * config.form_clip_high, estimate.lambda_home);
        assert_float_absolute_eq!(4.0, estimate.lambda_away);
    }

    #[test]
    fn lambdas_clamped() {
        let config = Config {
            strength_power: 4.0,
            ..Config::default()
        };
        let strengths = TeamStrengthIndex::from_iter([("A", 100.0), ("B", 0.01)]);
        let dataset = Dataset::new(history()).with_strengths(strengths);
        let estimate = estimate_for(&dataset, "A", "B", &config);
        assert_eq!(config.max_lambda, estimate.lambda_home);
        assert_eq!(config.min_lambda, estimate.lambda_away);

        let estimate = estimate_for(&dataset, "B", "A", &config);
        assert_eq!(config.min_lambda, estimate.lambda_home);
        assert_eq!(config.max_lambda, estimate.lambda_away);
    }

    #[test]
    fn anchor_meets_target_at_full_weight() {
        let anchor = anchor_scale(11.0, 9.5, 0.3, 1.0).unwrap();
        assert_eq!(anchor.best_scale, anchor.scale);
        assert!(anchor.scale < 1.0, "{anchor:?}");
        assert_float_absolute_eq!(0.3, poisson::over_prob(11.0 * anchor.scale, 9.5), 1e-6);
    }

    #[test]
    fn anchor_blends_with_identity() {
        let anchor = anchor_scale(11.0, 9.5, 0.3, 0.35).unwrap();
        assert_float_absolute_eq!(0.65 + 0.35 * anchor.best_scale, anchor.scale);

        let anchor = anchor_scale(11.0, 9.5, 0.3, 0.0).unwrap();
        assert_float_absolute_eq!(1.0, anchor.scale);
    }

    #[test]
    fn anchor_target_clamped() {
        let unclamped = anchor_scale(8.0, 9.5, 1.0, 1.0).unwrap();
        let clamped = anchor_scale(8.0, 9.5, 0.999, 1.0).unwrap();
        assert_eq!(clamped, unclamped);
    }

    #[test]
    fn anchor_applied_to_both_sides() {
        let config = Config::default();
        let estimate = estimate_for(&Dataset::new(history()), "A", "B", &config);
        assert_eq!(Some(9.5), estimate.anchor_line);
        let anchor = anchor_scale(11.0, 9.5, config.anchor_target_over_prob, config.anchor_weight).unwrap();
        assert_float_absolute_eq!(anchor.scale, estimate.anchor_scale);
        assert_float_absolute_eq!(7.0 * anchor.scale, estimate.lambda_home);
        assert_float_absolute_eq!(4.0 * anchor.scale, estimate.lambda_away);
    }
}
