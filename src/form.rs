//! Recent-form adjustment. A team's last few games are scored against the norms of the opponents
//! it met: corners won above what the opponent usually concedes, plus corners conceded below what
//! the opponent usually wins. The mean residual is mapped to a clipped multiplicative factor.

use tracing::debug;

use crate::config::Config;
use crate::data::FormHistory;
use crate::profile::TeamProfiles;
use crate::probs::SliceExt;

#[derive(Debug, Clone, PartialEq)]
pub struct FormFactor {
    pub value: f64,
    /// Games that contributed a residual.
    pub games: usize,
    /// Games skipped because the opponent has no profile.
    pub skipped: usize,
}
impl FormFactor {
    pub const NEUTRAL: FormFactor = FormFactor {
        value: 1.0,
        games: 0,
        skipped: 0,
    };
}

impl Default for FormFactor {
    fn default() -> Self {
        Self::NEUTRAL
    }
}

pub fn form_factor(form: &FormHistory, team: &str, profiles: &TeamProfiles, config: &Config) -> FormFactor {
    let games = form.last_games(team, config.form_n_games);
    let mut residuals = Vec::with_capacity(games.len());
    let mut skipped = 0;
    for game in games {
        let Some((corners_for, corners_against, opponent)) = game.perspective(team) else {
            continue;
        };
        let Some(opponent_profile) = profiles.get(opponent) else {
            debug!("{team}: no profile for opponent {opponent} on {}, skipping", game.date);
            skipped += 1;
            continue;
        };
        let attack = corners_for as f64 - opponent_profile.against_avg;
        let defence = opponent_profile.for_avg - corners_against as f64;
        debug!(
            "{team} vs {opponent} on {}: for={corners_for} (opp allows {:.2}) atk {attack:+.2} | against={corners_against} (opp wins {:.2}) def {defence:+.2}",
            game.date, opponent_profile.against_avg, opponent_profile.for_avg
        );
        residuals.push(attack + defence);
    }

    let Some(score) = residuals.mean() else {
        return FormFactor {
            skipped,
            ..FormFactor::NEUTRAL
        };
    };
    let raw = f64::exp(config.form_beta * score);
    let value = raw.clamp(config.form_clip_low, config.form_clip_high);
    debug!(
        "{team}: form score {score:+.2} over {} games, exp(beta * score)={raw:.3}, factor={value:.3}",
        residuals.len()
    );
    FormFactor {
        value,
        games: residuals.len(),
        skipped,
    }
}

#[cfg(test)]
mod tests {
    use assert_float_eq::*;
    use chrono::NaiveDate;

    use crate::data::{HistoricalMatchRecord, History, RecentFormRecord};

    use super::*;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, day).unwrap()
    }

    fn game(day: u32, side_a: &str, side_b: &str, side_a_corners: u16, side_b_corners: u16) -> RecentFormRecord {
        RecentFormRecord {
            date: date(day),
            side_a: side_a.into(),
            side_b: side_b.into(),
            side_a_corners,
            side_b_corners,
        }
    }

    /// B wins 4 and concedes 5 on average; C wins 5 and concedes 4.
    fn profiles() -> TeamProfiles {
        TeamProfiles::from(&History::from(vec![
            HistoricalMatchRecord::new("B", "C", 4, 6),
            HistoricalMatchRecord::new("C", "B", 4, 4),
        ]))
    }

    #[test]
    fn neutral_without_games() {
        let factor = form_factor(&FormHistory::default(), "A", &profiles(), &Config::default());
        assert_eq!(FormFactor::NEUTRAL, factor);
    }

    #[test]
    fn neutral_when_all_opponents_unknown() {
        let form = FormHistory::from(vec![game(1, "A", "X", 9, 1), game(2, "Y", "A", 1, 9)]);
        let factor = form_factor(&form, "A", &profiles(), &Config::default());
        assert_eq!(
            FormFactor {
                value: 1.0,
                games: 0,
                skipped: 2
            },
            factor
        );
    }

    #[test]
    fn residual_from_both_sides() {
        let profiles = profiles();
        let b = profiles.get("B").unwrap();
        assert_float_absolute_eq!(4.0, b.for_avg);
        assert_float_absolute_eq!(5.0, b.against_avg);

        // A as side A: atk = 7 - 5 = 2, def = 4 - 3 = 1
        // A as side B vs C: atk = 6 - 4 = 2, def = 5 - 6 = -1
        let form = FormHistory::from(vec![game(1, "A", "B", 7, 3), game(2, "C", "A", 6, 6)]);
        let config = Config {
            form_clip_low: 0.5,
            form_clip_high: 2.0,
            ..Config::default()
        };
        let factor = form_factor(&form, "A", &profiles, &config);
        assert_eq!(2, factor.games);
        assert_eq!(0, factor.skipped);
        assert_float_absolute_eq!(f64::exp(0.1 * 2.0), factor.value);
    }

    #[test]
    fn unknown_opponents_excluded_from_mean() {
        // A v B: atk = 7 - 5 = 2, def = 4 - 3 = 1; the games against X and Y would pull far down
        let form = FormHistory::from(vec![
            game(1, "A", "X", 0, 15),
            game(2, "A", "B", 7, 3),
            game(3, "Y", "A", 12, 1),
        ]);
        let config = Config {
            form_clip_low: 0.5,
            form_clip_high: 2.0,
            ..Config::default()
        };
        let factor = form_factor(&form, "A", &profiles(), &config);
        assert_eq!(1, factor.games);
        assert_eq!(2, factor.skipped);
        assert_float_absolute_eq!(f64::exp(0.1 * 3.0), factor.value);
    }

    #[test]
    fn clipped_to_bounds() {
        let config = Config::default();
        let hot = FormHistory::from(vec![game(1, "A", "B", 20, 0)]);
        assert_float_absolute_eq!(
            config.form_clip_high,
            form_factor(&hot, "A", &profiles(), &config).value
        );

        let cold = FormHistory::from(vec![game(1, "A", "B", 0, 20)]);
        assert_float_absolute_eq!(
            config.form_clip_low,
            form_factor(&cold, "A", &profiles(), &config).value
        );
    }

    #[test]
    fn only_last_games_count() {
        let config = Config {
            form_n_games: 1,
            form_clip_low: 0.1,
            form_clip_high: 10.0,
            ..Config::default()
        };
        // the older game would drag the score far down
        let form = FormHistory::from(vec![game(2, "A", "B", 5, 4), game(1, "A", "B", 0, 20)]);
        let factor = form_factor(&form, "A", &profiles(), &config);
        assert_eq!(1, factor.games);
        assert_float_absolute_eq!(1.0, factor.value);
    }
}
