//! Corner markets derived from the simulated outcome distributions: 1X2, Asian handicaps, match
//! totals and individual team totals.

use std::fmt;
use std::fmt::Formatter;

use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter};
use tracing::trace;

use crate::config::Config;
use crate::grid::{normalize_odds_pair, normalize_odds_triplet};
use crate::mc::{Histogram, OutcomeDistributions};
use crate::rate::MatchRateEstimate;

/// Minimum gap between the two rates for a side to be called the favorite.
pub const FAVORITE_THRESHOLD: f64 = 0.5;

/// Floor on the non-push probability mass of the level handicap.
const MIN_NON_PUSH: f64 = 1e-12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum Side {
    Home,
    Away,
}
impl Side {
    pub fn opponent(&self) -> Side {
        match self {
            Side::Home => Side::Away,
            Side::Away => Side::Home,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "lowercase")]
pub enum Favorite {
    Home,
    Away,
    Draw,
}
impl Favorite {
    pub fn from_rates(lambda_home: f64, lambda_away: f64) -> Self {
        let diff = lambda_home - lambda_away;
        if diff > FAVORITE_THRESHOLD {
            Favorite::Home
        } else if diff < -FAVORITE_THRESHOLD {
            Favorite::Away
        } else {
            Favorite::Draw
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OneXTwo {
    pub p_home: f64,
    pub p_draw: f64,
    pub p_away: f64,
    /// Home, draw and away prices, unsnapped.
    pub prices: Option<[f64; 3]>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HandicapQuote {
    /// Signed line applied to the quoted side's corner margin.
    pub line: f64,
    pub price: Option<f64>,
}

/// Handicap quotes for each side, from the fixed home/away perspective.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Handicaps {
    pub home: Vec<HandicapQuote>,
    pub away: Vec<HandicapQuote>,
}
impl Handicaps {
    pub fn side(&self, side: Side) -> &[HandicapQuote] {
        match side {
            Side::Home => &self.home,
            Side::Away => &self.away,
        }
    }

    pub fn price(&self, side: Side, line: f64) -> Option<f64> {
        self.side(side)
            .iter()
            .find(|quote| quote.line == line)
            .and_then(|quote| quote.price)
    }

    fn push(&mut self, side: Side, line: f64, price: Option<f64>) {
        let quotes = match side {
            Side::Home => &mut self.home,
            Side::Away => &mut self.away,
        };
        quotes.push(HandicapQuote { line, price });
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TotalQuote {
    pub line: f64,
    pub over: Option<f64>,
    pub under: Option<f64>,
}

/// Everything priced for one match.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchOdds {
    pub home: String,
    pub away: String,
    pub rates: MatchRateEstimate,
    pub expected_total: f64,
    pub favorite: Favorite,
    pub one_x_two: OneXTwo,
    pub handicaps: Handicaps,
    pub totals: Vec<TotalQuote>,
    pub individual_home: Vec<TotalQuote>,
    pub individual_away: Vec<TotalQuote>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MarketQuote {
    pub market: String,
    pub selection: String,
    pub price: Option<f64>,
}

impl MatchOdds {
    pub fn individual_totals(&self, side: Side) -> &[TotalQuote] {
        match side {
            Side::Home => &self.individual_home,
            Side::Away => &self.individual_away,
        }
    }

    /// Flattens every market into one row per selection.
    pub fn quotes(&self) -> Vec<MarketQuote> {
        let mut quotes = vec![];
        let mut quote = |market: &str, selection: String, price: Option<f64>| {
            quotes.push(MarketQuote {
                market: market.into(),
                selection,
                price,
            })
        };

        let [p_home, p_draw, p_away] = match self.one_x_two.prices {
            None => [None; 3],
            Some(prices) => prices.map(Some),
        };
        quote("1X2", "1".into(), p_home);
        quote("1X2", "X".into(), p_draw);
        quote("1X2", "2".into(), p_away);

        for side in Side::iter() {
            for handicap in self.handicaps.side(side) {
                quote(
                    "handicap",
                    format!("{side} {}", HandicapLine(handicap.line)),
                    handicap.price,
                );
            }
        }

        for total in &self.totals {
            quote("total", format!("over {}", total.line), total.over);
            quote("total", format!("under {}", total.line), total.under);
        }

        for side in Side::iter() {
            let market = format!("{side} total");
            for total in self.individual_totals(side) {
                quote(&market, format!("over {}", total.line), total.over);
                quote(&market, format!("under {}", total.line), total.under);
            }
        }
        quotes
    }
}

/// Formats a handicap line as `F(0)`, `F(-1.5)` or `F(+1.5)`.
pub struct HandicapLine(pub f64);

impl fmt::Display for HandicapLine {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.0 == 0.0 {
            write!(f, "F(0)")
        } else {
            write!(f, "F({:+})", self.0)
        }
    }
}

pub fn build(
    home: &str,
    away: &str,
    rates: MatchRateEstimate,
    distributions: &OutcomeDistributions,
    config: &Config,
) -> MatchOdds {
    MatchOdds {
        home: home.into(),
        away: away.into(),
        expected_total: rates.expected_total(),
        favorite: Favorite::from_rates(rates.lambda_home, rates.lambda_away),
        one_x_two: one_x_two(&distributions.diff, config.margin),
        handicaps: handicaps(&distributions.diff, &config.handicap_lines, config.margin),
        totals: totals("total", &distributions.total, &config.total_lines, config.margin),
        individual_home: totals("home total", &distributions.home, &config.it_lines, config.margin),
        individual_away: totals("away total", &distributions.away, &config.it_lines, config.margin),
        rates,
    }
}

pub fn one_x_two(diff: &Histogram, margin: f64) -> OneXTwo {
    let p_home = diff.prob_above(0.0);
    let p_draw = diff.prob_at(0);
    let p_away = diff.prob_below(0.0);
    let prices = normalize_odds_triplet(p_home, p_draw, p_away, margin);
    if prices.is_none() {
        trace!("degenerate 1X2 probabilities ({p_home}, {p_draw}, {p_away})");
    }
    OneXTwo {
        p_home,
        p_draw,
        p_away,
        prices,
    }
}

/// Probability that `side` wins on a half-line: its corner margin plus `line` exceeds zero.
fn handicap_win_prob(diff: &Histogram, side: Side, line: f64) -> f64 {
    match side {
        Side::Home => diff.prob_above(-line),
        Side::Away => diff.prob_below(line),
    }
}

/// Quotes the level line (push refunded) and, for every non-zero magnitude `h`, the pairs
/// home −h v away +h and away −h v home +h.
pub fn handicaps(diff: &Histogram, magnitudes: &[f64], margin: f64) -> Handicaps {
    let mut handicaps = Handicaps::default();
    for &magnitude in magnitudes {
        if magnitude == 0.0 {
            let p_win = diff.prob_above(0.0);
            let p_lose = diff.prob_below(0.0);
            let p_push = 1.0 - (p_win + p_lose);
            let non_push = f64::max(MIN_NON_PUSH, 1.0 - p_push);
            let (home, away) = snapped_pair("handicap F(0)", p_win / non_push, p_lose / non_push, margin);
            handicaps.push(Side::Home, 0.0, home);
            handicaps.push(Side::Away, 0.0, away);
        } else {
            for giver in [Side::Home, Side::Away] {
                let taker = giver.opponent();
                let (giving, taking) = snapped_pair(
                    "handicap",
                    handicap_win_prob(diff, giver, -magnitude),
                    handicap_win_prob(diff, taker, magnitude),
                    margin,
                );
                handicaps.push(giver, -magnitude, giving);
                handicaps.push(taker, magnitude, taking);
            }
        }
    }
    for side in [&mut handicaps.home, &mut handicaps.away] {
        side.sort_by(|a, b| a.line.total_cmp(&b.line));
    }
    handicaps
}

/// Over/under quotes per line. Counts are whole, so a half-line never pushes.
pub fn totals(market: &str, counts: &Histogram, lines: &[f64], margin: f64) -> Vec<TotalQuote> {
    lines
        .iter()
        .map(|&line| {
            let (over, under) = snapped_pair(market, counts.prob_above(line), counts.prob_below(line), margin);
            TotalQuote { line, over, under }
        })
        .collect()
}

fn snapped_pair(market: &str, p1: f64, p2: f64, margin: f64) -> (Option<f64>, Option<f64>) {
    let prices = normalize_odds_pair(p1, p2, margin, true);
    if prices.0.is_none() || prices.1.is_none() {
        trace!("{market}: no grid prices for probabilities ({p1}, {p2})");
    }
    prices
}
