//! Advisory consistency checks over a priced match. Nothing here fails or alters the odds; every
//! finding is returned as a [`ConsistencyWarning`].

use std::ops::RangeInclusive;

use strum::IntoEnumIterator;
use thiserror::Error;

use crate::config::Config;
use crate::grid::booksum;
use crate::market::{MatchOdds, Side, TotalQuote};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConsistencyWarning {
    #[error("{side} F({line:+}): {price:.2} should be at least F({next_line:+}) ({next_price:.2})")]
    HandicapOrder {
        side: Side,
        line: f64,
        price: f64,
        next_line: f64,
        next_price: f64,
    },

    #[error("{market} {line}: booksum {booksum:.3} outside {low:.3}..={high:.3}")]
    Booksum {
        market: String,
        line: f64,
        booksum: f64,
        low: f64,
        high: f64,
    },
}

pub fn validate(odds: &MatchOdds, config: &Config) -> Vec<ConsistencyWarning> {
    let mut warnings = vec![];
    for side in Side::iter() {
        check_handicap_order(odds, side, &mut warnings);
    }

    let band = config.booksum_band();
    check_booksums("total", &odds.totals, &band, &mut warnings);
    for side in Side::iter() {
        check_booksums(&format!("{side} total"), odds.individual_totals(side), &band, &mut warnings);
    }
    warnings
}

/// Among lines of the same sign, a longer handicap must not be priced below a shorter one. Level
/// lines are exempt.
fn check_handicap_order(odds: &MatchOdds, side: Side, warnings: &mut Vec<ConsistencyWarning>) {
    let mut quoted = odds
        .handicaps
        .side(side)
        .iter()
        .filter_map(|quote| quote.price.map(|price| (quote.line, price)))
        .collect::<Vec<_>>();
    quoted.sort_by(|a, b| a.0.total_cmp(&b.0));

    for pair in quoted.windows(2) {
        let ((line, price), (next_line, next_price)) = (pair[0], pair[1]);
        let same_sign = (line < 0.0 && next_line < 0.0) || (line > 0.0 && next_line > 0.0);
        if same_sign && price < next_price {
            warnings.push(ConsistencyWarning::HandicapOrder {
                side,
                line,
                price,
                next_line,
                next_price,
            });
        }
    }
}

fn check_booksums(
    market: &str,
    quotes: &[TotalQuote],
    band: &RangeInclusive<f64>,
    warnings: &mut Vec<ConsistencyWarning>,
) {
    for quote in quotes {
        let (Some(over), Some(under)) = (quote.over, quote.under) else {
            continue;
        };
        let booksum = booksum(&[over, under]);
        if !band.contains(&booksum) {
            warnings.push(ConsistencyWarning::Booksum {
                market: market.into(),
                line: quote.line,
                booksum,
                low: *band.start(),
                high: *band.end(),
            });
        }
    }
}
