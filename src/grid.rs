//! The bookmaker grid: a fixed table of quotable decimal odds, arranged in complementary pairs
//! covering a two-outcome market. Computed prices are snapped to the grid before quoting.

use std::sync::OnceLock;

use crate::probs::SliceExt;

/// Tolerance used when matching a grid price against the pair table.
const PAIR_TOLERANCE: f64 = 1e-6;

/// Floor applied to a margin-adjusted probability before inversion.
const MIN_PROB: f64 = 1e-12;

pub const GRID: [(f64, f64); 85] = [
    (1.01, 11.56),
    (1.02, 10.28),
    (1.03, 9.25),
    (1.04, 8.41),
    (1.05, 7.71),
    (1.06, 7.12),
    (1.08, 6.61),
    (1.09, 6.17),
    (1.10, 5.78),
    (1.11, 5.44),
    (1.13, 5.14),
    (1.14, 4.87),
    (1.16, 4.63),
    (1.17, 4.40),
    (1.19, 4.20),
    (1.20, 4.02),
    (1.22, 3.85),
    (1.23, 3.70),
    (1.25, 3.56),
    (1.27, 3.43),
    (1.28, 3.30),
    (1.30, 3.19),
    (1.32, 3.08),
    (1.34, 2.98),
    (1.36, 2.89),
    (1.38, 2.80),
    (1.40, 2.72),
    (1.42, 2.64),
    (1.4453, 2.5694),
    (1.4683, 2.5000),
    (1.4919, 2.4342),
    (1.5164, 2.3718),
    (1.5417, 2.3125),
    (1.5678, 2.2561),
    (1.5948, 2.2024),
    (1.6228, 2.1512),
    (1.6518, 2.1023),
    (1.6818, 2.0556),
    (1.7130, 2.0109),
    (1.7453, 1.9681),
    (1.7788, 1.9271),
    (1.8137, 1.8878),
    (1.8500, 1.8500),
    (1.8878, 1.8137),
    (1.9271, 1.7788),
    (1.9681, 1.7453),
    (2.0109, 1.7130),
    (2.0556, 1.6818),
    (2.1023, 1.6518),
    (2.1512, 1.6228),
    (2.2024, 1.5948),
    (2.2561, 1.5678),
    (2.3125, 1.5417),
    (2.3718, 1.5164),
    (2.4342, 1.4919),
    (2.5000, 1.4683),
    (2.5694, 1.4453),
    (2.64, 1.42),
    (2.72, 1.40),
    (2.80, 1.38),
    (2.89, 1.36),
    (2.98, 1.34),
    (3.08, 1.32),
    (3.19, 1.30),
    (3.30, 1.28),
    (3.43, 1.27),
    (3.56, 1.25),
    (3.70, 1.23),
    (3.85, 1.22),
    (4.02, 1.20),
    (4.20, 1.19),
    (4.40, 1.17),
    (4.63, 1.16),
    (4.87, 1.14),
    (5.14, 1.13),
    (5.44, 1.11),
    (5.78, 1.10),
    (6.17, 1.09),
    (6.61, 1.08),
    (7.12, 1.06),
    (7.71, 1.05),
    (8.41, 1.04),
    (9.25, 1.03),
    (10.28, 1.02),
    (11.56, 1.01),
];

/// All distinct grid prices in ascending order.
pub fn ladder() -> &'static [f64] {
    static LADDER: OnceLock<Vec<f64>> = OnceLock::new();
    LADDER.get_or_init(|| {
        let mut prices = GRID
            .iter()
            .flat_map(|&(a, b)| [a, b])
            .collect::<Vec<_>>();
        prices.sort_by(f64::total_cmp);
        prices.dedup();
        prices
    })
}

/// Snaps `price` to the nearest grid value. On a tie the lower value wins. Prices at or below
/// 1.0 (and `NaN`) have no grid equivalent.
pub fn normalize_to_grid(price: f64) -> Option<f64> {
    if price.is_nan() || price <= 1.0 {
        return None;
    }

    let mut nearest = None;
    let mut nearest_distance = f64::INFINITY;
    for &candidate in ladder() {
        let distance = (candidate - price).abs();
        if distance < nearest_distance {
            nearest_distance = distance;
            nearest = Some(candidate);
        }
    }
    nearest
}

/// The complement of `price` within its grid pair, after snapping `price` to the grid.
pub fn get_opposite_odds(price: f64) -> Option<f64> {
    let normalized = normalize_to_grid(price)?;
    GRID.iter().find_map(|&(a, b)| {
        if (a - normalized).abs() < PAIR_TOLERANCE {
            Some(b)
        } else if (b - normalized).abs() < PAIR_TOLERANCE {
            Some(a)
        } else {
            None
        }
    })
}

#[inline]
fn invert(prob: f64) -> f64 {
    1.0 / f64::max(prob, MIN_PROB)
}

/// Converts a pair of outcome probabilities into decimal prices carrying `margin` of overround.
///
/// The probabilities are clamped to the unit interval and rescaled to sum to `1 + margin`
/// before inversion. When `snap` is set, the first price is snapped to the grid and the second
/// is taken as its grid complement, falling back to snapping the raw second price on its own.
/// A pair summing to zero is degenerate and yields no prices.
pub fn normalize_odds_pair(p1: f64, p2: f64, margin: f64, snap: bool) -> (Option<f64>, Option<f64>) {
    let mut probs = [p1, p2];
    probs.sanitise();
    if probs.sum() <= 0.0 {
        return (None, None);
    }
    probs.normalise(1.0 + margin);
    let (price_1, price_2) = (invert(probs[0]), invert(probs[1]));
    if !snap {
        return (Some(price_1), Some(price_2));
    }

    match normalize_to_grid(price_1) {
        None => (None, None),
        Some(snapped_1) => {
            let snapped_2 = get_opposite_odds(snapped_1).or_else(|| normalize_to_grid(price_2));
            (Some(snapped_1), snapped_2)
        }
    }
}

/// Converts three outcome probabilities into margin-adjusted decimal prices. The grid only
/// describes two-outcome markets, so the result is never snapped.
pub fn normalize_odds_triplet(p1: f64, px: f64, p2: f64, margin: f64) -> Option<[f64; 3]> {
    let mut probs = [p1, px, p2];
    probs.sanitise();
    if probs.sum() <= 0.0 {
        return None;
    }
    probs.normalise(1.0 + margin);
    Some(probs.map(invert))
}

/// Sum of the implied probabilities of a set of prices.
pub fn booksum(prices: &[f64]) -> f64 {
    prices.iter().map(|price| 1.0 / price).sum()
}
