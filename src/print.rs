use stanza::style::HAlign::Left;
use stanza::style::{HAlign, Header, MinWidth, Styles};
use stanza::table::{Col, Row, Table};

use crate::market::{HandicapLine, MatchOdds, Side, TotalQuote};
use crate::validate::ConsistencyWarning;

const NO_PRICE: &str = "—";

fn format_price(price: Option<f64>) -> String {
    match price {
        None => NO_PRICE.into(),
        Some(price) => format!("{price:.2}"),
    }
}

fn header(labels: &[&str]) -> Row {
    Row::new(
        Styles::default().with(Header(true)),
        labels.iter().map(|&label| label.into()).collect(),
    )
}

pub fn tabulate_rates(odds: &MatchOdds) -> Table {
    let rates = &odds.rates;
    let mut table = Table::default().with_cols(vec![
        Col::new(Styles::default().with(MinWidth(16)).with(Left)),
        Col::new(Styles::default().with(MinWidth(10)).with(HAlign::Right)),
        Col::new(Styles::default().with(MinWidth(10)).with(HAlign::Right)),
    ]);
    table.push_row(header(&["", odds.home.as_str(), odds.away.as_str()]));
    for (label, home, away) in [
        ("Base λ", rates.base_lambda_home, rates.base_lambda_away),
        ("Strength", rates.strength_home, rates.strength_away),
        ("Form", rates.form_home, rates.form_away),
        ("λ", rates.lambda_home, rates.lambda_away),
    ] {
        table.push_row(Row::new(
            Styles::default(),
            vec![
                label.into(),
                format!("{home:.3}").into(),
                format!("{away:.3}").into(),
            ],
        ));
    }
    let anchor = match rates.anchor_line {
        None => "off".to_string(),
        Some(line) => format!("{line} × {:.3}", rates.anchor_scale),
    };
    for (label, value) in [
        ("Strength ratio", format!("{:.3}", rates.strength_ratio)),
        ("Anchor", anchor),
        ("Expected total", format!("{:.2}", odds.expected_total)),
        ("Favorite", odds.favorite.to_string()),
    ] {
        table.push_row(Row::new(
            Styles::default(),
            vec![label.into(), value.into(), "".into()],
        ));
    }
    table
}

pub fn tabulate_one_x_two(odds: &MatchOdds) -> Table {
    let market = &odds.one_x_two;
    let mut table = Table::default().with_cols(vec![
        Col::new(Styles::default().with(MinWidth(6)).with(Left)),
        Col::new(Styles::default().with(MinWidth(8)).with(HAlign::Right)),
        Col::new(Styles::default().with(MinWidth(8)).with(HAlign::Right)),
    ]);
    table.push_row(header(&["", "Prob", "Price"]));
    let prices = market.prices.map(|prices| prices.map(Some)).unwrap_or([None; 3]);
    for ((label, prob), price) in [("1", market.p_home), ("X", market.p_draw), ("2", market.p_away)]
        .into_iter()
        .zip(prices)
    {
        table.push_row(Row::new(
            Styles::default(),
            vec![
                label.into(),
                format!("{prob:.4}").into(),
                format_price(price).into(),
            ],
        ));
    }
    table
}

/// Handicaps by line, one column per side.
pub fn tabulate_handicaps(odds: &MatchOdds) -> Table {
    let mut lines = odds
        .handicaps
        .home
        .iter()
        .chain(&odds.handicaps.away)
        .map(|quote| quote.line)
        .collect::<Vec<_>>();
    lines.sort_by(f64::total_cmp);
    lines.dedup();

    let mut table = Table::default().with_cols(vec![
        Col::new(Styles::default().with(MinWidth(8)).with(Left)),
        Col::new(Styles::default().with(MinWidth(10)).with(HAlign::Right)),
        Col::new(Styles::default().with(MinWidth(10)).with(HAlign::Right)),
    ]);
    table.push_row(header(&["Line", odds.home.as_str(), odds.away.as_str()]));
    for line in lines {
        table.push_row(Row::new(
            Styles::default(),
            vec![
                HandicapLine(line).to_string().into(),
                format_price(odds.handicaps.price(Side::Home, line)).into(),
                format_price(odds.handicaps.price(Side::Away, line)).into(),
            ],
        ));
    }
    table
}

pub fn tabulate_totals(title: &str, quotes: &[TotalQuote]) -> Table {
    let mut table = Table::default().with_cols(vec![
        Col::new(Styles::default().with(MinWidth(12)).with(Left)),
        Col::new(Styles::default().with(MinWidth(8)).with(HAlign::Right)),
        Col::new(Styles::default().with(MinWidth(8)).with(HAlign::Right)),
    ]);
    table.push_row(header(&[title, "Over", "Under"]));
    for quote in quotes {
        table.push_row(Row::new(
            Styles::default(),
            vec![
                format!("{}", quote.line).into(),
                format_price(quote.over).into(),
                format_price(quote.under).into(),
            ],
        ));
    }
    table
}

pub fn tabulate_warnings(warnings: &[ConsistencyWarning]) -> Table {
    let mut table = Table::default().with_cols(vec![Col::new(Styles::default().with(MinWidth(40)).with(Left))]);
    table.push_row(header(&["Warning"]));
    for warning in warnings {
        table.push_row(Row::new(Styles::default(), vec![warning.to_string().into()]));
    }
    table
}
