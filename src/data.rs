//! Input tables: historical matches, team strengths, recent form and fixtures.

use std::hash::{Hash, Hasher};
use std::io;
use std::path::Path;
use std::str::FromStr;

use chrono::NaiveDate;
use rustc_hash::{FxHashMap, FxHasher};
use thiserror::Error;
use tracing::debug;

use crate::csv::CsvTable;

#[derive(Debug, Error)]
pub enum InputSchemaError {
    #[error("{table} table is missing column {column} (available: {available:?})")]
    MissingColumn {
        table: &'static str,
        column: String,
        available: Vec<String>,
    },

    #[error("{table} table row {row}: invalid {column} value '{value}'")]
    InvalidValue {
        table: &'static str,
        row: usize,
        column: String,
        value: String,
    },

    #[error("strength of {team} must be positive, got {strength}")]
    NonPositiveStrength { team: String, strength: f64 },

    #[error("{0}")]
    Io(#[from] io::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HistoricalMatchRecord {
    pub home: String,
    pub away: String,
    pub home_corners: u16,
    pub away_corners: u16,
}
impl HistoricalMatchRecord {
    pub fn new(home: impl Into<String>, away: impl Into<String>, home_corners: u16, away_corners: u16) -> Self {
        Self {
            home: home.into().trim().to_string(),
            away: away.into().trim().to_string(),
            home_corners,
            away_corners,
        }
    }
}

/// An immutable collection of historical matches, fingerprinted by content at construction.
#[derive(Debug, Clone)]
pub struct History {
    records: Vec<HistoricalMatchRecord>,
    fingerprint: u64,
}
impl History {
    pub fn records(&self) -> &[HistoricalMatchRecord] {
        &self.records
    }

    /// A content-derived key: equal record sequences yield equal fingerprints.
    pub fn fingerprint(&self) -> u64 {
        self.fingerprint
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn read_csv_file(path: impl AsRef<Path>) -> Result<Self, InputSchemaError> {
        Self::try_from(&CsvTable::open(path)?)
    }
}

impl From<Vec<HistoricalMatchRecord>> for History {
    fn from(records: Vec<HistoricalMatchRecord>) -> Self {
        let mut hasher = FxHasher::default();
        records.hash(&mut hasher);
        let fingerprint = hasher.finish();
        Self {
            records,
            fingerprint,
        }
    }
}

impl TryFrom<&CsvTable> for History {
    type Error = InputSchemaError;

    fn try_from(table: &CsvTable) -> Result<Self, Self::Error> {
        const TABLE: &str = "historical";
        let [home_col, away_col, home_corners_col, away_corners_col] =
            require_columns(TABLE, table, ["HomeTeam", "AwayTeam", "HC", "AC"])?;
        let mut records = Vec::with_capacity(table.rows.len());
        for (row_index, row) in table.rows.iter().enumerate() {
            let row_number = row_index + 1;
            let home = require_team(TABLE, row, row_number, home_col, &table.header)?;
            let away = require_team(TABLE, row, row_number, away_col, &table.header)?;
            let home_corners = parse_corners(TABLE, row, row_number, home_corners_col, &table.header)?;
            let away_corners = parse_corners(TABLE, row, row_number, away_corners_col, &table.header)?;
            records.push(HistoricalMatchRecord::new(home, away, home_corners, away_corners));
        }
        debug!("loaded {} historical matches", records.len());
        Ok(Self::from(records))
    }
}

/// Team strengths; teams absent from the index have a strength of 1.0.
#[derive(Debug, Clone, Default)]
pub struct TeamStrengthIndex {
    strengths: FxHashMap<String, f64>,
}
impl TeamStrengthIndex {
    pub const DEFAULT_STRENGTH: f64 = 1.0;

    pub fn insert(&mut self, team: impl Into<String>, strength: f64) -> Result<(), InputSchemaError> {
        let team = team.into().trim().to_string();
        if !strength.is_finite() || strength <= 0.0 {
            return Err(InputSchemaError::NonPositiveStrength { team, strength });
        }
        self.strengths.insert(team, strength);
        Ok(())
    }

    pub fn get(&self, team: &str) -> f64 {
        self.strengths
            .get(team)
            .copied()
            .unwrap_or(Self::DEFAULT_STRENGTH)
    }

    pub fn len(&self) -> usize {
        self.strengths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strengths.is_empty()
    }

    pub fn read_csv_file(path: impl AsRef<Path>) -> Result<Self, InputSchemaError> {
        Self::try_from(&CsvTable::open(path)?)
    }
}

impl TryFrom<&CsvTable> for TeamStrengthIndex {
    type Error = InputSchemaError;

    fn try_from(table: &CsvTable) -> Result<Self, Self::Error> {
        const TABLE: &str = "team strength";
        let [team_col, strength_col] = require_columns(TABLE, table, ["Team", "Strength"])?;
        let mut index = Self::default();
        for (row_index, row) in table.rows.iter().enumerate() {
            let row_number = row_index + 1;
            let team = require_team(TABLE, row, row_number, team_col, &table.header)?;
            let strength = parse_value::<f64>(TABLE, row, row_number, strength_col, &table.header)?;
            index.insert(team, strength)?;
        }
        Ok(index)
    }
}

impl<S: Into<String>> FromIterator<(S, f64)> for TeamStrengthIndex {
    /// Collects strengths, skipping entries that are not strictly positive.
    fn from_iter<T: IntoIterator<Item = (S, f64)>>(iter: T) -> Self {
        let mut index = Self::default();
        for (team, strength) in iter {
            if let Err(err) = index.insert(team, strength) {
                debug!("skipping strength: {err}");
            }
        }
        index
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecentFormRecord {
    pub date: NaiveDate,
    pub side_a: String,
    pub side_b: String,
    pub side_a_corners: u16,
    pub side_b_corners: u16,
}
impl RecentFormRecord {
    /// The corner counts (for, against) and the opponent, from the perspective of `team`.
    pub fn perspective(&self, team: &str) -> Option<(u16, u16, &str)> {
        if self.side_a == team {
            Some((self.side_a_corners, self.side_b_corners, &self.side_b))
        } else if self.side_b == team {
            Some((self.side_b_corners, self.side_a_corners, &self.side_a))
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct FormHistory {
    records: Vec<RecentFormRecord>,
}
impl FormHistory {
    pub fn records(&self) -> &[RecentFormRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The last `n` games involving `team`, in ascending date order. Games on the same date
    /// keep their source order.
    pub fn last_games(&self, team: &str, n: usize) -> Vec<&RecentFormRecord> {
        let mut games = self
            .records
            .iter()
            .filter(|record| record.side_a == team || record.side_b == team)
            .collect::<Vec<_>>();
        games.sort_by_key(|record| record.date);
        let skip = games.len().saturating_sub(n);
        games.split_off(skip)
    }

    pub fn read_csv_file(path: impl AsRef<Path>) -> Result<Self, InputSchemaError> {
        Self::try_from(&CsvTable::open(path)?)
    }
}

impl From<Vec<RecentFormRecord>> for FormHistory {
    fn from(records: Vec<RecentFormRecord>) -> Self {
        Self { records }
    }
}

impl TryFrom<&CsvTable> for FormHistory {
    type Error = InputSchemaError;

    /// Accepts either a league-table layout (`Date, HomeTeam, AwayTeam, HC, AC`) or a compact
    /// layout (`Date, p1, p2, score_p1, score_p2`). Rows with an unreadable date or corner count
    /// are dropped.
    fn try_from(table: &CsvTable) -> Result<Self, Self::Error> {
        const TABLE: &str = "form";
        const COMPACT: [&str; 5] = ["Date", "p1", "p2", "score_p1", "score_p2"];
        const LEAGUE: [&str; 5] = ["Date", "HomeTeam", "AwayTeam", "HC", "AC"];
        let columns = if table.has_columns(&COMPACT) { COMPACT } else { LEAGUE };
        let [date, side_a, side_b, side_a_corners, side_b_corners] =
            require_columns(TABLE, table, columns)?;

        let mut records = Vec::with_capacity(table.rows.len());
        let mut dropped = 0;
        for row in &table.rows {
            let cell = |index: usize| row.get(index).map(String::as_str).unwrap_or_default();
            let parsed = (
                parse_date(cell(date)),
                cell(side_a),
                cell(side_b),
                cell(side_a_corners).parse::<f64>().ok().and_then(to_corners),
                cell(side_b_corners).parse::<f64>().ok().and_then(to_corners),
            );
            match parsed {
                (Some(date), side_a, side_b, Some(side_a_corners), Some(side_b_corners))
                    if !side_a.is_empty() && !side_b.is_empty() =>
                {
                    records.push(RecentFormRecord {
                        date,
                        side_a: side_a.to_string(),
                        side_b: side_b.to_string(),
                        side_a_corners,
                        side_b_corners,
                    });
                }
                _ => dropped += 1,
            }
        }
        debug!("loaded {} form records, dropped {dropped}", records.len());
        Ok(Self::from(records))
    }
}

/// The tables a match calculation draws on. Form is optional; without it, both form factors
/// are neutral.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub history: History,
    pub strengths: TeamStrengthIndex,
    pub form: Option<FormHistory>,
}
impl Dataset {
    pub fn new(history: History) -> Self {
        Self {
            history,
            strengths: TeamStrengthIndex::default(),
            form: None,
        }
    }

    pub fn with_strengths(self, strengths: TeamStrengthIndex) -> Self {
        Self { strengths, ..self }
    }

    pub fn with_form(self, form: FormHistory) -> Self {
        Self {
            form: Some(form),
            ..self
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fixture {
    pub home: String,
    pub away: String,
}
impl Fixture {
    pub fn new(home: impl Into<String>, away: impl Into<String>) -> Self {
        Self {
            home: home.into().trim().to_string(),
            away: away.into().trim().to_string(),
        }
    }
}

/// Reads fixtures from a table with either `HomeTeam, AwayTeam`, `home, away` or `p1, p2` columns.
pub fn read_fixtures(table: &CsvTable) -> Result<Vec<Fixture>, InputSchemaError> {
    const LAYOUTS: [[&str; 2]; 3] = [["HomeTeam", "AwayTeam"], ["home", "away"], ["p1", "p2"]];
    let layout = LAYOUTS
        .iter()
        .find(|layout| table.has_columns(&layout[..]))
        .copied()
        .unwrap_or(LAYOUTS[0]);
    let [home, away] = require_columns("fixtures", table, layout)?;
    Ok(table
        .rows
        .iter()
        .map(|row| {
            Fixture::new(
                row.get(home).cloned().unwrap_or_default(),
                row.get(away).cloned().unwrap_or_default(),
            )
        })
        .collect())
}

pub fn read_fixtures_file(path: impl AsRef<Path>) -> Result<Vec<Fixture>, InputSchemaError> {
    read_fixtures(&CsvTable::open(path)?)
}

fn require_columns<const N: usize>(
    table_name: &'static str,
    table: &CsvTable,
    names: [&str; N],
) -> Result<[usize; N], InputSchemaError> {
    let mut indexes = [0; N];
    for (ordinal, name) in names.iter().enumerate() {
        indexes[ordinal] = table
            .column(name)
            .ok_or_else(|| InputSchemaError::MissingColumn {
                table: table_name,
                column: name.to_string(),
                available: table.header.clone(),
            })?;
    }
    Ok(indexes)
}

fn require_team<'a>(
    table_name: &'static str,
    row: &'a [String],
    row_number: usize,
    column: usize,
    header: &[String],
) -> Result<&'a str, InputSchemaError> {
    match row.get(column).map(|team| team.trim()) {
        Some(team) if !team.is_empty() && !team.eq_ignore_ascii_case("nan") => Ok(team),
        other => Err(InputSchemaError::InvalidValue {
            table: table_name,
            row: row_number,
            column: header[column].clone(),
            value: other.unwrap_or_default().to_string(),
        }),
    }
}

fn parse_value<T: FromStr>(
    table_name: &'static str,
    row: &[String],
    row_number: usize,
    column: usize,
    header: &[String],
) -> Result<T, InputSchemaError> {
    let value = row.get(column).map(String::as_str).unwrap_or_default();
    value.parse().map_err(|_| InputSchemaError::InvalidValue {
        table: table_name,
        row: row_number,
        column: header[column].clone(),
        value: value.to_string(),
    })
}

fn parse_corners(
    table_name: &'static str,
    row: &[String],
    row_number: usize,
    column: usize,
    header: &[String],
) -> Result<u16, InputSchemaError> {
    let value = parse_value::<f64>(table_name, row, row_number, column, header)?;
    to_corners(value).ok_or_else(|| InputSchemaError::InvalidValue {
        table: table_name,
        row: row_number,
        column: header[column].clone(),
        value: value.to_string(),
    })
}

/// Corner counts may be written as floats (`6.0`) but must be whole and non-negative.
fn to_corners(value: f64) -> Option<u16> {
    if value.is_finite() && value >= 0.0 && value.fract() == 0.0 && value <= u16::MAX as f64 {
        Some(value as u16)
    } else {
        None
    }
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    // two-digit years first, since %Y would also accept them
    const FORMATS: [&str; 4] = ["%d/%m/%y", "%d/%m/%Y", "%Y-%m-%d", "%d.%m.%Y"];
    FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(value, format).ok())
}
