//! Per-team corner profiles aggregated over the historical matches, and a caller-owned cache
//! keyed by the content fingerprint of the history they were built from.

use std::ops::{Add, AddAssign};
use std::sync::{Arc, Mutex, PoisonError};

use rustc_hash::FxHashMap;
use tracing::debug;

use crate::data::History;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TeamCornerProfile {
    /// Mean corners won by the team, home and away.
    pub for_avg: f64,
    /// Mean corners conceded by the team, home and away.
    pub against_avg: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TeamProfiles {
    profiles: FxHashMap<String, TeamCornerProfile>,
}
impl TeamProfiles {
    pub fn get(&self, team: &str) -> Option<&TeamCornerProfile> {
        self.profiles.get(team)
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

impl From<&History> for TeamProfiles {
    fn from(history: &History) -> Self {
        #[derive(Default)]
        struct Totals {
            corners_for: u64,
            corners_against: u64,
            games: u64,
        }

        let mut totals: FxHashMap<&str, Totals> = FxHashMap::default();
        for record in history.records() {
            for (team, corners_for, corners_against) in [
                (&record.home, record.home_corners, record.away_corners),
                (&record.away, record.away_corners, record.home_corners),
            ] {
                if team.is_empty() {
                    continue;
                }
                let team_totals = totals.entry(team.as_str()).or_default();
                team_totals.corners_for += corners_for as u64;
                team_totals.corners_against += corners_against as u64;
                team_totals.games += 1;
            }
        }

        let profiles = totals
            .into_iter()
            .map(|(team, totals)| {
                let games = totals.games as f64;
                (
                    team.to_string(),
                    TeamCornerProfile {
                        for_avg: totals.corners_for as f64 / games,
                        against_avg: totals.corners_against as f64 / games,
                    },
                )
            })
            .collect();
        Self { profiles }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: usize,
    pub misses: usize,
}

impl Add<bool> for CacheStats {
    type Output = CacheStats;

    fn add(self, cache_hit: bool) -> Self::Output {
        if cache_hit {
            Self {
                hits: self.hits + 1,
                ..self
            }
        } else {
            Self {
                misses: self.misses + 1,
                ..self
            }
        }
    }
}

impl AddAssign<bool> for CacheStats {
    fn add_assign(&mut self, cache_hit: bool) {
        if cache_hit {
            self.hits += 1;
        } else {
            self.misses += 1;
        }
    }
}

#[derive(Debug, Default)]
struct CacheState {
    entry: Option<(u64, Arc<TeamProfiles>)>,
    stats: CacheStats,
}

/// Holds the profiles of the most recently seen history. Profiles are rebuilt whenever a history
/// with a different fingerprint is presented. Building happens under the lock, so there is
/// a single writer; readers share the built profiles through an [`Arc`].
#[derive(Debug, Default)]
pub struct ProfileCache {
    state: Mutex<CacheState>,
}
impl ProfileCache {
    pub fn get_or_build(&self, history: &History) -> Arc<TeamProfiles> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let fingerprint = history.fingerprint();
        let cached = match &state.entry {
            Some((key, profiles)) if *key == fingerprint => Some(profiles.clone()),
            _ => None,
        };
        state.stats += cached.is_some();
        match cached {
            Some(profiles) => profiles,
            None => {
                let profiles = Arc::new(TeamProfiles::from(history));
                debug!(
                    "built {} team profiles from {} matches (fingerprint {fingerprint:#x})",
                    profiles.len(),
                    history.len()
                );
                state.entry = Some((fingerprint, profiles.clone()));
                profiles
            }
        }
    }

    pub fn stats(&self) -> CacheStats {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .stats
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use assert_float_eq::*;

    use crate::data::HistoricalMatchRecord;

    use super::*;

    fn history() -> History {
        History::from(vec![
            HistoricalMatchRecord::new("A", "B", 6, 2),
            HistoricalMatchRecord::new("B", "A", 4, 5),
            HistoricalMatchRecord::new("A", "C", 8, 1),
        ])
    }

    #[test]
    fn profiles_from_history() {
        let profiles = TeamProfiles::from(&history());
        assert_eq!(3, profiles.len());

        let a = profiles.get("A").unwrap();
        assert_float_absolute_eq!((6.0 + 5.0 + 8.0) / 3.0, a.for_avg);
        assert_float_absolute_eq!((2.0 + 4.0 + 1.0) / 3.0, a.against_avg);

        let b = profiles.get("B").unwrap();
        assert_float_absolute_eq!(3.0, b.for_avg);
        assert_float_absolute_eq!(5.5, b.against_avg);

        let c = profiles.get("C").unwrap();
        assert_float_absolute_eq!(1.0, c.for_avg);
        assert_float_absolute_eq!(8.0, c.against_avg);

        assert_eq!(None, profiles.get("D"));
    }

    #[test]
    fn profiles_skip_blank_teams() {
        let profiles = TeamProfiles::from(&History::from(vec![HistoricalMatchRecord::new(
            " ", "B", 6, 2,
        )]));
        assert_eq!(1, profiles.len());
        assert!(profiles.get("").is_none());
    }

    #[test]
    fn cache_hits_for_same_content() {
        let cache = ProfileCache::default();
        let first = cache.get_or_build(&history());
        let second = cache.get_or_build(&history());
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(CacheStats { hits: 1, misses: 1 }, cache.stats());
    }

    #[test]
    fn cache_rebuilds_for_replaced_history() {
        let cache = ProfileCache::default();
        let first = cache.get_or_build(&history());
        let replaced = History::from(vec![HistoricalMatchRecord::new("A", "B", 10, 0)]);
        let second = cache.get_or_build(&replaced);
        assert!(!Arc::ptr_eq(&first, &second));
        assert_float_absolute_eq!(10.0, second.get("A").unwrap().for_avg);
        assert_eq!(CacheStats { hits: 0, misses: 2 }, cache.stats());
    }

    #[test]
    fn add_bool() {
        assert_eq!(CacheStats { hits: 1, misses: 0 }, CacheStats::default() + true);
        assert_eq!(CacheStats { hits: 0, misses: 1 }, CacheStats::default() + false);
    }

    #[test]
    fn add_assign_bool() {
        let mut cs = CacheStats { hits: 1, misses: 0 };
        cs += false;
        assert_eq!(CacheStats { hits: 1, misses: 1 }, cs);
        cs += true;
        assert_eq!(CacheStats { hits: 2, misses: 1 }, cs);
    }
}
