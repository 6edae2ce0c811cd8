//! End-to-end pricing of a match, and of a batch of fixtures.

use thiserror::Error;
use tracing::{debug, warn};

use crate::config::{Config, ValidationError};
use crate::data::{Dataset, Fixture, InputSchemaError};
use crate::market::{self, MatchOdds};
use crate::mc::SimulatedOutcomeSet;
use crate::profile::{CacheStats, ProfileCache};
use crate::rate;
use crate::timed::Timed;
use crate::validate::{validate, ConsistencyWarning};

#[derive(Debug, Error)]
pub enum CalculationError {
    /// A malformed input table. Every match in a batch shares the same tables, so a schema error
    /// raised while loading them is fatal for the whole batch rather than for one fixture.
    #[error("{0}")]
    InputSchema(#[from] InputSchemaError),

    #[error("invalid config: {0}")]
    InvalidConfig(#[from] ValidationError),

    #[error("historical table holds no matches")]
    EmptyHistory,

    #[error("team id must not be blank")]
    BlankTeam,
}

/// Prices matches under a fixed configuration. Team profiles are built once per distinct history
/// and shared between calculations; the calculator may be shared between threads.
#[derive(Debug)]
pub struct CornerOddsCalculator {
    config: Config,
    cache: ProfileCache,
}
impl CornerOddsCalculator {
    pub fn new(config: Config) -> Result<Self, CalculationError> {
        config.validate()?;
        Ok(Self {
            config,
            cache: ProfileCache::default(),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn calculate(&self, dataset: &Dataset, home: &str, away: &str) -> Result<MatchOdds, CalculationError> {
        let (home, away) = (home.trim(), away.trim());
        if home.is_empty() || away.is_empty() {
            return Err(CalculationError::BlankTeam);
        }

        let profiles = self.cache.get_or_build(&dataset.history);
        let rates = rate::estimate(dataset, &profiles, home, away, &self.config)?;

        let outcomes = Timed::value(|| {
            SimulatedOutcomeSet::simulate(
                rates.lambda_home,
                rates.lambda_away,
                self.config.n_simulations,
                self.config.seed,
            )
        });
        debug!(
            "{home} v {away}: simulated {} outcomes in {:?}",
            outcomes.value.len(),
            outcomes.elapsed
        );
        let distributions = outcomes.value.distributions();
        Ok(market::build(home, away, rates, &distributions, &self.config))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PricedFixture {
    pub odds: MatchOdds,
    pub warnings: Vec<ConsistencyWarning>,
}

/// Prices every fixture independently. A failure is logged and returned in place of that
/// fixture's odds; the rest of the batch is unaffected.
pub fn price_fixtures(
    calculator: &CornerOddsCalculator,
    dataset: &Dataset,
    fixtures: &[Fixture],
) -> Vec<Result<PricedFixture, CalculationError>> {
    fixtures
        .iter()
        .map(|fixture| {
            let priced = Timed::result(|| calculator.calculate(dataset, &fixture.home, &fixture.away));
            match priced {
                Ok(odds) => {
                    debug!("priced {} v {} in {:?}", fixture.home, fixture.away, odds.elapsed);
                    let warnings = validate(&odds.value, calculator.config());
                    Ok(PricedFixture {
                        odds: odds.value,
                        warnings,
                    })
                }
                Err(err) => {
                    warn!("could not price {} v {}: {err}", fixture.home, fixture.away);
                    Err(err)
                }
            }
        })
        .collect()
}
