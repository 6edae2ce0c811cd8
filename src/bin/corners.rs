use std::env;
use std::error::Error;
use std::path::{Path, PathBuf};

use anyhow::bail;
use clap::Parser;
use stanza::renderer::console::Console;
use stanza::renderer::Renderer;
use tracing::{debug, info, warn};

use corner_odds::calc::{price_fixtures, CornerOddsCalculator, PricedFixture};
use corner_odds::config::Config;
use corner_odds::csv::CsvWriter;
use corner_odds::data::{read_fixtures_file, Dataset, Fixture, FormHistory, History, TeamStrengthIndex};
use corner_odds::market::Side;
use corner_odds::print;

#[derive(Debug, clap::Parser, Clone)]
struct Args {
    /// historical matches (HomeTeam, AwayTeam, HC, AC)
    #[clap(long)]
    history: PathBuf,

    /// team strengths (Team, Strength)
    #[clap(short = 's', long)]
    strengths: Option<PathBuf>,

    /// recent form (Date, p1, p2, score_p1, score_p2)
    #[clap(long)]
    form: Option<PathBuf>,

    /// fixtures to price
    #[clap(short = 'f', long)]
    fixtures: Option<PathBuf>,

    /// home team of a single match
    #[clap(long)]
    home: Option<String>,

    /// away team of a single match
    #[clap(long)]
    away: Option<String>,

    /// JSON configuration file
    #[clap(short = 'c', long)]
    config: Option<PathBuf>,

    /// number of simulations, overriding the configuration
    #[clap(short = 'n', long)]
    simulations: Option<usize>,

    /// write every quote to a CSV report
    #[clap(short = 'r', long)]
    report: Option<PathBuf>,
}
impl Args {
    fn validate(&self) -> anyhow::Result<()> {
        let single = self.home.is_some() || self.away.is_some();
        if single && (self.home.is_none() || self.away.is_none()) {
            bail!("--home and --away must be specified together");
        }
        if single == self.fixtures.is_some() {
            bail!("either the -f flag or the --home/--away pair must be specified");
        }
        Ok(())
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    if env::var("RUST_BACKTRACE").is_err() {
        env::set_var("RUST_BACKTRACE", "full")
    }
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info")
    }
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    args.validate()?;
    debug!("args: {args:?}");

    let mut config = match &args.config {
        None => Config::default(),
        Some(path) => Config::read_json_file(path)?,
    };
    if let Some(simulations) = args.simulations {
        config.n_simulations = simulations;
    }
    debug!("config: {config:?}");

    let dataset = read_dataset(&args)?;
    let fixtures = match &args.fixtures {
        Some(path) => read_fixtures_file(path)?,
        None => vec![Fixture::new(
            args.home.clone().unwrap_or_default(),
            args.away.clone().unwrap_or_default(),
        )],
    };
    info!("pricing {} fixture(s) with {} simulations each", fixtures.len(), config.n_simulations);

    let calculator = CornerOddsCalculator::new(config)?;
    let priced = price_fixtures(&calculator, &dataset, &fixtures);
    for (fixture, result) in fixtures.iter().zip(&priced) {
        match result {
            Ok(priced) => print_fixture(priced),
            Err(err) => println!("\n{} v {}: {err}", fixture.home, fixture.away),
        }
    }

    let failed = priced.iter().filter(|result| result.is_err()).count();
    if failed > 0 {
        warn!("{failed} of {} fixture(s) could not be priced", priced.len());
    }
    debug!("profile cache: {:?}", calculator.cache_stats());

    if let Some(path) = &args.report {
        let rows = write_report(path, priced.iter().filter_map(|result| result.as_ref().ok()))?;
        info!("wrote {rows} quotes to {}", path.display());
    }
    Ok(())
}

fn read_dataset(args: &Args) -> anyhow::Result<Dataset> {
    let history = History::read_csv_file(&args.history)?;
    info!("loaded {} historical matches from {}", history.len(), args.history.display());
    let mut dataset = Dataset::new(history);
    if let Some(path) = &args.strengths {
        let strengths = TeamStrengthIndex::read_csv_file(path)?;
        info!("loaded {} team strengths", strengths.len());
        dataset = dataset.with_strengths(strengths);
    }
    if let Some(path) = &args.form {
        let form = FormHistory::read_csv_file(path)?;
        info!("loaded {} form records", form.len());
        dataset = dataset.with_form(form);
    }
    Ok(dataset)
}

fn print_fixture(priced: &PricedFixture) {
    let odds = &priced.odds;
    println!("\n{} v {}", odds.home, odds.away);
    let console = Console::default();
    println!("{}", console.render(&print::tabulate_rates(odds)));
    println!("1X2:\n{}", console.render(&print::tabulate_one_x_two(odds)));
    println!("Handicaps:\n{}", console.render(&print::tabulate_handicaps(odds)));
    println!("{}", console.render(&print::tabulate_totals("Total", &odds.totals)));
    for side in [Side::Home, Side::Away] {
        let title = match side {
            Side::Home => &odds.home,
            Side::Away => &odds.away,
        };
        println!("{}", console.render(&print::tabulate_totals(title, odds.individual_totals(side))));
    }
    if !priced.warnings.is_empty() {
        println!("{}", console.render(&print::tabulate_warnings(&priced.warnings)));
    }
}

fn write_report<'a>(
    path: &Path,
    priced: impl Iterator<Item = &'a PricedFixture>,
) -> anyhow::Result<usize> {
    let mut writer = CsvWriter::create(path)?;
    writer.append(["home", "away", "market", "selection", "price"])?;
    let mut rows = 0;
    for priced in priced {
        let odds = &priced.odds;
        for quote in odds.quotes() {
            let price = quote.price.map(|price| format!("{price:.4}")).unwrap_or_default();
            writer.append([
                odds.home.as_str(),
                odds.away.as_str(),
                quote.market.as_str(),
                quote.selection.as_str(),
                price.as_str(),
            ])?;
            rows += 1;
        }
    }
    writer.flush()?;
    Ok(rows)
}
