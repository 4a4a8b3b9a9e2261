use clap::Parser;
use colored::Colorize;
use env_logger::Env;
use log::{debug, warn};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

mod cli;
mod libgeometas;

use crate::cli::{cli_loop, CliProgress};
use crate::libgeometas::countries::{load_countries, CountryListError};
use crate::libgeometas::db::ResponseCache;
use crate::libgeometas::fetch::{CachedFetcher, Transport};
use crate::libgeometas::quiz::{QuizError, QuizSession};
use crate::libgeometas::scrape::Scraper;
use crate::libgeometas::site::{
    FetchConfig, Site, DEFAULT_CACHE_TTL_DAYS, DEFAULT_MEMO_TTL, DEFAULT_TIMEOUT_SECS,
};
use crate::libgeometas::store::{DatasetStore, Snapshot, SnapshotError};

#[derive(Parser, Debug)]
#[command(name = "Geometas Country Quiz")]
#[command(version, about, long_about = None)]
struct Args {
    #[arg(short, long, value_name = "FILE", default_value = "geometas_data.json")]
    data: PathBuf,
    #[arg(long, value_name = "FILE", default_value = "geometas_http.sqlite")]
    cache: PathBuf,
    #[arg(short, long, value_name = "FILE", default_value = "countries.csv")]
    countries: PathBuf,
    #[arg(long, default_value_t = DEFAULT_CACHE_TTL_DAYS)]
    cache_ttl_days: u64,
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    timeout_secs: u64,
    /// Delete the saved data and scrape again
    #[arg(short, long, default_value = "false")]
    refresh: bool,
    /// Print the loaded data as JSON before the quiz starts
    #[arg(long, default_value = "false")]
    show_raw: bool,
    #[arg(short, long, default_value = "warn")]
    log_level: String,
}

#[derive(Debug, Error)]
enum Error {
    #[error(transparent)]
    Countries(#[from] CountryListError),
    #[error("cannot open response cache: {0}")]
    Cache(#[from] rusqlite::Error),
    #[error("cannot build HTTP client: {0}")]
    Http(#[from] reqwest::Error),
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
    #[error(transparent)]
    Quiz(#[from] QuizError),
}

fn main() -> Result<(), Error> {
    let args = Args::parse();
    env_logger::Builder::from_env(Env::default().default_filter_or(&args.log_level)).init();

    let countries = match load_countries(&args.countries) {
        Ok(countries) => countries,
        Err(err) => {
            println!("{}", err.to_string().red());
            return Err(err.into());
        }
    };
    debug!("[Setup] {} countries", countries.len());

    let config = FetchConfig {
        ttl: Duration::from_secs(60 * 60 * 24 * args.cache_ttl_days),
        timeout: Duration::from_secs(args.timeout_secs),
        ..FetchConfig::default()
    };
    let cache = ResponseCache::create_or_open(&args.cache)?;
    if let Err(err) = cache.purge_expired(config.ttl) {
        warn!("[Setup] Could not purge expired responses: {}", err);
    }
    match cache.len() {
        Ok(count) => debug!("[Setup] {} cached responses", count),
        Err(err) => warn!("[Setup] Could not count cached responses: {}", err),
    }
    let mut scraper = Scraper::new(CachedFetcher::http(cache, &config)?, Site::default());

    let mut store = DatasetStore::new(Snapshot::new(&args.data), DEFAULT_MEMO_TTL);
    if args.refresh {
        if let Err(err) = store.invalidate() {
            return finish(scraper, Err(err.into()));
        }
    }

    let mut progress = CliProgress::default();
    let data = match store.load(|snapshot| scraper.build(&countries, snapshot, &mut progress)) {
        Ok(data) => data,
        Err(err) => return finish(scraper, Err(err.into())),
    };

    if args.show_raw {
        match data.to_pretty_json() {
            Ok(json) => println!("{}", json),
            Err(err) => return finish(scraper, Err(SnapshotError::from(err).into())),
        }
    }

    if !data.has_metas() {
        println!(
            "{}",
            "No metas found. Run again with --refresh to rescrape.".red()
        );
    }

    let mut session = QuizSession::with_countries(data, countries);
    let result = match cli_loop(&mut session) {
        Err(QuizError::EmptyDataset) => {
            println!("{}", "No available metas with images to quiz on.".red());
            Err(QuizError::EmptyDataset.into())
        }
        other => other.map_err(Error::from),
    };
    finish(scraper, result)
}

fn finish<T: Transport>(
    scraper: Scraper<CachedFetcher<T>>,
    result: Result<(), Error>,
) -> Result<(), Error> {
    if let Err(err) = scraper.into_fetcher().into_cache().close() {
        warn!("[DB] {}", err);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::libgeometas::fetch::tests::FakeTransport;

    #[test]
    fn failed_refresh_still_closes_the_cache() {
        let dir = std::env::temp_dir().join("geometas_snapshot_is_a_dir");
        std::fs::create_dir_all(&dir).unwrap();
        let mut store = DatasetStore::new(Snapshot::new(&dir), DEFAULT_MEMO_TTL);
        let fetcher = CachedFetcher::new(
            ResponseCache::in_memory().unwrap(),
            FakeTransport::default(),
            Duration::from_secs(60),
        );
        let scraper = Scraper::new(fetcher, Site::default());

        let err = store.invalidate().unwrap_err();
        let result = finish(scraper, Err(err.into()));
        assert!(matches!(result, Err(Error::Snapshot(_))));
        let _ = std::fs::remove_dir_all(&dir);
    }
}
