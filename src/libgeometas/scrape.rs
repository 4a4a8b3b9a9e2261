use crate::libgeometas::dataset::{Dataset, Meta};
use crate::libgeometas::extract::extract;
use crate::libgeometas::fetch::{Fetch, FetchError};
use crate::libgeometas::progress::Progress;
use crate::libgeometas::site::Site;
use crate::libgeometas::slug::slugify;
use crate::libgeometas::store::{Snapshot, SnapshotError};
use log::{debug, info, warn};
use std::time::Instant;

/// What scraping a single country produced.
pub type CountryOutcome = Result<Vec<Meta>, FetchError>;

/// Walks the country list one request at a time and turns each country page into metas.
pub struct Scraper<F: Fetch> {
    fetcher: F,
    site: Site,
}

impl<F: Fetch> Scraper<F> {
    pub fn new(fetcher: F, site: Site) -> Self {
        Self { fetcher, site }
    }

    #[cfg(test)]
    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    pub fn into_fetcher(self) -> F {
        self.fetcher
    }

    pub fn scrape_country(&mut self, country: &str) -> CountryOutcome {
        let url = self.site.country_url(&slugify(country));
        let html = self.fetcher.fetch(&url)?;
        let metas = extract(&html, &self.site);
        debug!("[Scrape] {} -> {} metas", country, metas.len());
        Ok(metas)
    }

    pub fn scrape_all(
        &mut self,
        countries: &[String],
        progress: &mut dyn Progress,
    ) -> Vec<(String, CountryOutcome)> {
        let total = countries.len();
        progress.begin(total);
        countries
            .iter()
            .enumerate()
            .map(|(idx, country)| {
                let outcome = self.scrape_country(country);
                progress.item_done(idx + 1, total);
                (country.clone(), outcome)
            })
            .collect()
    }

    /// Scrapes every country, downgrades failures to empty entries and overwrites `snapshot`.
    /// Only a snapshot write failure is an error.
    pub fn build(
        &mut self,
        countries: &[String],
        snapshot: &Snapshot,
        progress: &mut dyn Progress,
    ) -> Result<Dataset, SnapshotError> {
        let now = Instant::now();
        let outcomes = self.scrape_all(countries, progress);
        let data = empty_on_failure(outcomes, progress);
        progress.finish();

        snapshot.write(&data)?;
        info!(
            "[Scrape] Scraped {} metas for {} countries in {} ms.",
            data.meta_count(),
            data.len(),
            now.elapsed().as_millis()
        );
        Ok(data)
    }
}

/// Keeps every country. A failed one becomes an empty entry and a warning.
pub fn empty_on_failure(
    outcomes: Vec<(String, CountryOutcome)>,
    progress: &mut dyn Progress,
) -> Dataset {
    outcomes
        .into_iter()
        .map(|(country, outcome)| match outcome {
            Ok(metas) => (country, metas),
            Err(err) => {
                warn!("[Scrape] {}: {}", country, err);
                progress.warn(&format!("{}: {}", country, err));
                (country, Vec::new())
            }
        })
        .collect()
}
