use crate::libgeometas::db::ResponseCache;
use crate::libgeometas::site::FetchConfig;
use log::{debug, warn};
use reqwest::blocking::{Client, ClientBuilder};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("failed to fetch {url}: {kind}")]
pub struct FetchError {
    pub url: String,
    #[source]
    pub kind: FetchErrorKind,
}

#[derive(Debug, Error)]
pub enum FetchErrorKind {
    #[error("HTTP status {0}")]
    Status(u16),
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("response cache error: {0}")]
    Cache(#[from] rusqlite::Error),
}

impl FetchError {
    pub fn new(url: &str, kind: impl Into<FetchErrorKind>) -> Self {
        Self {
            url: url.to_string(),
            kind: kind.into(),
        }
    }
}

/// Something that can turn a URL into page content.
pub trait Fetch {
    fn fetch(&mut self, url: &str) -> Result<String, FetchError>;
}

/// The uncached network side of a fetch.
pub trait Transport {
    fn get(&self, url: &str) -> Result<String, FetchErrorKind>;
}

pub struct HttpTransport {
    client: Client,
}

fn client_builder(config: &FetchConfig) -> ClientBuilder {
    Client::builder()
        .timeout(config.timeout)
        .user_agent(config.user_agent.clone())
}

impl HttpTransport {
    pub fn new(config: &FetchConfig) -> Result<Self, reqwest::Error> {
        let client = client_builder(config).build()?;
        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    fn get(&self, url: &str) -> Result<String, FetchErrorKind> {
        let response = self.client.get(url).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchErrorKind::Status(status.as_u16()));
        }
        Ok(response.text()?)
    }
}

/// Serves responses from the [`ResponseCache`] while they are younger than `ttl`, and goes
/// to the network otherwise. Only successful bodies are cached.
pub struct CachedFetcher<T: Transport = HttpTransport> {
    cache: ResponseCache,
    transport: T,
    ttl: Duration,
}

impl CachedFetcher<HttpTransport> {
    pub fn http(cache: ResponseCache, config: &FetchConfig) -> Result<Self, reqwest::Error> {
        Ok(Self::new(cache, HttpTransport::new(config)?, config.ttl))
    }
}

impl<T: Transport> CachedFetcher<T> {
    pub fn new(cache: ResponseCache, transport: T, ttl: Duration) -> Self {
        Self {
            cache,
            transport,
            ttl,
        }
    }

    #[cfg(test)]
    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    pub fn into_cache(self) -> ResponseCache {
        self.cache
    }
}

impl<T: Transport> Fetch for CachedFetcher<T> {
    fn fetch(&mut self, url: &str) -> Result<String, FetchError> {
        if let Some(body) = self
            .cache
            .get_fresh(url, self.ttl)
            .map_err(|err| FetchError::new(url, err))?
        {
            debug!("[Fetch] Cache hit for {}", url);
            return Ok(body);
        }

        debug!("[Fetch] GET {}", url);
        let body = self
            .transport
            .get(url)
            .map_err(|kind| FetchError::new(url, kind))?;

        if let Err(err) = self.cache.put(url, &body) {
            warn!("[Fetch] Could not cache {}: {}", url, err);
        }
        Ok(body)
    }
}
