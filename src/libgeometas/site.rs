use std::time::Duration;

pub const ORIGIN: &str = "https://www.geometas.com";
pub const USER_AGENT: &str = "GeometasQuiz/CSV-Enabled";

pub const DEFAULT_CACHE_TTL_DAYS: u64 = 7;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_MEMO_TTL: Duration = Duration::from_secs(60 * 60 * 24);

/// Where metas are scraped from. Passed by value into the scraper and extractor so
/// tests can point both at a fake origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Site {
    pub origin: String,
}

impl Default for Site {
    fn default() -> Self {
        Self {
            origin: ORIGIN.to_string(),
        }
    }
}

impl Site {
    pub fn country_url(&self, slug: &str) -> String {
        format!("{}/metas/countries/{}/", self.origin, slug)
    }

    /// Makes an image locator absolute. Root-relative paths get the origin, protocol-relative
    /// ones get `https:`.
    pub fn resolve(&self, src: &str) -> String {
        if src.starts_with("//") {
            format!("https:{}", src)
        } else if src.starts_with('/') {
            format!("{}{}", self.origin, src)
        } else {
            src.to_string()
        }
    }
}

#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub ttl: Duration,
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(60 * 60 * 24 * DEFAULT_CACHE_TTL_DAYS),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: USER_AGENT.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn country_url_uses_path_template() {
        let site = Site::default();
        assert_eq!(
            site.country_url("bolivia"),
            "https://www.geometas.com/metas/countries/bolivia/"
        );
    }

    #[test]
    fn resolve_handles_relative_and_absolute() {
        let site = Site {
            origin: "https://example.org".to_string(),
        };
        assert_eq!(site.resolve("/img/a.jpg"), "https://example.org/img/a.jpg");
        assert_eq!(site.resolve("//cdn.example.org/a.jpg"), "https://cdn.example.org/a.jpg");
        assert_eq!(site.resolve("https://x.org/a.jpg"), "https://x.org/a.jpg");
        assert_eq!(site.resolve(""), "");
    }
}
