use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One scraped fact about a country: a caption and the image it describes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meta {
    #[serde(rename = "meta")]
    pub caption: String,
    #[serde(rename = "image_url")]
    pub image_reference: String,
}

impl Meta {
    pub fn new(caption: impl Into<String>, image_reference: impl Into<String>) -> Self {
        Self {
            caption: caption.into(),
            image_reference: image_reference.into(),
        }
    }

    pub fn has_image(&self) -> bool {
        !self.image_reference.is_empty()
    }
}

/// Country name to its metas in page order. An empty list means the country was scraped
/// and yielded nothing, which is different from the country being absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Dataset {
    entries: BTreeMap<String, Vec<Meta>>,
}

impl Dataset {
    #[cfg(test)]
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn insert(&mut self, country: impl Into<String>, metas: Vec<Meta>) {
        self.entries.insert(country.into(), metas);
    }

    pub fn get(&self, country: &str) -> Option<&[Meta]> {
        self.entries.get(country).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[cfg(test)]
    pub fn countries(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    #[cfg(test)]
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Meta])> {
        self.entries.iter().map(|(c, m)| (c.as_str(), m.as_slice()))
    }

    /// True if at least one country has at least one meta.
    pub fn has_metas(&self) -> bool {
        self.entries.values().any(|metas| !metas.is_empty())
    }

    pub fn meta_count(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    /// Countries with at least one meta that carries an image, in key order.
    pub fn eligible_countries(&self) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|(_, metas)| metas.iter().any(Meta::has_image))
            .map(|(country, _)| country.as_str())
            .collect()
    }

    pub fn to_pretty_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Dataset> {
        serde_json::from_str(json)
    }
}

impl FromIterator<(String, Vec<Meta>)> for Dataset {
    fn from_iter<I: IntoIterator<Item = (String, Vec<Meta>)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
