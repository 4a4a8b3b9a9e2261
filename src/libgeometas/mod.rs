pub mod countries;
pub mod dataset;
pub mod db;
pub mod extract;
pub mod fetch;
pub mod progress;
pub mod quiz;
pub mod scrape;
pub mod site;
pub mod slug;
pub mod store;
