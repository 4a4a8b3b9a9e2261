use log::{debug, warn};
use std::mem::take;
use std::path::{Path, PathBuf};
use std::{fs, io};
use thiserror::Error;

pub const COUNTRY_COLUMN: &str = "Country";

#[derive(Debug, Error)]
pub enum CountryListError {
    #[error("country list file not found: {0:?}")]
    NotFound(PathBuf),
    #[error("cannot read country list: {0}")]
    Io(#[from] io::Error),
    #[error("country list has no `Country` column")]
    MissingColumn,
}

/// Reads the `Country` column of a CSV file, in file order. Blank values are skipped.
pub fn load_countries(path: &Path) -> Result<Vec<String>, CountryListError> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            warn!("[Countries] {:?} does not exist", path);
            return Err(CountryListError::NotFound(path.to_path_buf()));
        }
        Err(err) => return Err(err.into()),
    };
    let countries = parse_countries(&text)?;
    debug!("[Countries] Loaded {} countries from {:?}", countries.len(), path);
    Ok(countries)
}

pub fn parse_countries(text: &str) -> Result<Vec<String>, CountryListError> {
    let mut rows = parse_rows(text.trim_start_matches('\u{FEFF}')).into_iter();
    let header = rows.next().ok_or(CountryListError::MissingColumn)?;
    let column = header
        .iter()
        .position(|h| h.trim() == COUNTRY_COLUMN)
        .ok_or(CountryListError::MissingColumn)?;

    Ok(rows
        .filter_map(|row| row.get(column).map(|c| c.trim().to_string()))
        .filter(|c| !c.is_empty())
        .collect())
}

/// Minimal CSV parser: quoted fields, doubled quotes and CRLF. Blank lines are dropped.
fn parse_rows(text: &str) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    let mut field = String::new();
    let mut row = Vec::new();
    let mut in_quotes = false;
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    field.push('"');
                } else {
                    in_quotes = false;
                }
            }
            '"' => in_quotes = true,
            ',' if !in_quotes => row.push(take(&mut field)),
            '\n' | '\r' if !in_quotes => {
                if ch == '\r' && chars.peek() == Some(&'\n') {
                    chars.next();
                }
                row.push(take(&mut field));
                push_row(&mut rows, take(&mut row));
            }
            _ => field.push(ch),
        }
    }
    row.push(field);
    push_row(&mut rows, row);

    rows
}

fn push_row(rows: &mut Vec<Vec<String>>, row: Vec<String>) {
    if !(row.len() == 1 && row[0].is_empty()) {
        rows.push(row);
    }
}
