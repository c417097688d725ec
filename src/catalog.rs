//! Country catalog: loading, memoization and random target selection.
//!
//! The full dataset is fetched at most once per [`Catalog`] value and kept for
//! as long as that value lives. There is no expiry and no refresh; the binary
//! builds one catalog at startup and keeps it until exit.

use crate::error::DataSourceError;
use once_cell::sync::OnceCell;
use rand::Rng;
use rand::seq::SliceRandom;
use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::Value;
use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;

pub const DEFAULT_ENDPOINT: &str = "https://restcountries.com/v3.1/all?fields=name,continents,flags";

/// Continent labels the upstream data uses for what the game calls "Americas".
const AMERICAS: [&str; 3] = ["North America", "South America", "Central America"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountryRecord {
    pub common_name: String,
    pub continents: Vec<String>,
    pub flag_image_url: String,
}

impl CountryRecord {
    pub fn new(common_name: &str, continents: &[&str], flag_image_url: &str) -> Self {
        Self {
            common_name: common_name.to_string(),
            continents: continents.iter().map(|c| (*c).to_string()).collect(),
            flag_image_url: flag_image_url.to_string(),
        }
    }

    #[must_use]
    pub fn word_count(&self) -> usize {
        self.common_name.split_whitespace().count()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContinentFilter {
    All,
    Africa,
    Asia,
    Europe,
    Americas,
    Oceania,
}

impl ContinentFilter {
    /// Selection order shown to the player.
    pub const OPTIONS: [Self; 6] = [
        Self::All,
        Self::Africa,
        Self::Asia,
        Self::Europe,
        Self::Americas,
        Self::Oceania,
    ];

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::All => "All",
            Self::Africa => "Africa",
            Self::Asia => "Asia",
            Self::Europe => "Europe",
            Self::Americas => "Americas",
            Self::Oceania => "Oceania",
        }
    }

    #[must_use]
    pub fn matches(self, record: &CountryRecord) -> bool {
        match self {
            Self::All => true,
            Self::Americas => record
                .continents
                .iter()
                .any(|c| AMERICAS.contains(&c.as_str())),
            other => record.continents.iter().any(|c| c == other.label()),
        }
    }

    /// Cycles through "Choose" followed by every real option.
    #[must_use]
    pub fn cycle(current: Option<Self>) -> Option<Self> {
        match current {
            None => Some(Self::OPTIONS[0]),
            Some(filter) => {
                let index = Self::OPTIONS.iter().position(|f| *f == filter).unwrap_or(0);
                Self::OPTIONS.get(index + 1).copied()
            }
        }
    }
}

impl fmt::Display for ContinentFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ContinentFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::OPTIONS
            .into_iter()
            .find(|f| f.label().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| format!("unknown continent '{wanted}'"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Difficulty {
    #[default]
    OneWord,
    MultipleWords,
}

impl Difficulty {
    pub const OPTIONS: [Self; 2] = [Self::OneWord, Self::MultipleWords];

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::OneWord => "1 Word Country",
            Self::MultipleWords => "Multiple Words Country",
        }
    }

    #[must_use]
    pub fn matches(self, record: &CountryRecord) -> bool {
        match self {
            Self::OneWord => record.word_count() == 1,
            Self::MultipleWords => record.word_count() >= 2,
        }
    }

    #[must_use]
    pub fn toggle(self) -> Self {
        match self {
            Self::OneWord => Self::MultipleWords,
            Self::MultipleWords => Self::OneWord,
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        match wanted.as_str() {
            "1" | "one" | "single" | "1 word country" => Ok(Self::OneWord),
            "2" | "multi" | "multiple" | "multiple words country" => Ok(Self::MultipleWords),
            _ => Err(format!("unknown difficulty '{wanted}'")),
        }
    }
}

/// Where the full country dataset comes from.
pub trait CountrySource {
    fn fetch(&self) -> Result<Vec<CountryRecord>, DataSourceError>;
}

impl<S: CountrySource + ?Sized> CountrySource for Box<S> {
    fn fetch(&self) -> Result<Vec<CountryRecord>, DataSourceError> {
        (**self).fetch()
    }
}

impl CountrySource for Vec<CountryRecord> {
    fn fetch(&self) -> Result<Vec<CountryRecord>, DataSourceError> {
        Ok(self.clone())
    }
}

/// The public REST countries endpoint, fetched in a single GET.
pub struct RestCountries {
    client: Client,
    endpoint: String,
}

impl RestCountries {
    pub fn new(client: Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }
}

impl CountrySource for RestCountries {
    fn fetch(&self) -> Result<Vec<CountryRecord>, DataSourceError> {
        log::info!("Fetching countries from {}", self.endpoint);
        let response = self.client.get(&self.endpoint).send()?;
        let status = response.status();
        if !status.is_success() {
            log::warn!("Country endpoint returned {status}");
            return Err(DataSourceError::Status(status));
        }
        let body = response.text()?;
        parse_countries(&body)
    }
}

/// A local copy of the REST payload, for offline play.
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CountrySource for JsonFileSource {
    fn fetch(&self) -> Result<Vec<CountryRecord>, DataSourceError> {
        log::info!("Loading countries from {}", self.path.display());
        let body = fs::read_to_string(&self.path)?;
        parse_countries(&body)
    }
}

#[derive(Deserialize)]
struct RawCountry {
    name: Option<RawName>,
    #[serde(default)]
    continents: Value,
    flags: Option<RawFlags>,
}

#[derive(Deserialize)]
struct RawName {
    common: Option<String>,
}

#[derive(Deserialize)]
struct RawFlags {
    png: Option<String>,
}

impl RawCountry {
    fn into_record(self) -> Option<CountryRecord> {
        let common_name = self.name?.common?;
        if common_name.trim().is_empty() {
            return None;
        }
        // A missing or non-list continents field leaves the record unmatched by
        // any specific continent filter.
        let continents = match self.continents {
            Value::Array(labels) => labels
                .into_iter()
                .filter_map(|label| match label {
                    Value::String(s) => Some(s),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        };
        Some(CountryRecord {
            common_name,
            continents,
            flag_image_url: self.flags.and_then(|f| f.png).unwrap_or_default(),
        })
    }
}

/// Parses the REST payload: a JSON array of country objects.
///
/// Individual records that are missing a name, or are not objects at all, are
/// skipped. The body as a whole must be an array.
pub fn parse_countries(body: &str) -> Result<Vec<CountryRecord>, DataSourceError> {
    let values: Vec<Value> = serde_json::from_str(body)?;
    let total = values.len();
    let records: Vec<CountryRecord> = values
        .into_iter()
        .filter_map(|value| serde_json::from_value::<RawCountry>(value).ok())
        .filter_map(RawCountry::into_record)
        .collect();
    if records.len() < total {
        log::debug!("Skipped {} malformed country records", total - records.len());
    }
    Ok(records)
}

/// Picks one record matching both filters, uniformly at random.
///
/// When nothing matches, the pick is made from the whole slice instead, so a
/// restrictive filter combination never stalls the game. Returns `None` only
/// for an empty slice.
pub fn select_from<'a, R: Rng + ?Sized>(
    records: &'a [CountryRecord],
    continent: ContinentFilter,
    difficulty: Difficulty,
    rng: &mut R,
) -> Option<&'a CountryRecord> {
    let matching: Vec<&CountryRecord> = records
        .iter()
        .filter(|r| continent.matches(r) && difficulty.matches(r))
        .collect();

    if matching.is_empty() {
        log::debug!(
            "No country matches {continent} / {difficulty}; sampling from all {} countries",
            records.len()
        );
        return records.choose(rng);
    }
    matching.choose(rng).copied()
}

/// Memoizing front for a [`CountrySource`].
pub struct Catalog<S> {
    source: S,
    countries: OnceCell<Vec<CountryRecord>>,
}

impl<S: CountrySource> Catalog<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            countries: OnceCell::new(),
        }
    }

    /// Returns the full dataset, fetching it on first use.
    ///
    /// Concurrent first callers block on one initializer. A failed fetch leaves
    /// the cell empty so the next call goes back to the source.
    pub fn fetch_all(&self) -> Result<&[CountryRecord], DataSourceError> {
        self.countries
            .get_or_try_init(|| {
                let countries = self.source.fetch()?;
                if countries.is_empty() {
                    return Err(DataSourceError::Empty);
                }
                log::info!("Catalog loaded with {} countries", countries.len());
                Ok(countries)
            })
            .map(Vec::as_slice)
    }

    pub fn select_random<R: Rng + ?Sized>(
        &self,
        continent: ContinentFilter,
        difficulty: Difficulty,
        rng: &mut R,
    ) -> Result<&CountryRecord, DataSourceError> {
        let countries = self.fetch_all()?;
        select_from(countries, continent, difficulty, rng).ok_or(DataSourceError::Empty)
    }

    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.countries.get().is_some()
    }
}
