use std::fmt;

use rocket::request::FromParam;
use serde::{Deserialize, Deserializer, Serialize};

pub mod about;
pub mod blog;
pub mod portfolio;
pub mod settings;

/// Primary key of a remote row. The hosted tables use uuid text keys for
/// content and integer keys for singletons; static JSON files use either.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RowId {
    Int(i64),
    Text(String),
}

impl RowId {
    /// Key of the `landing_settings` / `about_me` singleton rows.
    pub const SINGLETON: RowId = RowId::Int(1);

    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        match raw.parse::<i64>() {
            Ok(n) => RowId::Int(n),
            Err(_) => RowId::Text(raw.to_string()),
        }
    }

    /// Parses an optional form field; blank means "no id yet".
    pub fn from_form(raw: Option<&str>) -> Option<Self> {
        raw.map(str::trim).filter(|s| !s.is_empty()).map(Self::parse)
    }
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowId::Int(n) => write!(f, "{}", n),
            RowId::Text(s) => f.write_str(s),
        }
    }
}

impl<'a> FromParam<'a> for RowId {
    type Error = &'a str;

    fn from_param(param: &'a str) -> Result<Self, Self::Error> {
        if param.trim().is_empty() {
            return Err(param);
        }
        Ok(RowId::parse(param))
    }
}

/// Remote text columns come back as `null` when never set.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Decode rows one by one, dropping (and logging) the ones that don't fit.
pub fn decode_rows<T: serde::de::DeserializeOwned>(
    table: &str,
    rows: Vec<serde_json::Value>,
) -> Vec<T> {
    rows.into_iter()
        .filter_map(|row| match serde_json::from_value(row) {
            Ok(v) => Some(v),
            Err(e) => {
                log::warn!("Skipping malformed {} row: {}", table, e);
                None
            }
        })
        .collect()
}
