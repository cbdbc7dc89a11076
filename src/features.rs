//! Feature derivation and column partitioning
//!
//! [`add_basic_features`] derives `hour` and `dayofweek` from the
//! `transaction_time` column. [`build_preprocessor`] applies the same
//! derivation, splits the remaining columns into numeric and categorical
//! lists and returns an unfitted [`ColumnPreprocessor`] over them.

use crate::error::Result;
use crate::preprocessing::ColumnPreprocessor;
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Timelike};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Raw timestamp column
pub const TIMESTAMP_COLUMN: &str = "transaction_time";
/// Derived hour of day, 0-23
pub const HOUR_COLUMN: &str = "hour";
/// Derived day of week, Monday = 0
pub const DAYOFWEEK_COLUMN: &str = "dayofweek";

/// Lowercase spellings of label columns that never become features
pub const LABEL_ALIASES: [&str; 5] = ["is_fraud", "isfraud", "target", "label", "fraud"];

const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// Whether `name` is one of the recognized label spellings, ignoring case
pub fn is_label_alias(name: &str) -> bool {
    let lower = name.to_lowercase();
    LABEL_ALIASES.iter().any(|alias| *alias == lower)
}

/// Parse a transaction timestamp.
///
/// Accepts `YYYY-MM-DD HH:MM:SS[.f]`, the same with `T`, RFC 3339,
/// `YYYY-MM-DD HH:MM` and a bare date (read as midnight).
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_local());
    }

    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt);
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Derive `hour` and `dayofweek` from `transaction_time`.
///
/// Returns a new frame; the input is left untouched. Values that do not
/// parse become nulls in both derived columns. Without a timestamp column
/// the result is an unmodified copy.
pub fn add_basic_features(df: &DataFrame) -> Result<DataFrame> {
    let mut out = df.clone();

    let column = match df.column(TIMESTAMP_COLUMN) {
        Ok(column) => column,
        Err(_) => return Ok(out),
    };

    let as_text = column.cast(&DataType::String)?;
    let parsed: Vec<Option<NaiveDateTime>> = as_text
        .str()?
        .into_iter()
        .map(|v| v.and_then(parse_timestamp))
        .collect();

    let hours: Vec<Option<i32>> = parsed.iter().map(|t| t.map(|t| t.hour() as i32)).collect();
    let days: Vec<Option<i32>> = parsed
        .iter()
        .map(|t| t.map(|t| t.weekday().num_days_from_monday() as i32))
        .collect();

    let unparsed = parsed.iter().filter(|t| t.is_none()).count();
    debug!(rows = parsed.len(), unparsed, "Derived hour and dayofweek");

    out.with_column(Series::new(HOUR_COLUMN.into(), hours))?;
    out.with_column(Series::new(DAYOFWEEK_COLUMN.into(), days))?;
    Ok(out)
}

/// Column selection for [`build_preprocessor`]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeatureConfig {
    /// Explicit numeric columns; detected from storage type when `None`
    pub numeric: Option<Vec<String>>,
    /// Explicit categorical columns; detected from storage type when `None`
    pub categorical: Option<Vec<String>>,
    /// Label column to exclude in addition to the alias set
    pub target: Option<String>,
}

impl FeatureConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_numeric<S: Into<String>>(mut self, cols: impl IntoIterator<Item = S>) -> Self {
        self.numeric = Some(cols.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_categorical<S: Into<String>>(
        mut self,
        cols: impl IntoIterator<Item = S>,
    ) -> Self {
        self.categorical = Some(cols.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    fn excludes(&self, name: &str) -> bool {
        name == TIMESTAMP_COLUMN
            || is_label_alias(name)
            || self
                .target
                .as_deref()
                .is_some_and(|t| t.eq_ignore_ascii_case(name))
    }
}

/// Build an unfitted preprocessing plan for `df`.
///
/// Returns the plan with the numeric and categorical column lists it covers.
/// The two lists are disjoint and never contain a label column or the raw
/// timestamp.
pub fn build_preprocessor(
    df: &DataFrame,
    config: &FeatureConfig,
) -> Result<(ColumnPreprocessor, Vec<String>, Vec<String>)> {
    let df = add_basic_features(df)?;

    let numeric: Vec<String> = match &config.numeric {
        Some(cols) => cols.clone(),
        None => columns_where(&df, is_numeric_dtype),
    }
    .into_iter()
    .filter(|c| !config.excludes(c))
    .collect();

    let categorical: Vec<String> = match &config.categorical {
        Some(cols) => cols.clone(),
        None => columns_where(&df, is_categorical_dtype),
    }
    .into_iter()
    .filter(|c| !config.excludes(c) && !numeric.contains(c))
    .collect();

    debug!(?numeric, ?categorical, "Resolved feature columns");

    let plan = ColumnPreprocessor::new(numeric.clone(), categorical.clone());
    Ok((plan, numeric, categorical))
}

fn columns_where(df: &DataFrame, pred: fn(&DataType) -> bool) -> Vec<String> {
    df.get_columns()
        .iter()
        .filter(|c| pred(c.dtype()))
        .map(|c| c.name().to_string())
        .collect()
}

fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

fn is_categorical_dtype(dtype: &DataType) -> bool {
    matches!(dtype, DataType::String | DataType::Categorical(_, _))
}
