//! The extraction report schema and its on-disk form.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_aux::field_attributes::deserialize_string_from_number;
use serde_json::Value;
use serde_json::ser::PrettyFormatter;

use crate::error::{ReviewLensError, Result};

/// Fields extracted from one product page.
///
/// Models regularly answer `"Rated": 4.8` instead of `"Rated": "4.8"`, so each
/// field also accepts a JSON number and keeps it as its string form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionRecord {
    /// How many people rated the product.
    #[serde(rename = "Ratings", deserialize_with = "deserialize_string_from_number")]
    pub ratings: String,
    /// Average score, 1 to 5.
    #[serde(rename = "Rated", deserialize_with = "deserialize_string_from_number")]
    pub rated: String,
    #[serde(rename = "Price", deserialize_with = "deserialize_string_from_number")]
    pub price: String,
    /// Two-line summary of the best and worst aspects.
    #[serde(rename = "ReviewSummary", deserialize_with = "deserialize_string_from_number")]
    pub review_summary: String,
    #[serde(deserialize_with = "deserialize_string_from_number")]
    pub url: String,
    #[serde(deserialize_with = "deserialize_string_from_number")]
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionEntry {
    pub fields: ExtractionRecord,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportBody {
    pub extraction: Vec<ExtractionEntry>,
}

/// `{ "report": { "extraction": [ { "fields": { .. } } ] } }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionReport {
    pub report: ReportBody,
}

impl ExtractionReport {
    /// Wraps a single record in the report envelope.
    pub fn single(fields: ExtractionRecord) -> Self {
        Self { report: ReportBody { extraction: vec![ExtractionEntry { fields }] } }
    }

    /// Converts validated JSON into a report.
    ///
    /// # Errors
    ///
    /// Returns [`ReviewLensError::SchemaMismatch`] when the value does not have the report shape.
    pub fn from_value(value: Value) -> Result<Self> {
        serde_json::from_value(value).map_err(|e| ReviewLensError::SchemaMismatch(e.to_string()))
    }

    /// First record, if the model produced any.
    pub fn first(&self) -> Option<&ExtractionRecord> {
        self.report.extraction.first().map(|entry| &entry.fields)
    }

    /// Pretty JSON with four-space indentation.
    pub fn to_pretty_json(&self) -> Result<String> {
        to_pretty_json(self)
    }
}

/// Serializes any value as JSON indented by four spaces.
pub fn to_pretty_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    let mut buf = Vec::new();
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
    value.serialize(&mut serializer)?;
    // serde_json only ever emits UTF-8
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Writes `value` to `path` as four-space pretty JSON.
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    fs::write(path, to_pretty_json(value)?)?;
    Ok(())
}

/// Reads a report previously written with [`write_json`].
pub fn read_report(path: &Path) -> Result<ExtractionReport> {
    if !path.exists() {
        return Err(ReviewLensError::FileNotFound(path.to_path_buf()));
    }
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}
