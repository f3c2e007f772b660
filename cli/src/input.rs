//! Tabular input collaborator
//!
//! Reads paired categorical observations from a CSV file. The first row
//! is a header; each variable is taken from one designated column,
//! selected either by header name or by zero-based index. The defaults
//! mirror the conventional layout of the input sheets this tool grew up
//! with: column 0 is a row identifier, columns 1 and 2 carry the two
//! observed variables. All other columns are ignored.
//!
//! Cells are trimmed; blank or absent cells become nulls, which the core
//! retains but never matches against any concrete category.

use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

use catdep_core::ObservationPair;

use crate::CliError;

/// Designates one CSV column, by header name or zero-based position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnSelector {
    Index(usize),
    Name(String),
}

impl FromStr for ColumnSelector {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.parse::<usize>() {
            Ok(index) => ColumnSelector::Index(index),
            Err(_) => ColumnSelector::Name(s.to_owned()),
        })
    }
}

impl ColumnSelector {
    fn resolve(&self, headers: &csv::StringRecord) -> Result<usize, CliError> {
        match self {
            ColumnSelector::Index(index) => {
                if *index < headers.len() {
                    Ok(*index)
                } else {
                    Err(CliError::ColumnOutOfRange {
                        index: *index,
                        width: headers.len(),
                    })
                }
            }
            ColumnSelector::Name(name) => headers
                .iter()
                .position(|h| h.trim() == name)
                .ok_or_else(|| CliError::ColumnNotFound(name.clone())),
        }
    }
}

/// Reads observation pairs from the CSV file at `path`.
pub fn read_observations(
    path: &Path,
    independent: &ColumnSelector,
    dependent: &ColumnSelector,
) -> Result<Vec<ObservationPair>, CliError> {
    parse_observations(File::open(path)?, independent, dependent)
}

/// Parses observation pairs from any CSV byte stream.
pub fn parse_observations<R: Read>(
    reader: R,
    independent: &ColumnSelector,
    dependent: &ColumnSelector,
) -> Result<Vec<ObservationPair>, CliError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers = csv_reader.headers()?.clone();
    let independent_idx = independent.resolve(&headers)?;
    let dependent_idx = dependent.resolve(&headers)?;

    let mut rows = Vec::new();
    for record in csv_reader.records() {
        let record = record?;
        rows.push(ObservationPair::new(
            cell(&record, independent_idx),
            cell(&record, dependent_idx),
        ));
    }
    Ok(rows)
}

fn cell(record: &csv::StringRecord, index: usize) -> Option<String> {
    match record.get(index).map(str::trim) {
        None | Some("") => None,
        Some(value) => Some(value.to_owned()),
    }
}
