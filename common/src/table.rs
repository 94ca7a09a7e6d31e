use core::fmt;
use std::{cmp::Ordering, io::Read, path::Path};

use eyre::{Context, Result};
use itertools::Itertools;
use thiserror::Error;
use tracing::debug;

use crate::util::read_optional;

#[derive(Error, Debug)]
pub enum TableError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Missing header row")]
    MissingHeader,
    #[error("Duplicate column {0}")]
    DuplicateColumn(String),
    #[error("Missing column {column} (available: {available})")]
    MissingColumn { column: String, available: String },
    #[error("Column {0} is not numeric")]
    NotNumeric(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Integer,
    Float,
    Text,
}

impl ColumnKind {
    pub fn is_numeric(&self) -> bool {
        !matches!(self, ColumnKind::Text)
    }

    /// Empty cells are ignored, a column without any values is treated as float
    fn infer<'a>(cells: impl Iterator<Item = &'a str>) -> Self {
        let mut kind = None;
        for cell in cells.map(str::trim).filter(|c| !c.is_empty()) {
            let cell_kind = if cell.parse::<i64>().is_ok() {
                ColumnKind::Integer
            } else if cell.parse::<f64>().is_ok() {
                ColumnKind::Float
            } else {
                return ColumnKind::Text;
            };
            kind = match (kind, cell_kind) {
                (Some(ColumnKind::Float), _) | (_, ColumnKind::Float) => Some(ColumnKind::Float),
                _ => Some(ColumnKind::Integer),
            };
        }
        kind.unwrap_or(ColumnKind::Float)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Missing,
    Integer(i64),
    Float(f64),
    Text(String),
}

impl Value {
    fn parse(raw: &str, kind: ColumnKind) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Value::Missing;
        }
        match kind {
            ColumnKind::Integer => trimmed.parse().map_or(Value::Missing, Value::Integer),
            ColumnKind::Float => match trimmed.parse::<f64>() {
                Ok(v) if v.is_finite() => Value::Float(v),
                _ => Value::Missing,
            },
            ColumnKind::Text => Value::Text(raw.to_owned()),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(v) => Some(*v as f64),
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Numbers before text, missing values last
    pub fn total_cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Value::Missing, Value::Missing) => Ordering::Equal,
            (Value::Missing, _) => Ordering::Greater,
            (_, Value::Missing) => Ordering::Less,
            (Value::Text(a), Value::Text(b)) => a.cmp(b),
            (Value::Text(_), _) => Ordering::Greater,
            (_, Value::Text(_)) => Ordering::Less,
            (Value::Integer(a), Value::Integer(b)) => a.cmp(b),
            (a, b) => a
                .as_f64()
                .unwrap_or(f64::NAN)
                .total_cmp(&b.as_f64().unwrap_or(f64::NAN)),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Missing => Ok(()),
            Value::Integer(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Text(v) => f.write_str(v),
        }
    }
}

#[derive(Debug, Clone)]
struct Record {
    raw: Vec<String>,
    values: Vec<Value>,
}

/// One benchmark summary file, one row per observation
#[derive(Debug, Clone, Default)]
pub struct ResultTable {
    headers: Vec<String>,
    kinds: Vec<ColumnKind>,
    rows: Vec<Record>,
}

impl ResultTable {
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, TableError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(reader);
        let headers = reader
            .headers()?
            .iter()
            .map(str::to_owned)
            .collect::<Vec<_>>();
        if headers.iter().all(String::is_empty) {
            return Err(TableError::MissingHeader);
        }
        if let Some(duplicate) = headers.iter().duplicates().next() {
            return Err(TableError::DuplicateColumn(duplicate.clone()));
        }

        let raw_rows = reader
            .records()
            .map(|record| record.map(|r| r.iter().map(str::to_owned).collect::<Vec<_>>()))
            .collect::<Result<Vec<_>, _>>()?;
        let kinds = (0..headers.len())
            .map(|i| ColumnKind::infer(raw_rows.iter().map(|row| row[i].as_str())))
            .collect::<Vec<_>>();
        let rows = raw_rows
            .into_iter()
            .map(|raw| {
                let values = raw
                    .iter()
                    .zip(&kinds)
                    .map(|(cell, kind)| Value::parse(cell, *kind))
                    .collect();
                Record { raw, values }
            })
            .collect();

        Ok(Self {
            headers,
            kinds,
            rows,
        })
    }

    /// Reads a summary file, `None` when it does not exist
    pub async fn read(path: &Path) -> Result<Option<Self>> {
        let Some(bytes) = read_optional(path).await? else {
            debug!("No results at {}", path.display());
            return Ok(None);
        };
        let table = Self::from_reader(bytes.as_slice())
            .wrap_err_with(|| format!("Parse {}", path.display()))?;
        debug!(
            "Loaded {} rows x {} columns from {}",
            table.len(),
            table.headers.len(),
            path.display()
        );
        Ok(Some(table))
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn kinds(&self) -> &[ColumnKind] {
        &self.kinds
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Cells exactly as they appeared in the file
    pub fn raw_rows(&self) -> impl Iterator<Item = &[String]> {
        self.rows.iter().map(|row| row.raw.as_slice())
    }

    pub fn column_index(&self, column: &str) -> Result<usize, TableError> {
        self.headers
            .iter()
            .position(|h| h == column)
            .ok_or_else(|| TableError::MissingColumn {
                column: column.to_owned(),
                available: self.headers.join(", "),
            })
    }

    pub fn require_columns(&self, columns: &[&str]) -> Result<(), TableError> {
        columns
            .iter()
            .try_for_each(|column| self.column_index(column).map(|_| ()))
    }

    pub fn values(&self, column: &str) -> Result<Vec<&Value>, TableError> {
        let idx = self.column_index(column)?;
        Ok(self.rows.iter().map(|row| &row.values[idx]).collect())
    }

    pub fn numbers(&self, column: &str) -> Result<Vec<Option<f64>>, TableError> {
        let idx = self.column_index(column)?;
        if !self.kinds[idx].is_numeric() {
            return Err(TableError::NotNumeric(column.to_owned()));
        }
        Ok(self.rows.iter().map(|row| row.values[idx].as_f64()).collect())
    }

    pub fn labels(&self, column: &str) -> Result<Vec<String>, TableError> {
        Ok(self
            .values(column)?
            .into_iter()
            .map(ToString::to_string)
            .collect())
    }

    /// Rows whose cell in `column` displays as `label`
    pub fn filter_eq(&self, column: &str, label: &str) -> Result<Self, TableError> {
        let idx = self.column_index(column)?;
        Ok(self.with_rows(
            self.rows
                .iter()
                .filter(|row| row.values[idx].to_string() == label)
                .cloned()
                .collect(),
        ))
    }

    /// Stable sort on the given columns, in order of priority
    pub fn sorted_by(&self, columns: &[&str]) -> Result<Self, TableError> {
        let indices = columns
            .iter()
            .map(|c| self.column_index(c))
            .collect::<Result<Vec<_>, _>>()?;
        let mut rows = self.rows.clone();
        rows.sort_by(|a, b| {
            indices
                .iter()
                .map(|&i| a.values[i].total_cmp(&b.values[i]))
                .find(|o| o.is_ne())
                .unwrap_or(Ordering::Equal)
        });
        Ok(self.with_rows(rows))
    }

    fn with_rows(&self, rows: Vec<Record>) -> Self {
        Self {
            headers: self.headers.clone(),
            kinds: self.kinds.clone(),
            rows,
        }
    }
}
