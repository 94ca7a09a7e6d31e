use itertools::Itertools;

use crate::table::{ResultTable, TableError, Value};

/// Mean of a numeric column cross-tabulated by two categorical columns.
///
/// Keys are sorted in typed order (numbers numerically, text lexicographically),
/// rows with a missing key or value are ignored, and rows/columns without any
/// value are dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct PivotTable {
    pub index: Vec<Value>,
    pub columns: Vec<Value>,
    /// `values[row][column]`, `None` where no observation exists
    pub values: Vec<Vec<Option<f64>>>,
}

impl PivotTable {
    pub fn mean(
        table: &ResultTable,
        index: &str,
        columns: &str,
        values: &str,
    ) -> Result<Self, TableError> {
        let row_keys = table.values(index)?;
        let column_keys = table.values(columns)?;
        let numbers = table.numbers(values)?;

        let index = sorted_unique(&row_keys);
        let columns = sorted_unique(&column_keys);

        let mut sums = vec![vec![(0.0, 0usize); columns.len()]; index.len()];
        for ((row_key, column_key), value) in row_keys.iter().zip(&column_keys).zip(&numbers) {
            let Some(value) = value else { continue };
            let (Some(r), Some(c)) = (
                index.iter().position(|k| k == *row_key),
                columns.iter().position(|k| k == *column_key),
            ) else {
                continue;
            };
            sums[r][c].0 += value;
            sums[r][c].1 += 1;
        }

        let means = sums
            .into_iter()
            .map(|row| {
                row.into_iter()
                    .map(|(sum, count)| (count > 0).then(|| sum / count as f64))
                    .collect::<Vec<_>>()
            })
            .collect::<Vec<_>>();

        let keep_columns = (0..columns.len())
            .map(|c| means.iter().any(|row| row[c].is_some()))
            .collect::<Vec<_>>();
        let keep_rows = means
            .iter()
            .map(|row| row.iter().any(Option::is_some))
            .collect::<Vec<_>>();

        Ok(Self {
            index: retain(index, &keep_rows),
            columns: retain(columns, &keep_columns),
            values: retain(means, &keep_rows)
                .into_iter()
                .map(|row| retain(row, &keep_columns))
                .collect(),
        })
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn index_labels(&self) -> Vec<String> {
        self.index.iter().map(ToString::to_string).collect()
    }

    pub fn column_labels(&self) -> Vec<String> {
        self.columns.iter().map(ToString::to_string).collect()
    }

    /// One sub-column across every index row
    pub fn column(&self, column: usize) -> Vec<Option<f64>> {
        self.values.iter().map(|row| row[column]).collect()
    }

    pub fn get(&self, index: &str, column: &str) -> Option<f64> {
        let r = self.index.iter().position(|k| k.to_string() == index)?;
        let c = self.columns.iter().position(|k| k.to_string() == column)?;
        self.values[r][c]
    }
}

fn sorted_unique(keys: &[&Value]) -> Vec<Value> {
    keys.iter()
        .filter(|k| !matches!(k, Value::Missing))
        .map(|k| (*k).clone())
        .sorted_by(Value::total_cmp)
        .dedup()
        .collect()
}

fn retain<T>(items: Vec<T>, keep: &[bool]) -> Vec<T> {
    items
        .into_iter()
        .zip(keep)
        .filter_map(|(item, keep)| keep.then_some(item))
        .collect()
}
