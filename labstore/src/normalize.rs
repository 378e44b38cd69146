use crate::codec::Codec;
use crate::{AppError, Value};

/// Describes one column of a read result.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct OutputColumn {
    pub name: String,
    pub encoded: bool,
}

/// Rows returned by every read. The shape never depends on how many rows or columns came back.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResultSet {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

/// The legacy cardinality-collapsing view of a [`ResultSet`].
#[derive(Debug, Clone, PartialEq)]
pub enum Collapsed {
    Empty,
    /// One row of one column.
    Cell(Value),
    /// One row of several columns.
    Row(Vec<Value>),
    /// Several rows of one column.
    Column(Vec<Value>),
    Rows(Vec<Vec<Value>>),
}

impl ResultSet {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        Self { columns, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &[Value]> {
        self.rows.iter().map(|row| row.as_slice())
    }

    pub fn first_row(&self) -> Option<&[Value]> {
        self.rows.first().map(|row| row.as_slice())
    }

    pub fn first_cell(&self) -> Option<&Value> {
        self.rows.first().and_then(|row| row.first())
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Values of the named column across all rows.
    pub fn column_values(&self, name: &str) -> Option<Vec<Value>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(|row| row[idx].clone()).collect())
    }

    pub fn into_rows(self) -> Vec<Vec<Value>> {
        self.rows
    }

    /// First cell of every row, meant for single column projections.
    pub fn into_column(self) -> Vec<Value> {
        self.rows.into_iter().filter_map(|row| row.into_iter().next()).collect()
    }

    pub fn collapse(self) -> Collapsed {
        let single_column = self.columns.len() == 1;
        let mut rows = self.rows;
        match (rows.len(), single_column) {
            (0, _) => Collapsed::Empty,
            (1, true) => Collapsed::Cell(rows.remove(0).into_iter().next().unwrap_or(Value::Null)),
            (1, false) => Collapsed::Row(rows.remove(0)),
            (_, true) => Collapsed::Column(rows.into_iter().filter_map(|row| row.into_iter().next()).collect()),
            (_, false) => Collapsed::Rows(rows),
        }
    }
}

/// Decodes every cell of encoded columns through `codec`, other cells pass through untouched.
pub(crate) fn normalize(codec: &dyn Codec, columns: Vec<OutputColumn>, raw: Vec<Vec<Value>>) -> Result<ResultSet, AppError> {
    let rows = raw.into_iter().map(|row| decode_row(codec, &columns, row)).collect::<Result<Vec<_>, _>>()?;
    Ok(ResultSet::new(columns.into_iter().map(|c| c.name).collect(), rows))
}

fn decode_row(codec: &dyn Codec, columns: &[OutputColumn], row: Vec<Value>) -> Result<Vec<Value>, AppError> {
    row.into_iter()
        .zip(columns)
        .map(|(cell, column)| match cell {
            cell if !column.encoded => Ok(cell),
            Value::Null => Ok(Value::Null),
            Value::Blob(bytes) => codec
                .decode(&bytes)
                .map_err(|err| AppError::Codec(format!("column {} holds undecodable payload: {}", column.name, err))),
            other => Err(AppError::Codec(format!("column {} holds a {} instead of an encoded payload", column.name, other.type_name()))),
        })
        .collect()
}
