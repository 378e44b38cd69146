use crate::normalize::{normalize, OutputColumn};
use crate::schema::validate_ident;
use crate::storage::catalog::CatalogTable;
use crate::storage::table_rows::RowsTable;
use crate::storage::table_unique::UniqueIndex;
use crate::{AppError, ColumnRef, ResultSet, RowId, Storage, TableSchema, Value};
use log::{debug, error, warn};
use redb::{ReadableTable, WriteTransaction};

/// Row filter of a query, column names are resolved when the query runs.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Predicate {
    #[default]
    All,
    RowId(RowId),
    Eq { column: String, value: Value },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Select {
    pub table: String,
    /// Projected columns, all of them (row id first) when empty.
    pub columns: Vec<String>,
    pub predicate: Predicate,
}

#[allow(clippy::should_implement_trait)]
impl Select {
    pub fn from(table: &str) -> Self {
        Self { table: table.to_string(), columns: Vec::new(), predicate: Predicate::All }
    }

    pub fn column(mut self, column: &str) -> Self {
        self.columns.push(column.to_string());
        self
    }

    pub fn where_eq(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.predicate = Predicate::Eq { column: column.to_string(), value: value.into() };
        self
    }

    pub fn where_id(mut self, row_id: RowId) -> Self {
        self.predicate = Predicate::RowId(row_id);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Assignment {
    Set { column: String, value: Value },
    /// Substring replacement on the text rendering of the cell.
    Replace { column: String, search: String, replacement: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Update {
    pub table: String,
    pub assignments: Vec<Assignment>,
    pub predicate: Predicate,
}

impl Update {
    pub fn table(table: &str) -> Self {
        Self { table: table.to_string(), assignments: Vec::new(), predicate: Predicate::All }
    }

    pub fn set(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.assignments.push(Assignment::Set { column: column.to_string(), value: value.into() });
        self
    }

    pub fn replace(mut self, column: &str, search: &str, replacement: &str) -> Self {
        self.assignments.push(Assignment::Replace { column: column.to_string(), search: search.to_string(), replacement: replacement.to_string() });
        self
    }

    pub fn where_eq(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.predicate = Predicate::Eq { column: column.to_string(), value: value.into() };
        self
    }

    pub fn where_id(mut self, row_id: RowId) -> Self {
        self.predicate = Predicate::RowId(row_id);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Delete {
    pub table: String,
    pub predicate: Predicate,
}

#[allow(clippy::should_implement_trait)]
impl Delete {
    pub fn from(table: &str) -> Self {
        Self { table: table.to_string(), predicate: Predicate::All }
    }

    pub fn where_eq(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.predicate = Predicate::Eq { column: column.to_string(), value: value.into() };
        self
    }

    pub fn where_id(mut self, row_id: RowId) -> Self {
        self.predicate = Predicate::RowId(row_id);
        self
    }
}

enum Filter {
    All,
    RowId(RowId),
    Eq(ColumnRef, Value),
}

impl Filter {
    fn resolve(schema: &TableSchema, predicate: &Predicate) -> Result<Filter, AppError> {
        match predicate {
            Predicate::All => Ok(Filter::All),
            Predicate::RowId(row_id) => Ok(Filter::RowId(*row_id)),
            Predicate::Eq { column, value } => {
                let column_ref = schema.resolve(column)?;
                if schema.is_encoded(column_ref) {
                    return Err(AppError::UnsupportedOperation(format!(
                        "equality search on encoded column {}.{}",
                        schema.name, column
                    )));
                }
                Ok(Filter::Eq(column_ref, schema.coerce(column_ref, value.clone())?))
            }
        }
    }

    fn accepts(&self, row_id: RowId, cells: &[Value]) -> bool {
        match self {
            Filter::All => true,
            Filter::RowId(id) => *id == row_id,
            Filter::Eq(ColumnRef::RowId, value) => Value::Integer(row_id as i64).matches(value),
            Filter::Eq(ColumnRef::Field(position), value) => cells[*position].matches(value),
        }
    }

    fn rows<T: ReadableTable<RowId, &'static [u8]>>(&self, rows: &RowsTable<T>) -> Result<Vec<(RowId, Vec<Value>)>, AppError> {
        match self {
            Filter::RowId(row_id) => Ok(rows.get(*row_id)?.map(|cells| vec![(*row_id, cells)]).unwrap_or_default()),
            _ => Ok(rows.scan()?.into_iter().filter(|(row_id, cells)| self.accepts(*row_id, cells)).collect()),
        }
    }
}

enum Change {
    Set(usize, Value),
    Replace(usize, String, String),
}

impl Change {
    fn resolve(storage: &Storage, schema: &TableSchema, assignment: &Assignment) -> Result<Change, AppError> {
        let (column, column_ref) = match assignment {
            Assignment::Set { column, .. } | Assignment::Replace { column, .. } => (column, schema.resolve(column)?),
        };
        let ColumnRef::Field(position) = column_ref else {
            return Err(AppError::UnsupportedOperation(format!("row id column {}.{} is read-only", schema.name, column)));
        };
        match assignment {
            Assignment::Set { value, .. } => {
                let stored = storage.stored_cell(schema, column_ref, value.clone())?;
                if stored.is_null() && schema.columns[position].not_null {
                    return Err(AppError::NullConstraint { table: schema.name.clone(), column: column.clone() });
                }
                Ok(Change::Set(position, stored))
            }
            Assignment::Replace { search, replacement, .. } => {
                if schema.is_encoded(column_ref) {
                    return Err(AppError::UnsupportedOperation(format!("text replace on encoded column {}.{}", schema.name, column)));
                }
                Ok(Change::Replace(position, search.clone(), replacement.clone()))
            }
        }
    }

    /// Applies the change to `cells`, false when it does not apply to this row.
    fn apply(&self, schema: &TableSchema, cells: &mut [Value]) -> Result<bool, AppError> {
        match self {
            Change::Set(position, value) => {
                cells[*position] = value.clone();
                Ok(true)
            }
            Change::Replace(position, search, replacement) => match replace_text(&cells[*position], search, replacement) {
                Some(text) => {
                    cells[*position] = schema.coerce(ColumnRef::Field(*position), Value::Text(text))?;
                    Ok(true)
                }
                None => Ok(false),
            },
        }
    }
}

fn replace_text(cell: &Value, search: &str, replacement: &str) -> Option<String> {
    if search.is_empty() {
        return None;
    }
    cell.to_text().filter(|text| text.contains(search)).map(|text| text.replace(search, replacement))
}

fn projection(schema: &TableSchema, columns: &[String]) -> Result<Vec<ColumnRef>, AppError> {
    if columns.is_empty() {
        Ok(std::iter::once(ColumnRef::RowId).chain((0..schema.columns.len()).map(ColumnRef::Field)).collect())
    } else {
        columns.iter().map(|column| schema.resolve(column)).collect()
    }
}

fn project(columns: &[ColumnRef], row_id: RowId, cells: &[Value]) -> Vec<Value> {
    columns
        .iter()
        .map(|column| match column {
            ColumnRef::RowId => Value::Integer(row_id as i64),
            ColumnRef::Field(position) => cells[*position].clone(),
        })
        .collect()
}

fn delete_rows(tx: &WriteTransaction, query: &Delete) -> Result<u64, AppError> {
    let schema = CatalogTable::open(tx)?.require(&query.table)?;
    let filter = Filter::resolve(&schema, &query.predicate)?;
    let mut rows = RowsTable::open(tx, &schema)?;
    let mut indexes = schema
        .unique_positions()
        .map(|position| Ok((position, UniqueIndex::open(tx, &schema, position)?)))
        .collect::<Result<Vec<_>, AppError>>()?;
    let targets = filter.rows(&rows)?;
    for (row_id, cells) in &targets {
        for (position, index) in indexes.iter_mut() {
            index.release(&cells[*position], *row_id)?;
        }
        rows.remove(*row_id)?;
    }
    debug!("Deleted {} rows of {}", targets.len(), schema.name);
    Ok(targets.len() as u64)
}

fn reported<T>(operation: &str, table: &str, result: Result<T, AppError>) -> Result<T, AppError> {
    match &result {
        Err(err) if err.is_recoverable() => warn!("{} on {} failed: {}", operation, table, err),
        Err(err) => error!("{} on {} failed: {}", operation, table, err),
        Ok(_) => {}
    }
    result
}

impl Storage {
    pub fn select(&self, query: &Select) -> Result<ResultSet, AppError> {
        validate_ident(&query.table)?;
        let (columns, raw) = self.read(|tx| {
            let schema = CatalogTable::open_read(tx)?.require(&query.table)?;
            let filter = Filter::resolve(&schema, &query.predicate)?;
            let projected = projection(&schema, &query.columns)?;
            let rows = RowsTable::open_read(tx, &schema)?;
            let raw: Vec<Vec<Value>> = filter.rows(&rows)?.iter().map(|(row_id, cells)| project(&projected, *row_id, cells)).collect();
            let columns: Vec<OutputColumn> = projected
                .iter()
                .map(|column| OutputColumn { name: schema.column_name(*column).to_string(), encoded: schema.is_encoded(*column) })
                .collect();
            Ok((columns, raw))
        })?;
        normalize(self.codec(), columns, raw)
    }

    /// Number of rows `query` selects, its projection is ignored.
    pub fn count(&self, query: &Select) -> Result<u64, AppError> {
        validate_ident(&query.table)?;
        self.read(|tx| {
            let schema = CatalogTable::open_read(tx)?.require(&query.table)?;
            let filter = Filter::resolve(&schema, &query.predicate)?;
            let rows = RowsTable::open_read(tx, &schema)?;
            match filter {
                Filter::All => rows.count(),
                _ => Ok(filter.rows(&rows)?.len() as u64),
            }
        })
    }

    /// Applies the assignments to every selected row and returns how many rows they applied to.
    /// `Set` applies to every selected row, `Replace` only where the search text occurs.
    pub fn update(&self, query: &Update) -> Result<u64, AppError> {
        validate_ident(&query.table)?;
        self.write(|tx| {
            let schema = CatalogTable::open(tx)?.require(&query.table)?;
            let filter = Filter::resolve(&schema, &query.predicate)?;
            let changes = query.assignments.iter().map(|a| Change::resolve(self, &schema, a)).collect::<Result<Vec<_>, _>>()?;
            let mut rows = RowsTable::open(tx, &schema)?;
            let mut indexes = schema
                .unique_positions()
                .map(|position| Ok((position, UniqueIndex::open(tx, &schema, position)?)))
                .collect::<Result<Vec<_>, AppError>>()?;
            let mut applied = 0;
            for (row_id, before) in filter.rows(&rows)? {
                let mut cells = before.clone();
                let mut touched = false;
                for change in &changes {
                    touched |= change.apply(&schema, &mut cells)?;
                }
                if !touched {
                    continue;
                }
                applied += 1;
                if cells == before {
                    continue;
                }
                for (position, index) in indexes.iter_mut() {
                    if cells[*position] != before[*position] {
                        index.release(&before[*position], row_id)?;
                        index.claim(&cells[*position], row_id)?;
                    }
                }
                rows.insert(row_id, &cells)?;
            }
            debug!("Updated {} rows of {}", applied, schema.name);
            Ok(applied)
        })
    }

    pub fn delete(&self, query: &Delete) -> Result<u64, AppError> {
        validate_ident(&query.table)?;
        self.write(|tx| delete_rows(tx, query))
    }

    /// Runs all deletes in one transaction, either every one of them applies or none does.
    /// Returns the rows deleted per query.
    pub fn delete_batch(&self, queries: &[Delete]) -> Result<Vec<u64>, AppError> {
        for query in queries {
            validate_ident(&query.table)?;
        }
        self.write(|tx| queries.iter().map(|query| delete_rows(tx, query)).collect::<Result<Vec<_>, _>>())
    }

    pub fn get_all_rows(&self, table: &str) -> Result<ResultSet, AppError> {
        reported("get_all_rows", table, self.select(&Select::from(table)))
    }

    pub fn get_rows_matching(&self, table: &str, column: &str, value: impl Into<Value>) -> Result<ResultSet, AppError> {
        reported("get_rows_matching", table, self.select(&Select::from(table).where_eq(column, value)))
    }

    pub fn get_column(&self, table: &str, column: &str) -> Result<ResultSet, AppError> {
        reported("get_column", table, self.select(&Select::from(table).column(column)))
    }

    pub fn count_all(&self, table: &str) -> Result<u64, AppError> {
        reported("count_all", table, self.count(&Select::from(table)))
    }

    pub fn count_matching(&self, table: &str, column: &str, value: impl Into<Value>) -> Result<u64, AppError> {
        reported("count_matching", table, self.count(&Select::from(table).where_eq(column, value)))
    }

    /// Overwrites one cell, `Ok(false)` when no row has `row_id`.
    pub fn set_cell(&self, table: &str, row_id: RowId, column: &str, value: impl Into<Value>) -> Result<bool, AppError> {
        reported("set_cell", table, self.update(&Update::table(table).set(column, value).where_id(row_id))).map(|n| n > 0)
    }

    /// Replaces `search` by `replacement` inside every cell of `column`. Returns the number of rows changed.
    pub fn replace_in_column(&self, table: &str, column: &str, search: &str, replacement: &str) -> Result<u64, AppError> {
        reported("replace_in_column", table, self.update(&Update::table(table).replace(column, search, replacement)))
    }

    pub fn update_where(&self, table: &str, search_column: &str, search_value: impl Into<Value>, target_column: &str, value: impl Into<Value>) -> Result<u64, AppError> {
        let update = Update::table(table).set(target_column, value).where_eq(search_column, search_value);
        reported("update_where", table, self.update(&update))
    }

    pub fn delete_row(&self, table: &str, row_id: RowId) -> Result<bool, AppError> {
        reported("delete_row", table, self.delete(&Delete::from(table).where_id(row_id))).map(|n| n > 0)
    }

    pub fn delete_where(&self, table: &str, column: &str, value: impl Into<Value>) -> Result<u64, AppError> {
        reported("delete_where", table, self.delete(&Delete::from(table).where_eq(column, value)))
    }
}
