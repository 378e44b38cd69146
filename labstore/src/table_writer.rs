use crate::schema::validate_ident;
use crate::storage::catalog::CatalogTable;
use crate::storage::table_rows::RowsTable;
use crate::storage::table_unique::UniqueIndex;
use crate::{AppError, ColumnRef, RowId, Storage, TableDef, TableSchema, Value};
use chrono::NaiveDate;
use log::{debug, warn};
use redb::WriteTransaction;

pub const DATE_KEY_FORMAT: &str = "%Y-%m-%d";

/// A struct persisted as one row of a fixed table.
pub trait Record {
    fn table_def() -> TableDef;
    /// Cells in the column order of [`Record::table_def`], row id excluded.
    fn cells(&self) -> Vec<Value>;
}

pub fn date_key(year: i32, month: u32, day: u32) -> Result<NaiveDate, AppError> {
    NaiveDate::from_ymd_opt(year, month, day).ok_or(AppError::InvalidDate { year, month, day })
}

pub fn parse_date_key(column: &str, text: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(text, DATE_KEY_FORMAT)
        .map_err(|err| AppError::TypeMismatch { column: column.to_string(), message: format!("{:?} is not a date: {}", text, err) })
}

/// Reads a cell of a real column, integers widen and null is absent.
pub fn real_cell(column: &str, value: &Value) -> Result<Option<f64>, AppError> {
    match value {
        Value::Null => Ok(None),
        other => other
            .as_real()
            .map(Some)
            .ok_or_else(|| AppError::TypeMismatch { column: column.to_string(), message: format!("expected a number, found {}", other.type_name()) }),
    }
}

impl Storage {
    /// Inserts one row atomically, unspecified columns are null. The row id is assigned by the store.
    pub fn insert_row(&self, table: &str, values: &[(&str, Value)]) -> Result<RowId, AppError> {
        validate_ident(table)?;
        self.write(|tx| {
            let schema = CatalogTable::open(tx)?.require(table)?;
            let mut cells = vec![Value::Null; schema.columns.len()];
            for (name, value) in values {
                match schema.resolve(name)? {
                    ColumnRef::RowId => {
                        return Err(AppError::UnsupportedOperation(format!("{}.{} is assigned by the store", table, name)));
                    }
                    column @ ColumnRef::Field(position) => cells[position] = self.stored_cell(&schema, column, value.clone())?,
                }
            }
            self.insert_cells(tx, &schema, cells)
        })
    }

    /// Writes `record` to its table. `Ok(false)` when its unique key is already stored,
    /// which is expected when the same data is submitted twice.
    pub fn add_record<R: Record>(&self, record: &R) -> Result<bool, AppError> {
        let def = R::table_def();
        let cells = record.cells();
        if cells.len() != def.columns.len() {
            return Err(AppError::InvalidDefinition(format!("record for {} has {} cells, table declares {}", def.name, cells.len(), def.columns.len())));
        }
        let values: Vec<(&str, Value)> = def.columns.iter().map(|c| c.name.as_str()).zip(cells).collect();
        match self.insert_row(&def.name, &values) {
            Ok(row_id) => {
                debug!("Inserted row {} into {}", row_id, def.name);
                Ok(true)
            }
            Err(AppError::DuplicateKey { table, column, value }) => {
                warn!("Duplicate {} with same {} ({}) found. Skipping", table, column, value);
                Ok(false)
            }
            Err(err) => Err(err),
        }
    }

    /// Coerces `value` to the column and encodes payloads of encoded columns.
    pub(crate) fn stored_cell(&self, schema: &TableSchema, column: ColumnRef, value: Value) -> Result<Value, AppError> {
        let value = schema.coerce(column, value)?;
        if schema.is_encoded(column) && !value.is_null() {
            Ok(Value::Blob(self.codec().encode(&value)?))
        } else {
            Ok(value)
        }
    }

    pub(crate) fn insert_cells(&self, tx: &WriteTransaction, schema: &TableSchema, cells: Vec<Value>) -> Result<RowId, AppError> {
        for (column, cell) in schema.columns.iter().zip(&cells) {
            if column.not_null && cell.is_null() {
                return Err(AppError::NullConstraint { table: schema.name.clone(), column: column.name.clone() });
            }
        }
        let mut rows = RowsTable::open(tx, schema)?;
        let row_id = rows.next_id()?;
        for position in schema.unique_positions() {
            UniqueIndex::open(tx, schema, position)?.claim(&cells[position], row_id)?;
        }
        rows.insert(row_id, &cells)?;
        Ok(row_id)
    }
}
