use crate::codec::encode_as;
use crate::{AppError, RowId, TableSchema, Value};
use redb::{ReadableTable, Table, TableDefinition, WriteTransaction};

pub(crate) type UniqueDef<'a> = TableDefinition<'a, &'static [u8], RowId>;

/// Encoded cell value to the row holding it, one per unique column. Nulls are not indexed.
pub(crate) struct UniqueIndex<'txn> {
    table: Table<'txn, &'static [u8], RowId>,
    table_name: String,
    column: String,
}

impl<'txn> UniqueIndex<'txn> {
    pub fn open(tx: &'txn WriteTransaction, schema: &TableSchema, position: usize) -> Result<Self, AppError> {
        let name = schema.unique_table_name(position);
        Ok(Self {
            table: tx.open_table(UniqueDef::new(&name))?,
            table_name: schema.name.clone(),
            column: schema.columns[position].name.clone(),
        })
    }

    /// Registers `value` for `row_id`, failing if another row already holds it.
    pub fn claim(&mut self, value: &Value, row_id: RowId) -> Result<(), AppError> {
        if value.is_null() {
            return Ok(());
        }
        let key = encode_as(&value.index_key())?;
        let holder = self.table.get(key.as_slice())?.map(|guard| guard.value());
        match holder {
            Some(existing) if existing != row_id => Err(AppError::DuplicateKey {
                table: self.table_name.clone(),
                column: self.column.clone(),
                value: value.to_string(),
            }),
            Some(_) => Ok(()),
            None => {
                self.table.insert(key.as_slice(), row_id)?;
                Ok(())
            }
        }
    }

    pub fn release(&mut self, value: &Value, row_id: RowId) -> Result<(), AppError> {
        if value.is_null() {
            return Ok(());
        }
        let key = encode_as(&value.index_key())?;
        let holder = self.table.get(key.as_slice())?.map(|guard| guard.value());
        if holder == Some(row_id) {
            self.table.remove(key.as_slice())?;
        }
        Ok(())
    }
}
