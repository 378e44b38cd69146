use crate::codec::{decode_as, encode_as};
use crate::{AppError, RowId, TableSchema, Value};
use redb::{ReadOnlyTable, ReadTransaction, ReadableTable, Table, TableDefinition, WriteTransaction};

pub(crate) type RowsDef<'a> = TableDefinition<'a, RowId, &'static [u8]>;

/// Row id to the bincode encoded cells of one logical table, row id excluded.
pub(crate) struct RowsTable<T> {
    table: T,
    width: usize,
}

impl<'txn> RowsTable<Table<'txn, RowId, &'static [u8]>> {
    /// Opening for write creates the underlying table when missing.
    pub fn open(tx: &'txn WriteTransaction, schema: &TableSchema) -> Result<Self, AppError> {
        let name = schema.rows_table_name();
        Ok(Self { table: tx.open_table(RowsDef::new(&name))?, width: schema.columns.len() })
    }

    pub fn next_id(&self) -> Result<RowId, AppError> {
        Ok(self.table.last()?.map(|(key, _)| key.value() + 1).unwrap_or(1))
    }

    pub fn insert(&mut self, row_id: RowId, cells: &[Value]) -> Result<(), AppError> {
        let bytes = encode_as(cells)?;
        self.table.insert(row_id, bytes.as_slice())?;
        Ok(())
    }

    pub fn remove(&mut self, row_id: RowId) -> Result<bool, AppError> {
        Ok(self.table.remove(row_id)?.is_some())
    }
}

impl RowsTable<ReadOnlyTable<RowId, &'static [u8]>> {
    pub fn open_read(tx: &ReadTransaction, schema: &TableSchema) -> Result<Self, AppError> {
        let name = schema.rows_table_name();
        Ok(Self { table: tx.open_table(RowsDef::new(&name))?, width: schema.columns.len() })
    }
}

impl<T: ReadableTable<RowId, &'static [u8]>> RowsTable<T> {
    pub fn get(&self, row_id: RowId) -> Result<Option<Vec<Value>>, AppError> {
        match self.table.get(row_id)? {
            Some(guard) => Ok(Some(self.decode(row_id, guard.value())?)),
            None => Ok(None),
        }
    }

    /// Every row in row id order.
    pub fn scan(&self) -> Result<Vec<(RowId, Vec<Value>)>, AppError> {
        let mut rows = Vec::new();
        for entry in self.table.iter()? {
            let (key, value) = entry?;
            let row_id = key.value();
            rows.push((row_id, self.decode(row_id, value.value())?));
        }
        Ok(rows)
    }

    pub fn count(&self) -> Result<u64, AppError> {
        Ok(self.table.len()?)
    }

    fn decode(&self, row_id: RowId, bytes: &[u8]) -> Result<Vec<Value>, AppError> {
        let cells: Vec<Value> = decode_as(bytes)?;
        if cells.len() != self.width {
            return Err(AppError::Codec(format!("row {} has {} cells, schema declares {}", row_id, cells.len(), self.width)));
        }
        Ok(cells)
    }
}
