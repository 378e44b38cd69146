use crate::{AppError, TableSchema};
use redb::{ReadOnlyTable, ReadTransaction, ReadableTable, Table, TableDefinition, WriteTransaction};

pub(crate) const CATALOG: TableDefinition<&str, &[u8]> = TableDefinition::new("labstore_catalog");
pub(crate) const SEQUENCE: TableDefinition<&str, u64> = TableDefinition::new("labstore_sequence");
const TABLE_ID: &str = "table_id";

/// Logical table name to its JSON encoded [`TableSchema`].
pub(crate) struct CatalogTable<T> {
    table: T,
}

impl<'txn> CatalogTable<Table<'txn, &'static str, &'static [u8]>> {
    pub fn open(tx: &'txn WriteTransaction) -> Result<Self, AppError> {
        Ok(Self { table: tx.open_table(CATALOG)? })
    }

    pub fn put(&mut self, schema: &TableSchema) -> Result<(), AppError> {
        let bytes = serde_json::to_vec(schema)?;
        self.table.insert(schema.name.as_str(), bytes.as_slice())?;
        Ok(())
    }

    pub fn remove(&mut self, name: &str) -> Result<bool, AppError> {
        Ok(self.table.remove(name)?.is_some())
    }
}

impl CatalogTable<ReadOnlyTable<&'static str, &'static [u8]>> {
    pub fn open_read(tx: &ReadTransaction) -> Result<Self, AppError> {
        Ok(Self { table: tx.open_table(CATALOG)? })
    }
}

impl<T: ReadableTable<&'static str, &'static [u8]>> CatalogTable<T> {
    pub fn get(&self, name: &str) -> Result<Option<TableSchema>, AppError> {
        match self.table.get(name)? {
            Some(guard) => Ok(Some(serde_json::from_slice(guard.value())?)),
            None => Ok(None),
        }
    }

    pub fn require(&self, name: &str) -> Result<TableSchema, AppError> {
        match self.get(name)? {
            Some(schema) => Ok(schema),
            None => Err(AppError::UnknownTable { name: name.to_string(), available: self.names()? }),
        }
    }

    pub fn names(&self) -> Result<Vec<String>, AppError> {
        let mut names = Vec::new();
        for entry in self.table.iter()? {
            let (name, _) = entry?;
            names.push(name.value().to_string());
        }
        Ok(names)
    }
}

pub(crate) fn init(tx: &WriteTransaction) -> Result<(), AppError> {
    tx.open_table(CATALOG)?;
    tx.open_table(SEQUENCE)?;
    Ok(())
}

pub(crate) fn next_table_id(tx: &WriteTransaction) -> Result<u64, AppError> {
    let mut sequence = tx.open_table(SEQUENCE)?;
    let next = sequence.get(TABLE_ID)?.map(|guard| guard.value()).unwrap_or(0) + 1;
    sequence.insert(TABLE_ID, next)?;
    Ok(next)
}
