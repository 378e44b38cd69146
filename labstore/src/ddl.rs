use crate::schema::validate_ident;
use crate::storage::catalog::{next_table_id, CatalogTable};
use crate::storage::table_rows::{RowsDef, RowsTable};
use crate::storage::table_unique::{UniqueDef, UniqueIndex};
use crate::{AppError, ColumnRef, Storage, TableDef, TableSchema};
use log::{debug, info, warn};

impl Storage {
    /// Creates the table unless one with the same name exists. Returns whether it was created.
    pub fn create_table(&self, def: &TableDef) -> Result<bool, AppError> {
        def.validate()?;
        self.write(|tx| {
            let mut catalog = CatalogTable::open(tx)?;
            if let Some(existing) = catalog.get(&def.name)? {
                if !existing.same_shape(def) {
                    warn!("Table {} already exists with a different shape, keeping the existing one", def.name);
                }
                return Ok(false);
            }
            let schema = TableSchema::from_def(next_table_id(tx)?, def);
            RowsTable::open(tx, &schema)?;
            for position in schema.unique_positions() {
                UniqueIndex::open(tx, &schema, position)?;
            }
            catalog.put(&schema)?;
            info!("Created table {} with {} columns", schema.name, schema.columns.len() + 1);
            Ok(true)
        })
    }

    /// Drops the table with its rows and indexes. Absent tables are a no-op returning false.
    pub fn delete_table(&self, name: &str) -> Result<bool, AppError> {
        validate_ident(name)?;
        self.write(|tx| {
            let mut catalog = CatalogTable::open(tx)?;
            let Some(schema) = catalog.get(name)? else {
                debug!("Table {} does not exist, nothing to delete", name);
                return Ok(false);
            };
            tx.delete_table(RowsDef::new(&schema.rows_table_name()))?;
            for position in schema.unique_positions() {
                tx.delete_table(UniqueDef::new(&schema.unique_table_name(position)))?;
            }
            catalog.remove(name)?;
            info!("Deleted table {}", name);
            Ok(true)
        })
    }

    pub fn rename_table(&self, old: &str, new: &str) -> Result<(), AppError> {
        validate_ident(old)?;
        validate_ident(new)?;
        self.write(|tx| {
            let mut catalog = CatalogTable::open(tx)?;
            let mut schema = catalog.require(old)?;
            if catalog.get(new)?.is_some() {
                return Err(AppError::TableExists(new.to_string()));
            }
            catalog.remove(old)?;
            schema.name = new.to_string();
            catalog.put(&schema)?;
            info!("Renamed table {} to {}", old, new);
            Ok(())
        })
    }

    pub fn rename_column(&self, table: &str, old: &str, new: &str) -> Result<(), AppError> {
        validate_ident(table)?;
        validate_ident(new)?;
        self.write(|tx| {
            let mut catalog = CatalogTable::open(tx)?;
            let mut schema = catalog.require(table)?;
            let column = schema.resolve(old)?;
            if schema.resolve(new).is_ok() {
                return Err(AppError::ColumnExists { table: table.to_string(), column: new.to_string() });
            }
            match column {
                ColumnRef::RowId => schema.row_id = new.to_string(),
                ColumnRef::Field(position) => schema.columns[position].name = new.to_string(),
            }
            catalog.put(&schema)?;
            info!("Renamed column {}.{} to {}", table, old, new);
            Ok(())
        })
    }

    /// Names of all tables, sorted.
    pub fn list_tables(&self) -> Result<Vec<String>, AppError> {
        self.read(|tx| CatalogTable::open_read(tx)?.names())
    }

    pub fn table_schema(&self, name: &str) -> Result<TableSchema, AppError> {
        validate_ident(name)?;
        self.read(|tx| CatalogTable::open_read(tx)?.require(name))
    }
}

#[cfg(test)]
mod tests {
    use crate::{AppError, ColumnDef, ErrorKind, Storage, TableDef, Value};

    fn samples_def() -> TableDef {
        TableDef::new("samples").column(ColumnDef::text("date").unique().not_null()).column(ColumnDef::real("value"))
    }

    #[test]
    fn create_table_is_idempotent() {
        let storage = Storage::temp("ddl_idempotent").unwrap();
        assert!(storage.create_table(&samples_def()).unwrap());
        storage.insert_row("samples", &[("date", Value::from("2024-01-01"))]).unwrap();
        assert!(!storage.create_table(&samples_def()).unwrap());
        assert!(!storage.create_table(&TableDef::new("samples").column(ColumnDef::real("other"))).unwrap());
        assert_eq!(storage.count_all("samples").unwrap(), 1);
        assert_eq!(storage.table_schema("samples").unwrap().columns, samples_def().columns);
    }

    #[test]
    fn invalid_definitions_never_reach_the_catalog() {
        let storage = Storage::temp("ddl_invalid").unwrap();
        let err = storage.create_table(&TableDef::new("blood; DROP TABLE blood")).unwrap_err();
        assert!(matches!(err, AppError::InvalidIdentifier(_)));
        assert!(storage.list_tables().unwrap().is_empty());
    }

    #[test]
    fn delete_missing_table_is_a_noop() {
        let storage = Storage::temp("ddl_delete_missing").unwrap();
        storage.create_table(&samples_def()).unwrap();
        assert!(!storage.delete_table("nothing_here").unwrap());
        assert_eq!(storage.list_tables().unwrap(), vec!["samples".to_string()]);
        assert!(storage.delete_table("samples").unwrap());
        assert!(!storage.delete_table("samples").unwrap());
        assert!(storage.list_tables().unwrap().is_empty());
    }

    #[test]
    fn recreated_table_starts_empty_and_unique_index_is_fresh() {
        let storage = Storage::temp("ddl_recreate").unwrap();
        storage.create_table(&samples_def()).unwrap();
        storage.insert_row("samples", &[("date", Value::from("2024-01-01"))]).unwrap();
        storage.delete_table("samples").unwrap();
        storage.create_table(&samples_def()).unwrap();
        assert_eq!(storage.count_all("samples").unwrap(), 0);
        storage.insert_row("samples", &[("date", Value::from("2024-01-01"))]).unwrap();
        assert_eq!(storage.count_all("samples").unwrap(), 1);
    }

    #[test]
    fn rename_table_keeps_rows() {
        let storage = Storage::temp("ddl_rename_table").unwrap();
        storage.create_table(&samples_def()).unwrap();
        storage.create_table(&TableDef::new("other")).unwrap();
        storage.insert_row("samples", &[("date", Value::from("2024-01-01")), ("value", Value::from(5.0))]).unwrap();

        assert!(matches!(storage.rename_table("samples", "other"), Err(AppError::TableExists(_))));
        assert_eq!(storage.rename_table("missing", "x").unwrap_err().kind(), ErrorKind::UnknownTable);

        storage.rename_table("samples", "blood").unwrap();
        assert_eq!(storage.list_tables().unwrap(), vec!["blood".to_string(), "other".to_string()]);
        assert_eq!(storage.count_all("blood").unwrap(), 1);
        assert_eq!(storage.count_all("samples").unwrap_err().kind(), ErrorKind::UnknownTable);
        let dup = storage.insert_row("blood", &[("date", Value::from("2024-01-01"))]).unwrap_err();
        assert_eq!(dup.kind(), ErrorKind::DuplicateKey);
    }

    #[test]
    fn rename_column_keeps_values_and_constraints() {
        let storage = Storage::temp("ddl_rename_column").unwrap();
        storage.create_table(&samples_def()).unwrap();
        storage.insert_row("samples", &[("date", Value::from("2024-01-01")), ("value", Value::from(5.0))]).unwrap();

        storage.rename_column("samples", "value", "cholesterol").unwrap();
        storage.rename_column("samples", "id", "sample_id").unwrap();
        assert!(matches!(storage.rename_column("samples", "date", "cholesterol"), Err(AppError::ColumnExists { .. })));
        assert_eq!(storage.rename_column("samples", "value", "x").unwrap_err().kind(), ErrorKind::UnknownColumn);

        let rows = storage.get_all_rows("samples").unwrap();
        assert_eq!(rows.columns(), ["sample_id", "date", "cholesterol"]);
        assert_eq!(rows.first_row().unwrap(), [Value::Integer(1), Value::from("2024-01-01"), Value::Real(5.0)]);
        assert_eq!(storage.count_matching("samples", "sample_id", 1).unwrap(), 1);
    }
}
