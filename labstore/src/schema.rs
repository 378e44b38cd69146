use crate::{Affinity, AppError, Value};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

pub const MAX_IDENT_LEN: usize = 64;

pub type RowId = u64;

/// Accepts `[A-Za-z_][A-Za-z0-9_]*` up to [`MAX_IDENT_LEN`] characters.
pub fn validate_ident(name: &str) -> Result<&str, AppError> {
    let mut chars = name.chars();
    let valid_head = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_');
    let valid_tail = chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid_head && valid_tail && name.len() <= MAX_IDENT_LEN {
        Ok(name)
    } else {
        Err(AppError::InvalidIdentifier(name.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnType {
    Scalar(Affinity),
    /// Opaque codec bytes, decoded on every read.
    Encoded,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDef {
    pub name: String,
    pub column_type: ColumnType,
    pub unique: bool,
    pub not_null: bool,
}

impl ColumnDef {
    pub fn new(name: &str, column_type: ColumnType) -> Self {
        Self { name: name.to_string(), column_type, unique: false, not_null: false }
    }

    pub fn integer(name: &str) -> Self {
        Self::new(name, ColumnType::Scalar(Affinity::Integer))
    }

    pub fn real(name: &str) -> Self {
        Self::new(name, ColumnType::Scalar(Affinity::Real))
    }

    pub fn text(name: &str) -> Self {
        Self::new(name, ColumnType::Scalar(Affinity::Text))
    }

    pub fn blob(name: &str) -> Self {
        Self::new(name, ColumnType::Scalar(Affinity::Blob))
    }

    pub fn encoded(name: &str) -> Self {
        Self::new(name, ColumnType::Encoded)
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }

    pub fn is_encoded(&self) -> bool {
        self.column_type == ColumnType::Encoded
    }
}

/// Declarative shape of a table, the input of `Storage::create_table`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDef {
    pub name: String,
    pub row_id: String,
    pub columns: Vec<ColumnDef>,
}

impl TableDef {
    pub fn new(name: &str) -> Self {
        Self { name: name.to_string(), row_id: "id".to_string(), columns: Vec::new() }
    }

    /// Renames the implicit integer primary key, `id` by default.
    pub fn row_id(mut self, name: &str) -> Self {
        self.row_id = name.to_string();
        self
    }

    pub fn column(mut self, column: ColumnDef) -> Self {
        self.columns.push(column);
        self
    }

    pub fn validate(&self) -> Result<(), AppError> {
        validate_ident(&self.name)?;
        validate_ident(&self.row_id)?;
        let mut seen = HashSet::new();
        seen.insert(self.row_id.as_str());
        for column in &self.columns {
            validate_ident(&column.name)?;
            if !seen.insert(column.name.as_str()) {
                return Err(AppError::InvalidDefinition(format!("column {} declared twice in {}", column.name, self.name)));
            }
            if column.unique && column.is_encoded() {
                return Err(AppError::InvalidDefinition(format!("encoded column {}.{} cannot be unique", self.name, column.name)));
            }
        }
        Ok(())
    }
}

/// Catalog entry of an existing table. Physical redb tables are named after `table_id`
/// and column positions, so renames never move data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    pub table_id: u64,
    pub name: String,
    pub row_id: String,
    pub columns: Vec<ColumnDef>,
}

/// A column name resolved against a [`TableSchema`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnRef {
    RowId,
    Field(usize),
}

impl TableSchema {
    pub fn from_def(table_id: u64, def: &TableDef) -> Self {
        Self { table_id, name: def.name.clone(), row_id: def.row_id.clone(), columns: def.columns.clone() }
    }

    /// Shape equality with a definition, ignoring the storage id.
    pub fn same_shape(&self, def: &TableDef) -> bool {
        self.row_id == def.row_id && self.columns == def.columns
    }

    pub fn rows_table_name(&self) -> String {
        format!("rows_{}", self.table_id)
    }

    pub fn unique_table_name(&self, position: usize) -> String {
        format!("unique_{}_{}", self.table_id, position)
    }

    /// All column names with the row id first, the order rows are returned in.
    pub fn column_names(&self) -> Vec<String> {
        std::iter::once(self.row_id.clone()).chain(self.columns.iter().map(|c| c.name.clone())).collect()
    }

    pub fn resolve(&self, column: &str) -> Result<ColumnRef, AppError> {
        validate_ident(column)?;
        if column == self.row_id {
            return Ok(ColumnRef::RowId);
        }
        self.columns
            .iter()
            .position(|c| c.name == column)
            .map(ColumnRef::Field)
            .ok_or_else(|| AppError::UnknownColumn { table: self.name.clone(), name: column.to_string(), available: self.column_names() })
    }

    pub fn column_name(&self, column: ColumnRef) -> &str {
        match column {
            ColumnRef::RowId => &self.row_id,
            ColumnRef::Field(pos) => &self.columns[pos].name,
        }
    }

    pub fn is_encoded(&self, column: ColumnRef) -> bool {
        match column {
            ColumnRef::RowId => false,
            ColumnRef::Field(pos) => self.columns[pos].is_encoded(),
        }
    }

    /// Coerces `value` to what `column` stores. Encoded columns accept any value as is.
    pub fn coerce(&self, column: ColumnRef, value: Value) -> Result<Value, AppError> {
        let affinity = match column {
            ColumnRef::RowId => Affinity::Integer,
            ColumnRef::Field(pos) => match self.columns[pos].column_type {
                ColumnType::Scalar(affinity) => affinity,
                ColumnType::Encoded => return Ok(value),
            },
        };
        value.coerce(affinity).map_err(|refused| AppError::TypeMismatch {
            column: format!("{}.{}", self.name, self.column_name(column)),
            message: format!("{} values are only allowed in encoded columns", refused.type_name()),
        })
    }

    pub fn unique_positions(&self) -> impl Iterator<Item = usize> + '_ {
        self.columns.iter().enumerate().filter(|(_, c)| c.unique).map(|(pos, _)| pos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    fn sample_def() -> TableDef {
        TableDef::new("samples")
            .column(ColumnDef::text("date").unique().not_null())
            .column(ColumnDef::real("value"))
            .column(ColumnDef::encoded("labels"))
    }

    #[test]
    fn identifier_grammar() {
        assert!(validate_ident("blood").is_ok());
        assert!(validate_ident("_vit_d2").is_ok());
        assert!(validate_ident("2fast").is_err());
        assert!(validate_ident("").is_err());
        assert!(validate_ident("blood; DROP TABLE blood").is_err());
        assert!(validate_ident("date'").is_err());
        assert!(validate_ident("blüt").is_err());
        assert!(validate_ident(&"a".repeat(MAX_IDENT_LEN)).is_ok());
        assert!(validate_ident(&"a".repeat(MAX_IDENT_LEN + 1)).is_err());
    }

    #[test]
    fn definition_rejects_duplicates_and_unique_payloads() {
        assert!(sample_def().validate().is_ok());
        let twice = TableDef::new("t").column(ColumnDef::real("v")).column(ColumnDef::text("v"));
        assert!(matches!(twice.validate(), Err(AppError::InvalidDefinition(_))));
        let shadows_id = TableDef::new("t").column(ColumnDef::integer("id"));
        assert!(shadows_id.validate().is_err());
        let unique_payload = TableDef::new("t").column(ColumnDef::encoded("p").unique());
        assert!(unique_payload.validate().is_err());
    }

    #[test]
    fn resolves_columns_and_reports_unknown_ones() {
        let schema = TableSchema::from_def(7, &sample_def());
        assert_eq!(schema.resolve("id").unwrap(), ColumnRef::RowId);
        assert_eq!(schema.resolve("value").unwrap(), ColumnRef::Field(1));
        let err = schema.resolve("valeu").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownColumn);
        assert!(err.to_string().contains("\"value\""));
        assert_eq!(schema.resolve("value = 1").unwrap_err().kind(), ErrorKind::InvalidInput);
        assert_eq!(schema.column_names(), vec!["id", "date", "value", "labels"]);
        assert_eq!(schema.rows_table_name(), "rows_7");
        assert_eq!(schema.unique_table_name(0), "unique_7_0");
        assert_eq!(schema.unique_positions().collect::<Vec<_>>(), vec![0]);
    }

    #[test]
    fn coerces_by_column_type() {
        let schema = TableSchema::from_def(1, &sample_def());
        assert_eq!(schema.coerce(ColumnRef::Field(1), Value::from("5.0")).unwrap(), Value::Real(5.0));
        assert_eq!(schema.coerce(ColumnRef::RowId, Value::from("3")).unwrap(), Value::Integer(3));
        let list = Value::List(vec![Value::from("a")]);
        assert_eq!(schema.coerce(ColumnRef::Field(2), list.clone()).unwrap(), list);
        assert!(matches!(schema.coerce(ColumnRef::Field(0), list), Err(AppError::TypeMismatch { .. })));
    }
}
