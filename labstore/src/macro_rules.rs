/// Declares a dated measurement record: a struct keyed by a unique date with one
/// optional real field per measurement, each carrying its unit.
///
/// ```ignore
/// measurement_record! {
///     pub struct Lipids in "lipids" keyed by date {
///         cholesterol: "mg/dl",
///         triglyceride: "mg/dl",
///     }
/// }
/// ```
#[macro_export]
macro_rules! measurement_record {
    ($vis:vis struct $Name:ident in $table:literal keyed by $key:ident { $($field:ident : $unit:literal),* $(,)? }) => {
        #[derive(Debug, Clone, PartialEq, Default)]
        $vis struct $Name {
            pub $key: $crate::chrono::NaiveDate,
            $(pub $field: Option<f64>,)*
        }

        impl $Name {
            pub const TABLE: &'static str = $table;
            pub const KEY: &'static str = stringify!($key);
            /// Measurement columns in table order with their units.
            pub const UNITS: &'static [(&'static str, &'static str)] = &[$((stringify!($field), $unit)),*];

            /// Empty record for the given day.
            pub fn on(year: i32, month: u32, day: u32) -> Result<Self, $crate::AppError> {
                Ok(Self { $key: $crate::date_key(year, month, day)?, $($field: None,)* })
            }

            pub fn unit_of(column: &str) -> Option<&'static str> {
                Self::UNITS.iter().find(|(name, _)| *name == column).map(|(_, unit)| *unit)
            }

            /// `None` when `column` is not a measurement of this record.
            pub fn measurement(&self, column: &str) -> Option<Option<f64>> {
                $(
                    if column == stringify!($field) {
                        return Some(self.$field);
                    }
                )*
                None
            }

            pub fn set_measurement(&mut self, column: &str, value: Option<f64>) -> bool {
                $(
                    if column == stringify!($field) {
                        self.$field = value;
                        return true;
                    }
                )*
                false
            }

            /// Rebuilds a record from a full row as returned by `Storage::get_all_rows`.
            pub fn from_row(row: &[$crate::Value]) -> Result<Self, $crate::AppError> {
                let expected = Self::UNITS.len() + 2;
                if row.len() != expected {
                    return Err($crate::AppError::InvalidDefinition(format!(
                        "{} row has {} cells, expected {}", $table, row.len(), expected
                    )));
                }
                let key = match &row[1] {
                    $crate::Value::Text(text) => $crate::parse_date_key(stringify!($key), text)?,
                    other => return Err($crate::AppError::TypeMismatch {
                        column: stringify!($key).to_string(),
                        message: format!("expected a date, found {}", other.type_name()),
                    }),
                };
                let mut cells = row[2..].iter();
                Ok(Self {
                    $key: key,
                    $($field: match cells.next() {
                        Some(cell) => $crate::real_cell(stringify!($field), cell)?,
                        None => None,
                    },)*
                })
            }
        }

        impl $crate::Record for $Name {
            fn table_def() -> $crate::TableDef {
                $crate::TableDef::new($table)
                    .column($crate::ColumnDef::text(stringify!($key)).unique().not_null())
                    $(.column($crate::ColumnDef::real(stringify!($field))))*
            }

            fn cells(&self) -> Vec<$crate::Value> {
                vec![
                    $crate::Value::Text(self.$key.format($crate::DATE_KEY_FORMAT).to_string()),
                    $($crate::Value::from(self.$field),)*
                ]
            }
        }
    };
}
