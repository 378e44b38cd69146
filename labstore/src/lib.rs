//! labstore is a small embedded tabular store on top of [Redb](https://github.com/cberner/redb).
//!
//! Tables are declared at runtime and addressed by name. Every name is checked against the
//! identifier grammar and resolved against the catalog before any data is touched.
//! Rows are `bincode` encoded cell vectors, unique columns are backed by their own index tables
//! and columns declared as encoded hold codec payloads that are decoded on every read.
//!
//! Measurement records keyed by a unique date are declared with [`measurement_record!`].

pub mod codec;
pub mod ddl;
pub mod error;
pub mod logger;
pub mod macro_rules;
pub mod normalize;
pub mod query;
pub mod schema;
pub mod settings;
pub mod storage;
pub mod table_writer;
pub mod value;

pub use chrono;
pub use codec::{decode_as, encode_as, BincodeCodec, Codec};
pub use error::{AppError, ErrorKind};
pub use log;
pub use normalize::{Collapsed, ResultSet};
pub use query::{Assignment, Delete, Predicate, Select, Update};
pub use schema::{validate_ident, ColumnDef, ColumnRef, ColumnType, RowId, TableDef, TableSchema, MAX_IDENT_LEN};
pub use settings::StoreSettings;
pub use storage::Storage;
pub use table_writer::{date_key, parse_date_key, real_cell, Record, DATE_KEY_FORMAT};
pub use value::{Affinity, Value};
