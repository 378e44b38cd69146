use labstore::{AppError, ColumnDef, Delete, ErrorKind, Select, Storage, StoreSettings, TableDef, Update, Value};
use std::{env, fs};

fn notes_def() -> TableDef {
    TableDef::new("notes")
        .row_id("note_id")
        .column(ColumnDef::text("title").unique().not_null())
        .column(ColumnDef::integer("priority"))
        .column(ColumnDef::encoded("attachment"))
}

#[test]
fn store_from_settings_file() {
    let dir = env::temp_dir().join("labstore").join(format!("it_settings_{}", rand::random::<u64>()));
    fs::create_dir_all(&dir).unwrap();
    let config = dir.join("store.toml");
    fs::write(&config, format!("db_dir = {:?}\ndb_name = \"lab.redb\"\ncache_size_mb = 4\nlog_level = \"debug\"\n", dir.join("data"))).unwrap();

    let settings = StoreSettings::load(config.to_str().unwrap(), "LABSTORE_IT_SETTINGS").unwrap();
    assert_eq!(settings.log_level, "debug");
    let storage = Storage::from_settings(&settings).unwrap();
    assert!(dir.join("data").join("lab.redb").exists());
    assert!(storage.create_table(&notes_def()).unwrap());
}

#[test]
fn builders_cover_the_generic_operations() {
    let storage = Storage::temp("it_builders").unwrap();
    storage.create_table(&notes_def()).unwrap();
    let attachment = Value::List(vec![Value::from("scan.pdf"), Value::Blob(vec![1, 2, 3])]);
    storage.insert_row("notes", &[("title", Value::from("fasting")), ("priority", Value::from("2")), ("attachment", attachment.clone())]).unwrap();
    storage.insert_row("notes", &[("title", Value::from("iron")), ("priority", Value::from(1))]).unwrap();

    let first = storage.select(&Select::from("notes").where_eq("priority", 2.0)).unwrap();
    assert_eq!(first.columns(), ["note_id", "title", "priority", "attachment"]);
    assert_eq!(first.first_row().unwrap(), [Value::Integer(1), Value::from("fasting"), Value::Integer(2), attachment]);

    let updated = storage.update(&Update::table("notes").set("priority", 5).replace("title", "iron", "ferritin").where_id(2)).unwrap();
    assert_eq!(updated, 1);
    assert_eq!(storage.count(&Select::from("notes").where_eq("title", "ferritin")).unwrap(), 1);
    assert_eq!(storage.count(&Select::from("notes").where_eq("note_id", 2)).unwrap(), 1);

    assert_eq!(storage.delete(&Delete::from("notes").where_eq("priority", 5)).unwrap(), 1);
    assert_eq!(storage.count_all("notes").unwrap(), 1);
}

#[test]
fn failures_are_typed_and_leave_the_store_unchanged() {
    let storage = Storage::temp("it_failures").unwrap();
    storage.create_table(&notes_def()).unwrap();
    storage.insert_row("notes", &[("title", Value::from("a"))]).unwrap();
    storage.insert_row("notes", &[("title", Value::from("b"))]).unwrap();

    let err = storage.replace_in_column("notes", "title", "b", "a").unwrap_err();
    assert!(matches!(err, AppError::DuplicateKey { .. }));
    assert!(err.is_recoverable());
    assert_eq!(storage.count_matching("notes", "title", "b").unwrap(), 1);

    assert_eq!(storage.get_all_rows("notes; DROP TABLE notes").unwrap_err().kind(), ErrorKind::InvalidInput);
    assert_eq!(storage.count_matching("notes", "attachment", "x").unwrap_err().kind(), ErrorKind::UnsupportedOperation);
    assert_eq!(storage.rename_column("notes", "title", "priority").unwrap_err().kind(), ErrorKind::InvalidInput);
    assert_eq!(storage.count_all("notes").unwrap(), 2);
}
