use bloodwork::labstore::{Collapsed, ErrorKind, Value};
use bloodwork::{BloodSample, BloodStore};
use std::env;

fn db_dir() -> std::path::PathBuf {
    env::temp_dir().join("bloodwork").join(format!("it_{}", rand::random::<u64>()))
}

#[test]
fn resubmitted_day_is_skipped() {
    let store = BloodStore::open(db_dir(), "blood.redb").unwrap();
    store.create_blood_table().unwrap();

    let first = BloodSample { cholesterol: Some(5.0), ..BloodSample::on(2024, 1, 1).unwrap() };
    let again = BloodSample { cholesterol: Some(9.0), ..BloodSample::on(2024, 1, 1).unwrap() };
    assert!(store.add_sample(&first).unwrap());
    assert!(!store.add_sample(&again).unwrap());

    let storage = store.storage();
    assert_eq!(storage.count_all("blood").unwrap(), 1);
    let stored = storage.get_rows_matching("blood", "date", "2024-01-01").unwrap();
    assert_eq!(stored.column_values("cholesterol").unwrap(), vec![Value::Real(5.0)]);
}

#[test]
fn generic_operations_on_the_blood_table() {
    let store = BloodStore::open(db_dir(), "blood.redb").unwrap();
    store.create_blood_table().unwrap();
    for day in 1..=3 {
        let sample = BloodSample { tsh: Some(day as f64), ..BloodSample::on(2024, 1, day).unwrap() };
        store.add_sample(&sample).unwrap();
    }
    let storage = store.storage();
    assert_eq!(storage.count_matching("blood", "date", "2024-01-02").unwrap(), 1);
    assert_eq!(storage.count_all("blood").unwrap(), 3);

    assert!(storage.set_cell("blood", 2, "tsh", 2.5).unwrap());
    assert_eq!(storage.update_where("blood", "date", "2024-01-03", "sodium", 140).unwrap(), 1);
    let sample = store.sample_on(BloodSample::on(2024, 1, 3).unwrap().date).unwrap().unwrap();
    assert_eq!(sample.sodium, Some(140.0));

    match storage.get_column("blood", "tsh").unwrap().collapse() {
        Collapsed::Column(values) => assert_eq!(values, vec![Value::Real(1.0), Value::Real(2.5), Value::Real(3.0)]),
        other => panic!("expected a column, got {:?}", other),
    }
    assert_eq!(storage.get_rows_matching("blood", "tsh_level", 1).unwrap_err().kind(), ErrorKind::UnknownColumn);
    assert_eq!(storage.count_all("blood").unwrap(), 3);
}

#[test]
fn samples_survive_reopening_and_renames() {
    let dir = db_dir();
    {
        let store = BloodStore::open(&dir, "blood.redb").unwrap();
        store.create_blood_table().unwrap();
        store.add_sample(&BloodSample { vit_d: Some(28.0), ..BloodSample::on(2022, 6, 30).unwrap() }).unwrap();
        store.label_sample(BloodSample::on(2022, 6, 30).unwrap().date, &["summer"]).unwrap();
    }
    let store = BloodStore::open(&dir, "blood.redb").unwrap();
    assert!(!store.create_blood_table().unwrap());
    let samples = store.samples().unwrap();
    assert_eq!(samples.len(), 1);
    assert_eq!(samples[0].vit_d, Some(28.0));
    assert_eq!(store.labels_for(samples[0].date).unwrap(), vec!["summer".to_string()]);

    store.storage().rename_table("blood", "blood_2022").unwrap();
    assert_eq!(store.storage().count_all("blood_2022").unwrap(), 1);
    assert_eq!(store.samples().unwrap_err().kind(), ErrorKind::UnknownTable);
}
