use crate::BloodSample;
use labstore::chrono::NaiveDate;
use labstore::{
    real_cell, AppError, ColumnDef, Delete, Record, Select, Storage, StoreSettings, TableDef, Value, DATE_KEY_FORMAT,
};
use labstore::logger;
use log::{debug, info};
use std::path::Path;

/// Free text labels per sample day, stored as one encoded list.
pub const LABEL_TABLE: &str = "blood_labels";

fn date_text(date: NaiveDate) -> String {
    date.format(DATE_KEY_FORMAT).to_string()
}

/// The blood sample store behind the desktop front end.
#[derive(Clone)]
pub struct BloodStore {
    storage: Storage,
}

impl BloodStore {
    pub fn open(dir: impl AsRef<Path>, name: &str) -> Result<Self, AppError> {
        Ok(Self { storage: Storage::open(dir, name)? })
    }

    /// Opens the configured store and installs the console logger at the configured level,
    /// unless the application already set up its own.
    pub fn from_settings(settings: &StoreSettings) -> Result<Self, AppError> {
        if logger::init_with(&settings.log_level).is_err() {
            debug!("Logger already installed, keeping it");
        }
        Ok(Self { storage: Storage::from_settings(settings)? })
    }

    pub fn temp(name: &str) -> Result<Self, AppError> {
        Ok(Self { storage: Storage::temp(name)? })
    }

    /// Generic table operations on the same file.
    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    /// Creates the `blood` and label tables when missing. Returns whether `blood` was created.
    pub fn create_blood_table(&self) -> Result<bool, AppError> {
        let created = self.storage.create_table(&BloodSample::table_def())?;
        let labels = TableDef::new(LABEL_TABLE)
            .column(ColumnDef::text(BloodSample::KEY).unique().not_null())
            .column(ColumnDef::encoded("labels"));
        self.storage.create_table(&labels)?;
        if created {
            info!("Blood tables ready in {:?}", self.storage.path());
        }
        Ok(created)
    }

    /// `Ok(false)` when a sample for the same day is already stored.
    pub fn add_sample(&self, sample: &BloodSample) -> Result<bool, AppError> {
        self.storage.add_record(sample)
    }

    /// All samples ordered by date.
    pub fn samples(&self) -> Result<Vec<BloodSample>, AppError> {
        let rows = self.storage.get_all_rows(BloodSample::TABLE)?;
        let mut samples = rows.iter().map(BloodSample::from_row).collect::<Result<Vec<_>, _>>()?;
        samples.sort_by_key(|sample| sample.date);
        Ok(samples)
    }

    pub fn sample_on(&self, date: NaiveDate) -> Result<Option<BloodSample>, AppError> {
        let rows = self.storage.get_rows_matching(BloodSample::TABLE, BloodSample::KEY, date_text(date))?;
        rows.first_row().map(BloodSample::from_row).transpose()
    }

    /// Dated values of one measurement ordered by date, absent values included.
    pub fn series(&self, column: &str) -> Result<Vec<(NaiveDate, Option<f64>)>, AppError> {
        if BloodSample::unit_of(column).is_none() {
            return Err(AppError::UnknownColumn {
                table: BloodSample::TABLE.to_string(),
                name: column.to_string(),
                available: BloodSample::UNITS.iter().map(|(name, _)| name.to_string()).collect(),
            });
        }
        let rows = self.storage.select(&Select::from(BloodSample::TABLE).column(BloodSample::KEY).column(column))?;
        let mut series = rows
            .iter()
            .map(|row| match &row[0] {
                Value::Text(text) => Ok((labstore::parse_date_key(BloodSample::KEY, text)?, real_cell(column, &row[1])?)),
                other => Err(AppError::TypeMismatch { column: BloodSample::KEY.to_string(), message: format!("expected a date, found {}", other.type_name()) }),
            })
            .collect::<Result<Vec<_>, AppError>>()?;
        series.sort_by_key(|(date, _)| *date);
        Ok(series)
    }

    /// Removes the sample of `date` and its labels in one transaction.
    pub fn delete_sample(&self, date: NaiveDate) -> Result<bool, AppError> {
        let key = date_text(date);
        let deleted = self.storage.delete_batch(&[
            Delete::from(BloodSample::TABLE).where_eq(BloodSample::KEY, key.as_str()),
            Delete::from(LABEL_TABLE).where_eq(BloodSample::KEY, key.as_str()),
        ])?;
        Ok(deleted[0] > 0)
    }

    /// Replaces the labels of `date`.
    pub fn label_sample(&self, date: NaiveDate, labels: &[&str]) -> Result<(), AppError> {
        let key = date_text(date);
        let list = Value::List(labels.iter().map(|label| Value::from(*label)).collect());
        if self.storage.update_where(LABEL_TABLE, BloodSample::KEY, key.as_str(), "labels", list.clone())? == 0 {
            self.storage.insert_row(LABEL_TABLE, &[(BloodSample::KEY, Value::Text(key)), ("labels", list)])?;
        }
        Ok(())
    }

    pub fn labels_for(&self, date: NaiveDate) -> Result<Vec<String>, AppError> {
        let rows = self.storage.select(&Select::from(LABEL_TABLE).column("labels").where_eq(BloodSample::KEY, date_text(date)))?;
        let labels = match rows.first_cell() {
            Some(Value::List(items)) => items.iter().filter_map(|item| item.as_text().map(str::to_string)).collect(),
            _ => Vec::new(),
        };
        Ok(labels)
    }
}
