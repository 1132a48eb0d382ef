//! Micrograph metadata held by the explorer
//!
//! Loaded once at startup and shared read-only by every session. Only
//! micrographs labelled with one of the fixed classes are plotted.

use sqlx::SqlitePool;
use tracing::info;
use uhcsdb_common::db::{queries, MicrographInfo, MICROSTRUCTURE_CLASSES};
use uhcsdb_common::{Result, SENTINEL};

use crate::controls::NumericField;

/// One plotted micrograph; missing numbers are [`SENTINEL`]
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub id: i64,
    pub mstructure_class: String,
    pub thumb: String,
    pub anneal_temperature: f64,
    /// Minutes
    pub anneal_time: f64,
    /// Microns per pixel
    pub scale: f64,
}

impl Record {
    fn from_entry(entry: MicrographInfo) -> Option<Self> {
        let scale = entry.microns_per_px().unwrap_or(SENTINEL);
        Some(Self {
            id: entry.id,
            thumb: format!("/{}", entry.thumbnail()),
            anneal_temperature: entry.anneal_temperature.unwrap_or(SENTINEL),
            anneal_time: entry.anneal_time.unwrap_or(SENTINEL),
            scale,
            mstructure_class: entry.mstructure_class?,
        })
    }

    /// Value of `field`, or [`SENTINEL`] when missing
    pub fn value(&self, field: NumericField) -> f64 {
        match field {
            NumericField::AnnealTemperature => self.anneal_temperature,
            NumericField::AnnealTime => self.anneal_time,
            NumericField::LogScale if self.scale > 0.0 => self.scale.ln(),
            NumericField::LogScale => SENTINEL,
        }
    }
}

/// All plotted micrographs, ordered by id
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    records: Vec<Record>,
}

impl Dataset {
    /// Read every classified micrograph from the store
    pub async fn load(pool: &SqlitePool) -> Result<Self> {
        let entries = queries::micrographs_with_classes(pool, &MICROSTRUCTURE_CLASSES).await?;
        let dataset = Self::from_entries(entries);
        info!("Loaded {} classified micrographs", dataset.len());
        Ok(dataset)
    }

    /// Build from store records; unclassified entries are skipped
    pub fn from_entries(entries: impl IntoIterator<Item = MicrographInfo>) -> Self {
        let mut records: Vec<Record> = entries.into_iter().filter_map(Record::from_entry).collect();
        records.sort_by_key(|r| r.id);
        Self { records }
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn ids(&self) -> Vec<i64> {
        self.records.iter().map(|r| r.id).collect()
    }

    pub fn values(&self, field: NumericField) -> Vec<f64> {
        self.records.iter().map(|r| r.value(field)).collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
