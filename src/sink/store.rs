//! Day-partitioned result log
//!
//! One JSON array file per calendar day. Appends are read-modify-write over
//! the whole day's array: simple and greppable, but a crash between read
//! and write loses the tail of the day. Known limitation; an append-only
//! record format would change the on-disk layout consumers already read.

use super::Delivery;
use crate::error::Result;
use crate::outcome::{OutcomeRecord, RoundOutcome};
use chrono::NaiveDate;
use std::path::{Path, PathBuf};

pub struct DayFileStore {
    data_dir: PathBuf,
}

impl DayFileStore {
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        Self {
            data_dir: data_dir.as_ref().to_path_buf(),
        }
    }

    pub fn day_file(&self, date: NaiveDate) -> PathBuf {
        self.data_dir
            .join(format!("results_{}.json", date.format("%Y%m%d")))
    }

    pub async fn deliver(&self, outcome: &RoundOutcome) -> Delivery {
        match self.append(outcome).await {
            Ok(total) => {
                tracing::debug!("Persisted result, {} records today", total);
                Delivery::Delivered
            }
            Err(e) => Delivery::Failed(e.to_string()),
        }
    }

    /// Append one outcome to its day file, returning the day's new total.
    pub async fn append(&self, outcome: &RoundOutcome) -> Result<usize> {
        let path = self.day_file(outcome.timestamp.date_naive());
        let mut records = self.read_records(&path).await?;
        records.push(outcome.to_record());

        tokio::fs::create_dir_all(&self.data_dir).await?;
        tokio::fs::write(&path, serde_json::to_string_pretty(&records)?).await?;
        Ok(records.len())
    }

    /// Load one day's records; absent file reads as empty.
    pub async fn load_day(&self, date: NaiveDate) -> Result<Vec<OutcomeRecord>> {
        self.read_records(&self.day_file(date)).await
    }

    async fn read_records(&self, path: &Path) -> Result<Vec<OutcomeRecord>> {
        match tokio::fs::read_to_string(path).await {
            Ok(raw) => Ok(serde_json::from_str(&raw)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }
}
