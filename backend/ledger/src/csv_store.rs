use std::io::ErrorKind;
use std::path::PathBuf;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::{Number, Value};
use tracing::debug;

use cafetal_core::{Dataset, Record, RecordStore};

/// Ledgers kept as one CSV file per dataset inside a data directory.
///
/// The header row names the columns; rows are returned in file order.
pub struct CsvRecordStore {
    data_dir: PathBuf,
}

impl CsvRecordStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn path_for(&self, dataset: Dataset) -> PathBuf {
        self.data_dir.join(dataset.file_name())
    }
}

#[async_trait]
impl RecordStore for CsvRecordStore {
    async fn get_all_records(&self, dataset: Dataset) -> Result<Vec<Record>> {
        let path = self.path_for(dataset);

        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(dataset = %dataset, path = %path.display(), "Ledger file not found, treating as empty");
                return Ok(Vec::new());
            }
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read {}", path.display()));
            }
        };

        let records = parse_records(&bytes)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        debug!(dataset = %dataset, rows = records.len(), "Loaded ledger");
        Ok(records)
    }
}

/// Parse CSV bytes into records keyed by header. Blank rows are skipped.
pub fn parse_records(bytes: &[u8]) -> Result<Vec<Record>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(bytes);

    let headers = reader.headers()?.clone();
    let mut records = Vec::new();

    for row in reader.records() {
        let row = row?;
        if row.iter().all(str::is_empty) {
            continue;
        }
        let record: Record = headers
            .iter()
            .enumerate()
            .map(|(i, header)| (header.to_string(), cell_value(row.get(i).unwrap_or(""))))
            .collect();
        records.push(record);
    }

    Ok(records)
}

/// Numeric-looking cells become JSON numbers, everything else stays text.
fn cell_value(cell: &str) -> Value {
    if let Ok(n) = cell.parse::<i64>() {
        return Value::Number(n.into());
    }
    cell.parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
        .unwrap_or_else(|| Value::String(cell.to_string()))
}
