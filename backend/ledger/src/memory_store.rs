use std::collections::{HashMap, HashSet};

use anyhow::Result;
use async_trait::async_trait;

use cafetal_core::{Dataset, Record, RecordStore};

/// In-memory ledgers, for tests and dry runs.
#[derive(Default)]
pub struct MemoryRecordStore {
    datasets: HashMap<Dataset, Vec<Record>>,
    failing: HashSet<Dataset>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(mut self, dataset: Dataset, records: Vec<Record>) -> Self {
        self.datasets.insert(dataset, records);
        self
    }

    /// Fetching this dataset fails.
    pub fn failing_on(mut self, dataset: Dataset) -> Self {
        self.failing.insert(dataset);
        self
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn get_all_records(&self, dataset: Dataset) -> Result<Vec<Record>> {
        if self.failing.contains(&dataset) {
            anyhow::bail!("ledger {} is unreachable", dataset);
        }
        Ok(self.datasets.get(&dataset).cloned().unwrap_or_default())
    }
}
