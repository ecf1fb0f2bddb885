use std::sync::Arc;

use tracing::{info, warn};

use cafetal_core::{AnalysisPayload, AssistantError, Dataset, Record, RecordStore};

/// Most recent rows per dataset included in an analysis.
pub const ANALYSIS_WINDOW: usize = 50;

/// Assembles the analysis payload from the four ledgers.
pub struct RecordAggregator {
    store: Arc<dyn RecordStore>,
    window: usize,
}

impl RecordAggregator {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self {
            store,
            window: ANALYSIS_WINDOW,
        }
    }

    /// Fetch every dataset and keep its latest rows. One failed fetch fails
    /// the whole payload; the model never sees a partial snapshot.
    pub async fn build_analysis_payload(&self) -> Result<AnalysisPayload, AssistantError> {
        let mut payload = AnalysisPayload::default();

        for dataset in Dataset::ALL {
            let records = self.store.get_all_records(dataset).await.map_err(|e| {
                warn!(dataset = %dataset, error = %e, "Ledger fetch failed");
                AssistantError::DataUnavailable {
                    dataset,
                    message: format!("{e:#}"),
                }
            })?;
            payload.set(dataset, latest(records, self.window));
        }

        info!(records = payload.total_records(), "Analysis payload built");
        Ok(payload)
    }
}

/// Keep the last `window` rows, in file order.
fn latest(mut records: Vec<Record>, window: usize) -> Vec<Record> {
    if records.len() > window {
        records.drain(..records.len() - window);
    }
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryRecordStore;
    use serde_json::json;

    fn rows(n: usize) -> Vec<Record> {
        (0..n)
            .map(|i| {
                let mut r = Record::new();
                r.insert("n".into(), json!(i));
                r
            })
            .collect()
    }

    fn ids(records: &[Record]) -> Vec<u64> {
        records.iter().map(|r| r["n"].as_u64().unwrap()).collect()
    }

    #[tokio::test]
    async fn keeps_last_fifty_in_order() {
        let store = MemoryRecordStore::new()
            .with_records(Dataset::Compras, rows(120))
            .with_records(Dataset::Ventas, rows(10));
        let aggregator = RecordAggregator::new(Arc::new(store));

        let payload = aggregator.build_analysis_payload().await.unwrap();

        assert_eq!(ids(&payload.compras), (70..120).collect::<Vec<_>>());
        assert_eq!(ids(&payload.ventas), (0..10).collect::<Vec<_>>());
        assert!(payload.procesos.is_empty());
        assert!(payload.gastos.is_empty());
    }

    #[tokio::test]
    async fn exactly_fifty_is_untouched() {
        let store = MemoryRecordStore::new().with_records(Dataset::Gastos, rows(50));
        let payload = RecordAggregator::new(Arc::new(store))
            .build_analysis_payload()
            .await
            .unwrap();
        assert_eq!(payload.gastos.len(), 50);
        assert_eq!(ids(&payload.gastos)[0], 0);
    }

    #[tokio::test]
    async fn one_failed_dataset_fails_everything() {
        let store = MemoryRecordStore::new()
            .with_records(Dataset::Compras, rows(5))
            .failing_on(Dataset::Ventas);
        let err = RecordAggregator::new(Arc::new(store))
            .build_analysis_payload()
            .await
            .unwrap_err();

        match err {
            AssistantError::DataUnavailable { dataset, message } => {
                assert_eq!(dataset, Dataset::Ventas);
                assert!(message.contains("unreachable"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
