//! Business ledgers (purchases, processing, sales, expenses) and the bounded
//! snapshot of them that the assistant sends for analysis.

pub mod aggregator;
pub mod csv_store;
pub mod memory_store;

pub use aggregator::{RecordAggregator, ANALYSIS_WINDOW};
pub use csv_store::{parse_records, CsvRecordStore};
pub use memory_store::MemoryRecordStore;
