// Adapters behind the app ports

pub mod csv_table_adapter;
pub mod in_memory_table_adapter;

pub use csv_table_adapter::{CsvTableSink, CsvTableSource};
pub use in_memory_table_adapter::{InMemoryTableSink, InMemoryTableSource};
