//! Storage layer for exported records.

pub mod csv;

// Re-export key types
pub use self::csv::CsvExporter;
