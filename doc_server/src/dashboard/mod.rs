//! Dashboard aggregates over the job store.

pub mod kpi;
