pub mod analysis;
pub mod charts;
pub mod dataset;
pub mod i18n;
pub mod ingest;
pub mod report;
pub mod session;
