//! Export of chain output for external plotting and reporting.

#[cfg(feature = "csv")]
pub mod csv;
