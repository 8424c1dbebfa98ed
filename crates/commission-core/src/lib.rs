pub mod batch;
pub mod bonus;
pub mod coverage;
pub mod error;
pub mod financial;
pub mod kpi;
pub mod policy;
pub mod schedule;
pub mod selection;
pub mod types;

#[cfg(feature = "reporting")]
pub mod reporting;

pub use batch::{process, process_batch, CommissionBatch, CommissionBatchInput, KpiSource};
pub use coverage::resolve_coverage_factor;
pub use error::CommissionError;
pub use financial::resolve_financial_factor;
pub use kpi::CoverageKpis;
pub use policy::CompensationPolicy;
pub use schedule::resolve_payment_date;
pub use types::*;

/// Standard result type for all commission operations
pub type CommissionResult<T> = Result<T, CommissionError>;
