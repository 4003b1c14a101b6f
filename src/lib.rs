// Ledger Metrics - Core Library
// Shared-expense ledger aggregation: validation, monthly partitioning,
// totals, growth and member balances for the reporting layer.

pub mod money;
pub mod error;
pub mod config;
pub mod transaction;
pub mod validation;    // Transaction Validator
pub mod period;        // Monthly Partitioner
pub mod aggregation;   // Aggregator
pub mod growth;        // Growth Calculator
pub mod members;       // Member Ledger
pub mod metrics;       // Metrics Facade
pub mod store;

// Re-export commonly used types
pub use error::{MetricsError, MetricsResult, ValidationError};
pub use config::{LedgerConfig, DEFAULT_CATEGORY, DEFAULT_MEMBERS};
pub use transaction::{Contribution, Expense, RecordKind, Transaction};
pub use validation::{parse_date_str, BatchSummary, TransactionValidator, ValidationReport};
pub use period::{MonthlyPartitioner, Period, PeriodMetadata, PeriodSelection};
pub use aggregation::{active_members, category_breakdown, Aggregator, CategoryTotal};
pub use growth::{growth, Growth, Trend};
pub use members::{MemberBalance, MemberBalances, MemberLedger};
pub use metrics::{
    compute_metrics, input_fingerprint, AllTimeTotals, CategoryBreakdowns, DataQuality,
    GrowthSummary, MetricsEngine, MetricsMetadata, MonthlyMetrics, PeriodTotals,
};
pub use store::{load_csv, load_json, load_records, FileLedger, InMemoryLedger, LedgerSource};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
