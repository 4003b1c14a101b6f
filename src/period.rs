// 📅 Monthly Partitioner - pick the records of one calendar month
//
// Whole-month windows in local calendar terms: a record belongs to a period
// when its normalized date has the same year and month. No timezone math.

use crate::error::{ensure_finite, MetricsError, MetricsResult};
use crate::money;
use crate::transaction::{RecordKind, Transaction};
use crate::validation::{parse_date_str, TransactionValidator};
use chrono::{Datelike, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

// ============================================================================
// PERIOD
// ============================================================================

/// A calendar month
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Period {
    pub year: i32,
    /// 1-12
    pub month: u32,
}

impl Period {
    pub fn containing(date: NaiveDate) -> Self {
        Period {
            year: date.year(),
            month: date.month(),
        }
    }

    /// Month of today's local date
    pub fn current() -> Self {
        Self::containing(Local::now().date_naive())
    }

    /// Month of the given reference date, or the current month when the
    /// reference cannot be parsed
    pub fn parse_or_current(reference: &str) -> Self {
        match parse_date_str(reference) {
            Some(date) => Self::containing(date),
            None => {
                debug!(reference, "unparseable reference date, using current month");
                Self::current()
            }
        }
    }

    /// The calendar month before this one
    pub fn previous(&self) -> MetricsResult<Period> {
        let previous = if self.month == 1 {
            Period {
                year: self
                    .year
                    .checked_sub(1)
                    .ok_or(MetricsError::PeriodOutOfRange {
                        year: self.year,
                        month: self.month,
                    })?,
                month: 12,
            }
        } else {
            Period {
                year: self.year,
                month: self.month - 1,
            }
        };

        // Reject months chrono cannot represent
        previous.first_day()?;
        Ok(previous)
    }

    pub fn first_day(&self) -> MetricsResult<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).ok_or(MetricsError::PeriodOutOfRange {
            year: self.year,
            month: self.month,
        })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }

    /// Human-readable label, e.g. "October 2026"
    pub fn label(&self) -> String {
        let name = MONTH_NAMES
            .get(self.month.saturating_sub(1) as usize)
            .copied()
            .unwrap_or("Unknown");
        format!("{} {}", name, self.year)
    }
}

impl std::fmt::Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{:02}", self.year, self.month)
    }
}

// ============================================================================
// PERIOD SELECTION
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodMetadata {
    pub month: u32,
    pub year: i32,
    pub label: String,
    /// At least one record survived validation and the month filter
    pub has_data: bool,
    pub record_count: usize,
    /// Records dropped by validation (from the whole input, not just this month)
    pub rejected_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodSelection {
    /// Rounded, finite, never negative
    pub total: f64,
    pub transactions: Vec<Transaction>,
    pub metadata: PeriodMetadata,
}

impl PeriodSelection {
    pub fn has_data(&self) -> bool {
        self.metadata.has_data
    }
}

// ============================================================================
// PARTITIONER
// ============================================================================

pub struct MonthlyPartitioner {
    validator: TransactionValidator,
}

impl MonthlyPartitioner {
    pub fn new() -> Self {
        MonthlyPartitioner {
            validator: TransactionValidator::new(),
        }
    }

    /// Validate raw records and keep those in `period`
    pub fn select_period(
        &self,
        records: &[Value],
        kind: RecordKind,
        period: Period,
    ) -> MetricsResult<PeriodSelection> {
        let valid = self.validator.valid_transactions(records, kind);
        let rejected_count = records.len() - valid.len();

        let mut selection = self.select_from_valid(valid, kind, period)?;
        selection.metadata.rejected_count = rejected_count;
        Ok(selection)
    }

    /// Same as `select_period`, with the reference given as a date string
    pub fn select_period_for(
        &self,
        records: &[Value],
        kind: RecordKind,
        reference: &str,
    ) -> MetricsResult<PeriodSelection> {
        self.select_period(records, kind, Period::parse_or_current(reference))
    }

    /// Filter already-validated transactions to `period` and total them
    pub fn select_from_valid(
        &self,
        transactions: Vec<Transaction>,
        kind: RecordKind,
        period: Period,
    ) -> MetricsResult<PeriodSelection> {
        let transactions: Vec<Transaction> = transactions
            .into_iter()
            .filter(|tx| period.contains(tx.date()))
            .collect();

        let total = money::sum(transactions.iter().map(Transaction::amount));
        let total = ensure_finite(kind.name(), total)?;

        debug!(
            kind = kind.name(),
            period = %period,
            count = transactions.len(),
            total,
            "selected period"
        );

        Ok(PeriodSelection {
            total,
            metadata: PeriodMetadata {
                month: period.month,
                year: period.year,
                label: period.label(),
                has_data: !transactions.is_empty(),
                record_count: transactions.len(),
                rejected_count: 0,
            },
            transactions,
        })
    }
}

impl Default for MonthlyPartitioner {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn expense(amount: f64, date: &str) -> Value {
        json!({
            "amount": amount,
            "date": date,
            "paidBy": "A",
            "splitBetween": ["A", "B"]
        })
    }

    fn october() -> Period {
        Period { year: 2026, month: 10 }
    }

    #[test]
    fn test_previous_wraps_year() {
        let january = Period { year: 2026, month: 1 };
        assert_eq!(january.previous(), Ok(Period { year: 2025, month: 12 }));
        assert_eq!(october().previous(), Ok(Period { year: 2026, month: 9 }));
    }

    #[test]
    fn test_label_and_display() {
        assert_eq!(october().label(), "October 2026");
        assert_eq!(Period { year: 2026, month: 3 }.to_string(), "2026-03");
    }

    #[test]
    fn test_parse_or_current() {
        assert_eq!(Period::parse_or_current("2026-10-17"), october());

        let before = Period::current();
        let fallback = Period::parse_or_current("garbage");
        let after = Period::current();
        assert!(fallback == before || fallback == after);
        assert!((1..=12).contains(&fallback.month));
    }

    #[test]
    fn test_select_period_filters_month_and_validity() {
        let partitioner = MonthlyPartitioner::new();
        let records = vec![
            expense(100.0, "2026-10-01"),
            expense(50.25, "2026-10-31"),
            expense(999.0, "2026-09-30"),
            expense(999.0, "2025-10-15"),
            expense(-10.0, "2026-10-10"),
            json!({"amount": 20, "date": "not-a-date", "paidBy": "A", "splitBetween": ["A"]}),
        ];

        let selection = partitioner
            .select_period(&records, RecordKind::Expense, october())
            .unwrap();

        assert_eq!(selection.total, 150.25);
        assert_eq!(selection.transactions.len(), 2);
        assert!(selection.has_data());
        assert_eq!(selection.metadata.record_count, 2);
        assert_eq!(selection.metadata.rejected_count, 2);
        assert_eq!(selection.metadata.label, "October 2026");
    }

    #[test]
    fn test_empty_period_is_zero_without_data() {
        let partitioner = MonthlyPartitioner::new();
        let records = vec![expense(100.0, "2026-09-01")];

        let selection = partitioner
            .select_period(&records, RecordKind::Expense, october())
            .unwrap();

        assert_eq!(selection.total, 0.0);
        assert!(!selection.has_data());
        assert_eq!(selection.metadata.month, 10);
        assert_eq!(selection.metadata.year, 2026);
    }

    #[test]
    fn test_select_period_for_reference_string() {
        let partitioner = MonthlyPartitioner::new();
        let records = vec![expense(12.5, "2026-10-09")];

        let selection = partitioner
            .select_period_for(&records, RecordKind::Expense, "10/20/2026")
            .unwrap();

        assert_eq!(selection.total, 12.5);
    }

    #[test]
    fn test_overflowing_total_is_an_error() {
        let partitioner = MonthlyPartitioner::new();
        // Each amount is representable in cents, their sum is not
        let records = vec![expense(1.5e306, "2026-10-01"), expense(1.5e306, "2026-10-02")];

        let result = partitioner.select_period(&records, RecordKind::Expense, october());

        assert!(matches!(result, Err(MetricsError::NonFiniteTotal { .. })));
    }
}
