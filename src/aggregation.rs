// 🧮 Aggregator - roll validated records up into monthly metrics
//
// Current month, previous month and all-time totals for both collections,
// category breakdowns and active members for the current month, growth
// between the two months, and per-member balances over everything.

use crate::config::LedgerConfig;
use crate::error::{ensure_finite, MetricsResult};
use crate::growth::growth;
use crate::members::MemberLedger;
use crate::metrics::{
    AllTimeTotals, CategoryBreakdowns, DataQuality, GrowthSummary, MetricsMetadata,
    MonthlyMetrics, PeriodTotals,
};
use crate::money;
use crate::period::{MonthlyPartitioner, Period, PeriodSelection};
use crate::transaction::{RecordKind, Transaction};
use crate::validation::TransactionValidator;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;

// ============================================================================
// CATEGORY TOTAL
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryTotal {
    pub category: String,
    pub total: f64,
    pub count: usize,
    /// Percent of the period total
    pub share: f64,
    /// Whether the label is in the configured category list
    pub configured: bool,
}

/// Group by category in order of first appearance
///
/// Missing or blank categories fall under `config.default_category`.
pub fn category_breakdown(
    transactions: &[Transaction],
    config: &LedgerConfig,
) -> MetricsResult<Vec<CategoryTotal>> {
    let mut groups: Vec<CategoryTotal> = Vec::new();

    for tx in transactions {
        let label = tx.category_or(&config.default_category);
        match groups.iter_mut().find(|g| g.category == label) {
            Some(group) => {
                group.total = money::add(group.total, tx.amount());
                group.count += 1;
            }
            None => groups.push(CategoryTotal {
                category: label.to_string(),
                total: money::round_currency(tx.amount()),
                count: 1,
                share: 0.0,
                configured: config.is_configured_category(label),
            }),
        }
    }

    let period_total = money::sum(groups.iter().map(|g| g.total));
    for group in &mut groups {
        ensure_finite(&format!("category {}", group.category), group.total)?;
        group.share = money::safe_div(group.total * 100.0, period_total);
    }

    Ok(groups)
}

/// Payers and contributors appearing in the given transactions
pub fn active_members(transactions: &[Transaction]) -> BTreeSet<String> {
    transactions
        .iter()
        .map(|tx| tx.attributed_to().to_string())
        .collect()
}

// ============================================================================
// AGGREGATOR
// ============================================================================

pub struct Aggregator {
    config: LedgerConfig,
    validator: TransactionValidator,
    partitioner: MonthlyPartitioner,
    ledger: MemberLedger,
}

impl Aggregator {
    pub fn new(config: LedgerConfig) -> Self {
        Aggregator {
            config,
            validator: TransactionValidator::new(),
            partitioner: MonthlyPartitioner::new(),
            ledger: MemberLedger::new(),
        }
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Aggregate both collections relative to the month containing `reference`
    ///
    /// `active_members` is the raw count here; the facade applies the roster
    /// fallback when it is zero.
    pub fn aggregate(
        &self,
        expenses: &[Value],
        contributions: &[Value],
        reference: NaiveDate,
    ) -> MetricsResult<MonthlyMetrics> {
        let current = Period::containing(reference);
        let previous = current.previous()?;

        let valid_expenses = self.validator.valid_transactions(expenses, RecordKind::Expense);
        let valid_contributions = self
            .validator
            .valid_transactions(contributions, RecordKind::Contribution);

        let valid_records = valid_expenses.len() + valid_contributions.len();
        let rejected_records = expenses.len() + contributions.len() - valid_records;

        // The four period windows
        let current_expenses =
            self.partitioner
                .select_from_valid(valid_expenses.clone(), RecordKind::Expense, current)?;
        let previous_expenses =
            self.partitioner
                .select_from_valid(valid_expenses.clone(), RecordKind::Expense, previous)?;
        let current_contributions = self.partitioner.select_from_valid(
            valid_contributions.clone(),
            RecordKind::Contribution,
            current,
        )?;
        let previous_contributions = self.partitioner.select_from_valid(
            valid_contributions.clone(),
            RecordKind::Contribution,
            previous,
        )?;

        let current_month = period_totals(current, &current_expenses, &current_contributions);
        let previous_month = period_totals(previous, &previous_expenses, &previous_contributions);

        let all_time = self.all_time(&valid_expenses, &valid_contributions)?;

        let growth = GrowthSummary {
            expenses: growth(current_month.expenses, previous_month.expenses),
            contributions: growth(current_month.contributions, previous_month.contributions),
            net: growth(current_month.net, previous_month.net),
        };

        let categories = CategoryBreakdowns {
            expenses: category_breakdown(&current_expenses.transactions, &self.config)?,
            contributions: category_breakdown(&current_contributions.transactions, &self.config)?,
        };

        let mut current_transactions = current_expenses.transactions;
        current_transactions.extend(current_contributions.transactions);
        let active = active_members(&current_transactions);

        let mut everything = valid_expenses;
        everything.extend(valid_contributions);
        let member_balances = self.ledger.balances(&everything)?;

        let data_quality = if valid_records == 0 {
            DataQuality::Empty
        } else if rejected_records > 0 {
            DataQuality::Partial
        } else {
            DataQuality::Complete
        };

        Ok(MonthlyMetrics {
            current_month,
            previous_month,
            all_time,
            growth,
            categories,
            active_members: active.len(),
            member_balances,
            metadata: MetricsMetadata {
                has_data: valid_records > 0,
                data_quality,
                error: None,
                reference_date: reference,
                valid_records,
                rejected_records,
                active_members_fallback: false,
                input_fingerprint: String::new(),
            },
        })
    }

    /// Totals over the entire validated collections, no month filter
    fn all_time(
        &self,
        expenses: &[Transaction],
        contributions: &[Transaction],
    ) -> MetricsResult<AllTimeTotals> {
        let expense_total = ensure_finite(
            "all-time expense",
            money::sum(expenses.iter().map(Transaction::amount)),
        )?;
        let contribution_total = ensure_finite(
            "all-time contribution",
            money::sum(contributions.iter().map(Transaction::amount)),
        )?;

        Ok(AllTimeTotals {
            expenses: expense_total,
            contributions: contribution_total,
            net: money::sub(contribution_total, expense_total),
            expense_count: expenses.len(),
            contribution_count: contributions.len(),
        })
    }
}

impl Default for Aggregator {
    fn default() -> Self {
        Self::new(LedgerConfig::default())
    }
}

fn period_totals(
    period: Period,
    expenses: &PeriodSelection,
    contributions: &PeriodSelection,
) -> PeriodTotals {
    PeriodTotals {
        label: period.label(),
        month: period.month,
        year: period.year,
        expenses: expenses.total,
        contributions: contributions.total,
        net: money::sub(contributions.total, expenses.total),
        expense_count: expenses.metadata.record_count,
        contribution_count: contributions.metadata.record_count,
        has_data: expenses.has_data() || contributions.has_data(),
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::growth::Trend;
    use serde_json::json;

    fn reference() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 17).unwrap()
    }

    fn expense(amount: f64, date: &str, category: Option<&str>, paid_by: &str) -> Value {
        let mut record = json!({
            "amount": amount,
            "date": date,
            "paidBy": paid_by,
            "splitBetween": ["A", "B", "C"]
        });
        if let Some(category) = category {
            record["category"] = json!(category);
        }
        record
    }

    fn contribution(amount: f64, date: &str, by: &str) -> Value {
        json!({ "amount": amount, "date": date, "contributedBy": by })
    }

    #[test]
    fn test_aggregate_periods_and_all_time() {
        let aggregator = Aggregator::new(LedgerConfig::with_members(["A", "B", "C"]));
        let expenses = vec![
            expense(100.0, "2026-10-02", Some("Travel"), "A"),
            expense(50.0, "2026-09-15", Some("Travel"), "B"),
            expense(30.0, "2025-01-01", None, "C"),
            expense(-5.0, "2026-10-03", None, "A"),
        ];
        let contributions = vec![
            contribution(1000.0, "2026-10-01", "B"),
            contribution(400.0, "2026-08-01", "C"),
        ];

        let metrics = aggregator
            .aggregate(&expenses, &contributions, reference())
            .unwrap();

        assert_eq!(metrics.current_month.expenses, 100.0);
        assert_eq!(metrics.current_month.contributions, 1000.0);
        assert_eq!(metrics.current_month.net, 900.0);
        assert_eq!(metrics.current_month.label, "October 2026");
        assert_eq!(metrics.previous_month.expenses, 50.0);
        assert_eq!(metrics.previous_month.contributions, 0.0);
        assert_eq!(metrics.previous_month.label, "September 2026");

        assert_eq!(metrics.all_time.expenses, 180.0);
        assert_eq!(metrics.all_time.contributions, 1400.0);
        assert_eq!(metrics.all_time.net, 1220.0);
        assert_eq!(metrics.all_time.expense_count, 3);

        assert_eq!(metrics.growth.expenses.percentage, "+100.0%");
        assert_eq!(metrics.growth.contributions.percentage, "+100%");
        assert_eq!(metrics.growth.expenses.trend, Trend::Positive);

        assert_eq!(metrics.metadata.valid_records, 5);
        assert_eq!(metrics.metadata.rejected_records, 1);
        assert_eq!(metrics.metadata.data_quality, DataQuality::Partial);
        assert!(metrics.metadata.has_data);
    }

    #[test]
    fn test_category_breakdown_first_appearance_order() {
        let config = LedgerConfig::default();
        let validator = TransactionValidator::new();
        let records = vec![
            expense(10.0, "2026-10-01", Some("Software"), "A"),
            expense(30.0, "2026-10-02", None, "A"),
            expense(20.0, "2026-10-03", Some("Software"), "B"),
            expense(40.0, "2026-10-04", Some("Yacht"), "B"),
        ];
        let transactions = validator.valid_transactions(&records, RecordKind::Expense);

        let breakdown = category_breakdown(&transactions, &config).unwrap();

        let labels: Vec<&str> = breakdown.iter().map(|c| c.category.as_str()).collect();
        assert_eq!(labels, vec!["Software", "Uncategorized", "Yacht"]);

        assert_eq!(breakdown[0].total, 30.0);
        assert_eq!(breakdown[0].count, 2);
        assert_eq!(breakdown[0].share, 30.0);
        assert!(breakdown[0].configured);
        assert!(!breakdown[2].configured);
    }

    #[test]
    fn test_category_breakdown_only_current_month() {
        let aggregator = Aggregator::default();
        let expenses = vec![
            expense(10.0, "2026-10-01", Some("Office"), "A"),
            expense(99.0, "2026-09-01", Some("Travel"), "A"),
        ];

        let metrics = aggregator.aggregate(&expenses, &[], reference()).unwrap();

        assert_eq!(metrics.categories.expenses.len(), 1);
        assert_eq!(metrics.categories.expenses[0].category, "Office");
        assert!(metrics.categories.contributions.is_empty());
    }

    #[test]
    fn test_active_members_union_of_payers_and_contributors() {
        let aggregator = Aggregator::default();
        let expenses = vec![
            expense(10.0, "2026-10-01", None, "A"),
            expense(10.0, "2026-10-02", None, "A"),
            expense(10.0, "2026-09-02", None, "Z"),
        ];
        let contributions = vec![contribution(5.0, "2026-10-05", "D")];

        let metrics = aggregator
            .aggregate(&expenses, &contributions, reference())
            .unwrap();

        // Split participants B and C do not count, last month's payer Z neither
        assert_eq!(metrics.active_members, 2);
    }

    #[test]
    fn test_member_balances_cover_all_time() {
        let aggregator = Aggregator::default();
        let expenses = vec![
            expense(1500.0, "2026-10-02", None, "A"),
            expense(300.0, "2024-05-02", None, "B"),
        ];

        let metrics = aggregator.aggregate(&expenses, &[], reference()).unwrap();

        assert_eq!(metrics.member_balances.get("A").unwrap().owes, 600.0);
        assert_eq!(metrics.member_balances.get("B").unwrap().paid, 300.0);
    }

    #[test]
    fn test_year_boundary_previous_month() {
        let aggregator = Aggregator::default();
        let expenses = vec![expense(75.0, "2025-12-31", None, "A")];
        let january = NaiveDate::from_ymd_opt(2026, 1, 10).unwrap();

        let metrics = aggregator.aggregate(&expenses, &[], january).unwrap();

        assert_eq!(metrics.previous_month.label, "December 2025");
        assert_eq!(metrics.previous_month.expenses, 75.0);
        assert_eq!(metrics.current_month.expenses, 0.0);
        assert!(!metrics.current_month.has_data);
    }

    #[test]
    fn test_empty_input_is_empty_quality() {
        let aggregator = Aggregator::default();
        let metrics = aggregator.aggregate(&[], &[], reference()).unwrap();

        assert!(!metrics.metadata.has_data);
        assert_eq!(metrics.metadata.data_quality, DataQuality::Empty);
        assert_eq!(metrics.active_members, 0);
    }
}
