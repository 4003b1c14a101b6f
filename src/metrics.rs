// 📊 Metrics Facade - the single entry point for dashboards and reports
//
// computeMetrics(expenses, contributions) → MonthlyMetrics
//
// Pure and idempotent: the same inputs and reference date always produce the
// same output, byte for byte. Nothing escapes this boundary as an error; an
// engine failure degrades to zeroed metrics flagged `hasData: false` with the
// reason in `metadata.error`.

use crate::aggregation::{Aggregator, CategoryTotal};
use crate::config::LedgerConfig;
use crate::error::{MetricsError, MetricsResult};
use crate::growth::Growth;
use crate::members::MemberBalances;
use crate::period::Period;
use crate::store::LedgerSource;
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

// ============================================================================
// OUTPUT TYPES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DataQuality {
    /// Every record validated
    Complete,
    /// Some records were rejected and left out
    Partial,
    /// No valid records at all
    Empty,
    /// The computation itself failed; figures are placeholders
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodTotals {
    pub label: String,
    pub month: u32,
    pub year: i32,
    pub expenses: f64,
    pub contributions: f64,
    /// contributions - expenses
    pub net: f64,
    pub expense_count: usize,
    pub contribution_count: usize,
    pub has_data: bool,
}

impl PeriodTotals {
    pub fn empty(period: Period) -> Self {
        PeriodTotals {
            label: period.label(),
            month: period.month,
            year: period.year,
            expenses: 0.0,
            contributions: 0.0,
            net: 0.0,
            expense_count: 0,
            contribution_count: 0,
            has_data: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllTimeTotals {
    pub expenses: f64,
    pub contributions: f64,
    pub net: f64,
    pub expense_count: usize,
    pub contribution_count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrowthSummary {
    pub expenses: Growth,
    pub contributions: Growth,
    pub net: Growth,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryBreakdowns {
    pub expenses: Vec<CategoryTotal>,
    pub contributions: Vec<CategoryTotal>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsMetadata {
    /// At least one valid record in either collection
    pub has_data: bool,
    pub data_quality: DataQuality,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub reference_date: NaiveDate,
    pub valid_records: usize,
    pub rejected_records: usize,
    /// `activeMembers` is the roster size because nobody was active
    pub active_members_fallback: bool,
    /// SHA-256 over both input collections, usable as a memoization key
    pub input_fingerprint: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyMetrics {
    pub current_month: PeriodTotals,
    pub previous_month: PeriodTotals,
    pub all_time: AllTimeTotals,
    pub growth: GrowthSummary,
    pub categories: CategoryBreakdowns,
    pub active_members: usize,
    pub member_balances: MemberBalances,
    pub metadata: MetricsMetadata,
}

impl MonthlyMetrics {
    /// All-zero metrics for a failed computation
    pub fn failed(reference: NaiveDate, error: &MetricsError, roster_size: usize) -> Self {
        let current = Period::containing(reference);
        let previous = current.previous().unwrap_or(current);

        MonthlyMetrics {
            current_month: PeriodTotals::empty(current),
            previous_month: PeriodTotals::empty(previous),
            all_time: AllTimeTotals::default(),
            growth: GrowthSummary::default(),
            categories: CategoryBreakdowns::default(),
            active_members: roster_size,
            member_balances: MemberBalances::default(),
            metadata: MetricsMetadata {
                has_data: false,
                data_quality: DataQuality::Failed,
                error: Some(error.to_string()),
                reference_date: reference,
                valid_records: 0,
                rejected_records: 0,
                active_members_fallback: true,
                input_fingerprint: String::new(),
            },
        }
    }

    pub fn has_data(&self) -> bool {
        self.metadata.has_data
    }

    pub fn summary(&self) -> String {
        format!(
            "{}: expenses ${:.2} ({}), contributions ${:.2} ({}), {} active members, quality {:?}",
            self.current_month.label,
            self.current_month.expenses,
            self.growth.expenses.percentage,
            self.current_month.contributions,
            self.growth.contributions.percentage,
            self.active_members,
            self.metadata.data_quality
        )
    }
}

// ============================================================================
// METRICS ENGINE
// ============================================================================

pub struct MetricsEngine {
    aggregator: Aggregator,
}

impl MetricsEngine {
    pub fn new(config: LedgerConfig) -> Self {
        MetricsEngine {
            aggregator: Aggregator::new(config),
        }
    }

    pub fn config(&self) -> &LedgerConfig {
        self.aggregator.config()
    }

    /// Metrics for the month containing `reference`
    pub fn compute(
        &self,
        expenses: &[Value],
        contributions: &[Value],
        reference: NaiveDate,
    ) -> MonthlyMetrics {
        let fingerprint = input_fingerprint(expenses, contributions);
        self.finish(
            self.aggregator.aggregate(expenses, contributions, reference),
            reference,
            fingerprint,
        )
    }

    /// Metrics for the current local month
    pub fn compute_now(&self, expenses: &[Value], contributions: &[Value]) -> MonthlyMetrics {
        self.compute(expenses, contributions, Local::now().date_naive())
    }

    /// Metrics from collections of unknown shape (e.g. a parsed JSON body)
    ///
    /// Anything other than an array degrades to failed metrics.
    pub fn compute_from_json(
        &self,
        expenses: &Value,
        contributions: &Value,
        reference: NaiveDate,
    ) -> MonthlyMetrics {
        let collections = as_collection("expenses", expenses)
            .and_then(|e| as_collection("contributions", contributions).map(|c| (e, c)));

        match collections {
            Ok((expenses, contributions)) => self.compute(expenses, contributions, reference),
            Err(err) => self.finish(Err(err), reference, String::new()),
        }
    }

    /// Metrics over whatever the persistence collaborator currently holds
    pub fn compute_from_source(
        &self,
        source: &dyn LedgerSource,
        reference: NaiveDate,
    ) -> MonthlyMetrics {
        let expenses = source.expenses();
        let contributions = source.contributions();
        self.compute(&expenses, &contributions, reference)
    }

    fn finish(
        &self,
        result: MetricsResult<MonthlyMetrics>,
        reference: NaiveDate,
        fingerprint: String,
    ) -> MonthlyMetrics {
        let roster_size = self.config().roster_size();

        let mut metrics = match result {
            Ok(metrics) => metrics,
            Err(err) => {
                warn!(error = %err, reference = %reference, "metrics computation failed, returning zeroed metrics");
                MonthlyMetrics::failed(reference, &err, roster_size)
            }
        };

        if metrics.metadata.data_quality != DataQuality::Failed && metrics.active_members == 0 {
            metrics.active_members = roster_size;
            metrics.metadata.active_members_fallback = true;
        }
        metrics.metadata.input_fingerprint = fingerprint;

        debug!(summary = %metrics.summary(), "computed metrics");
        metrics
    }
}

impl Default for MetricsEngine {
    fn default() -> Self {
        Self::new(LedgerConfig::default())
    }
}

/// Convenience wrapper around `MetricsEngine::compute`
pub fn compute_metrics(
    expenses: &[Value],
    contributions: &[Value],
    config: &LedgerConfig,
    reference: NaiveDate,
) -> MonthlyMetrics {
    MetricsEngine::new(config.clone()).compute(expenses, contributions, reference)
}

/// SHA-256 of both collections' canonical JSON
pub fn input_fingerprint(expenses: &[Value], contributions: &[Value]) -> String {
    let mut hasher = Sha256::new();
    for (tag, records) in [("expenses", expenses), ("contributions", contributions)] {
        hasher.update(tag.as_bytes());
        for record in records {
            hasher.update(record.to_string().as_bytes());
            hasher.update(b"\n");
        }
    }
    format!("{:x}", hasher.finalize())
}

fn as_collection<'a>(name: &'static str, value: &'a Value) -> MetricsResult<&'a [Value]> {
    match value {
        Value::Array(items) => Ok(items.as_slice()),
        other => Err(MetricsError::NotACollection {
            collection: name,
            found: json_type(other),
        }),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ============================================================================
// TESTS
// ============================================================================
