// 🧾 Transaction model - Expense / Contribution
//
// Records arrive loosely typed (serde_json::Value). Only the validator builds
// these typed values, so everything downstream can pattern-match a closed
// sum type instead of probing for `paidBy` vs `contributedBy`.

use crate::money;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Which collection a raw record came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RecordKind {
    Expense,
    Contribution,
}

impl RecordKind {
    pub fn name(&self) -> &'static str {
        match self {
            RecordKind::Expense => "expense",
            RecordKind::Contribution => "contribution",
        }
    }

    /// Plural used in diagnostics ("expenses", "contributions")
    pub fn collection(&self) -> &'static str {
        match self {
            RecordKind::Expense => "expenses",
            RecordKind::Contribution => "contributions",
        }
    }
}

impl std::str::FromStr for RecordKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "expense" | "expenses" => Ok(RecordKind::Expense),
            "contribution" | "contributions" => Ok(RecordKind::Contribution),
            other => Err(format!("Unknown record kind: {}", other)),
        }
    }
}

// ============================================================================
// EXPENSE
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    /// Stable identity, assigned once at creation
    pub id: String,
    pub amount: f64,
    pub date: NaiveDate,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub paid_by: String,
    /// Ordered, de-duplicated, never empty
    pub split_between: Vec<String>,

    // Audit timestamps, never used in financial computation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Expense {
    /// Create a new expense with a fresh id and creation time
    pub fn new(
        amount: f64,
        date: NaiveDate,
        description: &str,
        category: Option<&str>,
        paid_by: &str,
        split_between: &[&str],
    ) -> Self {
        Expense {
            id: new_id(),
            amount: money::round_currency(amount),
            date,
            description: description.to_string(),
            category: category.map(str::to_string),
            paid_by: paid_by.to_string(),
            split_between: split_between.iter().map(|m| m.to_string()).collect(),
            created_at: Some(Utc::now()),
            updated_at: None,
        }
    }

    /// Share of the amount owed by each participant
    pub fn split_amount(&self) -> f64 {
        money::safe_div(self.amount, self.split_between.len() as f64)
    }

    /// Mark as edited
    pub fn touch(&mut self) {
        self.updated_at = Some(Utc::now());
    }

    /// Serialize back into the loose wire shape
    pub fn to_record(&self) -> Value {
        to_record(self)
    }
}

// ============================================================================
// CONTRIBUTION
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contribution {
    pub id: String,
    pub amount: f64,
    pub date: NaiveDate,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub contributed_by: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Contribution {
    pub fn new(
        amount: f64,
        date: NaiveDate,
        description: &str,
        category: Option<&str>,
        contributed_by: &str,
    ) -> Self {
        Contribution {
            id: new_id(),
            amount: money::round_currency(amount),
            date,
            description: description.to_string(),
            category: category.map(str::to_string),
            contributed_by: contributed_by.to_string(),
            created_at: Some(Utc::now()),
            updated_at: None,
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Some(Utc::now());
    }

    pub fn to_record(&self) -> Value {
        to_record(self)
    }
}

// ============================================================================
// TAGGED UNION
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Transaction {
    Expense(Expense),
    Contribution(Contribution),
}

impl Transaction {
    pub fn kind(&self) -> RecordKind {
        match self {
            Transaction::Expense(_) => RecordKind::Expense,
            Transaction::Contribution(_) => RecordKind::Contribution,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Transaction::Expense(e) => &e.id,
            Transaction::Contribution(c) => &c.id,
        }
    }

    pub fn amount(&self) -> f64 {
        match self {
            Transaction::Expense(e) => e.amount,
            Transaction::Contribution(c) => c.amount,
        }
    }

    pub fn date(&self) -> NaiveDate {
        match self {
            Transaction::Expense(e) => e.date,
            Transaction::Contribution(c) => c.date,
        }
    }

    pub fn category(&self) -> Option<&str> {
        match self {
            Transaction::Expense(e) => e.category.as_deref(),
            Transaction::Contribution(c) => c.category.as_deref(),
        }
    }

    /// Member the money is attributed to (payer or contributor)
    pub fn attributed_to(&self) -> &str {
        match self {
            Transaction::Expense(e) => &e.paid_by,
            Transaction::Contribution(c) => &c.contributed_by,
        }
    }

    /// Category label with the configured fallback for missing/blank ones
    pub fn category_or<'a>(&'a self, default: &'a str) -> &'a str {
        match self.category() {
            Some(c) if !c.trim().is_empty() => c.trim(),
            _ => default,
        }
    }
}

fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

fn to_record<T: Serialize>(value: &T) -> Value {
    // Plain structs of strings/numbers/dates always serialize
    serde_json::to_value(value).unwrap_or(Value::Null)
}
