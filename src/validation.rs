// ✅ Transaction Validator - raw record → typed Transaction
//
// Accepts anything record-shaped (including null, wrong types and missing
// fields), never panics, and always returns a report. Rejected records are
// excluded from totals by the callers; nothing here is surfaced to users.

use crate::error::ValidationError;
use crate::money;
use crate::transaction::{Contribution, Expense, RecordKind, Transaction};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::debug;

// ============================================================================
// VALIDATION REPORT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub is_valid: bool,
    /// Empty iff `is_valid`
    pub errors: Vec<ValidationError>,
    /// Amount rounded to cents, `0.0` when the amount could not be read
    pub normalized_amount: f64,
    pub normalized_date: Option<NaiveDate>,
    /// Present iff `is_valid`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction: Option<Transaction>,
}

impl ValidationReport {
    fn malformed() -> Self {
        ValidationReport {
            is_valid: false,
            errors: vec![ValidationError::Malformed],
            normalized_amount: 0.0,
            normalized_date: None,
            transaction: None,
        }
    }

    /// Error messages as plain strings
    pub fn messages(&self) -> Vec<String> {
        self.errors.iter().map(|e| e.to_string()).collect()
    }

    pub fn has_error(&self, error: ValidationError) -> bool {
        self.errors.contains(&error)
    }

    pub fn into_transaction(self) -> Option<Transaction> {
        self.transaction
    }
}

// ============================================================================
// BATCH SUMMARY
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchSummary {
    pub total_records: usize,
    pub valid_count: usize,
    pub rejected_count: usize,
    /// How often each rule failed across the batch
    pub error_counts: BTreeMap<ValidationError, usize>,
}

impl BatchSummary {
    pub fn summary(&self) -> String {
        format!(
            "{} records: {} valid, {} rejected",
            self.total_records, self.valid_count, self.rejected_count
        )
    }

    pub fn all_valid(&self) -> bool {
        self.rejected_count == 0
    }
}

// ============================================================================
// VALIDATOR
// ============================================================================

pub struct TransactionValidator;

impl TransactionValidator {
    pub fn new() -> Self {
        TransactionValidator
    }

    /// Validate one raw record of the given kind
    pub fn validate(&self, record: &Value, kind: RecordKind) -> ValidationReport {
        let fields = match record.as_object() {
            Some(fields) => fields,
            None => {
                debug!(kind = kind.name(), "rejected non-object record");
                return ValidationReport::malformed();
            }
        };

        let mut errors = Vec::new();

        // Rule 1: amount is a number and > 0 (after rounding to cents)
        let normalized_amount = match self.parse_amount(fields.get("amount")) {
            Some(amount) => {
                if amount <= 0.0 {
                    errors.push(ValidationError::AmountNotPositive);
                }
                amount
            }
            None => {
                errors.push(ValidationError::AmountNotNumeric);
                0.0
            }
        };

        // Rule 2: date is a real calendar date
        let normalized_date = fields.get("date").and_then(|d| self.parse_date(d));
        if normalized_date.is_none() {
            errors.push(ValidationError::InvalidDate);
        }

        // Rule 3: someone the money is attributed to
        let transaction = match kind {
            RecordKind::Expense => {
                let paid_by = member_id(fields.get("paidBy"));
                if paid_by.is_none() {
                    errors.push(ValidationError::MissingPayer);
                }

                let split_between = member_list(fields.get("splitBetween"));
                if split_between.is_empty() {
                    errors.push(ValidationError::EmptySplit);
                }

                match (errors.is_empty(), normalized_date, paid_by) {
                    (true, Some(date), Some(paid_by)) => Some(Transaction::Expense(Expense {
                        id: text(fields.get("id")).unwrap_or_default(),
                        amount: normalized_amount,
                        date,
                        description: text(fields.get("description")).unwrap_or_default(),
                        category: text(fields.get("category")),
                        paid_by,
                        split_between,
                        created_at: timestamp(fields, "createdAt"),
                        updated_at: timestamp(fields, "updatedAt"),
                    })),
                    _ => None,
                }
            }
            RecordKind::Contribution => {
                let contributed_by = member_id(fields.get("contributedBy"));
                if contributed_by.is_none() {
                    errors.push(ValidationError::MissingContributor);
                }

                match (errors.is_empty(), normalized_date, contributed_by) {
                    (true, Some(date), Some(contributed_by)) => {
                        Some(Transaction::Contribution(Contribution {
                            id: text(fields.get("id")).unwrap_or_default(),
                            amount: normalized_amount,
                            date,
                            description: text(fields.get("description")).unwrap_or_default(),
                            category: text(fields.get("category")),
                            contributed_by,
                            created_at: timestamp(fields, "createdAt"),
                            updated_at: timestamp(fields, "updatedAt"),
                        }))
                    }
                    _ => None,
                }
            }
        };

        if !errors.is_empty() {
            debug!(
                kind = kind.name(),
                id = %text(fields.get("id")).unwrap_or_default(),
                errors = ?errors,
                "rejected record"
            );
        }

        ValidationReport {
            is_valid: errors.is_empty(),
            errors,
            normalized_amount,
            normalized_date,
            transaction,
        }
    }

    /// Validate every record of a collection
    pub fn validate_batch(&self, records: &[Value], kind: RecordKind) -> Vec<ValidationReport> {
        records.iter().map(|r| self.validate(r, kind)).collect()
    }

    /// Only the records that passed, in input order
    pub fn valid_transactions(&self, records: &[Value], kind: RecordKind) -> Vec<Transaction> {
        records
            .iter()
            .filter_map(|r| self.validate(r, kind).into_transaction())
            .collect()
    }

    /// Summary statistics for a validated batch
    pub fn batch_summary(&self, reports: &[ValidationReport]) -> BatchSummary {
        let mut summary = BatchSummary {
            total_records: reports.len(),
            ..BatchSummary::default()
        };

        for report in reports {
            if report.is_valid {
                summary.valid_count += 1;
            } else {
                summary.rejected_count += 1;
            }
            for error in &report.errors {
                *summary.error_counts.entry(*error).or_insert(0) += 1;
            }
        }

        summary
    }

    // ========================================================================
    // FIELD PARSERS
    // ========================================================================

    /// Numbers or numeric strings ("1,500.00", "$42"), finite, rounded to cents
    pub fn parse_amount(&self, value: Option<&Value>) -> Option<f64> {
        let raw = match value? {
            Value::Number(n) => n.as_f64()?,
            Value::String(s) => {
                let s = s.trim();
                // Sign may sit on either side of the currency symbol: "-$5", "$-5"
                let (negative, digits) = match s.strip_prefix('-') {
                    Some(rest) => (true, rest),
                    None => (false, s.strip_prefix('+').unwrap_or(s)),
                };
                let cleaned: String = digits
                    .trim_start()
                    .trim_start_matches('$')
                    .chars()
                    .filter(|c| *c != ',')
                    .collect();
                let cleaned = cleaned.trim();
                if negative && cleaned.starts_with(['-', '+']) {
                    return None;
                }
                let amount = cleaned.parse::<f64>().ok()?;
                if negative {
                    -amount
                } else {
                    amount
                }
            }
            _ => return None,
        };

        if !raw.is_finite() {
            return None;
        }

        let rounded = money::round_currency(raw);
        rounded.is_finite().then_some(rounded)
    }

    /// Calendar date as written in the record; no timezone conversion
    pub fn parse_date(&self, value: &Value) -> Option<NaiveDate> {
        parse_date_str(value.as_str()?)
    }
}

impl Default for TransactionValidator {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse the date formats records are stored in
///
/// Accepts `YYYY-MM-DD`, `MM/DD/YYYY`, RFC 3339 timestamps and naive
/// `YYYY-MM-DDTHH:MM:SS[.fff]`.
pub fn parse_date_str(input: &str) -> Option<NaiveDate> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        return Some(date);
    }

    if let Ok(date) = NaiveDate::parse_from_str(input, "%m/%d/%Y") {
        return Some(date);
    }

    // Keep the wall-clock date written in the string, not the UTC one
    if let Ok(datetime) = DateTime::parse_from_rfc3339(input) {
        return Some(datetime.date_naive());
    }

    if let Ok(datetime) = NaiveDateTime::parse_from_str(input, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(datetime.date());
    }

    None
}

// ============================================================================
// HELPERS
// ============================================================================

fn text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Trimmed, non-blank member identifier
fn member_id(value: Option<&Value>) -> Option<String> {
    let id = text(value)?;
    let trimmed = id.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Participants in first-appearance order, blanks and repeats dropped
fn member_list(value: Option<&Value>) -> Vec<String> {
    let mut members: Vec<String> = Vec::new();

    if let Some(Value::Array(items)) = value {
        for item in items {
            if let Some(id) = member_id(Some(item)) {
                if !members.contains(&id) {
                    members.push(id);
                }
            }
        }
    }

    members
}

fn timestamp(fields: &Map<String, Value>, key: &str) -> Option<chrono::DateTime<chrono::Utc>> {
    let raw = fields.get(key)?.as_str()?;
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&chrono::Utc))
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid_expense() -> Value {
        json!({
            "id": "exp-1",
            "amount": 1500,
            "date": "2026-10-05",
            "description": "Team laptops",
            "category": "Equipment",
            "paidBy": "A",
            "splitBetween": ["A", "B", "C"],
            "createdAt": "2026-10-05T09:30:00Z"
        })
    }

    fn valid_contribution() -> Value {
        json!({
            "id": "con-1",
            "amount": "25000",
            "date": "2026-10-01",
            "description": "Capital injection",
            "contributedBy": "B"
        })
    }

    #[test]
    fn test_validate_perfect_expense() {
        let validator = TransactionValidator::new();
        let report = validator.validate(&valid_expense(), RecordKind::Expense);

        assert!(report.is_valid);
        assert!(report.errors.is_empty());
        assert_eq!(report.normalized_amount, 1500.0);
        assert_eq!(report.normalized_date, NaiveDate::from_ymd_opt(2026, 10, 5));

        match report.transaction {
            Some(Transaction::Expense(expense)) => {
                assert_eq!(expense.id, "exp-1");
                assert_eq!(expense.paid_by, "A");
                assert_eq!(expense.split_between, vec!["A", "B", "C"]);
                assert!(expense.created_at.is_some());
            }
            other => panic!("expected expense, got {:?}", other),
        }
    }

    #[test]
    fn test_validate_contribution_with_string_amount() {
        let validator = TransactionValidator::new();
        let report = validator.validate(&valid_contribution(), RecordKind::Contribution);

        assert!(report.is_valid);
        assert_eq!(report.normalized_amount, 25000.0);
        assert_eq!(
            report.transaction.map(|t| t.attributed_to().to_string()),
            Some("B".to_string())
        );
    }

    #[test]
    fn test_non_object_short_circuits() {
        let validator = TransactionValidator::new();

        for record in [json!(null), json!(42), json!("expense"), json!([1, 2])] {
            let report = validator.validate(&record, RecordKind::Expense);
            assert!(!report.is_valid);
            assert_eq!(report.messages(), vec!["Invalid transaction data"]);
            assert!(report.normalized_date.is_none());
        }
    }

    #[test]
    fn test_negative_amount_rejected() {
        let validator = TransactionValidator::new();
        let mut record = valid_expense();
        record["amount"] = json!(-10);

        let report = validator.validate(&record, RecordKind::Expense);

        assert!(!report.is_valid);
        assert_eq!(report.errors, vec![ValidationError::AmountNotPositive]);
        assert!(report.transaction.is_none());
    }

    #[test]
    fn test_negative_currency_string_is_not_positive() {
        let validator = TransactionValidator::new();
        let mut record = valid_expense();
        record["amount"] = json!("-$5");

        let report = validator.validate(&record, RecordKind::Expense);

        assert_eq!(report.errors, vec![ValidationError::AmountNotPositive]);
        assert_eq!(report.normalized_amount, -5.0);
    }

    #[test]
    fn test_zero_and_sub_cent_amounts_rejected() {
        let validator = TransactionValidator::new();

        for amount in [json!(0), json!(0.004), json!("0.00")] {
            let mut record = valid_expense();
            record["amount"] = amount;
            let report = validator.validate(&record, RecordKind::Expense);
            assert!(report.has_error(ValidationError::AmountNotPositive));
        }
    }

    #[test]
    fn test_non_numeric_amount_rejected() {
        let validator = TransactionValidator::new();

        for amount in [json!("abc"), json!(null), json!(true), json!({"value": 5})] {
            let mut record = valid_expense();
            record["amount"] = amount;
            let report = validator.validate(&record, RecordKind::Expense);
            assert!(report.has_error(ValidationError::AmountNotNumeric));
            assert_eq!(report.normalized_amount, 0.0);
        }
    }

    #[test]
    fn test_amount_string_formats() {
        let validator = TransactionValidator::new();

        assert_eq!(validator.parse_amount(Some(&json!("1,500.50"))), Some(1500.5));
        assert_eq!(validator.parse_amount(Some(&json!(" $42 "))), Some(42.0));
        assert_eq!(validator.parse_amount(Some(&json!(19.999))), Some(20.0));
        assert_eq!(validator.parse_amount(Some(&json!("-$5"))), Some(-5.0));
        assert_eq!(validator.parse_amount(Some(&json!("$-5"))), Some(-5.0));
        assert_eq!(validator.parse_amount(Some(&json!("+$1,000"))), Some(1000.0));
        assert_eq!(validator.parse_amount(Some(&json!("--5"))), None);
        assert_eq!(validator.parse_amount(Some(&json!("inf"))), None);
        assert_eq!(validator.parse_amount(None), None);
    }

    #[test]
    fn test_invalid_date_rejected() {
        let validator = TransactionValidator::new();
        let mut record = valid_expense();
        record["date"] = json!("not-a-date");

        let report = validator.validate(&record, RecordKind::Expense);

        assert!(!report.is_valid);
        assert_eq!(report.errors, vec![ValidationError::InvalidDate]);
        assert!(report.normalized_date.is_none());
    }

    #[test]
    fn test_impossible_calendar_date_rejected() {
        let validator = TransactionValidator::new();
        let mut record = valid_expense();
        record["date"] = json!("2026-02-30");

        let report = validator.validate(&record, RecordKind::Expense);
        assert!(report.has_error(ValidationError::InvalidDate));
    }

    #[test]
    fn test_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2026, 10, 5);

        assert_eq!(parse_date_str("2026-10-05"), expected);
        assert_eq!(parse_date_str("10/05/2026"), expected);
        assert_eq!(parse_date_str("2026-10-05T23:30:00-05:00"), expected);
        assert_eq!(parse_date_str("2026-10-05T08:00:00.000"), expected);
        assert_eq!(parse_date_str(""), None);
        assert_eq!(parse_date_str("yesterday"), None);
    }

    #[test]
    fn test_missing_payer_and_split() {
        let validator = TransactionValidator::new();
        let record = json!({
            "amount": 10,
            "date": "2026-10-05",
            "paidBy": "   ",
            "splitBetween": []
        });

        let report = validator.validate(&record, RecordKind::Expense);

        assert!(!report.is_valid);
        assert!(report.has_error(ValidationError::MissingPayer));
        assert!(report.has_error(ValidationError::EmptySplit));
    }

    #[test]
    fn test_missing_contributor() {
        let validator = TransactionValidator::new();
        let mut record = valid_contribution();
        record.as_object_mut().unwrap().remove("contributedBy");

        let report = validator.validate(&record, RecordKind::Contribution);
        assert_eq!(report.errors, vec![ValidationError::MissingContributor]);
    }

    #[test]
    fn test_split_is_deduplicated_in_order() {
        let validator = TransactionValidator::new();
        let mut record = valid_expense();
        record["splitBetween"] = json!(["C", " A ", "C", "", "B"]);

        let report = validator.validate(&record, RecordKind::Expense);

        match report.transaction {
            Some(Transaction::Expense(expense)) => {
                assert_eq!(expense.split_between, vec!["C", "A", "B"]);
            }
            other => panic!("expected expense, got {:?}", other),
        }
    }

    #[test]
    fn test_errors_empty_iff_valid() {
        let validator = TransactionValidator::new();
        let records = vec![
            valid_expense(),
            json!(null),
            json!({}),
            json!({"amount": "x", "date": 5, "paidBy": 7, "splitBetween": "A"}),
        ];

        for report in validator.validate_batch(&records, RecordKind::Expense) {
            assert_eq!(report.is_valid, report.errors.is_empty());
            assert_eq!(report.is_valid, report.transaction.is_some());
        }
    }

    #[test]
    fn test_batch_summary() {
        let validator = TransactionValidator::new();
        let mut bad = valid_expense();
        bad["amount"] = json!(-10);

        let records = vec![valid_expense(), bad, json!(null)];
        let reports = validator.validate_batch(&records, RecordKind::Expense);
        let summary = validator.batch_summary(&reports);

        println!("Batch summary: {}", summary.summary());

        assert_eq!(summary.total_records, 3);
        assert_eq!(summary.valid_count, 1);
        assert_eq!(summary.rejected_count, 2);
        assert_eq!(summary.error_counts[&ValidationError::AmountNotPositive], 1);
        assert_eq!(summary.error_counts[&ValidationError::Malformed], 1);
        assert!(!summary.all_valid());
    }

    #[test]
    fn test_valid_transactions_filters() {
        let validator = TransactionValidator::new();
        let records = vec![valid_expense(), json!({"amount": 5})];

        let valid = validator.valid_transactions(&records, RecordKind::Expense);
        assert_eq!(valid.len(), 1);
        assert_eq!(valid[0].id(), "exp-1");
    }
}
