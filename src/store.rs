// 🗄️ Record sources - what the engine reads from
//
// The engine never touches storage itself. A LedgerSource hands it snapshots
// of both collections in the loose wire shape; the validator does the rest.

use crate::transaction::{Contribution, Expense};
use anyhow::{anyhow, bail, Context, Result};
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;
use tracing::info;

/// Persistence collaborator seam
pub trait LedgerSource {
    /// Snapshot of all expenses (possibly empty, never absent)
    fn expenses(&self) -> Vec<Value>;

    /// Snapshot of all contributions
    fn contributions(&self) -> Vec<Value>;
}

// ============================================================================
// IN-MEMORY LEDGER
// ============================================================================

/// Typed records held in memory; each mutation returns the updated collection
#[derive(Debug, Clone, Default)]
pub struct InMemoryLedger {
    expenses: Vec<Expense>,
    contributions: Vec<Contribution>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_expense(&mut self, expense: Expense) -> &[Expense] {
        self.expenses.push(expense);
        &self.expenses
    }

    /// Edit an expense in place and stamp `updated_at`
    pub fn update_expense<F>(&mut self, id: &str, edit: F) -> Result<&[Expense]>
    where
        F: FnOnce(&mut Expense),
    {
        let expense = self
            .expenses
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| anyhow!("Expense not found: {}", id))?;

        edit(expense);
        expense.id = id.to_string();
        expense.touch();
        Ok(&self.expenses)
    }

    pub fn delete_expense(&mut self, id: &str) -> Result<&[Expense]> {
        let before = self.expenses.len();
        self.expenses.retain(|e| e.id != id);
        if self.expenses.len() == before {
            bail!("Expense not found: {}", id);
        }
        Ok(&self.expenses)
    }

    pub fn add_contribution(&mut self, contribution: Contribution) -> &[Contribution] {
        self.contributions.push(contribution);
        &self.contributions
    }

    pub fn update_contribution<F>(&mut self, id: &str, edit: F) -> Result<&[Contribution]>
    where
        F: FnOnce(&mut Contribution),
    {
        let contribution = self
            .contributions
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| anyhow!("Contribution not found: {}", id))?;

        edit(contribution);
        contribution.id = id.to_string();
        contribution.touch();
        Ok(&self.contributions)
    }

    pub fn delete_contribution(&mut self, id: &str) -> Result<&[Contribution]> {
        let before = self.contributions.len();
        self.contributions.retain(|c| c.id != id);
        if self.contributions.len() == before {
            bail!("Contribution not found: {}", id);
        }
        Ok(&self.contributions)
    }
}

impl LedgerSource for InMemoryLedger {
    fn expenses(&self) -> Vec<Value> {
        self.expenses.iter().map(Expense::to_record).collect()
    }

    fn contributions(&self) -> Vec<Value> {
        self.contributions.iter().map(Contribution::to_record).collect()
    }
}

// ============================================================================
// FILE LEDGER
// ============================================================================

/// Raw records loaded from two files, kept exactly as read
#[derive(Debug, Clone, Default)]
pub struct FileLedger {
    pub expenses: Vec<Value>,
    pub contributions: Vec<Value>,
}

impl FileLedger {
    pub fn load(expenses_path: &Path, contributions_path: &Path) -> Result<Self> {
        Ok(FileLedger {
            expenses: load_records(expenses_path)?,
            contributions: load_records(contributions_path)?,
        })
    }
}

impl LedgerSource for FileLedger {
    fn expenses(&self) -> Vec<Value> {
        self.expenses.clone()
    }

    fn contributions(&self) -> Vec<Value> {
        self.contributions.clone()
    }
}

// ============================================================================
// LOADERS
// ============================================================================

/// Load raw records from a `.csv` file or a JSON array file
pub fn load_records(path: &Path) -> Result<Vec<Value>> {
    let is_csv = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("csv"))
        .unwrap_or(false);

    let records = if is_csv {
        load_csv(path)?
    } else {
        load_json(path)?
    };

    info!(path = %path.display(), count = records.len(), "loaded records");
    Ok(records)
}

/// JSON file holding an array of records
pub fn load_json(path: &Path) -> Result<Vec<Value>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read records file: {:?}", path))?;

    let value: Value = serde_json::from_str(&content).context("Failed to parse records JSON")?;

    match value {
        Value::Array(records) => Ok(records),
        _ => bail!("Records file must contain a JSON array: {:?}", path),
    }
}

/// CSV file with one record per row, headers as field names
///
/// Empty cells are left out; `splitBetween` is a `;` or `|` separated list.
/// Every other cell stays a string for the validator to interpret.
pub fn load_csv(path: &Path) -> Result<Vec<Value>> {
    let mut rdr = csv::Reader::from_path(path).context("Failed to open CSV file")?;
    let headers = rdr.headers().context("Failed to read CSV headers")?.clone();

    let mut records = Vec::new();

    for result in rdr.records() {
        let row = result.context("Failed to read CSV row")?;
        let mut fields = Map::new();

        for (header, cell) in headers.iter().zip(row.iter()) {
            let header = header.trim();
            let cell = cell.trim();
            if cell.is_empty() {
                continue;
            }

            let value = if header == "splitBetween" {
                Value::Array(
                    cell.split(|c| c == ';' || c == '|')
                        .map(|m| Value::String(m.trim().to_string()))
                        .collect(),
                )
            } else {
                Value::String(cell.to_string())
            };
            fields.insert(header.to_string(), value);
        }

        records.push(Value::Object(fields));
    }

    Ok(records)
}
