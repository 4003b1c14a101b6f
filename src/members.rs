// 👥 Member Ledger - who paid, who owes, who is ahead
//
// Expenses are split evenly across their participants. Contributions are
// credited whole to the contributor's net, on top of the expense settlement:
//
//   net = (paid - owes) + contributions
//
// Only members referenced by a valid transaction get an entry.

use crate::error::{ensure_finite, MetricsResult};
use crate::money;
use crate::transaction::Transaction;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MemberBalance {
    /// Full amounts of expenses this member fronted
    pub paid: f64,
    /// Sum of this member's split shares
    pub owes: f64,
    /// `paid - owes` plus contribution inflows
    pub net: f64,
}

/// Balances keyed by member id, in id order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemberBalances(BTreeMap<String, MemberBalance>);

impl MemberBalances {
    pub fn get(&self, member: &str) -> Option<&MemberBalance> {
        self.0.get(member)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &MemberBalance)> {
        self.0.iter()
    }

    /// Add zero entries for roster members no transaction mentions
    pub fn with_roster(mut self, roster: &[String]) -> Self {
        for member in roster {
            self.0.entry(member.clone()).or_default();
        }
        self
    }

    pub fn into_inner(self) -> BTreeMap<String, MemberBalance> {
        self.0
    }
}

pub struct MemberLedger;

impl MemberLedger {
    pub fn new() -> Self {
        MemberLedger
    }

    /// Fold validated transactions into per-member balances
    ///
    /// Expenses settle first, contributions are added to `net` afterwards,
    /// whatever order the two kinds arrive in.
    pub fn balances(&self, transactions: &[Transaction]) -> MetricsResult<MemberBalances> {
        let mut balances: BTreeMap<String, MemberBalance> = BTreeMap::new();

        // Pass 1: expense splits
        for tx in transactions {
            if let Transaction::Expense(expense) = tx {
                let share = expense.split_amount();
                for member in &expense.split_between {
                    let entry = balances.entry(member.clone()).or_default();
                    entry.owes = money::add(entry.owes, share);
                    // Only a payer who is also a participant is credited
                    if *member == expense.paid_by {
                        entry.paid = money::add(entry.paid, expense.amount);
                    }
                }
            }
        }

        for balance in balances.values_mut() {
            balance.net = money::sub(balance.paid, balance.owes);
        }

        // Pass 2: contribution inflows
        for tx in transactions {
            if let Transaction::Contribution(contribution) = tx {
                let entry = balances
                    .entry(contribution.contributed_by.clone())
                    .or_default();
                entry.net = money::add(entry.net, contribution.amount);
            }
        }

        for (member, balance) in &balances {
            ensure_finite(&format!("member {} net", member), balance.net)?;
            ensure_finite(&format!("member {} paid", member), balance.paid)?;
        }

        Ok(MemberBalances(balances))
    }
}

impl Default for MemberLedger {
    fn default() -> Self {
        Self::new()
    }
}
