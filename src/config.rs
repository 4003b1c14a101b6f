// ⚙️ Ledger configuration - member roster and category list
//
// Both sets are opaque strings edited outside the engine. They are handed to
// the engine explicitly at call time; nothing here is global.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const DEFAULT_CATEGORY: &str = "Uncategorized";

/// Roster used when none is configured
pub const DEFAULT_MEMBERS: [&str; 4] = ["member-1", "member-2", "member-3", "member-4"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerConfig {
    /// Configured member roster; its size is the active-member fallback
    #[serde(default = "default_members")]
    pub members: Vec<String>,

    /// Configured categories (open set, never enforced)
    #[serde(default = "default_categories")]
    pub categories: Vec<String>,

    /// Label for transactions that carry no category
    #[serde(default = "default_category")]
    pub default_category: String,
}

fn default_members() -> Vec<String> {
    DEFAULT_MEMBERS.iter().map(|m| m.to_string()).collect()
}

fn default_categories() -> Vec<String> {
    [
        "Office",
        "Software",
        "Marketing",
        "Travel",
        "Utilities",
        "Equipment",
        "Capital",
        "Other",
    ]
    .iter()
    .map(|c| c.to_string())
    .collect()
}

fn default_category() -> String {
    DEFAULT_CATEGORY.to_string()
}

impl LedgerConfig {
    pub fn new() -> Self {
        LedgerConfig {
            members: default_members(),
            categories: default_categories(),
            default_category: default_category(),
        }
    }

    /// Config with the given roster and the default category list
    pub fn with_members<I, S>(members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        LedgerConfig {
            members: members.into_iter().map(Into::into).collect(),
            ..Self::new()
        }
    }

    /// Load config from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;

        let config: LedgerConfig =
            serde_json::from_str(&content).context("Failed to parse config JSON")?;

        Ok(config)
    }

    /// Number of members reported when no one was active this month
    ///
    /// Never zero: an empty roster counts as the default one.
    pub fn roster_size(&self) -> usize {
        if self.members.is_empty() {
            DEFAULT_MEMBERS.len()
        } else {
            self.members.len()
        }
    }

    pub fn is_configured_category(&self, category: &str) -> bool {
        self.categories
            .iter()
            .any(|c| c.eq_ignore_ascii_case(category))
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self::new()
    }
}
