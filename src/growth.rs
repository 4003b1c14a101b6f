// 📈 Growth Calculator - current period vs prior period
//
// Total function over two scalars: no division by zero, no infinite or NaN
// percentages, and a neutral result for anything that is not a finite number.

use crate::money;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Trend {
    Positive,
    Negative,
    Neutral,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Growth {
    /// Rounded `current - previous`
    pub value: f64,
    /// "+12.5%", "-3.0%", or "+100%" / "0%" when there was no prior baseline
    pub percentage: String,
    pub is_positive: bool,
    pub trend: Trend,
}

impl Growth {
    /// Zero change
    pub fn neutral() -> Self {
        Growth {
            value: 0.0,
            percentage: "0%".to_string(),
            is_positive: false,
            trend: Trend::Neutral,
        }
    }
}

impl Default for Growth {
    fn default() -> Self {
        Self::neutral()
    }
}

/// Compare `current` against `previous`
pub fn growth(current: f64, previous: f64) -> Growth {
    if !current.is_finite() || !previous.is_finite() {
        return Growth::neutral();
    }

    let difference = current - previous;
    let trend = if difference > 0.0 {
        Trend::Positive
    } else if difference < 0.0 {
        Trend::Negative
    } else {
        Trend::Neutral
    };

    // No baseline: report full growth or nothing, never a ratio
    if previous <= 0.0 {
        let percentage = if current > 0.0 { "+100%" } else { "0%" };
        return Growth {
            value: money::round_currency(difference),
            percentage: percentage.to_string(),
            is_positive: difference > 0.0,
            trend,
        };
    }

    let ratio = (difference / previous.abs()) * 100.0;
    let percentage = if ratio.is_finite() {
        format_percentage(ratio)
    } else {
        "0%".to_string()
    };

    Growth {
        value: money::round_currency(difference),
        percentage,
        is_positive: current >= previous,
        trend,
    }
}

/// One decimal place with an explicit sign
fn format_percentage(ratio: f64) -> String {
    let mut rounded = (ratio * 10.0).round() / 10.0;
    if rounded == 0.0 {
        rounded = 0.0;
    }
    format!("{:+.1}%", rounded)
}
