// 💵 Money helpers - 2-decimal currency arithmetic
//
// Every sum, division and subtraction on amounts goes through these so that
// repeated aggregation over the same records never drifts.

/// Round to 2 decimal places (cents), normalizing `-0.0` to `0.0`
pub fn round_currency(value: f64) -> f64 {
    let rounded = (value * 100.0).round() / 100.0;
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

/// Rounded sum
pub fn add(a: f64, b: f64) -> f64 {
    round_currency(a + b)
}

/// Rounded difference
pub fn sub(a: f64, b: f64) -> f64 {
    round_currency(a - b)
}

/// Rounded division, `0.0` when the divisor is zero or the result is not finite
pub fn safe_div(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        return 0.0;
    }
    let result = numerator / denominator;
    if result.is_finite() {
        round_currency(result)
    } else {
        0.0
    }
}

/// Sum an iterator of amounts, rounding after every addition
pub fn sum<I>(amounts: I) -> f64
where
    I: IntoIterator<Item = f64>,
{
    amounts.into_iter().fold(0.0, add)
}
