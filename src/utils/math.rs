use serde_json::Value;

/// Coerce an untyped field to a float.
///
/// Absent/null, booleans, unparseable strings and non-finite values all
/// become `0.0`; numbers and numeric strings are parsed.
pub fn safe_float(value: Option<&Value>) -> f64 {
    let parsed = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    match parsed {
        Some(v) if v.is_finite() => v,
        _ => 0.0,
    }
}

/// Upper bound for a coerced USD amount; keeps sums over a listing finite.
pub const MAX_AMOUNT_USD: f64 = 1e18;

/// Clamp to the non-negative range, mapping NaN to zero.
pub fn non_negative(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

/// A USD amount clamped to `[0, MAX_AMOUNT_USD]`.
pub fn bounded_amount(value: f64) -> f64 {
    non_negative(value).min(MAX_AMOUNT_USD)
}

/// `numerator / denominator`, or `0.0` when the denominator is not positive
/// or the quotient is not finite.
pub fn ratio_or_zero(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        let ratio = numerator / denominator;
        if ratio.is_finite() {
            return ratio;
        }
    }
    0.0
}

/// Percentage of `part` in `total`, clamped to [0, 100]. Zero total yields 0.
pub fn percentage_of(part: f64, total: f64) -> f64 {
    (ratio_or_zero(part, total) * 100.0).clamp(0.0, 100.0)
}

/// Herfindahl-Hirschman index: sum of squared shares of the total.
///
/// Values are scaled by the largest one first, so the result stays in
/// `[1/n, 1]` even when the raw total would overflow.
pub fn herfindahl_index(values: &[f64]) -> f64 {
    let largest = values.iter().copied().fold(0.0, f64::max);
    if !(largest.is_finite() && largest > 0.0) {
        return 0.0;
    }

    let scaled: Vec<f64> = values.iter().map(|v| non_negative(*v) / largest).collect();
    let total: f64 = scaled.iter().sum();

    scaled
        .iter()
        .map(|v| {
            let share = v / total;
            share * share
        })
        .sum()
}

/// Sum of the `k` largest values (all of them when fewer than `k`).
pub fn sum_of_largest(values: &[f64], k: usize) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| b.total_cmp(a));
    sorted.iter().take(k).sum()
}
