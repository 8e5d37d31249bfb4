use serde_json::Value;

use super::leaf_to_string;

/// Print just the key answer value from the result.
///
/// Heuristic: scenario-specific headline fields first, then the aggregate
/// fields, then fall back to the first field in the result object.
pub fn print_minimal(value: &Value) {
    let result = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    let priority_keys = [
        "infeasible_reason",
        "break_even",
        "monthly_savings",
        "new_monthly_payment",
        "months_to_debt_free",
        "total_monthly_payment",
        "total_interest",
    ];

    if let Value::Object(map) = result {
        for key in &priority_keys {
            if let Some(val) = map.get(*key) {
                if !val.is_null() {
                    println!("{}", leaf_to_string(val));
                    return;
                }
            }
        }

        if let Some((key, val)) = map.iter().next() {
            println!("{}: {}", key, leaf_to_string(val));
            return;
        }
    }

    println!("{}", leaf_to_string(result));
}
