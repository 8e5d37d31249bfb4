use serde_json::Value;
use tabled::{builder::Builder, Table};

use super::leaf_to_string;

/// Render the result envelope as tables: a scenario summary of the scalar
/// fields, then per-debt rows and the payoff sequence when present,
/// followed by warnings and the explanation trace.
pub fn print_table(value: &Value) {
    let Some(envelope) = value.as_object() else {
        println!("{}", value);
        return;
    };
    let Some(Value::Object(result)) = envelope.get("result") else {
        print_scalar_table("Result", value);
        return;
    };

    // Scenario summary: every scalar field of the flat result
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    for (key, val) in result {
        if matches!(val, Value::Array(_) | Value::Object(_)) && key != "break_even" {
            continue;
        }
        builder.push_record([key.as_str(), &leaf_to_string(val)]);
    }
    println!("{}", Table::from(builder));

    if let Some(Value::Array(debts)) = result.get("debt_results") {
        if !debts.is_empty() {
            println!("\nPer-debt results:");
            print_row_table(debts);
        }
    }

    if let Some(Value::Array(sequence)) = result.get("payoff_sequence") {
        if !sequence.is_empty() {
            println!("\nPayoff order:");
            print_row_table(sequence);
        }
    }

    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings {
                if let Value::String(s) = w {
                    println!("  - {}", s);
                }
            }
        }
    }

    if let Some(Value::Array(steps)) = result.get("explanation_trace") {
        if !steps.is_empty() {
            println!("\nHow this was calculated:");
            for step in steps {
                let title = step.get("title").map(leaf_to_string).unwrap_or_default();
                let substituted = step
                    .get("substituted")
                    .map(leaf_to_string)
                    .unwrap_or_default();
                println!("  {}: {}", title, substituted);
            }
        }
    }
}

fn print_scalar_table(header: &str, value: &Value) {
    let Some(map) = value.as_object() else {
        println!("{}", value);
        return;
    };
    let mut builder = Builder::default();
    builder.push_record([header, "Value"]);
    for (key, val) in map {
        builder.push_record([key.as_str(), &leaf_to_string(val)]);
    }
    println!("{}", Table::from(builder));
}

/// One row per array element, headers from the first object's keys.
fn print_row_table(rows: &[Value]) {
    let Some(Value::Object(first)) = rows.first() else {
        for row in rows {
            println!("{}", leaf_to_string(row));
        }
        return;
    };

    let headers: Vec<String> = first.keys().cloned().collect();
    let mut builder = Builder::default();
    builder.push_record(&headers);

    for row in rows {
        if let Value::Object(map) = row {
            let record: Vec<String> = headers
                .iter()
                .map(|h| map.get(h.as_str()).map(leaf_to_string).unwrap_or_default())
                .collect();
            builder.push_record(record);
        }
    }
    println!("{}", Table::from(builder));
}
