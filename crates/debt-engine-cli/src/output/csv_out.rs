use serde_json::Value;
use std::io;

use super::leaf_to_string;

/// Write output as CSV to stdout: per-debt rows when the scenario produced
/// them, otherwise the flat scalar fields of the result.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    let result = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    if let Some(Value::Array(debts)) = result.get("debt_results") {
        if !debts.is_empty() {
            write_rows(&mut wtr, debts);
            let _ = wtr.flush();
            return;
        }
    }

    if let Value::Object(map) = result {
        let _ = wtr.write_record(["field", "value"]);
        for (key, val) in map {
            if matches!(val, Value::Array(_)) {
                continue;
            }
            let _ = wtr.write_record([key.as_str(), &leaf_to_string(val)]);
        }
    } else {
        let _ = wtr.write_record([&leaf_to_string(result)]);
    }

    let _ = wtr.flush();
}

fn write_rows(wtr: &mut csv::Writer<io::StdoutLock<'_>>, rows: &[Value]) {
    let Some(Value::Object(first)) = rows.first() else {
        for row in rows {
            let _ = wtr.write_record([&leaf_to_string(row)]);
        }
        return;
    };

    let headers: Vec<&str> = first.keys().map(|k| k.as_str()).collect();
    let _ = wtr.write_record(&headers);

    for row in rows {
        if let Value::Object(map) = row {
            let record: Vec<String> = headers
                .iter()
                .map(|h| map.get(*h).map(leaf_to_string).unwrap_or_default())
                .collect();
            let _ = wtr.write_record(&record);
        }
    }
}
