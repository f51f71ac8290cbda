use serde_json::Value;
use std::io;

use super::flatten_into;

/// Write output as CSV to stdout.
///
/// Proforma results emit one row per schedule year; sensitivity results
/// emit one row per scenario. Anything else falls back to field,value
/// pairs so scalar envelopes still produce usable CSV.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    let result = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    match result {
        Value::Object(map) => {
            if let Some(Value::Array(schedule)) = map.get("schedule") {
                write_rows(&mut wtr, schedule);
            } else if let Some(Value::Array(scenarios)) = map.get("scenarios") {
                write_rows(&mut wtr, scenarios);
            } else {
                let mut pairs = Vec::new();
                flatten_into("", result, &mut pairs);
                let _ = wtr.write_record(["field", "value"]);
                for (key, val) in &pairs {
                    let _ = wtr.write_record([key.as_str(), val.as_str()]);
                }
            }
        }
        Value::Array(arr) => write_rows(&mut wtr, arr),
        _ => {
            let _ = wtr.write_record([result.to_string()]);
        }
    }

    let _ = wtr.flush();
}

fn write_rows(wtr: &mut csv::Writer<io::StdoutLock<'_>>, rows: &[Value]) {
    if rows.is_empty() {
        return;
    }

    let flattened: Vec<Vec<(String, String)>> = rows
        .iter()
        .map(|row| {
            let mut pairs = Vec::new();
            flatten_into("", row, &mut pairs);
            pairs
        })
        .collect();

    // Header union across rows; outcome shapes vary between scenarios.
    let mut headers: Vec<String> = Vec::new();
    for pairs in &flattened {
        for (key, _) in pairs {
            if !headers.contains(key) {
                headers.push(key.clone());
            }
        }
    }

    let _ = wtr.write_record(&headers);
    for pairs in &flattened {
        let row: Vec<String> = headers
            .iter()
            .map(|h| {
                pairs
                    .iter()
                    .find(|(k, _)| k == h)
                    .map(|(_, v)| v.clone())
                    .unwrap_or_default()
            })
            .collect();
        let _ = wtr.write_record(&row);
    }
}
