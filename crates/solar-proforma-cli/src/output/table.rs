use serde_json::Value;
use tabled::{Table, builder::Builder};

use super::{flatten_into, render_scalar};

/// Format output as tables using the tabled crate.
///
/// Proforma results render a metrics field table followed by the
/// year-by-year schedule; sensitivity results render the base metrics
/// followed by one row per scenario.
pub fn print_table(value: &Value) {
    match value {
        Value::Object(map) => {
            if let Some(result) = map.get("result") {
                print_result(result, map);
            } else {
                print_field_table("Fields", value);
            }
        }
        Value::Array(arr) => print_row_table("Rows", arr),
        _ => println!("{}", value),
    }
}

fn print_result(result: &Value, envelope: &serde_json::Map<String, Value>) {
    match result {
        Value::Object(res_map) => {
            if let Some(metrics) = res_map.get("metrics") {
                print_field_table("Metrics", metrics);
            }
            if let Some(base) = res_map.get("base") {
                print_field_table("Base case", base);
            }
            if let Some(Value::Array(schedule)) = res_map.get("schedule") {
                println!();
                print_row_table("Schedule", schedule);
            }
            if let Some(Value::Array(scenarios)) = res_map.get("scenarios") {
                println!();
                print_row_table("Scenarios", scenarios);
            }
        }
        _ => println!("{}", render_scalar(result)),
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

    if let Some(Value::String(meth)) = envelope.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}

/// Two-column table of (field, value) pairs, nested keys dotted.
fn print_field_table(title: &str, value: &Value) {
    let mut pairs = Vec::new();
    flatten_into("", value, &mut pairs);

    let mut builder = Builder::default();
    builder.push_record([title, "Value"]);
    for (key, val) in &pairs {
        builder.push_record([key.as_str(), val.as_str()]);
    }
    let table = Table::from(builder);
    println!("{}", table);
}

/// One row per array element, with the header as the union of the
/// flattened keys across all rows. Scenario outcomes differ in shape
/// (computed vs failed), so a first-row header would drop columns.
fn print_row_table(title: &str, rows: &[Value]) {
    if rows.is_empty() {
        println!("{}: (empty)", title);
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

    let mut headers: Vec<String> = Vec::new();
    for pairs in &flattened {
        for (key, _) in pairs {
            if !headers.contains(key) {
                headers.push(key.clone());
            }
        }
    }

    let mut builder = Builder::default();
    builder.push_record(&headers);
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
        builder.push_record(row);
    }

    let table = Table::from(builder);
    println!("{}", table);
}
