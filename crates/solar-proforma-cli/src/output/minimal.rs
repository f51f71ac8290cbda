use serde_json::Value;

use super::render_scalar;

/// Print just the headline metrics from the output.
///
/// Looks for the metrics object (proforma) or the base metrics
/// (sensitivity) and prints the well-known fields in priority order,
/// skipping nulls since those are undefined rather than zero.
pub fn print_minimal(value: &Value) {
    let result = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    let metrics = result
        .as_object()
        .and_then(|m| m.get("metrics").or_else(|| m.get("base")))
        .unwrap_or(result);

    let priority_keys = ["levered_irr", "npv", "min_dscr", "payback_year"];

    if let Value::Object(map) = metrics {
        let mut printed = false;
        for key in &priority_keys {
            if let Some(val) = map.get(*key) {
                if !val.is_null() {
                    println!("{}: {}", key, render_scalar(val));
                    printed = true;
                }
            }
        }
        if printed {
            return;
        }

        // Fall back to the first non-null field
        if let Some((key, val)) = map.iter().find(|(_, v)| !v.is_null()) {
            println!("{}: {}", key, render_scalar(val));
            return;
        }
    }

    println!("{}", render_scalar(metrics));
}
