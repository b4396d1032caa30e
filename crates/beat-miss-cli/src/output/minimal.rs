use serde_json::Value;

use super::flatten_object;

/// Print just the key answer value from the output.
///
/// Ranked rows print one `company total_beats` line each. Otherwise look
/// for well-known result fields in order of priority, then fall back to
/// the first field in the result object.
pub fn print_minimal(value: &Value) {
    for line in minimal_lines(value) {
        println!("{}", line);
    }
}

fn minimal_lines(value: &Value) -> Vec<String> {
    // Try to extract the "result" envelope
    let result_obj = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    if let Some(Value::Array(rows)) = result_obj.get("rows") {
        return rows
            .iter()
            .map(|r| {
                format!(
                    "{} {}",
                    r.get("company_name").map(format_minimal).unwrap_or_default(),
                    r.get("total_beats").map(format_minimal).unwrap_or_default()
                )
            })
            .collect();
    }

    // Priority list of key output fields
    let priority_keys = [
        "row.total_beats",
        "summary.beat_total",
        "brokers",
        "expected_periods",
        "companies",
        "symbols",
    ];

    if let Value::Object(map) = result_obj {
        let flat = flatten_object(map);
        // Try priority keys first (skip null values)
        for key in &priority_keys {
            if let Some((_, val)) = flat.iter().find(|(k, v)| k == key && !v.is_null()) {
                return vec![format_minimal(val)];
            }
        }

        // Fall back to first field
        if let Some((key, val)) = flat.first() {
            return vec![format!("{}: {}", key, format_minimal(val))];
        }
    }

    // Not an object, just print directly
    vec![format_minimal(result_obj)]
}

fn format_minimal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        Value::Array(arr) => arr.iter().map(format_minimal).collect::<Vec<_>>().join(", "),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
