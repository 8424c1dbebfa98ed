pub mod csv_out;
pub mod json;
pub mod minimal;
pub mod table;

use crate::OutputFormat;
use serde_json::{Map, Value};

/// Dispatch output to the appropriate formatter.
pub fn format_output(format: &OutputFormat, value: &Value) {
    match format {
        OutputFormat::Json => json::print_json(value),
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => csv_out::print_csv(value),
        OutputFormat::Minimal => minimal::print_minimal(value),
    }
}

/// What a command computed: the `result` of an output envelope, or the
/// value itself for commands that answer without one.
fn body(value: &Value) -> &Value {
    value.get("result").unwrap_or(value)
}

/// A payload object split into dotted single-value fields (nested objects
/// such as `breakdown` or `financial` are flattened) and lists of rows
/// (commission records, per-line summaries).
struct Layout<'a> {
    fields: Vec<(String, &'a Value)>,
    row_sets: Vec<(String, &'a [Value])>,
}

fn layout(map: &Map<String, Value>) -> Layout<'_> {
    let mut layout = Layout {
        fields: Vec::new(),
        row_sets: Vec::new(),
    };
    collect(&mut layout, "", map);
    layout
}

fn collect<'a>(layout: &mut Layout<'a>, prefix: &str, map: &'a Map<String, Value>) {
    for (key, val) in map {
        let name = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        match val {
            Value::Object(inner) => collect(layout, &name, inner),
            Value::Array(rows) if !rows.is_empty() && rows.iter().all(Value::is_object) => {
                layout.row_sets.push((name, rows.as_slice()));
            }
            _ => layout.fields.push((name, val)),
        }
    }
}

/// Column names across all rows, in order of first appearance. Optional
/// invoice fields may be missing from the first record.
fn row_headers(rows: &[Value]) -> Vec<&str> {
    let mut headers: Vec<&str> = Vec::new();
    for row in rows {
        if let Value::Object(map) = row {
            for key in map.keys() {
                if !headers.contains(&key.as_str()) {
                    headers.push(key);
                }
            }
        }
    }
    headers
}

/// Render a value as a single cell.
fn cell(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        Value::Array(items) if items.iter().all(|v| !v.is_object() && !v.is_array()) => {
            items.iter().map(cell).collect::<Vec<_>>().join(", ")
        }
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_layout_flattens_nested_objects_and_separates_rows() {
        let summary = json!({
            "invoice_count": 2,
            "breakdown": { "grand_total": "1650.00", "volume_bonus": "0" },
            "lines": [{ "business_line": "Ventas" }, { "business_line": "Renta" }],
            "warnings": []
        });
        let Value::Object(map) = &summary else {
            unreachable!()
        };
        let layout = layout(map);

        let mut names: Vec<&str> = layout.fields.iter().map(|(n, _)| n.as_str()).collect();
        names.sort_unstable();
        assert_eq!(
            names,
            vec![
                "breakdown.grand_total",
                "breakdown.volume_bonus",
                "invoice_count",
                "warnings"
            ]
        );
        assert_eq!(layout.row_sets.len(), 1);
        assert_eq!(layout.row_sets[0].0, "lines");
        assert_eq!(layout.row_sets[0].1.len(), 2);
    }

    #[test]
    fn test_row_headers_cover_optional_fields() {
        let rows = vec![
            json!({ "id": "1", "amount": "10" }),
            json!({ "id": "2", "territory": "Norte", "amount": "20" }),
        ];
        let mut headers = row_headers(&rows);
        // Optional column appears once, after the columns of the first row
        assert_eq!(headers.last(), Some(&"territory"));
        headers.sort_unstable();
        assert_eq!(headers, vec!["amount", "id", "territory"]);
    }

    #[test]
    fn test_cells() {
        assert_eq!(cell(&json!("1.10")), "1.10");
        assert_eq!(cell(&json!(null)), "");
        assert_eq!(cell(&json!(["a", "b"])), "a, b");
        assert_eq!(cell(&json!({ "Bracket": 2 })), r#"{"Bracket":2}"#);
    }

    #[test]
    fn test_body_unwraps_envelope() {
        let envelope = json!({ "result": { "factor": "1.1" }, "warnings": [] });
        assert_eq!(body(&envelope), &json!({ "factor": "1.1" }));
        let bare = json!({ "factor": "0.9" });
        assert_eq!(body(&bare), &bare);
    }
}
