use serde_json::Value;
use tabled::{builder::Builder, Table};

use super::{body, cell, layout, row_headers};

/// Render a command's output as tables: one field/value table for the
/// payload, one table per list of rows, then warnings and methodology.
pub fn print_table(value: &Value) {
    match body(value) {
        Value::Array(rows) => print_rows(rows),
        Value::Object(map) => {
            let layout = layout(map);
            let mut builder = Builder::default();
            builder.push_record(["Field", "Value"]);
            for (name, val) in &layout.fields {
                builder.push_record([name.clone(), cell(val)]);
            }
            println!("{}", Table::from(builder));

            for (name, rows) in &layout.row_sets {
                println!("\n{}:", name);
                print_rows(rows);
            }
        }
        other => println!("{}", cell(other)),
    }

    if let Some(Value::Array(warnings)) = value.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings.iter().filter_map(Value::as_str) {
                println!("  - {}", w);
            }
        }
    }

    if let Some(Value::String(meth)) = value.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}

fn print_rows(rows: &[Value]) {
    if rows.is_empty() {
        println!("(no rows)");
        return;
    }

    let headers = row_headers(rows);
    let mut builder = Builder::default();
    builder.push_record(headers.iter().copied());
    for row in rows {
        builder.push_record(
            headers
                .iter()
                .map(|h| row.get(*h).map(cell).unwrap_or_default()),
        );
    }
    println!("{}", Table::from(builder));
}
