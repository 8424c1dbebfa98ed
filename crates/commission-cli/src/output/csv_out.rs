use serde_json::Value;
use std::io;

use super::{body, cell, layout, row_headers};

type CsvWriter<'a> = csv::Writer<io::StdoutLock<'a>>;

/// Write output as CSV to stdout: one row per commission record (`process`),
/// per business line (`summary`) or per date (`payment-date`), and a
/// field/value listing for single answers.
pub fn print_csv(value: &Value) {
    let mut wtr = csv::Writer::from_writer(io::stdout().lock());

    let written = match body(value) {
        Value::Array(rows) => write_rows(&mut wtr, rows),
        Value::Object(map) => {
            let layout = layout(map);
            match layout.row_sets.first() {
                Some((_, rows)) => write_rows(&mut wtr, rows),
                None => write_fields(&mut wtr, &layout.fields),
            }
        }
        other => wtr.write_record([cell(other)]),
    };

    if let Err(e) = written.and_then(|_| wtr.flush().map_err(csv::Error::from)) {
        eprintln!("CSV output error: {}", e);
    }
}

fn write_rows(wtr: &mut CsvWriter<'_>, rows: &[Value]) -> csv::Result<()> {
    let headers = row_headers(rows);
    if headers.is_empty() {
        return Ok(());
    }
    wtr.write_record(&headers)?;
    for row in rows {
        wtr.write_record(
            headers
                .iter()
                .map(|h| row.get(*h).map(cell).unwrap_or_default()),
        )?;
    }
    Ok(())
}

fn write_fields(wtr: &mut CsvWriter<'_>, fields: &[(String, &Value)]) -> csv::Result<()> {
    wtr.write_record(["field", "value"])?;
    for (name, val) in fields {
        wtr.write_record([name.as_str(), cell(val).as_str()])?;
    }
    Ok(())
}
