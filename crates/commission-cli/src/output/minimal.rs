use commission_core::round_money;
use rust_decimal::Decimal;
use serde_json::Value;

use super::{body, cell};

/// Single-value answers, checked in order after the batch and summary totals.
const ANSWER_KEYS: [&str; 3] = ["payment_date", "factor", "valid"];

/// Print just the key answer of a command: the total payable of a processed
/// batch, the grand total of a summary, a payment date, a factor or a
/// validation verdict. Lists print one answer per row.
pub fn print_minimal(value: &Value) {
    match body(value) {
        Value::Array(rows) => {
            for row in rows {
                println!("{}", answer(row));
            }
        }
        payload => println!("{}", answer(payload)),
    }
}

fn answer(payload: &Value) -> String {
    if let Some(total) = batch_total(payload) {
        return total.to_string();
    }
    payload
        .pointer("/breakdown/grand_total")
        .or_else(|| {
            ANSWER_KEYS
                .iter()
                .find_map(|key| payload.get(*key).filter(|v| !v.is_null()))
        })
        .map(cell)
        .unwrap_or_else(|| cell(payload))
}

/// Sum of `final_commission_amount` over the records plus the volume bonus.
fn batch_total(result: &Value) -> Option<Decimal> {
    let records = result.get("records")?.as_array()?;
    let mut total = parse_decimal(result.get("volume_bonus")?)?;
    for record in records {
        total = total.checked_add(parse_decimal(record.get("final_commission_amount")?)?)?;
    }
    Some(round_money(total))
}

fn parse_decimal(value: &Value) -> Option<Decimal> {
    match value {
        Value::String(s) => s.parse().ok(),
        Value::Number(n) => n.to_string().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn test_batch_total_includes_volume_bonus() {
        let result = json!({
            "records": [
                { "final_commission_amount": "1242.5" },
                { "final_commission_amount": "990.004" }
            ],
            "volume_bonus": "1500"
        });
        assert_eq!(batch_total(&result), Some(dec!(3732.50)));
    }

    #[test]
    fn test_non_batch_result_has_no_total() {
        let result = json!({ "factor": "1.1" });
        assert_eq!(batch_total(&result), None);
    }

    #[test]
    fn test_answers() {
        let summary = json!({ "invoice_count": 1, "breakdown": { "grand_total": "100.00" } });
        assert_eq!(answer(&summary), "100.00");

        let schedule = json!({ "invoice_date": "2024-01-20", "payment_date": "2024-04-15" });
        assert_eq!(answer(&schedule), "2024-04-15");

        let verdict = json!({ "valid": true, "warnings": [] });
        assert_eq!(answer(&verdict), "true");
    }
}
