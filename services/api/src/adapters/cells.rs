//! services/api/src/adapters/cells.rs
//!
//! Reads loosely-typed spreadsheet cells. Shared by the workbook adapter and
//! the wire protocol, since the remote script forwards raw cell values.

use journey_core::domain::parse_leading_int;
use serde_json::Value;

/// Renders one spreadsheet cell as text. Numbers lose a trailing `.0`.
pub fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => match n.as_f64() {
            Some(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", f as i64),
            _ => n.to_string(),
        },
        other => other.to_string(),
    }
}

/// Milestone step numbers are not clamped; unreadable or negative values become `0`.
pub fn milestone_step(text: &str) -> u32 {
    parse_leading_int(text)
        .and_then(|n| u32::try_from(n).ok())
        .unwrap_or(0)
}
