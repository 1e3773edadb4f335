// Result formatting: either one userId per line or a fixed-width table.

use crate::api::{FieldValue, Row};
use std::fmt;
use std::io::{self, Write};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputMode {
    /// Only the `userId` of each row.
    Ids,
    Table,
}

struct Column {
    field: &'static str,
    width: usize,
    dash_if_empty: bool,
}

const COLUMNS: [Column; 7] = [
    Column { field: "phoneNumber", width: 14, dash_if_empty: false },
    Column { field: "userId", width: 10, dash_if_empty: false },
    Column { field: "fullName", width: 24, dash_if_empty: false },
    Column { field: "countryId", width: 4, dash_if_empty: true },
    Column { field: "companyId", width: 6, dash_if_empty: true },
    Column { field: "email", width: 54, dash_if_empty: false },
    Column { field: "companyName", width: 32, dash_if_empty: true },
];

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Absent => Ok(()),
            FieldValue::Text(s) => f.write_str(s),
            FieldValue::Integer(i) => write!(f, "{i}"),
            FieldValue::Float(x) => write!(f, "{x}"),
        }
    }
}

pub fn write_rows<W: Write>(out: &mut W, rows: &[Row], mode: OutputMode) -> io::Result<()> {
    for row in rows {
        write_row(out, row, mode)?;
    }
    Ok(())
}

pub fn write_row<W: Write>(out: &mut W, row: &Row, mode: OutputMode) -> io::Result<()> {
    match mode {
        OutputMode::Ids => writeln!(out, "{}", row.get("userId")),
        OutputMode::Table => writeln!(out, "{}", table_line(row)),
    }
}

/// The seven table columns concatenated, each right-padded to its width.
pub fn table_line(row: &Row) -> String {
    COLUMNS
        .iter()
        .map(|col| {
            let value = row.get(col.field);
            let text = if col.dash_if_empty {
                or_dash(value)
            } else {
                value.to_string()
            };
            pad_right(&text, col.width)
        })
        .collect()
}

/// Trimmed text of the value, or `-` when there is nothing to show.
fn or_dash(value: &FieldValue) -> String {
    let text = value.to_string();
    let text = text.trim();
    if text.is_empty() {
        "-".to_string()
    } else {
        text.to_string()
    }
}

/// Pad with spaces up to `width`. Longer values are left as they are.
pub fn pad_right(s: &str, width: usize) -> String {
    let len = s.chars().count();
    if len >= width {
        return s.to_string();
    }
    format!("{s}{}", " ".repeat(width - len))
}
