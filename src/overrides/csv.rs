//! CSV exchange format for overrides.
//!
//! `ContentType,Property,OverrideType,Language,Value`, one row per override.
//! Fields containing a comma, a quote or a line break are quoted with inner
//! quotes doubled. Quoted fields may span lines.

use crate::error::{LocalizationError, Result};
use serde::Serialize;
use std::borrow::Cow;
use tracing::warn;

pub const CSV_HEADER: &str = "ContentType,Property,OverrideType,Language,Value";

const FIELD_COUNT: usize = 5;

/// One flattened override, as exported and imported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OverrideRow {
    pub content_type: String,
    pub property: String,
    /// `Caption`, `HelpText` or `Unknown`
    pub override_type: String,
    pub language: String,
    pub value: String,
}

impl OverrideRow {
    fn fields(&self) -> [&str; FIELD_COUNT] {
        [
            &self.content_type,
            &self.property,
            &self.override_type,
            &self.language,
            &self.value,
        ]
    }
}

/// Quote a field when it contains a separator, a quote or a line break.
pub fn escape_field(value: &str) -> Cow<'_, str> {
    if value.contains([',', '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", value.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(value)
    }
}

/// Header line followed by one line per row.
pub fn to_csv(rows: &[OverrideRow]) -> String {
    let mut csv = String::new();
    csv.push_str(CSV_HEADER);
    csv.push('\n');

    for row in rows {
        let line = row
            .fields()
            .iter()
            .map(|field| escape_field(field))
            .collect::<Vec<_>>()
            .join(",");
        csv.push_str(&line);
        csv.push('\n');
    }

    csv
}

/// Parse CSV content into rows.
///
/// The first record is the header and is skipped. Blank lines are ignored.
/// Records with fewer than five fields are skipped with a warning; extra
/// fields are ignored.
///
/// # Errors
/// `InvalidArgument` when a quoted field is never closed.
pub fn parse_csv(content: &str) -> Result<Vec<OverrideRow>> {
    let records = split_records(content)?;

    let mut rows = Vec::new();
    for (index, fields) in records.into_iter().enumerate().skip(1) {
        if fields.len() == 1 && fields[0].is_empty() {
            continue;
        }
        if fields.len() < FIELD_COUNT {
            warn!("Skipping CSV record {}: expected {} fields, found {}", index + 1, FIELD_COUNT, fields.len());
            continue;
        }

        let mut fields = fields.into_iter();
        let mut next = || fields.next().unwrap_or_default();
        rows.push(OverrideRow {
            content_type: next(),
            property: next(),
            override_type: next(),
            language: next(),
            value: next(),
        });
    }

    Ok(rows)
}

/// Split content into records of unescaped fields.
fn split_records(content: &str) -> Result<Vec<Vec<String>>> {
    let mut records = Vec::new();
    let mut record = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = content.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    field.push('"');
                    chars.next();
                }
                '"' => in_quotes = false,
                _ => field.push(c),
            }
            continue;
        }

        match c {
            '"' => in_quotes = true,
            ',' => record.push(std::mem::take(&mut field)),
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' | '\r' => {
                record.push(std::mem::take(&mut field));
                records.push(std::mem::take(&mut record));
            }
            _ => field.push(c),
        }
    }

    if in_quotes {
        return Err(LocalizationError::InvalidArgument(
            "CSV content ends inside a quoted field".to_string(),
        ));
    }

    if !field.is_empty() || !record.is_empty() {
        record.push(field);
        records.push(record);
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(value: &str) -> OverrideRow {
        OverrideRow {
            content_type: "StandardPage".to_string(),
            property: "mainbody".to_string(),
            override_type: "Caption".to_string(),
            language: "en".to_string(),
            value: value.to_string(),
        }
    }

    // ==================== Escape Tests ====================

    #[test]
    fn test_escape_plain_value_untouched() {
        assert_eq!(escape_field("Body"), "Body");
        assert_eq!(escape_field(""), "");
    }

    #[test]
    fn test_escape_comma_and_quote() {
        assert_eq!(escape_field("a,b"), "\"a,b\"");
        assert_eq!(escape_field("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(escape_field("line\nbreak"), "\"line\nbreak\"");
    }

    // ==================== Write Tests ====================

    #[test]
    fn test_to_csv_header_and_rows() {
        let csv = to_csv(&[row("Body")]);
        assert_eq!(csv, "ContentType,Property,OverrideType,Language,Value\nStandardPage,mainbody,Caption,en,Body\n");
    }

    #[test]
    fn test_to_csv_empty() {
        assert_eq!(to_csv(&[]), format!("{}\n", CSV_HEADER));
    }

    // ==================== Parse Tests ====================

    #[test]
    fn test_parse_skips_header() {
        let rows = parse_csv("ContentType,Property,OverrideType,Language,Value\n,heading,HelpText,sv,Rubrik\n").unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].content_type, "");
        assert_eq!(rows[0].property, "heading");
        assert_eq!(rows[0].override_type, "HelpText");
        assert_eq!(rows[0].value, "Rubrik");
    }

    #[test]
    fn test_parse_quoted_fields() {
        let rows = parse_csv("h\r\nA,b,Caption,en,\"x, \"\"y\"\"\"\r\n").unwrap();
        assert_eq!(rows[0].value, "x, \"y\"");
    }

    #[test]
    fn test_parse_newline_inside_quotes() {
        let rows = parse_csv("h\nA,b,Caption,en,\"first\nsecond\"\nC,d,Caption,en,z").unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].value, "first\nsecond");
        assert_eq!(rows[1].value, "z");
    }

    #[test]
    fn test_parse_skips_short_and_blank_records() {
        let rows = parse_csv("h\n\nA,b,Caption\nA,b,Caption,en,ok,extra\n").unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].value, "ok");
    }

    #[test]
    fn test_parse_unterminated_quote() {
        assert!(parse_csv("h\nA,b,Caption,en,\"open").is_err());
    }

    #[test]
    fn test_round_trip_special_characters() {
        let original = vec![row("Body, \"main\" text"), row("multi\nline"), row("")];
        let parsed = parse_csv(&to_csv(&original)).unwrap();
        assert_eq!(parsed, original);
    }
}
