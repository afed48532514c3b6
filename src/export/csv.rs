//! CSV renderer.
//!
//! Output is UTF-8 with BOM for Excel compatibility. The title and
//! annotation are not part of the CSV; the header row comes first.

use std::io::Write;

use crate::error::Result;
use crate::model::table::Table;

use super::Renderer;

pub struct CsvRenderer {
    pub separator: char,
}

impl Renderer for CsvRenderer {
    fn render(&self, table: &Table, out: &mut dyn Write) -> Result<()> {
        // UTF-8 BOM for Excel
        out.write_all(&[0xEF, 0xBB, 0xBF])?;

        let sep = self.separator.to_string();
        for row in &table.rows {
            let line = row
                .iter()
                .map(|cell| csv_escape(&cell.to_plain(), self.separator))
                .collect::<Vec<_>>()
                .join(&sep);
            out.write_all(line.as_bytes())?;
            out.write_all(b"\r\n")?;
        }
        Ok(())
    }
}

/// Escape a value for CSV (RFC 4180).
///
/// Wraps in double quotes if the value contains the separator, quotes, or
/// newlines.
fn csv_escape(value: &str, separator: char) -> String {
    if value.contains(separator) || value.contains('"') || value.contains('\n') || value.contains('\r')
    {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::table::Cell;

    #[test]
    fn test_csv_escape_simple() {
        assert_eq!(csv_escape("hello", ','), "hello");
    }

    #[test]
    fn test_csv_escape_comma() {
        assert_eq!(csv_escape("hello, world", ','), "\"hello, world\"");
        assert_eq!(csv_escape("hello, world", ';'), "hello, world");
    }

    #[test]
    fn test_csv_escape_quotes() {
        assert_eq!(csv_escape("say \"hi\"", ','), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn test_csv_escape_newline() {
        assert_eq!(csv_escape("line1\nline2", ','), "\"line1\nline2\"");
    }

    #[test]
    fn test_render_rows() {
        let mut table = Table::new("Contacts", &["ID", "Name"]);
        table.push(vec![Cell::Integer(1), Cell::text("Doe, Jane")]);
        table.push(vec![Cell::Integer(2), Cell::Null]);

        let mut out = Vec::new();
        CsvRenderer { separator: ',' }.render(&table, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, "\u{FEFF}ID,Name\r\n1,\"Doe, Jane\"\r\n2,\r\n");
    }
}
