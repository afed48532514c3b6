//! Tabular evidence model shared by every renderer.

use std::fmt;

use serde::ser::{Serialize, Serializer};

use super::attachment::{DecodedMessage, ResolvedAttachment};

/// A message text cell after attachment decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageCell {
    pub message: DecodedMessage,
    /// Attachment bytes, when resolution was requested and the backup has them.
    pub attachment: Option<ResolvedAttachment>,
}

/// One scalar cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cell {
    Null,
    Integer(i64),
    Text(String),
    Message(Box<MessageCell>),
}

impl Cell {
    pub fn text(s: impl Into<String>) -> Self {
        Self::Text(s.into())
    }

    /// Plain-text rendition: NULL is empty, messages show the sentinel.
    pub fn to_plain(&self) -> String {
        match self {
            Self::Null => String::new(),
            Self::Integer(n) => n.to_string(),
            Self::Text(s) => s.clone(),
            Self::Message(m) => m.message.display_text(),
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_plain())
    }
}

impl Serialize for Cell {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_none(),
            Self::Integer(n) => serializer.serialize_i64(*n),
            Self::Text(s) => serializer.serialize_str(s),
            Self::Message(m) => serializer.serialize_str(&m.message.display_text()),
        }
    }
}

/// An ordered sequence of cells.
pub type Row = Vec<Cell>;

/// A titled table whose first row is the header.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Table {
    pub title: String,
    /// Free-text block shown under the title (e.g. conversation participants).
    pub annotation: Option<String>,
    pub rows: Vec<Row>,
}

impl Table {
    /// Create a table holding only the header row.
    pub fn new(title: impl Into<String>, header: &[&str]) -> Self {
        Self {
            title: title.into(),
            annotation: None,
            rows: vec![header.iter().map(|h| Cell::text(*h)).collect()],
        }
    }

    pub fn with_annotation(mut self, annotation: Option<String>) -> Self {
        self.annotation = annotation;
        self
    }

    pub fn header(&self) -> &[Cell] {
        self.rows.first().map(Vec::as_slice).unwrap_or(&[])
    }

    /// Rows after the header.
    pub fn body(&self) -> &[Row] {
        self.rows.get(1..).unwrap_or(&[])
    }

    pub fn push(&mut self, row: Row) {
        self.rows.push(row);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_first() {
        let mut t = Table::new("Contacts", &["ID", "Name"]);
        t.push(vec![Cell::Integer(1), Cell::text("Alice")]);
        assert_eq!(t.header()[1].to_plain(), "Name");
        assert_eq!(t.body().len(), 1);
    }

    #[test]
    fn test_serialize_cells() {
        let row = vec![Cell::Null, Cell::Integer(7), Cell::text("x")];
        let json = serde_json::to_string(&row).unwrap();
        assert_eq!(json, r#"[null,7,"x"]"#);
    }
}
