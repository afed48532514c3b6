//! Result assembly: header + post-processed body rows → [`Table`].
//!
//! Nothing here filters or reorders rows; each step maps rows one-to-one.

use crate::error::Result;
use crate::model::table::{Cell, MessageCell, Row, Table};
use crate::parser::attachment;
use crate::store::BackupContainer;

/// Merge a header and body rows into a table.
pub fn assemble(
    title: impl Into<String>,
    headers: &[&str],
    rows: Vec<Row>,
    annotation: Option<String>,
) -> Table {
    let mut table = Table::new(title, headers).with_annotation(annotation);
    table.rows.extend(rows);
    table
}

/// Replace the text cell at `column` with its decoded form.
///
/// With `backup`, attachment references are resolved to their bytes; a
/// reference whose file is not in the backup stays unresolved.
pub fn decode_messages(
    rows: Vec<Row>,
    column: usize,
    backup: Option<&BackupContainer>,
) -> Result<Vec<Row>> {
    rows.into_iter()
        .map(|mut row| {
            if let Some(cell) = row.get_mut(column) {
                *cell = decode_cell(cell, backup)?;
            }
            Ok(row)
        })
        .collect()
}

fn decode_cell(cell: &Cell, backup: Option<&BackupContainer>) -> Result<Cell> {
    let raw = match cell {
        Cell::Text(s) => s.as_str(),
        Cell::Null => "",
        other => return Ok(other.clone()),
    };
    let message = attachment::decode(raw);
    let attachment = match (&message.reference, backup) {
        (Some(reference), Some(backup)) => backup.locate(reference)?,
        _ => None,
    };
    Ok(Cell::Message(Box::new(MessageCell {
        message,
        attachment,
    })))
}

/// Insert a column right after `after`, filled by `value` from each row.
pub fn insert_column<F>(rows: Vec<Row>, after: usize, mut value: F) -> Result<Vec<Row>>
where
    F: FnMut(&Row) -> Result<Cell>,
{
    rows.into_iter()
        .map(|mut row| {
            let cell = value(&row)?;
            let at = (after + 1).min(row.len());
            row.insert(at, cell);
            Ok(row)
        })
        .collect()
}

/// `People involved in the conversation (from Address Book): ...`
pub fn participants_annotation(people: &[(String, Option<String>)]) -> String {
    let list = people
        .iter()
        .map(|(id, name)| match name {
            Some(name) => format!("{name} ({id})"),
            None => id.clone(),
        })
        .collect::<Vec<_>>()
        .join(", ");
    format!("People involved in the conversation (from Address Book): {list}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assemble_header_first() {
        let rows = vec![vec![Cell::Integer(1)], vec![Cell::Integer(2)]];
        let table = assemble("T", &["ID"], rows, None);
        assert_eq!(table.rows.len(), 3);
        assert_eq!(table.header()[0], Cell::text("ID"));
        assert_eq!(table.body()[1][0], Cell::Integer(2));
    }

    #[test]
    fn test_decode_messages_without_backup() {
        let rows = vec![
            vec![Cell::Integer(1), Cell::text("plain")],
            vec![Cell::Integer(2), Cell::text("image/png;~/a.png;\u{FFFC}hi")],
            vec![Cell::Integer(3), Cell::Null],
        ];
        let rows = decode_messages(rows, 1, None).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0][1].to_plain(), "plain");
        match &rows[1][1] {
            Cell::Message(m) => {
                assert!(m.message.reference.is_some());
                assert!(m.attachment.is_none());
                assert_eq!(m.message.display_with("[x]"), "[x]hi");
            }
            other => panic!("expected message cell, got {other:?}"),
        }
        assert_eq!(rows[2][1].to_plain(), "");
        assert_eq!(rows[0][0], Cell::Integer(1));
    }

    #[test]
    fn test_decode_messages_resolves_from_backup() {
        let dir = tempfile::tempdir().unwrap();
        let key = crate::store::backup::content_key("MediaDomain", "a.png");
        std::fs::write(dir.path().join(key), b"PNG").unwrap();
        let backup = BackupContainer::open(dir.path()).unwrap();

        let rows = vec![vec![Cell::text("image/png;~/a.png;\u{FFFC}")]];
        let rows = decode_messages(rows, 0, Some(&backup)).unwrap();
        match &rows[0][0] {
            Cell::Message(m) => {
                let att = m.attachment.as_ref().expect("resolved");
                assert_eq!(att.content, b"PNG");
                assert_eq!(att.mime_type, "image/png");
            }
            other => panic!("expected message cell, got {other:?}"),
        }
    }

    #[test]
    fn test_insert_column() {
        let rows = vec![vec![Cell::Integer(1), Cell::text("a"), Cell::text("SMS")]];
        let rows = insert_column(rows, 1, |row| Ok(Cell::text(format!("name-{}", row[1])))).unwrap();
        assert_eq!(rows[0].len(), 4);
        assert_eq!(rows[0][2], Cell::text("name-a"));
        assert_eq!(rows[0][3], Cell::text("SMS"));
    }

    #[test]
    fn test_participants_annotation() {
        let people = vec![
            ("+12025550143".to_string(), Some("Dave".to_string())),
            ("x@example.com".to_string(), None),
        ];
        assert_eq!(
            participants_annotation(&people),
            "People involved in the conversation (from Address Book): \
             Dave (+12025550143), x@example.com"
        );
    }
}
