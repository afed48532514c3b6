//! Standalone HTML report.
//!
//! Resolved image attachments are embedded as `data:` URIs so the report is
//! a single self-contained file. An attachment that could not be resolved
//! is replaced by a bracketed note.

use std::io::Write;

use base64::Engine as _;

use crate::error::Result;
use crate::model::table::{Cell, MessageCell, Table};

use super::Renderer;

pub struct HtmlRenderer {
    pub image_max_px: u32,
}

impl Renderer for HtmlRenderer {
    fn render(&self, table: &Table, out: &mut dyn Write) -> Result<()> {
        let title = escape(&table.title);
        writeln!(out, "<!DOCTYPE html>")?;
        writeln!(out, "<html>")?;
        writeln!(out, "<head>")?;
        writeln!(out, "<meta charset=\"utf-8\">")?;
        writeln!(out, "<title>{title}</title>")?;
        writeln!(out, "</head>")?;
        writeln!(out, "<body>")?;
        writeln!(out, "<h1>{title}</h1>")?;
        if let Some(annotation) = &table.annotation {
            writeln!(out, "<h3>{}</h3>", escape(annotation))?;
        }

        writeln!(out, "<table border=\"1\">")?;
        writeln!(out, "<thead>")?;
        let header = table
            .header()
            .iter()
            .map(|c| format!("<th>{}</th>", escape(&c.to_plain())))
            .collect::<String>();
        writeln!(out, "<tr>{header}</tr>")?;
        writeln!(out, "</thead>")?;
        writeln!(out, "<tbody>")?;
        for row in table.body() {
            let cells = row
                .iter()
                .map(|c| format!("<td>{}</td>", self.cell(c)))
                .collect::<String>();
            writeln!(out, "<tr>{cells}</tr>")?;
        }
        writeln!(out, "</tbody>")?;
        writeln!(out, "</table>")?;
        writeln!(out, "</body>")?;
        writeln!(out, "</html>")?;
        Ok(())
    }
}

impl HtmlRenderer {
    fn cell(&self, cell: &Cell) -> String {
        match cell {
            Cell::Message(m) => self.message(m),
            other => text_html(&other.to_plain()),
        }
    }

    fn message(&self, cell: &MessageCell) -> String {
        let msg = &cell.message;
        let mut html = text_html(&msg.before);
        if msg.has_marker {
            html.push_str(&self.attachment(cell));
        }
        html.push_str(&text_html(&msg.after));
        html
    }

    fn attachment(&self, cell: &MessageCell) -> String {
        match (&cell.attachment, &cell.message.reference) {
            (Some(att), _) => {
                let data = base64::engine::general_purpose::STANDARD.encode(&att.content);
                format!(
                    "<br><img style=\"max-width: {px}px; max-height: {px}px;\" \
                     src=\"data:{mime};base64,{data}\"><br>",
                    px = self.image_max_px,
                    mime = escape(&att.mime_type),
                )
            }
            (None, Some(reference)) => format!(
                "<br><i>[Attachment not found in backup: {}]</i><br>",
                escape(&reference.relative_path)
            ),
            (None, None) => "<i>[Attachment]</i>".to_string(),
        }
    }
}

/// Escape text and turn newlines into `<br>`.
fn text_html(s: &str) -> String {
    escape(s).replace('\n', "<br>")
}

/// Escape the five HTML special characters.
pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::attachment::{AttachmentReference, DecodedMessage, ResolvedAttachment};

    fn render(table: &Table) -> String {
        let mut out = Vec::new();
        HtmlRenderer { image_max_px: 400 }
            .render(table, &mut out)
            .unwrap();
        String::from_utf8(out).unwrap()
    }

    fn message(attachment: Option<ResolvedAttachment>) -> Cell {
        Cell::Message(Box::new(MessageCell {
            message: DecodedMessage {
                before: "look".into(),
                has_marker: true,
                after: String::new(),
                reference: Some(AttachmentReference {
                    mime_type: "image/png".into(),
                    relative_path: "~/Library/SMS/Attachments/a.png".into(),
                    trailing_text: "look".into(),
                }),
                image_appended_at_end: true,
            },
            attachment,
        }))
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape("<b>\"A&B\"</b>"), "&lt;b&gt;&quot;A&amp;B&quot;&lt;/b&gt;");
    }

    #[test]
    fn test_title_annotation_and_cells_escaped() {
        let mut table = Table::new("Conversation ID: 5", &["ID", "Text"])
            .with_annotation(Some("People <x>".into()));
        table.push(vec![Cell::Integer(1), Cell::text("a < b\nc")]);
        let html = render(&table);
        assert!(html.contains("<h1>Conversation ID: 5</h1>"));
        assert!(html.contains("<h3>People &lt;x&gt;</h3>"));
        assert!(html.contains("<th>ID</th><th>Text</th>"));
        assert!(html.contains("<td>a &lt; b<br>c</td>"));
    }

    #[test]
    fn test_resolved_image_inlined() {
        let mut table = Table::new("T", &["Text"]);
        table.push(vec![message(Some(ResolvedAttachment {
            mime_type: "image/png".into(),
            content: b"PNG".to_vec(),
        }))]);
        let html = render(&table);
        assert!(html.contains("look<br><img style=\"max-width: 400px; max-height: 400px;\""));
        assert!(html.contains("src=\"data:image/png;base64,UE5H\""));
    }

    #[test]
    fn test_missing_image_fallback() {
        let mut table = Table::new("T", &["Text"]);
        table.push(vec![message(None)]);
        let html = render(&table);
        assert!(html.contains("[Attachment not found in backup: ~/Library/SMS/Attachments/a.png]"));
        assert!(!html.contains("<img"));
    }
}
