//! JSON renderer: one object per table.

use std::io::Write;

use serde::Serialize;

use crate::error::{EvidenceError, Result};
use crate::model::table::{Cell, Row, Table};

use super::Renderer;

pub struct JsonRenderer;

#[derive(Serialize)]
struct JsonTable<'a> {
    title: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    annotation: Option<&'a str>,
    header: &'a [Cell],
    rows: &'a [Row],
}

impl Renderer for JsonRenderer {
    fn render(&self, table: &Table, out: &mut dyn Write) -> Result<()> {
        let doc = JsonTable {
            title: &table.title,
            annotation: table.annotation.as_deref(),
            header: table.header(),
            rows: table.body(),
        };
        serde_json::to_writer_pretty(&mut *out, &doc)
            .map_err(|e| EvidenceError::Export(e.to_string()))?;
        out.write_all(b"\n")?;
        Ok(())
    }
}
