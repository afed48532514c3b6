//! Renderers: plain-text table, HTML, CSV and JSON.
//!
//! Every renderer consumes the same [`Table`]; none of them reorders or
//! filters rows.

pub mod csv;
pub mod html;
pub mod json;
pub mod table;

use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use sha2::{Digest, Sha256};
use tracing::info;

use crate::config::ExportConfig;
use crate::error::{EvidenceError, Result};
use crate::model::table::Table;

/// Writes a table to an output stream.
pub trait Renderer {
    fn render(&self, table: &Table, out: &mut dyn Write) -> Result<()>;
}

/// Report formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Wrapped text table on standard output.
    Stdout,
    Html,
    Csv,
    Json,
}

impl OutputFormat {
    pub const ALL: [OutputFormat; 4] = [Self::Stdout, Self::Html, Self::Csv, Self::Json];

    pub fn name(self) -> &'static str {
        match self {
            Self::Stdout => "stdout",
            Self::Html => "html",
            Self::Csv => "csv",
            Self::Json => "json",
        }
    }

    /// Report file extension; `None` for formats printed to stdout.
    pub fn extension(self) -> Option<&'static str> {
        match self {
            Self::Stdout => None,
            Self::Html => Some("html"),
            Self::Csv => Some("csv"),
            Self::Json => Some("json"),
        }
    }

    /// Whether the format shows attachment content, so the engine should
    /// read it out of the backup.
    pub fn embeds_attachments(self) -> bool {
        self == Self::Html
    }

    pub fn renderer(self, config: &ExportConfig) -> Box<dyn Renderer> {
        match self {
            Self::Stdout => Box::new(table::TextTableRenderer {
                wrap_width: config.wrap_width,
            }),
            Self::Html => Box::new(html::HtmlRenderer {
                image_max_px: config.image_max_px,
            }),
            Self::Csv => Box::new(csv::CsvRenderer {
                separator: config.csv_separator,
            }),
            Self::Json => Box::new(json::JsonRenderer),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for OutputFormat {
    type Err = EvidenceError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("table") {
            return Ok(Self::Stdout);
        }
        Self::ALL
            .into_iter()
            .find(|f| f.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| EvidenceError::InvalidOptionValue {
                name: "format".to_string(),
                reason: format!("unknown format '{s}' (expected stdout, html, csv or json)"),
            })
    }
}

/// Path of a report file: `<dir>/<prefix><suffix>.<ext>`.
pub fn report_path(dir: &Path, prefix: &str, suffix: &str, format: OutputFormat) -> PathBuf {
    let stem = sanitize_filename_part(&format!("{prefix}{suffix}"), 120);
    match format.extension() {
        Some(ext) => dir.join(format!("{stem}.{ext}")),
        None => dir.join(stem),
    }
}

/// Render `table` into a new file at `path`, creating parent directories.
pub fn write_report(table: &Table, renderer: &dyn Renderer, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| EvidenceError::io(parent, e))?;
    }
    let file = File::create(path).map_err(|e| EvidenceError::io(path, e))?;
    let mut out = BufWriter::new(file);
    renderer.render(table, &mut out)?;
    out.flush().map_err(|e| EvidenceError::io(path, e))?;
    info!(path = %path.display(), title = %table.title, "Wrote report");
    Ok(())
}

/// SHA-256 (lowercase hex) and size in bytes of a written report.
pub fn file_digest(path: &Path) -> Result<(String, u64)> {
    let bytes = std::fs::read(path).map_err(|e| EvidenceError::io(path, e))?;
    let digest = Sha256::digest(&bytes);
    Ok((hex::encode(digest), bytes.len() as u64))
}

/// Sanitize a string for use in filenames.
///
/// Replaces invalid characters with `_` and truncates to `max_len`.
pub fn sanitize_filename_part(s: &str, max_len: usize) -> String {
    let sanitized: String = s
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '.' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .take(max_len)
        .collect();

    if sanitized.is_empty() {
        "report".to_string()
    } else {
        sanitized
    }
}
