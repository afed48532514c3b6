//! Plain-text table for the terminal.
//!
//! Columns are word-wrapped at a fixed display width (East Asian wide
//! characters count as two columns) and drawn with ASCII borders.

use std::io::Write;

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::error::Result;
use crate::model::table::Table;

use super::Renderer;

pub struct TextTableRenderer {
    pub wrap_width: usize,
}

impl Renderer for TextTableRenderer {
    fn render(&self, table: &Table, out: &mut dyn Write) -> Result<()> {
        writeln!(out, "{}", table.title)?;
        if let Some(annotation) = &table.annotation {
            writeln!(out, "{annotation}")?;
        }

        let cells: Vec<Vec<Vec<String>>> = table
            .rows
            .iter()
            .map(|row| {
                row.iter()
                    .map(|cell| wrap(&cell.to_plain(), self.wrap_width))
                    .collect()
            })
            .collect();

        let columns = cells.iter().map(Vec::len).max().unwrap_or(0);
        let mut widths = vec![0usize; columns];
        for row in &cells {
            for (i, lines) in row.iter().enumerate() {
                for line in lines {
                    widths[i] = widths[i].max(line.width());
                }
            }
        }

        let border = border_line(&widths, '-');
        writeln!(out, "{border}")?;
        for (n, row) in cells.iter().enumerate() {
            let height = row.iter().map(Vec::len).max().unwrap_or(1);
            for line_no in 0..height {
                let mut line = String::from("|");
                for (i, width) in widths.iter().enumerate() {
                    let text = row
                        .get(i)
                        .and_then(|lines| lines.get(line_no))
                        .map(String::as_str)
                        .unwrap_or("");
                    line.push(' ');
                    line.push_str(text);
                    line.push_str(&" ".repeat(width - text.width()));
                    line.push_str(" |");
                }
                writeln!(out, "{line}")?;
            }
            if n == 0 {
                writeln!(out, "{}", border_line(&widths, '='))?;
            } else {
                writeln!(out, "{border}")?;
            }
        }
        writeln!(out)?;
        Ok(())
    }
}

fn border_line(widths: &[usize], fill: char) -> String {
    let mut line = String::from("+");
    for width in widths {
        line.extend(std::iter::repeat_n(fill, width + 2));
        line.push('+');
    }
    line
}

/// Word-wrap `text` to lines of at most `width` display columns.
///
/// Embedded newlines are kept as line breaks; words longer than `width`
/// are split.
pub fn wrap(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();

    for paragraph in text.split('\n') {
        let mut line = String::new();
        let mut line_width = 0;

        for word in paragraph.split_whitespace() {
            let word_width = word.width();
            if line_width > 0 && line_width + 1 + word_width > width {
                lines.push(std::mem::take(&mut line));
                line_width = 0;
            }

            if word_width > width {
                for ch in word.chars() {
                    let ch_width = ch.width().unwrap_or(0);
                    if line_width > 0 && line_width + ch_width > width {
                        lines.push(std::mem::take(&mut line));
                        line_width = 0;
                    }
                    line.push(ch);
                    line_width += ch_width;
                }
                continue;
            }

            if line_width > 0 {
                line.push(' ');
                line_width += 1;
            }
            line.push_str(word);
            line_width += word_width;
        }
        lines.push(line);
    }

    lines
}
