//! Attachment references embedded in message text.
//!
//! The Messages store marks an inline attachment with U+FFFC OBJECT
//! REPLACEMENT CHARACTER inside `message.text`. The extraction query packs
//! `mime_type;filename;` in front of such texts (`;;` when no image is
//! attached) so that the reference travels in the same cell as the text.

/// The sentinel marking an inline attachment (UTF-8 `EF BF BC`).
pub const SENTINEL: char = '\u{FFFC}';

/// Reference decoded from the text preceding the sentinel.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct AttachmentReference {
    /// MIME type recorded for the attachment (e.g. `"image/jpeg"`).
    pub mime_type: String,
    /// Path as stored on the device, e.g. `~/Library/SMS/Attachments/...`.
    pub relative_path: String,
    /// Message text that preceded the sentinel in the original record.
    pub trailing_text: String,
}

impl AttachmentReference {
    /// No mime type and no path: the query's tag for a marker with no
    /// image attachment behind it.
    pub fn is_empty(&self) -> bool {
        self.mime_type.is_empty() && self.relative_path.is_empty()
    }

    /// The stored path without its two-character home prefix (`~/`), i.e.
    /// the path relative to the `MediaDomain` root.
    pub fn domain_path(&self) -> &str {
        let cut = self
            .relative_path
            .char_indices()
            .nth(2)
            .map_or(self.relative_path.len(), |(i, _)| i);
        &self.relative_path[cut..]
    }
}

/// Attachment bytes read from the backup container.
#[derive(Clone, PartialEq, Eq)]
pub struct ResolvedAttachment {
    /// MIME type recorded in the Messages store (e.g. `"image/jpeg"`).
    pub mime_type: String,
    /// Raw file bytes read from the backup.
    pub content: Vec<u8>,
}

impl std::fmt::Debug for ResolvedAttachment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedAttachment")
            .field("mime_type", &self.mime_type)
            .field("len", &self.content.len())
            .finish()
    }
}

/// A message text split around its attachment marker.
///
/// Display order is `before`, then the attachment (when `has_marker`),
/// then `after`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodedMessage {
    pub before: String,
    pub has_marker: bool,
    pub after: String,
    pub reference: Option<AttachmentReference>,
    /// The attachment was sent after the text rather than before it.
    pub image_appended_at_end: bool,
}

impl DecodedMessage {
    /// A message with no attachment marker.
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            before: text.into(),
            ..Self::default()
        }
    }

    /// Text with the sentinel standing in for the attachment.
    pub fn display_text(&self) -> String {
        self.display_with(&SENTINEL.to_string())
    }

    /// Text with `placeholder` standing in for the attachment.
    pub fn display_with(&self, placeholder: &str) -> String {
        let mut out = String::with_capacity(self.before.len() + self.after.len() + 4);
        out.push_str(&self.before);
        if self.has_marker {
            out.push_str(placeholder);
        }
        out.push_str(&self.after);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentinel_utf8_bytes() {
        let mut buf = [0u8; 4];
        assert_eq!(SENTINEL.encode_utf8(&mut buf).as_bytes(), &[0xEF, 0xBF, 0xBC]);
    }

    #[test]
    fn test_display_order() {
        let msg = DecodedMessage {
            before: "look: ".into(),
            has_marker: true,
            after: " nice".into(),
            reference: None,
            image_appended_at_end: true,
        };
        assert_eq!(msg.display_with("[img]"), "look: [img] nice");
        assert_eq!(msg.display_text(), "look: \u{FFFC} nice");
    }

    #[test]
    fn test_plain_has_no_placeholder() {
        assert_eq!(DecodedMessage::plain("hi").display_with("[img]"), "hi");
    }
}
