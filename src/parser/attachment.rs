//! Decoding of attachment references packed into message text.
//!
//! A text cell produced by the message-extraction query looks like one of:
//!
//! - `hello` : no attachment.
//! - `\u{FFFC}caption` : a marker whose reference could not be recovered.
//! - `;;text\u{FFFC}` : a marker with no image attachment behind it (a PDF,
//!   a contact card, audio). The empty fields keep `text` out of the
//!   reference slots even when it contains semicolons.
//! - `image/jpeg;~/Library/SMS/Attachments/ab/12/IMG_1.jpeg;\u{FFFC}caption`
//!   : the image was sent first, then `caption`.
//! - `image/jpeg;~/Library/.../IMG_1.jpeg;look at this\u{FFFC}` : the text
//!   `look at this` came first and the image was appended at the end.
//!
//! The text before the marker is split on the first two `;` only, so the
//! original message text may itself contain semicolons.
//!
//! Splitting happens on the marker's exact UTF-8 encoding (`EF BF BC`), so
//! multi-byte text on either side is never cut mid-character.

use crate::model::attachment::{AttachmentReference, DecodedMessage, SENTINEL};

/// Decode a raw message text cell.
///
/// Only the first marker is interpreted; anything after it, including a
/// second marker, is ordinary text.
pub fn decode(raw: &str) -> DecodedMessage {
    let Some((prefix, suffix)) = raw.split_once(SENTINEL) else {
        return DecodedMessage::plain(raw);
    };

    match parse_reference(prefix) {
        Some(reference) if reference.is_empty() => DecodedMessage {
            before: reference.trailing_text,
            has_marker: true,
            after: suffix.to_string(),
            reference: None,
            image_appended_at_end: false,
        },
        Some(reference) if !reference.trailing_text.is_empty() => DecodedMessage {
            before: reference.trailing_text.clone(),
            has_marker: true,
            after: suffix.to_string(),
            reference: Some(reference),
            image_appended_at_end: true,
        },
        Some(reference) => DecodedMessage {
            before: String::new(),
            has_marker: true,
            after: suffix.to_string(),
            reference: Some(reference),
            image_appended_at_end: false,
        },
        // Either an empty prefix (bare marker) or text the query did not tag
        // with a reference: keep it in place ahead of the marker.
        None => DecodedMessage {
            before: prefix.to_string(),
            has_marker: true,
            after: suffix.to_string(),
            reference: None,
            image_appended_at_end: false,
        },
    }
}

/// Parse `mime_type;relative_path;trailing_text`.
///
/// Returns `None` for an empty prefix or one without both separators.
fn parse_reference(prefix: &str) -> Option<AttachmentReference> {
    if prefix.is_empty() {
        return None;
    }
    let mut fields = prefix.splitn(3, ';');
    let mime_type = fields.next()?;
    let relative_path = fields.next()?;
    let trailing_text = fields.next()?;
    Some(AttachmentReference {
        mime_type: mime_type.to_string(),
        relative_path: relative_path.to_string(),
        trailing_text: trailing_text.to_string(),
    })
}
