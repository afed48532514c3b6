//! Conversation queries over `sms.db`.

use rusqlite::types::Value;

use crate::filter::parse::ConversationListFilter;

use super::CompiledQuery;

/// Header of the conversation list (without the optional `Name` column).
pub const CONVERSATION_HEADERS: [&str; 3] = ["ID", "Phone Number / Email Address", "Service"];

/// Chat id, participant handle and service for every chat participant.
///
/// A service filter is compared case-insensitively; with no filter the
/// predicate is left out entirely.
pub fn conversation_list(filter: &ConversationListFilter) -> CompiledQuery {
    let mut sql = String::from(
        "SELECT c.ROWID, h.id, h.service \
         FROM chat c \
         JOIN chat_handle_join chj ON chj.chat_id = c.ROWID \
         JOIN handle h ON h.ROWID = chj.handle_id",
    );
    let mut params = Vec::new();

    if let Some(service) = &filter.service {
        sql.push_str(" WHERE h.service = ? COLLATE NOCASE");
        params.push(Value::Text(service.clone()));
    }

    sql.push_str(" ORDER BY c.ROWID, h.ROWID");
    CompiledQuery::new(sql, params)
}

/// Handle ids (phone numbers / e-mail addresses) taking part in one chat.
pub fn participants(conversation_id: i64) -> CompiledQuery {
    CompiledQuery::new(
        "SELECT h.id \
         FROM chat_handle_join chj \
         JOIN handle h ON h.ROWID = chj.handle_id \
         WHERE chj.chat_id = ? \
         ORDER BY h.ROWID"
            .to_string(),
        vec![Value::Integer(conversation_id)],
    )
}
