//! Filter-to-query compiler.
//!
//! Every query the engine runs against the backup's SQLite stores is built
//! here from a typed filter. Values supplied by the investigator are never
//! spliced into SQL text: they are bound as positional `?` parameters, and
//! [`CompiledQuery::params`] lists them in the order their placeholders
//! appear.

pub mod contacts;
pub mod conversations;
pub mod messages;

use rusqlite::types::Value;

use crate::filter::parse::{ContactListFilter, ConversationListFilter, MessageFilter};

pub use self::messages::{MessageColumn, TimeBasis};

/// SQL text plus its positional parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledQuery {
    pub sql: String,
    pub params: Vec<Value>,
}

impl CompiledQuery {
    fn new(sql: String, params: Vec<Value>) -> Self {
        let query = Self { sql, params };
        debug_assert_eq!(query.placeholder_count(), query.params.len(), "{}", query.sql);
        query
    }

    /// Number of `?` placeholders outside string literals.
    pub fn placeholder_count(&self) -> usize {
        let mut in_literal = false;
        let mut count = 0;
        for ch in self.sql.chars() {
            match ch {
                '\'' => in_literal = !in_literal,
                '?' if !in_literal => count += 1,
                _ => {}
            }
        }
        count
    }
}

/// What to compile.
#[derive(Debug, Clone, Copy)]
pub enum QueryKind<'a> {
    /// Every contact value with its owner's name, in contact id order.
    ContactLookup,
    /// The `contacts` module listing.
    ContactList(&'a ContactListFilter),
    /// Chats and their participants.
    ConversationList(&'a ConversationListFilter),
    /// Handles taking part in one chat.
    ConversationParticipants(i64),
    /// Messages of one chat.
    MessageExtraction {
        filter: &'a MessageFilter,
        conversation_id: i64,
        time: TimeBasis,
    },
}

/// Compile a query of the given kind.
pub fn compile(kind: QueryKind<'_>) -> CompiledQuery {
    match kind {
        QueryKind::ContactLookup => contacts::contact_lookup(),
        QueryKind::ContactList(filter) => contacts::contact_list(filter),
        QueryKind::ConversationList(filter) => conversations::conversation_list(filter),
        QueryKind::ConversationParticipants(id) => conversations::participants(id),
        QueryKind::MessageExtraction {
            filter,
            conversation_id,
            time,
        } => messages::message_extraction(filter, conversation_id, time),
    }
}

/// Wrap a keyword for substring matching with `LIKE`.
pub fn like_pattern(keyword: &str) -> String {
    format!("%{keyword}%")
}

/// Build ` AND (a LIKE ? OR b LIKE ? OR ...)` over `columns` for each
/// keyword, OR-chaining keywords. Empty `keywords` yields no clause.
fn keyword_clause(columns: &[&str], keywords: &[String]) -> (String, Vec<Value>) {
    if keywords.is_empty() {
        return (String::new(), Vec::new());
    }

    let per_keyword = columns
        .iter()
        .map(|c| format!("{c} LIKE ?"))
        .collect::<Vec<_>>()
        .join(" OR ");

    let mut params = Vec::with_capacity(keywords.len() * columns.len());
    let groups: Vec<String> = keywords
        .iter()
        .map(|k| {
            params.extend(columns.iter().map(|_| Value::Text(like_pattern(k))));
            if columns.len() == 1 {
                per_keyword.clone()
            } else {
                format!("({per_keyword})")
            }
        })
        .collect();

    (format!(" AND ({})", groups.join(" OR ")), params)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_pattern() {
        assert_eq!(like_pattern("foo"), "%foo%");
    }

    #[test]
    fn test_keyword_clause_empty() {
        let (sql, params) = keyword_clause(&["m.text"], &[]);
        assert!(sql.is_empty());
        assert!(params.is_empty());
    }

    #[test]
    fn test_keyword_clause_single_column() {
        let (sql, params) = keyword_clause(&["m.text"], &["a".into(), "b".into()]);
        assert_eq!(sql, " AND (m.text LIKE ? OR m.text LIKE ?)");
        assert_eq!(
            params,
            vec![Value::Text("%a%".into()), Value::Text("%b%".into())]
        );
    }

    #[test]
    fn test_keyword_clause_multi_column() {
        let (sql, params) = keyword_clause(&["x", "y"], &["k".into()]);
        assert_eq!(sql, " AND ((x LIKE ? OR y LIKE ?))");
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn test_placeholder_count_ignores_literals() {
        let q = CompiledQuery {
            sql: "SELECT '?' WHERE a = ? AND b = ?".into(),
            params: vec![Value::Null, Value::Null],
        };
        assert_eq!(q.placeholder_count(), 2);
    }
}
