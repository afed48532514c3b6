//! Message-extraction query over `sms.db`.

use rusqlite::types::Value;

use crate::filter::parse::MessageFilter;

use super::{keyword_clause, CompiledQuery};

/// Seconds between the Unix epoch and the Apple epoch (2001-01-01 UTC).
pub const APPLE_EPOCH_OFFSET: i64 = 978_307_200;

/// `message.date` values above this are nanoseconds (iOS 11+), not seconds.
pub const NANOSECOND_THRESHOLD: i64 = 1_000_000_000_000;

/// Time zone used to format timestamps and to compare date bounds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TimeBasis {
    /// The examiner's local time zone, as SQLite sees it.
    #[default]
    Local,
    Utc,
}

impl TimeBasis {
    pub fn from_localtime(localtime: bool) -> Self {
        if localtime {
            Self::Local
        } else {
            Self::Utc
        }
    }
}

/// Output columns of the extraction query, in header order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageColumn {
    Id,
    Date,
    Participant,
    Service,
    Direction,
    Subject,
    Text,
}

impl MessageColumn {
    pub fn label(self) -> &'static str {
        match self {
            Self::Id => "ID",
            Self::Date => "Date",
            Self::Participant => "Phone / Email",
            Self::Service => "Service",
            Self::Direction => "Sent/Received",
            Self::Subject => "Subject",
            Self::Text => "Text",
        }
    }

    fn expr(self, time: TimeBasis) -> String {
        match self {
            Self::Id => "m.ROWID".to_string(),
            Self::Date => timestamp_expr(time),
            Self::Participant => "coalesce(h.id, '')".to_string(),
            Self::Service => "m.service".to_string(),
            Self::Direction => "CASE m.is_from_me \
                                WHEN 0 THEN 'Received' \
                                WHEN 1 THEN 'Sent' \
                                ELSE 'Unknown' END"
                .to_string(),
            Self::Subject => "coalesce(m.subject, '')".to_string(),
            Self::Text => text_expr(),
        }
    }
}

/// Columns enabled by `filter`, in header order.
pub fn message_columns(filter: &MessageFilter) -> Vec<MessageColumn> {
    let mut columns = Vec::with_capacity(7);
    if filter.include_message_id {
        columns.push(MessageColumn::Id);
    }
    columns.push(MessageColumn::Date);
    columns.push(MessageColumn::Participant);
    if filter.include_service {
        columns.push(MessageColumn::Service);
    }
    columns.push(MessageColumn::Direction);
    if filter.include_subject {
        columns.push(MessageColumn::Subject);
    }
    columns.push(MessageColumn::Text);
    columns
}

/// Header labels matching [`message_columns`] 1:1.
pub fn message_headers(filter: &MessageFilter) -> Vec<&'static str> {
    message_columns(filter).into_iter().map(MessageColumn::label).collect()
}

/// `DATETIME(...)` of `message.date` translated from the Apple epoch.
pub fn timestamp_expr(time: TimeBasis) -> String {
    let modifiers = match time {
        TimeBasis::Local => "'unixepoch', 'localtime'",
        TimeBasis::Utc => "'unixepoch'",
    };
    format!(
        "DATETIME(CASE WHEN m.date > {NANOSECOND_THRESHOLD} \
         THEN m.date / 1000000000 ELSE m.date END + {APPLE_EPOCH_OFFSET}, {modifiers})"
    )
}

/// First image attachment of `m`, as `mime_type;filename;`.
const IMAGE_REFERENCE_EXPR: &str = "(SELECT coalesce(a.mime_type, '') || ';' || \
     coalesce(a.filename, '') || ';' \
     FROM attachment a \
     JOIN message_attachment_join maj ON maj.attachment_id = a.ROWID \
     WHERE maj.message_id = m.ROWID AND a.mime_type LIKE 'image/%' \
     ORDER BY a.ROWID LIMIT 1)";

/// Message text; texts carrying the U+FFFC marker get their image
/// attachment reference packed in front, or `;;` when the message has no
/// image attachment (see `parser::attachment`).
fn text_expr() -> String {
    format!(
        "CASE \
         WHEN m.text IS NULL THEN '' \
         WHEN instr(m.text, char(65532)) > 0 \
         THEN coalesce({IMAGE_REFERENCE_EXPR}, ';;') || m.text \
         ELSE m.text END"
    )
}

/// Compile the extraction query for one conversation.
///
/// Placeholder order: conversation id, each keyword, start date, end date.
pub fn message_extraction(
    filter: &MessageFilter,
    conversation_id: i64,
    time: TimeBasis,
) -> CompiledQuery {
    let select = message_columns(filter)
        .into_iter()
        .map(|c| c.expr(time))
        .collect::<Vec<_>>()
        .join(", ");

    let mut sql = format!(
        "SELECT {select} \
         FROM chat_message_join cmj \
         JOIN message m ON m.ROWID = cmj.message_id \
         LEFT JOIN handle h ON h.ROWID = m.handle_id \
         WHERE cmj.chat_id = ?"
    );
    let mut params = vec![Value::Integer(conversation_id)];

    let (keywords_sql, keyword_params) = keyword_clause(&["m.text"], &filter.keywords);
    sql.push_str(&keywords_sql);
    params.extend(keyword_params);

    let day = format!("date({})", timestamp_expr(time));
    match (filter.start_date, filter.end_date) {
        (Some(start), Some(end)) => {
            sql.push_str(&format!(" AND {day} BETWEEN date(?) AND date(?)"));
            params.push(date_param(start));
            params.push(date_param(end));
        }
        (Some(start), None) => {
            sql.push_str(&format!(" AND {day} >= date(?)"));
            params.push(date_param(start));
        }
        (None, Some(end)) => {
            sql.push_str(&format!(" AND {day} <= date(?)"));
            params.push(date_param(end));
        }
        (None, None) => {}
    }

    sql.push_str(" ORDER BY m.date ASC, m.ROWID ASC");
    CompiledQuery::new(sql, params)
}

fn date_param(date: chrono::NaiveDate) -> Value {
    Value::Text(date.format("%Y-%m-%d").to_string())
}
