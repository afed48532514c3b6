//! Typed views over a [`FilterConfig`].
//!
//! The query compiler never reads raw option strings; it receives one of the
//! filters below, produced (and validated) here.

use std::collections::HashSet;

use chrono::NaiveDate;

use crate::error::{EvidenceError, Result};

use super::FilterConfig;

/// Filters for the message-extraction query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageFilter {
    pub include_message_id: bool,
    pub include_service: bool,
    pub include_subject: bool,
    pub keywords: Vec<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl MessageFilter {
    pub fn from_config(cfg: &FilterConfig) -> Result<Self> {
        Ok(Self {
            include_message_id: cfg.flag("INCLUDE_MESSAGE_ID"),
            include_service: cfg.flag("INCLUDE_SERVICE"),
            include_subject: cfg.flag("INCLUDE_SUBJECT"),
            keywords: parse_keywords(cfg.text("KEYWORDS")),
            start_date: parse_optional_date(cfg.text("START_DATE"))?,
            end_date: parse_optional_date(cfg.text("END_DATE"))?,
        })
    }
}

/// Filters for the conversation-list query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversationListFilter {
    /// Service label to match (case-insensitive); `None` means any service.
    pub service: Option<String>,
}

impl ConversationListFilter {
    pub fn from_config(cfg: &FilterConfig) -> Self {
        let service = cfg.text("SERVICE").trim();
        Self {
            service: (!service.is_empty() && !service.eq_ignore_ascii_case("any"))
                .then(|| service.to_string()),
        }
    }
}

/// Filters for the contact-list query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactListFilter {
    pub include_id: bool,
    pub split_name: bool,
    pub include_organization: bool,
    pub keywords: Vec<String>,
}

impl ContactListFilter {
    pub fn from_config(cfg: &FilterConfig) -> Self {
        Self {
            include_id: cfg.flag("INCLUDE_ID"),
            split_name: cfg.flag("SPLIT_NAME"),
            include_organization: cfg.flag("INCLUDE_ORGANIZATION"),
            keywords: parse_keywords(cfg.text("KEYWORDS")),
        }
    }
}

/// Widest single range `parse_conversation_ids` will expand.
pub const MAX_RANGE_SPAN: i64 = 1_000_000;

/// Expand a conversation id list such as `"1,3-5,9"` into `[1, 3, 4, 5, 9]`.
///
/// Ranges are inclusive and expanded in the order given. An id listed more
/// than once is kept at its first position only. A range wider than
/// [`MAX_RANGE_SPAN`] is rejected.
pub fn parse_conversation_ids(spec: &str) -> Result<Vec<i64>> {
    let invalid = || EvidenceError::InvalidRange(spec.to_string());
    let mut ids: Vec<i64> = Vec::new();
    let mut seen: HashSet<i64> = HashSet::new();

    for token in spec.split(',').map(str::trim) {
        let (start, end) = match token.split_once('-') {
            Some((a, b)) => (parse_id(a).ok_or_else(invalid)?, parse_id(b).ok_or_else(invalid)?),
            None => {
                let id = parse_id(token).ok_or_else(invalid)?;
                (id, id)
            }
        };
        if start > end || end - start >= MAX_RANGE_SPAN {
            return Err(invalid());
        }
        for id in start..=end {
            if seen.insert(id) {
                ids.push(id);
            }
        }
    }

    Ok(ids)
}

fn parse_id(s: &str) -> Option<i64> {
    let s = s.trim();
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

/// Split a comma-separated keyword list, trimming each token and dropping
/// empty ones.
pub fn parse_keywords(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse a `YYYY-MM-DD` date; empty input means "no bound".
pub fn parse_optional_date(raw: &str) -> Result<Option<NaiveDate>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map(Some)
        .map_err(|_| EvidenceError::InvalidDate(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{FilterConfigBuilder, Module};

    #[test]
    fn test_range_expansion_order() {
        assert_eq!(parse_conversation_ids("1,3-5,9").unwrap(), vec![1, 3, 4, 5, 9]);
    }

    #[test]
    fn test_range_keeps_given_order() {
        assert_eq!(parse_conversation_ids("9, 2-3").unwrap(), vec![9, 2, 3]);
    }

    #[test]
    fn test_overlapping_ranges_processed_once() {
        assert_eq!(parse_conversation_ids("3-5,4-6,3").unwrap(), vec![3, 4, 5, 6]);
    }

    #[test]
    fn test_invalid_ranges() {
        for bad in ["", "a", "1,,2", "5-", "9-5", "-3", "1-2-3"] {
            assert!(
                matches!(parse_conversation_ids(bad), Err(EvidenceError::InvalidRange(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_large_range_expands_quickly() {
        let start = std::time::Instant::now();
        let ids = parse_conversation_ids("1-100000,50000,99999-100001").unwrap();
        assert!(start.elapsed() < std::time::Duration::from_secs(1));
        assert_eq!(ids.len(), 100_001);
        assert_eq!(ids[0], 1);
        assert_eq!(ids[99_999], 100_000);
        assert_eq!(ids[100_000], 100_001);
    }

    #[test]
    fn test_range_span_limit() {
        let widest = format!("1-{MAX_RANGE_SPAN}");
        assert_eq!(parse_conversation_ids(&widest).unwrap().len(), 1_000_000);
        assert!(matches!(
            parse_conversation_ids("0-1000000"),
            Err(EvidenceError::InvalidRange(_))
        ));
        assert!(matches!(
            parse_conversation_ids("1-9223372036854775807"),
            Err(EvidenceError::InvalidRange(_))
        ));
    }

    #[test]
    fn test_keywords_trimmed_and_empty_dropped() {
        assert_eq!(parse_keywords(" foo , bar,, "), vec!["foo", "bar"]);
        assert!(parse_keywords("").is_empty());
        assert!(parse_keywords(" , ").is_empty());
    }

    #[test]
    fn test_dates() {
        assert_eq!(parse_optional_date("").unwrap(), None);
        assert_eq!(
            parse_optional_date("2017-03-01").unwrap(),
            NaiveDate::from_ymd_opt(2017, 3, 1)
        );
        assert!(matches!(
            parse_optional_date("03/01/2017"),
            Err(EvidenceError::InvalidDate(_))
        ));
        assert!(parse_optional_date("2017-02-30").is_err());
    }

    #[test]
    fn test_service_any_means_no_filter() {
        let cfg = FilterConfig::builder(Module::Conversations)
            .set("BACKUP_DIR", "/b")
            .and_then(|b| b.set("SERVICE", "ANY"))
            .and_then(FilterConfigBuilder::build)
            .unwrap();
        assert_eq!(ConversationListFilter::from_config(&cfg).service, None);

        let cfg = FilterConfig::builder(Module::Conversations)
            .set("BACKUP_DIR", "/b")
            .and_then(|b| b.set("SERVICE", "iMessage"))
            .and_then(FilterConfigBuilder::build)
            .unwrap();
        assert_eq!(
            ConversationListFilter::from_config(&cfg).service.as_deref(),
            Some("iMessage")
        );
    }

    #[test]
    fn test_message_filter_rejects_bad_date() {
        let cfg = FilterConfig::builder(Module::Extract)
            .set("BACKUP_DIR", "/b")
            .and_then(|b| b.set("CONVERSATION_IDS", "1"))
            .and_then(|b| b.set("START_DATE", "yesterday"))
            .and_then(FilterConfigBuilder::build)
            .unwrap();
        assert!(matches!(
            MessageFilter::from_config(&cfg),
            Err(EvidenceError::InvalidDate(_))
        ));
    }
}
