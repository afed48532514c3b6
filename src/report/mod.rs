//! Evidence module runs.
//!
//! Each run validates the backup, opens its own read-only store
//! connections, compiles and executes the module's queries, and hands the
//! rows to [`assemble`] to build the tables a renderer consumes. The
//! connections are dropped when the run returns.

pub mod assemble;

use std::path::PathBuf;

use tracing::{debug, info};

use crate::config::Config;
use crate::contacts::ContactResolver;
use crate::error::Result;
use crate::filter::parse::{
    parse_conversation_ids, ContactListFilter, ConversationListFilter, MessageFilter,
};
use crate::filter::{FilterConfig, Module};
use crate::model::table::{Cell, Table};
use crate::query::contacts::contact_headers;
use crate::query::conversations::CONVERSATION_HEADERS;
use crate::query::messages::{message_columns, message_headers};
use crate::query::{compile, MessageColumn, QueryKind, TimeBasis};
use crate::store::{BackupContainer, EvidenceStore, StoreKind};

use self::assemble::{assemble, decode_messages, insert_column, participants_annotation};

/// Engine settings that come from the application config, not the module
/// options.
#[derive(Debug, Clone, Default)]
pub struct RunSettings {
    pub time: TimeBasis,
    pub default_region: Option<String>,
    /// Read attachment bytes out of the backup for decoded messages.
    pub resolve_attachments: bool,
}

impl RunSettings {
    pub fn from_config(config: &Config, resolve_attachments: bool) -> Self {
        Self {
            time: TimeBasis::from_localtime(config.query.localtime),
            default_region: config.contacts.default_region.clone(),
            resolve_attachments,
        }
    }
}

/// Open the backup named by `BACKUP_DIR` and check that every store the
/// module reads is present.
pub fn open_backup(cfg: &FilterConfig) -> Result<BackupContainer> {
    let backup = BackupContainer::open(PathBuf::from(cfg.text("BACKUP_DIR")))?;
    let module = cfg.module();
    info!(module = module.name(), backup = %backup.root().display(), "Opening backup");
    if module.requires_messages() {
        backup.store_path(StoreKind::Messages)?;
    }
    if module.requires_contacts() {
        backup.store_path(StoreKind::Contacts)?;
    }
    Ok(backup)
}

/// Called with `(done, total)` as conversations are extracted.
pub type ProgressFn<'a> = &'a dyn Fn(usize, usize);

/// One table produced by a module run.
#[derive(Debug, Clone)]
pub struct Report {
    pub table: Table,
    /// Set for `extract` tables; report files are named after it.
    pub conversation_id: Option<i64>,
}

/// Run the module `cfg` was built for.
///
/// Option values are validated before the backup is touched.
pub fn run(
    cfg: &FilterConfig,
    settings: &RunSettings,
    progress: Option<ProgressFn<'_>>,
) -> Result<Vec<Report>> {
    let show_contact_info = cfg.flag("SHOW_CONTACT_INFO");
    match cfg.module() {
        Module::Contacts => {
            let filter = ContactListFilter::from_config(cfg);
            let backup = open_backup(cfg)?;
            let table = list_contacts(&backup, &filter)?;
            Ok(vec![Report::single(table)])
        }
        Module::Conversations => {
            let filter = ConversationListFilter::from_config(cfg);
            let backup = open_backup(cfg)?;
            let table = list_conversations(&backup, &filter, show_contact_info, settings)?;
            Ok(vec![Report::single(table)])
        }
        Module::Extract => {
            let filter = MessageFilter::from_config(cfg)?;
            let ids = parse_conversation_ids(cfg.text("CONVERSATION_IDS"))?;
            let backup = open_backup(cfg)?;
            extract_conversations(&backup, &filter, &ids, show_contact_info, settings, progress)
        }
    }
}

impl Report {
    fn single(table: Table) -> Self {
        Self {
            table,
            conversation_id: None,
        }
    }
}

/// The `contacts` module: one `Contacts` table.
pub fn list_contacts(backup: &BackupContainer, filter: &ContactListFilter) -> Result<Table> {
    let store = EvidenceStore::open(backup.store_path(StoreKind::Contacts)?)?;
    let rows = store.query(&compile(QueryKind::ContactList(filter)))?;
    info!(rows = rows.len(), "Listed contacts");
    Ok(assemble("Contacts", &contact_headers(filter), rows, None))
}

/// The `conversations` module: one `Conversation List` table, with a
/// `Name` column after the identifier when `show_contact_info` is set.
pub fn list_conversations(
    backup: &BackupContainer,
    filter: &ConversationListFilter,
    show_contact_info: bool,
    settings: &RunSettings,
) -> Result<Table> {
    let messages = EvidenceStore::open(backup.store_path(StoreKind::Messages)?)?;
    let mut rows = messages.query(&compile(QueryKind::ConversationList(filter)))?;
    let mut headers: Vec<&str> = CONVERSATION_HEADERS.to_vec();

    if show_contact_info {
        let contacts = EvidenceStore::open(backup.store_path(StoreKind::Contacts)?)?;
        let resolver = ContactResolver::new(&contacts, settings.default_region.as_deref());
        rows = insert_column(rows, 1, |row| {
            let identifier = row.get(1).map(Cell::to_plain).unwrap_or_default();
            Ok(Cell::text(resolver.resolve(&identifier)?.unwrap_or_default()))
        })?;
        headers.insert(2, "Name");
    }

    info!(rows = rows.len(), "Listed conversations");
    Ok(assemble("Conversation List", &headers, rows, None))
}

/// The `extract` module: one table per conversation with at least one
/// matching message, in the order `ids` lists them.
pub fn extract_conversations(
    backup: &BackupContainer,
    filter: &MessageFilter,
    ids: &[i64],
    show_contact_info: bool,
    settings: &RunSettings,
    progress: Option<ProgressFn<'_>>,
) -> Result<Vec<Report>> {
    let messages = EvidenceStore::open(backup.store_path(StoreKind::Messages)?)?;
    let contacts = if show_contact_info {
        Some(EvidenceStore::open(backup.store_path(StoreKind::Contacts)?)?)
    } else {
        None
    };
    let resolver = contacts
        .as_ref()
        .map(|store| ContactResolver::new(store, settings.default_region.as_deref()));

    let headers = message_headers(filter);
    let text_column = message_columns(filter)
        .iter()
        .position(|c| *c == MessageColumn::Text)
        .unwrap_or(headers.len() - 1);
    let attachments = settings.resolve_attachments.then_some(backup);

    let mut reports = Vec::new();
    for (n, &id) in ids.iter().enumerate() {
        if let Some(cb) = progress {
            cb(n, ids.len());
        }
        let query = compile(QueryKind::MessageExtraction {
            filter,
            conversation_id: id,
            time: settings.time,
        });
        let rows = messages.query(&query)?;
        if rows.is_empty() {
            debug!(conversation = id, "No matching messages, skipping");
            continue;
        }

        let annotation = match &resolver {
            Some(resolver) => Some(participants(&messages, resolver, id)?),
            None => None,
        };
        let rows = decode_messages(rows, text_column, attachments)?;
        info!(conversation = id, messages = rows.len(), "Extracted conversation");
        reports.push(Report {
            table: assemble(format!("Conversation ID: {id}"), &headers, rows, annotation),
            conversation_id: Some(id),
        });
    }
    if let Some(cb) = progress {
        cb(ids.len(), ids.len());
    }
    Ok(reports)
}

fn participants(
    messages: &EvidenceStore,
    resolver: &ContactResolver<'_>,
    conversation_id: i64,
) -> Result<String> {
    let rows = messages.query(&compile(QueryKind::ConversationParticipants(conversation_id)))?;
    let people = rows
        .iter()
        .filter_map(|row| row.first().map(Cell::to_plain))
        .map(|identifier| {
            let name = resolver.resolve(&identifier)?;
            Ok((identifier, name))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(participants_annotation(&people))
}
