//! `iosevidence`: forensic evidence extraction from iOS backups.
//!
//! The library turns investigator-supplied module options into
//! parameterized queries over the backup's SQLite stores (`sms.db`,
//! `AddressBook.sqlitedb`), decodes image attachment references embedded
//! in message text, resolves them against the hashed backup layout, and
//! assembles the results into tables for the renderers in [`export`].
//! Evidence stores are only ever opened read-only.

pub mod config;
pub mod contacts;
pub mod error;
pub mod export;
pub mod filter;
pub mod model;
pub mod parser;
pub mod query;
pub mod report;
pub mod store;
