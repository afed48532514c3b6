//! Evidence access: the content-addressable backup container and the
//! SQLite stores inside it.

pub mod backup;
pub mod sqlite;

pub use self::backup::{BackupContainer, StoreKind};
pub use self::sqlite::EvidenceStore;
