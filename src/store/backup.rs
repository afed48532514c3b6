//! Content-addressable access to an iOS backup directory.
//!
//! A backup does not keep device paths. Each file is stored under the
//! SHA-1 of `"<Domain>-<path relative to the domain root>"`, either flat in
//! the backup root (iTunes, iOS 9 and older) or sharded by the first two hex
//! digits of the key (iOS 10 and newer):
//!
//! ```text
//! HomeDomain-Library/SMS/sms.db  →  3d0d7e5fb2ce288813306e4d4636395e047a3d28
//!                                   <root>/3d0d7e5f...  or  <root>/3d/3d0d7e5f...
//! ```

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use sha1::{Digest, Sha1};
use tracing::{debug, warn};

use crate::error::{EvidenceError, Result};
use crate::model::attachment::{AttachmentReference, ResolvedAttachment};

/// Domain holding the user's home directory (databases, preferences).
pub const HOME_DOMAIN: &str = "HomeDomain";
/// Domain holding message attachments (`~/Library/SMS/Attachments`).
pub const MEDIA_DOMAIN: &str = "MediaDomain";

/// An evidence database inside the backup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    /// `sms.db`: chats, handles, messages and attachments.
    Messages,
    /// `AddressBook.sqlitedb`: people and their phone numbers/e-mails.
    Contacts,
}

impl StoreKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Messages => "Messages",
            Self::Contacts => "Contacts",
        }
    }

    /// Path of the database relative to `HomeDomain`.
    pub fn domain_path(self) -> &'static str {
        match self {
            Self::Messages => "Library/SMS/sms.db",
            Self::Contacts => "Library/AddressBook/AddressBook.sqlitedb",
        }
    }

    pub fn content_key(self) -> String {
        content_key(HOME_DOMAIN, self.domain_path())
    }
}

/// SHA-1 content key of a file, as lowercase hex.
pub fn content_key(domain: &str, domain_path: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(domain.as_bytes());
    hasher.update(b"-");
    hasher.update(domain_path.as_bytes());
    hex::encode(hasher.finalize())
}

/// Content key of the file an attachment reference points to.
pub fn attachment_key(reference: &AttachmentReference) -> String {
    content_key(MEDIA_DOMAIN, reference.domain_path())
}

/// A backup directory opened for read-only lookups.
#[derive(Debug, Clone)]
pub struct BackupContainer {
    root: PathBuf,
}

impl BackupContainer {
    /// Open a backup rooted at `root`, which must be an existing directory.
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        if !root.is_dir() {
            return Err(EvidenceError::BackupNotFound(root));
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// On-disk location of a content key, probing the flat layout first.
    pub fn entry_path(&self, key: &str) -> Option<PathBuf> {
        let flat = self.root.join(key);
        if flat.is_file() {
            return Some(flat);
        }
        let shard = key.get(..2)?;
        let sharded = self.root.join(shard).join(key);
        sharded.is_file().then_some(sharded)
    }

    /// Read the full content stored under `key`; `None` if absent.
    pub fn read_entry(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let Some(path) = self.entry_path(key) else {
            return Ok(None);
        };
        match std::fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(EvidenceError::io(path, e)),
        }
    }

    /// Resolve an attachment reference to its bytes.
    ///
    /// A file that was not included in the backup is a normal outcome and
    /// yields `Ok(None)`; only read failures on an existing entry are errors.
    /// Nothing is cached: every call hashes and reads again.
    pub fn locate(&self, reference: &AttachmentReference) -> Result<Option<ResolvedAttachment>> {
        let key = attachment_key(reference);
        match self.read_entry(&key)? {
            Some(content) => {
                debug!(
                    key = %key,
                    size = content.len(),
                    "Resolved attachment"
                );
                Ok(Some(ResolvedAttachment {
                    mime_type: reference.mime_type.clone(),
                    content,
                }))
            }
            None => {
                warn!(
                    path = %reference.relative_path,
                    key = %key,
                    "Attachment not present in backup"
                );
                Ok(None)
            }
        }
    }

    /// Path of an evidence database, or `StoreMissing` if the backup lacks it.
    pub fn store_path(&self, store: StoreKind) -> Result<PathBuf> {
        let key = store.content_key();
        self.entry_path(&key)
            .ok_or_else(|| EvidenceError::StoreMissing {
                store: store.label(),
                path: self.root.join(key),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference(path: &str) -> AttachmentReference {
        AttachmentReference {
            mime_type: "image/jpeg".into(),
            relative_path: path.into(),
            trailing_text: String::new(),
        }
    }

    #[test]
    fn test_well_known_store_keys() {
        assert_eq!(
            StoreKind::Messages.content_key(),
            "3d0d7e5fb2ce288813306e4d4636395e047a3d28"
        );
        assert_eq!(
            StoreKind::Contacts.content_key(),
            "31bb7ba8914766d4ba40d6dfb6113c8b614be442"
        );
    }

    #[test]
    fn test_attachment_key_drops_home_prefix() {
        let r = reference("~/Library/SMS/Attachments/a.jpg");
        assert_eq!(
            attachment_key(&r),
            content_key("MediaDomain", "Library/SMS/Attachments/a.jpg")
        );
    }

    #[test]
    fn test_key_is_deterministic() {
        let a = attachment_key(&reference("~/x.jpg"));
        let b = attachment_key(&reference("~/x.jpg"));
        let c = attachment_key(&reference("~/y.jpg"));
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 40);
        assert!(a.bytes().all(|b| b.is_ascii_hexdigit() && !b.is_ascii_uppercase()));
    }

    #[test]
    fn test_open_rejects_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert!(matches!(
            BackupContainer::open(&missing),
            Err(EvidenceError::BackupNotFound(_))
        ));
    }

    #[test]
    fn test_locate_flat_and_sharded() {
        let dir = tempfile::tempdir().unwrap();
        let backup = BackupContainer::open(dir.path()).unwrap();

        let flat = reference("~/flat.jpg");
        std::fs::write(dir.path().join(attachment_key(&flat)), b"flat").unwrap();

        let sharded = reference("~/sharded.jpg");
        let key = attachment_key(&sharded);
        std::fs::create_dir_all(dir.path().join(&key[..2])).unwrap();
        std::fs::write(dir.path().join(&key[..2]).join(&key), b"sharded").unwrap();

        let got = backup.locate(&flat).unwrap().unwrap();
        assert_eq!(got.content, b"flat");
        assert_eq!(got.mime_type, "image/jpeg");
        assert_eq!(backup.locate(&sharded).unwrap().unwrap().content, b"sharded");
    }

    #[test]
    fn test_missing_attachment_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let backup = BackupContainer::open(dir.path()).unwrap();
        assert!(backup.locate(&reference("~/gone.jpg")).unwrap().is_none());
    }

    #[test]
    fn test_store_missing() {
        let dir = tempfile::tempdir().unwrap();
        let backup = BackupContainer::open(dir.path()).unwrap();
        let err = backup.store_path(StoreKind::Messages).unwrap_err();
        assert!(matches!(err, EvidenceError::StoreMissing { store: "Messages", .. }));
    }
}
