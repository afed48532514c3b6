//! Resolution of message handles (phone numbers, e-mail addresses) to
//! Address Book names.
//!
//! Matching is approximate and first-match-wins in store order:
//!
//! - e-mail: the first contact value containing `@` that contains the
//!   handle as a substring;
//! - phone: the handle is parsed into its national number, and the first
//!   contact value whose digits contain that number matches.
//!
//! Contacts without a name never match; the scan moves on to the next one.

use phonenumber::country;
use tracing::{debug, warn};

use crate::error::Result;
use crate::model::contact::Contact;
use crate::model::table::Cell;
use crate::query::{compile, QueryKind};
use crate::store::EvidenceStore;

/// Looks up display names in the contact store.
///
/// Every [`resolve`](Self::resolve) call reads the contact store afresh.
pub struct ContactResolver<'a> {
    store: &'a EvidenceStore,
    region: Option<country::Id>,
}

impl<'a> ContactResolver<'a> {
    /// `default_region` (ISO 3166, e.g. `"US"`) lets numbers without a `+`
    /// country prefix be parsed. An unknown region is ignored.
    pub fn new(store: &'a EvidenceStore, default_region: Option<&str>) -> Self {
        let region = default_region.and_then(|code| {
            let parsed = code.trim().to_ascii_uppercase().parse::<country::Id>().ok();
            if parsed.is_none() {
                warn!(region = code, "Unknown default region, ignoring");
            }
            parsed
        });
        Self { store, region }
    }

    /// Every contact value with its owner's display name, in store order.
    pub fn contacts(&self) -> Result<Vec<Contact>> {
        let rows = self.store.query(&compile(QueryKind::ContactLookup))?;
        Ok(rows.into_iter().filter_map(contact_from_row).collect())
    }

    /// Display name for a handle, or `None` when no contact matches.
    pub fn resolve(&self, identifier: &str) -> Result<Option<String>> {
        let contacts = self.contacts()?;
        let name = match_identifier(identifier, &contacts, self.region);
        debug!(identifier, found = name.is_some(), "Contact lookup");
        Ok(name)
    }
}

fn contact_from_row(row: Vec<Cell>) -> Option<Contact> {
    let mut cells = row.into_iter();
    let id = match cells.next()? {
        Cell::Integer(id) => id,
        _ => return None,
    };
    let display_name = cells.next()?.to_plain();
    let identifier_value = cells.next()?.to_plain();
    Some(Contact {
        id,
        display_name,
        identifier_value,
    })
}

/// Match a handle against `contacts` (e-mail if it contains `@`, phone otherwise).
pub fn match_identifier(
    identifier: &str,
    contacts: &[Contact],
    region: Option<country::Id>,
) -> Option<String> {
    if identifier.contains('@') {
        match_email(identifier, contacts)
    } else {
        match_phone(identifier, contacts, region)
    }
}

pub fn match_email(address: &str, contacts: &[Contact]) -> Option<String> {
    contacts
        .iter()
        .filter(|c| c.has_name())
        .find(|c| c.identifier_value.contains('@') && c.identifier_value.contains(address))
        .map(|c| c.display_name.clone())
}

pub fn match_phone(
    number: &str,
    contacts: &[Contact],
    region: Option<country::Id>,
) -> Option<String> {
    let national = national_number(number, region)?;
    contacts
        .iter()
        .filter(|c| c.has_name())
        .find(|c| digits(&c.identifier_value).contains(&national))
        .map(|c| c.display_name.clone())
}

/// National significant number of `number`, as digits.
///
/// Malformed numbers (and numbers without a country prefix when no region
/// is configured) yield `None`.
pub fn national_number(number: &str, region: Option<country::Id>) -> Option<String> {
    match phonenumber::parse(region, number) {
        Ok(parsed) => Some(parsed.national().value().to_string()),
        Err(e) => {
            debug!(number, error = %e, "Unparseable phone number");
            None
        }
    }
}

fn digits(s: &str) -> String {
    s.chars().filter(char::is_ascii_digit).collect()
}
