//! Address Book records.

/// One `(person, value)` pair from the contact store.
///
/// A person with several phone numbers or e-mail addresses yields one
/// `Contact` per value, all sharing `id` and `display_name`.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Contact {
    pub id: i64,
    /// `"First Last"`, trimmed; empty when the person has no name.
    pub display_name: String,
    /// Phone number, e-mail address or other multivalue, as stored.
    pub identifier_value: String,
}

impl Contact {
    pub fn has_name(&self) -> bool {
        !self.display_name.is_empty()
    }
}
