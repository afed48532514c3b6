//! Address Book queries over `AddressBook.sqlitedb`.

use crate::filter::parse::ContactListFilter;

use super::{keyword_clause, CompiledQuery};

/// `"First Last"` with missing parts left out.
const DISPLAY_NAME_EXPR: &str = "trim(coalesce(p.First, '') || ' ' || coalesce(p.Last, ''))";

/// Multivalue label, resolved through `ABMultiValueLabel` and stripped of
/// the `_$!<...>!$_` wrapper iOS puts around built-in labels.
const LABEL_EXPR: &str = "replace(replace(\
     CASE WHEN m.label IN (SELECT ROWID FROM ABMultiValueLabel) \
     THEN (SELECT value FROM ABMultiValueLabel WHERE ROWID = m.label) \
     ELSE m.label END, \
     '_$!<', ''), '>!$_', '')";

/// Contact id, display name and value for every contact value, in contact
/// id order. Substrate for contact resolution; takes no parameters.
pub fn contact_lookup() -> CompiledQuery {
    CompiledQuery::new(
        format!(
            "SELECT p.ROWID, {DISPLAY_NAME_EXPR}, m.value \
             FROM ABPerson p \
             JOIN ABMultiValue m ON m.record_id = p.ROWID \
             WHERE m.value IS NOT NULL \
             ORDER BY p.ROWID, m.ROWID"
        ),
        Vec::new(),
    )
}

/// Header labels for the contact listing.
pub fn contact_headers(filter: &ContactListFilter) -> Vec<&'static str> {
    let mut headers = Vec::with_capacity(6);
    if filter.include_id {
        headers.push("ID");
    }
    if filter.split_name {
        headers.push("First Name");
        headers.push("Last Name");
    } else {
        headers.push("Name");
    }
    if filter.include_organization {
        headers.push("Organization");
    }
    headers.push("Type");
    headers.push("Value");
    headers
}

/// The `contacts` module listing.
///
/// Each keyword matches the value, the name (or first/last name when
/// split) or the organization.
pub fn contact_list(filter: &ContactListFilter) -> CompiledQuery {
    let mut select: Vec<&str> = Vec::with_capacity(6);
    if filter.include_id {
        select.push("p.ROWID");
    }
    if filter.split_name {
        select.push("p.First");
        select.push("p.Last");
    } else {
        select.push(DISPLAY_NAME_EXPR);
    }
    if filter.include_organization {
        select.push("p.Organization");
    }
    select.push(LABEL_EXPR);
    select.push("m.value");

    let searchable: &[&str] = if filter.split_name {
        &["m.value", "p.First", "p.Last", "p.Organization"]
    } else {
        &["m.value", DISPLAY_NAME_EXPR, "p.Organization"]
    };
    let (keywords_sql, params) = keyword_clause(searchable, &filter.keywords);

    let sql = format!(
        "SELECT {} \
         FROM ABPerson p \
         JOIN ABMultiValue m ON m.record_id = p.ROWID \
         WHERE m.value IS NOT NULL{keywords_sql} \
         ORDER BY p.ROWID, m.ROWID",
        select.join(", ")
    );
    CompiledQuery::new(sql, params)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter() -> ContactListFilter {
        ContactListFilter {
            include_id: true,
            split_name: false,
            include_organization: true,
            keywords: Vec::new(),
        }
    }

    #[test]
    fn test_lookup_has_no_params() {
        let q = contact_lookup();
        assert!(q.params.is_empty());
        assert_eq!(q.placeholder_count(), 0);
        assert!(q.sql.contains("ORDER BY p.ROWID"));
    }

    #[test]
    fn test_headers() {
        assert_eq!(
            contact_headers(&filter()),
            vec!["ID", "Name", "Organization", "Type", "Value"]
        );
        let split = ContactListFilter {
            include_id: false,
            split_name: true,
            include_organization: false,
            keywords: Vec::new(),
        };
        assert_eq!(
            contact_headers(&split),
            vec!["First Name", "Last Name", "Type", "Value"]
        );
    }

    #[test]
    fn test_keywords_bind_per_searchable_column() {
        let f = ContactListFilter {
            keywords: vec!["ann".into(), "555".into()],
            ..filter()
        };
        let q = contact_list(&f);
        assert_eq!(q.params.len(), 6);
        assert_eq!(q.placeholder_count(), 6);

        let split = ContactListFilter {
            split_name: true,
            ..f
        };
        let q = contact_list(&split);
        assert_eq!(q.params.len(), 8);
        assert_eq!(q.placeholder_count(), 8);
    }

    #[test]
    fn test_no_keywords_no_params() {
        let q = contact_list(&filter());
        assert!(q.params.is_empty());
        assert!(!q.sql.contains("LIKE"));
    }
}
