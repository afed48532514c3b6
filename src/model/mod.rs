//! Core data model: contacts, attachment references, and the tabular
//! report shape handed to renderers.

pub mod attachment;
pub mod contact;
pub mod table;
