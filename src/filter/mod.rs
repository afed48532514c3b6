//! Investigator-supplied filters.
//!
//! Each evidence module declares a fixed option list ([`OptionSpec`]). A run
//! starts from those defaults, applies `KEY=VALUE` overrides through a
//! [`FilterConfigBuilder`] and freezes the result into an immutable
//! [`FilterConfig`]. Building fails if a required option is empty, so a
//! `FilterConfig` in hand is always complete.

pub mod modules;
pub mod parse;

use std::collections::BTreeMap;
use std::fmt;

use crate::error::{EvidenceError, Result};

pub use self::modules::Module;

/// Current value of a module option.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(untagged)]
pub enum OptionValue {
    Flag(bool),
    Text(String),
}

impl OptionValue {
    /// `true` for an empty text value. Flags are never empty.
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Text(s) if s.is_empty())
    }
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Flag(b) => write!(f, "{b}"),
            Self::Text(s) => write!(f, "{s}"),
        }
    }
}

/// Default value of an option; also fixes whether it is a flag or text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionDefault {
    Flag(bool),
    Text(&'static str),
}

impl OptionDefault {
    fn to_value(self) -> OptionValue {
        match self {
            Self::Flag(b) => OptionValue::Flag(b),
            Self::Text(s) => OptionValue::Text(s.to_string()),
        }
    }
}

/// Static metadata for one module option.
#[derive(Debug, Clone, Copy)]
pub struct OptionSpec {
    pub name: &'static str,
    pub default: OptionDefault,
    pub required: bool,
    pub description: &'static str,
}

/// Immutable, validated set of option values for one module run.
#[derive(Debug, Clone)]
pub struct FilterConfig {
    module: Module,
    values: BTreeMap<&'static str, OptionValue>,
}

impl FilterConfig {
    /// Start a builder seeded with the module's defaults.
    pub fn builder(module: Module) -> FilterConfigBuilder {
        let values = module
            .options()
            .iter()
            .map(|spec| (spec.name, spec.default.to_value()))
            .collect();
        FilterConfigBuilder { module, values }
    }

    /// The module this configuration belongs to.
    pub fn module(&self) -> Module {
        self.module
    }

    /// Value of a flag option. Text options and unknown names read as `false`.
    pub fn flag(&self, name: &str) -> bool {
        matches!(self.values.get(name), Some(OptionValue::Flag(true)))
    }

    /// Value of a text option. Flags and unknown names read as `""`.
    pub fn text(&self, name: &str) -> &str {
        match self.values.get(name) {
            Some(OptionValue::Text(s)) => s,
            _ => "",
        }
    }

    /// Options in declaration order, paired with their current values.
    pub fn iter(&self) -> impl Iterator<Item = (&'static OptionSpec, &OptionValue)> + '_ {
        self.module
            .options()
            .iter()
            .filter_map(|spec| self.values.get(spec.name).map(|v| (spec, v)))
    }
}

/// Mutable staging area for a [`FilterConfig`].
#[derive(Debug, Clone)]
pub struct FilterConfigBuilder {
    module: Module,
    values: BTreeMap<&'static str, OptionValue>,
}

impl FilterConfigBuilder {
    /// Set an option from its textual form. Names are case-insensitive.
    ///
    /// `""` and `''` clear a text option. Flags accept `true`/`false`
    /// (also `yes`/`no`, `1`/`0`), case-insensitive.
    pub fn set(mut self, name: &str, raw: &str) -> Result<Self> {
        let spec = self
            .module
            .spec(name)
            .ok_or_else(|| EvidenceError::UnknownOption(name.to_string()))?;
        let raw = raw.trim();

        let value = match spec.default {
            OptionDefault::Flag(_) => OptionValue::Flag(parse_flag(raw).ok_or_else(|| {
                EvidenceError::InvalidOptionValue {
                    name: spec.name.to_string(),
                    reason: format!("expected true or false, got '{raw}'"),
                }
            })?),
            OptionDefault::Text(_) => {
                if raw == "\"\"" || raw == "''" {
                    OptionValue::Text(String::new())
                } else {
                    OptionValue::Text(raw.to_string())
                }
            }
        };

        self.values.insert(spec.name, value);
        Ok(self)
    }

    /// Set an option from a `KEY=VALUE` assignment.
    pub fn assign(self, assignment: &str) -> Result<Self> {
        let (name, value) =
            assignment
                .split_once('=')
                .ok_or_else(|| EvidenceError::InvalidOptionValue {
                    name: assignment.to_string(),
                    reason: "expected KEY=VALUE".to_string(),
                })?;
        self.set(name.trim(), value)
    }

    /// Freeze the configuration, rejecting empty required options.
    pub fn build(self) -> Result<FilterConfig> {
        for spec in self.module.options() {
            let empty = self.values.get(spec.name).is_none_or(OptionValue::is_empty);
            if spec.required && empty {
                return Err(EvidenceError::MissingOption(spec.name.to_string()));
            }
        }
        Ok(FilterConfig {
            module: self.module,
            values: self.values,
        })
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" => Some(true),
        "false" | "no" | "0" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_applied() {
        let cfg = FilterConfig::builder(Module::Extract)
            .set("BACKUP_DIR", "/tmp/backup")
            .and_then(|b| b.set("CONVERSATION_IDS", "5"))
            .and_then(FilterConfigBuilder::build)
            .expect("valid config");
        assert!(cfg.flag("INCLUDE_MESSAGE_ID"));
        assert!(cfg.flag("INCLUDE_SERVICE"));
        assert!(!cfg.flag("INCLUDE_SUBJECT"));
        assert_eq!(cfg.text("KEYWORDS"), "");
        assert_eq!(cfg.text("OUTPUT_FILE_NAME_PREFIX"), "conversation");
    }

    #[test]
    fn test_required_option_blocks_build() {
        let err = FilterConfig::builder(Module::Extract)
            .set("BACKUP_DIR", "/tmp/backup")
            .and_then(FilterConfigBuilder::build)
            .unwrap_err();
        assert!(matches!(err, EvidenceError::MissingOption(ref name) if name == "CONVERSATION_IDS"));
    }

    #[test]
    fn test_names_are_case_insensitive() {
        let cfg = FilterConfig::builder(Module::Conversations)
            .set("backup_dir", "/b")
            .and_then(|b| b.set("Service", "SMS"))
            .and_then(FilterConfigBuilder::build)
            .unwrap();
        assert_eq!(cfg.text("SERVICE"), "SMS");
    }

    #[test]
    fn test_quoted_empty_clears_text() {
        let cfg = FilterConfig::builder(Module::Contacts)
            .set("BACKUP_DIR", "/b")
            .and_then(|b| b.set("KEYWORDS", "alice"))
            .and_then(|b| b.set("KEYWORDS", "\"\""))
            .and_then(FilterConfigBuilder::build)
            .unwrap();
        assert_eq!(cfg.text("KEYWORDS"), "");
    }

    #[test]
    fn test_flag_parsing() {
        let cfg = FilterConfig::builder(Module::Contacts)
            .assign("BACKUP_DIR=/b")
            .and_then(|b| b.assign("SPLIT_NAME=TRUE"))
            .and_then(|b| b.assign("INCLUDE_ID=no"))
            .and_then(FilterConfigBuilder::build)
            .unwrap();
        assert!(cfg.flag("SPLIT_NAME"));
        assert!(!cfg.flag("INCLUDE_ID"));

        let err = FilterConfig::builder(Module::Contacts)
            .set("SPLIT_NAME", "maybe")
            .unwrap_err();
        assert!(matches!(err, EvidenceError::InvalidOptionValue { .. }));
    }

    #[test]
    fn test_unknown_option() {
        let err = FilterConfig::builder(Module::Contacts)
            .set("CONVERSATION_IDS", "1")
            .unwrap_err();
        assert!(matches!(err, EvidenceError::UnknownOption(_)));
    }

    #[test]
    fn test_assign_requires_equals() {
        let err = FilterConfig::builder(Module::Contacts)
            .assign("KEYWORDS")
            .unwrap_err();
        assert!(matches!(err, EvidenceError::InvalidOptionValue { .. }));
    }

    #[test]
    fn test_iter_follows_declaration_order() {
        let cfg = FilterConfig::builder(Module::Conversations)
            .set("BACKUP_DIR", "/b")
            .and_then(FilterConfigBuilder::build)
            .unwrap();
        let names: Vec<&str> = cfg.iter().map(|(spec, _)| spec.name).collect();
        assert_eq!(names[0], "BACKUP_DIR");
        assert_eq!(names.len(), Module::Conversations.options().len());
    }
}
