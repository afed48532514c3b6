//! Option lists for the evidence modules.

use super::{OptionDefault, OptionSpec};

/// Path to the backup directory; every module needs it.
const BACKUP_DIR: OptionSpec = OptionSpec {
    name: "BACKUP_DIR",
    default: OptionDefault::Text(""),
    required: true,
    description: "Path to iOS Backup",
};

const CONTACTS_OPTIONS: &[OptionSpec] = &[
    BACKUP_DIR,
    OptionSpec {
        name: "INCLUDE_ID",
        default: OptionDefault::Flag(true),
        required: true,
        description: "Include contact DB ID in the output.",
    },
    OptionSpec {
        name: "INCLUDE_ORGANIZATION",
        default: OptionDefault::Flag(true),
        required: true,
        description: "Include 'Organization' name in the output.",
    },
    OptionSpec {
        name: "KEYWORDS",
        default: OptionDefault::Text(""),
        required: false,
        description: "Comma-separated list of keywords to filter the output. \
                      The keywords are used to search by name, organization, or \
                      value (e.g., phone number or e-mail address).",
    },
    OptionSpec {
        name: "OUTPUT_FILE_NAME_PREFIX",
        default: OptionDefault::Text("contacts"),
        required: true,
        description: "Output file name prefix for report files.",
    },
    OptionSpec {
        name: "SPLIT_NAME",
        default: OptionDefault::Flag(false),
        required: true,
        description: "Show First and Last names as separate columns.",
    },
];

const CONVERSATIONS_OPTIONS: &[OptionSpec] = &[
    BACKUP_DIR,
    OptionSpec {
        name: "OUTPUT_FILE_NAME_PREFIX",
        default: OptionDefault::Text("conversationlist"),
        required: true,
        description: "Output file name prefix for report files.",
    },
    OptionSpec {
        name: "SERVICE",
        default: OptionDefault::Text("any"),
        required: true,
        description: "Show only conversations from a specific service. \
                      Valid options are: any,imessage,sms",
    },
    OptionSpec {
        name: "SHOW_CONTACT_INFO",
        default: OptionDefault::Flag(false),
        required: true,
        description: "Find contact information in Address Book",
    },
];

const EXTRACT_OPTIONS: &[OptionSpec] = &[
    BACKUP_DIR,
    OptionSpec {
        name: "CONVERSATION_IDS",
        default: OptionDefault::Text(""),
        required: true,
        description: "Comma-separated list with IDs (or ranges such as 5-10) of \
                      the conversations to extract. Use the 'conversations' module \
                      to get a list of conversations stored on the device.",
    },
    OptionSpec {
        name: "END_DATE",
        default: OptionDefault::Text(""),
        required: false,
        description: "Only include messages on or before this date. Format: YYYY-MM-DD.",
    },
    OptionSpec {
        name: "INCLUDE_MESSAGE_ID",
        default: OptionDefault::Flag(true),
        required: true,
        description: "Include message ID for each message in the output.",
    },
    OptionSpec {
        name: "INCLUDE_SERVICE",
        default: OptionDefault::Flag(true),
        required: true,
        description: "Include Service (i.e., 'SMS'/'iMessage') in the output.",
    },
    OptionSpec {
        name: "INCLUDE_SUBJECT",
        default: OptionDefault::Flag(false),
        required: true,
        description: "Include conversation 'Subject' in the output.",
    },
    OptionSpec {
        name: "KEYWORDS",
        default: OptionDefault::Text(""),
        required: false,
        description: "Comma-separated list of keywords to filter the output. \
                      The keywords are used to search in the content of the messages.",
    },
    OptionSpec {
        name: "OUTPUT_FILE_NAME_PREFIX",
        default: OptionDefault::Text("conversation"),
        required: true,
        description: "Output file name prefix for report files.",
    },
    OptionSpec {
        name: "SHOW_CONTACT_INFO",
        default: OptionDefault::Flag(false),
        required: true,
        description: "Find contact information in Address Book",
    },
    OptionSpec {
        name: "START_DATE",
        default: OptionDefault::Text(""),
        required: false,
        description: "Only include messages on or after this date. Format: YYYY-MM-DD.",
    },
];

/// An evidence module: one kind of report over the backup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Module {
    /// Address Book listing.
    Contacts,
    /// Conversation (chat) listing.
    Conversations,
    /// Message transcripts for selected conversations.
    Extract,
}

impl Module {
    pub const ALL: [Module; 3] = [Module::Contacts, Module::Conversations, Module::Extract];

    /// Short name used on the command line.
    pub fn name(self) -> &'static str {
        match self {
            Self::Contacts => "contacts",
            Self::Conversations => "conversations",
            Self::Extract => "extract",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::Contacts => "Lists contacts from native iOS Address Book",
            Self::Conversations => "Lists conversations from native iOS Messages application",
            Self::Extract => "Extract conversations from native iOS Messages application",
        }
    }

    /// Whether the module reads the Address Book store.
    ///
    /// `conversations` and `extract` only touch it when `SHOW_CONTACT_INFO`
    /// is set, but the store must be present either way.
    pub fn requires_contacts(self) -> bool {
        true
    }

    /// Whether the module reads the Messages store.
    pub fn requires_messages(self) -> bool {
        !matches!(self, Self::Contacts)
    }

    /// The module's option list, in display order.
    pub fn options(self) -> &'static [OptionSpec] {
        match self {
            Self::Contacts => CONTACTS_OPTIONS,
            Self::Conversations => CONVERSATIONS_OPTIONS,
            Self::Extract => EXTRACT_OPTIONS,
        }
    }

    /// Case-insensitive option lookup.
    pub fn spec(self, name: &str) -> Option<&'static OptionSpec> {
        self.options()
            .iter()
            .find(|spec| spec.name.eq_ignore_ascii_case(name))
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|m| m.name().eq_ignore_ascii_case(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_module_has_backup_dir_first() {
        for module in Module::ALL {
            let first = &module.options()[0];
            assert_eq!(first.name, "BACKUP_DIR");
            assert!(first.required);
        }
    }

    #[test]
    fn test_option_names_unique() {
        for module in Module::ALL {
            let mut names: Vec<&str> = module.options().iter().map(|o| o.name).collect();
            names.sort_unstable();
            names.dedup();
            assert_eq!(names.len(), module.options().len(), "{}", module.name());
        }
    }

    #[test]
    fn test_from_name() {
        assert_eq!(Module::from_name("EXTRACT"), Some(Module::Extract));
        assert_eq!(Module::from_name("nope"), None);
    }
}
