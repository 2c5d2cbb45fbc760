//! Character rules derived from the stored `complexity` and `specialChars` records
use pwgate_core::config::DEFAULT_SPECIAL_CLASS;
use pwgate_core::{PasswordConfig, PolicyRecord};
use tracing::warn;

const UPPERCASE_CLASS: &str = "[A-Z]";
const LOWERCASE_CLASS: &str = "[a-z]";
const DIGIT_CLASS: &str = "[0-9]";

/// Which character classes a password must contain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Complexity {
    pub upper: bool,
    pub lower: bool,
    pub digit: bool,
    pub special: bool,
}

impl Complexity {
    /// Flags from an enabled record; a disabled record requires nothing.
    /// Missing flags default to required.
    pub fn from_record(record: &PolicyRecord) -> Self {
        if !record.is_enabled() {
            return Self {
                upper: false,
                lower: false,
                digit: false,
                special: false,
            };
        }
        let rules = record.rules();
        let flag = |name: &str| rules.get_bool(name).unwrap_or(true);
        Self {
            upper: flag("requireUppercase"),
            lower: flag("requireLowercase"),
            digit: flag("requireDigit"),
            special: flag("requireSpecial"),
        }
    }
}

/// Special-character set taken from an enabled `specialChars` record
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SpecialChars {
    /// Allowed characters with the excluded ones already removed
    Allowed(String),
    /// No allowed list; these characters are forbidden
    Excluded(String),
}

impl SpecialChars {
    pub fn from_record(record: &PolicyRecord) -> Option<Self> {
        if !record.is_enabled() {
            return None;
        }
        let rules = record.rules();
        let excluded = rules.get_str("excludedSpecialChars").unwrap_or("");

        match rules.get_str("allowedSpecialChars") {
            Some(allowed) => Some(Self::Allowed(
                allowed.chars().filter(|c| !excluded.contains(*c)).collect(),
            )),
            None if !excluded.is_empty() => Some(Self::Excluded(excluded.to_string())),
            None => None,
        }
    }

    fn alphabet(&self) -> String {
        match self {
            Self::Allowed(set) => format!("[A-Za-z0-9{}]+", class_escape(set)),
            Self::Excluded(set) => format!(r"[\x21-\x7E&&[^{}]]+", class_escape(set)),
        }
    }

    fn special_class(&self) -> Option<String> {
        match self {
            Self::Allowed(set) if set.is_empty() => None,
            Self::Allowed(set) => Some(format!("[{}]", class_escape(set))),
            Self::Excluded(set) => Some(format!("[^A-Za-z0-9{}]", class_escape(set))),
        }
    }
}

/// Escape every character so the set can sit inside a `[...]` class
fn class_escape(set: &str) -> String {
    set.chars().map(|c| regex::escape(&c.to_string())).collect()
}

/// Rewrite the alphabet and required classes of `config`
pub(crate) fn apply_character_rules(
    config: &mut PasswordConfig,
    complexity: Option<Complexity>,
    specials: Option<&SpecialChars>,
) {
    let special_class = match specials {
        Some(specials) => {
            config.password_regex_pattern = specials.alphabet();
            specials.special_class()
        }
        None => Some(DEFAULT_SPECIAL_CLASS.to_string()),
    };

    match complexity {
        Some(flags) => {
            let mut classes = Vec::with_capacity(4);
            if flags.upper {
                classes.push(UPPERCASE_CLASS.to_string());
            }
            if flags.lower {
                classes.push(LOWERCASE_CLASS.to_string());
            }
            if flags.digit {
                classes.push(DIGIT_CLASS.to_string());
            }
            if flags.special {
                match &special_class {
                    Some(class) => classes.push(class.clone()),
                    None => warn!("special character required but none are allowed; skipping"),
                }
            }
            config.required_character_classes = classes;
        }
        None if specials.is_some() => {
            let classes = std::mem::take(&mut config.required_character_classes);
            config.required_character_classes = classes
                .into_iter()
                .filter_map(|class| {
                    if class == DEFAULT_SPECIAL_CLASS {
                        special_class.clone()
                    } else {
                        Some(class)
                    }
                })
                .collect();
        }
        None => {}
    }
}
