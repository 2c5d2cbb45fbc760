//! Stock password policies
use pwgate_core::{keys, PolicyRecord, ValidationRules};

pub const DEFAULT_ALLOWED_SPECIAL_CHARS: &str = "!@#$%^&*()-_=+[]{}|;:,.<>?";
pub const DEFAULT_EXCLUDED_SPECIAL_CHARS: &str = "\"'\\` ";

/// The four policies a fresh installation starts with
pub fn default_policies() -> Vec<PolicyRecord> {
    vec![
        PolicyRecord::new(keys::SIZE, "Password Size")
            .with_description("Minimum and maximum number of characters")
            .with_rules(
                ValidationRules::new()
                    .with("minLength", 8)
                    .with("maxLength", 64),
            )
            .with_priority(1),

        PolicyRecord::new(keys::SPECIAL_CHARS, "Special Characters")
            .with_description("Special characters that may or may not appear in a password")
            .with_rules(
                ValidationRules::new()
                    .with("allowedSpecialChars", DEFAULT_ALLOWED_SPECIAL_CHARS)
                    .with("excludedSpecialChars", DEFAULT_EXCLUDED_SPECIAL_CHARS),
            )
            .with_priority(2),

        PolicyRecord::new(keys::COMPLEXITY, "Complexity")
            .with_description("Character classes every password must contain")
            .with_rules(
                ValidationRules::new()
                    .with("requireUppercase", true)
                    .with("requireLowercase", true)
                    .with("requireDigit", true)
                    .with("requireSpecial", true),
            )
            .with_priority(3),

        PolicyRecord::new(keys::USERNAME_SEQUENCE_EXCLUSION, "Username Sequence Exclusion")
            .with_description("Passwords may not reuse consecutive letters of the username")
            .with_rules(ValidationRules::new().with("maxConsecutiveLetters", 3))
            .with_priority(4),
    ]
}
