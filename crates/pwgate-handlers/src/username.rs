use pwgate_core::{HandlerError, PasswordHandler, ValidationCode, ValidationContext};

/// Width of every password substring compared against the username
pub const SEQUENCE_LEN: usize = 3;

/// Rejects passwords containing a 3-character run that also appears in the username.
///
/// Windows start at positions `0..=len - max(N, 3)` of the password, where `N` is the
/// configured max consecutive letters. Comparison is case-sensitive.
pub struct UsernameSequenceHandler {
    max_consecutive: usize,
}

impl UsernameSequenceHandler {
    pub fn new(max_consecutive: usize) -> Self {
        Self { max_consecutive }
    }

    /// First password window that also occurs in the username
    fn shared_sequence(&self, username: &str, password: &str) -> Option<String> {
        let chars: Vec<char> = password.chars().collect();
        let last_start = chars
            .len()
            .checked_sub(self.max_consecutive.max(SEQUENCE_LEN))?;

        (0..=last_start)
            .map(|start| chars[start..start + SEQUENCE_LEN].iter().collect::<String>())
            .find(|seq| username.contains(seq.as_str()))
    }
}

impl Default for UsernameSequenceHandler {
    fn default() -> Self {
        Self::new(3)
    }
}

impl PasswordHandler for UsernameSequenceHandler {
    fn id(&self) -> &'static str {
        "username_sequence"
    }

    fn validate(&self, ctx: &mut ValidationContext) -> Result<bool, HandlerError> {
        if ctx.username.is_empty() || ctx.password.is_empty() {
            return Ok(ctx.reject(ValidationCode::UserOrPasswordNotNull));
        }

        if self.shared_sequence(&ctx.username, &ctx.password).is_some() {
            return Ok(ctx.reject(ValidationCode::UsernameSequenceViolation));
        }
        Ok(true)
    }
}
