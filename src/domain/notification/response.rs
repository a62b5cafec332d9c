//! Response tokens carried by the two answer buttons.
//!
//! A token is `ans_yes_<status id>` or `ans_no_<status id>`. The chat
//! transport limits callback data to 64 bytes; a hyphenated UUID keeps the
//! longest token at 44.

use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::{DomainError, ErrorCode, ReportStatusId};

const YES_PREFIX: &str = "ans_yes_";
const NO_PREFIX: &str = "ans_no_";

/// Upper bound the transport places on callback data.
pub const MAX_TOKEN_LEN: usize = 64;

/// What the participant answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Intent {
    Yes,
    No,
}

/// Decoded `(intent, status id)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResponseToken {
    pub intent: Intent,
    pub status_id: ReportStatusId,
}

impl ResponseToken {
    pub fn new(intent: Intent, status_id: ReportStatusId) -> Self {
        Self { intent, status_id }
    }

    pub fn yes(status_id: ReportStatusId) -> Self {
        Self::new(Intent::Yes, status_id)
    }

    pub fn no(status_id: ReportStatusId) -> Self {
        Self::new(Intent::No, status_id)
    }

    /// Wire form placed in the button's callback data.
    pub fn encode(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ResponseToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = match self.intent {
            Intent::Yes => YES_PREFIX,
            Intent::No => NO_PREFIX,
        };
        write!(f, "{}{}", prefix, self.status_id)
    }
}

impl FromStr for ResponseToken {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (intent, raw_id) = if let Some(rest) = s.strip_prefix(YES_PREFIX) {
            (Intent::Yes, rest)
        } else if let Some(rest) = s.strip_prefix(NO_PREFIX) {
            (Intent::No, rest)
        } else {
            return Err(unrecognized(s));
        };

        let status_id = raw_id.parse::<ReportStatusId>().map_err(|_| unrecognized(s))?;
        Ok(Self::new(intent, status_id))
    }
}

fn unrecognized(token: &str) -> DomainError {
    DomainError::new(
        ErrorCode::ValidationFailed,
        format!("Unrecognized response token: {}", token),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_with_intent_prefix() {
        let id = ReportStatusId::new();
        assert_eq!(ResponseToken::yes(id).encode(), format!("ans_yes_{}", id));
        assert_eq!(ResponseToken::no(id).encode(), format!("ans_no_{}", id));
    }

    #[test]
    fn parses_both_intents() {
        let id = ReportStatusId::new();
        let yes: ResponseToken = format!("ans_yes_{}", id).parse().unwrap();
        let no: ResponseToken = format!("ans_no_{}", id).parse().unwrap();
        assert_eq!(yes, ResponseToken::yes(id));
        assert_eq!(no, ResponseToken::no(id));
    }

    #[test]
    fn tokens_fit_the_transport_limit() {
        let token = ResponseToken::yes(ReportStatusId::new()).encode();
        assert!(token.len() <= MAX_TOKEN_LEN);
    }

    #[test]
    fn rejects_unknown_prefix_and_bad_id() {
        assert!("ans_maybe_1".parse::<ResponseToken>().is_err());
        assert!("ans_yes_not-a-uuid".parse::<ResponseToken>().is_err());
        assert!("".parse::<ResponseToken>().is_err());
    }
}
