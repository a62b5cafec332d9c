//! ResponseIngress - turns raw button callbacks into workflow calls.
//!
//! Transport-agnostic: it receives the opaque token string and returns the
//! short acknowledgement the transport shows to the participant.

use std::sync::Arc;

use tracing::{debug, error, warn};

use crate::application::workflow::{ResponseOutcome, WorkflowEngine};
use crate::domain::foundation::DomainError;
use crate::domain::notification::{Intent, ResponseToken};

pub const ACK_YES: &str = "Answer 'Yes' accepted!";
pub const ACK_NO: &str = "Answer 'No' accepted.";
pub const ACK_UNKNOWN: &str = "Unknown action.";
pub const ACK_FAILED: &str = "Something went wrong.";

/// Dispatches decoded callbacks to the [`WorkflowEngine`].
pub struct ResponseIngress {
    engine: Arc<WorkflowEngine>,
}

impl ResponseIngress {
    pub fn new(engine: Arc<WorkflowEngine>) -> Self {
        Self { engine }
    }

    /// Handles one callback and returns the acknowledgement text.
    ///
    /// Never fails: unknown tokens and workflow errors are logged and turned
    /// into a neutral acknowledgement.
    pub async fn handle(&self, raw_token: &str) -> &'static str {
        let token = match raw_token.parse::<ResponseToken>() {
            Ok(token) => token,
            Err(_) => {
                warn!(token = raw_token, "Unrecognized callback token");
                return ACK_UNKNOWN;
            }
        };

        match self.dispatch(token).await {
            Ok(outcome) => {
                debug!(status_id = %token.status_id, ?outcome, "Callback processed");
                match token.intent {
                    Intent::Yes => ACK_YES,
                    Intent::No => ACK_NO,
                }
            }
            Err(err) => {
                error!(status_id = %token.status_id, error = %err, "Callback processing failed");
                ACK_FAILED
            }
        }
    }

    /// Routes an already decoded token.
    pub async fn dispatch(&self, token: ResponseToken) -> Result<ResponseOutcome, DomainError> {
        match token.intent {
            Intent::Yes => self.engine.process_yes(token.status_id).await,
            Intent::No => self.engine.process_no(token.status_id).await,
        }
    }
}
