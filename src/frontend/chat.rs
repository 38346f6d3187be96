use std::fmt::Write as _;
use std::sync::Arc;

use crate::error::{EvidenceError, RiskError};
use crate::pipeline::RiskPipeline;

/// Reply to `/start`.
pub const WELCOME: &str = "👋 Welcome to the Heart Disease Bot!\n\
Send your info like this:\n\
sex=Male, age=Middle-Aged, cp=Typical-Angina, thalach=High, ca=2\n\
You can mix upper/lowercase and say zero, one, etc.";

/// Reply to a message that is not a list of `key=value` pairs.
pub const FORMAT_HINT: &str = "⚠️ Format error: use key=value pairs separated by commas.";

const RESULT_HEADER: &str = "📊 Estimated Heart Disease Risk:";

/// Conversational adapter: one text message in, one text reply out.
#[derive(Debug, Clone)]
pub struct ChatFrontend {
    pipeline: Arc<RiskPipeline>,
}

impl ChatFrontend {
    /// Creates an adapter over a shared pipeline.
    #[must_use]
    pub fn new(pipeline: Arc<RiskPipeline>) -> Self {
        Self { pipeline }
    }

    /// Replies to one message.
    ///
    /// Returns `None` for commands other than `/start`, which the chat
    /// front-end does not handle.
    #[must_use]
    pub fn reply(&self, text: &str) -> Option<String> {
        let text = text.trim();
        if text.starts_with('/') {
            let command = text.split_whitespace().next().unwrap_or_default();
            return (command == "/start").then(|| WELCOME.to_string());
        }

        let reply = match self.pipeline.assess_message(text) {
            Ok(assessment) => {
                let mut out = RESULT_HEADER.to_string();
                for (state, percentage) in &assessment.probabilities {
                    let _ = write!(out, "\n{state}: {percentage}");
                }
                out
            }
            Err(RiskError::Format(EvidenceError::MissingSeparator { .. })) => {
                FORMAT_HINT.to_string()
            }
            Err(RiskError::Format(err)) => format!("⚠️ Format error: {err}"),
            Err(RiskError::Inference(err)) => format!("⚠️ Error: {err}"),
            Err(err) => format!("⚠️ Error: {err}"),
        };
        Some(reply)
    }
}
