//! The interactive-authentication challenge body.
//!
//! A 401 carrying `flows` is not an error to classify: it is the server
//! asking the client to authenticate further. Only the structure is parsed
//! here; driving the stages is left to the caller.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Wire key whose presence marks a body as a challenge.
pub const FLOWS: &str = "flows";

/// A challenge returned by an endpoint that requires interactive auth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UiaChallenge {
    /// Alternative sequences of stages, any one of which completes auth.
    pub flows: Vec<AuthFlow>,
    /// Stage type to stage-specific parameters.
    #[serde(default)]
    pub params: Map<String, Value>,
    /// Must be echoed back on the next attempt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session: Option<String>,
    /// Stages already completed in this session.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<Vec<String>>,
    /// Set when the previous attempt at a stage failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errcode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// One sequence of stages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthFlow {
    pub stages: Vec<String>,
}

impl UiaChallenge {
    /// Stages of `flow` not yet listed in `completed`.
    pub fn remaining_stages<'a>(&self, flow: &'a AuthFlow) -> Vec<&'a str> {
        let completed = self.completed.as_deref().unwrap_or_default();
        flow.stages
            .iter()
            .filter(|stage| !completed.contains(stage))
            .map(String::as_str)
            .collect()
    }

    /// Parameters for one stage type, e.g. `m.login.recaptcha`.
    pub fn params_for(&self, stage: &str) -> Option<&Value> {
        self.params.get(stage)
    }
}
