// Session state models
// Transient pipeline flags, user-facing notices and the events the session
// publishes to whatever view is rendering it.

use serde::{Deserialize, Serialize};

use super::message::Message;

/// The two request pipelines a session drives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineKind {
    Chat,
    Document,
}

impl std::fmt::Display for PipelineKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelineKind::Chat => write!(f, "chat"),
            PipelineKind::Document => write!(f, "document"),
        }
    }
}

/// Position of a pipeline in its `Idle -> Sending -> Idle` cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelinePhase {
    Idle,
    Sending,
}

/// How the most recent call of a pipeline ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallStatus {
    Succeeded,
    Failed,
}

/// Pending request state for one pipeline
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineState {
    /// True for exactly the lifetime of the call it guards
    pub busy: bool,
    /// Status of the last completed call
    pub last_status: Option<CallStatus>,
}

impl PipelineState {
    pub fn phase(&self) -> PipelinePhase {
        if self.busy {
            PipelinePhase::Sending
        } else {
            PipelinePhase::Idle
        }
    }
}

/// Transient failure notification (toast) raised outside the inline error slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub text: String,
}

impl Notice {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// Events published by a session whenever its observable state changes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A message was appended; `len` is the new transcript length
    TranscriptAppended { len: usize },
    /// A pipeline acquired or released its busy flag
    BusyChanged { pipeline: PipelineKind, busy: bool },
    /// The inline error slot was set
    ErrorRaised(String),
    /// A transient notification was raised
    Notification(Notice),
    /// No credential is available; the view must navigate to login
    AuthRedirect,
}

/// Read-only copy of everything a view needs to render a session
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub messages: Vec<Message>,
    pub input: String,
    pub chat: PipelineState,
    pub document: PipelineState,
    pub last_error: Option<String>,
    pub notification: Option<Notice>,
    pub auth_redirect: bool,
}

impl SessionSnapshot {
    pub fn pipeline(&self, kind: PipelineKind) -> &PipelineState {
        match kind {
            PipelineKind::Chat => &self.chat,
            PipelineKind::Document => &self.document,
        }
    }
}
