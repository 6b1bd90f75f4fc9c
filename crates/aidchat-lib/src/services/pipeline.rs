// Request Pipelines
//
// Both pipelines run `Idle -> Sending -> Idle`. The Sending phase is owned by
// a `BusyGuard`: acquiring it sets the pipeline's busy flag, releasing or
// dropping it clears the flag. The settle functions turn the backend result
// into transcript and feedback mutations and return the events to publish;
// the caller releases the guard first so observers never see a finished
// result next to a busy pipeline.

use std::sync::{Arc, Mutex};

use tokio::sync::broadcast;

use super::error::{
    ClientError, ClientErrorCode, ClientResult, CHAT_FAILED_MESSAGE, DOCUMENT_FAILED_MESSAGE,
    NETWORK_FAILED_MESSAGE,
};
use super::session::{lock_state, SessionState};
use crate::models::{
    CallStatus, DocumentAnalysis, Message, Notice, PipelineKind, SessionEvent,
};

/// Why a submission was dropped without side effects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// Input was empty after trimming
    BlankInput,
    /// The same pipeline already has a call in flight
    Busy,
}

/// Result of one chat submission
#[derive(Debug, Clone, PartialEq)]
pub enum ChatOutcome {
    Ignored(IgnoreReason),
    /// No credential; nothing was sent and the view should go to login
    AuthRequired,
    /// The assistant replied; the reply is already in the transcript
    Replied(Message),
    /// The call failed; `message` is what the view shows
    Failed {
        message: String,
        code: ClientErrorCode,
    },
}

/// Result of one document submission
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentOutcome {
    Ignored(IgnoreReason),
    AuthRequired,
    /// Analysis succeeded; the analysis message is already in the transcript
    Analyzed(Message),
    Failed {
        message: String,
        code: ClientErrorCode,
    },
}

impl ChatOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, ChatOutcome::Failed { .. })
    }
}

impl DocumentOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, DocumentOutcome::Failed { .. })
    }
}

/// Scoped ownership of one pipeline's busy flag
pub(crate) struct BusyGuard {
    kind: PipelineKind,
    state: Arc<Mutex<SessionState>>,
    events: broadcast::Sender<SessionEvent>,
    released: bool,
}

impl BusyGuard {
    /// Mark `kind` busy. The caller must already hold the state lock and
    /// pass the locked state in; the guard keeps only the shared handle.
    pub(crate) fn acquire(
        kind: PipelineKind,
        locked: &mut SessionState,
        state: Arc<Mutex<SessionState>>,
        events: broadcast::Sender<SessionEvent>,
    ) -> Self {
        locked.pipeline_mut(kind).busy = true;
        let _ = events.send(SessionEvent::BusyChanged {
            pipeline: kind,
            busy: true,
        });
        log::debug!("[{}] busy", kind);
        Self {
            kind,
            state,
            events,
            released: false,
        }
    }

    /// Clear the busy flag inside an existing critical section
    pub(crate) fn release(mut self, locked: &mut SessionState) {
        locked.pipeline_mut(self.kind).busy = false;
        self.released = true;
        self.announce_idle();
    }

    fn announce_idle(&self) {
        let _ = self.events.send(SessionEvent::BusyChanged {
            pipeline: self.kind,
            busy: false,
        });
        log::debug!("[{}] idle", self.kind);
    }
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        lock_state(&self.state).pipeline_mut(self.kind).busy = false;
        self.announce_idle();
    }
}

/// A settled call: what the caller gets back and what observers are told
pub(crate) struct Settled<T> {
    pub outcome: T,
    pub events: Vec<SessionEvent>,
}

/// Apply a finished chat call to the session
pub(crate) fn settle_chat(
    state: &mut SessionState,
    result: ClientResult<String>,
) -> Settled<ChatOutcome> {
    match result {
        Ok(reply) => {
            let message = Message::assistant(reply);
            let len = state.transcript.append(message.clone());
            state.chat.last_status = Some(CallStatus::Succeeded);
            log::info!("[chat] Reply appended ({} messages)", len);
            Settled {
                outcome: ChatOutcome::Replied(message),
                events: vec![SessionEvent::TranscriptAppended { len }],
            }
        }
        Err(err) => {
            let message = err.user_message(CHAT_FAILED_MESSAGE);
            log::warn!("[chat] Call failed: {}", err);
            state.chat.last_status = Some(CallStatus::Failed);
            state.last_error = Some(message.clone());
            Settled {
                events: vec![SessionEvent::ErrorRaised(message.clone())],
                outcome: ChatOutcome::Failed {
                    message,
                    code: err.code(),
                },
            }
        }
    }
}

/// Apply a finished document analysis call to the session
pub(crate) fn settle_document(
    state: &mut SessionState,
    result: ClientResult<DocumentAnalysis>,
) -> Settled<DocumentOutcome> {
    match result {
        Ok(analysis) => {
            let message = Message::analysis(analysis);
            let len = state.transcript.append(message.clone());
            state.document.last_status = Some(CallStatus::Succeeded);
            log::info!("[document] Analysis appended ({} messages)", len);
            Settled {
                outcome: DocumentOutcome::Analyzed(message),
                events: vec![SessionEvent::TranscriptAppended { len }],
            }
        }
        Err(err) => {
            let message = document_failure_text(&err);
            log::warn!("[document] Call failed: {}", err);
            state.document.last_status = Some(CallStatus::Failed);
            let notice = Notice::new(message.clone());
            state.notification = Some(notice.clone());
            Settled {
                events: vec![SessionEvent::Notification(notice)],
                outcome: DocumentOutcome::Failed {
                    message,
                    code: err.code(),
                },
            }
        }
    }
}

fn document_failure_text(err: &ClientError) -> String {
    match err {
        ClientError::Transport(_) => NETWORK_FAILED_MESSAGE.to_string(),
        _ => match err.detail() {
            Some(detail) => format!("{}: {}", DOCUMENT_FAILED_MESSAGE, detail),
            None => DOCUMENT_FAILED_MESSAGE.to_string(),
        },
    }
}
