// Chat Session
//
// Owns the transcript and the transient view flags for one conversation and
// drives both request pipelines against the backend. State mutations happen
// under a short-lived lock that is never held across an await, so the chat
// and document pipelines can be in flight at the same time; their appends
// land in completion order.

use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::broadcast;

use super::api::{AssistantBackend, DocumentUpload};
use super::credential::{Credential, CredentialGate, CredentialStore};
use super::error::LOGIN_REQUIRED_MESSAGE;
use super::pipeline::{
    settle_chat, settle_document, BusyGuard, ChatOutcome, DocumentOutcome, IgnoreReason, Settled,
};
use super::transcript::Transcript;
use crate::models::{
    Message, Notice, PipelineKind, PipelineState, SessionEvent, SessionSnapshot,
};
use crate::utils::shared_store::preview;

const EVENT_CAPACITY: usize = 256;

/// Mutable state behind a session
#[derive(Debug, Default)]
pub(crate) struct SessionState {
    pub transcript: Transcript,
    pub input: String,
    pub chat: PipelineState,
    pub document: PipelineState,
    pub last_error: Option<String>,
    pub notification: Option<Notice>,
    pub auth_redirect: bool,
}

impl SessionState {
    pub(crate) fn pipeline_mut(&mut self, kind: PipelineKind) -> &mut PipelineState {
        match kind {
            PipelineKind::Chat => &mut self.chat,
            PipelineKind::Document => &mut self.document,
        }
    }

    /// Feedback is shown once and cleared by the next user action
    fn clear_feedback(&mut self) {
        self.last_error = None;
        self.notification = None;
        self.auth_redirect = false;
    }

    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            messages: self.transcript.messages().to_vec(),
            input: self.input.clone(),
            chat: self.chat.clone(),
            document: self.document.clone(),
            last_error: self.last_error.clone(),
            notification: self.notification.clone(),
            auth_redirect: self.auth_redirect,
        }
    }
}

/// Lock session state, recovering from a poisoned lock
pub(crate) fn lock_state(state: &Mutex<SessionState>) -> MutexGuard<'_, SessionState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// One conversation with the assistant. Cloning yields another handle to the
/// same session.
#[derive(Clone)]
pub struct ChatSession {
    backend: Arc<dyn AssistantBackend>,
    gate: CredentialGate,
    state: Arc<Mutex<SessionState>>,
    events: broadcast::Sender<SessionEvent>,
}

impl ChatSession {
    pub fn new(backend: Arc<dyn AssistantBackend>, credentials: Arc<dyn CredentialStore>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            backend,
            gate: CredentialGate::new(credentials),
            state: Arc::new(Mutex::new(SessionState::default())),
            events,
        }
    }

    /// Receive every event published after this call
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.lock().snapshot()
    }

    pub fn transcript_len(&self) -> usize {
        self.lock().transcript.len()
    }

    /// Messages appended after the first `seen`
    pub fn messages_since(&self, seen: usize) -> Vec<Message> {
        self.lock().transcript.since(seen).to_vec()
    }

    pub fn is_busy(&self, kind: PipelineKind) -> bool {
        match kind {
            PipelineKind::Chat => self.lock().chat.busy,
            PipelineKind::Document => self.lock().document.busy,
        }
    }

    pub fn set_input(&self, text: impl Into<String>) {
        self.lock().input = text.into();
    }

    /// Session validity check run when the view mounts. Returns false (and
    /// requests navigation to login) when no credential is stored.
    pub fn mount(&self) -> bool {
        match self.gate.require_credential() {
            Ok(_) => true,
            Err(_) => {
                log::info!("[session] No credential at mount, redirecting to login");
                self.lock().auth_redirect = true;
                self.emit(SessionEvent::AuthRedirect);
                false
            }
        }
    }

    /// Submit whatever is currently in the input field
    pub async fn submit_input(&self) -> ChatOutcome {
        let text = self.lock().input.clone();
        self.submit_text(&text).await
    }

    /// Chat turn pipeline
    pub async fn submit_text(&self, text: &str) -> ChatOutcome {
        let (credential, guard) = {
            let mut state = self.lock();
            if state.chat.busy {
                log::debug!("[chat] Submission rejected, call in flight");
                return ChatOutcome::Ignored(IgnoreReason::Busy);
            }
            state.clear_feedback();
            if text.trim().is_empty() {
                return ChatOutcome::Ignored(IgnoreReason::BlankInput);
            }

            let Some(credential) = self.check_credential(&mut state, PipelineKind::Chat) else {
                return ChatOutcome::AuthRequired;
            };

            let len = state.transcript.append(Message::user(text));
            self.emit(SessionEvent::TranscriptAppended { len });
            state.input.clear();

            let guard = BusyGuard::acquire(
                PipelineKind::Chat,
                &mut state,
                self.state.clone(),
                self.events.clone(),
            );
            (credential, guard)
        };

        log::info!(
            "[chat] Sending query via {}: {}",
            self.backend.name(),
            preview(text, 40)
        );
        let result = self.backend.chat(&credential, text).await;

        let settled = {
            let mut state = self.lock();
            let settled = settle_chat(&mut state, result);
            guard.release(&mut state);
            settled
        };
        self.publish(settled)
    }

    /// Document analysis pipeline. The file itself is the turn, so no user
    /// message is appended.
    pub async fn submit_file(&self, upload: DocumentUpload) -> DocumentOutcome {
        let (credential, guard) = {
            let mut state = self.lock();
            if state.document.busy {
                log::debug!("[document] Submission rejected, call in flight");
                return DocumentOutcome::Ignored(IgnoreReason::Busy);
            }
            state.clear_feedback();

            let Some(credential) = self.check_credential(&mut state, PipelineKind::Document)
            else {
                return DocumentOutcome::AuthRequired;
            };

            let guard = BusyGuard::acquire(
                PipelineKind::Document,
                &mut state,
                self.state.clone(),
                self.events.clone(),
            );
            (credential, guard)
        };

        log::info!(
            "[document] Uploading {} ({} bytes) via {}",
            upload.file_name,
            upload.bytes.len(),
            self.backend.name()
        );
        let result = self.backend.analyze_document(&credential, upload).await;

        let settled = {
            let mut state = self.lock();
            let settled = settle_document(&mut state, result);
            guard.release(&mut state);
            settled
        };
        self.publish(settled)
    }

    /// Gate check before a pipeline call. On failure the chat pipeline uses
    /// the inline error slot and the document pipeline a notification; both
    /// request the login redirect.
    fn check_credential(
        &self,
        state: &mut SessionState,
        kind: PipelineKind,
    ) -> Option<Credential> {
        match self.gate.require_credential() {
            Ok(credential) => Some(credential),
            Err(_) => {
                log::info!("[{}] No credential, aborting before any request", kind);
                match kind {
                    PipelineKind::Chat => {
                        state.last_error = Some(LOGIN_REQUIRED_MESSAGE.to_string());
                        self.emit(SessionEvent::ErrorRaised(LOGIN_REQUIRED_MESSAGE.to_string()));
                    }
                    PipelineKind::Document => {
                        let notice = Notice::new(LOGIN_REQUIRED_MESSAGE);
                        state.notification = Some(notice.clone());
                        self.emit(SessionEvent::Notification(notice));
                    }
                }
                state.auth_redirect = true;
                self.emit(SessionEvent::AuthRedirect);
                None
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        lock_state(&self.state)
    }

    /// Publish the events of a settled call after its busy flag is cleared
    fn publish<T>(&self, settled: Settled<T>) -> T {
        for event in settled.events {
            self.emit(event);
        }
        settled.outcome
    }

    fn emit(&self, event: SessionEvent) {
        // No subscribers is fine; the snapshot still reflects the change
        let _ = self.events.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use tokio::sync::Notify;

    use crate::models::{CallStatus, DocumentAnalysis, MessageRole, ANALYSIS_HEADER};
    use crate::services::credential::InMemoryCredentialStore;
    use crate::services::error::{
        ClientError, ClientErrorCode, ClientResult, CHAT_FAILED_MESSAGE, DOCUMENT_FAILED_MESSAGE,
        NETWORK_FAILED_MESSAGE,
    };

    /// Backend double that replays queued results. A gate, when set, holds
    /// each call until the test releases it.
    #[derive(Default)]
    struct ScriptedBackend {
        chat_results: Mutex<VecDeque<ClientResult<String>>>,
        analysis_results: Mutex<VecDeque<ClientResult<DocumentAnalysis>>>,
        chat_gate: Option<Arc<Notify>>,
        document_gate: Option<Arc<Notify>>,
        chat_calls: AtomicUsize,
        document_calls: AtomicUsize,
        queries: Mutex<Vec<String>>,
    }

    impl ScriptedBackend {
        fn with_chat(results: Vec<ClientResult<String>>) -> Self {
            Self {
                chat_results: Mutex::new(results.into()),
                ..Default::default()
            }
        }

        fn with_analysis(results: Vec<ClientResult<DocumentAnalysis>>) -> Self {
            Self {
                analysis_results: Mutex::new(results.into()),
                ..Default::default()
            }
        }
    }

    #[async_trait]
    impl AssistantBackend for ScriptedBackend {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn chat(&self, _credential: &Credential, query: &str) -> ClientResult<String> {
            self.chat_calls.fetch_add(1, Ordering::SeqCst);
            self.queries.lock().unwrap().push(query.to_string());
            if let Some(gate) = &self.chat_gate {
                gate.notified().await;
            }
            self.chat_results
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(ClientError::protocol(None, None, "script exhausted")))
        }

        async fn analyze_document(
            &self,
            _credential: &Credential,
            _upload: DocumentUpload,
        ) -> ClientResult<DocumentAnalysis> {
            self.document_calls.fetch_add(1, Ordering::SeqCst);
            if let Some(gate) = &self.document_gate {
                gate.notified().await;
            }
            self.analysis_results
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(ClientError::protocol(None, None, "script exhausted")))
        }

        async fn login(&self, _email: &str, _password: &str) -> ClientResult<Credential> {
            Err(ClientError::protocol(Some(401), None, "not scripted"))
        }
    }

    fn sample_analysis() -> DocumentAnalysis {
        DocumentAnalysis {
            document_type: "official_letter".to_string(),
            sender: "Social Welfare Department".to_string(),
            recipient: "Applicant".to_string(),
            date: "2024-05-01".to_string(),
            key_items: vec!["Deadline: May 31".to_string()],
            summary: "Submit documents".to_string(),
            suggested_actions: vec!["Fill out application form".to_string()],
        }
    }

    fn logged_in(backend: Arc<ScriptedBackend>) -> ChatSession {
        ChatSession::new(backend, Arc::new(InMemoryCredentialStore::with_token("tok")))
    }

    fn logged_out(backend: Arc<ScriptedBackend>) -> ChatSession {
        ChatSession::new(backend, Arc::new(InMemoryCredentialStore::new()))
    }

    fn upload() -> DocumentUpload {
        DocumentUpload::new("letter.pdf", b"%PDF-1.4".to_vec())
    }

    async fn wait_for_busy(rx: &mut broadcast::Receiver<SessionEvent>, kind: PipelineKind) {
        loop {
            if let SessionEvent::BusyChanged { pipeline, busy: true } = rx.recv().await.unwrap() {
                if pipeline == kind {
                    return;
                }
            }
        }
    }

    #[tokio::test]
    async fn test_successful_turn_appends_user_then_assistant() {
        let backend = Arc::new(ScriptedBackend::with_chat(vec![Ok(
            "You may be eligible for...".to_string()
        )]));
        let session = logged_in(backend.clone());

        let outcome = session.submit_text("What benefits can I apply for?").await;

        assert!(matches!(outcome, ChatOutcome::Replied(_)));
        let snapshot = session.snapshot();
        assert_eq!(snapshot.messages.len(), 2);
        assert_eq!(snapshot.messages[0].role, MessageRole::User);
        assert_eq!(snapshot.messages[0].content, "What benefits can I apply for?");
        assert_eq!(snapshot.messages[1].role, MessageRole::Assistant);
        assert_eq!(snapshot.messages[1].content, "You may be eligible for...");
        assert!(!snapshot.chat.busy);
        assert_eq!(snapshot.chat.last_status, Some(CallStatus::Succeeded));
        assert!(snapshot.last_error.is_none());
        assert_eq!(backend.chat_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_query_is_sent_untrimmed() {
        let backend = Arc::new(ScriptedBackend::with_chat(vec![Ok("ok".to_string())]));
        let session = logged_in(backend.clone());

        session.submit_text("  padded  ").await;

        assert_eq!(backend.queries.lock().unwrap().as_slice(), ["  padded  "]);
        assert_eq!(session.snapshot().messages[0].content, "  padded  ");
    }

    #[tokio::test]
    async fn test_blank_input_is_ignored() {
        let backend = Arc::new(ScriptedBackend::default());
        let session = logged_in(backend.clone());

        for text in ["", "   ", "\n\t"] {
            assert_eq!(
                session.submit_text(text).await,
                ChatOutcome::Ignored(IgnoreReason::BlankInput)
            );
        }

        let snapshot = session.snapshot();
        assert!(snapshot.messages.is_empty());
        assert!(!snapshot.chat.busy);
        assert!(snapshot.last_error.is_none());
        assert_eq!(backend.chat_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_submit_input_clears_the_field() {
        let backend = Arc::new(ScriptedBackend::with_chat(vec![Ok("hi".to_string())]));
        let session = logged_in(backend);

        session.set_input("hello");
        assert_eq!(session.snapshot().input, "hello");
        session.submit_input().await;

        let snapshot = session.snapshot();
        assert!(snapshot.input.is_empty());
        assert_eq!(snapshot.messages.len(), 2);
    }

    #[tokio::test]
    async fn test_missing_credential_blocks_chat_without_network() {
        let backend = Arc::new(ScriptedBackend::with_chat(vec![Ok("never".to_string())]));
        let session = logged_out(backend.clone());
        let mut rx = session.subscribe();

        assert_eq!(session.submit_text("hello").await, ChatOutcome::AuthRequired);

        let snapshot = session.snapshot();
        assert!(snapshot.messages.is_empty());
        assert_eq!(snapshot.last_error.as_deref(), Some(LOGIN_REQUIRED_MESSAGE));
        assert!(snapshot.auth_redirect);
        assert!(!snapshot.chat.busy);
        assert_eq!(backend.chat_calls.load(Ordering::SeqCst), 0);

        assert_eq!(
            rx.try_recv().unwrap(),
            SessionEvent::ErrorRaised(LOGIN_REQUIRED_MESSAGE.to_string())
        );
        assert_eq!(rx.try_recv().unwrap(), SessionEvent::AuthRedirect);
    }

    #[tokio::test]
    async fn test_mount_checks_credential() {
        let backend = Arc::new(ScriptedBackend::default());

        let session = logged_out(backend.clone());
        assert!(!session.mount());
        assert!(session.snapshot().auth_redirect);
        assert!(session.snapshot().last_error.is_none());

        let session = logged_in(backend);
        assert!(session.mount());
        assert!(!session.snapshot().auth_redirect);
    }

    #[tokio::test]
    async fn test_chat_failure_messages() {
        let backend = Arc::new(ScriptedBackend::with_chat(vec![
            Err(ClientError::protocol(Some(500), Some("rate limited".into()), "status 500")),
            Err(ClientError::protocol(Some(502), None, "status 502")),
            Err(ClientError::Transport("connection refused".into())),
        ]));
        let session = logged_in(backend);

        let first = session.submit_text("one").await;
        assert_eq!(
            first,
            ChatOutcome::Failed {
                message: "rate limited".to_string(),
                code: ClientErrorCode::Protocol
            }
        );
        assert_eq!(session.snapshot().last_error.as_deref(), Some("rate limited"));

        session.submit_text("two").await;
        assert_eq!(session.snapshot().last_error.as_deref(), Some(CHAT_FAILED_MESSAGE));

        let third = session.submit_text("three").await;
        assert!(matches!(
            third,
            ChatOutcome::Failed {
                code: ClientErrorCode::Transport,
                ..
            }
        ));
        let snapshot = session.snapshot();
        assert_eq!(snapshot.last_error.as_deref(), Some(NETWORK_FAILED_MESSAGE));
        assert_eq!(snapshot.chat.last_status, Some(CallStatus::Failed));
        assert!(!snapshot.chat.busy);

        // Failed turns keep their user message and add nothing else
        let contents: Vec<&str> = snapshot.messages.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, ["one", "two", "three"]);
    }

    #[tokio::test]
    async fn test_error_is_cleared_by_next_submission() {
        let backend = Arc::new(ScriptedBackend::with_chat(vec![
            Err(ClientError::Transport("timeout".into())),
            Ok("recovered".to_string()),
        ]));
        let session = logged_in(backend);

        session.submit_text("first").await;
        assert!(session.snapshot().last_error.is_some());

        session.submit_text("second").await;
        let snapshot = session.snapshot();
        assert!(snapshot.last_error.is_none());
        assert_eq!(snapshot.messages.len(), 3);
        assert_eq!(snapshot.messages[2].content, "recovered");
    }

    #[tokio::test]
    async fn test_event_order_for_one_turn() {
        let backend = Arc::new(ScriptedBackend::with_chat(vec![Ok("reply".to_string())]));
        let session = logged_in(backend);
        let mut rx = session.subscribe();

        session.submit_text("hello").await;

        let events: Vec<SessionEvent> = std::iter::from_fn(|| rx.try_recv().ok()).collect();
        assert_eq!(
            events,
            vec![
                SessionEvent::TranscriptAppended { len: 1 },
                SessionEvent::BusyChanged {
                    pipeline: PipelineKind::Chat,
                    busy: true
                },
                SessionEvent::BusyChanged {
                    pipeline: PipelineKind::Chat,
                    busy: false
                },
                SessionEvent::TranscriptAppended { len: 2 },
            ]
        );
    }

    #[tokio::test]
    async fn test_pipeline_is_idle_when_result_is_observed() {
        let backend = Arc::new(ScriptedBackend {
            chat_results: Mutex::new(vec![Err(ClientError::Transport("refused".into()))].into()),
            analysis_results: Mutex::new(vec![Ok(sample_analysis())].into()),
            ..Default::default()
        });
        let session = logged_in(backend);
        let mut rx = session.subscribe();

        session.submit_text("hello").await;
        session.submit_file(upload()).await;

        // Track busy flags the way a subscriber would, from the stream alone
        let (mut chat_busy, mut document_busy) = (false, false);
        let mut results = 0;
        while let Ok(event) = rx.try_recv() {
            match event {
                SessionEvent::BusyChanged { pipeline, busy } => match pipeline {
                    PipelineKind::Chat => chat_busy = busy,
                    PipelineKind::Document => document_busy = busy,
                },
                SessionEvent::ErrorRaised(_) => {
                    assert!(!chat_busy);
                    results += 1;
                }
                SessionEvent::TranscriptAppended { len: 2 } => {
                    assert!(!document_busy);
                    results += 1;
                }
                _ => {}
            }
        }
        assert_eq!(results, 2);
    }

    #[tokio::test]
    async fn test_chat_is_exclusive_while_sending() {
        let gate = Arc::new(Notify::new());
        let backend = Arc::new(ScriptedBackend {
            chat_results: Mutex::new(vec![Ok("first reply".to_string())].into()),
            chat_gate: Some(gate.clone()),
            ..Default::default()
        });
        let session = logged_in(backend.clone());
        let mut rx = session.subscribe();

        let pending = tokio::spawn({
            let session = session.clone();
            async move { session.submit_text("first").await }
        });
        wait_for_busy(&mut rx, PipelineKind::Chat).await;

        assert!(session.is_busy(PipelineKind::Chat));
        assert_eq!(session.snapshot().chat.phase(), crate::models::PipelinePhase::Sending);
        assert_eq!(
            session.submit_text("second").await,
            ChatOutcome::Ignored(IgnoreReason::Busy)
        );

        gate.notify_one();
        assert!(matches!(pending.await.unwrap(), ChatOutcome::Replied(_)));

        let snapshot = session.snapshot();
        assert!(!snapshot.chat.busy);
        assert_eq!(snapshot.messages.len(), 2);
        assert_eq!(backend.chat_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_document_proceeds_while_chat_is_pending() {
        let gate = Arc::new(Notify::new());
        let backend = Arc::new(ScriptedBackend {
            chat_results: Mutex::new(vec![Ok("late reply".to_string())].into()),
            analysis_results: Mutex::new(vec![Ok(sample_analysis())].into()),
            chat_gate: Some(gate.clone()),
            ..Default::default()
        });
        let session = logged_in(backend);
        let mut rx = session.subscribe();

        let pending = tokio::spawn({
            let session = session.clone();
            async move { session.submit_text("question").await }
        });
        wait_for_busy(&mut rx, PipelineKind::Chat).await;

        let outcome = session.submit_file(upload()).await;
        assert!(matches!(outcome, DocumentOutcome::Analyzed(_)));
        assert!(session.is_busy(PipelineKind::Chat));
        assert!(!session.is_busy(PipelineKind::Document));

        gate.notify_one();
        pending.await.unwrap();

        // Appends land in completion order
        let contents: Vec<String> = session
            .snapshot()
            .messages
            .into_iter()
            .map(|m| m.content)
            .collect();
        assert_eq!(contents, ["question", ANALYSIS_HEADER, "late reply"]);
    }

    #[tokio::test]
    async fn test_dropped_call_releases_busy() {
        let gate = Arc::new(Notify::new());
        let backend = Arc::new(ScriptedBackend {
            chat_gate: Some(gate),
            ..Default::default()
        });
        let session = logged_in(backend);
        let mut rx = session.subscribe();

        let pending = tokio::spawn({
            let session = session.clone();
            async move { session.submit_text("never answered").await }
        });
        wait_for_busy(&mut rx, PipelineKind::Chat).await;

        pending.abort();
        assert!(pending.await.unwrap_err().is_cancelled());

        assert!(!session.is_busy(PipelineKind::Chat));
        assert_eq!(session.snapshot().messages.len(), 1);
    }

    #[tokio::test]
    async fn test_document_success_appends_analysis_only() {
        let backend = Arc::new(ScriptedBackend::with_analysis(vec![Ok(sample_analysis())]));
        let session = logged_in(backend.clone());

        let outcome = session.submit_file(upload()).await;

        let DocumentOutcome::Analyzed(message) = outcome else {
            panic!("expected an analysis message");
        };
        assert_eq!(message.role, MessageRole::Assistant);
        assert_eq!(message.content, ANALYSIS_HEADER);
        assert_eq!(message.analysis, Some(sample_analysis()));

        let snapshot = session.snapshot();
        assert_eq!(snapshot.messages.len(), 1);
        assert!(snapshot.notification.is_none());
        assert!(!snapshot.document.busy);
        assert_eq!(snapshot.document.last_status, Some(CallStatus::Succeeded));
        assert_eq!(backend.document_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_document_failure_raises_notification() {
        let backend = Arc::new(ScriptedBackend::with_analysis(vec![
            Err(ClientError::protocol(Some(400), Some("Unsupported file".into()), "status 400")),
            Err(ClientError::protocol(Some(500), None, "status 500")),
        ]));
        let session = logged_in(backend);

        let outcome = session.submit_file(upload()).await;
        assert!(outcome.is_failure());
        let notice = session.snapshot().notification.unwrap();
        assert_eq!(notice.text, "Document analysis failed: Unsupported file");

        session.submit_file(upload()).await;
        let snapshot = session.snapshot();
        assert_eq!(snapshot.notification.unwrap().text, DOCUMENT_FAILED_MESSAGE);
        assert!(snapshot.messages.is_empty());
        assert!(snapshot.last_error.is_none());
        assert!(!snapshot.document.busy);
    }

    #[tokio::test]
    async fn test_missing_credential_blocks_document() {
        let backend = Arc::new(ScriptedBackend::with_analysis(vec![Ok(sample_analysis())]));
        let session = logged_out(backend.clone());

        assert_eq!(session.submit_file(upload()).await, DocumentOutcome::AuthRequired);

        let snapshot = session.snapshot();
        assert_eq!(snapshot.notification, Some(Notice::new(LOGIN_REQUIRED_MESSAGE)));
        assert!(snapshot.auth_redirect);
        assert!(snapshot.messages.is_empty());
        assert_eq!(backend.document_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_document_is_exclusive_while_sending() {
        let gate = Arc::new(Notify::new());
        let backend = Arc::new(ScriptedBackend {
            analysis_results: Mutex::new(vec![Ok(sample_analysis())].into()),
            document_gate: Some(gate.clone()),
            ..Default::default()
        });
        let session = logged_in(backend.clone());
        let mut rx = session.subscribe();

        let pending = tokio::spawn({
            let session = session.clone();
            async move { session.submit_file(upload()).await }
        });
        wait_for_busy(&mut rx, PipelineKind::Document).await;

        assert_eq!(
            session.submit_file(upload()).await,
            DocumentOutcome::Ignored(IgnoreReason::Busy)
        );

        gate.notify_one();
        assert!(matches!(pending.await.unwrap(), DocumentOutcome::Analyzed(_)));
        assert_eq!(backend.document_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_messages_since_tracks_new_entries() {
        let backend = Arc::new(ScriptedBackend::with_chat(vec![
            Ok("a".to_string()),
            Ok("b".to_string()),
        ]));
        let session = logged_in(backend);

        session.submit_text("q1").await;
        let seen = session.transcript_len();
        session.submit_text("q2").await;

        let fresh: Vec<String> = session
            .messages_since(seen)
            .into_iter()
            .map(|m| m.content)
            .collect();
        assert_eq!(fresh, ["q2", "b"]);
    }
}
