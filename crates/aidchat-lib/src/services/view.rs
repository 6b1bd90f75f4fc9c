// Conversation View
//
// Pure projection of a session snapshot into what a front-end renders. The
// only state kept here is the transcript length last shown, which drives
// scroll-to-newest on append.

use crate::models::{DocumentAnalysis, Message, MessageRole, Notice, SessionSnapshot};

pub const TITLE: &str = "AI Chat";
pub const EMPTY_PLACEHOLDER: &str = "Start your conversation!";
pub const INPUT_PLACEHOLDER: &str = "Please enter your question...";
pub const SEND_LABEL: &str = "Send";
pub const SENDING_LABEL: &str = "Sending...";

/// Everything needed to draw one frame of the conversation screen
#[derive(Debug, Clone, PartialEq)]
pub struct ViewModel {
    pub title: &'static str,
    pub messages: Vec<Message>,
    /// Shown instead of the message list while the transcript is empty
    pub empty_placeholder: Option<&'static str>,
    pub input: String,
    pub input_placeholder: &'static str,
    pub send_label: &'static str,
    /// False while the chat pipeline is sending
    pub can_send: bool,
    /// False while the document pipeline is sending
    pub can_upload: bool,
    pub error_banner: Option<String>,
    pub notification: Option<Notice>,
    pub redirect_to_login: bool,
}

/// A rendered frame plus what changed since the previous one
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub model: ViewModel,
    /// Messages appended since the last frame, in transcript order
    pub appended: Vec<Message>,
    pub scroll_to_newest: bool,
}

#[derive(Debug, Default)]
pub struct ConversationView {
    shown: usize,
}

impl ConversationView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of transcript entries already shown
    pub fn shown(&self) -> usize {
        self.shown
    }

    /// Project a snapshot. Scrolling is triggered by a change in transcript
    /// length only, never by content.
    pub fn refresh(&mut self, snapshot: &SessionSnapshot) -> Frame {
        let len = snapshot.messages.len();
        let appended = snapshot
            .messages
            .get(self.shown..)
            .map(<[Message]>::to_vec)
            .unwrap_or_default();
        let scroll_to_newest = len != self.shown && len > 0;
        self.shown = len;

        Frame {
            model: project(snapshot),
            appended,
            scroll_to_newest,
        }
    }
}

/// Stateless projection of a snapshot
pub fn project(snapshot: &SessionSnapshot) -> ViewModel {
    ViewModel {
        title: TITLE,
        messages: snapshot.messages.clone(),
        empty_placeholder: snapshot.messages.is_empty().then_some(EMPTY_PLACEHOLDER),
        input: snapshot.input.clone(),
        input_placeholder: INPUT_PLACEHOLDER,
        send_label: if snapshot.chat.busy {
            SENDING_LABEL
        } else {
            SEND_LABEL
        },
        can_send: !snapshot.chat.busy,
        can_upload: !snapshot.document.busy,
        error_banner: snapshot.last_error.clone(),
        notification: snapshot.notification.clone(),
        redirect_to_login: snapshot.auth_redirect,
    }
}

/// Plain-text rendering of one message
pub fn render_message(message: &Message) -> String {
    let speaker = match message.role {
        MessageRole::User => "You",
        MessageRole::Assistant => "Assistant",
    };
    match &message.analysis {
        Some(analysis) => format!(
            "{}: {}\n{}",
            speaker,
            message.content,
            render_analysis(analysis)
        ),
        None => format!("{}: {}", speaker, message.content),
    }
}

/// Labelled block for a document analysis record
pub fn render_analysis(analysis: &DocumentAnalysis) -> String {
    let mut out = String::new();
    out.push_str(&format!("  Document type: {}\n", analysis.document_type));
    out.push_str(&format!("  Sender: {}\n", analysis.sender));
    out.push_str(&format!("  Recipient: {}\n", analysis.recipient));
    out.push_str(&format!("  Date: {}\n", analysis.date));
    push_list(&mut out, "Key items", &analysis.key_items);
    out.push_str(&format!("  Summary: {}\n", analysis.summary));
    push_list(&mut out, "Suggested actions", &analysis.suggested_actions);
    out.trim_end().to_string()
}

fn push_list(out: &mut String, label: &str, items: &[String]) {
    out.push_str(&format!("  {}:\n", label));
    if items.is_empty() {
        out.push_str("    (none)\n");
    }
    for item in items {
        out.push_str(&format!("    - {}\n", item));
    }
}
