// Interactive conversation loop
//
// Terminal host for a ChatSession. Typed lines and uploads are queued to one
// worker per pipeline, so the loop keeps reading input and rendering events
// while a call is in flight and a line typed ahead is sent once the previous
// reply settles.

use std::path::PathBuf;

use anyhow::{bail, Result};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use aidchat_lib::services::view::{
    render_message, EMPTY_PLACEHOLDER, INPUT_PLACEHOLDER, SENDING_LABEL, TITLE,
};
use aidchat_lib::{ChatSession, ConversationView, PipelineKind, SessionEvent};

use crate::commands::analyze::load_upload;
use crate::commands::LOGIN_HINT;

const HELP: &str = "Commands: /upload <path>  analyze a document, /help, /quit";
const ANALYZING_LABEL: &str = "Analyzing document...";

#[derive(Debug, PartialEq, Eq)]
enum ReplCommand {
    Send(String),
    Upload(PathBuf),
    Help,
    Quit,
}

fn parse_command(line: &str) -> Result<ReplCommand, String> {
    let trimmed = line.trim();
    let Some(rest) = trimmed.strip_prefix('/') else {
        return Ok(ReplCommand::Send(line.to_string()));
    };

    let (name, arg) = match rest.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (rest, ""),
    };
    match name {
        "quit" | "exit" => Ok(ReplCommand::Quit),
        "help" => Ok(ReplCommand::Help),
        "upload" if arg.is_empty() => Err("Usage: /upload <path>".to_string()),
        "upload" => Ok(ReplCommand::Upload(PathBuf::from(arg))),
        other => Err(format!("Unknown command /{}. {}", other, HELP)),
    }
}

/// Why the loop stopped
#[derive(Debug, PartialEq, Eq)]
enum ExitReason {
    Quit,
    EndOfInput,
    LoginRequired,
    Interrupted,
}

pub async fn run(session: ChatSession) -> Result<()> {
    if !session.mount() {
        bail!(LOGIN_HINT);
    }

    println!("{}", TITLE);
    println!("{}", EMPTY_PLACEHOLDER);
    println!("{}  ({})", INPUT_PLACEHOLDER, HELP);

    let reason = drive(&session, BufReader::new(tokio::io::stdin())).await?;
    log::debug!("[session] Conversation ended: {:?}", reason);
    Ok(())
}

/// Read commands from `input` and render session events until the user
/// quits, input ends or the session asks for a login.
async fn drive<R>(session: &ChatSession, input: R) -> Result<ExitReason>
where
    R: AsyncBufRead + Unpin,
{
    let mut view = ConversationView::new();
    let mut events = session.subscribe();
    let mut lines = input.lines();
    let dispatcher = Dispatcher::spawn(session);

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match parse_command(&line) {
                    Ok(ReplCommand::Quit) => return Ok(ExitReason::Quit),
                    Ok(ReplCommand::Help) => println!("{}", HELP),
                    Ok(ReplCommand::Send(text)) => dispatcher.send_text(session, text),
                    Ok(ReplCommand::Upload(path)) => dispatcher.send_file(session, path),
                    Err(usage) => eprintln!("{}", usage),
                }
            }
            event = events.recv() => {
                let rendered = match event {
                    Ok(event) => render_event(session, &mut view, event),
                    Err(RecvError::Lagged(skipped)) => {
                        log::debug!("[session] Skipped {} events, redrawing", skipped);
                        print_new_messages(session, &mut view)
                    }
                    Err(RecvError::Closed) => return Ok(ExitReason::EndOfInput),
                };
                if rendered.print() {
                    return Ok(ExitReason::LoginRequired);
                }
            }
            _ = tokio::signal::ctrl_c() => return Ok(ExitReason::Interrupted),
        }
    }

    // Input is gone; let queued turns finish, then show what they produced
    tokio::select! {
        _ = dispatcher.finish() => {}
        _ = tokio::signal::ctrl_c() => return Ok(ExitReason::Interrupted),
    }
    loop {
        let rendered = match events.try_recv() {
            Ok(event) => render_event(session, &mut view, event),
            Err(TryRecvError::Lagged(_)) => print_new_messages(session, &mut view),
            Err(TryRecvError::Empty | TryRecvError::Closed) => break,
        };
        if rendered.print() {
            return Ok(ExitReason::LoginRequired);
        }
    }
    Ok(ExitReason::EndOfInput)
}

/// One worker per pipeline, each submitting its queue in order
struct Dispatcher {
    chat: mpsc::UnboundedSender<String>,
    uploads: mpsc::UnboundedSender<PathBuf>,
    workers: [JoinHandle<()>; 2],
}

impl Dispatcher {
    fn spawn(session: &ChatSession) -> Self {
        let (chat, mut chat_rx) = mpsc::unbounded_channel::<String>();
        let (uploads, mut upload_rx) = mpsc::unbounded_channel::<PathBuf>();

        let chat_session = session.clone();
        let chat_worker = tokio::spawn(async move {
            while let Some(text) = chat_rx.recv().await {
                chat_session.submit_text(&text).await;
            }
        });

        let upload_session = session.clone();
        let upload_worker = tokio::spawn(async move {
            while let Some(path) = upload_rx.recv().await {
                match load_upload(&path).await {
                    Ok(upload) => {
                        upload_session.submit_file(upload).await;
                    }
                    Err(e) => eprintln!("Could not read {}: {}", path.display(), e),
                }
            }
        });

        Self {
            chat,
            uploads,
            workers: [chat_worker, upload_worker],
        }
    }

    fn send_text(&self, session: &ChatSession, text: String) {
        if text.trim().is_empty() {
            return;
        }
        if session.is_busy(PipelineKind::Chat) {
            eprintln!("{} Your message will be sent after the current reply.", SENDING_LABEL);
        }
        if self.chat.send(text).is_err() {
            log::warn!("[chat] Worker stopped, message dropped");
        }
    }

    fn send_file(&self, session: &ChatSession, path: PathBuf) {
        if session.is_busy(PipelineKind::Document) {
            eprintln!("A document is already being analyzed; this one is queued.");
        }
        if self.uploads.send(path).is_err() {
            log::warn!("[document] Worker stopped, upload dropped");
        }
    }

    /// Close both queues and wait until every queued submission settles
    async fn finish(self) {
        let Self {
            chat,
            uploads,
            workers,
        } = self;
        drop(chat);
        drop(uploads);
        for worker in workers {
            if let Err(e) = worker.await {
                log::warn!("[session] Worker ended abnormally: {}", e);
            }
        }
    }
}

/// Terminal output for one session event
#[derive(Debug, Default, PartialEq, Eq)]
struct Rendered {
    stdout: Vec<String>,
    stderr: Vec<String>,
    /// The session asked for a login; the loop should stop
    end: bool,
}

impl Rendered {
    fn out(line: impl Into<String>) -> Self {
        Self {
            stdout: vec![line.into()],
            ..Self::default()
        }
    }

    fn err(line: impl Into<String>) -> Self {
        Self {
            stderr: vec![line.into()],
            ..Self::default()
        }
    }

    /// Write to the terminal and report whether the loop should end
    fn print(self) -> bool {
        for line in &self.stdout {
            println!("{}", line);
        }
        for line in &self.stderr {
            eprintln!("{}", line);
        }
        self.end
    }
}

fn render_event(session: &ChatSession, view: &mut ConversationView, event: SessionEvent) -> Rendered {
    match event {
        SessionEvent::TranscriptAppended { .. } => print_new_messages(session, view),
        SessionEvent::BusyChanged {
            pipeline: PipelineKind::Chat,
            busy: true,
        } => Rendered::out(SENDING_LABEL),
        SessionEvent::BusyChanged {
            pipeline: PipelineKind::Document,
            busy: true,
        } => Rendered::out(ANALYZING_LABEL),
        SessionEvent::BusyChanged { .. } => Rendered::default(),
        SessionEvent::ErrorRaised(text) => Rendered::err(format!("Error: {}", text)),
        SessionEvent::Notification(notice) => Rendered::err(notice.text),
        SessionEvent::AuthRedirect => Rendered {
            stderr: vec![LOGIN_HINT.to_string()],
            end: true,
            ..Rendered::default()
        },
    }
}

/// The terminal already shows what the user typed, so only assistant
/// messages are printed.
fn print_new_messages(session: &ChatSession, view: &mut ConversationView) -> Rendered {
    let frame = view.refresh(&session.snapshot());
    Rendered {
        stdout: frame
            .appended
            .iter()
            .filter(|m| !m.is_user())
            .map(|m| format!("{}\n", render_message(m)))
            .collect(),
        ..Rendered::default()
    }
}
