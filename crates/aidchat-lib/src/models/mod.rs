// Data models module
// Transcript entries, session state and backend wire payloads

pub mod api;
pub mod message;
pub mod session;

// Re-export the types most callers need
pub use message::{DocumentAnalysis, Message, MessageRole, ANALYSIS_HEADER};
pub use session::{
    CallStatus, Notice, PipelineKind, PipelinePhase, PipelineState, SessionEvent,
    SessionSnapshot,
};
