// Application layer - Editor session orchestration

pub mod editor_session;

// Re-export session types
pub use editor_session::{CutListExport, EditorSession, SessionError, TrimExport, TrimTask};
