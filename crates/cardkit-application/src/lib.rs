pub mod app;
pub mod editor;

pub use app::EditorApp;
pub use editor::{CardEditor, EditorSnapshot, EditorState};
