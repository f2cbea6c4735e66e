//! Page objects for the application under test.

pub mod chat;
pub mod tools;

pub use chat::ChatPage;
pub use tools::{Tool, ToolValidationPage};
