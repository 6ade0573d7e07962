pub mod typing;

pub use typing::{Highlight, TypingSession};
