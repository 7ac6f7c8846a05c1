// Puzzle engine: grid, word lists, selection, validation, hints, timing

pub mod catalog;
pub mod grid;
pub mod hint;
pub mod progress;
pub mod selection;
pub mod session;
pub mod timer;
pub mod validator;

pub use grid::{Cell, LetterGrid};
pub use session::{GameSession, SessionEvent};
pub use validator::WordValidator;
