//! Minimal interactive front-end: a line lexer and the event handler that
//! feeds the command queue.

pub mod lexer;
pub mod repl;

pub use lexer::{LexError, Lexer, Statement};
pub use repl::{InputEvent, InputSignal, Repl};
