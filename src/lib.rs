//! Front-end and tree-walking interpreter for a Brainfuck derivative where
//! every source line is a function.
//!
//! Besides the eight classic symbols the language has `^` and `v` to move a
//! per-call selector over the function table, `:` to call the selected
//! function, `;` to return the current cell, and `%` reserved for syscalls.
//! A space starts a comment that runs to the end of the line.
//!
//! ```text
//! v:.   call function #1 and print what it returns
//! +++++
//! ```

pub mod ast;
pub mod builder;
pub mod error;
pub mod exec;
pub mod interpreter;
pub mod lexer;
pub mod parser;
pub mod settings;
pub mod syntax;
pub mod tape;

pub use ast::{Ast, NodeId, NodeKind, Opcode};
pub use error::{Error, ErrorKind};
pub use exec::{Runtime, RuntimeError};
pub use interpreter::Interpreter;
pub use parser::{parse_str, Diagnostic, ParseError, Parser};
pub use settings::{EofBehavior, HeadPolicy, Settings, SettingsError, DATA_LENGTH, MAX_DEPTH};
