use std::io;
use std::path::PathBuf;
use thiserror::Error;
use crate::exec::RuntimeError;
use crate::parser::ParseError;
use crate::settings::SettingsError;

/// Coarse classification shared by every stage.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    Lex,
    Syntax,
    TreeBuild,
    Action,
    Exhaustion,
    Io,
    Config,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to open `{}`: {source}", .path.display())]
    Open { path: PathBuf, source: io::Error },
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
    #[error("invalid configuration: {0}")]
    Config(#[from] SettingsError),
    #[error("program has not been loaded")]
    NotLoaded,
    #[error("failed to write the syntax tree: {0}")]
    Dump(#[source] io::Error),
    #[error("failed to flush output: {0}")]
    Teardown(#[source] io::Error),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Open { .. } | Error::Dump(_) | Error::Teardown(_) => ErrorKind::Io,
            Error::Parse(err) => err.kind(),
            Error::Runtime(err) => err.kind(),
            Error::Config(_) | Error::NotLoaded => ErrorKind::Config,
        }
    }
}
