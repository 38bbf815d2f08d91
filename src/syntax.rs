use std::fmt::{Display, Formatter};
use std::str::FromStr;
use log::trace;
use thiserror::Error;
use crate::lexer::Lexeme;

/// Entries of the grammar stack.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum State {
    Start,
    End,
    Function,
    FunctionBody,
    Construct,
    Symbol,
    Loop,
    LoopStart,
    LoopEnd,
    Comment,
    CommentStart,
    Delimiter,
    Error,
}

impl State {
    const ALL: [State; 13] = [
        State::Start,
        State::End,
        State::Function,
        State::FunctionBody,
        State::Construct,
        State::Symbol,
        State::Loop,
        State::LoopStart,
        State::LoopEnd,
        State::Comment,
        State::CommentStart,
        State::Delimiter,
        State::Error,
    ];

    pub fn name(self) -> &'static str {
        match self {
            State::Start => "start",
            State::End => "end",
            State::Function => "function",
            State::FunctionBody => "function-body",
            State::Construct => "construct",
            State::Symbol => "symbol",
            State::Loop => "loop",
            State::LoopStart => "loop-start",
            State::LoopEnd => "loop-end",
            State::Comment => "comment",
            State::CommentStart => "comment-start",
            State::Delimiter => "delimiter",
            State::Error => "error",
        }
    }
}

impl Display for State {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for State {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        State::ALL
            .iter()
            .copied()
            .find(|state| state.name() == s)
            .ok_or_else(|| format!("unknown state name `{s}`"))
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Error)]
pub enum SyntaxError {
    #[error("unknown lexeme while expecting {state}")]
    UnknownLexeme { state: State },
    #[error("unexpected EOF while expecting {state}")]
    UnexpectedEof { state: State },
    #[error("unexpected {lexeme} while expecting {state}")]
    Unexpected { state: State, lexeme: Lexeme },
    #[error("grammar stack underflow")]
    Underflow,
    #[error("analyzer already failed")]
    Failed,
}

impl SyntaxError {
    fn classify(state: State, lexeme: Lexeme) -> SyntaxError {
        match (state, lexeme) {
            (State::Error, _) => SyntaxError::Failed,
            (state, Lexeme::Unknown) => SyntaxError::UnknownLexeme { state },
            (state, Lexeme::Eof) => SyntaxError::UnexpectedEof { state },
            (state, lexeme) => SyntaxError::Unexpected { state, lexeme },
        }
    }
}

/// Pushdown automaton recognising one function per line.
///
/// Each [`Analyzer::step`] pops the top state and either matches the lexeme
/// (after which [`Analyzer::needs_lexeme`] turns true) or replaces the state
/// with the right-hand side of a rule, leftmost symbol on top.
#[derive(Debug)]
pub struct Analyzer {
    magazine: Vec<State>,
    need_next: bool,
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl Analyzer {
    pub fn new() -> Self {
        Analyzer {
            magazine: vec![State::Start],
            need_next: true,
        }
    }

    /// An analyzer whose stack holds only `state`, used to replay a diagnosed
    /// state against a lexeme.
    pub fn starting_at(state: State) -> Self {
        Analyzer {
            magazine: vec![state],
            need_next: false,
        }
    }

    pub fn state(&self) -> State {
        self.magazine.last().copied().unwrap_or(State::Error)
    }

    pub fn needs_lexeme(&self) -> bool {
        self.need_next
    }

    pub fn is_finished(&self) -> bool {
        self.state() == State::End
    }

    pub fn depth(&self) -> usize {
        self.magazine.len()
    }

    /// Processes `lexeme` against the top state and returns the state that was
    /// processed.
    pub fn step(&mut self, lexeme: Lexeme) -> Result<State, SyntaxError> {
        self.need_next = false;
        let Some(state) = self.magazine.pop() else {
            self.magazine.push(State::Error);
            return Err(SyntaxError::Underflow);
        };
        trace!("{state} <- {lexeme}");
        match self.derive(state, lexeme) {
            Ok(()) => Ok(state),
            Err(err) => {
                self.magazine.push(State::Error);
                Err(err)
            }
        }
    }

    fn derive(&mut self, state: State, lexeme: Lexeme) -> Result<(), SyntaxError> {
        use State::*;
        let opens_construct = lexeme.is_action() || lexeme == Lexeme::LoopStart;
        match (state, lexeme) {
            (Start, _) if opens_construct => self.push(&[Start, Function]),
            (Start, Lexeme::Delimiter) => self.push(&[Start, Delimiter]),
            (Start, Lexeme::Comment) => self.push(&[Start, Delimiter, Comment, CommentStart]),
            (Start, Lexeme::Eof) => self.push(&[End]),

            (Function, _) if opens_construct => self.push(&[Delimiter, FunctionBody]),

            (FunctionBody, _) if opens_construct => self.push(&[FunctionBody, Construct]),
            (FunctionBody, Lexeme::Comment) => self.push(&[Comment, CommentStart]),
            (FunctionBody, Lexeme::Delimiter | Lexeme::Eof) => {}

            (Construct, _) if lexeme.is_action() => self.push(&[Construct, Symbol]),
            (Construct, Lexeme::LoopStart) => self.push(&[Construct, Loop]),
            (Construct, Lexeme::Delimiter | Lexeme::LoopEnd | Lexeme::Comment | Lexeme::Eof) => {}

            (Symbol, _) if lexeme.is_action() => self.need_next = true,

            (Loop, Lexeme::LoopStart) => self.push(&[LoopEnd, LoopStart]),
            (LoopStart, Lexeme::LoopStart) => {
                self.need_next = true;
                self.push(&[Construct]);
            }
            (LoopEnd, Lexeme::LoopEnd) => self.need_next = true,

            (CommentStart, Lexeme::Comment) => self.need_next = true,
            (Comment, Lexeme::Delimiter | Lexeme::Eof) => {}
            (Comment, Lexeme::LexError) => return Err(SyntaxError::classify(state, lexeme)),
            (Comment, _) => {
                self.need_next = true;
                self.push(&[Comment]);
            }

            (Delimiter, Lexeme::Delimiter) => self.need_next = true,
            (Delimiter, Lexeme::Eof) => {}

            (End, _) => self.push(&[End]),

            (state, lexeme) => return Err(SyntaxError::classify(state, lexeme)),
        }
        Ok(())
    }

    fn push(&mut self, states: &[State]) {
        self.magazine.extend_from_slice(states);
    }
}
