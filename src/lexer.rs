use std::fmt::{Display, Formatter};
use std::io::{ErrorKind, Read};
use std::str::FromStr;
use log::trace;
use thiserror::Error;

/// Terminal symbols of the language, one per source byte.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Lexeme {
    Inc,
    Dec,
    Left,
    Right,
    LoopStart,
    LoopEnd,
    Input,
    Output,
    Up,
    Down,
    Call,
    Return,
    Syscall,
    Comment,
    Delimiter,
    Eof,
    LexError,
    Unknown,
}

impl Lexeme {
    const ALL: [Lexeme; 18] = [
        Lexeme::Inc,
        Lexeme::Dec,
        Lexeme::Left,
        Lexeme::Right,
        Lexeme::LoopStart,
        Lexeme::LoopEnd,
        Lexeme::Input,
        Lexeme::Output,
        Lexeme::Up,
        Lexeme::Down,
        Lexeme::Call,
        Lexeme::Return,
        Lexeme::Syscall,
        Lexeme::Comment,
        Lexeme::Delimiter,
        Lexeme::Eof,
        Lexeme::LexError,
        Lexeme::Unknown,
    ];

    pub fn from_byte(byte: u8) -> Lexeme {
        match byte {
            b'+' => Lexeme::Inc,
            b'-' => Lexeme::Dec,
            b'<' => Lexeme::Left,
            b'>' => Lexeme::Right,
            b'[' => Lexeme::LoopStart,
            b']' => Lexeme::LoopEnd,
            b',' => Lexeme::Input,
            b'.' => Lexeme::Output,
            b'^' => Lexeme::Up,
            b'v' => Lexeme::Down,
            b':' => Lexeme::Call,
            b';' => Lexeme::Return,
            b'%' => Lexeme::Syscall,
            b' ' => Lexeme::Comment,
            b'\n' => Lexeme::Delimiter,
            _ => Lexeme::Unknown,
        }
    }

    /// Symbols that stand alone as an action in a function body.
    pub fn is_action(self) -> bool {
        matches!(
            self,
            Lexeme::Inc
                | Lexeme::Dec
                | Lexeme::Left
                | Lexeme::Right
                | Lexeme::Input
                | Lexeme::Output
                | Lexeme::Up
                | Lexeme::Down
                | Lexeme::Call
                | Lexeme::Return
                | Lexeme::Syscall
        )
    }

    pub fn name(self) -> &'static str {
        match self {
            Lexeme::Inc => "inc",
            Lexeme::Dec => "dec",
            Lexeme::Left => "left",
            Lexeme::Right => "right",
            Lexeme::LoopStart => "loop-start",
            Lexeme::LoopEnd => "loop-end",
            Lexeme::Input => "input",
            Lexeme::Output => "output",
            Lexeme::Up => "up",
            Lexeme::Down => "down",
            Lexeme::Call => "call",
            Lexeme::Return => "return",
            Lexeme::Syscall => "syscall",
            Lexeme::Comment => "comment",
            Lexeme::Delimiter => "delimiter",
            Lexeme::Eof => "eof",
            Lexeme::LexError => "lex-error",
            Lexeme::Unknown => "unknown",
        }
    }
}

impl Display for Lexeme {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Lexeme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Lexeme::ALL
            .iter()
            .copied()
            .find(|lexeme| lexeme.name() == s)
            .ok_or_else(|| format!("unknown lexeme name `{s}`"))
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Error)]
pub enum LexingError {
    #[error("failed to read source: {kind}")]
    Read { kind: ErrorKind },
}

/// Reads a source one byte per call and classifies it.
///
/// The lexer never looks ahead: the analyzer asks for the next lexeme only
/// once the grammar has consumed the current one.
pub struct Lexer<R> {
    source: R,
    current: Lexeme,
    byte: Option<u8>,
    position: usize,
}

impl<R: Read> Lexer<R> {
    pub fn new(source: R) -> Self {
        Lexer {
            source,
            current: Lexeme::Unknown,
            byte: None,
            position: 0,
        }
    }

    /// Consumes exactly one byte and returns its lexeme.
    pub fn advance(&mut self) -> Result<Lexeme, LexingError> {
        let mut buf = [0u8; 1];
        let read = loop {
            match self.source.read(&mut buf) {
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                other => break other,
            }
        };
        match read {
            Ok(0) => {
                self.current = Lexeme::Eof;
                self.byte = None;
            }
            Ok(1) => {
                self.current = Lexeme::from_byte(buf[0]);
                self.byte = Some(buf[0]);
                self.position += 1;
            }
            Ok(_) => {
                self.current = Lexeme::LexError;
                return Err(LexingError::Read { kind: ErrorKind::InvalidData });
            }
            Err(err) => {
                self.current = Lexeme::LexError;
                return Err(LexingError::Read { kind: err.kind() });
            }
        }
        trace!("lexeme {} at byte {}", self.current, self.position);
        Ok(self.current)
    }

    /// Last lexeme produced, `Unknown` before the first read.
    pub fn current(&self) -> Lexeme {
        self.current
    }

    /// Raw byte behind the current lexeme, if one was read.
    pub fn byte(&self) -> Option<u8> {
        self.byte
    }

    /// Number of bytes consumed so far.
    pub fn position(&self) -> usize {
        self.position
    }
}

#[cfg(test)]
mod tests {
    use std::io::{self, Read};
    use crate::lexer::{Lexeme, Lexer, LexingError};

    struct Broken;

    impl Read for Broken {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "gone"))
        }
    }

    fn lex_all(program: &str) -> Vec<Lexeme> {
        let mut lexer = Lexer::new(program.as_bytes());
        let mut out = Vec::new();
        loop {
            let lexeme = lexer.advance().unwrap();
            out.push(lexeme);
            if lexeme == Lexeme::Eof {
                return out;
            }
        }
    }

    #[test]
    fn classify_symbols() {
        assert_eq!(
            lex_all("+-<>[],.^v:;% \nx"),
            vec![Lexeme::Inc, Lexeme::Dec, Lexeme::Left, Lexeme::Right, Lexeme::LoopStart, Lexeme::LoopEnd, Lexeme::Input, Lexeme::Output, Lexeme::Up, Lexeme::Down, Lexeme::Call, Lexeme::Return, Lexeme::Syscall, Lexeme::Comment, Lexeme::Delimiter, Lexeme::Unknown, Lexeme::Eof]
        );
    }

    #[test]
    fn one_byte_per_call() {
        let mut lexer = Lexer::new("+x".as_bytes());
        assert_eq!(lexer.current(), Lexeme::Unknown);
        assert_eq!(lexer.advance(), Ok(Lexeme::Inc));
        assert_eq!((lexer.byte(), lexer.position()), (Some(b'+'), 1));
        assert_eq!(lexer.advance(), Ok(Lexeme::Unknown));
        assert_eq!(lexer.byte(), Some(b'x'));
        assert_eq!(lexer.advance(), Ok(Lexeme::Eof));
        assert_eq!(lexer.advance(), Ok(Lexeme::Eof));
        assert_eq!(lexer.position(), 2);
    }

    #[test]
    fn read_failure() {
        let mut lexer = Lexer::new(Broken);
        assert_eq!(lexer.advance(), Err(LexingError::Read { kind: io::ErrorKind::BrokenPipe }));
        assert_eq!(lexer.current(), Lexeme::LexError);
    }

    #[test]
    fn names_parse_back() {
        for lexeme in Lexeme::ALL {
            assert_eq!(lexeme.name().parse::<Lexeme>(), Ok(lexeme));
        }
        assert!("plus".parse::<Lexeme>().is_err());
    }

    #[test]
    fn action_symbols() {
        assert!(Lexeme::Syscall.is_action());
        assert!(Lexeme::Call.is_action());
        assert!(!Lexeme::LoopStart.is_action());
        assert!(!Lexeme::Comment.is_action());
        assert!(!Lexeme::Unknown.is_action());
    }
}
