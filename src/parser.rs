use std::fmt::{Display, Formatter};
use std::io::Read;
use std::str::FromStr;
use log::debug;
use thiserror::Error;
use crate::ast::Ast;
use crate::builder::{TreeBuildError, TreeBuilder};
use crate::error::ErrorKind;
use crate::lexer::{Lexeme, Lexer, LexingError};
use crate::syntax::{Analyzer, State, SyntaxError};

/// Where parsing stopped: the grammar state that could not proceed, the last
/// lexeme and the raw byte behind it.
///
/// The `Display` form is `state=<name> lexeme=<name> byte=<hex|none> position=<n>`
/// and parses back with `FromStr`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub state: State,
    pub lexeme: Lexeme,
    pub byte: Option<u8>,
    pub position: usize,
}

impl Diagnostic {
    /// Human readable description of the offending byte.
    pub fn near(&self) -> String {
        match self.byte {
            None => "end of input".to_string(),
            Some(b'\n') => "'\\n'".to_string(),
            Some(byte) if byte.is_ascii_graphic() || byte == b' ' => format!("'{}'", byte as char),
            Some(byte) => format!("byte 0x{byte:02x}"),
        }
    }

    /// Feeds the diagnosed lexeme to an analyzer seeded with the diagnosed
    /// state.
    pub fn replay(&self) -> Result<State, SyntaxError> {
        Analyzer::starting_at(self.state).step(self.lexeme)
    }
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "state={} lexeme={} byte=", self.state, self.lexeme)?;
        match self.byte {
            Some(byte) => write!(f, "0x{byte:02x}")?,
            None => f.write_str("none")?,
        }
        write!(f, " position={}", self.position)
    }
}

impl FromStr for Diagnostic {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut state = None;
        let mut lexeme = None;
        let mut byte = None;
        let mut position = None;
        for field in s.split_whitespace() {
            let (key, value) = field.split_once('=').ok_or_else(|| format!("malformed field `{field}`"))?;
            match key {
                "state" => state = Some(value.parse::<State>()?),
                "lexeme" => lexeme = Some(value.parse::<Lexeme>()?),
                "byte" => {
                    byte = Some(match value.strip_prefix("0x") {
                        Some(hex) => Some(u8::from_str_radix(hex, 16).map_err(|err| format!("bad byte `{value}`: {err}"))?),
                        None if value == "none" => None,
                        None => return Err(format!("bad byte `{value}`")),
                    })
                }
                "position" => position = Some(value.parse::<usize>().map_err(|err| format!("bad position `{value}`: {err}"))?),
                _ => return Err(format!("unknown field `{key}`")),
            }
        }
        Ok(Diagnostic {
            state: state.ok_or("missing state")?,
            lexeme: lexeme.ok_or("missing lexeme")?,
            byte: byte.ok_or("missing byte")?,
            position: position.ok_or("missing position")?,
        })
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("lexical error near {}: {source}", .diagnostic.near())]
    Lex { source: LexingError, diagnostic: Diagnostic },
    #[error("syntax error near {}: {source}", .diagnostic.near())]
    Syntax { source: SyntaxError, diagnostic: Diagnostic },
    #[error("semantic error near {}: {source}", .diagnostic.near())]
    Tree { source: TreeBuildError, diagnostic: Diagnostic },
}

impl ParseError {
    pub fn diagnostic(&self) -> &Diagnostic {
        match self {
            ParseError::Lex { diagnostic, .. }
            | ParseError::Syntax { diagnostic, .. }
            | ParseError::Tree { diagnostic, .. } => diagnostic,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ParseError::Lex { .. } => ErrorKind::Lex,
            ParseError::Syntax { .. } => ErrorKind::Syntax,
            ParseError::Tree { source: TreeBuildError::Exhausted { .. }, .. } => ErrorKind::Exhaustion,
            ParseError::Tree { .. } => ErrorKind::TreeBuild,
        }
    }
}

/// Drives lexer, analyzer and tree builder in lockstep over one source.
pub struct Parser<R> {
    lexer: Lexer<R>,
    analyzer: Analyzer,
    builder: TreeBuilder,
}

impl<R: Read> Parser<R> {
    pub fn new(source: R) -> Self {
        Parser {
            lexer: Lexer::new(source),
            analyzer: Analyzer::new(),
            builder: TreeBuilder::new(),
        }
    }

    /// Runs the whole source through the pipeline. On failure the partial
    /// tree is dropped with the parser.
    pub fn parse(mut self) -> Result<Ast, ParseError> {
        while !self.analyzer.is_finished() {
            if self.analyzer.needs_lexeme() {
                self.lexer
                    .advance()
                    .map_err(|source| ParseError::Lex { source, diagnostic: self.diagnostic(self.analyzer.state()) })?;
            }
            let lexeme = self.lexer.current();
            let expected = self.analyzer.state();
            let state = self
                .analyzer
                .step(lexeme)
                .map_err(|source| ParseError::Syntax { source, diagnostic: self.diagnostic(expected) })?;
            self.builder
                .apply(state, lexeme)
                .map_err(|source| ParseError::Tree { source, diagnostic: self.diagnostic(state) })?;
        }
        debug!("parsed {} bytes", self.lexer.position());
        let diagnostic = self.diagnostic(self.analyzer.state());
        self.builder
            .finish()
            .map_err(|source| ParseError::Tree { source, diagnostic })
    }

    fn diagnostic(&self, state: State) -> Diagnostic {
        Diagnostic {
            state,
            lexeme: self.lexer.current(),
            byte: self.lexer.byte(),
            position: self.lexer.position(),
        }
    }
}

pub fn parse_str(source: &str) -> Result<Ast, ParseError> {
    Parser::new(source.as_bytes()).parse()
}

#[cfg(test)]
mod tests {
    use std::io::{self, Read};
    use crate::ast::NodeKind;
    use crate::error::ErrorKind;
    use crate::lexer::{Lexeme, LexingError};
    use crate::parser::{parse_str, Diagnostic, ParseError, Parser};
    use crate::syntax::{State, SyntaxError};

    fn non_empty_lines(program: &str) -> usize {
        program.lines().filter(|line| !line.is_empty() && !line.starts_with(' ')).count()
    }

    #[test]
    fn one_function_per_line() {
        for program in ["", "+\n", "+\n-\n", "\n\n+[-]\n\n>\n", " note\n+ note\n\n,.\n:;", "[[[]]]\n[]\n[.]\n", "%\nv:\n^:\n"] {
            let ast = parse_str(program).unwrap();
            assert_eq!(ast.functions().len(), non_empty_lines(program), "{program:?}");
            assert!(ast.functions().iter().all(|&id| ast.kind(id) == Some(NodeKind::Function)));
        }
    }

    #[test]
    fn unmatched_close() {
        let err = parse_str("+\n]\n").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Syntax);
        assert_eq!(
            err,
            ParseError::Syntax {
                source: SyntaxError::Unexpected { state: State::Start, lexeme: Lexeme::LoopEnd },
                diagnostic: Diagnostic { state: State::Start, lexeme: Lexeme::LoopEnd, byte: Some(b']'), position: 3 },
            }
        );
        assert_eq!(err.to_string(), "syntax error near ']': unexpected loop-end while expecting start");
    }

    #[test]
    fn diagnostic_round_trip() {
        for program in ["++]\n", "[+\n", "+x\n", "[[-]"] {
            let first = parse_str(program).unwrap_err();
            let second = parse_str(program).unwrap_err();
            assert_eq!(first, second);

            let diagnostic = first.diagnostic();
            let reparsed: Diagnostic = diagnostic.to_string().parse().unwrap();
            assert_eq!(&reparsed, diagnostic);
            let ParseError::Syntax { source, .. } = first else { panic!("expected a syntax error for {program:?}") };
            assert_eq!(reparsed.replay(), Err(source));
        }
    }

    #[test]
    fn diagnostic_text() {
        let diagnostic = Diagnostic { state: State::LoopEnd, lexeme: Lexeme::Eof, byte: None, position: 4 };
        assert_eq!(diagnostic.to_string(), "state=loop-end lexeme=eof byte=none position=4");
        assert_eq!(diagnostic.near(), "end of input");
        assert!("state=loop-end lexeme=eof".parse::<Diagnostic>().is_err());
        assert!("state=loop-end lexeme=eof byte=zz position=1".parse::<Diagnostic>().is_err());
        assert_eq!(parse_str("x").unwrap_err().diagnostic().near(), "'x'");
        assert_eq!(parse_str("[\n").unwrap_err().diagnostic().near(), "'\\n'");
    }

    #[test]
    fn unexpected_eof_in_loop() {
        let err = parse_str("+[-").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Syntax);
        assert_eq!(err.diagnostic().lexeme, Lexeme::Eof);
        assert_eq!(err.diagnostic().state, State::LoopEnd);
    }

    struct Failing<'a>(&'a [u8]);

    impl Read for Failing<'_> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.0.split_first() {
                Some((&byte, rest)) => {
                    buf[0] = byte;
                    self.0 = rest;
                    Ok(1)
                }
                None => Err(io::Error::new(io::ErrorKind::InvalidData, "bad sector")),
            }
        }
    }

    #[test]
    fn read_failure_is_lex_error() {
        let err = Parser::new(Failing(b"++")).parse().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Lex);
        assert_eq!(err, ParseError::Lex {
            source: LexingError::Read { kind: io::ErrorKind::InvalidData },
            diagnostic: Diagnostic { state: State::Construct, lexeme: Lexeme::LexError, byte: Some(b'+'), position: 2 },
        });
    }
}
