use std::io::{self, Read, Write};
use log::{debug, trace, warn};
use thiserror::Error;
use crate::ast::{Ast, NodeId, NodeKind, Opcode};
use crate::error::ErrorKind;
use crate::settings::{EofBehavior, Settings};
use crate::tape::{Tape, TapeError};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Error)]
pub enum RuntimeError {
    #[error("failed to write output: {kind}")]
    Write { kind: io::ErrorKind },
    #[error("failed to read input: {kind}")]
    Read { kind: io::ErrorKind },
    #[error("no function #{selector} to call, {count} defined")]
    InvalidCallTarget { selector: usize, count: usize },
    #[error("syscall is not implemented")]
    Syscall,
    #[error("malformed tree at node {index}")]
    Malformed { index: usize },
    #[error(transparent)]
    Tape(#[from] TapeError),
    #[error("nesting deeper than {limit} calls and loops")]
    DepthExceeded { limit: usize },
}

impl RuntimeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RuntimeError::Write { .. }
            | RuntimeError::Read { .. }
            | RuntimeError::InvalidCallTarget { .. }
            | RuntimeError::Syscall => ErrorKind::Action,
            RuntimeError::Malformed { .. } => ErrorKind::TreeBuild,
            RuntimeError::Tape(_) | RuntimeError::DepthExceeded { .. } => ErrorKind::Exhaustion,
        }
    }
}

/// Counters collected over one run.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct Stats {
    pub actions: usize,
    pub iterations: usize,
    pub calls: usize,
}

/// One invocation of a function: its own tape, head and selector.
struct Frame {
    function: NodeId,
    tape: Tape,
    selector: usize,
    done: bool,
    result: u8,
}

impl Frame {
    fn new(function: NodeId, settings: &Settings) -> Self {
        Frame {
            function,
            tape: Tape::new(settings.tape_length, settings.head),
            selector: 0,
            done: false,
            result: 0,
        }
    }

    fn finish(&mut self) {
        self.done = true;
        self.result = self.tape.get();
    }
}

/// Walks a finished [`Ast`], starting from its first function.
pub struct Runtime<'a, R, W> {
    ast: &'a Ast,
    settings: Settings,
    input: R,
    output: W,
    depth: usize,
    stats: Stats,
}

impl<'a, R: Read, W: Write> Runtime<'a, R, W> {
    pub fn new(ast: &'a Ast, settings: Settings, input: R, output: W) -> Self {
        Runtime {
            ast,
            settings,
            input,
            output,
            depth: 0,
            stats: Stats::default(),
        }
    }

    /// Runs function #0 and returns its result byte. A program without
    /// functions yields 0.
    pub fn run(&mut self) -> Result<u8, RuntimeError> {
        let Some(entry) = self.ast.function(0) else {
            debug!("program has no functions");
            return Ok(0);
        };
        let result = self.call(entry);
        let flushed = self.output.flush().map_err(|err| RuntimeError::Write { kind: err.kind() });
        let result = result?;
        flushed?;
        debug!("finished with {:?}", self.stats);
        Ok(result)
    }

    pub fn stats(&self) -> Stats {
        self.stats
    }

    pub fn into_output(self) -> W {
        self.output
    }

    fn enter(&mut self) -> Result<(), RuntimeError> {
        if self.depth >= self.settings.max_depth {
            return Err(RuntimeError::DepthExceeded { limit: self.settings.max_depth });
        }
        self.depth += 1;
        Ok(())
    }

    fn call(&mut self, function: NodeId) -> Result<u8, RuntimeError> {
        self.enter()?;
        self.stats.calls += 1;
        let mut frame = Frame::new(function, &self.settings);
        let outcome = self.run_block(&mut frame, function);
        self.depth -= 1;
        outcome?;
        if !frame.done {
            frame.finish();
        }
        Ok(frame.result)
    }

    fn run_block(&mut self, frame: &mut Frame, block: NodeId) -> Result<(), RuntimeError> {
        let ast = self.ast;
        for &child in ast.children(block) {
            match ast.kind(child) {
                Some(NodeKind::Loop) => self.run_loop(frame, child)?,
                Some(NodeKind::Action(opcode)) => self.run_action(frame, opcode)?,
                _ => return Err(RuntimeError::Malformed { index: child.index() }),
            }
            if frame.done {
                break;
            }
        }
        Ok(())
    }

    fn run_loop(&mut self, frame: &mut Frame, node: NodeId) -> Result<(), RuntimeError> {
        let ast = self.ast;
        let body = ast
            .children(node)
            .iter()
            .copied()
            .find(|&child| ast.kind(child) == Some(NodeKind::LoopBody))
            .ok_or(RuntimeError::Malformed { index: node.index() })?;
        self.enter()?;
        let outcome = self.repeat(frame, body);
        self.depth -= 1;
        outcome
    }

    fn repeat(&mut self, frame: &mut Frame, body: NodeId) -> Result<(), RuntimeError> {
        while frame.tape.get() != 0 {
            self.stats.iterations += 1;
            self.run_block(frame, body)?;
            if frame.done {
                break;
            }
        }
        Ok(())
    }

    fn run_action(&mut self, frame: &mut Frame, opcode: Opcode) -> Result<(), RuntimeError> {
        self.stats.actions += 1;
        match opcode {
            Opcode::Inc => frame.tape.increment(),
            Opcode::Dec => frame.tape.decrement(),
            Opcode::Left => frame.tape.left()?,
            Opcode::Right => frame.tape.right()?,
            Opcode::Input => {
                let byte = self.read_byte(frame.tape.get())?;
                frame.tape.set(byte);
            }
            Opcode::Output => {
                trace!("writing {} to output", frame.tape.get());
                self.output
                    .write_all(&[frame.tape.get()])
                    .map_err(|err| RuntimeError::Write { kind: err.kind() })?;
            }
            Opcode::Up => frame.selector = frame.selector.wrapping_sub(1),
            Opcode::Down => frame.selector = frame.selector.wrapping_add(1),
            Opcode::Call => {
                let functions = self.ast.functions();
                let target = self.ast.function(frame.selector).ok_or(RuntimeError::InvalidCallTarget {
                    selector: frame.selector,
                    count: functions.len(),
                })?;
                trace!("node {} calls function #{}", frame.function.index(), frame.selector);
                let result = self.call(target)?;
                frame.tape.set(result);
            }
            Opcode::Return => frame.finish(),
            Opcode::Syscall => return Err(RuntimeError::Syscall),
        }
        Ok(())
    }

    fn read_byte(&mut self, current: u8) -> Result<u8, RuntimeError> {
        let mut buf = [0u8; 1];
        loop {
            match self.input.read(&mut buf) {
                Ok(0) => {
                    warn!("input exhausted, applying {:?}", self.settings.eof);
                    return Ok(match self.settings.eof {
                        EofBehavior::Max => u8::MAX,
                        EofBehavior::Zero => 0,
                        EofBehavior::Keep => current,
                    });
                }
                Ok(_) => {
                    trace!("read {} from input", buf[0]);
                    return Ok(buf[0]);
                }
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => return Err(RuntimeError::Read { kind: err.kind() }),
            }
        }
    }
}
