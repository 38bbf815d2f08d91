use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use clap::builder::NonEmptyStringValueParser;
use clap::{Parser, ValueEnum};
use log::{debug, LevelFilter};
use simple_logger::SimpleLogger;
use sysfun::{EofBehavior, HeadPolicy, Interpreter, Settings, DATA_LENGTH, MAX_DEPTH};

const EXIT_USAGE: u8 = 1;
const EXIT_INIT: u8 = 2;
const EXIT_PARSE: u8 = 3;
const EXIT_EXEC: u8 = 4;
const EXIT_TEARDOWN: u8 = 5;

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => LevelFilter::Off,
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

/// Run a program where every line is a function and `:` calls the one picked with `^`/`v`.
#[derive(Debug, Parser)]
#[command(name = "sysfun", version)]
struct Args {
    /// Program source file.
    #[arg(value_parser = NonEmptyStringValueParser::new())]
    file: String,

    /// Cells on each function's tape.
    #[arg(long, default_value_t = DATA_LENGTH)]
    tape_length: usize,

    /// Deepest nesting of calls and loops before giving up.
    #[arg(long, default_value_t = MAX_DEPTH)]
    max_depth: usize,

    /// What to do when the head leaves the tape.
    #[arg(long, value_enum, default_value_t = HeadPolicy::Reject)]
    head: HeadPolicy,

    /// Value `,` stores once stdin is exhausted.
    #[arg(long, value_enum, default_value_t = EofBehavior::Max)]
    eof: EofBehavior,

    /// Print the syntax tree before running.
    #[arg(long)]
    dump_ast: bool,

    #[arg(long, value_enum, default_value_t = LogLevel::Warn)]
    log_level: LogLevel,
}

impl Args {
    fn settings(&self) -> Settings {
        Settings {
            tape_length: self.tape_length,
            max_depth: self.max_depth,
            head: self.head,
            eof: self.eof,
        }
    }
}

fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(err) => {
            let _ = err.print();
            return if err.use_stderr() { ExitCode::from(EXIT_USAGE) } else { ExitCode::SUCCESS };
        }
    };

    if let Err(err) = SimpleLogger::new().with_level(args.log_level.into()).init() {
        eprintln!("error: {err}");
        return ExitCode::from(EXIT_INIT);
    }

    let path = PathBuf::from(&args.file);
    let mut interpreter = match Interpreter::initialize(&path, args.settings()) {
        Ok(interpreter) => interpreter,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::from(EXIT_INIT);
        }
    };

    if let Err(err) = interpreter.load_and_parse().map(|_| ()) {
        eprintln!("error: {}: {err}", interpreter.path().display());
        if let sysfun::Error::Parse(parse) = &err {
            eprintln!("{}", parse.diagnostic());
        }
        return ExitCode::from(EXIT_PARSE);
    }

    if args.dump_ast {
        if let Err(err) = interpreter.dump_ast(io::stdout().lock()) {
            eprintln!("error: {err}");
            return ExitCode::from(EXIT_PARSE);
        }
    }

    match interpreter.execute() {
        Ok(result) => debug!("result byte {result}"),
        Err(err) => {
            eprintln!("error: {}: {err}", interpreter.path().display());
            return ExitCode::from(EXIT_EXEC);
        }
    }

    match interpreter.release() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::from(EXIT_TEARDOWN)
        }
    }
}
