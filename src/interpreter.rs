use std::fs::File;
use std::io::{self, BufReader, Read, Write};
use std::path::{Path, PathBuf};
use log::{debug, info};
use crate::ast::Ast;
use crate::error::Error;
use crate::exec::Runtime;
use crate::parser::Parser;
use crate::settings::Settings;

/// Owns one program from opening its source to tearing it down.
pub struct Interpreter {
    path: PathBuf,
    settings: Settings,
    source: Option<BufReader<File>>,
    ast: Option<Ast>,
}

impl Interpreter {
    pub fn initialize(path: impl AsRef<Path>, settings: Settings) -> Result<Self, Error> {
        settings.validate()?;
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path).map_err(|source| Error::Open { path: path.clone(), source })?;
        debug!("opened {} with {:?}", path.display(), settings);
        Ok(Interpreter {
            path,
            settings,
            source: Some(BufReader::new(file)),
            ast: None,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn ast(&self) -> Option<&Ast> {
        self.ast.as_ref()
    }

    /// Parses the source once; later calls return the same tree. The source
    /// file is closed as soon as parsing ends, successfully or not.
    pub fn load_and_parse(&mut self) -> Result<&Ast, Error> {
        if self.ast.is_none() {
            let source = self.source.take().ok_or(Error::NotLoaded)?;
            let ast = Parser::new(source).parse()?;
            debug!("{} parsed into {} functions", self.path.display(), ast.function_count());
            self.ast = Some(ast);
        }
        self.ast.as_ref().ok_or(Error::NotLoaded)
    }

    /// Writes the parsed tree to `output`.
    pub fn dump_ast<W: Write>(&self, mut output: W) -> Result<(), Error> {
        let ast = self.ast.as_ref().ok_or(Error::NotLoaded)?;
        write!(output, "{ast}").and_then(|()| output.flush()).map_err(Error::Dump)
    }

    /// Runs the program against the process's stdin and stdout.
    pub fn execute(&self) -> Result<u8, Error> {
        self.execute_with(io::stdin().lock(), io::stdout().lock())
    }

    pub fn execute_with<R: Read, W: Write>(&self, input: R, output: W) -> Result<u8, Error> {
        let ast = self.ast.as_ref().ok_or(Error::NotLoaded)?;
        let mut runtime = Runtime::new(ast, self.settings, input, output);
        let result = runtime.run()?;
        info!("{} returned {result}", self.path.display());
        Ok(result)
    }

    pub fn release(self) -> Result<(), Error> {
        io::stdout().flush().map_err(Error::Teardown)?;
        debug!("released {}", self.path.display());
        Ok(())
    }
}
