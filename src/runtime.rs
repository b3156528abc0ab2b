//! Runtime façade: the narrow interface the CLI and the tests drive.
//!
//! Source text goes in; printed lines and diagnostic lines come out through
//! two injectable sinks, so tests substitute capturing buffers for the
//! process streams.

use std::cell::RefCell;
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::Path;
use std::rc::Rc;

use log::{debug, info};

use crate::error::{LoxError, Result};
use crate::expr::ExprId;
use crate::interpreter::Interpreter;
use crate::parser::Parser;
use crate::resolver::Resolver;
use crate::scanner::Scanner;

/// Exit status of a clean run.
pub const EXIT_OK: i32 = 0;
/// Exit status when the CLI is misused.
pub const EXIT_USAGE: i32 = 64;
/// Exit status after compile-time (scan/parse/resolve) errors.
pub const EXIT_COMPILE_ERROR: i32 = 65;
/// Exit status after a runtime error.
pub const EXIT_RUNTIME_ERROR: i32 = 70;

/// One interpreter session: owns the globals, the resolution table, the
/// output sinks and the error flags.  A session outlives individual [`run`]
/// calls, which is what lets a REPL keep its globals from line to line.
///
/// [`run`]: Lox::run
pub struct Lox {
    interpreter: Interpreter,
    out: Rc<RefCell<dyn Write>>,
    err: Rc<RefCell<dyn Write>>,
    next_expr_id: ExprId,
    pub had_error: bool,
    pub had_runtime_error: bool,
}

impl Lox {
    pub fn new() -> Self {
        Self::with_streams(
            Rc::new(RefCell::new(io::stdout())),
            Rc::new(RefCell::new(io::stderr())),
        )
    }

    /// A session writing program output to `out` and diagnostics to `err`.
    pub fn with_streams(out: Rc<RefCell<dyn Write>>, err: Rc<RefCell<dyn Write>>) -> Self {
        Lox {
            interpreter: Interpreter::with_output(Rc::clone(&out)),
            out,
            err,
            next_expr_id: 0,
            had_error: false,
            had_runtime_error: false,
        }
    }

    /// Interpret `source` as a complete program.  The error flags describe
    /// this run when it returns.
    pub fn run(&mut self, source: &[u8]) {
        info!("run: {} byte(s)", source.len());

        self.had_error = false;
        self.had_runtime_error = false;

        let mut tokens = Vec::new();
        for item in Scanner::new(source) {
            match item {
                Ok(token) => tokens.push(token),
                Err(e) => self.report(&e),
            }
        }

        // Parse even after scan errors: the statements are discarded, but
        // syntax problems still get reported alongside the lexical ones.
        let mut parser = Parser::new(tokens, self.next_expr_id);
        let (statements, parse_errors) = parser.parse();
        self.next_expr_id = parser.next_id();

        for e in &parse_errors {
            self.report(e);
        }

        if self.had_error {
            return;
        }

        let resolve_errors = Resolver::new(&mut self.interpreter).resolve(&statements);
        for e in &resolve_errors {
            self.report(e);
        }

        if self.had_error {
            return;
        }

        if let Err(e) = self.interpreter.interpret(&statements) {
            self.report(&e);
        }
    }

    /// Interpret a whole file, returning the exit status the process should
    /// end with.
    pub fn run_file(&mut self, path: &Path) -> Result<i32> {
        let source = fs::read(path)?;
        self.run(&source);

        if self.had_error {
            Ok(EXIT_COMPILE_ERROR)
        } else if self.had_runtime_error {
            Ok(EXIT_RUNTIME_ERROR)
        } else {
            Ok(EXIT_OK)
        }
    }

    /// Read-evaluate-print loop.  Every line is a complete program, but
    /// globals persist across lines and an error does not end the session.
    pub fn run_prompt(&mut self) -> io::Result<()> {
        let stdin = io::stdin();
        let mut line = String::new();

        loop {
            {
                let mut out = self.out.borrow_mut();
                out.write_all(b"> ")?;
                out.flush()?;
            }

            line.clear();
            if stdin.lock().read_line(&mut line)? == 0 {
                return Ok(());
            }

            self.run(line.as_bytes());
        }
    }

    fn report(&mut self, e: &LoxError) {
        if e.is_compile_error() {
            self.had_error = true;
        } else {
            self.had_runtime_error = true;
        }

        debug!("diagnostic: {}", e);

        let _ = writeln!(self.err.borrow_mut(), "{}", e);
    }
}

impl Default for Lox {
    fn default() -> Self {
        Self::new()
    }
}
