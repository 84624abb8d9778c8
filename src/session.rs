//! One interpreter plus the bookkeeping needed to feed it several programs
//! in a row (a REPL, or a test running snippets against shared globals).

use log::{debug, info};

use crate::ast::Stmt;
use crate::error::{EnkelError, Result};
use crate::interpreter::Interpreter;
use crate::lexer;
use crate::parser::Parser;
use crate::resolver::Resolver;

pub struct Session {
    interpreter: Interpreter,
    next_expr_id: usize,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self::with_interpreter(Interpreter::new())
    }

    pub fn with_interpreter(interpreter: Interpreter) -> Self {
        Self {
            interpreter,
            next_expr_id: 0,
        }
    }

    pub fn interpreter(&self) -> &Interpreter {
        &self.interpreter
    }

    /// Lex and parse `source`, numbering expressions after everything this
    /// session has parsed before.
    pub fn parse(&mut self, source: &str) -> Result<Vec<Stmt>> {
        let tokens = lexer::tokenize(source)?;
        debug!("Lexed {} tokens", tokens.len());

        let mut parser = Parser::new(&tokens).with_first_id(self.next_expr_id);
        let statements = parser.parse()?;
        self.next_expr_id = parser.next_id();

        Ok(statements)
    }

    /// Lex → parse → resolve → interpret. The first failure of any stage is
    /// returned; globals defined before the failure stay defined.
    pub fn run(&mut self, source: &str) -> Result<()> {
        let statements: Vec<Stmt> = self.parse(source)?;

        Resolver::new(&mut self.interpreter).resolve(&statements)?;
        info!("Resolved {} statement(s)", statements.len());

        self.interpreter.interpret(&statements)
    }

    /// Interactive loop reading from the interpreter's input stream, the
    /// same one `Input()` reads. Each non‑blank line is one program; its
    /// failure goes to `report` and the loop goes on. Returns at end of
    /// input.
    pub fn repl<F>(&mut self, prompt: &str, mut report: F) -> Result<()>
    where
        F: FnMut(&EnkelError),
    {
        let mut line = String::new();

        loop {
            write!(self.interpreter.output(), "{}", prompt)?;
            self.interpreter.output().flush()?;

            line.clear();
            if self.interpreter.input().read_line(&mut line)? == 0 {
                writeln!(self.interpreter.output())?;
                break;
            }

            if line.trim().is_empty() {
                continue;
            }

            if let Err(e) = self.run(&line) {
                debug!("REPL line failed: {:?}", e);
                report(&e);
            }
        }

        info!("REPL finished");
        Ok(())
    }
}
