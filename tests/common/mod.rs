#![allow(dead_code)]

use std::cell::RefCell;
use std::io::{self, Cursor, Write};
use std::rc::Rc;

use enkel::error::EnkelError;
use enkel::interpreter::Interpreter;
use enkel::session::Session;

/// An output sink the test keeps a handle to after giving it away.
#[derive(Clone, Default)]
pub struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

impl SharedBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8(self.0.borrow().clone()).expect("interpreter wrote invalid UTF-8")
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// A session whose output is captured and whose `Input` reads from `input`.
pub fn session_with_input(input: &str) -> (Session, SharedBuffer) {
    let out = SharedBuffer::default();
    let interpreter = Interpreter::with_io(
        Box::new(out.clone()),
        Box::new(Cursor::new(input.as_bytes().to_vec())),
    );

    (Session::with_interpreter(interpreter), out)
}

pub fn session() -> (Session, SharedBuffer) {
    session_with_input("")
}

/// Run one program and return everything it printed.
pub fn run(source: &str) -> Result<String, EnkelError> {
    let (mut session, out) = session();
    session.run(source)?;
    Ok(out.contents())
}

/// Run one program that must fail, returning the error.
pub fn run_err(source: &str) -> EnkelError {
    match run(source) {
        Ok(output) => panic!("expected failure, program printed {:?}", output),
        Err(e) => e,
    }
}
