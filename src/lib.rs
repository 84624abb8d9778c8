pub mod ast;
pub mod ast_printer;
pub mod callable;
pub mod environment;
pub mod error;
pub mod interpreter;
pub mod lexer;
pub mod parser;
pub mod report;
pub mod resolver;
pub mod session;
pub mod stdlib;
pub mod token;
pub mod value;
