#![allow(clippy::needless_return)]

//! loxrs is a tree-walking interpreter for the Lox language. It is a dynamically typed,
//! lexically scoped language with first-class functions and single-inheritance classes.
//!
//! The interpreter is built as four decoupled stages:
//!
//! ## Scanning
//! Converts source text into a token stream. Implemented in [`scanner`] as a state machine over a
//! buffered character iterator. Lexical errors (an unterminated string, an unexpected character) are
//! reported as they are found; the scanner keeps going so a single run can surface more than one
//! mistake.
//!
//! ## Parsing
//! Converts the token stream into an abstract syntax tree. Implemented in [`parser`] as a recursive
//! descent parser over the grammar documented on [`parser::Parser`]. [`Expressions`](expr::Expr)
//! produce an [`Object`](object::Object); [`statements`](stmt::Stmt) perform an action and produce
//! nothing. On a syntax error the parser reports it and synchronizes to the next statement boundary
//! rather than aborting.
//!
//! ## Resolving
//! A static pass over the AST that determines, for every variable reference, how many enclosing
//! scopes separate it from its declaration. Implemented in [`resolver`] as a tree-walk that produces a
//! `NodeId -> depth` map consumed by the interpreter. Needed because a naive environment-chain lookup
//! would let a closure re-resolve a variable differently depending on when it runs, which breaks
//! lexical scoping around shadowing.
//!
//! ## Interpreting
//! Walks the AST and evaluates it. Implemented in [`interpreter`] as a tree-walk interpreter that
//! threads a chain of [`Environment`](environment::Environment)s for variable storage and reports
//! failures as a [`RuntimeError`](error::RuntimeError).
//!
//! These stages are wired together by [`Lox`], which owns a single [`Diagnostics`](error::Diagnostics)
//! instance shared across a run.

use std::io::Write;

pub mod ast;
pub mod class;
pub mod environment;
pub mod error;
pub mod expr;
pub mod function;
pub mod interpreter;
pub mod literal;
pub mod object;
pub mod parser;
pub mod resolver;
pub mod scanner;
pub mod stmt;
pub mod token;

use error::Diagnostics;
use interpreter::Interpreter;
use parser::Parser;
use resolver::Resolver;
use scanner::Scanner;

/// The interpreter façade: wires scanning, parsing, resolving and interpreting into a single
/// pipeline and owns the diagnostics state for a run.
///
/// `output` is where `print` statements and the `run_prompt` banner are written; tests construct a
/// `Lox` over an in-memory buffer to assert on program output without touching stdout.
pub struct Lox {
    interpreter: Interpreter,
    diagnostics: Diagnostics,
}

impl Lox {
    pub fn new(output: impl Write + 'static) -> Self {
        Lox {
            interpreter: Interpreter::new(Box::new(output)),
            diagnostics: Diagnostics::new(),
        }
    }

    /// Runs a whole file to completion. Exits the process with the conventional sysexits.h codes
    /// (64 usage, 65 data error, 70 software error) a script runner is expected to use.
    pub fn run_file(&mut self, path: &str) {
        let contents = std::fs::read_to_string(path).unwrap_or_else(|err| {
            eprintln!("Failed to read {path}: {err}");
            std::process::exit(64);
        });

        self.run(&contents);

        if self.diagnostics.had_runtime_error() {
            std::process::exit(70);
        }
        if self.diagnostics.had_error() {
            std::process::exit(65);
        }
    }

    /// Runs a single line of source, resetting the error flags first. Used by the REPL, where one
    /// bad line shouldn't poison the rest of the session.
    pub fn run_line(&mut self, source: &str) {
        self.diagnostics.reset();
        self.run(source);
    }

    /// True if the most recent `run_line`/`run_file` call hit a compile-time or runtime error.
    pub fn had_error(&self) -> bool {
        self.diagnostics.had_error()
    }

    fn run(&mut self, source: &str) {
        let tokens = Scanner::new(source).scan_tokens(&mut self.diagnostics);
        if self.diagnostics.had_error() {
            return;
        }

        let statements = Parser::new(tokens).parse(&mut self.diagnostics);
        if self.diagnostics.had_error() {
            return;
        }

        let locals = Resolver::new().resolve(&statements, &mut self.diagnostics);
        if self.diagnostics.had_error() {
            return;
        }

        self.interpreter.resolve(locals);

        if let Err(error) = self.interpreter.interpret(&statements) {
            use error::Report;
            error.report(&mut self.diagnostics);
        }
    }
}
