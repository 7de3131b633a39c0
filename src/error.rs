use crate::token::{Token, Type};

/// Collects the two compile-time/runtime failure flags the driver checks
/// after each pipeline stage. Unlike the upstream reference
/// this crate ports from, these flags live on an instance rather than behind
/// `static mut`: the REPL resets them between lines by constructing a fresh
/// `Diagnostics` state instead of touching process-wide globals, and nothing
/// stops two `Lox` instances from running concurrently in the same process
/// (e.g. in tests).
#[derive(Debug, Default)]
pub struct Diagnostics {
    had_error: bool,
    had_runtime_error: bool,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// True after any scan, parse, resolve, or runtime error.
    pub fn had_error(&self) -> bool {
        self.had_error || self.had_runtime_error
    }

    pub fn had_runtime_error(&self) -> bool {
        self.had_runtime_error
    }

    /// Resets both flags. Used by the REPL after each line.
    pub fn reset(&mut self) {
        self.had_error = false;
        self.had_runtime_error = false;
    }

    fn mark_static(&mut self) {
        self.had_error = true;
    }

    fn mark_runtime(&mut self) {
        self.had_runtime_error = true;
    }
}

/// Every diagnostic type knows how to render itself to the error sink and
/// which flag it trips.
pub trait Report {
    fn report(&self, diagnostics: &mut Diagnostics);
}

/// A lexical error: unexpected character, unterminated string, etc.
#[derive(Debug)]
pub struct ScanError {
    pub line: usize,
    pub message: String,
}

impl Report for ScanError {
    fn report(&self, diagnostics: &mut Diagnostics) {
        eprintln!("[line {}] Error: {}", self.line, self.message);
        diagnostics.mark_static();
    }
}

/// A syntactic error produced by the parser.
#[derive(Debug)]
pub struct ParseError {
    pub token: Token,
    pub message: String,
}

impl Report for ParseError {
    fn report(&self, diagnostics: &mut Diagnostics) {
        let r#where = if self.token.r#type == Type::EOF {
            " at end".to_string()
        } else {
            format!(" at '{}'", self.token.lexeme)
        };
        eprintln!("[line {}] Error{}: {}", self.token.line, r#where, self.message);
        diagnostics.mark_static();
    }
}

/// A static scoping error produced by the resolver.
#[derive(Debug)]
pub struct ResolveError {
    pub token: Token,
    pub message: String,
}

impl Report for ResolveError {
    fn report(&self, diagnostics: &mut Diagnostics) {
        let r#where = if self.token.r#type == Type::EOF {
            " at end".to_string()
        } else {
            format!(" at '{}'", self.token.lexeme)
        };
        eprintln!("[line {}] Error{}: {}", self.token.line, r#where, self.message);
        diagnostics.mark_static();
    }
}

/// A runtime error raised while evaluating the AST.
#[derive(Debug, Clone)]
pub struct RuntimeError {
    pub token: Token,
    pub message: String,
}

impl Report for RuntimeError {
    fn report(&self, diagnostics: &mut Diagnostics) {
        eprintln!("{}\n[line {}]", self.message, self.token.line);
        diagnostics.mark_runtime();
    }
}
