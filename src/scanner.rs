use std::str::Chars;

use peekmore::{PeekMore, PeekMoreIterator};

use crate::error::{Diagnostics, Report, ScanError};
use crate::literal::Literal;
use crate::token::{Token, Type};

/// Converts source text into a token stream. Implemented as a
/// state machine over a `peekmore`-buffered character iterator so that the
/// two-character operators and the fractional-number lookahead only ever
/// need to peek, never backtrack.
pub struct Scanner<'a> {
    source: PeekMoreIterator<Chars<'a>>,
    tokens: Vec<Token>,
    lexeme: String,
    line: usize,
}

impl<'a> Scanner<'a> {
    pub fn new(source: &'a str) -> Scanner<'a> {
        Scanner {
            source: source.chars().peekmore(),
            tokens: Vec::new(),
            lexeme: String::new(),
            line: 1,
        }
    }

    /// Scans the whole source and returns its tokens, terminated by `EOF`.
    /// Lexical errors are reported to `diagnostics` as they are found; the
    /// scanner never aborts early.
    pub fn scan_tokens(mut self, diagnostics: &mut Diagnostics) -> Vec<Token> {
        while !self.is_at_end() {
            self.lexeme.clear();
            self.scan_token(diagnostics);
        }

        self.tokens.push(Token::new(Type::EOF, String::new(), None, self.line));
        self.tokens
    }

    fn is_at_end(&mut self) -> bool {
        self.source.peek().is_none()
    }

    fn advance(&mut self) -> char {
        let c = self.source.next().expect("advance called at end of source");
        self.lexeme.push(c);
        c
    }

    fn peek(&mut self) -> Option<char> {
        self.source.peek().copied()
    }

    fn peek_next(&mut self) -> Option<char> {
        self.source.peek_next().copied()
    }

    /// Consumes the next character if it matches `expected`.
    fn advance_if(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn add_token(&mut self, r#type: Type, literal: Option<Literal>) {
        self.tokens.push(Token::new(r#type, self.lexeme.clone(), literal, self.line));
    }

    fn scan_token(&mut self, diagnostics: &mut Diagnostics) {
        let c = self.advance();

        match c {
            '(' => self.add_token(Type::LeftParen, None),
            ')' => self.add_token(Type::RightParen, None),
            '{' => self.add_token(Type::LeftBrace, None),
            '}' => self.add_token(Type::RightBrace, None),
            ',' => self.add_token(Type::Comma, None),
            '.' => self.add_token(Type::Dot, None),
            '-' => self.add_token(Type::Minus, None),
            '+' => self.add_token(Type::Plus, None),
            ';' => self.add_token(Type::Semicolon, None),
            '*' => self.add_token(Type::Star, None),

            '!' => {
                let r#type = if self.advance_if('=') { Type::BangEqual } else { Type::Bang };
                self.add_token(r#type, None);
            }
            '=' => {
                let r#type = if self.advance_if('=') { Type::EqualEqual } else { Type::Equal };
                self.add_token(r#type, None);
            }
            '<' => {
                let r#type = if self.advance_if('=') { Type::LessEqual } else { Type::Less };
                self.add_token(r#type, None);
            }
            '>' => {
                let r#type = if self.advance_if('=') { Type::GreaterEqual } else { Type::Greater };
                self.add_token(r#type, None);
            }

            '/' => {
                if self.advance_if('/') {
                    while self.peek().is_some_and(|c| c != '\n') {
                        self.advance();
                    }
                } else {
                    self.add_token(Type::Slash, None);
                }
            }

            ' ' | '\r' | '\t' => {}

            '\n' => {
                self.line += 1;
            }

            '"' => self.string(diagnostics),

            c if c.is_ascii_digit() => self.number(),

            c if c.is_alphabetic() || c == '_' => self.identifier(),

            _ => {
                ScanError {
                    line: self.line,
                    message: "Unexpected character.".to_string(),
                }
                .report(diagnostics);
            }
        }
    }

    /// Handles a `"`-delimited string literal. Strings may span multiple
    /// lines; there are no escape sequences.
    fn string(&mut self, diagnostics: &mut Diagnostics) {
        let start_line = self.line;

        while self.peek().is_some_and(|c| c != '"') {
            if self.peek() == Some('\n') {
                self.line += 1;
            }
            self.advance();
        }

        if self.is_at_end() {
            ScanError {
                line: start_line,
                message: "Unterminated string.".to_string(),
            }
            .report(diagnostics);
            return;
        }

        self.advance(); // closing quote

        // The lexeme includes the quotes; the literal value does not.
        let value = self.lexeme[1..self.lexeme.len() - 1].to_string();
        self.add_token(Type::String, Some(Literal::String(value)));
    }

    /// Handles an integer or fractional number literal. A `.` not followed
    /// by a digit is left unconsumed rather than reported as an error, since
    /// leading/trailing decimals are not numbers.
    fn number(&mut self) {
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
        }

        if self.peek() == Some('.') && self.peek_next().is_some_and(|c| c.is_ascii_digit()) {
            self.advance(); // the '.'

            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.advance();
            }
        }

        let value: f64 = self.lexeme.parse().expect("scanned number lexeme to parse");
        self.add_token(Type::Number, Some(Literal::Number(value)));
    }

    /// Handles an identifier, matching it against the keyword table after
    /// the fact (maximal munch).
    fn identifier(&mut self) {
        while self.peek().is_some_and(|c| c.is_alphanumeric() || c == '_') {
            self.advance();
        }

        let r#type = match self.lexeme.as_str() {
            "and" => Type::And,
            "class" => Type::Class,
            "else" => Type::Else,
            "false" => Type::False,
            "for" => Type::For,
            "fun" => Type::Fun,
            "if" => Type::If,
            "nil" => Type::Nil,
            "or" => Type::Or,
            "print" => Type::Print,
            "return" => Type::Return,
            "super" => Type::Super,
            "this" => Type::This,
            "true" => Type::True,
            "var" => Type::Var,
            "while" => Type::While,
            _ => Type::Identifier,
        };

        self.add_token(r#type, None);
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn scan(source: &str) -> (Vec<Type>, Diagnostics) {
        let mut diagnostics = Diagnostics::new();
        let tokens = Scanner::new(source).scan_tokens(&mut diagnostics);
        (tokens.into_iter().map(|t| t.r#type).collect(), diagnostics)
    }

    #[test]
    fn single_and_double_char_tokens() {
        let (types, diagnostics) = scan("!= == <= >= < > ( ) { }");
        assert!(!diagnostics.had_error());
        assert_eq!(
            types,
            vec![
                Type::BangEqual, Type::EqualEqual, Type::LessEqual, Type::GreaterEqual,
                Type::Less, Type::Greater, Type::LeftParen, Type::RightParen,
                Type::LeftBrace, Type::RightBrace, Type::EOF,
            ]
        );
    }

    #[test]
    fn keywords_vs_identifiers() {
        let (types, _) = scan("and classy nilly");
        assert_eq!(types, vec![Type::And, Type::Identifier, Type::Identifier, Type::EOF]);
    }

    #[test]
    fn number_literal() {
        let mut diagnostics = Diagnostics::new();
        let tokens = Scanner::new("123.45").scan_tokens(&mut diagnostics);
        assert_eq!(tokens[0].literal, Some(Literal::Number(123.45)));
    }

    #[test]
    fn trailing_dot_is_not_part_of_number() {
        let (types, diagnostics) = scan("123.");
        assert!(!diagnostics.had_error());
        assert_eq!(types, vec![Type::Number, Type::Dot, Type::EOF]);
    }

    #[test]
    fn comment_runs_to_end_of_line() {
        let (types, _) = scan("1 // a comment\n2");
        assert_eq!(types, vec![Type::Number, Type::Number, Type::EOF]);
    }

    #[test]
    fn unterminated_string_reports_error() {
        let mut diagnostics = Diagnostics::new();
        Scanner::new("\"abc").scan_tokens(&mut diagnostics);
        assert!(diagnostics.had_error());
    }

    #[test]
    fn multiline_string_advances_line_count() {
        let mut diagnostics = Diagnostics::new();
        let tokens = Scanner::new("\"a\nb\" 1").scan_tokens(&mut diagnostics);
        assert_eq!(tokens[1].line, 2);
    }

    #[test]
    fn unexpected_character_does_not_abort_scan() {
        let (types, diagnostics) = scan("1 @ 2");
        assert!(diagnostics.had_error());
        assert_eq!(types, vec![Type::Number, Type::Number, Type::EOF]);
    }
}
