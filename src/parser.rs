use crate::error::{Diagnostics, ParseError, Report};
use crate::expr::*;
use crate::literal::Literal;
use crate::stmt::*;
use crate::token::{Token, Type};

type ParseResult<T> = Result<T, ParseError>;

const MAX_ARGS: usize = 255;

/// Recursive-descent parser with one-token lookahead and panic-mode error
/// recovery.
///
/// ```text
/// program      := declaration* EOF
/// declaration  := classDecl | funDecl | varDecl | statement
/// classDecl    := "class" IDENT ( "<" IDENT )? "{" function* "}"
/// funDecl      := "fun" function
/// function     := IDENT "(" parameters? ")" block
/// parameters   := IDENT ( "," IDENT )*
/// varDecl      := "var" IDENT ( "=" expression )? ";"
/// statement    := exprStmt | forStmt | ifStmt | printStmt
///               | returnStmt | whileStmt | block
/// block        := "{" declaration* "}"
/// forStmt      := "for" "(" ( varDecl | exprStmt | ";" )
///                           expression? ";"
///                           expression? ")" statement
/// ifStmt       := "if" "(" expression ")" statement ( "else" statement )?
/// printStmt    := "print" expression ";"
/// returnStmt   := "return" expression? ";"
/// whileStmt    := "while" "(" expression ")" statement
/// exprStmt     := expression ";"
/// expression   := assignment
/// assignment   := ( call "." )? IDENT "=" assignment | logic_or
/// logic_or     := logic_and ( "or" logic_and )*
/// logic_and    := equality ( "and" equality )*
/// equality     := comparison ( ( "!=" | "==" ) comparison )*
/// comparison   := term ( ( ">" | ">=" | "<" | "<=" ) term )*
/// term         := factor ( ( "-" | "+" ) factor )*
/// factor       := unary ( ( "/" | "*" ) unary )*
/// unary        := ( "!" | "-" ) unary | call
/// call         := primary ( "(" arguments? ")" | "." IDENT )*
/// arguments    := expression ( "," expression )*
/// primary      := "true" | "false" | "nil" | "this"
///               | NUMBER | STRING | IDENT
///               | "(" expression ")"
///               | "super" "." IDENT
/// ```
pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
    /// Errors that are reported but do not abort parsing (the over-255
    /// argument/parameter limit). These surface deep inside
    /// expression parsing, below where the real `Diagnostics` sink is
    /// threaded, so they are queued here and flushed once the enclosing
    /// declaration finishes instead of needing every grammar rule to carry
    /// a `&mut Diagnostics` parameter.
    pending_errors: Vec<ParseError>,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Parser { tokens, current: 0, pending_errors: Vec::new() }
    }

    pub fn parse(&mut self, diagnostics: &mut Diagnostics) -> Vec<Stmt> {
        let mut statements = Vec::new();

        while !self.is_at_end() {
            if let Some(stmt) = self.declaration(diagnostics) {
                statements.push(stmt);
            }
        }

        statements
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.current]
    }

    fn previous(&self) -> &Token {
        &self.tokens[self.current - 1]
    }

    fn is_at_end(&self) -> bool {
        self.peek().r#type == Type::EOF
    }

    fn check(&self, r#type: Type) -> bool {
        !self.is_at_end() && self.peek().r#type == r#type
    }

    fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.current += 1;
        }
        self.previous()
    }

    /// Consumes the next token if it is any of `types`.
    fn advance_if_any(&mut self, types: &[Type]) -> bool {
        if types.iter().any(|t| self.check(*t)) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn consume(&mut self, r#type: Type, message: &str) -> ParseResult<&Token> {
        if self.check(r#type) {
            return Ok(self.advance());
        }

        Err(ParseError { token: self.peek().clone(), message: message.to_string() })
    }

    fn declaration(&mut self, diagnostics: &mut Diagnostics) -> Option<Stmt> {
        let result = if self.advance_if_any(&[Type::Class]) {
            self.class_declaration(diagnostics)
        } else if self.advance_if_any(&[Type::Fun]) {
            self.function("function", diagnostics)
        } else if self.advance_if_any(&[Type::Var]) {
            self.var_declaration()
        } else {
            self.statement(diagnostics)
        };

        for error in self.pending_errors.drain(..) {
            error.report(diagnostics);
        }

        match result {
            Ok(stmt) => Some(stmt),
            Err(error) => {
                error.report(diagnostics);
                self.synchronize();
                None
            }
        }
    }

    fn class_declaration(&mut self, diagnostics: &mut Diagnostics) -> ParseResult<Stmt> {
        let name = self.consume(Type::Identifier, "Expect class name.")?.clone();

        let superclass = if self.advance_if_any(&[Type::Less]) {
            self.consume(Type::Identifier, "Expect superclass name.")?;
            Some(Expr::Variable(VariableData { id: next_node_id(), name: self.previous().clone() }))
        } else {
            None
        };

        self.consume(Type::LeftBrace, "Expect '{' before class body.")?;

        let mut methods = Vec::new();
        while !self.check(Type::RightBrace) && !self.is_at_end() {
            methods.push(self.function("method", diagnostics)?);
        }

        self.consume(Type::RightBrace, "Expect '}' after class body.")?;

        Ok(Stmt::Class(ClassData { name, superclass, methods }))
    }

    fn var_declaration(&mut self) -> ParseResult<Stmt> {
        let name = self.consume(Type::Identifier, "Expect variable name.")?.clone();

        let initializer = if self.advance_if_any(&[Type::Equal]) {
            Some(self.expression()?)
        } else {
            None
        };

        self.consume(Type::Semicolon, "Expect ';' after variable declaration.")?;
        Ok(Stmt::Var(VarData { name, initializer }))
    }

    fn statement(&mut self, diagnostics: &mut Diagnostics) -> ParseResult<Stmt> {
        if self.advance_if_any(&[Type::For]) {
            return self.for_statement(diagnostics);
        }
        if self.advance_if_any(&[Type::If]) {
            return self.if_statement(diagnostics);
        }
        if self.advance_if_any(&[Type::Print]) {
            return self.print_statement();
        }
        if self.advance_if_any(&[Type::Return]) {
            return self.return_statement();
        }
        if self.advance_if_any(&[Type::While]) {
            return self.while_statement(diagnostics);
        }
        if self.advance_if_any(&[Type::LeftBrace]) {
            return Ok(Stmt::Block(BlockData { statements: self.block(diagnostics)? }));
        }

        self.expression_statement()
    }

    /// Desugars `for (init; cond; incr) body` into a `while` loop wrapped in
    /// a block.
    fn for_statement(&mut self, diagnostics: &mut Diagnostics) -> ParseResult<Stmt> {
        self.consume(Type::LeftParen, "Expect '(' after 'for'.")?;

        let initializer = if self.advance_if_any(&[Type::Semicolon]) {
            None
        } else if self.advance_if_any(&[Type::Var]) {
            Some(self.var_declaration()?)
        } else {
            Some(self.expression_statement()?)
        };

        let condition = if !self.check(Type::Semicolon) { Some(self.expression()?) } else { None };
        self.consume(Type::Semicolon, "Expect ';' after loop condition.")?;

        let increment = if !self.check(Type::RightParen) { Some(self.expression()?) } else { None };
        self.consume(Type::RightParen, "Expect ')' after for clauses.")?;

        let mut body = self.statement(diagnostics)?;

        if let Some(increment) = increment {
            body = Stmt::Block(BlockData {
                statements: vec![body, Stmt::Expression(ExpressionData { expr: increment })],
            });
        }

        body = Stmt::While(WhileData {
            condition: condition.unwrap_or(Expr::Literal(Literal::Bool(true))),
            body: Box::new(body),
        });

        if let Some(initializer) = initializer {
            body = Stmt::Block(BlockData { statements: vec![initializer, body] });
        }

        Ok(body)
    }

    fn if_statement(&mut self, diagnostics: &mut Diagnostics) -> ParseResult<Stmt> {
        self.consume(Type::LeftParen, "Expect '(' after 'if'.")?;
        let condition = self.expression()?;
        self.consume(Type::RightParen, "Expect ')' after if condition.")?;

        let then_branch = Box::new(self.statement(diagnostics)?);
        let else_branch = if self.advance_if_any(&[Type::Else]) {
            Some(Box::new(self.statement(diagnostics)?))
        } else {
            None
        };

        Ok(Stmt::If(IfData { condition, then_branch, else_branch }))
    }

    fn print_statement(&mut self) -> ParseResult<Stmt> {
        let expr = self.expression()?;
        self.consume(Type::Semicolon, "Expect ';' after value.")?;
        Ok(Stmt::Print(PrintData { expr }))
    }

    fn return_statement(&mut self) -> ParseResult<Stmt> {
        let keyword = self.previous().clone();

        let value = if !self.check(Type::Semicolon) { Some(self.expression()?) } else { None };

        self.consume(Type::Semicolon, "Expect ';' after return value.")?;
        Ok(Stmt::Return(ReturnData { keyword, value }))
    }

    fn while_statement(&mut self, diagnostics: &mut Diagnostics) -> ParseResult<Stmt> {
        self.consume(Type::LeftParen, "Expect '(' after 'while'.")?;
        let condition = self.expression()?;
        self.consume(Type::RightParen, "Expect ')' after condition.")?;
        let body = Box::new(self.statement(diagnostics)?);

        Ok(Stmt::While(WhileData { condition, body }))
    }

    fn expression_statement(&mut self) -> ParseResult<Stmt> {
        let expr = self.expression()?;
        self.consume(Type::Semicolon, "Expect ';' after expression.")?;
        Ok(Stmt::Expression(ExpressionData { expr }))
    }

    fn function(&mut self, kind: &str, diagnostics: &mut Diagnostics) -> ParseResult<Stmt> {
        let name = self.consume(Type::Identifier, &format!("Expect {kind} name."))?.clone();
        self.consume(Type::LeftParen, &format!("Expect '(' after {kind} name."))?;

        let mut params = Vec::new();
        if !self.check(Type::RightParen) {
            loop {
                if params.len() >= MAX_ARGS {
                    self.pending_errors.push(ParseError {
                        token: self.peek().clone(),
                        message: format!("Can't have more than {MAX_ARGS} parameters."),
                    });
                }

                params.push(self.consume(Type::Identifier, "Expect parameter name.")?.clone());

                if !self.advance_if_any(&[Type::Comma]) {
                    break;
                }
            }
        }

        self.consume(Type::RightParen, "Expect ')' after parameters.")?;
        self.consume(Type::LeftBrace, &format!("Expect '{{' before {kind} body."))?;

        let body = self.block(diagnostics)?;

        Ok(Stmt::Function(FunctionData { name, params, body }))
    }

    fn block(&mut self, diagnostics: &mut Diagnostics) -> ParseResult<Vec<Stmt>> {
        let mut statements = Vec::new();

        while !self.check(Type::RightBrace) && !self.is_at_end() {
            if let Some(stmt) = self.declaration(diagnostics) {
                statements.push(stmt);
            }
        }

        self.consume(Type::RightBrace, "Expect '}' after block.")?;

        Ok(statements)
    }

    fn expression(&mut self) -> ParseResult<Expr> {
        self.assignment()
    }

    /// `(call ".")? IDENT "=" assignment | logic_or`. If the left-hand side
    /// does not turn out to be a `Variable` or `Get`, the assignment target
    /// is invalid: that is reported but does not abort parsing.
    fn assignment(&mut self) -> ParseResult<Expr> {
        let expr = self.or()?;

        if self.advance_if_any(&[Type::Equal]) {
            let equals = self.previous().clone();
            let value = self.assignment()?;

            return Ok(match expr {
                Expr::Variable(data) => {
                    Expr::Assign(AssignData { id: next_node_id(), name: data.name, value: Box::new(value) })
                }
                Expr::Get(data) => {
                    Expr::Set(SetData { object: data.object, name: data.name, value: Box::new(value) })
                }
                _ => {
                    self.pending_errors.push(ParseError {
                        token: equals,
                        message: "Invalid assignment target.".to_string(),
                    });
                    expr
                }
            });
        }

        Ok(expr)
    }

    fn or(&mut self) -> ParseResult<Expr> {
        let mut expr = self.and()?;

        while self.advance_if_any(&[Type::Or]) {
            let operator = self.previous().clone();
            let right = self.and()?;
            expr = Expr::Logical(LogicalData { left: Box::new(expr), operator, right: Box::new(right) });
        }

        Ok(expr)
    }

    fn and(&mut self) -> ParseResult<Expr> {
        let mut expr = self.equality()?;

        while self.advance_if_any(&[Type::And]) {
            let operator = self.previous().clone();
            let right = self.equality()?;
            expr = Expr::Logical(LogicalData { left: Box::new(expr), operator, right: Box::new(right) });
        }

        Ok(expr)
    }

    fn equality(&mut self) -> ParseResult<Expr> {
        let mut expr = self.comparison()?;

        while self.advance_if_any(&[Type::BangEqual, Type::EqualEqual]) {
            let operator = self.previous().clone();
            let right = self.comparison()?;
            expr = Expr::Binary(BinaryData { left: Box::new(expr), operator, right: Box::new(right) });
        }

        Ok(expr)
    }

    fn comparison(&mut self) -> ParseResult<Expr> {
        let mut expr = self.term()?;

        while self.advance_if_any(&[Type::Greater, Type::GreaterEqual, Type::Less, Type::LessEqual]) {
            let operator = self.previous().clone();
            let right = self.term()?;
            expr = Expr::Binary(BinaryData { left: Box::new(expr), operator, right: Box::new(right) });
        }

        Ok(expr)
    }

    fn term(&mut self) -> ParseResult<Expr> {
        let mut expr = self.factor()?;

        while self.advance_if_any(&[Type::Minus, Type::Plus]) {
            let operator = self.previous().clone();
            let right = self.factor()?;
            expr = Expr::Binary(BinaryData { left: Box::new(expr), operator, right: Box::new(right) });
        }

        Ok(expr)
    }

    fn factor(&mut self) -> ParseResult<Expr> {
        let mut expr = self.unary()?;

        while self.advance_if_any(&[Type::Slash, Type::Star]) {
            let operator = self.previous().clone();
            let right = self.unary()?;
            expr = Expr::Binary(BinaryData { left: Box::new(expr), operator, right: Box::new(right) });
        }

        Ok(expr)
    }

    fn unary(&mut self) -> ParseResult<Expr> {
        if self.advance_if_any(&[Type::Bang, Type::Minus]) {
            let operator = self.previous().clone();
            let right = self.unary()?;
            return Ok(Expr::Unary(UnaryData { operator, expr: Box::new(right) }));
        }

        self.call()
    }

    fn finish_call(&mut self, callee: Expr) -> ParseResult<Expr> {
        let mut arguments = Vec::new();

        if !self.check(Type::RightParen) {
            loop {
                if arguments.len() >= MAX_ARGS {
                    self.pending_errors.push(ParseError {
                        token: self.peek().clone(),
                        message: format!("Can't have more than {MAX_ARGS} arguments."),
                    });
                }

                arguments.push(self.expression()?);

                if !self.advance_if_any(&[Type::Comma]) {
                    break;
                }
            }
        }

        let paren = self.consume(Type::RightParen, "Expect ')' after arguments.")?.clone();

        Ok(Expr::Call(CallData { callee: Box::new(callee), paren, arguments }))
    }

    fn call(&mut self) -> ParseResult<Expr> {
        let mut expr = self.primary()?;

        loop {
            if self.advance_if_any(&[Type::LeftParen]) {
                expr = self.finish_call(expr)?;
            } else if self.advance_if_any(&[Type::Dot]) {
                let name = self.consume(Type::Identifier, "Expect property name after '.'.")?.clone();
                expr = Expr::Get(GetData { object: Box::new(expr), name });
            } else {
                break;
            }
        }

        Ok(expr)
    }

    fn primary(&mut self) -> ParseResult<Expr> {
        if self.advance_if_any(&[Type::False]) {
            return Ok(Expr::Literal(Literal::Bool(false)));
        }
        if self.advance_if_any(&[Type::True]) {
            return Ok(Expr::Literal(Literal::Bool(true)));
        }
        if self.advance_if_any(&[Type::Nil]) {
            return Ok(Expr::Literal(Literal::Nil));
        }
        if self.advance_if_any(&[Type::Number, Type::String]) {
            let literal = self
                .previous()
                .literal
                .clone()
                .unwrap_or(Literal::Nil);
            return Ok(Expr::Literal(literal));
        }
        if self.advance_if_any(&[Type::Super]) {
            let keyword = self.previous().clone();
            self.consume(Type::Dot, "Expect '.' after 'super'.")?;
            let method = self.consume(Type::Identifier, "Expect superclass method name.")?.clone();
            return Ok(Expr::Super(SuperData { id: next_node_id(), keyword, method }));
        }
        if self.advance_if_any(&[Type::This]) {
            return Ok(Expr::This(ThisData { id: next_node_id(), keyword: self.previous().clone() }));
        }
        if self.advance_if_any(&[Type::Identifier]) {
            return Ok(Expr::Variable(VariableData { id: next_node_id(), name: self.previous().clone() }));
        }
        if self.advance_if_any(&[Type::LeftParen]) {
            let expr = self.expression()?;
            self.consume(Type::RightParen, "Expect ')' after expression.")?;
            return Ok(Expr::Grouping(GroupingData { expr: Box::new(expr) }));
        }

        Err(ParseError { token: self.peek().clone(), message: "Expect expression.".to_string() })
    }

    /// Discards tokens until a likely statement boundary so that a single
    /// syntax error does not cascade into a flood of spurious diagnostics
    ///.
    fn synchronize(&mut self) {
        self.advance();

        while !self.is_at_end() {
            if self.previous().r#type == Type::Semicolon {
                return;
            }

            match self.peek().r#type {
                Type::Class | Type::Fun | Type::Var | Type::For
                | Type::If | Type::While | Type::Print | Type::Return => return,
                _ => {
                    self.advance();
                }
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::scanner::Scanner;

    fn parse(source: &str) -> (Vec<Stmt>, Diagnostics) {
        let mut diagnostics = Diagnostics::new();
        let tokens = Scanner::new(source).scan_tokens(&mut diagnostics);
        let statements = Parser::new(tokens).parse(&mut diagnostics);
        (statements, diagnostics)
    }

    #[test]
    fn parses_expression_statement() {
        let (statements, diagnostics) = parse("1 + 2;");
        assert!(!diagnostics.had_error());
        assert_eq!(statements.len(), 1);
        assert!(matches!(statements[0], Stmt::Expression(_)));
    }

    #[test]
    fn reports_missing_semicolon() {
        let (_, diagnostics) = parse("1 + 2");
        assert!(diagnostics.had_error());
    }

    #[test]
    fn for_loop_desugars_to_block_with_while() {
        let (statements, diagnostics) = parse("for (var i = 0; i < 10; i = i + 1) print i;");
        assert!(!diagnostics.had_error());
        assert_eq!(statements.len(), 1);
        match &statements[0] {
            Stmt::Block(data) => {
                assert_eq!(data.statements.len(), 2);
                assert!(matches!(data.statements[1], Stmt::While(_)));
            }
            other => panic!("expected block, got {other:?}"),
        }
    }

    #[test]
    fn invalid_assignment_target_is_reported_but_does_not_abort() {
        let (statements, diagnostics) = parse("1 = 2;");
        assert!(diagnostics.had_error());
        assert_eq!(statements.len(), 1);
    }

    #[test]
    fn class_with_superclass_parses() {
        let (statements, diagnostics) = parse("class A < B { foo() {} }");
        assert!(!diagnostics.had_error());
        match &statements[0] {
            Stmt::Class(data) => assert!(data.superclass.is_some()),
            other => panic!("expected class, got {other:?}"),
        }
    }

    #[test]
    fn synchronize_recovers_at_next_statement() {
        let (statements, diagnostics) = parse("var = ; print 1;");
        assert!(diagnostics.had_error());
        assert!(statements.iter().any(|s| matches!(s, Stmt::Print(_))));
    }
}
