use std::collections::HashMap;
use std::mem;

use crate::error::{Diagnostics, Report, ResolveError};
use crate::expr::*;
use crate::literal::Literal;
use crate::stmt::*;
use crate::token::Token;

#[derive(Clone, Copy, PartialEq)]
enum FunctionType {
    None,
    Function,
    Initializer,
    Method,
}

#[derive(Clone, Copy, PartialEq)]
enum ClassType {
    None,
    Class,
    Subclass,
}

/// The static-scoping pre-pass. Walks the same AST the
/// interpreter will, tracking which scope each variable reference resolves
/// to, and records the result as a hop count keyed by the reference's
/// [`NodeId`] rather than mutating the AST in place.
///
/// The resolver never runs code: `if`/`while`/`and`/`or`/function bodies are
/// all visited exactly once regardless of how many times they would execute,
/// which is what lets it catch scoping errors (and only scoping errors)
/// ahead of time.
pub struct Resolver {
    scopes: Vec<HashMap<String, bool>>,
    locals: HashMap<NodeId, usize>,
    current_function: FunctionType,
    current_class: ClassType,
}

impl Resolver {
    pub fn new() -> Self {
        Resolver {
            scopes: Vec::new(),
            locals: HashMap::new(),
            current_function: FunctionType::None,
            current_class: ClassType::None,
        }
    }

    /// Resolves every statement and returns the `NodeId -> scope distance`
    /// table the interpreter uses for variable lookups.
    pub fn resolve(mut self, statements: &[Stmt], diagnostics: &mut Diagnostics) -> HashMap<NodeId, usize> {
        for statement in statements {
            self.resolve_stmt(statement, diagnostics);
        }
        self.locals
    }

    fn resolve_stmt(&mut self, stmt: &Stmt, diagnostics: &mut Diagnostics) {
        stmt.accept(&mut Pass { resolver: self, diagnostics });
    }

    fn resolve_expr(&mut self, expr: &Expr, diagnostics: &mut Diagnostics) {
        expr.accept(&mut Pass { resolver: self, diagnostics });
    }

    fn resolve_function(&mut self, params: &[Token], body: &[Stmt], r#type: FunctionType, diagnostics: &mut Diagnostics) {
        let enclosing_function = mem::replace(&mut self.current_function, r#type);

        self.begin_scope();
        for param in params {
            self.declare(param, diagnostics);
            self.define(param);
        }
        for statement in body {
            self.resolve_stmt(statement, diagnostics);
        }
        self.end_scope();

        self.current_function = enclosing_function;
    }

    fn begin_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    fn end_scope(&mut self) {
        self.scopes.pop();
    }

    fn declare(&mut self, name: &Token, diagnostics: &mut Diagnostics) {
        let Some(scope) = self.scopes.last_mut() else { return };

        if scope.contains_key(&name.lexeme) {
            ResolveError {
                token: name.clone(),
                message: "Already a variable with this name in this scope.".to_string(),
            }
            .report(diagnostics);
        }

        scope.insert(name.lexeme.clone(), false);
    }

    fn define(&mut self, name: &Token) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.lexeme.clone(), true);
        }
    }

    fn resolve_local(&mut self, id: NodeId, name: &Token) {
        for (i, scope) in self.scopes.iter().rev().enumerate() {
            if scope.contains_key(&name.lexeme) {
                self.locals.insert(id, i);
                return;
            }
        }
        // Not found in any tracked scope: treated as global, resolved at
        // call time by the interpreter's global environment lookup.
    }
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new()
    }
}

/// A short-lived visitor pairing the resolver with the diagnostics sink for
/// one `accept()` dispatch, so individual visit methods don't need to thread
/// `diagnostics` through every call by hand.
struct Pass<'a> {
    resolver: &'a mut Resolver,
    diagnostics: &'a mut Diagnostics,
}

impl ExprVisitor<()> for Pass<'_> {
    fn visit_literal_expr(&mut self, _literal: &Literal) {}

    fn visit_unary_expr(&mut self, data: &UnaryData) {
        self.resolver.resolve_expr(&data.expr, self.diagnostics);
    }

    fn visit_binary_expr(&mut self, data: &BinaryData) {
        self.resolver.resolve_expr(&data.left, self.diagnostics);
        self.resolver.resolve_expr(&data.right, self.diagnostics);
    }

    fn visit_logical_expr(&mut self, data: &LogicalData) {
        self.resolver.resolve_expr(&data.left, self.diagnostics);
        self.resolver.resolve_expr(&data.right, self.diagnostics);
    }

    fn visit_grouping_expr(&mut self, data: &GroupingData) {
        self.resolver.resolve_expr(&data.expr, self.diagnostics);
    }

    fn visit_variable_expr(&mut self, data: &VariableData) {
        if let Some(scope) = self.resolver.scopes.last() {
            if scope.get(&data.name.lexeme) == Some(&false) {
                ResolveError {
                    token: data.name.clone(),
                    message: "Can't read local variable in its own initializer.".to_string(),
                }
                .report(self.diagnostics);
            }
        }

        self.resolver.resolve_local(data.id, &data.name);
    }

    fn visit_assign_expr(&mut self, data: &AssignData) {
        self.resolver.resolve_expr(&data.value, self.diagnostics);
        self.resolver.resolve_local(data.id, &data.name);
    }

    fn visit_call_expr(&mut self, data: &CallData) {
        self.resolver.resolve_expr(&data.callee, self.diagnostics);
        for argument in &data.arguments {
            self.resolver.resolve_expr(argument, self.diagnostics);
        }
    }

    fn visit_get_expr(&mut self, data: &GetData) {
        self.resolver.resolve_expr(&data.object, self.diagnostics);
    }

    fn visit_set_expr(&mut self, data: &SetData) {
        self.resolver.resolve_expr(&data.value, self.diagnostics);
        self.resolver.resolve_expr(&data.object, self.diagnostics);
    }

    fn visit_this_expr(&mut self, data: &ThisData) {
        if self.resolver.current_class == ClassType::None {
            ResolveError {
                token: data.keyword.clone(),
                message: "Can't use 'this' outside of a class.".to_string(),
            }
            .report(self.diagnostics);
            return;
        }

        self.resolver.resolve_local(data.id, &data.keyword);
    }

    fn visit_super_expr(&mut self, data: &SuperData) {
        match self.resolver.current_class {
            ClassType::Subclass => {}
            ClassType::None => {
                ResolveError {
                    token: data.keyword.clone(),
                    message: "Can't use 'super' outside of a class.".to_string(),
                }
                .report(self.diagnostics);
                return;
            }
            ClassType::Class => {
                ResolveError {
                    token: data.keyword.clone(),
                    message: "Can't use 'super' in a class with no superclass.".to_string(),
                }
                .report(self.diagnostics);
                return;
            }
        }

        self.resolver.resolve_local(data.id, &data.keyword);
    }
}

impl StmtVisitor<()> for Pass<'_> {
    fn visit_expression_stmt(&mut self, data: &ExpressionData) {
        self.resolver.resolve_expr(&data.expr, self.diagnostics);
    }

    fn visit_print_stmt(&mut self, data: &PrintData) {
        self.resolver.resolve_expr(&data.expr, self.diagnostics);
    }

    fn visit_var_stmt(&mut self, data: &VarData) {
        self.resolver.declare(&data.name, self.diagnostics);
        if let Some(initializer) = &data.initializer {
            self.resolver.resolve_expr(initializer, self.diagnostics);
        }
        self.resolver.define(&data.name);
    }

    fn visit_block_stmt(&mut self, data: &BlockData) {
        self.resolver.begin_scope();
        for statement in &data.statements {
            self.resolver.resolve_stmt(statement, self.diagnostics);
        }
        self.resolver.end_scope();
    }

    fn visit_if_stmt(&mut self, data: &IfData) {
        self.resolver.resolve_expr(&data.condition, self.diagnostics);
        self.resolver.resolve_stmt(&data.then_branch, self.diagnostics);
        if let Some(else_branch) = &data.else_branch {
            self.resolver.resolve_stmt(else_branch, self.diagnostics);
        }
    }

    fn visit_while_stmt(&mut self, data: &WhileData) {
        self.resolver.resolve_expr(&data.condition, self.diagnostics);
        self.resolver.resolve_stmt(&data.body, self.diagnostics);
    }

    fn visit_function_stmt(&mut self, data: &FunctionData) {
        self.resolver.declare(&data.name, self.diagnostics);
        self.resolver.define(&data.name);

        self.resolver.resolve_function(&data.params, &data.body, FunctionType::Function, self.diagnostics);
    }

    fn visit_return_stmt(&mut self, data: &ReturnData) {
        if self.resolver.current_function == FunctionType::None {
            ResolveError {
                token: data.keyword.clone(),
                message: "Can't return from top-level code.".to_string(),
            }
            .report(self.diagnostics);
        }

        if let Some(value) = &data.value {
            if self.resolver.current_function == FunctionType::Initializer {
                ResolveError {
                    token: data.keyword.clone(),
                    message: "Can't return a value from an initializer.".to_string(),
                }
                .report(self.diagnostics);
                return;
            }

            self.resolver.resolve_expr(value, self.diagnostics);
        }
    }

    fn visit_class_stmt(&mut self, data: &ClassData) {
        let enclosing_class = mem::replace(&mut self.resolver.current_class, ClassType::Class);

        self.resolver.declare(&data.name, self.diagnostics);
        self.resolver.define(&data.name);

        if let Some(superclass) = &data.superclass {
            let Expr::Variable(superclass_var) = superclass else {
                unreachable!("parser only ever produces a Variable expr for a superclass reference")
            };

            if data.name.lexeme == superclass_var.name.lexeme {
                ResolveError {
                    token: superclass_var.name.clone(),
                    message: "A class can't inherit from itself.".to_string(),
                }
                .report(self.diagnostics);
            }

            self.resolver.current_class = ClassType::Subclass;
            self.resolver.resolve_expr(superclass, self.diagnostics);

            self.resolver.begin_scope();
            self.resolver.scopes.last_mut().expect("scope just pushed").insert("super".to_string(), true);
        }

        self.resolver.begin_scope();
        self.resolver.scopes.last_mut().expect("scope just pushed").insert("this".to_string(), true);

        for method in &data.methods {
            let Stmt::Function(function) = method else {
                unreachable!("parser only ever produces Function statements in a class body")
            };

            let declaration =
                if function.name.lexeme == "init" { FunctionType::Initializer } else { FunctionType::Method };

            self.resolver.resolve_function(&function.params, &function.body, declaration, self.diagnostics);
        }

        self.resolver.end_scope();

        if data.superclass.is_some() {
            self.resolver.end_scope();
        }

        self.resolver.current_class = enclosing_class;
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::parser::Parser;
    use crate::scanner::Scanner;

    fn resolve(source: &str) -> (HashMap<NodeId, usize>, Diagnostics) {
        let mut diagnostics = Diagnostics::new();
        let tokens = Scanner::new(source).scan_tokens(&mut diagnostics);
        let statements = Parser::new(tokens).parse(&mut diagnostics);
        let locals = Resolver::new().resolve(&statements, &mut diagnostics);
        (locals, diagnostics)
    }

    #[test]
    fn self_reference_in_initializer_is_an_error() {
        let (_, diagnostics) = resolve("{ var a = a; }");
        assert!(diagnostics.had_error());
    }

    #[test]
    fn redeclaring_a_local_is_an_error() {
        let (_, diagnostics) = resolve("{ var a = 1; var a = 2; }");
        assert!(diagnostics.had_error());
    }

    #[test]
    fn redeclaring_a_global_is_not_an_error() {
        let (_, diagnostics) = resolve("var a = 1; var a = 2;");
        assert!(!diagnostics.had_error());
    }

    #[test]
    fn return_at_top_level_is_an_error() {
        let (_, diagnostics) = resolve("return 1;");
        assert!(diagnostics.had_error());
    }

    #[test]
    fn return_value_from_initializer_is_an_error() {
        let (_, diagnostics) = resolve("class A { init() { return 1; } }");
        assert!(diagnostics.had_error());
    }

    #[test]
    fn this_outside_class_is_an_error() {
        let (_, diagnostics) = resolve("print this;");
        assert!(diagnostics.had_error());
    }

    #[test]
    fn super_without_superclass_is_an_error() {
        let (_, diagnostics) = resolve("class A { foo() { super.bar(); } }");
        assert!(diagnostics.had_error());
    }

    #[test]
    fn class_inheriting_from_itself_is_an_error() {
        let (_, diagnostics) = resolve("class A < A {}");
        assert!(diagnostics.had_error());
    }

    #[test]
    fn nested_block_local_resolves_at_distance_zero() {
        let (locals, diagnostics) = resolve("{ var a = 1; print a; }");
        assert!(!diagnostics.had_error());
        assert!(locals.values().any(|&d| d == 0));
    }
}
