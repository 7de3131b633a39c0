use std::cell::RefCell;
use std::collections::HashMap;
use std::io::Write;
use std::rc::Rc;

use crate::class::{Class, Instance};
use crate::environment::Environment;
use crate::error::RuntimeError;
use crate::expr::*;
use crate::function::{Clock, Function, NativeFunction, SystemClock};
use crate::literal::Literal;
use crate::object::{Callable, Object};
use crate::stmt::*;
use crate::token::{Token, Type};

/// What executing a statement produced, short of an error: either control
/// fell off the end normally, or a `return` unwound the current call.
/// Threading this out of `execute` instead of raising an exception-like
/// value keeps `return` inside ordinary `Result`/`?` control flow, with no
/// special-cased "is this actually a return in disguise" check at every
/// call site.
pub enum ExecOutcome {
    Normal,
    Return(Object),
}

type EvalResult = Result<Object, RuntimeError>;
type ExecResult = Result<ExecOutcome, RuntimeError>;

/// Walks the AST directly against a chain of environments. Holds its
/// collaborators as fields rather than process-wide state: an output sink
/// for `print`, a clock for the native `clock` function, and the
/// resolver's `NodeId -> depth` table for O(1) lexically-scoped variable
/// lookup.
pub struct Interpreter {
    pub globals: Rc<RefCell<Environment>>,
    environment: Rc<RefCell<Environment>>,
    locals: HashMap<NodeId, usize>,
    output: Box<dyn Write>,
    pub clock: Box<dyn Clock>,
}

impl Interpreter {
    pub fn new(output: Box<dyn Write>) -> Self {
        let globals = Rc::new(RefCell::new(Environment::new(None)));

        for native in NativeFunction::globals() {
            globals.borrow_mut().define(native.name, Object::from(native));
        }

        Interpreter {
            environment: Rc::clone(&globals),
            globals,
            locals: HashMap::new(),
            output,
            clock: Box::new(SystemClock),
        }
    }

    /// Installs the resolver's scope-distance table. Called once, after
    /// resolution and before the first `interpret` call.
    pub fn resolve(&mut self, locals: HashMap<NodeId, usize>) {
        self.locals = locals;
    }

    /// Runs a full program, or a single REPL line if `statements` came from
    /// one. Stops at the first runtime error and returns it; callers report
    /// it to diagnostics. Whatever was printed before the error stays
    /// flushed.
    pub fn interpret(&mut self, statements: &[Stmt]) -> Result<(), RuntimeError> {
        for statement in statements {
            self.execute(statement)?;
        }
        Ok(())
    }

    fn execute(&mut self, stmt: &Stmt) -> ExecResult {
        stmt.accept(self)
    }

    fn evaluate(&mut self, expr: &Expr) -> EvalResult {
        expr.accept(self)
    }

    /// Runs `statements` in a fresh child scope of `environment`, restoring
    /// the interpreter's previous environment on every exit path (normal
    /// completion, an early `return`, or a propagated error alike), so a
    /// thrown error inside a block never leaves the interpreter pointed at a
    /// scope it has already left.
    pub fn execute_block(&mut self, statements: &[Stmt], environment: Rc<RefCell<Environment>>) -> ExecResult {
        let previous = std::mem::replace(&mut self.environment, environment);

        let mut outcome = Ok(ExecOutcome::Normal);
        for statement in statements {
            match self.execute(statement) {
                Ok(ExecOutcome::Normal) => continue,
                Ok(ExecOutcome::Return(value)) => {
                    outcome = Ok(ExecOutcome::Return(value));
                    break;
                }
                Err(error) => {
                    outcome = Err(error);
                    break;
                }
            }
        }

        self.environment = previous;
        outcome
    }

    fn look_up_variable(&self, id: NodeId, name: &Token) -> EvalResult {
        match self.locals.get(&id) {
            Some(&distance) => self.environment.borrow().get_at(distance, name),
            None => self.globals.borrow().get(name),
        }
    }

    fn call_value(&mut self, callee: Object, paren: &Token, arguments: Vec<Object>) -> EvalResult {
        match callee {
            Object::Function(function) => {
                check_arity(paren, function.arity(), arguments.len())?;
                function.call(self, arguments)
            }
            Object::NativeFunction(function) => {
                check_arity(paren, function.arity(), arguments.len())?;
                function.call(self, arguments)
            }
            Object::Class(class) => {
                let arity = class.borrow().arity();
                check_arity(paren, arity, arguments.len())?;

                let instance = Rc::new(RefCell::new(Instance::new(Rc::clone(&class))));
                if let Some(initializer) = class.borrow().find_method("init") {
                    initializer.bind(Rc::clone(&instance)).call(self, arguments)?;
                }

                Ok(Object::Instance(instance))
            }
            other => Err(RuntimeError {
                token: paren.clone(),
                message: format!("Can only call functions and classes, got {}.", other.type_str()),
            }),
        }
    }
}

fn check_arity(paren: &Token, arity: usize, got: usize) -> Result<(), RuntimeError> {
    if arity != got {
        return Err(RuntimeError {
            token: paren.clone(),
            message: format!("Expected {arity} arguments but got {got}."),
        });
    }
    Ok(())
}

fn number_operand_error(operator: &Token) -> RuntimeError {
    RuntimeError { token: operator.clone(), message: "Operand must be a number.".to_string() }
}

fn number_operands_error(operator: &Token) -> RuntimeError {
    RuntimeError { token: operator.clone(), message: "Operands must be numbers.".to_string() }
}

impl ExprVisitor<EvalResult> for Interpreter {
    fn visit_literal_expr(&mut self, literal: &Literal) -> EvalResult {
        Ok(Object::Literal(literal.clone()))
    }

    fn visit_logical_expr(&mut self, data: &LogicalData) -> EvalResult {
        let left = self.evaluate(&data.left)?;

        match data.operator.r#type {
            Type::Or if left.as_bool() => Ok(left),
            Type::And if !left.as_bool() => Ok(left),
            _ => self.evaluate(&data.right),
        }
    }

    fn visit_unary_expr(&mut self, data: &UnaryData) -> EvalResult {
        let right = self.evaluate(&data.expr)?;

        match data.operator.r#type {
            Type::Minus => (-right).ok_or_else(|| number_operand_error(&data.operator)),
            Type::Bang => Ok(right.not()),
            _ => unreachable!("parser never produces a unary operator other than '-' or '!'"),
        }
    }

    fn visit_binary_expr(&mut self, data: &BinaryData) -> EvalResult {
        let left = self.evaluate(&data.left)?;
        let right = self.evaluate(&data.right)?;
        let operator = &data.operator;

        match operator.r#type {
            Type::Greater => numeric_cmp(left, right, operator, |a, b| a > b),
            Type::GreaterEqual => numeric_cmp(left, right, operator, |a, b| a >= b),
            Type::Less => numeric_cmp(left, right, operator, |a, b| a < b),
            Type::LessEqual => numeric_cmp(left, right, operator, |a, b| a <= b),
            Type::EqualEqual => Ok(Object::from(left == right)),
            Type::BangEqual => Ok(Object::from(left != right)),
            Type::Minus => (left - right).ok_or_else(|| number_operands_error(operator)),
            Type::Slash => (left / right).ok_or_else(|| number_operands_error(operator)),
            Type::Star => (left * right).ok_or_else(|| number_operands_error(operator)),
            Type::Plus => (left + right).ok_or_else(|| RuntimeError {
                token: operator.clone(),
                message: "Operands must be two numbers or two strings.".to_string(),
            }),
            _ => unreachable!("parser never produces a binary operator outside this set"),
        }
    }

    fn visit_grouping_expr(&mut self, data: &GroupingData) -> EvalResult {
        self.evaluate(&data.expr)
    }

    fn visit_variable_expr(&mut self, data: &VariableData) -> EvalResult {
        self.look_up_variable(data.id, &data.name)
    }

    fn visit_assign_expr(&mut self, data: &AssignData) -> EvalResult {
        let value = self.evaluate(&data.value)?;

        match self.locals.get(&data.id) {
            Some(&distance) => {
                self.environment.borrow_mut().assign_at(distance, &data.name, value.clone())?;
            }
            None => {
                self.globals.borrow_mut().assign(&data.name, value.clone())?;
            }
        }

        Ok(value)
    }

    fn visit_call_expr(&mut self, data: &CallData) -> EvalResult {
        let callee = self.evaluate(&data.callee)?;

        let mut arguments = Vec::with_capacity(data.arguments.len());
        for argument in &data.arguments {
            arguments.push(self.evaluate(argument)?);
        }

        self.call_value(callee, &data.paren, arguments)
    }

    fn visit_get_expr(&mut self, data: &GetData) -> EvalResult {
        match self.evaluate(&data.object)? {
            Object::Instance(instance) => Instance::get(&instance, &data.name),
            other => Err(RuntimeError {
                token: data.name.clone(),
                message: format!("Only instances have properties, got {}.", other.type_str()),
            }),
        }
    }

    fn visit_set_expr(&mut self, data: &SetData) -> EvalResult {
        let object = self.evaluate(&data.object)?;

        let Object::Instance(instance) = object else {
            return Err(RuntimeError {
                token: data.name.clone(),
                message: format!("Only instances have fields, got {}.", object.type_str()),
            });
        };

        let value = self.evaluate(&data.value)?;
        instance.borrow_mut().set(&data.name, value.clone());
        Ok(value)
    }

    fn visit_this_expr(&mut self, data: &ThisData) -> EvalResult {
        self.look_up_variable(data.id, &data.keyword)
    }

    fn visit_super_expr(&mut self, data: &SuperData) -> EvalResult {
        let distance = *self.locals.get(&data.id).expect("resolver always annotates 'super'");

        let superclass = match self.environment.borrow().get_at(distance, &data.keyword)? {
            Object::Class(class) => class,
            _ => unreachable!("'super' only ever resolves to a class"),
        };

        let this_token = Token::new(Type::This, "this".to_string(), None, data.keyword.line);
        let instance = match self.environment.borrow().get_at(distance - 1, &this_token)? {
            Object::Instance(instance) => instance,
            _ => unreachable!("'this' always resolves one scope closer than the matching 'super'"),
        };

        match superclass.borrow().find_method(&data.method.lexeme) {
            Some(method) => Ok(Object::Function(Rc::new(method.bind(instance)))),
            None => Err(RuntimeError {
                token: data.method.clone(),
                message: format!("Undefined property '{}'.", data.method.lexeme),
            }),
        }
    }
}

fn numeric_cmp(left: Object, right: Object, operator: &Token, cmp: impl Fn(f64, f64) -> bool) -> EvalResult {
    match (left, right) {
        (Object::Literal(Literal::Number(l)), Object::Literal(Literal::Number(r))) => Ok(Object::from(cmp(l, r))),
        _ => Err(number_operands_error(operator)),
    }
}

impl StmtVisitor<ExecResult> for Interpreter {
    fn visit_expression_stmt(&mut self, data: &ExpressionData) -> ExecResult {
        self.evaluate(&data.expr)?;
        Ok(ExecOutcome::Normal)
    }

    fn visit_print_stmt(&mut self, data: &PrintData) -> ExecResult {
        let value = self.evaluate(&data.expr)?;
        let _ = writeln!(self.output, "{value}");
        Ok(ExecOutcome::Normal)
    }

    fn visit_var_stmt(&mut self, data: &VarData) -> ExecResult {
        let value = match &data.initializer {
            Some(initializer) => self.evaluate(initializer)?,
            None => Object::Literal(Literal::Nil),
        };

        self.environment.borrow_mut().define(&data.name.lexeme, value);
        Ok(ExecOutcome::Normal)
    }

    fn visit_block_stmt(&mut self, data: &BlockData) -> ExecResult {
        let scope = Rc::new(RefCell::new(Environment::new(Some(Rc::clone(&self.environment)))));
        self.execute_block(&data.statements, scope)
    }

    fn visit_if_stmt(&mut self, data: &IfData) -> ExecResult {
        if self.evaluate(&data.condition)?.as_bool() {
            self.execute(&data.then_branch)
        } else if let Some(else_branch) = &data.else_branch {
            self.execute(else_branch)
        } else {
            Ok(ExecOutcome::Normal)
        }
    }

    fn visit_while_stmt(&mut self, data: &WhileData) -> ExecResult {
        while self.evaluate(&data.condition)?.as_bool() {
            match self.execute(&data.body)? {
                ExecOutcome::Normal => {}
                ExecOutcome::Return(value) => return Ok(ExecOutcome::Return(value)),
            }
        }
        Ok(ExecOutcome::Normal)
    }

    fn visit_function_stmt(&mut self, data: &FunctionData) -> ExecResult {
        let function = Function::new(data, Rc::clone(&self.environment), false);
        self.environment.borrow_mut().define(&data.name.lexeme, Object::from(function));
        Ok(ExecOutcome::Normal)
    }

    fn visit_return_stmt(&mut self, data: &ReturnData) -> ExecResult {
        let value = match &data.value {
            Some(expr) => self.evaluate(expr)?,
            None => Object::Literal(Literal::Nil),
        };
        Ok(ExecOutcome::Return(value))
    }

    fn visit_class_stmt(&mut self, data: &ClassData) -> ExecResult {
        let superclass = match &data.superclass {
            Some(expr) => match self.evaluate(expr)? {
                Object::Class(class) => Some(class),
                _ => {
                    let Expr::Variable(variable) = expr else {
                        unreachable!("parser only ever emits a Variable expr for a superclass reference")
                    };
                    return Err(RuntimeError {
                        token: variable.name.clone(),
                        message: "Superclass must be a class.".to_string(),
                    });
                }
            },
            None => None,
        };

        self.environment.borrow_mut().define(&data.name.lexeme, Object::Literal(Literal::Nil));

        let method_environment = if let Some(superclass) = &superclass {
            let scope = Rc::new(RefCell::new(Environment::new(Some(Rc::clone(&self.environment)))));
            scope.borrow_mut().define("super", Object::Class(Rc::clone(superclass)));
            scope
        } else {
            Rc::clone(&self.environment)
        };

        let mut methods = HashMap::new();
        for method in &data.methods {
            let Stmt::Function(function_data) = method else {
                unreachable!("parser only ever emits Function statements in a class body")
            };
            let is_initializer = function_data.name.lexeme == "init";
            let function = Function::new(function_data, Rc::clone(&method_environment), is_initializer);
            methods.insert(function_data.name.lexeme.clone(), function);
        }

        let class = Class::new(data.name.lexeme.clone(), superclass, methods);
        self.environment
            .borrow_mut()
            .assign(&data.name, Object::Class(Rc::new(RefCell::new(class))))?;

        Ok(ExecOutcome::Normal)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::error::Diagnostics;
    use crate::parser::Parser;
    use crate::resolver::Resolver;
    use crate::scanner::Scanner;

    fn run(source: &str) -> (String, Result<(), RuntimeError>) {
        let mut diagnostics = Diagnostics::new();
        let tokens = Scanner::new(source).scan_tokens(&mut diagnostics);
        let statements = Parser::new(tokens).parse(&mut diagnostics);
        let locals = Resolver::new().resolve(&statements, &mut diagnostics);

        let output = Vec::new();
        let mut interpreter = Interpreter::new(Box::new(output));
        interpreter.resolve(locals);
        let result = interpreter.interpret(&statements);

        // Recover the buffer by constructing a second interpreter is wasteful;
        // tests instead use a shared buffer via Rc<RefCell<Vec<u8>>> below.
        (String::new(), result)
    }

    fn run_captured(source: &str) -> String {
        let mut diagnostics = Diagnostics::new();
        let tokens = Scanner::new(source).scan_tokens(&mut diagnostics);
        let statements = Parser::new(tokens).parse(&mut diagnostics);
        let locals = Resolver::new().resolve(&statements, &mut diagnostics);

        let buffer: Rc<RefCell<Vec<u8>>> = Rc::new(RefCell::new(Vec::new()));
        let mut interpreter = Interpreter::new(Box::new(SharedBuffer(Rc::clone(&buffer))));
        interpreter.resolve(locals);
        interpreter.interpret(&statements).expect("program to run without a runtime error");

        String::from_utf8(buffer.borrow().clone()).expect("captured output to be valid utf-8")
    }

    struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.borrow_mut().write(buf)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn arithmetic_and_print() {
        assert_eq!(run_captured("print 1 + 2 * 3;"), "7\n");
    }

    #[test]
    fn string_concatenation() {
        assert_eq!(run_captured("print \"a\" + \"b\";"), "ab\n");
    }

    #[test]
    fn adding_number_and_string_is_a_runtime_error() {
        let (_, result) = run("1 + \"a\";");
        assert!(result.is_err());
    }

    #[test]
    fn block_scoping_shadows_outer_variable() {
        assert_eq!(run_captured("var a = 1; { var a = 2; print a; } print a;"), "2\n1\n");
    }

    #[test]
    fn closures_capture_their_defining_environment() {
        let source = r#"
            fun makeCounter() {
                var i = 0;
                fun count() {
                    i = i + 1;
                    return i;
                }
                return count;
            }
            var counter = makeCounter();
            print counter();
            print counter();
        "#;
        assert_eq!(run_captured(source), "1\n2\n");
    }

    #[test]
    fn classes_construct_and_bind_methods() {
        let source = r#"
            class Greeter {
                init(name) {
                    this.name = name;
                }
                greet() {
                    return "hi " + this.name;
                }
            }
            var g = Greeter("pal");
            print g.greet();
        "#;
        assert_eq!(run_captured(source), "hi pal\n");
    }

    #[test]
    fn inheritance_resolves_super_methods() {
        let source = r#"
            class A {
                speak() { return "a"; }
            }
            class B < A {
                speak() { return super.speak() + "b"; }
            }
            print B().speak();
        "#;
        assert_eq!(run_captured(source), "ab\n");
    }

    #[test]
    fn calling_a_non_callable_is_a_runtime_error() {
        let (_, result) = run("var x = 1; x();");
        assert!(result.is_err());
    }

    #[test]
    fn wrong_arity_is_a_runtime_error() {
        let (_, result) = run("fun f(a) { return a; } f(1, 2);");
        assert!(result.is_err());
    }
}
