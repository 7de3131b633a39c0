use std::cell::RefCell;
use std::fmt::{self, Debug, Display};
use std::rc::Rc;

use crate::class::Instance;
use crate::environment::Environment;
use crate::error::RuntimeError;
use crate::interpreter::{ExecOutcome, Interpreter};
use crate::object::{Callable, Object};
use crate::stmt::{FunctionData, Stmt};
use crate::token::Token;

/// A user-defined function or method. Captures the
/// environment it closed over at definition time, so nested functions and
/// methods see the bindings visible where they were declared rather than
/// where they are called.
#[derive(Debug, Clone)]
pub struct Function {
    pub name: Token,
    pub params: Vec<Token>,
    pub body: Rc<Vec<Stmt>>,
    pub closure: Rc<RefCell<Environment>>,
    pub is_initializer: bool,
}

impl Function {
    pub fn new(data: &FunctionData, closure: Rc<RefCell<Environment>>, is_initializer: bool) -> Self {
        Function {
            name: data.name.clone(),
            params: data.params.clone(),
            body: Rc::new(data.body.clone()),
            closure,
            is_initializer,
        }
    }

    /// Produces a copy of this function whose closure is a fresh scope
    /// binding `this` to `instance`. Called once per
    /// instance, when the method is looked up via `Instance::get`.
    pub fn bind(&self, instance: Rc<RefCell<Instance>>) -> Function {
        let environment = Rc::new(RefCell::new(Environment::new(Some(Rc::clone(&self.closure)))));
        environment.borrow_mut().define("this", Object::Instance(instance));

        Function {
            name: self.name.clone(),
            params: self.params.clone(),
            body: Rc::clone(&self.body),
            closure: environment,
            is_initializer: self.is_initializer,
        }
    }
}

impl Callable for Function {
    fn call(&self, interpreter: &mut Interpreter, arguments: Vec<Object>) -> Result<Object, RuntimeError> {
        let environment = Rc::new(RefCell::new(Environment::new(Some(Rc::clone(&self.closure)))));

        for (param, argument) in self.params.iter().zip(arguments) {
            environment.borrow_mut().define(&param.lexeme, argument);
        }

        let outcome = interpreter.execute_block(&self.body, environment)?;

        // `init()` always yields the constructed instance, even with a bare
        // `return;`: "Can't return a value from an
        // initializer" is enforced earlier, at resolve time. `bind()` put
        // `this` directly in this function's closure.
        if self.is_initializer {
            let this_token = Token::new(crate::token::Type::This, "this".to_string(), None, self.name.line);
            return self.closure.borrow().get(&this_token);
        }

        match outcome {
            ExecOutcome::Return(value) => Ok(value),
            ExecOutcome::Normal => Ok(Object::Literal(crate::literal::Literal::Nil)),
        }
    }

    fn arity(&self) -> usize {
        self.params.len()
    }
}

impl PartialEq for Function {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.body, &other.body) && Rc::ptr_eq(&self.closure, &other.closure)
    }
}

impl Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<fn {}>", self.name.lexeme)
    }
}

/// The wall-clock source behind the native `clock` function. A trait rather
/// than a direct `SystemTime` call so the interpreter's collaborators stay
/// injectable instead of reaching for process-global time.
pub trait Clock: Debug {
    /// Seconds since the Unix epoch, with at least millisecond resolution.
    fn now(&self) -> f64;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> f64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs_f64())
            .unwrap_or(0.0)
    }
}

#[derive(Clone)]
pub struct NativeFunction {
    pub name: &'static str,
    pub arity: usize,
    pub function: fn(&mut Interpreter, Vec<Object>) -> Result<Object, RuntimeError>,
}

impl NativeFunction {
    /// The complete native standard library, limited to `clock`.
    pub fn globals() -> Vec<NativeFunction> {
        vec![NativeFunction {
            name: "clock",
            arity: 0,
            function: |interpreter, _arguments| Ok(Object::from(interpreter.clock.now())),
        }]
    }
}

impl Callable for NativeFunction {
    fn call(&self, interpreter: &mut Interpreter, arguments: Vec<Object>) -> Result<Object, RuntimeError> {
        (self.function)(interpreter, arguments)
    }

    fn arity(&self) -> usize {
        self.arity
    }
}

impl PartialEq for NativeFunction {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Display for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<native fn {}>", self.name)
    }
}

impl Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<native fn {}>", self.name)
    }
}
