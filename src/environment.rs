use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::error::RuntimeError;
use crate::object::Object;
use crate::token::Token;

/// One link in the lexical scope chain. Each block, function
/// call, and class body pushes a new `Environment` whose `enclosing` field
/// points at the scope it was opened in; closures keep that chain alive by
/// holding an `Rc` to the environment they were defined in.
#[derive(Debug, Clone)]
pub struct Environment {
    pub enclosing: Option<Rc<RefCell<Environment>>>,
    variables: HashMap<String, Object>,
}

impl Environment {
    pub fn new(enclosing: Option<Rc<RefCell<Environment>>>) -> Self {
        Environment { enclosing, variables: HashMap::new() }
    }

    /// Introduces `name` in this scope, shadowing any binding of the same
    /// name in an enclosing scope. Redeclaring an existing local silently
    /// replaces it, matching the resolver's own redeclaration check.
    pub fn define(&mut self, name: &str, value: Object) {
        self.variables.insert(name.to_string(), value);
    }

    /// Walks `distance` links up the enclosing chain. `distance` always
    /// comes from the resolver, which only ever reports a distance it
    /// verified exists, so a missing link indicates a resolver/interpreter
    /// mismatch rather than a user-facing error; `name` is only used to
    /// shape that error message.
    fn ancestor(&self, distance: usize, name: &Token) -> Result<Rc<RefCell<Environment>>, RuntimeError> {
        let bug = || RuntimeError {
            token: name.clone(),
            message: "Internal error: resolved variable distance exceeds scope depth.".to_string(),
        };

        let mut environment = self.enclosing.clone().ok_or_else(bug)?;

        for _ in 1..distance {
            let parent = environment.borrow().enclosing.clone();
            environment = parent.ok_or_else(bug)?;
        }

        Ok(environment)
    }

    pub fn assign(&mut self, name: &Token, value: Object) -> Result<(), RuntimeError> {
        if self.variables.contains_key(&name.lexeme) {
            self.variables.insert(name.lexeme.clone(), value);
            return Ok(());
        }

        if let Some(enclosing) = &self.enclosing {
            return enclosing.borrow_mut().assign(name, value);
        }

        Err(RuntimeError { token: name.clone(), message: format!("Undefined variable '{}'.", name.lexeme) })
    }

    pub fn assign_at(&mut self, distance: usize, name: &Token, value: Object) -> Result<(), RuntimeError> {
        if distance == 0 {
            self.variables.insert(name.lexeme.clone(), value);
            return Ok(());
        }

        self.ancestor(distance, name)?.borrow_mut().variables.insert(name.lexeme.clone(), value);
        Ok(())
    }

    pub fn get(&self, name: &Token) -> Result<Object, RuntimeError> {
        if let Some(value) = self.variables.get(&name.lexeme) {
            return Ok(value.clone());
        }

        if let Some(enclosing) = &self.enclosing {
            return enclosing.borrow().get(name);
        }

        Err(RuntimeError { token: name.clone(), message: format!("Undefined variable '{}'.", name.lexeme) })
    }

    pub fn get_at(&self, distance: usize, name: &Token) -> Result<Object, RuntimeError> {
        if distance == 0 {
            return self
                .variables
                .get(&name.lexeme)
                .cloned()
                .ok_or_else(|| RuntimeError {
                    token: name.clone(),
                    message: format!("Undefined variable '{}'.", name.lexeme),
                });
        }

        let environment = self.ancestor(distance, name)?;
        let value = environment
            .borrow()
            .variables
            .get(&name.lexeme)
            .cloned()
            .ok_or_else(|| RuntimeError {
                token: name.clone(),
                message: format!("Undefined variable '{}'.", name.lexeme),
            });
        value
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new(None)
    }
}
