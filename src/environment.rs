use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::error::{LoxError, Result};
use crate::value::Value;

/// A single lexical binding frame.  Frames chain outward through `enclosing`
/// up to the globals.  Ownership is shared: a closure keeps its defining
/// chain alive after the block that created it has exited, and writes
/// through any holder are visible to all of them.
#[derive(Default)]
pub struct Environment {
    values: HashMap<String, Value>,
    enclosing: Option<Rc<RefCell<Environment>>>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_enclosing(enclosing: Rc<RefCell<Environment>>) -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: Some(enclosing),
        }
    }

    /// Insert or overwrite in this frame.
    pub fn define(&mut self, name: &str, value: Value) {
        self.values.insert(name.to_string(), value);
    }

    /// Read `name`, searching outward along the chain.
    pub fn get(&self, name: &str, line: usize) -> Result<Value> {
        if let Some(value) = self.values.get(name) {
            Ok(value.clone())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow().get(name, line)
        } else {
            Err(undefined(name, line))
        }
    }

    /// Overwrite `name` where it is first found along the chain.
    pub fn assign(&mut self, name: &str, value: Value, line: usize) -> Result<()> {
        if self.values.contains_key(name) {
            self.values.insert(name.to_string(), value);
            Ok(())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow_mut().assign(name, value, line)
        } else {
            Err(undefined(name, line))
        }
    }

    /// Read `name` from the frame exactly `hops` links out, with no chain
    /// search.  Used for resolver-annotated locals.
    pub fn get_at(
        env: &Rc<RefCell<Environment>>,
        hops: usize,
        name: &str,
        line: usize,
    ) -> Result<Value> {
        match Self::ancestor(env, hops) {
            Some(frame) => {
                let frame = frame.borrow();
                frame
                    .values
                    .get(name)
                    .cloned()
                    .ok_or_else(|| undefined(name, line))
            }

            None => Err(undefined(name, line)),
        }
    }

    /// Overwrite `name` in the frame exactly `hops` links out.
    pub fn assign_at(
        env: &Rc<RefCell<Environment>>,
        hops: usize,
        name: &str,
        value: Value,
        line: usize,
    ) -> Result<()> {
        match Self::ancestor(env, hops) {
            Some(frame) => {
                frame.borrow_mut().values.insert(name.to_string(), value);
                Ok(())
            }

            None => Err(undefined(name, line)),
        }
    }

    fn ancestor(env: &Rc<RefCell<Environment>>, hops: usize) -> Option<Rc<RefCell<Environment>>> {
        let mut frame = Rc::clone(env);

        for _ in 0..hops {
            let next = frame.borrow().enclosing.clone()?;
            frame = next;
        }

        Some(frame)
    }
}

fn undefined(name: &str, line: usize) -> LoxError {
    LoxError::runtime(line, format!("Undefined variable '{}'", name))
}
