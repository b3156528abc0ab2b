use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::environment::Environment;
use crate::error::{LoxError, Result};
use crate::interpreter::{Interpreter, Interrupt};
use crate::stmt::FunctionDecl;

/// A runtime value.  Reference-typed variants share ownership with every
/// holder; equality on them is identity.
#[derive(Clone)]
pub enum Value {
    Nil,
    Bool(bool),
    Number(f64),
    String(String),
    Native(Rc<NativeFn>),
    Function(Rc<LoxFunction>),
    Class(Rc<LoxClass>),
    Instance(Rc<RefCell<LoxInstance>>),
}

impl Value {
    /// nil and false are falsey; everything else is truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Nil => false,

            Value::Bool(b) => *b,

            _ => true,
        }
    }

    /// Structural equality for value types, identity for reference types.
    pub fn equals(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,

            (Value::Bool(a), Value::Bool(b)) => a == b,

            (Value::Number(a), Value::Number(b)) => a == b,

            (Value::String(a), Value::String(b)) => a == b,

            (Value::Native(a), Value::Native(b)) => Rc::ptr_eq(a, b),

            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),

            (Value::Class(a), Value::Class(b)) => Rc::ptr_eq(a, b),

            (Value::Instance(a), Value::Instance(b)) => Rc::ptr_eq(a, b),

            _ => false,
        }
    }

    /// The callable capability of this value, if it has one.
    pub fn as_callable(&self) -> Option<&dyn Callable> {
        match self {
            Value::Native(f) => Some(f.as_ref()),

            Value::Function(f) => Some(f.as_ref()),

            Value::Class(c) => Some(c),

            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "nil"),

            Value::Bool(b) => write!(f, "{}", b),

            Value::Number(n) => {
                if n.fract() == 0.0 {
                    write!(f, "{:.0}", n)
                } else {
                    write!(f, "{}", n)
                }
            }

            Value::String(s) => write!(f, "{}", s),

            Value::Native(func) => write!(f, "<native fn {}>", func.name),

            Value::Function(func) => match &func.decl.name {
                Some(name) => write!(f, "<fn {}>", name.lexeme),
                None => write!(f, "<fn>"),
            },

            Value::Class(class) => write!(f, "{}", class.name),

            Value::Instance(instance) => write!(f, "{} instance", instance.borrow().class.name),
        }
    }
}

// Instances and closures can form reference cycles; a derived Debug would
// chase them forever, so Debug reuses the flat Display form.
impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "{:?}", s),
            other => write!(f, "{}", other),
        }
    }
}

/// The calling convention shared by functions, classes and natives.
///
/// `line` is the call-site line, used for diagnostics raised inside the
/// call machinery itself (arity plumbing, native failures).
pub trait Callable {
    fn arity(&self) -> usize;

    fn call(
        &self,
        interpreter: &mut Interpreter,
        arguments: Vec<Value>,
        line: usize,
    ) -> Result<Value>;
}

/// Built-in function backed by a host fn pointer.
pub struct NativeFn {
    pub name: &'static str,
    pub arity: usize,
    pub func: fn(&[Value]) -> std::result::Result<Value, String>,
}

impl Callable for NativeFn {
    fn arity(&self) -> usize {
        self.arity
    }

    fn call(
        &self,
        _interpreter: &mut Interpreter,
        arguments: Vec<Value>,
        line: usize,
    ) -> Result<Value> {
        (self.func)(&arguments).map_err(|msg| LoxError::runtime(line, msg))
    }
}

/// A user function: its declaration plus the environment chain captured at
/// definition time.
#[derive(Clone)]
pub struct LoxFunction {
    decl: Rc<FunctionDecl>,
    closure: Rc<RefCell<Environment>>,
    is_initializer: bool,
}

impl LoxFunction {
    pub fn new(
        decl: Rc<FunctionDecl>,
        closure: Rc<RefCell<Environment>>,
        is_initializer: bool,
    ) -> Self {
        LoxFunction {
            decl,
            closure,
            is_initializer,
        }
    }

    /// A copy of this function whose scope chain starts with a frame that
    /// binds `this` to the given instance.
    pub fn bind(&self, instance: Rc<RefCell<LoxInstance>>) -> LoxFunction {
        let mut frame = Environment::with_enclosing(Rc::clone(&self.closure));
        frame.define("this", Value::Instance(instance));

        LoxFunction {
            decl: Rc::clone(&self.decl),
            closure: Rc::new(RefCell::new(frame)),
            is_initializer: self.is_initializer,
        }
    }
}

impl Callable for LoxFunction {
    fn arity(&self) -> usize {
        self.decl.params.len()
    }

    fn call(
        &self,
        interpreter: &mut Interpreter,
        arguments: Vec<Value>,
        line: usize,
    ) -> Result<Value> {
        // One frame for parameters, one for the body, mirroring the two
        // scopes the resolver opened for this function.
        let mut params_frame = Environment::with_enclosing(Rc::clone(&self.closure));
        for (param, argument) in self.decl.params.iter().zip(arguments) {
            params_frame.define(&param.lexeme, argument);
        }

        let body_frame = Environment::with_enclosing(Rc::new(RefCell::new(params_frame)));

        match interpreter.execute_block(&self.decl.body, Rc::new(RefCell::new(body_frame))) {
            Ok(()) => {
                if self.is_initializer {
                    Environment::get_at(&self.closure, 0, "this", line)
                } else {
                    Ok(Value::Nil)
                }
            }

            // A return statement unwinds to here and no further.
            Err(Interrupt::Return(value)) => {
                if self.is_initializer {
                    Environment::get_at(&self.closure, 0, "this", line)
                } else {
                    Ok(value)
                }
            }

            Err(Interrupt::Error(e)) => Err(e),
        }
    }
}

/// A class: named method table plus an optional superclass.
pub struct LoxClass {
    pub name: String,
    superclass: Option<Rc<LoxClass>>,
    methods: HashMap<String, LoxFunction>,
}

impl LoxClass {
    pub fn new(
        name: String,
        superclass: Option<Rc<LoxClass>>,
        methods: HashMap<String, LoxFunction>,
    ) -> Self {
        LoxClass {
            name,
            superclass,
            methods,
        }
    }

    /// Look a method up on this class, then up the superclass chain.
    pub fn find_method(&self, name: &str) -> Option<LoxFunction> {
        if let Some(method) = self.methods.get(name) {
            return Some(method.clone());
        }

        self.superclass
            .as_ref()
            .and_then(|superclass| superclass.find_method(name))
    }
}

impl Callable for Rc<LoxClass> {
    /// Constructing a class calls `init` when it has one.
    fn arity(&self) -> usize {
        self.find_method("init").map_or(0, |init| init.arity())
    }

    fn call(
        &self,
        interpreter: &mut Interpreter,
        arguments: Vec<Value>,
        line: usize,
    ) -> Result<Value> {
        let instance = Rc::new(RefCell::new(LoxInstance::new(Rc::clone(self))));

        if let Some(init) = self.find_method("init") {
            init.bind(Rc::clone(&instance))
                .call(interpreter, arguments, line)?;
        }

        Ok(Value::Instance(instance))
    }
}

/// Instance state: the class for method lookup plus a mutable field map.
pub struct LoxInstance {
    class: Rc<LoxClass>,
    fields: HashMap<String, Value>,
}

impl LoxInstance {
    pub fn new(class: Rc<LoxClass>) -> Self {
        LoxInstance {
            class,
            fields: HashMap::new(),
        }
    }

    /// Property read: fields shadow methods; methods come back bound to the
    /// instance.
    pub fn get(instance: &Rc<RefCell<LoxInstance>>, name: &str, line: usize) -> Result<Value> {
        if let Some(value) = instance.borrow().fields.get(name) {
            return Ok(value.clone());
        }

        let method = instance.borrow().class.find_method(name);
        match method {
            Some(method) => Ok(Value::Function(Rc::new(method.bind(Rc::clone(instance))))),

            None => Err(LoxError::runtime(
                line,
                format!("Undefined property '{}'", name),
            )),
        }
    }

    /// Unconditional field write.
    pub fn set(instance: &Rc<RefCell<LoxInstance>>, name: &str, value: Value) {
        instance.borrow_mut().fields.insert(name.to_string(), value);
    }
}
