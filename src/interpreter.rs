//! Tree-walking evaluator.
//!
//! Statements execute for their side effects; expressions evaluate to a
//! [`Value`].  Both use [`Interrupt`] as their error channel so that `?`
//! propagates runtime errors and `return` signals alike, while keeping the
//! two strictly apart: a `return` unwinds only as far as the invoking call
//! and is never reported as a diagnostic.

use std::cell::RefCell;
use std::collections::HashMap;
use std::io::{self, Write};
use std::mem;
use std::rc::Rc;
use std::time::{SystemTime, UNIX_EPOCH};

use log::debug;

use crate::environment::Environment;
use crate::error::{LoxError, Result};
use crate::expr::{Expr, ExprId};
use crate::stmt::{FunctionDecl, Stmt};
use crate::token::{Token, TokenType};
use crate::value::{LoxClass, LoxFunction, LoxInstance, NativeFn, Value};

/// Non-local control flow raised during execution.
pub enum Interrupt {
    /// `return` unwinding toward the nearest enclosing call.
    Return(Value),

    /// Runtime error aborting the program.
    Error(LoxError),
}

impl From<LoxError> for Interrupt {
    fn from(e: LoxError) -> Self {
        Interrupt::Error(e)
    }
}

/// Execution result: statement and expression evaluation fail with an
/// [`Interrupt`], not a bare error, so `return` can ride the same channel.
pub type Exec<T> = std::result::Result<T, Interrupt>;

pub struct Interpreter {
    globals: Rc<RefCell<Environment>>,
    environment: Rc<RefCell<Environment>>,
    locals: HashMap<ExprId, usize>,
    out: Rc<RefCell<dyn Write>>,
}

impl Interpreter {
    pub fn new() -> Self {
        Self::with_output(Rc::new(RefCell::new(io::stdout())))
    }

    /// An interpreter whose `print` output goes to the given sink.
    pub fn with_output(out: Rc<RefCell<dyn Write>>) -> Self {
        let globals = Rc::new(RefCell::new(Environment::new()));

        globals.borrow_mut().define(
            "clock",
            Value::Native(Rc::new(NativeFn {
                name: "clock",
                arity: 0,
                func: clock_native,
            })),
        );

        Interpreter {
            environment: Rc::clone(&globals),
            globals,
            locals: HashMap::new(),
            out,
        }
    }

    /// Record a resolved binding distance for an expression.  Called by the
    /// resolver; global references leave no entry.
    pub fn note_local(&mut self, id: ExprId, hops: usize) {
        self.locals.insert(id, hops);
    }

    /// Execute a resolved program.  The first runtime error aborts and is
    /// returned.
    pub fn interpret(&mut self, statements: &[Stmt]) -> Result<()> {
        for stmt in statements {
            match self.execute(stmt) {
                Ok(()) => {}

                Err(Interrupt::Error(e)) => return Err(e),

                Err(Interrupt::Return(_)) => {
                    // The resolver rejects top-level returns; nothing to do
                    // but stop.
                    debug!("return signal escaped to top level");
                    return Ok(());
                }
            }
        }

        Ok(())
    }

    fn execute(&mut self, stmt: &Stmt) -> Exec<()> {
        match stmt {
            Stmt::Expression(expr) => {
                self.evaluate(expr)?;
                Ok(())
            }

            Stmt::Print(expr) => {
                let value: Value = self.evaluate(expr)?;
                writeln!(self.out.borrow_mut(), "{}", value).map_err(LoxError::from)?;
                Ok(())
            }

            Stmt::Var { name, initializer } => {
                let value: Value = match initializer {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };

                self.environment.borrow_mut().define(&name.lexeme, value);
                Ok(())
            }

            Stmt::Block(statements) => {
                let frame = Environment::with_enclosing(Rc::clone(&self.environment));
                self.execute_block(statements, Rc::new(RefCell::new(frame)))
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    self.execute(then_branch)
                } else if let Some(else_branch) = else_branch {
                    self.execute(else_branch)
                } else {
                    Ok(())
                }
            }

            Stmt::While { condition, body } => {
                while self.evaluate(condition)?.is_truthy() {
                    self.execute(body)?;
                }
                Ok(())
            }

            Stmt::Function(decl) => {
                let function =
                    LoxFunction::new(Rc::clone(decl), Rc::clone(&self.environment), false);

                if let Some(name) = &decl.name {
                    self.environment
                        .borrow_mut()
                        .define(&name.lexeme, Value::Function(Rc::new(function)));
                }
                Ok(())
            }

            Stmt::Return { value, .. } => {
                let value: Value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };

                Err(Interrupt::Return(value))
            }

            Stmt::Class {
                name,
                superclass,
                methods,
            } => self.execute_class(name, superclass.as_ref(), methods),
        }
    }

    /// Run `statements` inside `frame`, restoring the previous environment
    /// on every exit path, including return signals and runtime errors.
    pub fn execute_block(
        &mut self,
        statements: &[Stmt],
        frame: Rc<RefCell<Environment>>,
    ) -> Exec<()> {
        let previous: Rc<RefCell<Environment>> = mem::replace(&mut self.environment, frame);

        let mut result = Ok(());
        for stmt in statements {
            result = self.execute(stmt);
            if result.is_err() {
                break;
            }
        }

        self.environment = previous;
        result
    }

    fn execute_class(
        &mut self,
        name: &Token,
        superclass: Option<&Expr>,
        methods: &[Rc<FunctionDecl>],
    ) -> Exec<()> {
        let superclass_value: Option<Rc<LoxClass>> = match superclass {
            Some(expr) => match self.evaluate(expr)? {
                Value::Class(class) => Some(class),

                _ => {
                    let line = superclass_line(expr, name);
                    return Err(LoxError::runtime(line, "Superclass must be a class").into());
                }
            },

            None => None,
        };

        // The class name is visible (as nil) while its methods are built, so
        // they can close over it.
        self.environment
            .borrow_mut()
            .define(&name.lexeme, Value::Nil);

        // Methods of a subclass close over an extra frame holding `super`.
        let method_closure: Rc<RefCell<Environment>> = match &superclass_value {
            Some(class) => {
                let mut frame = Environment::with_enclosing(Rc::clone(&self.environment));
                frame.define("super", Value::Class(Rc::clone(class)));
                Rc::new(RefCell::new(frame))
            }

            None => Rc::clone(&self.environment),
        };

        let mut method_map: HashMap<String, LoxFunction> = HashMap::new();
        for decl in methods {
            if let Some(method_name) = &decl.name {
                let is_initializer = method_name.lexeme == "init";
                let function =
                    LoxFunction::new(Rc::clone(decl), Rc::clone(&method_closure), is_initializer);
                method_map.insert(method_name.lexeme.clone(), function);
            }
        }

        let class = LoxClass::new(name.lexeme.clone(), superclass_value, method_map);

        self.environment
            .borrow_mut()
            .assign(&name.lexeme, Value::Class(Rc::new(class)), name.line)?;

        Ok(())
    }

    pub fn evaluate(&mut self, expr: &Expr) -> Exec<Value> {
        match expr {
            Expr::Literal(token) => Ok(literal_value(token)?),

            Expr::Grouping(inner) => self.evaluate(inner),

            Expr::Unary { op, right } => {
                let value: Value = self.evaluate(right)?;

                match op.token_type {
                    TokenType::MINUS => match value {
                        Value::Number(n) => Ok(Value::Number(-n)),

                        _ => Err(LoxError::runtime(op.line, "Operand must be a number").into()),
                    },

                    TokenType::BANG => Ok(Value::Bool(!value.is_truthy())),

                    _ => Err(LoxError::runtime(op.line, "Invalid unary operator").into()),
                }
            }

            Expr::Binary { left, op, right } => {
                let left_val: Value = self.evaluate(left)?;
                let right_val: Value = self.evaluate(right)?;

                Ok(binary_op(left_val, op, right_val)?)
            }

            Expr::Logical { left, op, right } => {
                let left_val: Value = self.evaluate(left)?;

                // `or` keeps a truthy left operand, `and` a falsey one; the
                // operand itself is the result, not a coerced boolean.
                let short_circuit = match op.token_type {
                    TokenType::OR => left_val.is_truthy(),
                    _ => !left_val.is_truthy(),
                };

                if short_circuit {
                    Ok(left_val)
                } else {
                    self.evaluate(right)
                }
            }

            Expr::Variable { id, name } => Ok(self.look_up(*id, name)?),

            Expr::Assign { id, name, value } => {
                let value: Value = self.evaluate(value)?;

                match self.locals.get(id) {
                    Some(&hops) => Environment::assign_at(
                        &self.environment,
                        hops,
                        &name.lexeme,
                        value.clone(),
                        name.line,
                    )?,

                    None => self
                        .globals
                        .borrow_mut()
                        .assign(&name.lexeme, value.clone(), name.line)?,
                }

                Ok(value)
            }

            Expr::Call {
                callee,
                paren,
                arguments,
            } => {
                let callee_val: Value = self.evaluate(callee)?;

                let mut args: Vec<Value> = Vec::with_capacity(arguments.len());
                for argument in arguments {
                    args.push(self.evaluate(argument)?);
                }

                let callable = callee_val.as_callable().ok_or_else(|| {
                    LoxError::runtime(paren.line, "Can only call functions and classes")
                })?;

                if args.len() != callable.arity() {
                    return Err(LoxError::runtime(
                        paren.line,
                        format!(
                            "Expected {} arguments but got {}",
                            callable.arity(),
                            args.len()
                        ),
                    )
                    .into());
                }

                Ok(callable.call(self, args, paren.line)?)
            }

            Expr::Get { object, name } => match self.evaluate(object)? {
                Value::Instance(instance) => {
                    Ok(LoxInstance::get(&instance, &name.lexeme, name.line)?)
                }

                _ => Err(LoxError::runtime(name.line, "Only instances have properties").into()),
            },

            Expr::Set {
                object,
                name,
                value,
            } => match self.evaluate(object)? {
                Value::Instance(instance) => {
                    let value: Value = self.evaluate(value)?;
                    LoxInstance::set(&instance, &name.lexeme, value.clone());
                    Ok(value)
                }

                _ => Err(LoxError::runtime(name.line, "Only instances have fields").into()),
            },

            Expr::This { id, keyword } => Ok(self.look_up(*id, keyword)?),

            Expr::Super { id, keyword, method } => {
                let hops = match self.locals.get(id) {
                    Some(&hops) => hops,

                    None => {
                        return Err(LoxError::runtime(
                            keyword.line,
                            "Cannot use 'super' outside of a class",
                        )
                        .into())
                    }
                };

                let superclass =
                    match Environment::get_at(&self.environment, hops, "super", keyword.line)? {
                        Value::Class(class) => class,

                        _ => {
                            return Err(LoxError::runtime(
                                keyword.line,
                                "Superclass must be a class",
                            )
                            .into())
                        }
                    };

                // `this` lives one frame inside the one holding `super`.
                let object = match Environment::get_at(
                    &self.environment,
                    hops.saturating_sub(1),
                    "this",
                    keyword.line,
                )? {
                    Value::Instance(instance) => instance,

                    _ => {
                        return Err(LoxError::runtime(
                            keyword.line,
                            "Cannot use 'super' outside of a class",
                        )
                        .into())
                    }
                };

                match superclass.find_method(&method.lexeme) {
                    Some(found) => Ok(Value::Function(Rc::new(found.bind(object)))),

                    None => Err(LoxError::runtime(
                        method.line,
                        format!("Undefined property '{}'", method.lexeme),
                    )
                    .into()),
                }
            }

            Expr::Function(decl) => {
                let function =
                    LoxFunction::new(Rc::clone(decl), Rc::clone(&self.environment), false);
                Ok(Value::Function(Rc::new(function)))
            }
        }
    }

    fn look_up(&self, id: ExprId, name: &Token) -> Result<Value> {
        match self.locals.get(&id) {
            Some(&hops) => Environment::get_at(&self.environment, hops, &name.lexeme, name.line),

            None => self.globals.borrow().get(&name.lexeme, name.line),
        }
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

fn literal_value(token: &Token) -> Result<Value> {
    match &token.token_type {
        TokenType::NUMBER(n) => Ok(Value::Number(*n)),

        TokenType::STRING(s) => Ok(Value::String(s.clone())),

        TokenType::TRUE => Ok(Value::Bool(true)),

        TokenType::FALSE => Ok(Value::Bool(false)),

        TokenType::NIL => Ok(Value::Nil),

        _ => Err(LoxError::runtime(token.line, "Invalid literal")),
    }
}

fn binary_op(left: Value, op: &Token, right: Value) -> Result<Value> {
    match op.token_type {
        TokenType::PLUS => match (left, right) {
            (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),

            (Value::String(a), Value::String(b)) => Ok(Value::String(a + &b)),

            // String/number concatenation stringifies the number.
            (Value::String(a), b @ Value::Number(_)) => Ok(Value::String(format!("{}{}", a, b))),

            (a @ Value::Number(_), Value::String(b)) => Ok(Value::String(format!("{}{}", a, b))),

            _ => Err(LoxError::runtime(
                op.line,
                "Operands must be two numbers or two strings",
            )),
        },

        TokenType::MINUS => numbers(left, right, op, |a, b| Value::Number(a - b)),

        TokenType::STAR => numbers(left, right, op, |a, b| Value::Number(a * b)),

        TokenType::SLASH => match (left, right) {
            (Value::Number(_), Value::Number(b)) if b == 0.0 => {
                Err(LoxError::runtime(op.line, "Value cannot be zero"))
            }

            (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a / b)),

            _ => Err(LoxError::runtime(op.line, "Operands must be numbers")),
        },

        TokenType::GREATER => numbers(left, right, op, |a, b| Value::Bool(a > b)),

        TokenType::GREATER_EQUAL => numbers(left, right, op, |a, b| Value::Bool(a >= b)),

        TokenType::LESS => numbers(left, right, op, |a, b| Value::Bool(a < b)),

        TokenType::LESS_EQUAL => numbers(left, right, op, |a, b| Value::Bool(a <= b)),

        TokenType::EQUAL_EQUAL => Ok(Value::Bool(left.equals(&right))),

        TokenType::BANG_EQUAL => Ok(Value::Bool(!left.equals(&right))),

        _ => Err(LoxError::runtime(op.line, "Invalid binary operator")),
    }
}

fn numbers(left: Value, right: Value, op: &Token, apply: fn(f64, f64) -> Value) -> Result<Value> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => Ok(apply(a, b)),

        _ => Err(LoxError::runtime(op.line, "Operands must be numbers")),
    }
}

fn superclass_line(expr: &Expr, class_name: &Token) -> usize {
    match expr {
        Expr::Variable { name, .. } => name.line,
        _ => class_name.line,
    }
}

fn clock_native(_args: &[Value]) -> std::result::Result<Value, String> {
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| format!("Clock error: {}", e))?
        .as_secs_f64();

    Ok(Value::Number(timestamp))
}
