//! Static resolution pass.
//!
//! A single walk over the parsed statements that:
//! 1. **Builds lexical scopes**: maintains a stack of `HashMap<String, bool>`
//!    tracking declared (false) and fully defined (true) names in each
//!    nested block, function or class.
//! 2. **Enforces static rules**: reading a variable in its own initializer,
//!    duplicate locals, `return` placement, `this`/`super` placement, and
//!    self-inheritance.
//! 3. **Records binding distances**: every variable occurrence that lands in
//!    a scope is reported to the interpreter as `(id, hops)` so the runtime
//!    can climb exactly the right number of environment frames.  Occurrences
//!    that land in no scope are globals and leave no record.
//!
//! Errors are collected, not fatal: one pass reports every static error it
//! can find.

use std::collections::HashMap;

use log::debug;

use crate::error::LoxError;
use crate::expr::{Expr, ExprId};
use crate::interpreter::Interpreter;
use crate::stmt::{FunctionDecl, Stmt};
use crate::token::Token;

/// What kind of function body is being resolved.  Validates `return`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum FunctionType {
    None,
    Function,
    Method,
    Initializer,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum ClassType {
    /// Not inside any class
    None,

    /// Inside a class declaration _without_ a superclass
    Class,

    /// Inside a class declaration _with_ a superclass
    Subclass,
}

/// Resolver: tracks scopes, enforces static rules, and *records* binding
/// distances (locals vs. globals) by calling back into the interpreter.
pub struct Resolver<'i> {
    interpreter: &'i mut Interpreter,
    scopes: Vec<HashMap<String, bool>>, // false=declared, true=defined
    current_function: FunctionType,
    current_class: ClassType,
    errors: Vec<LoxError>,
}

impl<'i> Resolver<'i> {
    /// Create a new resolver bound to the given interpreter.
    pub fn new(interpreter: &'i mut Interpreter) -> Self {
        Resolver {
            interpreter,
            scopes: Vec::new(),
            current_function: FunctionType::None,
            current_class: ClassType::None,
            errors: Vec::new(),
        }
    }

    /// Walk all top-level statements; returns every static error found.
    pub fn resolve(mut self, statements: &[Stmt]) -> Vec<LoxError> {
        for stmt in statements {
            self.resolve_stmt(stmt);
        }
        self.errors
    }

    // ─────────────────────────────────────────────────────────────────────
    // Statement resolution
    // ─────────────────────────────────────────────────────────────────────

    fn resolve_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Block(statements) => {
                self.begin_scope();
                for s in statements {
                    self.resolve_stmt(s);
                }
                self.end_scope();
            }

            Stmt::Var { name, initializer } => {
                self.declare(name);
                if let Some(expr) = initializer {
                    self.resolve_expr(expr);
                }
                self.define(name);
            }

            Stmt::Function(decl) => {
                // Declared and defined up front so the function can recurse.
                if let Some(name) = &decl.name {
                    self.declare(name);
                    self.define(name);
                }
                self.resolve_function(FunctionType::Function, decl);
            }

            Stmt::Expression(expr) | Stmt::Print(expr) => {
                self.resolve_expr(expr);
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.resolve_expr(condition);
                self.resolve_stmt(then_branch);
                if let Some(else_branch) = else_branch {
                    self.resolve_stmt(else_branch);
                }
            }

            Stmt::While { condition, body } => {
                self.resolve_expr(condition);
                self.resolve_stmt(body);
            }

            Stmt::Return { keyword, value } => {
                if self.current_function == FunctionType::None {
                    self.error(keyword, "'return' used outside of function");
                }

                if let Some(expr) = value {
                    if self.current_function == FunctionType::Initializer {
                        self.error(keyword, "Cannot return a value from an initializer");
                    }
                    self.resolve_expr(expr);
                }
            }

            Stmt::Class {
                name,
                superclass,
                methods,
            } => {
                let enclosing_class: ClassType = self.current_class;
                self.current_class = if superclass.is_some() {
                    ClassType::Subclass
                } else {
                    ClassType::Class
                };

                self.declare(name);
                self.define(name);

                if let Some(superclass_expr) = superclass {
                    if let Expr::Variable {
                        name: super_name, ..
                    } = superclass_expr
                    {
                        if super_name.lexeme == name.lexeme {
                            self.error(super_name, "Class cannot inherit from itself");
                        }
                    }

                    self.resolve_expr(superclass_expr);

                    // Methods of a subclass resolve `super` in its own scope.
                    self.begin_scope();
                    self.define_name("super");
                }

                self.begin_scope();
                self.define_name("this");

                for decl in methods {
                    let kind = match &decl.name {
                        Some(m) if m.lexeme == "init" => FunctionType::Initializer,
                        _ => FunctionType::Method,
                    };
                    self.resolve_function(kind, decl);
                }

                self.end_scope();

                if superclass.is_some() {
                    self.end_scope();
                }

                self.current_class = enclosing_class;
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Expression resolution
    // ─────────────────────────────────────────────────────────────────────

    fn resolve_expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Literal(_) => {}

            Expr::Grouping(inner) => self.resolve_expr(inner),

            Expr::Unary { right, .. } => self.resolve_expr(right),

            Expr::Binary { left, right, .. } | Expr::Logical { left, right, .. } => {
                self.resolve_expr(left);
                self.resolve_expr(right);
            }

            Expr::Variable { id, name } => {
                // A declared-but-undefined entry means this read sits inside
                // the variable's own initializer.
                if let Some(scope) = self.scopes.last() {
                    if scope.get(&name.lexeme) == Some(&false) {
                        self.error(name, "Cannot read local variable in its own initializer");
                    }
                }

                self.resolve_local(*id, name);
            }

            Expr::Assign { id, name, value } => {
                self.resolve_expr(value);
                self.resolve_local(*id, name);
            }

            Expr::Call {
                callee, arguments, ..
            } => {
                self.resolve_expr(callee);
                for argument in arguments {
                    self.resolve_expr(argument);
                }
            }

            Expr::Get { object, .. } => self.resolve_expr(object),

            Expr::Set { object, value, .. } => {
                self.resolve_expr(object);
                self.resolve_expr(value);
            }

            Expr::This { id, keyword } => {
                if self.current_class == ClassType::None {
                    self.error(keyword, "Cannot use 'this' outside of a class");
                    return;
                }

                self.resolve_local(*id, keyword);
            }

            Expr::Super { id, keyword, .. } => match self.current_class {
                ClassType::None => {
                    self.error(keyword, "Cannot use 'super' outside of a class");
                }

                ClassType::Class => {
                    self.error(keyword, "Cannot use 'super' in a class with no superclass");
                }

                ClassType::Subclass => {
                    self.resolve_local(*id, keyword);
                }
            },

            Expr::Function(decl) => self.resolve_function(FunctionType::Function, decl),
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Function helper
    // ─────────────────────────────────────────────────────────────────────

    /// Parameters get one scope and the body another; the interpreter builds
    /// two matching frames per call.
    fn resolve_function(&mut self, kind: FunctionType, decl: &FunctionDecl) {
        let enclosing = self.current_function;
        self.current_function = kind;

        self.begin_scope();
        for param in &decl.params {
            self.declare(param);
            self.define(param);
        }

        self.begin_scope();
        for stmt in &decl.body {
            self.resolve_stmt(stmt);
        }
        self.end_scope();

        self.end_scope();

        self.current_function = enclosing;
    }

    // ─────────────────────────────────────────────────────────────────────
    // Scope management
    // ─────────────────────────────────────────────────────────────────────

    #[inline]
    fn begin_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    #[inline]
    fn end_scope(&mut self) {
        self.scopes.pop();
    }

    fn declare(&mut self, name: &Token) {
        let duplicate = match self.scopes.last_mut() {
            Some(scope) => scope.insert(name.lexeme.clone(), false).is_some(),
            None => false,
        };

        if duplicate {
            self.error(name, "Variable already declared in this scope");
        }
    }

    fn define(&mut self, name: &Token) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.lexeme.clone(), true);
        }
    }

    /// Mark an implicit name (`this`, `super`) defined in the current scope.
    fn define_name(&mut self, name: &str) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.to_string(), true);
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Binding-distance helper
    // ─────────────────────────────────────────────────────────────────────

    /// Record this occurrence as a local at the depth of the innermost scope
    /// containing the name, or leave it global if no scope does.
    fn resolve_local(&mut self, id: ExprId, name: &Token) {
        for (hops, scope) in self.scopes.iter().rev().enumerate() {
            if scope.contains_key(&name.lexeme) {
                debug!("resolved '{}' at distance {}", name.lexeme, hops);
                self.interpreter.note_local(id, hops);
                return;
            }
        }
    }

    fn error(&mut self, token: &Token, message: &str) {
        self.errors.push(LoxError::resolve(token, message));
    }
}
