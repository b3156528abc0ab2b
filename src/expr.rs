use std::rc::Rc;

use crate::stmt::FunctionDecl;
use crate::token::Token;

/// Identity of a resolvable expression node.  Assigned by the parser,
/// recorded by the resolver, consulted by the interpreter.  Ids are never
/// reused within a process, so function bodies kept alive by closures stay
/// correctly annotated across REPL lines.
pub type ExprId = usize;

#[derive(Debug)]
pub enum Expr {
    Literal(Token),

    Unary {
        op: Token,
        right: Box<Expr>,
    },

    Binary {
        left: Box<Expr>,
        op: Token,
        right: Box<Expr>,
    },

    /// Short-circuiting `and` / `or`.
    Logical {
        left: Box<Expr>,
        op: Token,
        right: Box<Expr>,
    },

    Grouping(Box<Expr>),

    Variable {
        id: ExprId,
        name: Token,
    },

    Assign {
        id: ExprId,
        name: Token,
        value: Box<Expr>,
    },

    Call {
        callee: Box<Expr>,
        paren: Token,
        arguments: Vec<Expr>,
    },

    Get {
        object: Box<Expr>,
        name: Token,
    },

    Set {
        object: Box<Expr>,
        name: Token,
        value: Box<Expr>,
    },

    This {
        id: ExprId,
        keyword: Token,
    },

    Super {
        id: ExprId,
        keyword: Token,
        method: Token,
    },

    /// Anonymous `fun (…) { … }` expression.
    Function(Rc<FunctionDecl>),
}
