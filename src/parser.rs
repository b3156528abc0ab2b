use std::mem;
use std::rc::Rc;

use log::debug;

use crate::error::LoxError;
use crate::expr::{Expr, ExprId};
use crate::stmt::{FunctionDecl, Stmt};
use crate::token::{Token, TokenType};

/// Hard grammar limit on call arguments and function parameters.
const MAX_ARITY: usize = 255;

/// Recursive-descent parser over a scanned token list.
///
/// A syntax error does not stop the parse: the failed declaration is
/// recorded and the parser synchronizes at the next statement boundary, so a
/// single run can report several errors.
pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
    next_id: ExprId,
    errors: Vec<LoxError>,
}

impl Parser {
    /// `first_id` seeds the expression-id counter; callers that parse more
    /// than once per process (the REPL) thread the counter through so ids
    /// stay unique.
    pub fn new(mut tokens: Vec<Token>, first_id: ExprId) -> Self {
        // The scanner always terminates the stream with EOF; guard against
        // hand-built token lists that do not.
        let has_eof = matches!(tokens.last(), Some(t) if t.token_type == TokenType::EOF);
        if !has_eof {
            let line = tokens.last().map_or(1, |t| t.line);
            tokens.push(Token::new(TokenType::EOF, String::new(), line));
        }

        Parser {
            tokens,
            current: 0,
            next_id: first_id,
            errors: Vec::new(),
        }
    }

    /// Parse the whole program.  Returns the statements that parsed cleanly
    /// together with every syntax error encountered.
    pub fn parse(&mut self) -> (Vec<Stmt>, Vec<LoxError>) {
        let mut statements: Vec<Stmt> = Vec::new();

        while !self.is_at_end() {
            if let Some(stmt) = self.declaration() {
                statements.push(stmt);
            }
        }

        (statements, mem::take(&mut self.errors))
    }

    /// The next unassigned expression id.
    pub fn next_id(&self) -> ExprId {
        self.next_id
    }

    fn fresh_id(&mut self) -> ExprId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    // ─────────────────────────────────────────────────────────────────────
    // Declarations
    // ─────────────────────────────────────────────────────────────────────

    fn declaration(&mut self) -> Option<Stmt> {
        let result = if self.match_tokens(&[TokenType::CLASS]) {
            self.class_declaration()
        } else if self.check(&TokenType::FUN) && self.check_next(&TokenType::IDENTIFIER) {
            // `fun` followed by a name is a declaration; a bare `fun (`
            // belongs to an anonymous function expression.
            self.advance();
            self.function("function").map(Stmt::Function)
        } else if self.match_tokens(&[TokenType::VAR]) {
            self.var_declaration()
        } else {
            self.statement()
        };

        match result {
            Ok(stmt) => Some(stmt),

            Err(e) => {
                debug!("parse error, synchronizing: {}", e);
                self.errors.push(e);
                self.synchronize();
                None
            }
        }
    }

    fn class_declaration(&mut self) -> Result<Stmt, LoxError> {
        let name = self
            .consume(&TokenType::IDENTIFIER, "Expected class name")?
            .clone();

        let superclass = if self.match_tokens(&[TokenType::LESS]) {
            let super_name = self
                .consume(&TokenType::IDENTIFIER, "Expected superclass name")?
                .clone();
            Some(Expr::Variable {
                id: self.fresh_id(),
                name: super_name,
            })
        } else {
            None
        };

        self.consume(&TokenType::LEFT_BRACE, "Expected '{' before class body")?;

        let mut methods: Vec<Rc<FunctionDecl>> = Vec::new();
        while !self.check(&TokenType::RIGHT_BRACE) && !self.is_at_end() {
            methods.push(self.function("method")?);
        }

        self.consume(&TokenType::RIGHT_BRACE, "Expected '}' after class body")?;

        Ok(Stmt::Class {
            name,
            superclass,
            methods,
        })
    }

    fn function(&mut self, kind: &str) -> Result<Rc<FunctionDecl>, LoxError> {
        let name = self
            .consume(&TokenType::IDENTIFIER, &format!("Expected {} name", kind))?
            .clone();

        self.consume(
            &TokenType::LEFT_PAREN,
            &format!("Expected '(' after {} name", kind),
        )?;

        let (params, body) = self.function_rest()?;

        Ok(Rc::new(FunctionDecl {
            name: Some(name),
            params,
            body,
        }))
    }

    /// Parameter list, closing paren and body.  Shared by declarations,
    /// methods and anonymous function expressions; the opening paren has
    /// already been consumed.
    fn function_rest(&mut self) -> Result<(Vec<Token>, Vec<Stmt>), LoxError> {
        let mut params: Vec<Token> = Vec::new();

        if !self.check(&TokenType::RIGHT_PAREN) {
            loop {
                if params.len() >= MAX_ARITY {
                    let token = self.peek().clone();
                    self.errors.push(LoxError::parse(
                        &token,
                        "Cannot have more than 255 parameters",
                    ));
                }

                params.push(
                    self.consume(&TokenType::IDENTIFIER, "Expected parameter name")?
                        .clone(),
                );

                if !self.match_tokens(&[TokenType::COMMA]) {
                    break;
                }
            }
        }

        self.consume(&TokenType::RIGHT_PAREN, "Expected ')' after parameters")?;
        self.consume(&TokenType::LEFT_BRACE, "Expected '{' before function body")?;

        let body = self.block()?;

        Ok((params, body))
    }

    fn var_declaration(&mut self) -> Result<Stmt, LoxError> {
        let name = self
            .consume(&TokenType::IDENTIFIER, "Expected variable name")?
            .clone();

        let initializer = if self.match_tokens(&[TokenType::EQUAL]) {
            Some(self.expression()?)
        } else {
            None
        };

        self.consume(
            &TokenType::SEMICOLON,
            "Expected ';' after variable declaration",
        )?;

        Ok(Stmt::Var { name, initializer })
    }

    // ─────────────────────────────────────────────────────────────────────
    // Statements
    // ─────────────────────────────────────────────────────────────────────

    fn statement(&mut self) -> Result<Stmt, LoxError> {
        if self.match_tokens(&[TokenType::FOR]) {
            return self.for_statement();
        }

        if self.match_tokens(&[TokenType::IF]) {
            return self.if_statement();
        }

        if self.match_tokens(&[TokenType::PRINT]) {
            return self.print_statement();
        }

        if self.match_tokens(&[TokenType::RETURN]) {
            return self.return_statement();
        }

        if self.match_tokens(&[TokenType::WHILE]) {
            return self.while_statement();
        }

        if self.match_tokens(&[TokenType::LEFT_BRACE]) {
            return Ok(Stmt::Block(self.block()?));
        }

        self.expression_statement()
    }

    /// `for` has no statement variant of its own: it lowers onto `While`
    /// wrapped in blocks.
    fn for_statement(&mut self) -> Result<Stmt, LoxError> {
        let for_line = self.previous().line;

        self.consume(&TokenType::LEFT_PAREN, "Expected '(' after 'for'")?;

        let initializer: Option<Stmt> = if self.match_tokens(&[TokenType::SEMICOLON]) {
            None
        } else if self.match_tokens(&[TokenType::VAR]) {
            Some(self.var_declaration()?)
        } else {
            Some(self.expression_statement()?)
        };

        let condition: Option<Expr> = if self.check(&TokenType::SEMICOLON) {
            None
        } else {
            Some(self.expression()?)
        };
        self.consume(&TokenType::SEMICOLON, "Expected ';' after loop condition")?;

        let increment: Option<Expr> = if self.check(&TokenType::RIGHT_PAREN) {
            None
        } else {
            Some(self.expression()?)
        };
        self.consume(&TokenType::RIGHT_PAREN, "Expected ')' after for clauses")?;

        let mut body = self.statement()?;

        if let Some(increment) = increment {
            body = Stmt::Block(vec![body, Stmt::Expression(increment)]);
        }

        let condition = condition.unwrap_or_else(|| {
            Expr::Literal(Token::new(TokenType::TRUE, "true".to_string(), for_line))
        });

        body = Stmt::While {
            condition,
            body: Box::new(body),
        };

        if let Some(initializer) = initializer {
            body = Stmt::Block(vec![initializer, body]);
        }

        Ok(body)
    }

    fn if_statement(&mut self) -> Result<Stmt, LoxError> {
        self.consume(&TokenType::LEFT_PAREN, "Expected '(' after 'if'")?;
        let condition = self.expression()?;
        self.consume(&TokenType::RIGHT_PAREN, "Expected ')' after if condition")?;

        let then_branch = Box::new(self.statement()?);
        let else_branch = if self.match_tokens(&[TokenType::ELSE]) {
            Some(Box::new(self.statement()?))
        } else {
            None
        };

        Ok(Stmt::If {
            condition,
            then_branch,
            else_branch,
        })
    }

    fn print_statement(&mut self) -> Result<Stmt, LoxError> {
        let expr = self.expression()?;
        self.consume(&TokenType::SEMICOLON, "Expected ';' after value")?;
        Ok(Stmt::Print(expr))
    }

    fn return_statement(&mut self) -> Result<Stmt, LoxError> {
        let keyword = self.previous().clone();

        let value = if self.check(&TokenType::SEMICOLON) {
            None
        } else {
            Some(self.expression()?)
        };

        self.consume(&TokenType::SEMICOLON, "Expected ';' after return value")?;

        Ok(Stmt::Return { keyword, value })
    }

    fn while_statement(&mut self) -> Result<Stmt, LoxError> {
        self.consume(&TokenType::LEFT_PAREN, "Expected '(' after 'while'")?;
        let condition = self.expression()?;
        self.consume(&TokenType::RIGHT_PAREN, "Expected ')' after condition")?;

        let body = Box::new(self.statement()?);

        Ok(Stmt::While { condition, body })
    }

    fn block(&mut self) -> Result<Vec<Stmt>, LoxError> {
        let mut statements: Vec<Stmt> = Vec::new();

        while !self.check(&TokenType::RIGHT_BRACE) && !self.is_at_end() {
            if let Some(stmt) = self.declaration() {
                statements.push(stmt);
            }
        }

        self.consume(&TokenType::RIGHT_BRACE, "Expected '}' after block")?;

        Ok(statements)
    }

    fn expression_statement(&mut self) -> Result<Stmt, LoxError> {
        let expr = self.expression()?;
        self.consume(&TokenType::SEMICOLON, "Expected ';' after expression")?;
        Ok(Stmt::Expression(expr))
    }

    // ─────────────────────────────────────────────────────────────────────
    // Expressions, precedence ascending
    // ─────────────────────────────────────────────────────────────────────

    fn expression(&mut self) -> Result<Expr, LoxError> {
        self.assignment()
    }

    fn assignment(&mut self) -> Result<Expr, LoxError> {
        let expr = self.or()?;

        if self.match_tokens(&[TokenType::EQUAL]) {
            let equals = self.previous().clone();
            let value = Box::new(self.assignment()?);

            // Reinterpret the left-hand side: a variable read becomes an
            // assignment, a property read becomes a property write.
            return Ok(match expr {
                Expr::Variable { name, .. } => Expr::Assign {
                    id: self.fresh_id(),
                    name,
                    value,
                },

                Expr::Get { object, name } => Expr::Set {
                    object,
                    name,
                    value,
                },

                other => {
                    self.errors
                        .push(LoxError::parse(&equals, "Invalid assignment target"));
                    other
                }
            });
        }

        Ok(expr)
    }

    fn or(&mut self) -> Result<Expr, LoxError> {
        let mut expr = self.and()?;

        while self.match_tokens(&[TokenType::OR]) {
            let op = self.previous().clone();
            let right = self.and()?;
            expr = Expr::Logical {
                left: Box::new(expr),
                op,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    fn and(&mut self) -> Result<Expr, LoxError> {
        let mut expr = self.equality()?;

        while self.match_tokens(&[TokenType::AND]) {
            let op = self.previous().clone();
            let right = self.equality()?;
            expr = Expr::Logical {
                left: Box::new(expr),
                op,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    fn equality(&mut self) -> Result<Expr, LoxError> {
        let mut expr = self.comparison()?;

        while self.match_tokens(&[TokenType::BANG_EQUAL, TokenType::EQUAL_EQUAL]) {
            let op = self.previous().clone();
            let right = self.comparison()?;
            expr = Expr::Binary {
                left: Box::new(expr),
                op,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    fn comparison(&mut self) -> Result<Expr, LoxError> {
        let mut expr = self.term()?;

        while self.match_tokens(&[
            TokenType::GREATER,
            TokenType::GREATER_EQUAL,
            TokenType::LESS,
            TokenType::LESS_EQUAL,
        ]) {
            let op = self.previous().clone();
            let right = self.term()?;
            expr = Expr::Binary {
                left: Box::new(expr),
                op,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    fn term(&mut self) -> Result<Expr, LoxError> {
        let mut expr = self.factor()?;

        while self.match_tokens(&[TokenType::MINUS, TokenType::PLUS]) {
            let op = self.previous().clone();
            let right = self.factor()?;
            expr = Expr::Binary {
                left: Box::new(expr),
                op,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    fn factor(&mut self) -> Result<Expr, LoxError> {
        let mut expr = self.unary()?;

        while self.match_tokens(&[TokenType::SLASH, TokenType::STAR]) {
            let op = self.previous().clone();
            let right = self.unary()?;
            expr = Expr::Binary {
                left: Box::new(expr),
                op,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    fn unary(&mut self) -> Result<Expr, LoxError> {
        if self.match_tokens(&[TokenType::BANG, TokenType::MINUS]) {
            let op = self.previous().clone();
            let right = self.unary()?;
            return Ok(Expr::Unary {
                op,
                right: Box::new(right),
            });
        }

        self.call()
    }

    fn call(&mut self) -> Result<Expr, LoxError> {
        let mut expr = self.primary()?;

        loop {
            if self.match_tokens(&[TokenType::LEFT_PAREN]) {
                expr = self.finish_call(expr)?;
            } else if self.match_tokens(&[TokenType::DOT]) {
                let name = self
                    .consume(&TokenType::IDENTIFIER, "Expected property name after '.'")?
                    .clone();
                expr = Expr::Get {
                    object: Box::new(expr),
                    name,
                };
            } else {
                break;
            }
        }

        Ok(expr)
    }

    fn finish_call(&mut self, callee: Expr) -> Result<Expr, LoxError> {
        let mut arguments: Vec<Expr> = Vec::new();

        if !self.check(&TokenType::RIGHT_PAREN) {
            loop {
                if arguments.len() >= MAX_ARITY {
                    let token = self.peek().clone();
                    self.errors.push(LoxError::parse(
                        &token,
                        "Cannot have more than 255 arguments",
                    ));
                }

                arguments.push(self.expression()?);

                if !self.match_tokens(&[TokenType::COMMA]) {
                    break;
                }
            }
        }

        let paren = self
            .consume(&TokenType::RIGHT_PAREN, "Expected ')' after arguments")?
            .clone();

        Ok(Expr::Call {
            callee: Box::new(callee),
            paren,
            arguments,
        })
    }

    fn primary(&mut self) -> Result<Expr, LoxError> {
        if self.match_tokens(&[
            TokenType::NUMBER(0.0),
            TokenType::STRING(String::new()),
            TokenType::TRUE,
            TokenType::FALSE,
            TokenType::NIL,
        ]) {
            return Ok(Expr::Literal(self.previous().clone()));
        }

        if self.match_tokens(&[TokenType::THIS]) {
            return Ok(Expr::This {
                id: self.fresh_id(),
                keyword: self.previous().clone(),
            });
        }

        if self.match_tokens(&[TokenType::SUPER]) {
            let keyword = self.previous().clone();
            self.consume(&TokenType::DOT, "Expected '.' after 'super'")?;
            let method = self
                .consume(&TokenType::IDENTIFIER, "Expected superclass method name")?
                .clone();
            return Ok(Expr::Super {
                id: self.fresh_id(),
                keyword,
                method,
            });
        }

        if self.match_tokens(&[TokenType::IDENTIFIER]) {
            return Ok(Expr::Variable {
                id: self.fresh_id(),
                name: self.previous().clone(),
            });
        }

        if self.match_tokens(&[TokenType::FUN]) {
            self.consume(&TokenType::LEFT_PAREN, "Expected '(' after 'fun'")?;
            let (params, body) = self.function_rest()?;
            return Ok(Expr::Function(Rc::new(FunctionDecl {
                name: None,
                params,
                body,
            })));
        }

        if self.match_tokens(&[TokenType::LEFT_PAREN]) {
            let expr = self.expression()?;
            self.consume(&TokenType::RIGHT_PAREN, "Expected ')' after expression")?;
            return Ok(Expr::Grouping(Box::new(expr)));
        }

        Err(LoxError::parse(self.peek(), "Expected expression"))
    }

    // ─────────────────────────────────────────────────────────────────────
    // Error recovery
    // ─────────────────────────────────────────────────────────────────────

    /// Discard tokens until a statement boundary, so one syntax error does
    /// not cascade into nonsense diagnostics for the rest of the file.
    fn synchronize(&mut self) {
        self.advance();

        while !self.is_at_end() {
            if self.previous().token_type == TokenType::SEMICOLON {
                return;
            }

            match self.peek().token_type {
                TokenType::CLASS
                | TokenType::FUN
                | TokenType::VAR
                | TokenType::FOR
                | TokenType::IF
                | TokenType::WHILE
                | TokenType::PRINT
                | TokenType::RETURN => return,

                _ => {
                    self.advance();
                }
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Cursor helpers
    // ─────────────────────────────────────────────────────────────────────

    fn match_tokens(&mut self, types: &[TokenType]) -> bool {
        for token_type in types {
            if self.check(token_type) {
                self.advance();
                return true;
            }
        }
        false
    }

    fn consume(&mut self, token_type: &TokenType, message: &str) -> Result<&Token, LoxError> {
        if self.check(token_type) {
            return Ok(self.advance());
        }
        Err(LoxError::parse(self.peek(), message))
    }

    fn check(&self, token_type: &TokenType) -> bool {
        !self.is_at_end() && self.peek().token_type == *token_type
    }

    fn check_next(&self, token_type: &TokenType) -> bool {
        match self.tokens.get(self.current + 1) {
            Some(t) if t.token_type != TokenType::EOF => t.token_type == *token_type,
            _ => false,
        }
    }

    fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.current += 1;
        }
        self.previous()
    }

    fn is_at_end(&self) -> bool {
        self.peek().token_type == TokenType::EOF
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.current]
    }

    fn previous(&self) -> &Token {
        &self.tokens[self.current.saturating_sub(1)]
    }
}
