use crate::expr::Expr;
use crate::token::TokenType;

/// Converts an expression to its canonical prefix form.  Used to pin parse
/// shapes in tests.
pub struct AstPrinter;

impl AstPrinter {
    pub fn print(expr: &Expr) -> String {
        match expr {
            // ── literals ────────────────────────────────────────────────
            Expr::Literal(token) => match &token.token_type {
                TokenType::NUMBER(n) => {
                    if n.fract() == 0.0 {
                        // 3 → 3.0
                        format!("{:.1}", n)
                    } else {
                        n.to_string()
                    }
                }

                TokenType::STRING(s) => s.clone(),

                TokenType::TRUE => "true".to_string(),

                TokenType::FALSE => "false".to_string(),

                TokenType::NIL => "nil".to_string(),

                _ => token.lexeme.clone(),
            },

            // ── grouping ────────────────────────────────────────────────
            Expr::Grouping(inner) => format!("(group {})", Self::print(inner)),

            // ── operators ───────────────────────────────────────────────
            Expr::Unary { op, right } => format!("({} {})", op.lexeme, Self::print(right)),

            Expr::Binary { left, op, right } | Expr::Logical { left, op, right } => format!(
                "({} {} {})",
                op.lexeme,
                Self::print(left),
                Self::print(right)
            ),

            // ── variables and assignment ────────────────────────────────
            Expr::Variable { name, .. } => name.lexeme.clone(),

            Expr::Assign { name, value, .. } => {
                format!("(= {} {})", name.lexeme, Self::print(value))
            }

            // ── calls and properties ────────────────────────────────────
            Expr::Call {
                callee, arguments, ..
            } => {
                let mut s = format!("(call {}", Self::print(callee));
                for argument in arguments {
                    s.push(' ');
                    s.push_str(&Self::print(argument));
                }
                s.push(')');
                s
            }

            Expr::Get { object, name } => format!("(. {} {})", Self::print(object), name.lexeme),

            Expr::Set {
                object,
                name,
                value,
            } => format!(
                "(= (. {} {}) {})",
                Self::print(object),
                name.lexeme,
                Self::print(value)
            ),

            // ── class machinery ─────────────────────────────────────────
            Expr::This { .. } => "this".to_string(),

            Expr::Super { method, .. } => format!("(super {})", method.lexeme),

            // ── anonymous functions ─────────────────────────────────────
            Expr::Function(decl) => {
                let mut s = String::from("(fun (");
                for (i, param) in decl.params.iter().enumerate() {
                    if i > 0 {
                        s.push(' ');
                    }
                    s.push_str(&param.lexeme);
                }
                s.push_str("))");
                s
            }
        }
    }
}
