#[cfg(test)]
mod parser_tests {
    use rox::ast_printer::AstPrinter;
    use rox::error::LoxError;
    use rox::expr::Expr;
    use rox::parser::Parser;
    use rox::scanner::Scanner;
    use rox::stmt::Stmt;
    use rox::token::Token;

    fn parse(source: &str) -> (Vec<Stmt>, Vec<LoxError>) {
        let tokens: Vec<Token> = Scanner::new(source.as_bytes())
            .filter_map(Result::ok)
            .collect();
        let mut parser = Parser::new(tokens, 0);
        parser.parse()
    }

    fn printed(source: &str) -> String {
        let (statements, errors) = parse(source);
        assert!(errors.is_empty(), "unexpected parse errors: {:?}", errors);

        match &statements[0] {
            Stmt::Expression(expr) | Stmt::Print(expr) => AstPrinter::print(expr),
            other => panic!("expected an expression statement, got {:?}", other),
        }
    }

    #[test]
    fn test_parser_precedence() {
        assert_eq!(printed("2 + 3 * 4;"), "(+ 2.0 (* 3.0 4.0))");
        assert_eq!(printed("(2 + 3) * 4;"), "(* (group (+ 2.0 3.0)) 4.0)");
        assert_eq!(printed("1 - 2 - 3;"), "(- (- 1.0 2.0) 3.0)");
        assert_eq!(printed("1 < 2 == true;"), "(== (< 1.0 2.0) true)");
    }

    #[test]
    fn test_parser_unary() {
        assert_eq!(printed("!!true;"), "(! (! true))");
        assert_eq!(printed("-1 + 2;"), "(+ (- 1.0) 2.0)");
    }

    #[test]
    fn test_parser_logical_precedence() {
        assert_eq!(printed("a or b and c;"), "(or a (and b c))");
    }

    #[test]
    fn test_parser_assignment_right_associative() {
        assert_eq!(printed("a = b = 3;"), "(= a (= b 3.0))");
    }

    #[test]
    fn test_parser_properties_and_calls() {
        assert_eq!(printed("a.b.c;"), "(. (. a b) c)");
        assert_eq!(printed("a.b = 3;"), "(= (. a b) 3.0)");
        assert_eq!(printed("f(1, 2)(3);"), "(call (call f 1.0 2.0) 3.0)");
    }

    #[test]
    fn test_parser_anonymous_function_expression() {
        let (statements, errors) = parse("var f = fun (a, b) { };");
        assert!(errors.is_empty(), "unexpected parse errors: {:?}", errors);

        match &statements[0] {
            Stmt::Var {
                initializer: Some(Expr::Function(decl)),
                ..
            } => {
                assert!(decl.name.is_none());
                assert_eq!(decl.params.len(), 2);
            }
            other => panic!("expected anonymous function initializer, got {:?}", other),
        }
    }

    #[test]
    fn test_parser_for_desugars_to_while() {
        let (statements, errors) = parse("for (var i = 0; i < 3; i = i + 1) print i;");
        assert!(errors.is_empty(), "unexpected parse errors: {:?}", errors);
        assert_eq!(statements.len(), 1);

        // Block [ Var, While { cond, Block [ Print, Expression ] } ]
        let outer = match &statements[0] {
            Stmt::Block(stmts) => stmts,
            other => panic!("expected block, got {:?}", other),
        };
        assert!(matches!(outer[0], Stmt::Var { .. }));

        let body = match &outer[1] {
            Stmt::While { body, .. } => body,
            other => panic!("expected while, got {:?}", other),
        };
        match body.as_ref() {
            Stmt::Block(stmts) => {
                assert!(matches!(stmts[0], Stmt::Print(_)));
                assert!(matches!(stmts[1], Stmt::Expression(_)));
            }
            other => panic!("expected loop body block, got {:?}", other),
        }
    }

    #[test]
    fn test_parser_invalid_assignment_target() {
        let (_, errors) = parse("(a) = 3;");

        assert_eq!(errors.len(), 1);
        assert_eq!(
            errors[0].to_string(),
            "[Line 1] Error at '=': Invalid assignment target"
        );
    }

    #[test]
    fn test_parser_missing_semicolon_reports_eof_as_end() {
        let (_, errors) = parse("print 1");

        assert_eq!(errors.len(), 1);
        assert_eq!(
            errors[0].to_string(),
            "[Line 1] Error at 'end': Expected ';' after value"
        );
    }

    #[test]
    fn test_parser_synchronizes_and_keeps_going() {
        let (statements, errors) = parse("var 1 = 2;\nprint 3;");

        // The bad declaration is dropped, the print survives.
        assert_eq!(errors.len(), 1);
        assert_eq!(statements.len(), 1);
        assert!(matches!(statements[0], Stmt::Print(_)));
    }

    #[test]
    fn test_parser_reports_multiple_errors() {
        let (_, errors) = parse("var;\nprint;");

        assert_eq!(errors.len(), 2);
        assert_eq!(
            errors[0].to_string(),
            "[Line 1] Error at ';': Expected variable name"
        );
        assert_eq!(
            errors[1].to_string(),
            "[Line 2] Error at ';': Expected expression"
        );
    }

    #[test]
    fn test_parser_class_with_superclass() {
        let (statements, errors) = parse("class B < A { m() { return super.m; } }");
        assert!(errors.is_empty(), "unexpected parse errors: {:?}", errors);

        match &statements[0] {
            Stmt::Class {
                name,
                superclass,
                methods,
            } => {
                assert_eq!(name.lexeme, "B");
                assert!(matches!(superclass, Some(Expr::Variable { .. })));
                assert_eq!(methods.len(), 1);
            }
            other => panic!("expected class declaration, got {:?}", other),
        }
    }

    #[test]
    fn test_parser_argument_limit() {
        let args: Vec<String> = (0..256).map(|i| i.to_string()).collect();
        let source = format!("f({});", args.join(", "));

        let (_, errors) = parse(&source);

        assert_eq!(errors.len(), 1);
        assert!(errors[0]
            .to_string()
            .contains("Cannot have more than 255 arguments"));
    }
}
