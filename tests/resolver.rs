#[cfg(test)]
mod resolver_tests {
    use rox::interpreter::Interpreter;
    use rox::parser::Parser;
    use rox::resolver::Resolver;
    use rox::scanner::Scanner;
    use rox::token::Token;

    fn resolve_errors(source: &str) -> Vec<String> {
        let tokens: Vec<Token> = Scanner::new(source.as_bytes())
            .filter_map(Result::ok)
            .collect();
        let mut parser = Parser::new(tokens, 0);
        let (statements, parse_errors) = parser.parse();
        assert!(
            parse_errors.is_empty(),
            "unexpected parse errors: {:?}",
            parse_errors
        );

        let mut interpreter = Interpreter::new();
        Resolver::new(&mut interpreter)
            .resolve(&statements)
            .iter()
            .map(|e| e.to_string())
            .collect()
    }

    #[test]
    fn test_resolver_accepts_plain_programs() {
        let errors = resolve_errors("var a = 1; { var b = a; print b; }");
        assert!(errors.is_empty(), "unexpected errors: {:?}", errors);
    }

    #[test]
    fn test_resolver_read_in_own_initializer() {
        let errors = resolve_errors("var a = 1; { var a = a; }");
        assert_eq!(
            errors,
            vec!["[Line 1] Error at 'a': Cannot read local variable in its own initializer"]
        );
    }

    #[test]
    fn test_resolver_duplicate_local() {
        let errors = resolve_errors("{ var a = 1; var a = 2; }");
        assert_eq!(
            errors,
            vec!["[Line 1] Error at 'a': Variable already declared in this scope"]
        );
    }

    #[test]
    fn test_resolver_allows_global_redeclaration() {
        let errors = resolve_errors("var a = 1; var a = 2;");
        assert!(errors.is_empty(), "unexpected errors: {:?}", errors);
    }

    #[test]
    fn test_resolver_top_level_return() {
        let errors = resolve_errors("return 1;");
        assert_eq!(
            errors,
            vec!["[Line 1] Error at 'return': 'return' used outside of function"]
        );
    }

    #[test]
    fn test_resolver_return_value_from_initializer() {
        let errors = resolve_errors("class A { init() { return 1; } }");
        assert_eq!(
            errors,
            vec!["[Line 1] Error at 'return': Cannot return a value from an initializer"]
        );

        // A bare return is fine.
        let errors = resolve_errors("class A { init() { return; } }");
        assert!(errors.is_empty(), "unexpected errors: {:?}", errors);
    }

    #[test]
    fn test_resolver_this_outside_class() {
        let errors = resolve_errors("print this;");
        assert_eq!(
            errors,
            vec!["[Line 1] Error at 'this': Cannot use 'this' outside of a class"]
        );
    }

    #[test]
    fn test_resolver_super_outside_class() {
        let errors = resolve_errors("fun f() { return super.m; }");
        assert_eq!(
            errors,
            vec!["[Line 1] Error at 'super': Cannot use 'super' outside of a class"]
        );
    }

    #[test]
    fn test_resolver_super_without_superclass() {
        let errors = resolve_errors("class A { m() { return super.m; } }");
        assert_eq!(
            errors,
            vec!["[Line 1] Error at 'super': Cannot use 'super' in a class with no superclass"]
        );
    }

    #[test]
    fn test_resolver_self_inheritance() {
        let errors = resolve_errors("class Foo < Foo {}");
        assert_eq!(
            errors,
            vec!["[Line 1] Error at 'Foo': Class cannot inherit from itself"]
        );
    }

    #[test]
    fn test_resolver_collects_several_errors() {
        let errors = resolve_errors("return 1;\nprint this;");
        assert_eq!(errors.len(), 2);
    }
}
