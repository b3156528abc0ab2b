#[cfg(test)]
mod interpreter_tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use rox::runtime::Lox;

    /// A session wired to capturing buffers, in place of the process
    /// streams.
    fn session() -> (Lox, Rc<RefCell<Vec<u8>>>, Rc<RefCell<Vec<u8>>>) {
        let out: Rc<RefCell<Vec<u8>>> = Rc::new(RefCell::new(Vec::new()));
        let err: Rc<RefCell<Vec<u8>>> = Rc::new(RefCell::new(Vec::new()));
        let lox = Lox::with_streams(out.clone(), err.clone());
        (lox, out, err)
    }

    fn contents(buf: &Rc<RefCell<Vec<u8>>>) -> String {
        String::from_utf8(buf.borrow().clone()).expect("output is UTF-8")
    }

    fn run(source: &str) -> (String, String) {
        let (mut lox, out, err) = session();
        lox.run(source.as_bytes());
        (contents(&out), contents(&err))
    }

    fn run_ok(source: &str) -> String {
        let (stdout, stderr) = run(source);
        assert_eq!(stderr, "", "unexpected diagnostics");
        stdout
    }

    // ── expressions ─────────────────────────────────────────────────────

    #[test]
    fn test_precedence() {
        assert_eq!(run_ok("print 2 + 3 * 4;"), "14\n");
        assert_eq!(run_ok("print (2 + 3) * 4;"), "20\n");
    }

    #[test]
    fn test_number_formatting() {
        assert_eq!(run_ok("print 100;"), "100\n");
        assert_eq!(run_ok("print 10 / 4;"), "2.5\n");
        assert_eq!(run_ok("print 0.5;"), "0.5\n");
        assert_eq!(run_ok("print -3;"), "-3\n");
    }

    #[test]
    fn test_string_number_concatenation() {
        assert_eq!(run_ok("print \"x=\" + 3;"), "x=3\n");
        assert_eq!(run_ok("print 3 + \"x\";"), "3x\n");
        assert_eq!(run_ok("print \"a\" + \"b\";"), "ab\n");
    }

    #[test]
    fn test_equality() {
        assert_eq!(
            run_ok("print 1 == 1; print nil == nil; print \"a\" != \"b\"; print 1 == \"1\";"),
            "true\ntrue\ntrue\nfalse\n"
        );
    }

    #[test]
    fn test_truthiness() {
        // Only nil and false are falsey; 0 and "" are truthy.
        assert_eq!(run_ok("if (0) print \"t\"; else print \"f\";"), "t\n");
        assert_eq!(run_ok("if (\"\") print \"t\"; else print \"f\";"), "t\n");
        assert_eq!(run_ok("if (nil) print \"t\"; else print \"f\";"), "f\n");
        assert_eq!(run_ok("print !false; print !nil; print !0;"), "true\ntrue\nfalse\n");
    }

    #[test]
    fn test_logical_operators_return_operands() {
        assert_eq!(run_ok("print nil or \"yes\";"), "yes\n");
        assert_eq!(run_ok("print 1 or 2;"), "1\n");
        assert_eq!(run_ok("print nil and 2;"), "nil\n");
        assert_eq!(run_ok("print 1 and 2;"), "2\n");
    }

    #[test]
    fn test_short_circuit_skips_right_operand() {
        assert_eq!(
            run_ok("var hits = 0; fun bump() { hits = hits + 1; return true; } false and bump(); true or bump(); print hits;"),
            "0\n"
        );
    }

    // ── statements, scoping ─────────────────────────────────────────────

    #[test]
    fn test_block_shadowing() {
        assert_eq!(
            run_ok("var foo = 42; { var foo = 24; print foo; } print foo;"),
            "24\n42\n"
        );
    }

    #[test]
    fn test_while_loop() {
        assert_eq!(
            run_ok("var i = 0; while (i < 5) { print i; i = i + 1; }"),
            "0\n1\n2\n3\n4\n"
        );
    }

    #[test]
    fn test_for_loop() {
        assert_eq!(
            run_ok("var sum = 0; for (var i = 1; i <= 4; i = i + 1) sum = sum + i; print sum;"),
            "10\n"
        );
    }

    // ── functions and closures ──────────────────────────────────────────

    #[test]
    fn test_function_return_unwinds_only_to_its_call() {
        let source = "fun f() { for (var i = 0; i < 3; i = i + 1) { if (i == 1) return i; } }\n\
                      print f();";
        assert_eq!(run_ok(source), "1\n");
    }

    #[test]
    fn test_implicit_return_is_nil() {
        assert_eq!(run_ok("fun f() {} print f();"), "nil\n");
    }

    #[test]
    fn test_closure_capture_is_pinned_at_resolution() {
        let source = "var a = \"global\";\n\
                      { fun show() { print a; } show(); var a = \"block\"; show(); }";
        assert_eq!(run_ok(source), "global\nglobal\n");
    }

    #[test]
    fn test_closures_observe_later_assignments() {
        assert_eq!(
            run_ok("var a = 1; fun get() { return a; } a = 2; print get();"),
            "2\n"
        );
    }

    #[test]
    fn test_counter_closure() {
        let source = "fun makeCounter() { var n = 0; fun next() { n = n + 1; return n; } return next; }\n\
                      var count = makeCounter();\n\
                      print count(); print count();";
        assert_eq!(run_ok(source), "1\n2\n");
    }

    #[test]
    fn test_nested_closures_reach_outer_locals() {
        let source = "fun outer() { var x = 1; fun mid() { fun inner() { return x; } return inner(); } return mid(); }\n\
                      print outer();";
        assert_eq!(run_ok(source), "1\n");
    }

    #[test]
    fn test_anonymous_function_values() {
        assert_eq!(
            run_ok("var square = fun (x) { return x * x; }; print square(4); print square;"),
            "16\n<fn>\n"
        );
    }

    #[test]
    fn test_value_display_forms() {
        assert_eq!(run_ok("fun f() {} print f;"), "<fn f>\n");
        assert_eq!(run_ok("print clock;"), "<native fn clock>\n");
        assert_eq!(run_ok("class A {} print A; print A();"), "A\nA instance\n");
    }

    // ── classes ─────────────────────────────────────────────────────────

    #[test]
    fn test_fields_and_methods() {
        let source = "class Counter { init() { this.n = 0; } bump() { this.n = this.n + 1; return this.n; } }\n\
                      var c = Counter();\n\
                      print c.bump(); print c.bump(); print c.n;";
        assert_eq!(run_ok(source), "1\n2\n2\n");
    }

    #[test]
    fn test_methods_are_inherited() {
        let source = "class A { say() { print \"A\"; } }\n\
                      class B < A {}\n\
                      B().say();";
        assert_eq!(run_ok(source), "A\n");
    }

    #[test]
    fn test_super_dispatches_past_override() {
        let source = "class A { say() { print \"A\"; } }\n\
                      class B < A { say() { super.say(); print \"B\"; } }\n\
                      B().say();";
        assert_eq!(run_ok(source), "A\nB\n");
    }

    #[test]
    fn test_bound_methods_remember_their_instance() {
        let source = "class Greeter { init(name) { this.name = name; } hello() { print this.name; } }\n\
                      var m = Greeter(\"ada\").hello;\n\
                      m();";
        assert_eq!(run_ok(source), "ada\n");
    }

    #[test]
    fn test_initializer_returns_this() {
        let source = "class A { init() { this.x = 1; } }\n\
                      var a = A();\n\
                      print a.x;";
        assert_eq!(run_ok(source), "1\n");
    }

    // ── diagnostics ─────────────────────────────────────────────────────

    #[test]
    fn test_division_by_zero() {
        let (stdout, stderr) = run("print 1 / 0;");
        assert_eq!(stdout, "");
        assert_eq!(stderr, "[Line 1] Value cannot be zero\n");
    }

    #[test]
    fn test_calling_a_non_callable() {
        let (_, stderr) = run("true();");
        assert_eq!(stderr, "[Line 1] Can only call functions and classes\n");
    }

    #[test]
    fn test_arity_mismatch() {
        let (_, stderr) = run("fun f(a) {}\nf();");
        assert_eq!(stderr, "[Line 2] Expected 1 arguments but got 0\n");
    }

    #[test]
    fn test_undefined_variable() {
        let (_, stderr) = run("print x;");
        assert_eq!(stderr, "[Line 1] Undefined variable 'x'\n");
    }

    #[test]
    fn test_undefined_property() {
        let (_, stderr) = run("class A {}\nprint A().missing;");
        assert_eq!(stderr, "[Line 2] Undefined property 'missing'\n");
    }

    #[test]
    fn test_operand_type_errors() {
        let (_, stderr) = run("print -\"a\";");
        assert_eq!(stderr, "[Line 1] Operand must be a number\n");

        let (_, stderr) = run("print 1 < \"a\";");
        assert_eq!(stderr, "[Line 1] Operands must be numbers\n");

        let (_, stderr) = run("print 1 + nil;");
        assert_eq!(stderr, "[Line 1] Operands must be two numbers or two strings\n");
    }

    #[test]
    fn test_superclass_must_be_a_class() {
        let (_, stderr) = run("var NotAClass = 1;\nclass A < NotAClass {}");
        assert_eq!(stderr, "[Line 2] Superclass must be a class\n");
    }

    #[test]
    fn test_invalid_assignment_target_is_reported() {
        let (stdout, stderr) = run("(a) = 3;");
        assert_eq!(stdout, "");
        assert_eq!(stderr, "[Line 1] Error at '=': Invalid assignment target\n");
    }

    #[test]
    fn test_self_inheritance_is_reported() {
        let (_, stderr) = run("class Foo < Foo {}");
        assert_eq!(
            stderr,
            "[Line 1] Error at 'Foo': Class cannot inherit from itself\n"
        );
    }

    #[test]
    fn test_compile_errors_prevent_execution() {
        let (stdout, stderr) = run("print 1; var;");
        assert_eq!(stdout, "", "nothing runs after a compile-time error");
        assert!(!stderr.is_empty());
    }

    #[test]
    fn test_runtime_error_stops_the_program() {
        let (stdout, stderr) = run("print 1; print 1 / 0; print 2;");
        assert_eq!(stdout, "1\n");
        assert_eq!(stderr, "[Line 1] Value cannot be zero\n");
    }

    // ── session behaviour ───────────────────────────────────────────────

    #[test]
    fn test_globals_persist_across_runs() {
        let (mut lox, out, _err) = session();

        lox.run(b"var x = 10;");
        lox.run(b"fun double(n) { return 2 * n; }");
        lox.run(b"print double(x);");

        assert_eq!(contents(&out), "20\n");
    }

    #[test]
    fn test_session_recovers_after_errors() {
        let (mut lox, out, err) = session();

        lox.run(b"{ var y = 1; print 1 / 0; }");
        assert!(lox.had_runtime_error);

        // The next run is unaffected by the aborted block.
        lox.run(b"var z = 5; print z;");
        assert!(!lox.had_error && !lox.had_runtime_error);

        assert_eq!(contents(&out), "5\n");
        assert_eq!(contents(&err), "[Line 1] Value cannot be zero\n");
    }

    #[test]
    fn test_closures_survive_across_runs() {
        let (mut lox, out, _err) = session();

        lox.run(b"fun makeCounter() { var n = 0; fun next() { n = n + 1; return n; } return next; }");
        lox.run(b"var count = makeCounter();");
        lox.run(b"print count();");
        lox.run(b"print count();");

        assert_eq!(contents(&out), "1\n2\n");
    }

    #[test]
    fn test_multiline_string_output() {
        assert_eq!(run_ok("print \"a\nb\";"), "a\nb\n");
    }
}
