#[cfg(test)]
mod parser_tests {
    use enkel::ast::{Expr, ExprKind, Stmt};
    use enkel::ast_printer::AstPrinter;
    use enkel::error::EnkelError;
    use enkel::lexer::tokenize;
    use enkel::parser::Parser;
    use pretty_assertions::assert_eq;

    fn parse(source: &str) -> Result<Vec<Stmt>, EnkelError> {
        let tokens = tokenize(source)?;
        Parser::new(&tokens).parse()
    }

    fn printed(source: &str) -> String {
        let statements = parse(source).expect("source should parse");
        AstPrinter::print_program(&statements)
    }

    fn parse_err(source: &str) -> EnkelError {
        match parse(source) {
            Ok(statements) => panic!(
                "expected a parse error, got {}",
                AstPrinter::print_program(&statements)
            ),
            Err(e) => e,
        }
    }

    #[test]
    fn precedence_binds_factor_over_term() {
        assert_eq!(printed("1 + 2 * 3;"), "(expr (+ 1.0 (* 2.0 3.0)))");
        assert_eq!(
            printed("1 < 2 == 3 >= 4;"),
            "(expr (== (< 1.0 2.0) (>= 3.0 4.0)))"
        );
    }

    #[test]
    fn binary_operators_are_left_associative() {
        assert_eq!(printed("8 - 4 - 2;"), "(expr (- (- 8.0 4.0) 2.0))");
        assert_eq!(printed("8 / 4 * 2;"), "(expr (* (/ 8.0 4.0) 2.0))");
    }

    #[test]
    fn grouping_and_unary() {
        assert_eq!(
            printed("-(1 + 2) * !true;"),
            "(expr (* (- (group (+ 1.0 2.0))) (! true)))"
        );
        assert_eq!(printed("!!false;"), "(expr (! (! false)))");
        assert_eq!(printed("2.5;"), "(expr 2.5)");
    }

    #[test]
    fn and_binds_tighter_than_or() {
        assert_eq!(
            printed("a or b and c;"),
            "(expr (or a (and b c)))"
        );
        assert_eq!(
            printed("a == 1 and b;"),
            "(expr (and (== a 1.0) b))"
        );
    }

    #[test]
    fn assignment_is_right_associative() {
        assert_eq!(printed("a = b = 3;"), "(expr (= a (= b 3.0)))");
    }

    #[test]
    fn property_assignment_becomes_set() {
        assert_eq!(
            printed("obj.inner.field = \"v\";"),
            "(expr (set (. obj inner) field \"v\"))"
        );
    }

    #[test]
    fn invalid_assignment_target() {
        let err = parse_err("1 + 2 = 3;");

        match &err {
            EnkelError::Parse {
                expected,
                found,
                line,
            } => {
                assert_eq!(expected, "Invalid assignment target");
                assert_eq!(found, "'='");
                assert_eq!(*line, 1);
            }
            other => panic!("expected a parse error, got {:?}", other),
        }

        assert_eq!(
            err.to_string(),
            "[line 1] Error at '=': Invalid assignment target"
        );
    }

    #[test]
    fn call_chains() {
        assert_eq!(
            printed("make(1)(2, \"x\").name();"),
            "(expr (call (. (call (call make 1.0) 2.0 \"x\") name)))"
        );
        assert_eq!(printed("f();"), "(expr (call f))");
    }

    #[test]
    fn var_declarations() {
        assert_eq!(
            printed("var a;\nvar b = a;"),
            "(var a)\n(var b a)"
        );
    }

    #[test]
    fn for_loop_is_desugared_into_while() {
        assert_eq!(
            printed("for (var i = 0; i < 3; i = i + 1) { Print(i); }"),
            "(block (var i 0.0) (while (< i 3.0) (do (block (expr (call Print i))) (expr (= i (+ i 1.0))))))"
        );
    }

    #[test]
    fn for_loop_clauses_are_optional() {
        assert_eq!(printed("for (;;) {}"), "(while true (do))");
        assert_eq!(
            printed("for (i = 0; i < 1;) { i = 1; }"),
            "(block (expr (= i 0.0)) (while (< i 1.0) (do (expr (= i 1.0)))))"
        );
    }

    #[test]
    fn while_statement() {
        assert_eq!(
            printed("while (x) { x = false; }"),
            "(while x (do (expr (= x false))))"
        );
    }

    #[test]
    fn else_if_chains_nest_in_the_else_slot() {
        assert_eq!(
            printed("if (a) { 1; } else if (b) { 2; } else { 3; }"),
            "(if a (then (expr 1.0)) (else (if b (then (expr 2.0)) (else (expr 3.0)))))"
        );
        assert_eq!(printed("if (a) {}"), "(if a (then))");
    }

    #[test]
    fn bodies_require_braces() {
        assert!(matches!(parse_err("if (a) Print(1);"), EnkelError::Parse { .. }));
        assert!(matches!(parse_err("while (a) a = false;"), EnkelError::Parse { .. }));
    }

    #[test]
    fn functions_and_returns() {
        assert_eq!(
            printed("func add(a, b) { return a + b; }\nfunc nop() { return; }"),
            "(func add (a b) (body (return (+ a b))))\n(func nop () (body (return)))"
        );
    }

    #[test]
    fn class_declaration() {
        assert_eq!(
            printed("class Point { constructor(x) { this.x = x; } len() { return this.x; } }"),
            "(class Point (func constructor (x) (body (expr (set this x x)))) (func len () (body (return (. this x)))))"
        );
        assert_eq!(printed("class Empty {}"), "(class Empty)");
    }

    #[test]
    fn missing_token_reports_end_of_input() {
        let err = parse_err("var x = 1");

        match &err {
            EnkelError::Parse { found, expected, .. } => {
                assert_eq!(found, "end");
                assert_eq!(expected, "Expected ';' after variable declaration");
            }
            other => panic!("expected a parse error, got {:?}", other),
        }
    }

    #[test]
    fn missing_token_reports_the_offending_lexeme() {
        let err = parse_err("var = 1;");

        assert_eq!(
            err.to_string(),
            "[line 1] Error at '=': Expected variable identifier"
        );
    }

    #[test]
    fn parent_is_reserved() {
        assert!(matches!(parse_err("var parent = 1;"), EnkelError::Parse { .. }));
        assert!(matches!(parse_err("parent;"), EnkelError::Parse { .. }));
    }

    fn collect_ids(expr: &Expr, out: &mut Vec<usize>) {
        out.push(expr.id.0);

        match &expr.kind {
            ExprKind::Grouping(inner) | ExprKind::Unary { right: inner, .. } => {
                collect_ids(inner, out)
            }
            ExprKind::Binary { left, right, .. } | ExprKind::Logical { left, right, .. } => {
                collect_ids(left, out);
                collect_ids(right, out);
            }
            ExprKind::Assign { value, .. } => collect_ids(value, out),
            ExprKind::Call {
                callee, arguments, ..
            } => {
                collect_ids(callee, out);
                arguments.iter().for_each(|a| collect_ids(a, out));
            }
            ExprKind::Get { object, .. } => collect_ids(object, out),
            ExprKind::Set { object, value, .. } => {
                collect_ids(object, out);
                collect_ids(value, out);
            }
            ExprKind::Literal(_) | ExprKind::Variable(_) | ExprKind::This(_) => {}
        }
    }

    #[test]
    fn expression_ids_are_unique() {
        let statements = parse("a + a * (a - a);\nf(a, a).b = a;").unwrap();

        let mut ids = Vec::new();
        for stmt in &statements {
            if let Stmt::Expression(expr) = stmt {
                collect_ids(expr, &mut ids);
            }
        }

        let mut deduped = ids.clone();
        deduped.sort_unstable();
        deduped.dedup();

        assert_eq!(deduped.len(), ids.len());
    }

    #[test]
    fn numbering_continues_from_the_first_id() {
        let tokens = tokenize("a;").unwrap();
        let mut parser = Parser::new(&tokens).with_first_id(40);
        let statements = parser.parse().unwrap();

        match &statements[0] {
            Stmt::Expression(expr) => assert_eq!(expr.id.0, 40),
            other => panic!("expected an expression statement, got {:?}", other),
        }
        assert_eq!(parser.next_id(), 41);
    }
}
