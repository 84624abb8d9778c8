#[cfg(test)]
mod resolver_tests {
    use enkel::ast::{ElseBranch, Expr, ExprId, ExprKind, IfStmt, Stmt};
    use enkel::error::EnkelError;
    use enkel::interpreter::Interpreter;
    use enkel::lexer::tokenize;
    use enkel::parser::Parser;
    use enkel::resolver::Resolver;
    use pretty_assertions::assert_eq;

    /// Every variable read, assignment and `this`, in source order.
    #[derive(Default)]
    struct References(Vec<(String, ExprId)>);

    impl References {
        fn stmts(&mut self, statements: &[Stmt]) {
            statements.iter().for_each(|s| self.stmt(s));
        }

        fn stmt(&mut self, stmt: &Stmt) {
            match stmt {
                Stmt::Expression(expr) => self.expr(expr),
                Stmt::Var { initializer, .. } => {
                    if let Some(expr) = initializer {
                        self.expr(expr);
                    }
                }
                Stmt::Block(statements) => self.stmts(statements),
                Stmt::If(if_stmt) => self.if_stmt(if_stmt),
                Stmt::While { condition, body } => {
                    self.expr(condition);
                    self.stmts(body);
                }
                Stmt::Function(decl) => self.stmts(&decl.body),
                Stmt::Return { value, .. } => {
                    if let Some(expr) = value {
                        self.expr(expr);
                    }
                }
                Stmt::Class { methods, .. } => {
                    methods.iter().for_each(|m| self.stmts(&m.body));
                }
            }
        }

        fn if_stmt(&mut self, stmt: &IfStmt) {
            self.expr(&stmt.condition);
            self.stmts(&stmt.then_branch);
            match &stmt.else_branch {
                Some(ElseBranch::If(next)) => self.if_stmt(next),
                Some(ElseBranch::Block(statements)) => self.stmts(statements),
                None => {}
            }
        }

        fn expr(&mut self, expr: &Expr) {
            match &expr.kind {
                ExprKind::Variable(name) | ExprKind::This(name) => {
                    self.0.push((name.lexeme.clone(), expr.id))
                }
                ExprKind::Assign { name, value } => {
                    self.0.push((name.lexeme.clone(), expr.id));
                    self.expr(value);
                }
                ExprKind::Literal(_) => {}
                ExprKind::Grouping(inner) | ExprKind::Unary { right: inner, .. } => {
                    self.expr(inner)
                }
                ExprKind::Binary { left, right, .. } | ExprKind::Logical { left, right, .. } => {
                    self.expr(left);
                    self.expr(right);
                }
                ExprKind::Call {
                    callee, arguments, ..
                } => {
                    self.expr(callee);
                    arguments.iter().for_each(|a| self.expr(a));
                }
                ExprKind::Get { object, .. } => self.expr(object),
                ExprKind::Set { object, value, .. } => {
                    self.expr(object);
                    self.expr(value);
                }
            }
        }
    }

    fn resolve(source: &str) -> Result<Vec<(String, Option<usize>)>, EnkelError> {
        let tokens = tokenize(source)?;
        let statements = Parser::new(&tokens).parse()?;

        let mut interpreter = Interpreter::new();
        Resolver::new(&mut interpreter).resolve(&statements)?;

        let mut refs = References::default();
        refs.stmts(&statements);

        Ok(refs
            .0
            .into_iter()
            .map(|(name, id)| (name, interpreter.distance(id)))
            .collect())
    }

    fn distances(source: &str) -> Vec<(String, Option<usize>)> {
        resolve(source).expect("source should resolve")
    }

    fn resolve_err(source: &str) -> String {
        match resolve(source) {
            Ok(_) => panic!("expected a resolve error for {:?}", source),
            Err(e @ EnkelError::Resolve { .. }) => e.to_string(),
            Err(other) => panic!("expected a resolve error, got {:?}", other),
        }
    }

    fn expect(pairs: &[(&str, Option<usize>)]) -> Vec<(String, Option<usize>)> {
        pairs.iter().map(|(n, d)| (n.to_string(), *d)).collect()
    }

    #[test]
    fn globals_are_left_unrecorded() {
        assert_eq!(
            distances("var a = 1;\na;\na = 2;\nPrint(a);"),
            expect(&[("a", None), ("a", None), ("Print", None), ("a", None)])
        );
    }

    #[test]
    fn nested_blocks_count_layers() {
        assert_eq!(
            distances("{ var a = 1; { var b = a; { a; b; } } }"),
            expect(&[("a", Some(1)), ("a", Some(2)), ("b", Some(1))])
        );
    }

    #[test]
    fn closures_reach_into_the_defining_function() {
        assert_eq!(
            distances(
                "func outer() {\n  var x = 1;\n  func inner() { return x; }\n  return inner;\n}"
            ),
            expect(&[("x", Some(1)), ("inner", Some(0))])
        );
    }

    #[test]
    fn parameters_share_the_body_scope() {
        assert_eq!(
            distances("func f(a) { var b = a; { a; } }"),
            expect(&[("a", Some(0)), ("a", Some(1))])
        );
    }

    #[test]
    fn this_lives_one_layer_above_the_method() {
        assert_eq!(
            distances("class A { get() { return this; } nested() { { this; } } }"),
            expect(&[("this", Some(1)), ("this", Some(2))])
        );
    }

    #[test]
    fn while_body_is_its_own_scope() {
        assert_eq!(
            distances("{ var i = 0; while (i < 3) { var j = i; i = i + 1; } }"),
            expect(&[
                ("i", Some(0)),
                ("i", Some(1)),
                ("i", Some(1)),
                ("i", Some(1)),
            ])
        );
    }

    #[test]
    fn for_loop_layers_match_the_desugaring() {
        assert_eq!(
            distances("for (var i = 0; i < 2; i = i + 1) { Print(i); }"),
            expect(&[
                ("i", Some(0)),
                ("Print", None),
                ("i", Some(2)),
                ("i", Some(1)),
                ("i", Some(1)),
            ])
        );
    }

    #[test]
    fn if_branches_are_scoped() {
        assert_eq!(
            distances("{ var a = true; if (a) { a; } else if (a) { a; } else { a; } }"),
            expect(&[
                ("a", Some(0)),
                ("a", Some(1)),
                ("a", Some(0)),
                ("a", Some(1)),
                ("a", Some(1)),
            ])
        );
    }

    #[test]
    fn shadowing_in_an_inner_scope_is_allowed() {
        assert_eq!(
            distances("{ var a = 1; { var a = 2; a; } }"),
            expect(&[("a", Some(0))])
        );
    }

    #[test]
    fn global_redeclaration_is_left_to_runtime() {
        assert!(resolve("var a = 1; var a = 2;").is_ok());
        assert!(resolve("var a = a;").is_ok());
    }

    #[test]
    fn local_redeclaration_fails() {
        assert_eq!(
            resolve_err("{\n  var a = 1;\n  var a = 2;\n}"),
            "[line 3] Error: Attempt to redeclare an identifier: a"
        );
    }

    #[test]
    fn duplicate_parameters_fail() {
        assert_eq!(
            resolve_err("func f(a, a) {}"),
            "[line 1] Error: Attempt to redeclare an identifier: a"
        );
    }

    #[test]
    fn self_initialisation_fails() {
        assert_eq!(
            resolve_err("{ var a = a; }"),
            "[line 1] Error: Can't initialize local variable with itself"
        );
    }

    #[test]
    fn this_outside_a_class_fails() {
        let expected = "[line 1] Error: Can't use 'this' outside of a class";

        assert_eq!(resolve_err("this;"), expected);
        assert_eq!(resolve_err("func f() { return this; }"), expected);
    }

    #[test]
    fn top_level_return_fails() {
        assert_eq!(
            resolve_err("return 1;"),
            "[line 1] Error: Unexpected return outside a function"
        );
    }

    #[test]
    fn constructor_may_not_return_a_value() {
        assert_eq!(
            resolve_err("class A {\n  constructor() { return 1; }\n}"),
            "[line 2] Error: Can't return a value from a constructor"
        );
        assert!(resolve("class A { constructor() { return; } }").is_ok());
    }

    #[test]
    fn constructor_cannot_be_called_directly() {
        assert_eq!(
            resolve_err("class A { constructor() {} }\nvar a = A();\na.constructor();"),
            "[line 3] Error: A constructor can't be called directly"
        );
    }

    #[test]
    fn duplicate_methods_fail() {
        assert_eq!(
            resolve_err("class A {\n  m() {}\n  m() {}\n}"),
            "[line 3] Error: Method 'm' is declared twice in class A"
        );
    }

    #[test]
    fn resolve_errors_are_static() {
        let err = resolve("return;").unwrap_err();

        assert!(err.is_static());
        assert_eq!(err.line(), Some(1));
    }
}
