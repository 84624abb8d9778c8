//! Static resolver pass for the **Enkel** interpreter.
//!
//! This resolver does three things in one AST walk:
//! 1. Build lexical scopes (stack of `HashMap<String, bool>` tracking declared/defined).
//! 2. Report static errors (redeclaration, self‑initialisation, misplaced
//!    `this` / `return`, explicit constructor calls, duplicate methods).
//! 3. Tell the interpreter, for each variable, assignment and `this`
//!    occurrence, how many scopes up its binding lives. Occurrences found in
//!    no scope are left unrecorded and looked up as globals at run time.

use crate::ast::{ElseBranch, Expr, ExprId, ExprKind, FunctionDecl, IfStmt, Stmt};
use crate::callable::Class;
use crate::error::{EnkelError, Result};
use crate::interpreter::Interpreter;
use crate::token::Token;
use log::{debug, info};
use std::collections::{HashMap, HashSet};

/// What kind of body are we in? Used to validate `return`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum FunctionType {
    None,
    Function,
    Method,
    Constructor,
}

/// Are we inside a class body? Used to validate `this`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum ClassType {
    None,
    Class,
}

/// Resolver: tracks scopes, enforces static rules, and *records* binding
/// distances by calling back into the interpreter.
pub struct Resolver<'interp> {
    interpreter: &'interp mut Interpreter,
    scopes: Vec<HashMap<String, bool>>, // false=declared, true=defined
    current_function: FunctionType,
    current_class: ClassType,
    line: usize, // last line seen, for errors without a token of their own
}

impl<'interp> Resolver<'interp> {
    /// Create a new resolver bound to the given interpreter.
    pub fn new(interpreter: &'interp mut Interpreter) -> Self {
        info!("Resolver instantiated");

        Resolver {
            interpreter,
            scopes: Vec::new(),
            current_function: FunctionType::None,
            current_class: ClassType::None,
            line: 0,
        }
    }

    /// Walk all top‑level statements.
    pub fn resolve(&mut self, statements: &[Stmt]) -> Result<()> {
        info!(
            "Beginning resolve pass over {} statement(s)",
            statements.len()
        );

        self.resolve_stmts(statements)
    }

    fn resolve_stmts(&mut self, statements: &[Stmt]) -> Result<()> {
        for stmt in statements {
            self.resolve_stmt(stmt)?;
        }
        Ok(())
    }

    /// Resolve `statements` inside a fresh scope.
    fn resolve_scoped(&mut self, statements: &[Stmt]) -> Result<()> {
        self.begin_scope();
        self.resolve_stmts(statements)?;
        self.end_scope()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Statement resolution
    // ─────────────────────────────────────────────────────────────────────────

    fn resolve_stmt(&mut self, stmt: &Stmt) -> Result<()> {
        match stmt {
            Stmt::Block(statements) => self.resolve_scoped(statements)?,

            Stmt::Var { name, initializer } => {
                // declare → resolve initializer → define
                self.declare(name)?;
                if let Some(expr) = initializer {
                    self.resolve_expr(expr)?;
                }
                self.define(name)?;
            }

            Stmt::Function(decl) => {
                // the name is visible inside its own body
                self.declare(&decl.name)?;
                self.define(&decl.name)?;
                self.resolve_function(decl, FunctionType::Function)?;
            }

            Stmt::Expression(expr) => self.resolve_expr(expr)?,

            Stmt::If(if_stmt) => self.resolve_if(if_stmt)?,

            Stmt::While { condition, body } => {
                self.resolve_expr(condition)?;
                self.resolve_scoped(body)?;
            }

            Stmt::Return { keyword, value } => {
                if self.current_function == FunctionType::None {
                    return Err(EnkelError::resolve(
                        keyword.line,
                        "Unexpected return outside a function",
                    ));
                }

                if let Some(expr) = value {
                    if self.current_function == FunctionType::Constructor {
                        return Err(EnkelError::resolve(
                            keyword.line,
                            "Can't return a value from a constructor",
                        ));
                    }

                    self.resolve_expr(expr)?;
                }
            }

            Stmt::Class { name, methods } => self.resolve_class(name, methods)?,
        }

        Ok(())
    }

    fn resolve_if(&mut self, stmt: &IfStmt) -> Result<()> {
        let mut current: &IfStmt = stmt;

        loop {
            self.resolve_expr(&current.condition)?;
            self.resolve_scoped(&current.then_branch)?;

            match &current.else_branch {
                None => return Ok(()),
                Some(ElseBranch::If(next)) => current = next,
                Some(ElseBranch::Block(statements)) => return self.resolve_scoped(statements),
            }
        }
    }

    fn resolve_class(&mut self, name: &Token, methods: &[std::rc::Rc<FunctionDecl>]) -> Result<()> {
        self.declare(name)?;
        self.define(name)?;

        let mut seen: HashSet<&str> = HashSet::new();
        for method in methods {
            if !seen.insert(method.name.lexeme.as_str()) {
                return Err(EnkelError::resolve(
                    method.name.line,
                    format!(
                        "Method '{}' is declared twice in class {}",
                        method.name.lexeme, name.lexeme
                    ),
                ));
            }
        }

        let enclosing_class = self.current_class;
        self.current_class = ClassType::Class;

        self.begin_scope();
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert("this".to_string(), true);
        }

        for method in methods {
            let kind = if method.name.lexeme == Class::CONSTRUCTOR {
                FunctionType::Constructor
            } else {
                FunctionType::Method
            };

            self.resolve_function(method, kind)?;
        }

        self.end_scope()?;
        self.current_class = enclosing_class;

        debug!("Resolved class '{}'", name.lexeme);
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Expression resolution
    // ─────────────────────────────────────────────────────────────────────────

    fn resolve_expr(&mut self, expr: &Expr) -> Result<()> {
        self.line = expr.line;

        match &expr.kind {
            ExprKind::Literal(_) => {}

            ExprKind::Grouping(inner) => self.resolve_expr(inner)?,

            ExprKind::Unary { right, .. } => self.resolve_expr(right)?,

            ExprKind::Binary { left, right, .. } | ExprKind::Logical { left, right, .. } => {
                self.resolve_expr(left)?;
                self.resolve_expr(right)?;
            }

            ExprKind::Variable(name) => {
                if let Some(scope) = self.scopes.last() {
                    if scope.get(&name.lexeme) == Some(&false) {
                        return Err(EnkelError::resolve(
                            name.line,
                            "Can't initialize local variable with itself",
                        ));
                    }
                }

                self.resolve_local(expr.id, name)?;
            }

            ExprKind::Assign { name, value } => {
                // right‑hand side first, then the target
                self.resolve_expr(value)?;
                self.resolve_local(expr.id, name)?;
            }

            ExprKind::This(keyword) => {
                if self.current_class == ClassType::None {
                    return Err(EnkelError::resolve(
                        keyword.line,
                        "Can't use 'this' outside of a class",
                    ));
                }

                self.resolve_local(expr.id, keyword)?;
            }

            ExprKind::Call {
                callee, arguments, ..
            } => {
                if let ExprKind::Get { name, .. } = &callee.kind {
                    if name.lexeme == Class::CONSTRUCTOR {
                        return Err(EnkelError::resolve(
                            name.line,
                            "A constructor can't be called directly",
                        ));
                    }
                }

                self.resolve_expr(callee)?;
                for arg in arguments {
                    self.resolve_expr(arg)?;
                }
            }

            ExprKind::Get { object, .. } => self.resolve_expr(object)?,

            ExprKind::Set { object, value, .. } => {
                self.resolve_expr(value)?;
                self.resolve_expr(object)?;
            }
        }

        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Function helper
    // ─────────────────────────────────────────────────────────────────────────

    /// Parameters and body share one fresh scope, mirroring the single
    /// environment a call creates.
    fn resolve_function(&mut self, decl: &FunctionDecl, kind: FunctionType) -> Result<()> {
        let enclosing = self.current_function;
        self.current_function = kind;

        self.begin_scope();
        for param in &decl.params {
            self.declare(param)?;
            self.define(param)?;
        }
        self.resolve_stmts(&decl.body)?;
        self.end_scope()?;

        self.current_function = enclosing;
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Scope management
    // ─────────────────────────────────────────────────────────────────────────

    #[inline]
    fn begin_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    fn end_scope(&mut self) -> Result<()> {
        match self.scopes.pop() {
            Some(_) => Ok(()),
            None => Err(EnkelError::resolve(self.line, "Can't close the scope")),
        }
    }

    fn declare(&mut self, name: &Token) -> Result<()> {
        self.line = name.line;

        if let Some(scope) = self.scopes.last_mut() {
            if scope.contains_key(&name.lexeme) {
                return Err(EnkelError::resolve(
                    name.line,
                    format!("Attempt to redeclare an identifier: {}", name.lexeme),
                ));
            }
            scope.insert(name.lexeme.clone(), false);
        }
        Ok(())
    }

    fn define(&mut self, name: &Token) -> Result<()> {
        if let Some(scope) = self.scopes.last_mut() {
            match scope.get_mut(&name.lexeme) {
                Some(ready) => *ready = true,
                None => {
                    return Err(EnkelError::resolve(
                        name.line,
                        format!("Attempt to define an undeclared variable: {}", name.lexeme),
                    ))
                }
            }
        }
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Binding‑distance helper
    // ─────────────────────────────────────────────────────────────────────────

    /// Record this occurrence as a local at depth `d`, or leave it
    /// unrecorded (global) when no scope declares the name.
    fn resolve_local(&mut self, id: ExprId, name: &Token) -> Result<()> {
        for (depth, scope) in self.scopes.iter().rev().enumerate() {
            if scope.contains_key(&name.lexeme) {
                debug!("Resolved '{}' at depth {}", name.lexeme, depth);
                return self.interpreter.note_local(id, depth, name.line);
            }
        }

        debug!("Resolved '{}' as global", name.lexeme);
        Ok(())
    }
}
