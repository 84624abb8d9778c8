//! Tree‑walking evaluator.
//!
//! Statements are executed for effect and report how control left them
//! ([`Flow`]); expressions are evaluated to a [`Value`]. Variable accesses use
//! the distances recorded by the resolver: an entry means "exactly that many
//! layers up from the current environment", no entry means "global".

use std::collections::HashMap;
use std::io::{self, BufRead, BufReader, Write};
use std::rc::Rc;

use log::{debug, info};

use crate::ast::{ElseBranch, Expr, ExprId, ExprKind, IfStmt, LiteralValue, Stmt};
use crate::callable::{Callable, Class, Function};
use crate::environment::{EnvRef, Environment};
use crate::error::{EnkelError, Result};
use crate::stdlib;
use crate::token::{Token, TokenType};
use crate::value::Value;

/// How a statement finished.
#[derive(Debug, Clone)]
pub enum Flow {
    /// Fell off the end; continue with the next statement.
    Normal,

    /// A `return` is unwinding towards the nearest call boundary.
    Return(Value),
}

pub struct Interpreter {
    globals: EnvRef,
    environment: EnvRef,
    locals: HashMap<ExprId, usize>,
    output: Box<dyn Write>,
    input: Box<dyn BufRead>,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    /// An interpreter wired to the process' stdout and stdin.
    pub fn new() -> Self {
        Self::with_io(
            Box::new(io::stdout()),
            Box::new(BufReader::new(io::stdin())),
        )
    }

    /// An interpreter whose `Print`/`TypeOf` output and `Input` reads go to
    /// the given streams.
    pub fn with_io(output: Box<dyn Write>, input: Box<dyn BufRead>) -> Self {
        info!("Initializing Interpreter");

        let globals: EnvRef = stdlib::globals().into_ref();

        Self {
            environment: Rc::clone(&globals),
            globals,
            locals: HashMap::new(),
            output,
            input,
        }
    }

    pub fn globals(&self) -> &EnvRef {
        &self.globals
    }

    pub fn output(&mut self) -> &mut dyn Write {
        self.output.as_mut()
    }

    pub fn input(&mut self) -> &mut dyn BufRead {
        self.input.as_mut()
    }

    /// Resolver callback: `id` refers to a binding `depth` layers up.
    pub fn note_local(&mut self, id: ExprId, depth: usize, line: usize) -> Result<()> {
        if self.locals.contains_key(&id) {
            return Err(EnkelError::resolve(
                line,
                format!("Can't add a local expression: {:?}", id),
            ));
        }

        self.locals.insert(id, depth);
        Ok(())
    }

    /// Recorded distance for an expression, if the resolver found it local.
    pub fn distance(&self, id: ExprId) -> Option<usize> {
        self.locals.get(&id).copied()
    }

    /// Interprets a list of statements (a "program").
    pub fn interpret(&mut self, statements: &[Stmt]) -> Result<()> {
        debug!("Interpreting {} statements", statements.len());

        for stmt in statements {
            if let Flow::Return(_) = self.execute(stmt)? {
                break;
            }
        }

        self.output.flush()?;

        info!("Interpretation completed successfully");
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Statements
    // ─────────────────────────────────────────────────────────────────────────

    pub fn execute(&mut self, stmt: &Stmt) -> Result<Flow> {
        match stmt {
            Stmt::Expression(expr) => {
                self.evaluate(expr)?;
                Ok(Flow::Normal)
            }

            Stmt::Var { name, initializer } => {
                let value: Value = match initializer {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::None,
                };

                debug!("Defining variable '{}' = {}", name.lexeme, value);

                self.environment
                    .borrow_mut()
                    .define(&name.lexeme, value, name.line)?;
                Ok(Flow::Normal)
            }

            Stmt::Block(statements) => {
                let env: EnvRef = self.child_environment();
                self.execute_block(statements, env)
            }

            Stmt::If(if_stmt) => self.execute_if(if_stmt),

            Stmt::While { condition, body } => {
                debug!("Entering while loop");

                // one body environment for the whole loop, emptied after
                // every iteration
                let loop_env: EnvRef = self.child_environment();

                while self.condition(condition, "while")? {
                    let flow: Flow = self.execute_block(body, Rc::clone(&loop_env))?;

                    if let Flow::Return(_) = flow {
                        return Ok(flow);
                    }

                    loop_env.borrow_mut().clear();
                }

                debug!("Exited while loop");
                Ok(Flow::Normal)
            }

            Stmt::Function(decl) => {
                let function = Function::new(Rc::clone(decl), Rc::clone(&self.environment), false);

                self.environment.borrow_mut().define(
                    &decl.name.lexeme,
                    Value::Callable(Callable::Function(Rc::new(function))),
                    decl.name.line,
                )?;

                info!(
                    "Function '{}' defined with {} parameters",
                    decl.name.lexeme,
                    decl.params.len()
                );
                Ok(Flow::Normal)
            }

            Stmt::Return { value, .. } => {
                let value: Value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::None,
                };

                debug!("Returning value: {}", value);
                Ok(Flow::Return(value))
            }

            Stmt::Class { name, methods } => {
                // defined first so methods can refer to the class by name
                self.environment
                    .borrow_mut()
                    .define(&name.lexeme, Value::None, name.line)?;

                let mut table: HashMap<String, Function> = HashMap::new();
                for method in methods {
                    let function = Function::new(
                        Rc::clone(method),
                        Rc::clone(&self.environment),
                        method.is_constructor(),
                    );
                    table.insert(method.name.lexeme.clone(), function);
                }

                let class = Class::new(name.lexeme.clone(), table);
                self.environment.borrow_mut().assign(
                    &name.lexeme,
                    Value::Callable(Callable::Class(Rc::new(class))),
                    name.line,
                )?;

                info!("Class '{}' defined with {} method(s)", name.lexeme, methods.len());
                Ok(Flow::Normal)
            }
        }
    }

    /// Run `statements` inside `environment`, restoring the previous
    /// environment afterwards whether or not they succeed.
    pub fn execute_block(&mut self, statements: &[Stmt], environment: EnvRef) -> Result<Flow> {
        let previous: EnvRef = std::mem::replace(&mut self.environment, environment);

        let mut result: Result<Flow> = Ok(Flow::Normal);
        for stmt in statements {
            match self.execute(stmt) {
                Ok(Flow::Normal) => {}
                other => {
                    result = other;
                    break;
                }
            }
        }

        self.environment = previous;
        result
    }

    /// Walks an `if` / `else if` chain without recursing into it.
    fn execute_if(&mut self, stmt: &IfStmt) -> Result<Flow> {
        let mut current: &IfStmt = stmt;

        loop {
            if self.condition(&current.condition, "if")? {
                let env: EnvRef = self.child_environment();
                return self.execute_block(&current.then_branch, env);
            }

            match &current.else_branch {
                None => return Ok(Flow::Normal),

                Some(ElseBranch::If(next)) => current = next,

                Some(ElseBranch::Block(statements)) => {
                    let env: EnvRef = self.child_environment();
                    return self.execute_block(statements, env);
                }
            }
        }
    }

    fn condition(&mut self, expr: &Expr, construct: &str) -> Result<bool> {
        match self.evaluate(expr)? {
            Value::Bool(b) => Ok(b),
            other => Err(EnkelError::runtime(
                expr.line,
                format!(
                    "Expression result in {} statement must be a bool value, got {}",
                    construct, other
                ),
            )),
        }
    }

    fn child_environment(&self) -> EnvRef {
        Environment::with_enclosing(Rc::clone(&self.environment)).into_ref()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Expressions
    // ─────────────────────────────────────────────────────────────────────────

    pub fn evaluate(&mut self, expr: &Expr) -> Result<Value> {
        match &expr.kind {
            ExprKind::Literal(literal) => Ok(match literal {
                LiteralValue::Number(n) => Value::Number(*n),
                LiteralValue::Str(s) => Value::String(s.clone()),
                LiteralValue::Bool(b) => Value::Bool(*b),
                LiteralValue::None => Value::None,
            }),

            ExprKind::Grouping(inner) => self.evaluate(inner),

            ExprKind::Unary { operator, right } => {
                let right: Value = self.evaluate(right)?;
                evaluate_unary(operator, right)
            }

            ExprKind::Binary {
                left,
                operator,
                right,
            } => {
                let left: Value = self.evaluate(left)?;
                let right: Value = self.evaluate(right)?;
                evaluate_binary(left, operator, right)
            }

            ExprKind::Logical {
                left,
                operator,
                right,
            } => {
                let left_val: Value = self.evaluate(left)?;

                let Value::Bool(truth) = left_val else {
                    return Err(EnkelError::runtime(
                        operator.line,
                        format!(
                            "{}: expression result must be a bool type",
                            operator.lexeme
                        ),
                    ));
                };

                let short_circuit = match operator.token_type {
                    TokenType::OR => truth,
                    _ => !truth,
                };

                if short_circuit {
                    Ok(left_val)
                } else {
                    self.evaluate(right)
                }
            }

            ExprKind::Variable(name) | ExprKind::This(name) => self.look_up_variable(name, expr.id),

            ExprKind::Assign { name, value } => {
                let value: Value = self.evaluate(value)?;

                match self.distance(expr.id) {
                    Some(distance) => Environment::assign_at(
                        &self.environment,
                        distance,
                        &name.lexeme,
                        value.clone(),
                        name.line,
                    )?,
                    None => self
                        .globals
                        .borrow_mut()
                        .assign(&name.lexeme, value.clone(), name.line)?,
                }

                Ok(value)
            }

            ExprKind::Call {
                callee,
                paren,
                arguments,
            } => {
                let callee: Value = self.evaluate(callee)?;

                let mut args: Vec<Value> = Vec::with_capacity(arguments.len());
                for arg in arguments {
                    args.push(self.evaluate(arg)?);
                }

                let function: Callable = match callee {
                    Value::Callable(function) => function,
                    other => {
                        return Err(EnkelError::runtime(
                            paren.line,
                            format!("{} is not callable", other),
                        ))
                    }
                };

                if args.len() != function.arity() {
                    return Err(EnkelError::runtime(
                        paren.line,
                        format!(
                            "Expected {} arguments but got {}",
                            function.arity(),
                            args.len()
                        ),
                    ));
                }

                debug!("Calling {} with {} argument(s)", function, args.len());
                function.call(self, args, paren.line)
            }

            ExprKind::Get { object, name } => match self.evaluate(object)? {
                Value::Instance(instance) => instance.get(name),
                other => Err(EnkelError::runtime(
                    name.line,
                    format!("Only instances have properties, got {}", other),
                )),
            },

            ExprKind::Set {
                object,
                name,
                value,
            } => {
                let Value::Instance(instance) = self.evaluate(object)? else {
                    return Err(EnkelError::runtime(
                        name.line,
                        "Only instances have fields",
                    ));
                };

                let value: Value = self.evaluate(value)?;
                instance.set(name, value.clone());

                Ok(value)
            }
        }
    }

    fn look_up_variable(&self, name: &Token, id: ExprId) -> Result<Value> {
        match self.distance(id) {
            Some(distance) => Environment::get_at(&self.environment, distance, &name.lexeme, name.line),
            None => self.globals.borrow().get(&name.lexeme, name.line),
        }
    }
}

fn evaluate_unary(operator: &Token, right: Value) -> Result<Value> {
    match (&operator.token_type, right) {
        (TokenType::MINUS, Value::Number(n)) => Ok(Value::Number(-n)),
        (TokenType::MINUS, _) => Err(EnkelError::runtime(
            operator.line,
            "-: Operand must be a number",
        )),
        (TokenType::BANG, Value::Bool(b)) => Ok(Value::Bool(!b)),
        (TokenType::BANG, _) => Err(EnkelError::runtime(
            operator.line,
            "!: Operand must be a boolean",
        )),
        _ => Err(EnkelError::runtime(
            operator.line,
            format!("Invalid unary operator '{}'", operator.lexeme),
        )),
    }
}

fn evaluate_binary(left: Value, operator: &Token, right: Value) -> Result<Value> {
    let numbers_only = || {
        EnkelError::runtime(
            operator.line,
            format!("{}: Operands must be numbers", operator.lexeme),
        )
    };

    match operator.token_type {
        TokenType::PLUS => match (left, right) {
            (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
            (Value::String(a), Value::String(b)) => Ok(Value::String(a + &b)),
            _ => Err(EnkelError::runtime(
                operator.line,
                "+: Operands must be either strings or numbers",
            )),
        },

        TokenType::EQUAL_EQUAL => Ok(Value::Bool(left.is_equal(&right))),

        TokenType::BANG_EQUAL => Ok(Value::Bool(!left.is_equal(&right))),

        _ => {
            let (Value::Number(a), Value::Number(b)) = (left, right) else {
                return Err(numbers_only());
            };

            match operator.token_type {
                TokenType::MINUS => Ok(Value::Number(a - b)),
                TokenType::STAR => Ok(Value::Number(a * b)),
                TokenType::SLASH => {
                    if b == 0.0 {
                        Err(EnkelError::runtime(operator.line, "/: Division by zero"))
                    } else {
                        Ok(Value::Number(a / b))
                    }
                }
                TokenType::GREATER => Ok(Value::Bool(a > b)),
                TokenType::GREATER_EQUAL => Ok(Value::Bool(a >= b)),
                TokenType::LESS => Ok(Value::Bool(a < b)),
                TokenType::LESS_EQUAL => Ok(Value::Bool(a <= b)),
                _ => Err(EnkelError::runtime(
                    operator.line,
                    format!("Invalid binary operator '{}'", operator.lexeme),
                )),
            }
        }
    }
}
