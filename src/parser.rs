/*!
Recursive‑descent parser for Enkel.

Time is Θ(n) in the number of tokens: every production consumes tokens
through `advance()` and never rescans. The parser fails fast: the first
missing token aborts the whole parse, there is no synchronisation.

Grammar (EBNF)
--------------

```text
program        → declaration* EOF ;
declaration    → varDecl | funcDecl | classDecl | statement ;
varDecl        → "var" IDENT ( "=" expression )? ";" ;
funcDecl       → "func" function ;
classDecl      → "class" IDENT "{" function* "}" ;
function       → IDENT "(" parameters? ")" "{" declaration* "}" ;
parameters     → IDENT ( "," IDENT )* ;
statement      → ifStmt | whileStmt | forStmt | returnStmt
               | "{" declaration* "}" | exprStmt ;
ifStmt         → "if" "(" expression ")" block
               ( "else" ( "if" ifRest | block ) )? ;
whileStmt      → "while" "(" expression ")" block ;
forStmt        → "for" "(" ( varDecl | exprStmt | ";" )
                 expression? ";" expression? ")" block ;
returnStmt     → "return" expression? ";" ;
exprStmt       → expression ";" ;
expression     → assignment ;
assignment     → ( call "." )? IDENT "=" assignment | logic_or ;
logic_or       → logic_and ( "or" logic_and )* ;
logic_and      → equality  ( "and" equality )* ;
equality       → comparison ( ( "!=" | "==" ) comparison )* ;
comparison     → term ( ( ">" | ">=" | "<" | "<=" ) term )* ;
term           → factor ( ( "-" | "+" ) factor )* ;
factor         → unary ( ( "/" | "*" ) unary )* ;
unary          → ( "!" | "-" ) unary | call ;
call           → primary ( "(" arguments? ")" | "." IDENT )* ;
arguments      → expression ( "," expression )* ;
primary        → NUMBER | STRING | "true" | "false" | "none" | "this"
               | IDENT | "(" expression ")" ;
```

`for` has no node of its own; it is rewritten into a `while` here.
*/

use std::rc::Rc;

use crate::ast::{ElseBranch, Expr, ExprId, ExprKind, FunctionDecl, IfStmt, LiteralValue, Stmt};
use crate::error::{EnkelError, Result};
use crate::token::{Token, TokenType};

use log::{debug, info};

/// Parser over an immutable slice of tokens ending in `EOF`.
pub struct Parser<'t> {
    tokens: &'t [Token],
    current: usize,
    next_id: usize,
}

impl<'t> Parser<'t> {
    /// Construct a new parser. `tokens` must end with an `EOF` token.
    pub fn new(tokens: &'t [Token]) -> Self {
        info!("Parser created with {} tokens", tokens.len());

        Self {
            tokens,
            current: 0,
            next_id: 0,
        }
    }

    /// Start numbering expression ids at `first`. A session parsing several
    /// programs against one interpreter uses this to keep ids unique.
    pub fn with_first_id(mut self, first: usize) -> Self {
        self.next_id = first;
        self
    }

    /// The first id not yet handed out.
    pub fn next_id(&self) -> usize {
        self.next_id
    }

    // ───────────────────────── public API ─────────────────────────

    /// Parse an entire program and return its statement list.
    pub fn parse(&mut self) -> Result<Vec<Stmt>> {
        info!("Beginning parse phase");

        let mut statements: Vec<Stmt> = Vec::new();

        while !self.is_at_end() {
            statements.push(self.declaration()?);
        }

        info!("Parsed {} top-level statement(s)", statements.len());

        Ok(statements)
    }

    // ──────────────────────── declaration rules ───────────────────

    fn declaration(&mut self) -> Result<Stmt> {
        debug!("Entering declaration at line {}", self.peek().line);

        if self.matches(TokenType::VAR) {
            self.var_declaration()
        } else if self.matches(TokenType::FUNC) {
            Ok(Stmt::Function(Rc::new(self.function()?)))
        } else if self.matches(TokenType::CLASS) {
            self.class_declaration()
        } else {
            self.statement()
        }
    }

    fn var_declaration(&mut self) -> Result<Stmt> {
        let name: Token = self
            .consume(TokenType::IDENTIFIER, "Expected variable identifier")?
            .clone();

        let initializer: Option<Expr> = if self.matches(TokenType::EQUAL) {
            Some(self.expression()?)
        } else {
            None
        };

        self.consume(
            TokenType::SEMICOLON,
            "Expected ';' after variable declaration",
        )?;

        Ok(Stmt::Var { name, initializer })
    }

    /// Shared by `func` declarations and class methods.
    fn function(&mut self) -> Result<FunctionDecl> {
        let name: Token = self
            .consume(TokenType::IDENTIFIER, "Expected a function name")?
            .clone();

        self.consume(
            TokenType::LEFT_PAREN,
            "Expected '(' after function declaration",
        )?;

        let mut params: Vec<Token> = Vec::new();
        if !self.check(TokenType::RIGHT_PAREN) {
            loop {
                params.push(
                    self.consume(TokenType::IDENTIFIER, "Expected a parameter name")?
                        .clone(),
                );

                if !self.matches(TokenType::COMMA) {
                    break;
                }
            }
        }

        self.consume(TokenType::RIGHT_PAREN, "Expected ')' after function params")?;
        self.consume(TokenType::LEFT_BRACE, "Expected '{' before function body")?;

        let body: Vec<Stmt> = self.block()?;

        debug!(
            "Parsed function '{}' with {} parameter(s)",
            name.lexeme,
            params.len()
        );

        Ok(FunctionDecl { name, params, body })
    }

    fn class_declaration(&mut self) -> Result<Stmt> {
        let name: Token = self
            .consume(TokenType::IDENTIFIER, "Expected class name")?
            .clone();

        self.consume(TokenType::LEFT_BRACE, "Expected '{' before class body")?;

        let mut methods: Vec<Rc<FunctionDecl>> = Vec::new();

        while !self.check(TokenType::RIGHT_BRACE) && !self.is_at_end() {
            methods.push(Rc::new(self.function()?));
        }

        self.consume(TokenType::RIGHT_BRACE, "Expected '}' after class body")?;

        Ok(Stmt::Class { name, methods })
    }

    // ───────────────────────── statement rules ────────────────────

    fn statement(&mut self) -> Result<Stmt> {
        if self.matches(TokenType::IF) {
            Ok(Stmt::If(self.if_statement()?))
        } else if self.matches(TokenType::WHILE) {
            self.while_statement()
        } else if self.matches(TokenType::FOR) {
            self.for_statement()
        } else if self.matches(TokenType::RETURN) {
            self.return_statement()
        } else if self.matches(TokenType::LEFT_BRACE) {
            Ok(Stmt::Block(self.block()?))
        } else {
            self.expression_statement()
        }
    }

    /// Parses everything after the `if` keyword; `else if` recurses here so
    /// the chain ends up nested in the else slot.
    fn if_statement(&mut self) -> Result<IfStmt> {
        self.consume(TokenType::LEFT_PAREN, "Expected '(' after if statement")?;
        let condition: Expr = self.expression()?;
        self.consume(
            TokenType::RIGHT_PAREN,
            "Expected enclosing ')' after expression in if statement",
        )?;
        self.consume(TokenType::LEFT_BRACE, "Expected '{' after if condition")?;

        let then_branch: Vec<Stmt> = self.block()?;

        let else_branch: Option<ElseBranch> = if !self.matches(TokenType::ELSE) {
            None
        } else if self.matches(TokenType::IF) {
            Some(ElseBranch::If(Box::new(self.if_statement()?)))
        } else {
            self.consume(TokenType::LEFT_BRACE, "Expected '{' after else")?;
            Some(ElseBranch::Block(self.block()?))
        };

        Ok(IfStmt {
            condition,
            then_branch,
            else_branch,
        })
    }

    fn while_statement(&mut self) -> Result<Stmt> {
        self.consume(TokenType::LEFT_PAREN, "Expected '(' after while statement")?;
        let condition: Expr = self.expression()?;
        self.consume(
            TokenType::RIGHT_PAREN,
            "Expected enclosing ')' after expression in while statement",
        )?;
        self.consume(TokenType::LEFT_BRACE, "Expected '{' after while condition")?;

        let body: Vec<Stmt> = self.block()?;

        Ok(Stmt::While { condition, body })
    }

    /// `for (init; cond; action) { body }` becomes
    /// `{ init; while (cond) { { body } action; } }`.
    fn for_statement(&mut self) -> Result<Stmt> {
        let keyword_line: usize = self.previous().line;

        self.consume(TokenType::LEFT_PAREN, "Expected '(' after for statement")?;

        let initializer: Option<Stmt> = if self.matches(TokenType::SEMICOLON) {
            None
        } else if self.matches(TokenType::VAR) {
            Some(self.var_declaration()?)
        } else {
            Some(self.expression_statement()?)
        };

        let condition: Expr = if !self.check(TokenType::SEMICOLON) {
            self.expression()?
        } else {
            self.make_expr(keyword_line, ExprKind::Literal(LiteralValue::Bool(true)))
        };

        self.consume(TokenType::SEMICOLON, "Expected ';' after for loop condition")?;

        let action: Option<Expr> = if !self.check(TokenType::RIGHT_PAREN) {
            Some(self.expression()?)
        } else {
            None
        };

        self.consume(TokenType::RIGHT_PAREN, "Expected ')' after for loop")?;
        self.consume(TokenType::LEFT_BRACE, "Expected '{' in for loop body")?;

        let mut body: Vec<Stmt> = self.block()?;

        if let Some(action) = action {
            body = vec![Stmt::Block(body), Stmt::Expression(action)];
        }

        let looped = Stmt::While { condition, body };

        debug!("Desugared for loop at line {}", keyword_line);

        Ok(match initializer {
            Some(init) => Stmt::Block(vec![init, looped]),
            None => looped,
        })
    }

    fn return_statement(&mut self) -> Result<Stmt> {
        let keyword: Token = self.previous().clone();

        let value: Option<Expr> = if !self.check(TokenType::SEMICOLON) {
            Some(self.expression()?)
        } else {
            None
        };

        self.consume(TokenType::SEMICOLON, "Expected ';' after return statement")?;

        Ok(Stmt::Return { keyword, value })
    }

    fn expression_statement(&mut self) -> Result<Stmt> {
        let expr: Expr = self.expression()?;
        self.consume(TokenType::SEMICOLON, "Expected ';' after expression")?;
        Ok(Stmt::Expression(expr))
    }

    /// Statements up to the closing `}`; the opening brace is already consumed.
    fn block(&mut self) -> Result<Vec<Stmt>> {
        let mut statements: Vec<Stmt> = Vec::new();

        while !self.check(TokenType::RIGHT_BRACE) && !self.is_at_end() {
            statements.push(self.declaration()?);
        }

        self.consume(TokenType::RIGHT_BRACE, "Expected '}' after block statement")?;
        Ok(statements)
    }

    // ─────────────────────── expression rules ─────────────────────

    fn expression(&mut self) -> Result<Expr> {
        self.assignment()
    }

    fn assignment(&mut self) -> Result<Expr> {
        let expr: Expr = self.logical_or()?;

        if self.matches(TokenType::EQUAL) {
            let equals: Token = self.previous().clone();
            let value: Expr = self.assignment()?;

            return match expr.kind {
                ExprKind::Variable(name) => {
                    Ok(self.make_expr(
                        expr.line,
                        ExprKind::Assign {
                            name,
                            value: Box::new(value),
                        },
                    ))
                }

                ExprKind::Get { object, name } => Ok(self.make_expr(
                    expr.line,
                    ExprKind::Set {
                        object,
                        name,
                        value: Box::new(value),
                    },
                )),

                _ => Err(EnkelError::parse(
                    equals.line,
                    Some(&equals.lexeme),
                    "Invalid assignment target",
                )),
            };
        }

        Ok(expr)
    }

    fn logical_or(&mut self) -> Result<Expr> {
        let mut expr: Expr = self.logical_and()?;

        while self.matches(TokenType::OR) {
            let operator: Token = self.previous().clone();
            let right: Expr = self.logical_and()?;

            expr = self.make_expr(
                expr.line,
                ExprKind::Logical {
                    left: Box::new(expr),
                    operator,
                    right: Box::new(right),
                },
            );
        }

        Ok(expr)
    }

    fn logical_and(&mut self) -> Result<Expr> {
        let mut expr: Expr = self.equality()?;

        while self.matches(TokenType::AND) {
            let operator: Token = self.previous().clone();
            let right: Expr = self.equality()?;

            expr = self.make_expr(
                expr.line,
                ExprKind::Logical {
                    left: Box::new(expr),
                    operator,
                    right: Box::new(right),
                },
            );
        }

        Ok(expr)
    }

    /// Left‑associative binary level: `next (op next)*`.
    fn binary_level(
        &mut self,
        operators: &[TokenType],
        next: fn(&mut Self) -> Result<Expr>,
    ) -> Result<Expr> {
        let mut expr: Expr = next(self)?;

        while operators.iter().any(|op| self.check(op.clone())) {
            let operator: Token = self.advance().clone();
            let right: Expr = next(self)?;

            expr = self.make_expr(
                expr.line,
                ExprKind::Binary {
                    left: Box::new(expr),
                    operator,
                    right: Box::new(right),
                },
            );
        }

        Ok(expr)
    }

    fn equality(&mut self) -> Result<Expr> {
        self.binary_level(
            &[TokenType::BANG_EQUAL, TokenType::EQUAL_EQUAL],
            Self::comparison,
        )
    }

    fn comparison(&mut self) -> Result<Expr> {
        self.binary_level(
            &[
                TokenType::GREATER,
                TokenType::GREATER_EQUAL,
                TokenType::LESS,
                TokenType::LESS_EQUAL,
            ],
            Self::term,
        )
    }

    fn term(&mut self) -> Result<Expr> {
        self.binary_level(&[TokenType::MINUS, TokenType::PLUS], Self::factor)
    }

    fn factor(&mut self) -> Result<Expr> {
        self.binary_level(&[TokenType::SLASH, TokenType::STAR], Self::unary)
    }

    fn unary(&mut self) -> Result<Expr> {
        if self.matches(TokenType::BANG) || self.matches(TokenType::MINUS) {
            let operator: Token = self.previous().clone();
            let right: Expr = self.unary()?;

            return Ok(self.make_expr(
                operator.line,
                ExprKind::Unary {
                    operator,
                    right: Box::new(right),
                },
            ));
        }

        self.call()
    }

    fn call(&mut self) -> Result<Expr> {
        let mut expr: Expr = self.primary()?;

        loop {
            if self.matches(TokenType::LEFT_PAREN) {
                expr = self.finish_call(expr)?;
            } else if self.matches(TokenType::DOT) {
                let name: Token = self
                    .consume(TokenType::IDENTIFIER, "Expected prop name after '.'")?
                    .clone();

                expr = self.make_expr(
                    expr.line,
                    ExprKind::Get {
                        object: Box::new(expr),
                        name,
                    },
                );
            } else {
                break;
            }
        }

        Ok(expr)
    }

    fn finish_call(&mut self, callee: Expr) -> Result<Expr> {
        let mut arguments: Vec<Expr> = Vec::new();

        if !self.check(TokenType::RIGHT_PAREN) {
            loop {
                arguments.push(self.expression()?);

                if !self.matches(TokenType::COMMA) {
                    break;
                }
            }
        }

        let paren: Token = self
            .consume(TokenType::RIGHT_PAREN, "Expected ')' after arguments")?
            .clone();

        Ok(self.make_expr(
            callee.line,
            ExprKind::Call {
                callee: Box::new(callee),
                paren,
                arguments,
            },
        ))
    }

    fn primary(&mut self) -> Result<Expr> {
        let token: &'t Token = self.peek();
        let line: usize = token.line;

        let kind: ExprKind = match &token.token_type {
            TokenType::FALSE => ExprKind::Literal(LiteralValue::Bool(false)),
            TokenType::TRUE => ExprKind::Literal(LiteralValue::Bool(true)),
            TokenType::NONE => ExprKind::Literal(LiteralValue::None),
            TokenType::NUMBER(n) => ExprKind::Literal(LiteralValue::Number(*n)),
            TokenType::STRING(s) => ExprKind::Literal(LiteralValue::Str(s.clone())),
            TokenType::THIS => ExprKind::This(token.clone()),
            TokenType::IDENTIFIER => ExprKind::Variable(token.clone()),

            TokenType::LEFT_PAREN => {
                self.advance();
                let inner: Expr = self.expression()?;
                self.consume(TokenType::RIGHT_PAREN, "Expected ')' after expression")?;

                return Ok(self.make_expr(line, ExprKind::Grouping(Box::new(inner))));
            }

            _ => return Err(self.error_at_current("Expected an expression")),
        };

        self.advance();

        Ok(self.make_expr(line, kind))
    }

    // ────────────────────── utility helpers ───────────────────────

    fn make_expr(&mut self, line: usize, kind: ExprKind) -> Expr {
        let id = ExprId(self.next_id);
        self.next_id += 1;

        Expr { id, line, kind }
    }

    fn error_at_current(&self, expected: &str) -> EnkelError {
        let token: &Token = self.peek();

        debug!("Parse failure at {:?}: {}", token, expected);

        if token.is_eof() {
            EnkelError::parse(token.line, None, expected)
        } else {
            EnkelError::parse(token.line, Some(&token.lexeme), expected)
        }
    }

    #[inline(always)]
    fn matches(&mut self, ttype: TokenType) -> bool {
        if self.check(ttype) {
            self.advance();

            return true;
        }

        false
    }

    #[inline(always)]
    fn consume(&mut self, ttype: TokenType, message: &str) -> Result<&'t Token> {
        if self.check(ttype) {
            return Ok(self.advance());
        }

        Err(self.error_at_current(message))
    }

    #[inline(always)]
    fn check(&self, ttype: TokenType) -> bool {
        if self.is_at_end() {
            return false;
        }

        self.peek().token_type == ttype
    }

    #[inline(always)]
    fn advance(&mut self) -> &'t Token {
        if !self.is_at_end() {
            self.current += 1;
        }

        self.previous()
    }

    #[inline(always)]
    fn is_at_end(&self) -> bool {
        self.peek().is_eof()
    }

    #[inline(always)]
    fn peek(&self) -> &'t Token {
        &self.tokens[self.current]
    }

    #[inline(always)]
    fn previous(&self) -> &'t Token {
        &self.tokens[self.current.saturating_sub(1)]
    }
}
